//! config command - Get, set, or list configuration values

use anyhow::{Context as _, Result};

use super::Context;
use crate::core::config::Config;
use crate::ui::output;

const KEYS: [&str; 3] = ["api_base", "log_level", "listing.per_page"];

/// Print a configuration value (defaults applied).
pub fn get(config: &Config, key: &str) -> Result<()> {
    println!("{}", config.get(key)?);
    Ok(())
}

/// Set a configuration value and write the file back.
///
/// Writes to the file the settings came from, or the canonical location
/// if none was found.
pub fn set(ctx: &Context, mut config: Config, key: &str, value: &str) -> Result<()> {
    config.set(key, value)?;

    let path = match config.loaded_from() {
        Some(path) => path.to_path_buf(),
        None => Config::default_path()?,
    };
    config
        .write_to(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    output::print(format!("Set {key} = {value}"), ctx.verbosity());
    Ok(())
}

/// List all configuration values.
pub fn list(ctx: &Context, config: &Config) -> Result<()> {
    if ctx.json {
        let mut values = serde_json::Map::new();
        for key in KEYS {
            values.insert(key.to_string(), config.get(key)?.into());
        }
        return Ok(output::json(&values)?);
    }

    match config.loaded_from() {
        Some(path) => println!("# {}", path.display()),
        None => println!("# defaults (no config file)"),
    }
    for key in KEYS {
        println!("{key} = {}", config.get(key)?);
    }
    Ok(())
}
