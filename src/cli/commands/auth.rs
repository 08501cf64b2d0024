//! cli::commands::auth
//!
//! Store, inspect, or remove the GitHub token for an API host.
//!
//! The command never prints a token value; it only confirms success.

use anyhow::{bail, Context as _, Result};

use super::Context;
use crate::core::config::Config;
use crate::secrets::{self, FileSecretStore, SecretStore};
use crate::ui::{output, prompts};

/// Run the auth command.
///
/// `host` defaults to the host of the configured API base.
pub fn auth(
    ctx: &Context,
    config: &Config,
    token: Option<&str>,
    host: Option<&str>,
    status: bool,
    logout: bool,
) -> Result<()> {
    let host = host.map_or_else(|| config.api_host(), str::to_string);
    let store = FileSecretStore::new().context("Failed to open credential store")?;

    if status {
        return show_status(ctx, &store, &host);
    }

    if logout {
        store
            .delete(&host)
            .context("Failed to remove stored token")?;
        output::print(format!("Logged out from {host}."), ctx.verbosity());
        return Ok(());
    }

    let token = match token {
        Some(t) => t.to_string(),
        None if ctx.interactive => prompts::password("GitHub personal access token", true)
            .context("Failed to read token")?,
        None => bail!("Token required. Use --token <TOKEN> or run interactively."),
    };
    validate_token(&token)?;

    store.set(&host, &token).context("Failed to store token")?;
    output::print(
        format!("Authentication configured for {host}."),
        ctx.verbosity(),
    );
    Ok(())
}

fn show_status(ctx: &Context, store: &dyn SecretStore, host: &str) -> Result<()> {
    let from_env = std::env::var(secrets::TOKEN_ENV).is_ok_and(|t| !t.trim().is_empty());
    let stored = store.exists(host)?;
    let authenticated = from_env || stored;

    if ctx.json {
        output::json(&serde_json::json!({
            "host": host,
            "authenticated": authenticated,
            "source": if from_env { "env" } else if stored { "file" } else { "none" },
        }))?;
    } else if ctx.quiet {
        println!(
            "{}",
            if authenticated {
                "authenticated"
            } else {
                "not_authenticated"
            }
        );
    } else if from_env {
        println!("Authenticated with {host} via {}.", secrets::TOKEN_ENV);
    } else if stored {
        println!("Authenticated with {host}.");
    } else {
        println!("Not authenticated with {host}.");
        println!("Run 'tl auth' to authenticate.");
    }
    Ok(())
}

/// Basic format checks; the token is not verified against the API.
fn validate_token(token: &str) -> Result<()> {
    if token.is_empty() {
        bail!("Token cannot be empty.");
    }
    if token.len() < 10 {
        bail!("Token appears to be too short.");
    }
    if token.contains(char::is_whitespace) {
        bail!("Token should not contain whitespace.");
    }
    Ok(())
}
