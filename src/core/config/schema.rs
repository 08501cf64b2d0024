//! core::config::schema
//!
//! Configuration file schema.
//!
//! # Example
//!
//! ```toml
//! api_base = "https://github.example.com/api/v3"
//! log_level = "debug"
//!
//! [listing]
//! per_page = 50
//! ```

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Log levels accepted by `log_level`.
pub const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Largest page size the hosting service honours.
pub const MAX_PER_PAGE: u32 = 100;

/// Settings file contents.
///
/// Every field is optional; accessors on [`super::Config`] apply defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// REST API root (e.g. `https://github.example.com/api/v3`)
    pub api_base: Option<String>,

    /// Default log level when `RUST_LOG` is unset
    pub log_level: Option<String>,

    /// Pagination settings
    pub listing: Option<ListingConfig>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(api_base) = &self.api_base {
            validate_api_base(api_base)?;
        }

        if let Some(level) = &self.log_level {
            if !LOG_LEVELS.contains(&level.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid log_level '{}', must be one of: {}",
                    level,
                    LOG_LEVELS.join(", ")
                )));
            }
        }

        if let Some(listing) = &self.listing {
            listing.validate()?;
        }

        Ok(())
    }
}

/// Pagination settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ListingConfig {
    /// Items requested per page (1..=100)
    pub per_page: Option<u32>,
}

impl ListingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.per_page {
            Some(n) if n == 0 || n > MAX_PER_PAGE => Err(ConfigError::InvalidValue(format!(
                "invalid listing.per_page {n}, must be between 1 and {MAX_PER_PAGE}"
            ))),
            _ => Ok(()),
        }
    }
}

fn validate_api_base(api_base: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(api_base)
        .map_err(|e| ConfigError::InvalidValue(format!("invalid api_base '{api_base}': {e}")))?;

    if !matches!(parsed.scheme(), "https" | "http") || parsed.host_str().is_none() {
        return Err(ConfigError::InvalidValue(format!(
            "invalid api_base '{api_base}': must be an http(s) URL with a host"
        )));
    }
    Ok(())
}
