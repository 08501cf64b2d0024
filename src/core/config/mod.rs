//! core::config
//!
//! Configuration schema and loading.
//!
//! # Locations
//!
//! Searched in order, first hit wins:
//! 1. `$TREELINE_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/treeline/config.toml`
//! 3. `~/.treeline/config.toml` (canonical write location)
//!
//! A missing file is not an error; defaults apply.
//!
//! # Example
//!
//! ```no_run
//! use treeline::core::config::Config;
//!
//! let config = Config::load().unwrap();
//! println!("API: {}", config.api_base());
//! println!("Page size: {}", config.per_page());
//! ```

pub mod schema;

pub use schema::{FileConfig, ListingConfig};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "TREELINE_CONFIG";

/// Public GitHub REST API root.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const DEFAULT_LOG_LEVEL: &str = "info";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("unknown config key '{0}' (valid: api_base, log_level, listing.per_page)")]
    UnknownKey(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Loaded configuration with defaults applied by the accessors.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub file: FileConfig,
    /// Path the settings were read from, if any
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed
    /// or validated.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::locate() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let file: FileConfig = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        file.validate()?;

        Ok(Self {
            file,
            path: Some(path.to_path_buf()),
        })
    }

    /// Find the first existing config file.
    fn locate() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("treeline/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        dirs::home_dir()
            .map(|home| home.join(".treeline/config.toml"))
            .filter(|path| path.exists())
    }

    /// Canonical write location (`~/.treeline/config.toml`), unless
    /// `$TREELINE_CONFIG` names a file.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Ok(PathBuf::from(path));
        }
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".treeline/config.toml"))
    }

    /// Set a single key, validating the result.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut file = self.file.clone();
        match key {
            "api_base" => file.api_base = Some(value.trim_end_matches('/').to_string()),
            "log_level" => file.log_level = Some(value.to_string()),
            "listing.per_page" => {
                let per_page = value.parse::<u32>().map_err(|_| {
                    ConfigError::InvalidValue(format!("listing.per_page must be a number, got '{value}'"))
                })?;
                file.listing.get_or_insert_with(ListingConfig::default).per_page = Some(per_page);
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        file.validate()?;
        self.file = file;
        Ok(())
    }

    /// Look up a single key as it would be used (defaults applied).
    pub fn get(&self, key: &str) -> Result<String, ConfigError> {
        match key {
            "api_base" => Ok(self.api_base().to_string()),
            "log_level" => Ok(self.log_level().to_string()),
            "listing.per_page" => Ok(self.per_page().to_string()),
            _ => Err(ConfigError::UnknownKey(key.to_string())),
        }
    }

    /// Write the settings atomically to `path`.
    ///
    /// Creates parent directories if needed.
    pub fn write_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents = toml::to_string_pretty(&self.file)
            .map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let temp_path = path.with_extension("toml.tmp");
        let write_err = |source| ConfigError::WriteError {
            path: temp_path.clone(),
            source,
        };
        let mut file = fs::File::create(&temp_path).map_err(write_err)?;
        file.write_all(contents.as_bytes()).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    // =========================================================================
    // Accessors with defaults
    // =========================================================================

    /// REST API root, without a trailing slash.
    ///
    /// Defaults to `https://api.github.com`.
    pub fn api_base(&self) -> &str {
        self.file
            .api_base
            .as_deref()
            .map(|base| base.trim_end_matches('/'))
            .unwrap_or(DEFAULT_API_BASE)
    }

    /// Host part of the API root, used to key stored credentials.
    pub fn api_host(&self) -> String {
        url::Url::parse(self.api_base())
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| "api.github.com".to_string())
    }

    /// Defaults to `info`.
    pub fn log_level(&self) -> &str {
        self.file.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    /// Defaults to the maximum the hosting service allows (100).
    pub fn per_page(&self) -> u32 {
        self.file
            .listing
            .as_ref()
            .and_then(|l| l.per_page)
            .unwrap_or(schema::MAX_PER_PAGE)
    }

    /// Path the settings were loaded from.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_without_file() {
        let config = Config::default();
        assert_eq!(config.api_base(), "https://api.github.com");
        assert_eq!(config.api_host(), "api.github.com");
        assert_eq!(config.log_level(), "info");
        assert_eq!(config.per_page(), 100);
        assert!(config.loaded_from().is_none());
    }

    #[test]
    fn load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            r#"
            api_base = "https://github.example.com/api/v3/"
            log_level = "debug"

            [listing]
            per_page = 25
            "#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api_base(), "https://github.example.com/api/v3");
        assert_eq!(config.api_host(), "github.example.com");
        assert_eq!(config.log_level(), "debug");
        assert_eq!(config.per_page(), 25);
        assert_eq!(config.loaded_from(), Some(path.as_path()));
    }

    #[test]
    fn load_honours_env_override() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("custom.toml");
        fs::write(&path, "log_level = \"warn\"").unwrap();

        std::env::set_var(CONFIG_ENV, path.to_str().unwrap());
        let config = Config::load();
        std::env::remove_var(CONFIG_ENV);

        assert_eq!(config.unwrap().log_level(), "warn");
    }

    #[test]
    fn parse_error_names_the_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "api_base = [unclosed").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn invalid_values_rejected_on_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "[listing]\nper_page = 500").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn set_get_and_write_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/config.toml");

        let mut config = Config::default();
        config.set("api_base", "https://ghe.corp/api/v3/").unwrap();
        config.set("listing.per_page", "40").unwrap();
        config.write_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.get("api_base").unwrap(), "https://ghe.corp/api/v3");
        assert_eq!(loaded.get("listing.per_page").unwrap(), "40");
        assert_eq!(loaded.get("log_level").unwrap(), "info");
    }

    #[test]
    fn set_rejects_bad_values_without_mutating() {
        let mut config = Config::default();
        assert!(config.set("listing.per_page", "lots").is_err());
        assert!(config.set("listing.per_page", "0").is_err());
        assert!(config.set("log_level", "chatty").is_err());
        assert!(matches!(
            config.set("token", "x"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert_eq!(config.file, FileConfig::default());
    }
}
