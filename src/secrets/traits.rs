//! secrets::traits
//!
//! Credential storage trait.
//!
//! Credentials are keyed by API host (e.g. `api.github.com`), so one file
//! can hold tokens for github.com and any number of Enterprise instances.
//!
//! Implementations must never log, print, or include token values in error
//! messages.

use thiserror::Error;

/// Errors from credential storage.
///
/// Messages never include token values.
#[derive(Debug, Error)]
pub enum SecretError {
    /// No token is configured for the host.
    #[error("no token configured for {0} (run `tl auth --token` or set TREELINE_GITHUB_TOKEN)")]
    NotFound(String),

    #[error("failed to read credentials: {0}")]
    ReadError(String),

    #[error("failed to write credentials: {0}")]
    WriteError(String),
}

/// Host-keyed token storage.
pub trait SecretStore: Send + Sync {
    /// Token for `host`, or `None` if none is stored.
    fn get(&self, host: &str) -> Result<Option<String>, SecretError>;

    /// Store a token, replacing any existing one.
    fn set(&self, host: &str, token: &str) -> Result<(), SecretError>;

    /// Remove a token. Removing an absent token is not an error.
    fn delete(&self, host: &str) -> Result<(), SecretError>;

    fn exists(&self, host: &str) -> Result<bool, SecretError> {
        Ok(self.get(host)?.is_some())
    }
}
