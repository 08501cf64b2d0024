//! secrets
//!
//! Hosting-service token storage and resolution.
//!
//! # Security
//!
//! - Tokens are never logged or included in error messages
//! - The credential file is 0600 on Unix and written atomically
//!
//! # Resolution
//!
//! [`resolve_token`] checks `$TREELINE_GITHUB_TOKEN` first, then the
//! store entry for the API host.

mod file_store;
mod traits;

pub use file_store::FileSecretStore;
pub use traits::{SecretError, SecretStore};

/// Environment variable that overrides stored credentials.
pub const TOKEN_ENV: &str = "TREELINE_GITHUB_TOKEN";

/// Token for `host`: the environment override if set and non-empty,
/// otherwise the stored entry.
///
/// # Errors
///
/// [`SecretError::NotFound`] if neither source has a token.
pub fn resolve_token(store: &dyn SecretStore, host: &str) -> Result<String, SecretError> {
    resolve_with_env(store, host, std::env::var(TOKEN_ENV).ok())
}

fn resolve_with_env(
    store: &dyn SecretStore,
    host: &str,
    env: Option<String>,
) -> Result<String, SecretError> {
    if let Some(token) = env.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) {
        return Ok(token);
    }
    store
        .get(host)?
        .filter(|t| !t.is_empty())
        .ok_or_else(|| SecretError::NotFound(host.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, FileSecretStore) {
        let temp = TempDir::new().expect("temp dir");
        let store = FileSecretStore::with_path(temp.path().join("credentials.toml"));
        (temp, store)
    }

    #[test]
    fn env_wins_over_store() {
        let (_temp, store) = store();
        store.set("api.github.com", "stored").expect("set");

        let token =
            resolve_with_env(&store, "api.github.com", Some("from-env".into())).expect("resolve");
        assert_eq!(token, "from-env");
    }

    #[test]
    fn blank_env_falls_back_to_store() {
        let (_temp, store) = store();
        store.set("api.github.com", "stored").expect("set");

        let token = resolve_with_env(&store, "api.github.com", Some("  ".into())).expect("resolve");
        assert_eq!(token, "stored");
    }

    #[test]
    fn missing_everywhere_is_not_found() {
        let (_temp, store) = store();
        let err = resolve_with_env(&store, "api.github.com", None).unwrap_err();
        assert!(matches!(err, SecretError::NotFound(host) if host == "api.github.com"));
    }
}
