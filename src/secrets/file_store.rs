//! secrets::file_store
//!
//! File-based credential storage at `~/.treeline/credentials.toml`.
//!
//! The file is a flat TOML table of host to token. On Unix it is created
//! with mode 0600 and every write goes through a temp file and a rename.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use super::traits::{SecretError, SecretStore};

/// File-based credential storage.
#[derive(Debug)]
pub struct FileSecretStore {
    path: PathBuf,
}

impl FileSecretStore {
    /// Store at `~/.treeline/credentials.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, SecretError> {
        let home = dirs::home_dir()
            .ok_or_else(|| SecretError::ReadError("cannot determine home directory".into()))?;
        Ok(Self {
            path: home.join(".treeline").join("credentials.toml"),
        })
    }

    /// Store at a custom path.
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, SecretError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| SecretError::ReadError(format!("cannot read credentials file: {e}")))?;
        toml::from_str(&content)
            .map_err(|e| SecretError::ReadError(format!("cannot parse credentials file: {e}")))
    }

    fn write_all(&self, tokens: &BTreeMap<String, String>) -> Result<(), SecretError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| SecretError::WriteError(format!("cannot create directory: {e}")))?;
        }

        let content = toml::to_string_pretty(tokens)
            .map_err(|e| SecretError::WriteError(format!("cannot serialize credentials: {e}")))?;

        let temp_path = self.path.with_extension("toml.tmp");
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .map_err(|e| SecretError::WriteError(format!("cannot create temp file: {e}")))?;

            // Restrict before any token bytes land on disk.
            #[cfg(unix)]
            file.set_permissions(fs::Permissions::from_mode(0o600))
                .map_err(|e| SecretError::WriteError(format!("cannot set permissions: {e}")))?;

            file.write_all(content.as_bytes())
                .map_err(|e| SecretError::WriteError(format!("cannot write credentials: {e}")))?;
            file.sync_all()
                .map_err(|e| SecretError::WriteError(format!("cannot sync to disk: {e}")))?;
        }

        fs::rename(&temp_path, &self.path)
            .map_err(|e| SecretError::WriteError(format!("cannot rename temp file: {e}")))
    }

    /// Hosts with a stored token.
    pub fn hosts(&self) -> Result<Vec<String>, SecretError> {
        Ok(self.read_all()?.into_keys().collect())
    }
}

impl SecretStore for FileSecretStore {
    fn get(&self, host: &str) -> Result<Option<String>, SecretError> {
        Ok(self.read_all()?.remove(host))
    }

    fn set(&self, host: &str, token: &str) -> Result<(), SecretError> {
        let mut tokens = self.read_all()?;
        tokens.insert(host.to_string(), token.to_string());
        self.write_all(&tokens)
    }

    fn delete(&self, host: &str) -> Result<(), SecretError> {
        let mut tokens = self.read_all()?;
        if tokens.remove(host).is_none() {
            return Ok(());
        }
        self.write_all(&tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (TempDir, FileSecretStore) {
        let temp = TempDir::new().expect("create temp dir");
        let store = FileSecretStore::with_path(temp.path().join("credentials.toml"));
        (temp, store)
    }

    #[test]
    fn get_missing_returns_none() {
        let (_temp, store) = create_test_store();
        assert!(store.get("api.github.com").expect("get").is_none());
    }

    #[test]
    fn tokens_are_per_host() {
        let (_temp, store) = create_test_store();

        store.set("api.github.com", "public").expect("set");
        store.set("ghe.example.com", "enterprise").expect("set");

        assert_eq!(
            store.get("api.github.com").expect("get"),
            Some("public".to_string())
        );
        assert_eq!(
            store.get("ghe.example.com").expect("get"),
            Some("enterprise".to_string())
        );
        assert_eq!(
            store.hosts().expect("hosts"),
            vec!["api.github.com", "ghe.example.com"]
        );
    }

    #[test]
    fn set_overwrites_and_delete_is_idempotent() {
        let (_temp, store) = create_test_store();

        store.set("api.github.com", "one").expect("set");
        store.set("api.github.com", "two").expect("set");
        assert_eq!(
            store.get("api.github.com").expect("get"),
            Some("two".to_string())
        );

        store.delete("api.github.com").expect("delete");
        store.delete("api.github.com").expect("delete again");
        assert!(!store.exists("api.github.com").expect("exists"));
    }

    #[test]
    fn creates_parent_directory() {
        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path().join("nested").join("credentials.toml");
        let store = FileSecretStore::with_path(path.clone());

        store.set("api.github.com", "t").expect("set");
        assert!(path.exists());
        assert!(!path.with_extension("toml.tmp").exists());
    }

    #[cfg(unix)]
    #[test]
    fn file_is_owner_only() {
        let (_temp, store) = create_test_store();
        store.set("api.github.com", "t").expect("set");

        let mode = fs::metadata(store.path()).expect("metadata").permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn parse_error_does_not_echo_tokens() {
        let (_temp, store) = create_test_store();
        fs::write(store.path(), "api.github.com = [unclosed").expect("write");

        let err = store.get("api.github.com").unwrap_err();
        assert!(err.to_string().contains("cannot parse credentials file"));
    }
}
