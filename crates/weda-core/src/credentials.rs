//! Session credential storage.
//!
//! Stores the bearer token and user profile in `<WEDA_HOME>/credentials.json`
//! with restricted permissions (0600). Tokens are never logged or displayed
//! in full.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::paths;

/// Persisted session credentials.
///
/// Serialized as a JSON document with exactly two keys: `token` (the bearer
/// credential) and `user` (the server's login payload, stored verbatim).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCredentials {
    /// Bearer token issued by the login endpoint.
    pub token: String,
    /// User/account payload as returned by the server.
    pub user: Value,
}

/// File-backed store for the session credentials.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Opens the store at the default location under `WEDA_HOME`.
    pub fn open_default() -> Self {
        Self {
            path: paths::credentials_path(),
        }
    }

    /// Opens the store at a specific path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored credentials.
    /// Returns `None` if no credentials file exists.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<Option<StoredCredentials>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read credentials from {}", self.path.display()))?;

        let creds = serde_json::from_str(&contents).with_context(|| {
            format!("Failed to parse credentials from {}", self.path.display())
        })?;

        Ok(Some(creds))
    }

    /// Saves credentials to disk with restricted permissions (0600).
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn save(&self, creds: &StoredCredentials) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents =
            serde_json::to_string_pretty(creds).context("Failed to serialize credentials")?;

        #[cfg(unix)]
        {
            use std::fs::OpenOptions;
            use std::io::Write;
            use std::os::unix::fs::OpenOptionsExt;

            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.path)
                .with_context(|| format!("Failed to open {} for writing", self.path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        #[cfg(not(unix))]
        {
            fs::write(&self.path, contents)
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        Ok(())
    }

    /// Removes the stored credentials.
    /// Returns whether credentials existed.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be removed.
    pub fn clear(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err).with_context(|| {
                format!("Failed to remove credentials at {}", self.path.display())
            }),
        }
    }
}

/// Returns a masked version of a token for display (first 12 chars + ...).
pub fn mask_token(token: &str) -> String {
    if token.len() <= 16 {
        return "***".to_string();
    }
    let head: String = token.chars().take(12).collect();
    format!("{head}...")
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::tempdir;

    use super::*;

    fn sample_creds() -> StoredCredentials {
        StoredCredentials {
            token: "weda-session-token-0123456789".to_string(),
            user: json!({"email": "jane@example.com", "firstName": "Jane"}),
        }
    }

    /// Test: save/load roundtrip preserves token and user payload verbatim.
    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::at(dir.path().join("credentials.json"));

        store.save(&sample_creds()).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.token, "weda-session-token-0123456789");
        assert_eq!(loaded.user["email"], "jane@example.com");
        assert_eq!(loaded.user["firstName"], "Jane");
    }

    /// Test: load with no file present returns None.
    #[test]
    fn test_load_missing_returns_none() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::at(dir.path().join("credentials.json"));

        assert!(store.load().unwrap().is_none());
    }

    /// Test: load with an unparseable file is an error, not a panic.
    #[test]
    fn test_load_corrupt_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = CredentialStore::at(&path);
        assert!(store.load().is_err());
    }

    /// Test: a file missing the user key does not parse as credentials.
    #[test]
    fn test_load_requires_both_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, r#"{"token": "abc"}"#).unwrap();

        let store = CredentialStore::at(&path);
        assert!(store.load().is_err());
    }

    /// Test: clear removes the file and reports whether credentials existed.
    #[test]
    fn test_clear_reports_presence() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::at(dir.path().join("credentials.json"));

        assert!(!store.clear().unwrap());

        store.save(&sample_creds()).unwrap();
        assert!(store.clear().unwrap());
        assert!(!store.path().exists());
    }

    /// Test: save creates parent directories as needed.
    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::at(dir.path().join("nested").join("credentials.json"));

        store.save(&sample_creds()).unwrap();
        assert!(store.path().exists());
    }

    /// Test: credential file permissions are owner-only on unix.
    #[cfg(unix)]
    #[test]
    fn test_save_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let store = CredentialStore::at(dir.path().join("credentials.json"));
        store.save(&sample_creds()).unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    /// Test: token masking.
    #[test]
    fn test_mask_token() {
        assert_eq!(
            mask_token("weda-session-token-0123456789"),
            "weda-session..."
        );
        assert_eq!(mask_token("short"), "***");
    }
}
