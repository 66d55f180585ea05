use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use tracing::warn;

/// Key the access token is stored under, in every backend.
pub const TOKEN_KEY: &str = "token";

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// Persistent storage for the access token.
///
/// Written by the login flow, read and cleared by the `SessionGuard`.
pub trait TokenStore: Send + Sync {
    fn get(&self) -> Result<Option<String>>;

    fn set(&self, token: &str) -> Result<()>;

    /// Remove the token. Clearing an empty store is not an error.
    fn clear(&self) -> Result<()>;
}

/// In-process store, lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Result<Option<String>> {
        let guard = self.token.lock().map_err(|_| anyhow!("token store poisoned"))?;
        Ok(guard.clone())
    }

    fn set(&self, token: &str) -> Result<()> {
        let mut guard = self.token.lock().map_err(|_| anyhow!("token store poisoned"))?;
        *guard = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut guard = self.token.lock().map_err(|_| anyhow!("token store poisoned"))?;
        *guard = None;
        Ok(())
    }
}

/// Key/value JSON file in the cache directory.
///
/// The file is a flat string map so other client state can live next to
/// the token; only `TOKEN_KEY` is touched here.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            path: cache_dir.join(SESSION_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored entries. `Ok(None)` means the file exists but is
    /// not a string map; callers treat that as an empty store.
    fn load(&self) -> Result<Option<BTreeMap<String, String>>> {
        if !self.path.exists() {
            return Ok(Some(BTreeMap::new()));
        }
        let contents = std::fs::read_to_string(&self.path)
            .context("Failed to read session file")?;
        match serde_json::from_str(&contents) {
            Ok(entries) => Ok(Some(entries)),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Session file is corrupt, ignoring it"
                );
                Ok(None)
            }
        }
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, contents).context("Failed to write session file")?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Result<Option<String>> {
        Ok(self.load()?.and_then(|mut entries| entries.remove(TOKEN_KEY)))
    }

    fn set(&self, token: &str) -> Result<()> {
        let mut entries = self.load()?.unwrap_or_default();
        entries.insert(TOKEN_KEY.to_string(), token.to_string());
        self.save(&entries)
    }

    fn clear(&self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        match self.load()? {
            Some(mut entries) => {
                if entries.remove(TOKEN_KEY).is_some() {
                    self.save(&entries)?;
                }
                Ok(())
            }
            // Rewrite a corrupt file so it stops shadowing the session
            None => self.save(&BTreeMap::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::auth::session::SessionGuard;
    use crate::auth::token::mint_token;

    #[test]
    fn test_memory_store_lifecycle() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.get().unwrap(), None);

        store.set("abc").unwrap();
        assert_eq!(store.get().unwrap().as_deref(), Some("abc"));

        store.clear().unwrap();
        assert_eq!(store.get().unwrap(), None);
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path());
        assert_eq!(store.get().unwrap(), None);

        store.set("abc").unwrap();
        let reopened = FileTokenStore::new(dir.path());
        assert_eq!(reopened.get().unwrap().as_deref(), Some("abc"));

        reopened.clear().unwrap();
        assert_eq!(store.get().unwrap(), None);
    }

    #[test]
    fn test_file_store_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path());
        std::fs::write(store.path(), r#"{"theme":"dark","token":"abc"}"#).unwrap();

        store.clear().unwrap();
        let contents = std::fs::read_to_string(store.path()).unwrap();
        assert!(contents.contains("theme"));
        assert!(!contents.contains("abc"));
    }

    #[test]
    fn test_file_store_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("loandesk");
        let store = FileTokenStore::new(&nested);
        store.set("abc").unwrap();
        assert!(nested.join(SESSION_FILE).exists());
    }

    #[test]
    fn test_corrupt_file_does_not_lock_out_login() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path());
        std::fs::write(store.path(), "{ not json").unwrap();

        let guard = SessionGuard::new(FileTokenStore::new(dir.path()));
        assert!(!guard.is_authenticated());

        let token = mint_token(Utc::now().timestamp() + 3600);
        guard.store_token(&token).unwrap();
        assert!(guard.is_authenticated());
        assert_eq!(store.get().unwrap(), Some(token));
    }

    #[test]
    fn test_non_string_values_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path());
        std::fs::write(store.path(), r#"{"token": 42}"#).unwrap();

        assert_eq!(store.get().unwrap(), None);
        store.clear().unwrap();
        let contents = std::fs::read_to_string(store.path()).unwrap();
        assert!(!contents.contains("42"));

        store.set("abc").unwrap();
        assert_eq!(store.get().unwrap().as_deref(), Some("abc"));
    }
}
