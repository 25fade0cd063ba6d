//! Durable storage for the bearer token

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use parking_lot::Mutex;

/// Default key the token is stored under
pub const DEFAULT_TOKEN_KEY: &str = "token";

/// Where the session keeps its token between runs
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<String>>;
    fn save(&self, token: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// JSON file holding `{ "<key>": "<token>" }`
pub struct FileTokenStore {
    path: PathBuf,
    key: String,
}

impl FileTokenStore {
    pub fn new(path: PathBuf, key: impl Into<String>) -> Self {
        Self {
            path,
            key: key.into(),
        }
    }

    fn read_all(&self) -> Result<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let content =
            std::fs::read_to_string(&self.path).context("Failed to read credentials file")?;
        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }
        serde_json::from_str(&content).context("Failed to parse credentials file")
    }

    fn write_all(&self, entries: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            serde_json::to_string_pretty(entries).context("Failed to serialize credentials")?;
        std::fs::write(&self.path, content).context("Failed to write credentials file")
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(&self.key))
    }

    fn save(&self, token: &str) -> Result<()> {
        let mut entries = self.read_all().unwrap_or_default();
        entries.insert(self.key.clone(), token.to_string());
        self.write_all(&entries)
    }

    fn clear(&self) -> Result<()> {
        let mut entries = self.read_all().unwrap_or_default();
        if entries.remove(&self.key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

/// In-process token storage
#[derive(Default)]
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
    fn load(&self) -> Result<Option<String>> {
        Ok(self.token.lock().clone())
    }

    fn save(&self, token: &str) -> Result<()> {
        *self.token.lock() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.token.lock() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(temp_dir.path().join("credentials.json"), DEFAULT_TOKEN_KEY);

        assert_eq!(store.load().unwrap(), None);
        store.save("abc").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("abc"));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_file_store_keeps_other_keys() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("credentials.json");
        let staging = FileTokenStore::new(path.clone(), "staging");
        let prod = FileTokenStore::new(path, DEFAULT_TOKEN_KEY);

        staging.save("s").unwrap();
        prod.save("p").unwrap();
        prod.clear().unwrap();

        assert_eq!(staging.load().unwrap().as_deref(), Some("s"));
        assert_eq!(prod.load().unwrap(), None);
    }
}
