//! Key-Value Store Module
//!
//! Persistent string store behind every record. No transactions, no expiry;
//! the last write wins.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{AppError, Result};

// == Key-Value Store Trait ==
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: String) -> Result<()>;
}

// == Memory Store ==
#[derive(Debug, Default)]
pub struct MemoryKv {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.values.write().await.insert(key.to_string(), value);
        Ok(())
    }
}

// == File Store ==
/// One `<key>.json` file per key inside a data directory.
#[derive(Debug, Clone)]
pub struct FileKv {
    dir: PathBuf,
}

impl FileKv {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(AppError::InvalidRequest(format!("invalid store key: {:?}", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl KeyValueStore for FileKv {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir).await?;

        // Write then rename so readers never see a half-written record
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).await?;
        fs::rename(&tmp, &path).await?;
        debug!("Wrote record {}", path.display());
        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_get_set() {
        let kv = MemoryKv::new();
        assert!(kv.get("A").await.unwrap().is_none());

        kv.set("A", "1".into()).await.unwrap();
        kv.set("A", "2".into()).await.unwrap();

        assert_eq!(kv.get("A").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_file_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let kv = FileKv::new(dir.path().join("nested"));
        kv.set("BIOQUARTIER_FAVORIS", "[]".into()).await.unwrap();

        let reopened = FileKv::new(dir.path().join("nested"));
        assert_eq!(
            reopened.get("BIOQUARTIER_FAVORIS").await.unwrap().as_deref(),
            Some("[]")
        );
        assert!(reopened.get("OTHER").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let kv = FileKv::new(dir.path());

        let result = kv.set("../escape", "x".into()).await;
        assert!(matches!(result, Err(AppError::InvalidRequest(_))));
        assert!(kv.get("").await.is_err());
    }
}
