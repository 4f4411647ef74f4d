//! File system backed key-value store.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::StoreError;
use crate::kv::KeyValueStore;

/// File system based key-value store.
///
/// Each key is stored as an individual JSON file:
/// ```text
/// {storage_path}/
/// └── kv/
///     ├── leadflow.global_history.json
///     └── leadflow.rate_limit_config.json
/// ```
///
/// Writes go to a temporary file first and are renamed into place, so a
/// reader never observes a half-written value.
pub struct FileKeyValueStore {
    storage_path: PathBuf,
}

impl FileKeyValueStore {
    /// Create a new file-based store rooted at `storage_path`.
    pub async fn new(storage_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let storage_path = storage_path.into();
        fs::create_dir_all(storage_path.join("kv")).await?;

        debug!("FileKeyValueStore initialized at {:?}", storage_path);

        Ok(Self { storage_path })
    }

    fn kv_dir(&self) -> PathBuf {
        self.storage_path.join("kv")
    }

    /// Sanitize a key for use as a file name.
    fn sanitize_key(key: &str) -> String {
        key.chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.kv_dir().join(format!("{}.json", Self::sanitize_key(key)))
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>, StoreError> {
        let mut values = HashMap::with_capacity(keys.len());

        for key in keys {
            let path = self.key_path(key);
            let content = match fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            match serde_json::from_str::<Value>(&content) {
                Ok(value) => {
                    values.insert(key.to_string(), value);
                }
                Err(e) => {
                    warn!("Corrupt value for key '{}' at {:?}: {}", key, path, e);
                    return Err(e.into());
                }
            }
        }

        Ok(values)
    }

    async fn set(&self, entries: HashMap<String, Value>) -> Result<(), StoreError> {
        for (key, value) in entries {
            let path = self.key_path(&key);
            let tmp = self.kv_dir().join(format!(".{}.tmp", Uuid::new_v4()));

            let content = serde_json::to_string_pretty(&value)?;
            fs::write(&tmp, content).await?;
            if let Err(e) = fs::rename(&tmp, &path).await {
                fs::remove_file(&tmp).await.ok();
                return Err(e.into());
            }

            debug!("Saved key '{}' to {:?}", key, path);
        }
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), StoreError> {
        for key in keys {
            match fs::remove_file(self.key_path(key)).await {
                Ok(()) => debug!("Removed key '{}'", key),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_store_set_and_get() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(temp_dir.path()).await.unwrap();

        store
            .set_one("leadflow.global_history", json!({"schema_version": 1}))
            .await
            .unwrap();

        let value = store.get_one("leadflow.global_history").await.unwrap();
        assert_eq!(value, Some(json!({"schema_version": 1})));
        assert!(store.key_path("leadflow.global_history").exists());
    }

    #[tokio::test]
    async fn test_file_store_get_missing() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(temp_dir.path()).await.unwrap();

        let values = store.get(&["nothing"]).await.unwrap();
        assert!(values.is_empty());
    }

    #[tokio::test]
    async fn test_file_store_overwrite_leaves_no_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(temp_dir.path()).await.unwrap();

        store.set_one("k", json!(1)).await.unwrap();
        store.set_one("k", json!(2)).await.unwrap();

        assert_eq!(store.get_one("k").await.unwrap(), Some(json!(2)));
        let files: Vec<_> = std::fs::read_dir(store.kv_dir()).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[tokio::test]
    async fn test_file_store_remove() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(temp_dir.path()).await.unwrap();

        store.set_one("k", json!("v")).await.unwrap();
        store.remove(&["k", "missing"]).await.unwrap();
        assert!(store.get_one("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_corrupt_value_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(temp_dir.path()).await.unwrap();

        std::fs::write(store.key_path("bad"), "{not json").unwrap();
        let result = store.get(&["bad"]).await;
        assert!(matches!(result, Err(StoreError::Serialization(_))));
    }

    #[test]
    fn test_sanitize_key() {
        assert_eq!(FileKeyValueStore::sanitize_key("a/b c"), "a_b_c");
        assert_eq!(
            FileKeyValueStore::sanitize_key("leadflow.global_history"),
            "leadflow.global_history"
        );
    }
}
