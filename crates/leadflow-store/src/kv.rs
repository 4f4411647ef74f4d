//! Key-value store contract.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::StoreError;

/// Asynchronous key-value store.
///
/// Every operation may fail; callers must propagate failures rather than
/// assume a write landed.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the given keys. Missing keys are absent from the result.
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>, StoreError>;

    /// Write all entries.
    async fn set(&self, entries: HashMap<String, Value>) -> Result<(), StoreError>;

    /// Remove the given keys. Removing a missing key is not an error.
    async fn remove(&self, keys: &[&str]) -> Result<(), StoreError>;

    /// Read a single key.
    async fn get_one(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let mut values = self.get(&[key]).await?;
        Ok(values.remove(key))
    }

    /// Write a single key.
    async fn set_one(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut entries = HashMap::with_capacity(1);
        entries.insert(key.to_string(), value);
        self.set(entries).await
    }
}

/// In-memory key-value store.
pub struct MemoryKeyValueStore {
    entries: RwLock<HashMap<String, Value>>,
    read_only: AtomicBool,
}

impl MemoryKeyValueStore {
    /// Create a new memory store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            read_only: AtomicBool::new(false),
        }
    }

    /// Reject all subsequent writes, as a full storage quota would.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Check if the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(StoreError::ReadOnly("memory store quota exceeded".to_string()));
        }
        Ok(())
    }
}

impl Default for MemoryKeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>, StoreError> {
        let entries = self.entries.read().await;
        Ok(keys
            .iter()
            .filter_map(|k| entries.get(*k).map(|v| (k.to_string(), v.clone())))
            .collect())
    }

    async fn set(&self, new_entries: HashMap<String, Value>) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut entries = self.entries.write().await;
        entries.extend(new_entries);
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut entries = self.entries.write().await;
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_store_set_get() {
        let store = MemoryKeyValueStore::new();
        store.set_one("a", json!(1)).await.unwrap();
        store.set_one("b", json!({"x": true})).await.unwrap();

        let values = store.get(&["a", "b", "missing"]).await.unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values["a"], json!(1));
        assert_eq!(values["b"]["x"], json!(true));
    }

    #[tokio::test]
    async fn test_memory_store_remove() {
        let store = MemoryKeyValueStore::new();
        store.set_one("a", json!("value")).await.unwrap();
        store.remove(&["a", "never-set"]).await.unwrap();

        assert!(store.get_one("a").await.unwrap().is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_read_only_rejects_writes() {
        let store = MemoryKeyValueStore::new();
        store.set_one("a", json!(1)).await.unwrap();
        store.set_read_only(true);

        let result = store.set_one("a", json!(2)).await;
        assert!(matches!(result, Err(StoreError::ReadOnly(_))));
        assert!(store.remove(&["a"]).await.is_err());

        // Reads still work and the previous value is intact.
        assert_eq!(store.get_one("a").await.unwrap(), Some(json!(1)));

        store.set_read_only(false);
        store.set_one("a", json!(2)).await.unwrap();
        assert_eq!(store.get_one("a").await.unwrap(), Some(json!(2)));
    }
}
