//! One-shot migration from legacy unversioned keys.

use serde_json::Value;
use tracing::{info, warn};

use crate::error::StoreError;
use crate::kv::KeyValueStore;
use crate::schema::Versioned;

/// Result of migrating a single key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Neither the legacy nor the canonical key exists.
    NothingToMigrate,
    /// The canonical key already exists; any stale legacy key was dropped.
    AlreadyCurrent,
    /// The legacy value was converted and written under the canonical key.
    Migrated,
}

/// Move `legacy_key` into a versioned envelope under `canonical_key`.
///
/// The canonical value is written before the legacy key is removed, so an
/// interrupted migration is simply repeated on the next startup.
pub async fn migrate_key<F>(
    store: &dyn KeyValueStore,
    legacy_key: &str,
    canonical_key: &str,
    schema_version: u32,
    transform: F,
) -> Result<MigrationOutcome, StoreError>
where
    F: FnOnce(Value) -> Result<Value, StoreError> + Send,
{
    let mut values = store.get(&[legacy_key, canonical_key]).await?;
    let legacy = values.remove(legacy_key);
    let canonical_present = values.contains_key(canonical_key);

    match (legacy, canonical_present) {
        (None, false) => Ok(MigrationOutcome::NothingToMigrate),
        (None, true) => Ok(MigrationOutcome::AlreadyCurrent),
        (Some(_), true) => {
            warn!(
                "Dropping stale legacy key '{}', '{}' is authoritative",
                legacy_key, canonical_key
            );
            store.remove(&[legacy_key]).await?;
            Ok(MigrationOutcome::AlreadyCurrent)
        }
        (Some(legacy), false) => {
            let data = transform(legacy)?;
            let envelope = serde_json::to_value(Versioned::new(schema_version, data))?;
            store.set_one(canonical_key, envelope).await?;
            store.remove(&[legacy_key]).await?;
            info!(
                "Migrated '{}' to '{}' (schema v{})",
                legacy_key, canonical_key, schema_version
            );
            Ok(MigrationOutcome::Migrated)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKeyValueStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_nothing_to_migrate() {
        let store = MemoryKeyValueStore::new();
        let outcome = migrate_key(&store, "old", "new", 1, |v| Ok(v)).await.unwrap();
        assert_eq!(outcome, MigrationOutcome::NothingToMigrate);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_migrates_legacy_value() {
        let store = MemoryKeyValueStore::new();
        store.set_one("old", json!({"n": 1})).await.unwrap();

        let outcome = migrate_key(&store, "old", "new", 2, |v| {
            Ok(json!({"n": v["n"].as_i64().unwrap_or(0) + 1}))
        })
        .await
        .unwrap();

        assert_eq!(outcome, MigrationOutcome::Migrated);
        assert!(store.get_one("old").await.unwrap().is_none());
        assert_eq!(
            store.get_one("new").await.unwrap(),
            Some(json!({"schema_version": 2, "data": {"n": 2}}))
        );
    }

    #[tokio::test]
    async fn test_second_run_is_noop() {
        let store = MemoryKeyValueStore::new();
        store.set_one("old", json!(1)).await.unwrap();

        migrate_key(&store, "old", "new", 1, |v| Ok(v)).await.unwrap();
        let outcome = migrate_key(&store, "old", "new", 1, |v| Ok(v)).await.unwrap();
        assert_eq!(outcome, MigrationOutcome::AlreadyCurrent);
    }

    #[tokio::test]
    async fn test_stale_legacy_key_removed_without_overwrite() {
        let store = MemoryKeyValueStore::new();
        store.set_one("old", json!("legacy")).await.unwrap();
        store
            .set_one("new", json!({"schema_version": 1, "data": "current"}))
            .await
            .unwrap();

        let outcome = migrate_key(&store, "old", "new", 1, |v| Ok(v)).await.unwrap();
        assert_eq!(outcome, MigrationOutcome::AlreadyCurrent);
        assert!(store.get_one("old").await.unwrap().is_none());
        assert_eq!(store.get_one("new").await.unwrap().unwrap()["data"], json!("current"));
    }

    #[tokio::test]
    async fn test_failed_write_keeps_legacy_key() {
        let store = MemoryKeyValueStore::new();
        store.set_one("old", json!(1)).await.unwrap();
        store.set_read_only(true);

        assert!(migrate_key(&store, "old", "new", 1, |v| Ok(v)).await.is_err());
        assert_eq!(store.get_one("old").await.unwrap(), Some(json!(1)));
    }
}
