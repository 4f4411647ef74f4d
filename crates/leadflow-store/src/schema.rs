//! Versioned storage envelopes.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::kv::KeyValueStore;

/// Canonical and legacy storage keys.
pub mod keys {
    /// Canonical key for the global interaction history.
    pub const GLOBAL_HISTORY: &str = "leadflow.global_history";
    /// Canonical key for the persisted rate-limit configuration.
    pub const RATE_LIMIT_CONFIG: &str = "leadflow.rate_limit_config";

    /// Unversioned history blob written by earlier releases.
    pub const LEGACY_HISTORY: &str = "history";
    /// Unversioned rate-limit settings written by earlier releases.
    pub const LEGACY_RATE_LIMITS: &str = "rateLimits";
}

/// A persisted value tagged with the schema version that wrote it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub schema_version: u32,
    pub data: T,
}

impl<T> Versioned<T> {
    pub fn new(schema_version: u32, data: T) -> Self {
        Self {
            schema_version,
            data,
        }
    }
}

/// Load a versioned value.
///
/// Returns `Ok(None)` if the key is absent. Envelopes written by a newer
/// schema than `supported` are rejected rather than misread.
pub async fn load_versioned<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
    supported: u32,
) -> Result<Option<T>, StoreError> {
    let Some(value) = store.get_one(key).await? else {
        return Ok(None);
    };

    let envelope: Versioned<T> = serde_json::from_value(value)?;
    if envelope.schema_version > supported {
        return Err(StoreError::UnsupportedSchema {
            key: key.to_string(),
            found: envelope.schema_version,
            supported,
        });
    }

    Ok(Some(envelope.data))
}

/// Save a value wrapped in a versioned envelope.
pub async fn save_versioned<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    schema_version: u32,
    data: &T,
) -> Result<(), StoreError> {
    let value = serde_json::to_value(Versioned::new(schema_version, data))?;
    store.set_one(key, value).await
}
