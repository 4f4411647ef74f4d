//! Persisted rate-limit configuration.

use leadflow_config::RateLimitConfig;
use serde::Deserialize;
use serde_json::Value;

use crate::error::StoreError;
use crate::kv::KeyValueStore;
use crate::migrate::{migrate_key, MigrationOutcome};
use crate::schema::{keys, load_versioned, save_versioned};

/// Current schema version of the rate-limit configuration envelope.
pub const RATE_LIMIT_SCHEMA_VERSION: u32 = 1;

/// Load the persisted rate-limit configuration, if any.
pub async fn load_rate_limit_config(
    store: &dyn KeyValueStore,
) -> Result<Option<RateLimitConfig>, StoreError> {
    load_versioned(store, keys::RATE_LIMIT_CONFIG, RATE_LIMIT_SCHEMA_VERSION).await
}

/// Persist the rate-limit configuration.
pub async fn save_rate_limit_config(
    store: &dyn KeyValueStore,
    config: &RateLimitConfig,
) -> Result<(), StoreError> {
    save_versioned(store, keys::RATE_LIMIT_CONFIG, RATE_LIMIT_SCHEMA_VERSION, config).await
}

/// Legacy settings blob (camelCase, delay stored in `delay` or `delayMs`).
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyRateLimits {
    max_per_hour: Option<u32>,
    max_per_day: Option<u32>,
    #[serde(alias = "delay", alias = "delayMs")]
    interaction_delay_ms: Option<u64>,
}

/// Convert the legacy rate-limit key into the canonical envelope.
pub async fn migrate_rate_limit_config(
    store: &dyn KeyValueStore,
) -> Result<MigrationOutcome, StoreError> {
    migrate_key(
        store,
        keys::LEGACY_RATE_LIMITS,
        keys::RATE_LIMIT_CONFIG,
        RATE_LIMIT_SCHEMA_VERSION,
        convert_legacy,
    )
    .await
}

fn convert_legacy(legacy: Value) -> Result<Value, StoreError> {
    let legacy: LegacyRateLimits = serde_json::from_value(legacy)?;
    let defaults = RateLimitConfig::default();
    let config = RateLimitConfig {
        max_per_hour: legacy.max_per_hour.unwrap_or(defaults.max_per_hour),
        max_per_day: legacy.max_per_day.unwrap_or(defaults.max_per_day),
        interaction_delay_ms: legacy
            .interaction_delay_ms
            .unwrap_or(defaults.interaction_delay_ms),
    };
    Ok(serde_json::to_value(config)?)
}
