//! History store.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Utc;
use leadflow_store::{keys, load_versioned, migrate_key, save_versioned};
use leadflow_store::{KeyValueStore, MigrationOutcome, StoreError};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::HistoryError;
use crate::types::{
    GlobalHistory, HistoryStats, InteractionRecord, NewInteraction, ScopeHistory, ScopeStats,
};

/// Current schema version of the history envelope.
pub const HISTORY_SCHEMA_VERSION: u32 = 1;

/// Default number of records retained per scope.
pub const DEFAULT_HISTORY_CAP: usize = 500;

/// Persistent interaction history.
///
/// Every mutation loads the whole [`GlobalHistory`], changes a copy, and
/// writes it back under a single key. A failed write therefore leaves the
/// persisted state untouched and the call can be retried.
///
/// Mutations within one `HistoryStore` are serialized. Two stores (or two
/// processes) sharing the same backing store race with last-writer-wins,
/// so at most one orchestrator may run per scope.
pub struct HistoryStore {
    store: Arc<dyn KeyValueStore>,
    cap: AtomicUsize,
    write_lock: Mutex<()>,
}

impl HistoryStore {
    /// Create a history store with the default per-scope cap.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_cap(store, DEFAULT_HISTORY_CAP)
    }

    /// Create a history store with a custom per-scope cap.
    pub fn with_cap(store: Arc<dyn KeyValueStore>, cap: usize) -> Self {
        Self {
            store,
            cap: AtomicUsize::new(cap.max(1)),
            write_lock: Mutex::new(()),
        }
    }

    /// Per-scope record cap.
    pub fn cap(&self) -> usize {
        self.cap.load(Ordering::Relaxed)
    }

    /// Change the per-scope cap and trim every scope down to it.
    ///
    /// Oldest records go first and the total is recomputed. If the write
    /// fails the new cap still applies to later writes.
    pub async fn set_cap(&self, cap: usize) -> Result<(), HistoryError> {
        let cap = cap.max(1);
        let _guard = self.write_lock.lock().await;
        let previous = self.cap.swap(cap, Ordering::Relaxed);
        if cap >= previous {
            return Ok(());
        }

        let mut history = self.load().await?;
        let before = history.record_count();
        history.normalize(cap);
        let evicted = before - history.record_count();
        if evicted > 0 {
            self.save(&history).await?;
            info!("History cap lowered to {}, evicted {} records", cap, evicted);
        }
        Ok(())
    }

    async fn load(&self) -> Result<GlobalHistory, HistoryError> {
        let history =
            load_versioned(self.store.as_ref(), keys::GLOBAL_HISTORY, HISTORY_SCHEMA_VERSION)
                .await?;
        Ok(history.unwrap_or_default())
    }

    async fn save(&self, history: &GlobalHistory) -> Result<(), HistoryError> {
        save_versioned(
            self.store.as_ref(),
            keys::GLOBAL_HISTORY,
            HISTORY_SCHEMA_VERSION,
            history,
        )
        .await?;
        Ok(())
    }

    /// Reject empty or blank scope ids.
    pub fn check_scope(scope_id: &str) -> Result<(), HistoryError> {
        if scope_id.trim().is_empty() {
            return Err(HistoryError::InvalidScope(scope_id.to_string()));
        }
        Ok(())
    }

    /// Full history snapshot.
    pub async fn global(&self) -> Result<GlobalHistory, HistoryError> {
        self.load().await
    }

    /// History of one scope. Unknown scopes yield a fresh value that is not persisted.
    pub async fn get_scope_history(&self, scope_id: &str) -> Result<ScopeHistory, HistoryError> {
        let mut history = self.load().await?;
        Ok(history
            .scopes
            .remove(scope_id)
            .unwrap_or_else(|| ScopeHistory::new(scope_id)))
    }

    /// Index of the next target to process in a scope.
    pub async fn get_last_index(&self, scope_id: &str) -> Result<usize, HistoryError> {
        Ok(self.get_scope_history(scope_id).await?.last_index)
    }

    /// Record a successful interaction.
    ///
    /// Appends the record, advances `last_index` to `next_index` (never
    /// backwards), evicts the oldest records above the cap and persists.
    pub async fn record(
        &self,
        scope_id: &str,
        interaction: NewInteraction,
    ) -> Result<InteractionRecord, HistoryError> {
        Self::check_scope(scope_id)?;
        let _guard = self.write_lock.lock().await;

        let mut history = self.load().await?;
        let now = Utc::now();
        let record = InteractionRecord {
            interaction_id: format!(
                "{}-{}-{}",
                scope_id,
                now.timestamp_millis(),
                interaction.next_index
            ),
            target_id: interaction.target_id,
            target_name: interaction.target_name,
            message_text: interaction.message_text,
            timestamp: now,
        };

        let scope = history
            .scopes
            .entry(scope_id.to_string())
            .or_insert_with(|| ScopeHistory::new(scope_id));
        scope.records.push(record.clone());
        scope.last_index = scope.last_index.max(interaction.next_index);
        let evicted = scope.evict_over(self.cap()) as u64;

        history.total_interactions = (history.total_interactions + 1).saturating_sub(evicted);

        self.save(&history).await?;
        debug!(
            "Recorded interaction {} in scope '{}' (last_index={}, evicted={})",
            record.interaction_id, scope_id, interaction.next_index, evicted
        );
        Ok(record)
    }

    /// Clear a scope's records and reset its cursor to 0.
    pub async fn reset_scope(&self, scope_id: &str) -> Result<(), HistoryError> {
        let _guard = self.write_lock.lock().await;

        let mut history = self.load().await?;
        let Some(removed) = history.scopes.remove(scope_id) else {
            debug!("Reset of unknown scope '{}' is a no-op", scope_id);
            return Ok(());
        };

        let removed_count = removed.records.len() as u64;
        history.total_interactions = history.total_interactions.saturating_sub(removed_count);

        self.save(&history).await?;
        info!("Reset scope '{}' ({} records removed)", scope_id, removed_count);
        Ok(())
    }

    /// Replace the whole history with the empty default.
    pub async fn reset_all(&self) -> Result<(), HistoryError> {
        let _guard = self.write_lock.lock().await;
        self.save(&GlobalHistory::default()).await?;
        info!("Reset all interaction history");
        Ok(())
    }

    /// Totals and per-scope summaries.
    pub async fn get_stats(&self) -> Result<HistoryStats, HistoryError> {
        let history = self.load().await?;
        let per_scope = history
            .scopes
            .iter()
            .map(|(id, scope)| {
                (
                    id.clone(),
                    ScopeStats {
                        count: scope.records.len(),
                        last_interaction_timestamp: scope.records.last().map(|r| r.timestamp),
                        last_index: scope.last_index,
                    },
                )
            })
            .collect();

        Ok(HistoryStats {
            total_interactions: history.total_interactions,
            per_scope,
        })
    }

    /// Most recent records of a scope, newest first.
    pub async fn recent(
        &self,
        scope_id: &str,
        limit: usize,
    ) -> Result<Vec<InteractionRecord>, HistoryError> {
        let scope = self.get_scope_history(scope_id).await?;
        Ok(scope.records.into_iter().rev().take(limit).collect())
    }

    /// Whether a target appears among a scope's retained records.
    pub async fn contacted(&self, scope_id: &str, target_id: &str) -> Result<bool, HistoryError> {
        let scope = self.get_scope_history(scope_id).await?;
        Ok(scope.records.iter().any(|r| r.target_id == target_id))
    }

    /// Move an unversioned legacy history blob under the canonical key.
    pub async fn migrate(&self) -> Result<MigrationOutcome, HistoryError> {
        let _guard = self.write_lock.lock().await;
        let cap = self.cap();
        let outcome = migrate_key(
            self.store.as_ref(),
            keys::LEGACY_HISTORY,
            keys::GLOBAL_HISTORY,
            HISTORY_SCHEMA_VERSION,
            move |legacy| {
                let mut history: GlobalHistory = serde_json::from_value(legacy)?;
                history.normalize(cap);
                serde_json::to_value(history).map_err(StoreError::from)
            },
        )
        .await?;
        Ok(outcome)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
