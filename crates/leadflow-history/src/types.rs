//! History data structures.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One successful interaction. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    #[serde(alias = "targetId")]
    pub target_id: String,
    #[serde(alias = "targetName")]
    pub target_name: String,
    #[serde(alias = "messageText")]
    pub message_text: String,
    /// `{scope}-{epoch_ms}-{next_index}`.
    #[serde(alias = "interactionId")]
    pub interaction_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Input to [`HistoryStore::record`](crate::HistoryStore::record).
#[derive(Debug, Clone)]
pub struct NewInteraction {
    pub target_id: String,
    pub target_name: String,
    pub message_text: String,
    /// Index of the next target to process once this one is recorded.
    pub next_index: usize,
}

/// History of a single scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeHistory {
    #[serde(default, alias = "scopeId")]
    pub scope_id: String,
    #[serde(default, alias = "lastIndex")]
    pub last_index: usize,
    #[serde(default)]
    pub records: Vec<InteractionRecord>,
}

impl ScopeHistory {
    /// Fresh, empty history for a scope.
    pub fn new(scope_id: impl Into<String>) -> Self {
        Self {
            scope_id: scope_id.into(),
            last_index: 0,
            records: Vec::new(),
        }
    }

    /// Drop the oldest records beyond `cap`. Returns how many were dropped.
    pub(crate) fn evict_over(&mut self, cap: usize) -> usize {
        let excess = self.records.len().saturating_sub(cap);
        if excess > 0 {
            self.records.drain(..excess);
        }
        excess
    }
}

/// Every scope's history plus the running total.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalHistory {
    #[serde(default, alias = "totalInteractions")]
    pub total_interactions: u64,
    #[serde(default, alias = "groups")]
    pub scopes: BTreeMap<String, ScopeHistory>,
}

impl GlobalHistory {
    /// Sum of all retained records across scopes.
    pub fn record_count(&self) -> u64 {
        self.scopes.values().map(|s| s.records.len() as u64).sum()
    }

    /// Repair fields that older writers may have left inconsistent.
    pub(crate) fn normalize(&mut self, cap: usize) {
        for (id, scope) in self.scopes.iter_mut() {
            if scope.scope_id.is_empty() {
                scope.scope_id = id.clone();
            }
            scope.evict_over(cap);
        }
        self.total_interactions = self.record_count();
    }
}

/// Aggregate view for the UI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryStats {
    pub total_interactions: u64,
    pub per_scope: BTreeMap<String, ScopeStats>,
}

/// Per-scope summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeStats {
    pub count: usize,
    pub last_interaction_timestamp: Option<DateTime<Utc>>,
    pub last_index: usize,
}
