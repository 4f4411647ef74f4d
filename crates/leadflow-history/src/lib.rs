//! # LeadFlow History
//!
//! Per-scope interaction history with resumable cursors.
//!
//! ## Features
//!
//! - `last_index` cursor per scope so interrupted runs resume where they stopped
//! - Bounded record log per scope with FIFO eviction
//! - Global interaction total kept equal to the sum of retained records
//! - Whole-document read-modify-write on a single versioned key

pub mod error;
pub mod store;
pub mod types;

pub use error::HistoryError;
pub use store::{HistoryStore, DEFAULT_HISTORY_CAP, HISTORY_SCHEMA_VERSION};
pub use types::{
    GlobalHistory, HistoryStats, InteractionRecord, NewInteraction, ScopeHistory, ScopeStats,
};
