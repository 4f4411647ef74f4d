//! History errors.

use leadflow_store::StoreError;
use thiserror::Error;

/// History error types.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// The underlying store failed to read or write.
    #[error("Persistence failure: {0}")]
    Persistence(#[from] StoreError),

    /// Scope identifier is empty.
    #[error("Invalid scope id: {0:?}")]
    InvalidScope(String),
}
