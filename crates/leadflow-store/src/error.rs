//! Store errors.

use thiserror::Error;

/// Store error types.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The store rejected a write.
    #[error("Store is read-only: {0}")]
    ReadOnly(String),

    /// A persisted envelope was written by a newer schema.
    #[error("Unsupported schema version {found} for key '{key}' (max {supported})")]
    UnsupportedSchema {
        key: String,
        found: u32,
        supported: u32,
    },

    /// Generic error.
    #[error("{0}")]
    Custom(String),
}
