//! Monitor errors.

use thiserror::Error;

/// Monitor error types.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// A failure marker is not a valid regular expression.
    #[error("Invalid failure marker pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Notification delivery failed.
    #[error("Notification delivery failed: {0}")]
    Notification(String),

    #[error("{0}")]
    Custom(String),
}
