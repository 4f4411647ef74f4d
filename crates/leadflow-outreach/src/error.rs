//! Outreach errors.

use leadflow_config::ConfigError;
use leadflow_history::HistoryError;
use thiserror::Error;

use crate::state::RunState;

/// Errors from the orchestrator lifecycle.
#[derive(Debug, Error)]
pub enum OutreachError {
    /// A run is already in progress.
    #[error("A run is already in progress")]
    AlreadyRunning,

    /// No run is in progress.
    #[error("No run is in progress")]
    NotRunning,

    /// The run is not paused.
    #[error("The run is not paused")]
    NotPaused,

    /// Invalid state transition.
    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: RunState, to: RunState },

    /// Runtime options produced an invalid configuration.
    #[error("Invalid options: {0}")]
    InvalidOptions(#[from] ConfigError),

    /// History persistence error.
    #[error("History error: {0}")]
    History(#[from] HistoryError),

    /// The performer or the processing task failed outside a single interaction.
    #[error("Performer error: {0}")]
    Performer(String),
}
