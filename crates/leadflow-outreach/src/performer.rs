//! The external interaction action.

use async_trait::async_trait;
use thiserror::Error;

use crate::target::InteractionTarget;

/// Failure raised by a performer.
#[derive(Debug, Error)]
pub enum PerformError {
    /// The target could not be reached on the automated surface.
    #[error("Target unreachable: {0}")]
    Unreachable(String),

    #[error("{0}")]
    Custom(String),
}

/// Sends one message to one target.
///
/// `Ok(false)` and `Err(_)` both count as a failed interaction. The
/// orchestrator never cancels an in-flight call.
#[async_trait]
pub trait InteractionPerformer: Send + Sync {
    async fn perform(
        &self,
        target: &InteractionTarget,
        message: &str,
    ) -> Result<bool, PerformError>;
}
