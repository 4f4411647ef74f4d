//! Run lifecycle types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Orchestrator lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// No run started yet.
    #[default]
    Idle,
    /// Processing targets.
    Running,
    /// Suspended at a checkpoint until resumed.
    Paused,
    /// Every target was processed.
    Completed,
    /// Ended early by request, rate limit or persistence failure.
    Stopped,
}

impl RunState {
    /// Whether a run currently owns the orchestrator.
    pub fn is_active(self) -> bool {
        matches!(self, RunState::Running | RunState::Paused)
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Idle => write!(f, "idle"),
            RunState::Running => write!(f, "running"),
            RunState::Paused => write!(f, "paused"),
            RunState::Completed => write!(f, "completed"),
            RunState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Options for a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartOptions {
    /// Resume from the scope's `last_index` instead of index 0.
    pub continue_from_last: bool,
}

impl Default for StartOptions {
    fn default() -> Self {
        Self {
            continue_from_last: true,
        }
    }
}

/// Snapshot published to progress subscribers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub scope_id: Option<String>,
    pub state: RunState,
    pub current_index: usize,
    pub total: usize,
    pub is_running: bool,
    pub is_paused: bool,
    pub succeeded: usize,
    pub failed: usize,
}

impl Progress {
    pub(crate) fn set_state(&mut self, state: RunState) {
        self.state = state;
        self.is_running = state.is_active();
        self.is_paused = state == RunState::Paused;
    }
}

/// Why a run ended before processing every target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum StopReason {
    /// `stop()` was called.
    Requested,
    /// The hourly or daily limit was reached.
    RateLimitExceeded {
        next_available_at: Option<DateTime<Utc>>,
    },
    /// A successful interaction could not be written to history.
    PersistenceFailure { message: String },
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::Requested => write!(f, "stopped by request"),
            StopReason::RateLimitExceeded {
                next_available_at: Some(at),
            } => write!(f, "rate limit reached, next slot at {}", at.to_rfc3339()),
            StopReason::RateLimitExceeded { .. } => write!(f, "rate limit reached"),
            StopReason::PersistenceFailure { message } => {
                write!(f, "history write failed: {}", message)
            }
        }
    }
}

/// Final report of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub scope_id: String,
    /// `Completed` or `Stopped`.
    pub state: RunState,
    pub stop_reason: Option<StopReason>,
    pub start_index: usize,
    pub end_index: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        self.state == RunState::Completed
    }
}
