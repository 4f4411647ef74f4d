//! # LeadFlow Outreach
//!
//! Throttled, resumable interaction processing.
//!
//! ## Features
//!
//! - Rolling hourly and daily rate limits
//! - Ordered, de-duplicated target queue that resumes from history
//! - Random or round-robin message templates with placeholders
//! - Pause, resume and stop at safe checkpoints
//! - Progress events over a watch channel
//! - Escalation to the recovery monitor on repeated failures

pub mod error;
pub mod orchestrator;
pub mod performer;
pub mod queue;
pub mod rate_limit;
pub mod selector;
pub mod state;
pub mod target;

pub use error::OutreachError;
pub use orchestrator::{Orchestrator, RunHandle};
pub use performer::{InteractionPerformer, PerformError};
pub use queue::InteractionQueue;
pub use rate_limit::{RateLimitUsage, RateLimiter};
pub use selector::{DEFAULT_MESSAGE, MessageSelector};
pub use state::{Progress, RunOutcome, RunState, StartOptions, StopReason};
pub use target::InteractionTarget;
