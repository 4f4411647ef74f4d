//! # LeadFlow Monitor
//!
//! Failure detection and escalating recovery for the outreach loop.
//!
//! ## Features
//!
//! - Failure marker detection on page signals (block pages, login walls)
//! - Escalation by attempt count: log-only, wait-and-retry, pause
//! - User-facing notifications through pluggable notifiers
//! - Externally driven periodic scan loop

pub mod error;
pub mod notification;
pub mod recovery;
pub mod signal;

pub use error::MonitorError;
pub use notification::{LogNotifier, Notification, NotificationSeverity, Notifier};
pub use recovery::{
    ErrorRecoveryMonitor, Pausable, RecoveryAction, RecoveryEvent, RecoveryState,
};
pub use signal::{FailureMarkers, PageSignal, PageSignalSource};
