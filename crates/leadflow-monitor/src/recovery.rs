//! Escalating error recovery.
//!
//! The monitor counts consecutive failure detections and maps the count to
//! an action:
//!
//! | attempts | action                              |
//! |----------|-------------------------------------|
//! | 1..=2    | [`RecoveryAction::LogOnly`]         |
//! | 3..=5    | [`RecoveryAction::WaitAndRetry`]    |
//! | > 5      | [`RecoveryAction::PauseOperation`]  |
//!
//! A clean scan while in recovery mode clears the attempt counter.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use leadflow_config::RecoveryConfig;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::error::MonitorError;
use crate::notification::{LogNotifier, Notification, NotificationSeverity, Notifier};
use crate::signal::{FailureMarkers, PageSignal, PageSignalSource};

/// Wait added per attempt in the retry band.
pub const RETRY_DELAY_STEP: Duration = Duration::from_millis(3000);

const LOG_ONLY_MAX_ATTEMPTS: u32 = 2;
const RETRY_MAX_ATTEMPTS: u32 = 5;

/// Mutable recovery bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryState {
    pub recovery_attempts: u32,
    pub last_error_time: Option<DateTime<Utc>>,
    pub is_in_recovery_mode: bool,
}

/// What the caller should do after a scan or escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Nothing detected.
    None,
    /// Record the failure and carry on.
    LogOnly,
    /// Back off for the given duration, then continue.
    WaitAndRetry(Duration),
    /// Halt the automated operation and tell the user.
    PauseOperation,
}

impl RecoveryAction {
    /// Strategy for the given attempt count.
    pub fn for_attempts(attempts: u32) -> Self {
        match attempts {
            0 => RecoveryAction::None,
            1..=LOG_ONLY_MAX_ATTEMPTS => RecoveryAction::LogOnly,
            n if n <= RETRY_MAX_ATTEMPTS => RecoveryAction::WaitAndRetry(RETRY_DELAY_STEP * n),
            _ => RecoveryAction::PauseOperation,
        }
    }
}

/// Events broadcast to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryEvent {
    /// A failure was detected or escalated.
    ErrorDetected { attempts: u32, reason: String },
    /// A back-off finished.
    RetryReady { attempts: u32 },
    /// The operation was paused.
    OperationPaused { attempts: u32 },
    /// A clean scan ended recovery mode.
    Recovered,
}

/// Something the monitor can halt.
#[async_trait]
pub trait Pausable: Send + Sync {
    /// Pause the operation. Returns `false` if it was not running.
    fn pause_for_recovery(&self, reason: &str) -> bool;

    /// Resolves once the operation has been stopped. Cuts retry waits short.
    async fn stopped(&self) {
        std::future::pending::<()>().await
    }
}

/// Detects failure conditions and escalates the response.
pub struct ErrorRecoveryMonitor {
    markers: FailureMarkers,
    state: Mutex<RecoveryState>,
    notifier: Arc<dyn Notifier>,
    events: broadcast::Sender<RecoveryEvent>,
}

impl ErrorRecoveryMonitor {
    /// Create a monitor from configuration. Notifications go to the log.
    pub fn new(config: &RecoveryConfig) -> Result<Self, MonitorError> {
        let markers = FailureMarkers::new(&config.failure_markers)?;
        let (events, _) = broadcast::channel(64);
        Ok(Self {
            markers,
            state: Mutex::new(RecoveryState::default()),
            notifier: Arc::new(LogNotifier),
            events,
        })
    }

    /// Replace the notifier.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Snapshot of the recovery state.
    pub fn state(&self) -> RecoveryState {
        self.state.lock().clone()
    }

    /// Subscribe to recovery events.
    pub fn subscribe(&self) -> broadcast::Receiver<RecoveryEvent> {
        self.events.subscribe()
    }

    /// Check a page signal for failure markers.
    pub fn scan(&self, signal: &PageSignal, now: DateTime<Utc>) -> RecoveryAction {
        match self.markers.detect(signal) {
            Some(marker) => {
                let reason = format!("failure marker '{}' detected", marker);
                self.register_error(reason, now)
            }
            None => {
                self.mark_healthy();
                RecoveryAction::None
            }
        }
    }

    /// Register a failure reported by something other than a page scan.
    pub fn escalate(&self, reason: &str, now: DateTime<Utc>) -> RecoveryAction {
        self.register_error(reason.to_string(), now)
    }

    /// Leave recovery mode. `last_error_time` is kept.
    pub fn mark_healthy(&self) {
        let mut state = self.state.lock();
        if !state.is_in_recovery_mode {
            return;
        }
        state.recovery_attempts = 0;
        state.is_in_recovery_mode = false;
        drop(state);

        info!("Recovered from error condition");
        let _ = self.events.send(RecoveryEvent::Recovered);
    }

    fn register_error(&self, reason: String, now: DateTime<Utc>) -> RecoveryAction {
        let attempts = {
            let mut state = self.state.lock();
            state.recovery_attempts = state.recovery_attempts.saturating_add(1);
            state.last_error_time = Some(now);
            state.is_in_recovery_mode = true;
            state.recovery_attempts
        };

        let action = RecoveryAction::for_attempts(attempts);
        warn!(
            "Error detected (attempt {}): {} -> {:?}",
            attempts, reason, action
        );
        let _ = self
            .events
            .send(RecoveryEvent::ErrorDetected { attempts, reason });
        action
    }

    /// Carry out an action against the operation it guards.
    pub async fn apply(&self, action: RecoveryAction, target: &dyn Pausable) {
        let attempts = self.state.lock().recovery_attempts;
        match action {
            RecoveryAction::None => {}
            RecoveryAction::LogOnly => {
                debug!("Recovery attempt {} logged, no action taken", attempts);
            }
            RecoveryAction::WaitAndRetry(delay) => {
                info!(
                    "Waiting {}ms before retrying (attempt {})",
                    delay.as_millis(),
                    attempts
                );
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {
                        let _ = self.events.send(RecoveryEvent::RetryReady { attempts });
                    }
                    _ = target.stopped() => {
                        info!("Operation stopped during retry wait (attempt {})", attempts);
                    }
                }
            }
            RecoveryAction::PauseOperation => {
                let paused = target.pause_for_recovery("recovery attempts exhausted");
                if paused {
                    error!("Operation paused after {} recovery attempts", attempts);
                }
                let _ = self
                    .events
                    .send(RecoveryEvent::OperationPaused { attempts });

                let notification = Notification::new(
                    "Automation paused",
                    format!(
                        "Repeated errors were detected ({} attempts). Check the page and resume when ready.",
                        attempts
                    ),
                    NotificationSeverity::Critical,
                )
                .with_source("recovery");
                if let Err(e) = self.notifier.notify(&notification).await {
                    error!("Failed to deliver notification via {}: {}", self.notifier.name(), e);
                }
            }
        }
    }

    /// Periodic scan loop. Runs until `shutdown` fires.
    pub async fn run(
        self: Arc<Self>,
        source: Arc<dyn PageSignalSource>,
        target: Arc<dyn Pausable>,
        interval: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        info!("Recovery monitor started (interval {:?})", interval);
        let mut ticker = tokio::time::interval(interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let signal = match source.capture().await {
                        Ok(signal) => signal,
                        Err(e) => {
                            warn!("Failed to capture page signal: {}", e);
                            continue;
                        }
                    };
                    let action = self.scan(&signal, Utc::now());
                    self.apply(action, target.as_ref()).await;
                }
                _ = shutdown.recv() => {
                    info!("Recovery monitor shutting down");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
