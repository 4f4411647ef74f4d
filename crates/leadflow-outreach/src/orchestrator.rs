//! Run orchestration.
//!
//! The [`Orchestrator`] owns the rate limiter and message selector, borrows
//! the history store and performer, and drives one sequential processing
//! loop per run on a spawned tokio task.
//!
//! Lifecycle: `Idle -> Running -> (Paused <-> Running) -> Completed | Stopped`.
//! Pause and stop take effect at checkpoints between interactions; an
//! in-flight `perform` call is never cancelled.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use leadflow_config::{Config, ConfigValidator, RuntimeOptions};
use leadflow_history::{HistoryStore, NewInteraction};
use leadflow_monitor::{ErrorRecoveryMonitor, Pausable};
use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::OutreachError;
use crate::performer::InteractionPerformer;
use crate::queue::InteractionQueue;
use crate::rate_limit::{RateLimitUsage, RateLimiter};
use crate::selector::MessageSelector;
use crate::state::{Progress, RunOutcome, RunState, StartOptions, StopReason};
use crate::target::InteractionTarget;

#[derive(Debug, Clone, Copy)]
struct RunSettings {
    interaction_delay: Duration,
    continue_from_last: bool,
    failure_threshold: u32,
}

impl RunSettings {
    fn from_config(config: &Config) -> Self {
        Self {
            interaction_delay: Duration::from_millis(config.rate_limit.interaction_delay_ms),
            continue_from_last: config.run.continue_from_last,
            failure_threshold: config.recovery.consecutive_failure_threshold.max(1),
        }
    }
}

struct Inner {
    /// Effective configuration: file values with runtime options applied.
    config: RwLock<Config>,
    history: Arc<HistoryStore>,
    performer: Arc<dyn InteractionPerformer>,
    monitor: RwLock<Option<Arc<ErrorRecoveryMonitor>>>,
    limiter: Mutex<RateLimiter>,
    selector: RwLock<MessageSelector>,
    settings: RwLock<RunSettings>,
    /// Source of truth for the lifecycle state.
    state: watch::Sender<RunState>,
    progress: watch::Sender<Progress>,
    /// Set from `start` until the final state is published. The final
    /// state is sent while this lock is held, so a caller reacting to it
    /// can start the next run straight away.
    busy: Mutex<bool>,
}

/// Top-level controller for throttled, resumable runs.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

/// Handle to a spawned run.
pub struct RunHandle {
    join: JoinHandle<RunOutcome>,
}

impl RunHandle {
    /// Wait for the run to finish.
    pub async fn wait(self) -> Result<RunOutcome, OutreachError> {
        self.join
            .await
            .map_err(|e| OutreachError::Performer(format!("run task failed: {}", e)))
    }
}

impl Orchestrator {
    /// Create an orchestrator from configuration.
    pub fn new(
        config: &Config,
        history: Arc<HistoryStore>,
        performer: Arc<dyn InteractionPerformer>,
    ) -> Self {
        let settings = RunSettings::from_config(config);
        let (state, _) = watch::channel(RunState::Idle);
        let (progress, _) = watch::channel(Progress::default());

        Self {
            inner: Arc::new(Inner {
                config: RwLock::new(config.clone()),
                history,
                performer,
                monitor: RwLock::new(None),
                limiter: Mutex::new(RateLimiter::new(config.rate_limit.clone())),
                selector: RwLock::new(MessageSelector::new(
                    config.messages.templates.clone(),
                    config.messages.policy,
                )),
                settings: RwLock::new(settings),
                state,
                progress,
                busy: Mutex::new(false),
            }),
        }
    }

    /// Attach a recovery monitor for consecutive-failure escalation.
    pub fn set_monitor(&self, monitor: Arc<ErrorRecoveryMonitor>) {
        *self.inner.monitor.write() = Some(monitor);
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RunState {
        *self.inner.state.borrow()
    }

    /// Latest progress snapshot.
    pub fn get_progress(&self) -> Progress {
        self.inner.progress.borrow().clone()
    }

    /// Subscribe to progress updates.
    pub fn subscribe(&self) -> watch::Receiver<Progress> {
        self.inner.progress.subscribe()
    }

    /// Whether a run defaults to resuming from history.
    pub fn continue_from_last(&self) -> bool {
        self.inner.settings.read().continue_from_last
    }

    /// Current rate-limit usage.
    pub fn rate_limit_usage(&self) -> RateLimitUsage {
        self.inner.limiter.lock().usage(Utc::now().timestamp_millis())
    }

    /// Apply UI options. Only allowed between runs.
    ///
    /// The options are overlaid on the effective configuration and
    /// validated as a whole; invalid options leave everything unchanged.
    pub async fn configure(&self, options: &RuntimeOptions) -> Result<(), OutreachError> {
        self.inner.claim()?;
        let result = self.inner.apply_options(options).await;
        *self.inner.busy.lock() = false;
        result
    }

    /// Start processing `targets` for `scope_id`.
    pub async fn start(
        &self,
        scope_id: &str,
        targets: Vec<InteractionTarget>,
        options: StartOptions,
    ) -> Result<RunHandle, OutreachError> {
        HistoryStore::check_scope(scope_id)?;
        self.inner.claim()?;

        let start_index = if options.continue_from_last {
            match self.inner.history.get_last_index(scope_id).await {
                Ok(index) => index,
                Err(e) => {
                    *self.inner.busy.lock() = false;
                    return Err(e.into());
                }
            }
        } else {
            0
        };

        let mut queue = InteractionQueue::new(targets);
        queue.seek(start_index);

        self.inner.progress.send_modify(|p| {
            *p = Progress {
                scope_id: Some(scope_id.to_string()),
                current_index: queue.position(),
                total: queue.len(),
                ..Progress::default()
            };
        });
        self.inner.set_state(RunState::Running);

        info!(
            "Starting run for scope '{}' at index {} of {}",
            scope_id,
            queue.position(),
            queue.len()
        );

        let inner = self.inner.clone();
        let scope_id = scope_id.to_string();
        let join = tokio::spawn(async move { inner.run_loop(scope_id, queue).await });

        Ok(RunHandle { join })
    }

    /// Suspend the run at the next checkpoint.
    pub fn pause(&self) -> Result<(), OutreachError> {
        self.inner.transition(&[RunState::Running], RunState::Paused)?;
        info!("Run paused");
        Ok(())
    }

    /// Continue a paused run.
    pub fn resume(&self) -> Result<(), OutreachError> {
        self.inner
            .transition(&[RunState::Paused], RunState::Running)
            .map_err(|_| OutreachError::NotPaused)?;
        info!("Run resumed");
        Ok(())
    }

    /// End the run at the next checkpoint. Recorded history is kept.
    pub fn stop(&self) -> Result<(), OutreachError> {
        self.inner
            .transition(&[RunState::Running, RunState::Paused], RunState::Stopped)?;
        info!("Run stop requested");
        Ok(())
    }
}

#[async_trait]
impl Pausable for Orchestrator {
    fn pause_for_recovery(&self, reason: &str) -> bool {
        self.inner.pause_for_recovery(reason)
    }

    async fn stopped(&self) {
        self.inner.stopped().await
    }
}

#[async_trait]
impl Pausable for Inner {
    fn pause_for_recovery(&self, reason: &str) -> bool {
        let paused = self
            .transition(&[RunState::Running], RunState::Paused)
            .is_ok();
        if paused {
            warn!("Run paused by recovery monitor: {}", reason);
        }
        paused
    }

    async fn stopped(&self) {
        let mut state = self.state.subscribe();
        let _ = state.wait_for(|s| *s == RunState::Stopped).await;
    }
}

impl Inner {
    fn claim(&self) -> Result<(), OutreachError> {
        let mut busy = self.busy.lock();
        if *busy {
            return Err(OutreachError::AlreadyRunning);
        }
        *busy = true;
        Ok(())
    }

    async fn apply_options(&self, options: &RuntimeOptions) -> Result<(), OutreachError> {
        let mut config = self.config.read().clone();
        config.apply(options);
        for warning in ConfigValidator::validate(&config).into_result()? {
            warn!("Runtime option {}: {}", warning.path, warning.message);
        }

        self.history.set_cap(config.history.cap_per_scope).await?;
        self.limiter.lock().set_config(config.rate_limit.clone());
        *self.settings.write() = RunSettings::from_config(&config);
        if options.message_templates.is_some() {
            self.selector.write().configure(&config.messages.templates);
        }
        *self.config.write() = config;

        debug!("Applied runtime options: {:?}", options);
        Ok(())
    }

    fn set_state(&self, state: RunState) {
        self.state.send_replace(state);
        self.progress.send_modify(|p| p.set_state(state));
    }

    fn transition(&self, from: &[RunState], to: RunState) -> Result<(), OutreachError> {
        let mut current = RunState::Idle;
        let changed = self.state.send_if_modified(|state| {
            current = *state;
            if from.contains(state) {
                *state = to;
                true
            } else {
                false
            }
        });

        if !changed {
            return Err(if current.is_active() {
                OutreachError::InvalidTransition { from: current, to }
            } else {
                OutreachError::NotRunning
            });
        }

        self.progress.send_modify(|p| p.set_state(to));
        Ok(())
    }

    /// Wait out a pause. Returns `false` once the run should stop.
    async fn checkpoint(&self, control: &mut watch::Receiver<RunState>) -> bool {
        if *control.borrow() == RunState::Paused {
            debug!("Suspended at checkpoint");
        }
        match control.wait_for(|s| *s != RunState::Paused).await {
            Ok(state) => *state == RunState::Running,
            Err(_) => false,
        }
    }

    async fn run_loop(
        self: &Arc<Self>,
        scope_id: String,
        mut queue: InteractionQueue,
    ) -> RunOutcome {
        let mut control = self.state.subscribe();
        let start_index = queue.position();
        let mut succeeded = 0usize;
        let mut failed = 0usize;
        let mut consecutive_failures = 0u32;

        let stop_reason = loop {
            if !self.checkpoint(&mut control).await {
                break Some(StopReason::Requested);
            }
            if queue.remaining() == 0 {
                break None;
            }

            let now_ms = Utc::now().timestamp_millis();
            {
                let mut limiter = self.limiter.lock();
                if !limiter.can_interact(now_ms) {
                    let next = limiter
                        .next_available_at(now_ms)
                        .and_then(DateTime::from_timestamp_millis);
                    break Some(StopReason::RateLimitExceeded {
                        next_available_at: next,
                    });
                }
            }

            let Some((index, target)) = queue.next() else {
                break None;
            };
            let message = self.selector.read().compose(&target);

            debug!(
                "Interacting with '{}' ({}) at index {}",
                target.display_name, target.id, index
            );
            let ok = match self.performer.perform(&target, &message).await {
                Ok(true) => true,
                Ok(false) => {
                    warn!("Interaction with {} reported failure", target.id);
                    false
                }
                Err(e) => {
                    warn!("Interaction with {} failed: {}", target.id, e);
                    false
                }
            };

            let mut persistence_error = None;
            if ok {
                let recorded = self
                    .history
                    .record(
                        &scope_id,
                        NewInteraction {
                            target_id: target.id.clone(),
                            target_name: target.display_name.clone(),
                            message_text: message,
                            next_index: index + 1,
                        },
                    )
                    .await;
                self.limiter
                    .lock()
                    .record_interaction(Utc::now().timestamp_millis());

                succeeded += 1;
                consecutive_failures = 0;
                if let Some(monitor) = self.monitor() {
                    monitor.mark_healthy();
                }
                if let Err(e) = recorded {
                    persistence_error = Some(e.to_string());
                }
            } else {
                failed += 1;
                consecutive_failures += 1;
            }

            self.progress.send_modify(|p| {
                p.current_index = queue.position();
                p.succeeded = succeeded;
                p.failed = failed;
            });

            if let Some(message) = persistence_error {
                error!(
                    "Failed to record interaction in scope '{}': {}",
                    scope_id, message
                );
                break Some(StopReason::PersistenceFailure { message });
            }

            let threshold = self.settings.read().failure_threshold;
            if consecutive_failures >= threshold {
                if let Some(monitor) = self.monitor() {
                    let reason =
                        format!("{} consecutive interaction failures", consecutive_failures);
                    let action = monitor.escalate(&reason, Utc::now());
                    monitor.apply(action, &**self).await;
                }
            }

            if queue.remaining() > 0 {
                let delay = self.settings.read().interaction_delay;
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = control.wait_for(|s| *s == RunState::Stopped) => {}
                }
            }
        };

        if stop_reason.is_some() {
            queue.clear();
        }
        let state = match stop_reason {
            None => RunState::Completed,
            Some(_) => RunState::Stopped,
        };

        match &stop_reason {
            None => info!(
                "Run for scope '{}' completed ({} succeeded, {} failed)",
                scope_id, succeeded, failed
            ),
            Some(reason) => info!(
                "Run for scope '{}' stopped: {} ({} succeeded, {} failed)",
                scope_id, reason, succeeded, failed
            ),
        }

        self.progress.send_modify(|p| {
            p.current_index = queue.position();
            p.total = queue.len();
        });
        {
            let mut busy = self.busy.lock();
            self.set_state(state);
            *busy = false;
        }

        RunOutcome {
            scope_id,
            state,
            stop_reason,
            start_index,
            end_index: queue.position(),
            succeeded,
            failed,
        }
    }

    fn monitor(&self) -> Option<Arc<ErrorRecoveryMonitor>> {
        self.monitor.read().clone()
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
