use super::*;
use async_trait::async_trait;
use chrono::TimeZone;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

struct TestTarget {
    paused: AtomicBool,
}

impl TestTarget {
    fn new() -> Self {
        Self {
            paused: AtomicBool::new(false),
        }
    }
}

impl Pausable for TestTarget {
    fn pause_for_recovery(&self, _reason: &str) -> bool {
        !self.paused.swap(true, Ordering::SeqCst)
    }
}

#[derive(Default)]
struct CollectingNotifier {
    sent: Mutex<Vec<Notification>>,
}

#[async_trait]
impl Notifier for CollectingNotifier {
    fn name(&self) -> &str {
        "collect"
    }

    async fn notify(&self, notification: &Notification) -> Result<(), MonitorError> {
        self.sent.lock().push(notification.clone());
        Ok(())
    }
}

fn monitor() -> ErrorRecoveryMonitor {
    ErrorRecoveryMonitor::new(&RecoveryConfig::default()).unwrap()
}

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

fn blocked() -> PageSignal {
    PageSignal::text("You're temporarily blocked from using this feature")
}

#[test]
fn test_strategy_bands() {
    assert_eq!(RecoveryAction::for_attempts(0), RecoveryAction::None);
    assert_eq!(RecoveryAction::for_attempts(1), RecoveryAction::LogOnly);
    assert_eq!(RecoveryAction::for_attempts(2), RecoveryAction::LogOnly);
    assert_eq!(
        RecoveryAction::for_attempts(3),
        RecoveryAction::WaitAndRetry(Duration::from_millis(9000))
    );
    assert_eq!(
        RecoveryAction::for_attempts(5),
        RecoveryAction::WaitAndRetry(Duration::from_millis(15000))
    );
    assert_eq!(RecoveryAction::for_attempts(6), RecoveryAction::PauseOperation);
}

#[test]
fn test_escalation_through_scans() {
    let monitor = monitor();

    let actions: Vec<_> = (0..6).map(|i| monitor.scan(&blocked(), at(i * 10))).collect();
    assert_eq!(actions[0], RecoveryAction::LogOnly);
    assert_eq!(actions[1], RecoveryAction::LogOnly);
    assert_eq!(
        actions[2],
        RecoveryAction::WaitAndRetry(Duration::from_millis(9000))
    );
    assert_eq!(actions[5], RecoveryAction::PauseOperation);

    let state = monitor.state();
    assert_eq!(state.recovery_attempts, 6);
    assert!(state.is_in_recovery_mode);
    assert_eq!(state.last_error_time, Some(at(50)));
}

#[test]
fn test_clean_scan_resets_but_keeps_last_error_time() {
    let monitor = monitor();
    monitor.scan(&blocked(), at(0));
    monitor.scan(&blocked(), at(10));

    let action = monitor.scan(&PageSignal::text("Members of this group"), at(20));
    assert_eq!(action, RecoveryAction::None);

    let state = monitor.state();
    assert_eq!(state.recovery_attempts, 0);
    assert!(!state.is_in_recovery_mode);
    assert_eq!(state.last_error_time, Some(at(10)));

    // Counting starts over after recovery.
    assert_eq!(monitor.scan(&blocked(), at(30)), RecoveryAction::LogOnly);
}

#[test]
fn test_clean_scan_outside_recovery_is_noop() {
    let monitor = monitor();
    let mut events = monitor.subscribe();

    monitor.scan(&PageSignal::text("all good"), at(0));
    assert_eq!(monitor.state(), RecoveryState::default());
    assert!(events.try_recv().is_err());
}

#[test]
fn test_escalate_shares_counter_with_scan() {
    let monitor = monitor();
    monitor.scan(&blocked(), at(0));
    monitor.escalate("3 consecutive interaction failures", at(1));
    let action = monitor.escalate("4 consecutive interaction failures", at(2));

    assert_eq!(
        action,
        RecoveryAction::WaitAndRetry(Duration::from_millis(9000))
    );
}

#[test]
fn test_events_emitted() {
    let monitor = monitor();
    let mut events = monitor.subscribe();

    monitor.escalate("boom", at(0));
    monitor.mark_healthy();

    assert_eq!(
        events.try_recv().unwrap(),
        RecoveryEvent::ErrorDetected {
            attempts: 1,
            reason: "boom".to_string()
        }
    );
    assert_eq!(events.try_recv().unwrap(), RecoveryEvent::Recovered);
}

#[tokio::test(start_paused = true)]
async fn test_apply_wait_and_retry_sleeps() {
    let monitor = monitor();
    let target = TestTarget::new();
    let mut events = monitor.subscribe();
    for i in 0..3 {
        monitor.scan(&blocked(), at(i));
    }
    while events.try_recv().is_ok() {}

    let start = tokio::time::Instant::now();
    monitor
        .apply(
            RecoveryAction::WaitAndRetry(Duration::from_millis(9000)),
            &target,
        )
        .await;

    assert!(start.elapsed() >= Duration::from_millis(9000));
    assert_eq!(
        events.try_recv().unwrap(),
        RecoveryEvent::RetryReady { attempts: 3 }
    );
    assert!(!target.paused.load(Ordering::SeqCst));
}

struct StoppedTarget;

#[async_trait]
impl Pausable for StoppedTarget {
    fn pause_for_recovery(&self, _reason: &str) -> bool {
        false
    }

    async fn stopped(&self) {}
}

#[tokio::test(start_paused = true)]
async fn test_apply_wait_ends_when_target_stops() {
    let monitor = monitor();
    let mut events = monitor.subscribe();
    for i in 0..3 {
        monitor.scan(&blocked(), at(i));
    }
    while events.try_recv().is_ok() {}

    let start = tokio::time::Instant::now();
    monitor
        .apply(
            RecoveryAction::WaitAndRetry(Duration::from_millis(9000)),
            &StoppedTarget,
        )
        .await;

    assert!(start.elapsed() < Duration::from_millis(9000));
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_apply_pause_pauses_and_notifies() {
    let notifier = Arc::new(CollectingNotifier::default());
    let monitor = monitor().with_notifier(notifier.clone());
    let target = TestTarget::new();

    for i in 0..6 {
        monitor.scan(&blocked(), at(i));
    }
    monitor.apply(RecoveryAction::PauseOperation, &target).await;

    assert!(target.paused.load(Ordering::SeqCst));
    let sent = notifier.sent.lock();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].severity, NotificationSeverity::Critical);
    assert!(sent[0].message.contains("6 attempts"));
}

#[tokio::test]
async fn test_apply_log_only_does_nothing() {
    let monitor = monitor();
    let target = TestTarget::new();
    monitor.apply(RecoveryAction::LogOnly, &target).await;
    monitor.apply(RecoveryAction::None, &target).await;
    assert!(!target.paused.load(Ordering::SeqCst));
}

struct AlwaysBlocked {
    captures: AtomicUsize,
}

#[async_trait]
impl PageSignalSource for AlwaysBlocked {
    async fn capture(&self) -> Result<PageSignal, MonitorError> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        Ok(blocked())
    }
}

#[tokio::test(start_paused = true)]
async fn test_run_loop_pauses_target_then_shuts_down() {
    let monitor = Arc::new(monitor());
    let source = Arc::new(AlwaysBlocked {
        captures: AtomicUsize::new(0),
    });
    let target = Arc::new(TestTarget::new());
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let handle = tokio::spawn(monitor.clone().run(
        source.clone(),
        target.clone(),
        Duration::from_secs(10),
        shutdown_rx,
    ));

    // Six scans plus the 9s/12s/15s back-offs fit comfortably in ten minutes.
    tokio::time::sleep(Duration::from_secs(600)).await;
    assert!(target.paused.load(Ordering::SeqCst));
    assert!(source.captures.load(Ordering::SeqCst) >= 6);

    shutdown_tx.send(()).unwrap();
    handle.await.unwrap();
}
