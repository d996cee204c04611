//! End-to-end cycle tests.
//!
//! The coordinator, tick loop and notification dispatcher run together with a
//! mock sink under paused tokio time, so whole work/rest cycles take
//! milliseconds. Activity edges are injected directly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

use restcycle::daemon::{CycleCoordinator, TickLoop};
use restcycle::notification::{spawn_dispatcher, MockNotificationSink};
use restcycle::types::{CycleConfig, CycleState, NotificationKind, AUTO_REST_MESSAGE};

// ============================================================================
// Test Helpers
// ============================================================================

struct Harness {
    coordinator: CycleCoordinator,
    sink: Arc<MockNotificationSink>,
    running: Arc<AtomicBool>,
    tick: JoinHandle<()>,
    dispatcher: JoinHandle<()>,
}

impl Harness {
    /// One-minute work, rest and auto-rest durations.
    fn start() -> Self {
        let config = CycleConfig {
            rest_message: "Rest now".to_string(),
            resume_message: "Back to work".to_string(),
            ..CycleConfig::default()
        }
        .with_work_minutes(1)
        .with_rest_minutes(1)
        .with_auto_rest_minutes(1);

        let sink = Arc::new(MockNotificationSink::new());
        let (tx, rx) = mpsc::unbounded_channel();
        let coordinator = CycleCoordinator::new(config, tx);
        let dispatcher = spawn_dispatcher(rx, sink.clone());

        let running = Arc::new(AtomicBool::new(true));
        let tick = tokio::spawn(TickLoop::new(coordinator.clone(), Arc::clone(&running)).run());

        Self {
            coordinator,
            sink,
            running,
            tick,
            dispatcher,
        }
    }

    fn state(&self) -> CycleState {
        self.coordinator.snapshot().state
    }

    /// Stops the tick loop and returns the delivered notices, sorted by kind.
    async fn finish(self, expected: usize) -> Vec<(NotificationKind, String)> {
        self.running.store(false, Ordering::SeqCst);
        self.tick.await.unwrap();
        drop(self.coordinator);
        self.dispatcher.await.unwrap();

        // Deliveries run on the blocking pool
        for _ in 0..500 {
            if self.sink.notification_count() >= expected {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(2));
        }

        // Each delivery is its own blocking task, so arrival order is not fixed
        let mut notices: Vec<_> = self
            .sink
            .get_notices()
            .into_iter()
            .map(|notice| (notice.kind, notice.message))
            .collect();
        notices.sort_by_key(|(kind, _)| kind.as_str());
        notices
    }
}

// ============================================================================
// Full Cycle
// ============================================================================

/// Work until the target, step away, rest until the target.
#[tokio::test(start_paused = true)]
async fn test_full_work_rest_cycle() {
    let harness = Harness::start();
    assert_eq!(harness.state(), CycleState::Idle);

    harness.coordinator.on_activity_edge();
    assert_eq!(harness.state(), CycleState::Working);

    sleep(Duration::from_millis(59_500)).await;
    assert_eq!(harness.state(), CycleState::Working);

    sleep(Duration::from_secs(1)).await;
    assert_eq!(harness.state(), CycleState::WaitingForRest);

    // Still typing: nothing happens until the user steps away
    sleep(Duration::from_secs(120)).await;
    assert_eq!(harness.state(), CycleState::WaitingForRest);

    harness.coordinator.on_inactivity_edge();
    assert_eq!(harness.state(), CycleState::Resting);

    sleep(Duration::from_millis(60_500)).await;
    assert_eq!(harness.state(), CycleState::Idle);

    let notices = harness.finish(2).await;
    assert_eq!(
        notices,
        vec![
            (NotificationKind::Rest, "Rest now".to_string()),
            (NotificationKind::Resume, "Back to work".to_string()),
        ]
    );
}

/// Short pauses keep the work time; the rest prompt comes after the sum.
#[tokio::test(start_paused = true)]
async fn test_work_time_survives_short_pauses() {
    let harness = Harness::start();

    harness.coordinator.on_activity_edge();
    sleep(Duration::from_millis(30_500)).await;

    harness.coordinator.on_inactivity_edge();
    sleep(Duration::from_secs(20)).await;
    assert_eq!(harness.state(), CycleState::WorkPaused);

    harness.coordinator.on_activity_edge();
    let work = harness.coordinator.detail().work_elapsed;
    assert_eq!(work, Duration::from_secs(30));

    sleep(Duration::from_secs(31)).await;
    assert_eq!(harness.state(), CycleState::WaitingForRest);

    let notices = harness.finish(1).await;
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].0, NotificationKind::Rest);
}

// ============================================================================
// Automatic Rest
// ============================================================================

/// A long pause turns into a rest, which then ends normally.
#[tokio::test(start_paused = true)]
async fn test_long_pause_becomes_auto_rest() {
    let harness = Harness::start();

    harness.coordinator.on_activity_edge();
    sleep(Duration::from_millis(10_500)).await;
    harness.coordinator.on_inactivity_edge();

    sleep(Duration::from_secs(60)).await;
    assert_eq!(harness.state(), CycleState::Resting);
    assert_eq!(harness.coordinator.detail().work_elapsed, Duration::ZERO);

    sleep(Duration::from_secs(60)).await;
    assert_eq!(harness.state(), CycleState::Idle);

    let notices = harness.finish(2).await;
    assert_eq!(
        notices,
        vec![
            (NotificationKind::AutoRest, AUTO_REST_MESSAGE.to_string()),
            (NotificationKind::Resume, "Back to work".to_string()),
        ]
    );
}

// ============================================================================
// Interrupted Rest
// ============================================================================

/// Coming back during a rest restarts work from zero without a resume prompt.
#[tokio::test(start_paused = true)]
async fn test_activity_during_rest_restarts_work() {
    let harness = Harness::start();

    harness.coordinator.on_activity_edge();
    sleep(Duration::from_millis(60_500)).await;
    harness.coordinator.on_inactivity_edge();
    sleep(Duration::from_secs(30)).await;
    assert_eq!(harness.state(), CycleState::Resting);

    harness.coordinator.on_activity_edge();
    let detail = harness.coordinator.detail();
    assert_eq!(detail.state, CycleState::Working);
    assert_eq!(detail.work_elapsed, Duration::ZERO);
    assert_eq!(detail.rest_elapsed, Duration::ZERO);

    let notices = harness.finish(1).await;
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].0, NotificationKind::Rest);
}

// ============================================================================
// Configuration Changes
// ============================================================================

/// A config update mid-cycle restarts from idle with the new durations.
#[tokio::test(start_paused = true)]
async fn test_config_update_mid_cycle() {
    let harness = Harness::start();

    harness.coordinator.on_activity_edge();
    sleep(Duration::from_millis(40_500)).await;

    let config = harness.coordinator.config().with_work_minutes(2);
    harness.coordinator.apply_config(config);
    assert_eq!(harness.state(), CycleState::Idle);
    assert_eq!(
        harness.coordinator.snapshot().work_total,
        Duration::from_secs(120)
    );

    harness.coordinator.on_activity_edge();
    sleep(Duration::from_secs(100)).await;
    assert_eq!(harness.state(), CycleState::Working);

    sleep(Duration::from_secs(21)).await;
    assert_eq!(harness.state(), CycleState::WaitingForRest);

    let notices = harness.finish(1).await;
    assert_eq!(notices.len(), 1);
}

/// Notifications keep flowing when the sink fails.
#[tokio::test(start_paused = true)]
async fn test_failing_sink_does_not_stall_cycle() {
    let harness = Harness::start();
    harness.sink.set_should_fail(true);

    harness.coordinator.on_activity_edge();
    sleep(Duration::from_millis(60_500)).await;
    assert_eq!(harness.state(), CycleState::WaitingForRest);

    harness.coordinator.on_inactivity_edge();
    sleep(Duration::from_secs(60)).await;
    assert_eq!(harness.state(), CycleState::Idle);

    let notices = harness.finish(0).await;
    assert!(notices.is_empty());
}
