//! Tick loop for the cycle coordinator.
//!
//! This module drives time forward:
//! - Ticks with `tokio::time::interval`, skipping missed ticks
//! - Measures the real time since the previous tick and passes it on, so a
//!   late or skipped tick does not lose time
//! - Stops cooperatively when the shared running flag is cleared

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::time::{interval, Duration, Instant, MissedTickBehavior};
use tracing::debug;

use super::coordinator::CycleCoordinator;

/// Default period between two ticks.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

// ============================================================================
// TickLoop
// ============================================================================

/// Periodically advances the coordinator by the measured elapsed time.
pub struct TickLoop {
    coordinator: CycleCoordinator,
    running: Arc<AtomicBool>,
    period: Duration,
}

impl TickLoop {
    /// Creates a tick loop with the default one-second period.
    pub fn new(coordinator: CycleCoordinator, running: Arc<AtomicBool>) -> Self {
        Self {
            coordinator,
            running,
            period: TICK_INTERVAL,
        }
    }

    /// Overrides the tick period.
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Runs until the running flag is cleared.
    ///
    /// The flag is checked once per tick. This should be spawned as a
    /// separate tokio task.
    pub async fn run(self) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // The first tick completes immediately
        ticker.tick().await;
        let mut last = Instant::now();

        loop {
            ticker.tick().await;

            if !self.running.load(Ordering::SeqCst) {
                break;
            }

            let now = Instant::now();
            let delta = now.duration_since(last);
            last = now;

            self.coordinator.tick(delta);
        }

        debug!("Tick loop stopped");
    }
}

// ============================================================================
// Tests
// ============================================================================
