//! Activity monitor: a detector thread fed by raw input reporters.
//!
//! Raw input timestamps travel over a crossbeam channel to a dedicated
//! thread that owns the [`EdgeDetector`]. The thread wakes up at least every
//! poll interval to check for inactivity, and calls the [`EdgeHandler`]
//! inline for every edge.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use tracing::{debug, info};

use super::detector::{EdgeDetector, DEFAULT_INACTIVITY_THRESHOLD};
use super::detector::ActivityEdge;
use super::{ActivityStatus, EdgeHandler};

/// How often the detector thread checks for inactivity.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Configuration for the activity monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Time without input after which the user counts as inactive
    pub inactivity_threshold: Duration,
    /// Maximum time between two inactivity checks
    pub poll_interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            inactivity_threshold: DEFAULT_INACTIVITY_THRESHOLD,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

// ============================================================================
// InputReporter / LastInput
// ============================================================================

/// Cloneable handle used to report raw input events.
#[derive(Debug, Clone)]
pub struct InputReporter {
    tx: Sender<Instant>,
}

impl InputReporter {
    /// Reports an input event that happened now.
    ///
    /// Returns false if the monitor has stopped.
    pub fn report(&self) -> bool {
        self.report_at(Instant::now())
    }

    /// Reports an input event that happened at `at`.
    pub fn report_at(&self, at: Instant) -> bool {
        self.tx.send(at).is_ok()
    }
}

/// Shared timestamp of the most recent raw input, plus the detector's
/// current active/inactive state.
#[derive(Debug, Clone, Default)]
pub struct LastInput {
    inner: Arc<Mutex<Option<Instant>>>,
    active: Arc<AtomicBool>,
}

impl LastInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, at: Instant) {
        let mut last = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if last.map_or(true, |prev| at > prev) {
            *last = Some(at);
        }
    }

    /// Follows the detector's edges.
    pub fn record_edge(&self, edge: ActivityEdge) {
        self.active.store(edge == ActivityEdge::Active, Ordering::SeqCst);
    }
}

impl ActivityStatus for LastInput {
    fn last_input(&self) -> Option<Instant> {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

// ============================================================================
// ActivityMonitor
// ============================================================================

/// Owns the detector thread.
pub struct ActivityMonitor {
    reporter: InputReporter,
    last_input: LastInput,
    handle: JoinHandle<()>,
}

impl ActivityMonitor {
    /// Starts the detector thread.
    ///
    /// The thread exits once `running` is cleared (checked at least every
    /// poll interval).
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn(
        handler: Arc<dyn EdgeHandler>,
        config: MonitorConfig,
        running: Arc<AtomicBool>,
    ) -> std::io::Result<Self> {
        let (tx, rx) = unbounded();
        let last_input = LastInput::new();

        let thread_last_input = last_input.clone();
        let handle = thread::Builder::new()
            .name("activity-detector".to_string())
            .spawn(move || detector_loop(rx, handler, config, running, thread_last_input))?;

        info!(
            threshold_ms = config.inactivity_threshold.as_millis() as u64,
            poll_ms = config.poll_interval.as_millis() as u64,
            "Activity monitor started"
        );

        Ok(Self {
            reporter: InputReporter { tx },
            last_input,
            handle,
        })
    }

    /// Returns a new handle for reporting input.
    pub fn reporter(&self) -> InputReporter {
        self.reporter.clone()
    }

    /// Returns the shared last-input timestamp.
    pub fn last_input(&self) -> LastInput {
        self.last_input.clone()
    }

    /// Waits for the detector thread to finish.
    ///
    /// The running flag must have been cleared, or this blocks forever.
    pub fn join(self) {
        let Self { reporter, handle, .. } = self;
        drop(reporter);
        if handle.join().is_err() {
            tracing::error!("Activity detector thread panicked");
        }
    }
}

fn detector_loop(
    rx: Receiver<Instant>,
    handler: Arc<dyn EdgeHandler>,
    config: MonitorConfig,
    running: Arc<AtomicBool>,
    last_input: LastInput,
) {
    let mut detector = EdgeDetector::new(config.inactivity_threshold, Instant::now());

    while running.load(Ordering::SeqCst) {
        match rx.recv_timeout(config.poll_interval) {
            Ok(at) => {
                last_input.record(at);
                if let Some(edge) = detector.record_input(at) {
                    debug!(?edge, "Activity edge");
                    last_input.record_edge(edge);
                    edge.dispatch(handler.as_ref());
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if let Some(edge) = detector.poll(Instant::now()) {
            debug!(?edge, "Activity edge");
            last_input.record_edge(edge);
            edge.dispatch(handler.as_ref());
        }
    }

    debug!("Activity detector stopped");
}
