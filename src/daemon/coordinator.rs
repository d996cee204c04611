//! Cycle coordinator: the activity-driven work/rest state machine.
//!
//! This module provides:
//! - `CoordinatorState`: the state machine and its elapsed-time counters
//! - `CycleCoordinator`: a cloneable handle that serializes every mutation
//!   (activity edges, ticks, config updates) behind a single mutex
//!
//! Notifications are decided while the lock is held but sent only after it is
//! released, through an unbounded channel drained by the notification
//! dispatcher. The coordinator never waits for delivery.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::activity::EdgeHandler;
use crate::types::{
    ConfigUpdate, CycleConfig, CycleState, NotificationKind, StateSnapshot, TransitionNotice,
    AUTO_REST_MESSAGE,
};

// ============================================================================
// CoordinatorState
// ============================================================================

/// The mutable aggregate owned by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CoordinatorState {
    /// Current cycle state
    pub state: CycleState,
    /// Active work time in the current work segment
    pub work_elapsed: Duration,
    /// Time spent resting
    pub rest_elapsed: Duration,
    /// Continuous inactivity while the work is paused
    pub pause_elapsed: Duration,
    /// Inactivity while resting (diagnostic only)
    pub rest_inactivity_elapsed: Duration,
    /// Last known activity edge
    pub is_inactive: bool,
}

impl CoordinatorState {
    /// Creates the initial state: idle with every counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets to the initial state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Handles an inactive→active edge.
    ///
    /// Returns the previous state if a transition happened.
    pub fn on_activity_edge(&mut self) -> Option<CycleState> {
        let previous = self.state;
        self.is_inactive = false;
        self.rest_inactivity_elapsed = Duration::ZERO;

        match self.state {
            CycleState::Idle | CycleState::WaitingForRest => {
                self.work_elapsed = Duration::ZERO;
            }
            CycleState::WorkPaused => {
                self.pause_elapsed = Duration::ZERO;
            }
            CycleState::Resting => {
                self.work_elapsed = Duration::ZERO;
                self.rest_elapsed = Duration::ZERO;
            }
            CycleState::Working => return None,
        }

        self.state = CycleState::Working;
        Some(previous)
    }

    /// Handles an active→inactive edge.
    ///
    /// Returns the previous state if a transition happened.
    pub fn on_inactivity_edge(&mut self) -> Option<CycleState> {
        let previous = self.state;
        self.is_inactive = true;

        match self.state {
            CycleState::Working => {
                self.state = CycleState::WorkPaused;
                self.pause_elapsed = Duration::ZERO;
            }
            CycleState::WaitingForRest => {
                // The user got up: the rest starts now
                self.state = CycleState::Resting;
                self.rest_elapsed = Duration::ZERO;
                self.rest_inactivity_elapsed = Duration::ZERO;
            }
            CycleState::Idle | CycleState::WorkPaused | CycleState::Resting => return None,
        }

        Some(previous)
    }

    /// Advances the counters of the current state by `delta` and checks the
    /// thresholds from `config`.
    ///
    /// Returns the notification to emit if a threshold was reached.
    pub fn tick(&mut self, delta: Duration, config: &CycleConfig) -> Option<TransitionNotice> {
        match self.state {
            CycleState::Working => {
                self.work_elapsed += delta;
                if self.work_elapsed < config.work_duration() {
                    return None;
                }
                self.state = CycleState::WaitingForRest;
                self.work_elapsed = Duration::ZERO;
                Some(TransitionNotice::new(
                    NotificationKind::Rest,
                    config.rest_message.clone(),
                ))
            }
            CycleState::WorkPaused => {
                self.pause_elapsed += delta;
                if self.pause_elapsed < config.auto_rest_duration() {
                    return None;
                }
                self.state = CycleState::Resting;
                self.work_elapsed = Duration::ZERO;
                self.pause_elapsed = Duration::ZERO;
                self.rest_elapsed = Duration::ZERO;
                Some(TransitionNotice::new(
                    NotificationKind::AutoRest,
                    AUTO_REST_MESSAGE,
                ))
            }
            CycleState::Resting => {
                self.rest_elapsed += delta;
                if self.is_inactive {
                    self.rest_inactivity_elapsed += delta;
                }
                if self.rest_elapsed < config.rest_duration() {
                    return None;
                }
                self.state = CycleState::Idle;
                self.work_elapsed = Duration::ZERO;
                self.rest_elapsed = Duration::ZERO;
                self.rest_inactivity_elapsed = Duration::ZERO;
                Some(TransitionNotice::new(
                    NotificationKind::Resume,
                    config.resume_message.clone(),
                ))
            }
            CycleState::Idle | CycleState::WaitingForRest => None,
        }
    }
}

// ============================================================================
// CycleCoordinator
// ============================================================================

#[derive(Debug)]
struct Inner {
    state: CoordinatorState,
    config: CycleConfig,
}

/// Shared handle to the state machine.
///
/// Every entry point takes the same lock, so ticks, edges, config updates and
/// snapshots never interleave.
#[derive(Debug, Clone)]
pub struct CycleCoordinator {
    inner: Arc<Mutex<Inner>>,
    event_tx: mpsc::UnboundedSender<TransitionNotice>,
}

impl CycleCoordinator {
    /// Creates a coordinator in the idle state.
    pub fn new(config: CycleConfig, event_tx: mpsc::UnboundedSender<TransitionNotice>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: CoordinatorState::new(),
                config: config.clamped(),
            })),
            event_tx,
        }
    }

    // The state is consistent between statements, so a panic in another
    // holder does not leave it half-updated.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Called when the user became active.
    pub fn on_activity_edge(&self) {
        let mut inner = self.lock();
        if let Some(previous) = inner.state.on_activity_edge() {
            info!(
                from = %previous,
                to = %inner.state.state,
                work_elapsed_secs = inner.state.work_elapsed.as_secs(),
                "Activity detected"
            );
        }
    }

    /// Called when the user became inactive.
    pub fn on_inactivity_edge(&self) {
        let mut inner = self.lock();
        if let Some(previous) = inner.state.on_inactivity_edge() {
            info!(
                from = %previous,
                to = %inner.state.state,
                work_elapsed_secs = inner.state.work_elapsed.as_secs(),
                "Inactivity detected"
            );
        }
    }

    /// Advances the state machine by `delta`.
    pub fn tick(&self, delta: Duration) {
        let notice = {
            let mut inner = self.lock();
            let Inner { state, config } = &mut *inner;

            let previous = *state;
            let notice = state.tick(delta, config);

            if let Some(notice) = &notice {
                info!(
                    from = %previous.state,
                    to = %state.state,
                    kind = notice.kind.as_str(),
                    request_id = %notice.id,
                    "Cycle transition"
                );
            } else if state.state == CycleState::Working
                && state.work_elapsed.as_secs() / 60 > previous.work_elapsed.as_secs() / 60
            {
                debug!(
                    work_elapsed_secs = state.work_elapsed.as_secs(),
                    work_total_secs = config.work_duration().as_secs(),
                    "Work progress"
                );
            }

            notice
        };

        if let Some(notice) = notice {
            self.emit(notice);
        }
    }

    /// Replaces the configuration and restarts the cycle from idle.
    pub fn apply_config(&self, config: CycleConfig) {
        let mut inner = self.lock();
        Self::replace_config(&mut inner, config);
    }

    /// Merges `update` into the active configuration, then restarts the
    /// cycle from idle. Returns the configuration now in effect.
    ///
    /// The merge happens under the same lock as the replacement, so two
    /// concurrent updates touching different fields both survive.
    pub fn update_config(&self, update: &ConfigUpdate) -> CycleConfig {
        let mut inner = self.lock();
        let config = update.apply_to(&inner.config);
        Self::replace_config(&mut inner, config);
        inner.config.clone()
    }

    fn replace_config(inner: &mut Inner, config: CycleConfig) {
        let previous = inner.state.state;
        inner.config = config.clamped();
        inner.state.reset();
        info!(
            from = %previous,
            work_minutes = inner.config.work_minutes,
            rest_minutes = inner.config.rest_minutes,
            auto_rest_minutes = inner.config.auto_rest_minutes,
            "Configuration applied, cycle reset"
        );
    }

    /// Returns a point-in-time copy of the observable state.
    pub fn snapshot(&self) -> StateSnapshot {
        let inner = self.lock();
        StateSnapshot {
            state: inner.state.state,
            work_elapsed: inner.state.work_elapsed,
            work_total: inner.config.work_duration(),
            rest_elapsed: inner.state.rest_elapsed,
            rest_total: inner.config.rest_duration(),
        }
    }

    /// Returns a copy of the full internal state, including diagnostic counters.
    pub fn detail(&self) -> CoordinatorState {
        self.lock().state
    }

    /// Returns a copy of the active configuration.
    pub fn config(&self) -> CycleConfig {
        self.lock().config.clone()
    }

    fn emit(&self, notice: TransitionNotice) {
        if let Err(e) = self.event_tx.send(notice) {
            warn!(
                request_id = %e.0.id,
                "Notification dispatcher is gone, dropping notice"
            );
        }
    }
}

impl EdgeHandler for CycleCoordinator {
    fn on_activity_edge(&self) {
        CycleCoordinator::on_activity_edge(self);
    }

    fn on_inactivity_edge(&self) {
        CycleCoordinator::on_inactivity_edge(self);
    }
}

// ============================================================================
// Tests
// ============================================================================
