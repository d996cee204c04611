//! User activity detection.
//!
//! Raw input events (from the global input hook or from `restcycle input`)
//! are turned into debounced edges: one `Active` edge when the user comes
//! back, one `Inactive` edge after the inactivity threshold has passed
//! without input. The edges drive the cycle coordinator through
//! [`EdgeHandler`].

pub mod detector;
#[cfg(feature = "input-hook")]
pub mod hook;
pub mod monitor;

use std::time::Instant;

pub use detector::{ActivityEdge, EdgeDetector, DEFAULT_INACTIVITY_THRESHOLD};
#[cfg(feature = "input-hook")]
pub use hook::spawn_input_hook;
pub use monitor::{ActivityMonitor, InputReporter, LastInput, MonitorConfig, DEFAULT_POLL_INTERVAL};

/// Receives debounced activity edges.
///
/// Both methods are called from the detector thread, never concurrently
/// with each other.
pub trait EdgeHandler: Send + Sync {
    /// The user became active after being inactive (or on the first input).
    fn on_activity_edge(&self);

    /// The user has been inactive for the configured threshold.
    fn on_inactivity_edge(&self);
}

/// Read access to what the activity detector currently believes.
pub trait ActivityStatus: Send + Sync {
    /// Returns when the last raw input was seen, if any.
    fn last_input(&self) -> Option<Instant>;

    /// Returns true between an `Active` edge and the next `Inactive` edge.
    fn is_active(&self) -> bool;
}

impl ActivityEdge {
    /// Forwards the edge to the matching handler method.
    pub fn dispatch(self, handler: &dyn EdgeHandler) {
        match self {
            ActivityEdge::Active => handler.on_activity_edge(),
            ActivityEdge::Inactive => handler.on_inactivity_edge(),
        }
    }
}

// ============================================================================
// Mock
// ============================================================================

/// Edge handler that records the edges it receives.
#[derive(Debug, Default)]
pub struct RecordingEdgeHandler {
    edges: std::sync::Mutex<Vec<ActivityEdge>>,
}

impl RecordingEdgeHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the edges received so far, in order.
    pub fn edges(&self) -> Vec<ActivityEdge> {
        self.edges
            .lock()
            .map(|edges| edges.clone())
            .unwrap_or_default()
    }

    fn push(&self, edge: ActivityEdge) {
        if let Ok(mut edges) = self.edges.lock() {
            edges.push(edge);
        }
    }
}

impl EdgeHandler for RecordingEdgeHandler {
    fn on_activity_edge(&self) {
        self.push(ActivityEdge::Active);
    }

    fn on_inactivity_edge(&self) {
        self.push(ActivityEdge::Inactive);
    }
}
