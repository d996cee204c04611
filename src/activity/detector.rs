//! Edge detection over raw input timestamps.

use std::time::{Duration, Instant};

/// Time without input after which the user counts as inactive.
pub const DEFAULT_INACTIVITY_THRESHOLD: Duration = Duration::from_secs(3);

/// A debounced change in user activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityEdge {
    Active,
    Inactive,
}

/// Turns a stream of input timestamps into activity edges.
///
/// Starts inactive, so the first input produces an `Active` edge.
#[derive(Debug, Clone)]
pub struct EdgeDetector {
    threshold: Duration,
    last_input: Instant,
    active: bool,
}

impl EdgeDetector {
    pub fn new(threshold: Duration, now: Instant) -> Self {
        Self {
            threshold,
            last_input: now,
            active: false,
        }
    }

    /// Records a raw input event seen at `at`.
    ///
    /// Returns `Some(Active)` only when the user was inactive.
    pub fn record_input(&mut self, at: Instant) -> Option<ActivityEdge> {
        // Events may arrive slightly out of order across threads
        if at > self.last_input {
            self.last_input = at;
        }

        if self.active {
            return None;
        }
        self.active = true;
        Some(ActivityEdge::Active)
    }

    /// Checks for inactivity at `now`.
    ///
    /// Returns `Some(Inactive)` once per active period, when the threshold
    /// has passed since the last input.
    pub fn poll(&mut self, now: Instant) -> Option<ActivityEdge> {
        if !self.active || now.saturating_duration_since(self.last_input) < self.threshold {
            return None;
        }
        self.active = false;
        Some(ActivityEdge::Inactive)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn last_input(&self) -> Instant {
        self.last_input
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> (EdgeDetector, Instant) {
        let start = Instant::now();
        (EdgeDetector::new(DEFAULT_INACTIVITY_THRESHOLD, start), start)
    }

    #[test]
    fn test_starts_inactive() {
        let (detector, _) = detector();
        assert!(!detector.is_active());
        assert_eq!(detector.threshold(), Duration::from_secs(3));
    }

    #[test]
    fn test_first_input_is_active_edge() {
        let (mut detector, start) = detector();
        assert_eq!(detector.record_input(start), Some(ActivityEdge::Active));
        assert!(detector.is_active());
    }

    #[test]
    fn test_repeated_input_yields_single_edge() {
        let (mut detector, start) = detector();
        let edges: Vec<_> = (0..10)
            .filter_map(|i| detector.record_input(start + Duration::from_millis(i * 100)))
            .collect();
        assert_eq!(edges, vec![ActivityEdge::Active]);
    }

    #[test]
    fn test_poll_before_threshold_is_quiet() {
        let (mut detector, start) = detector();
        detector.record_input(start);
        assert_eq!(detector.poll(start + Duration::from_millis(2999)), None);
        assert!(detector.is_active());
    }

    #[test]
    fn test_poll_at_threshold_is_inactive_edge_once() {
        let (mut detector, start) = detector();
        detector.record_input(start);

        assert_eq!(
            detector.poll(start + Duration::from_secs(3)),
            Some(ActivityEdge::Inactive)
        );
        assert_eq!(detector.poll(start + Duration::from_secs(10)), None);
    }

    #[test]
    fn test_poll_while_inactive_never_fires() {
        let (mut detector, start) = detector();
        assert_eq!(detector.poll(start + Duration::from_secs(60)), None);
    }

    #[test]
    fn test_input_resets_threshold() {
        let (mut detector, start) = detector();
        detector.record_input(start);
        detector.record_input(start + Duration::from_secs(2));

        assert_eq!(detector.poll(start + Duration::from_secs(4)), None);
        assert_eq!(
            detector.poll(start + Duration::from_secs(5)),
            Some(ActivityEdge::Inactive)
        );
    }

    #[test]
    fn test_out_of_order_input_does_not_rewind() {
        let (mut detector, start) = detector();
        let later = start + Duration::from_secs(2);
        detector.record_input(later);
        detector.record_input(start);

        assert_eq!(detector.last_input(), later);
    }

    #[test]
    fn test_full_cycle() {
        let (mut detector, start) = detector();
        let at = |secs| start + Duration::from_secs(secs);

        assert_eq!(detector.record_input(at(0)), Some(ActivityEdge::Active));
        assert_eq!(detector.poll(at(3)), Some(ActivityEdge::Inactive));
        assert_eq!(detector.record_input(at(4)), Some(ActivityEdge::Active));
        assert_eq!(detector.poll(at(6)), None);
        assert_eq!(detector.poll(at(7)), Some(ActivityEdge::Inactive));
    }
}
