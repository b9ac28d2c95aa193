//! Evaluation cadence control
//!
//! Monotonic-clock throttle gating how often a fresh evaluation may start
//! from the live frame stream.

use std::time::{Duration, Instant};

/// Fixed-interval gate on evaluation starts.
///
/// All decisions take the caller's `Instant` so a session can drive it
/// from its own clock and tests can drive it deterministically.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last_start: Option<Instant>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_start: None,
        }
    }

    pub fn from_millis(interval_ms: u64) -> Self {
        Self::new(Duration::from_millis(interval_ms))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// True when an evaluation may start at `now`
    #[inline]
    pub fn is_ready(&self, now: Instant) -> bool {
        match self.last_start {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }

    /// Record that an evaluation started at `now`
    #[inline]
    pub fn mark(&mut self, now: Instant) {
        self.last_start = Some(now);
    }

    /// Forget the last start so the next check passes immediately
    pub fn invalidate(&mut self) {
        self.last_start = None;
    }

    /// Time left until the gate opens, zero when ready
    pub fn remaining(&self, now: Instant) -> Duration {
        match self.last_start {
            None => Duration::ZERO,
            Some(last) => self
                .interval
                .saturating_sub(now.saturating_duration_since(last)),
        }
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::from_millis(140)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_throttle_is_ready() {
        let throttle = Throttle::default();
        assert!(throttle.is_ready(Instant::now()));
        assert_eq!(throttle.interval(), Duration::from_millis(140));
    }

    #[test]
    fn test_gate_closes_for_interval() {
        let t0 = Instant::now();
        let mut throttle = Throttle::from_millis(100);
        throttle.mark(t0);
        assert!(!throttle.is_ready(t0 + Duration::from_millis(50)));
        assert_eq!(
            throttle.remaining(t0 + Duration::from_millis(60)),
            Duration::from_millis(40)
        );
        assert!(throttle.is_ready(t0 + Duration::from_millis(100)));
        assert_eq!(throttle.remaining(t0 + Duration::from_millis(150)), Duration::ZERO);
    }

    #[test]
    fn test_invalidate_reopens_gate() {
        let t0 = Instant::now();
        let mut throttle = Throttle::from_millis(100);
        throttle.mark(t0);
        throttle.invalidate();
        assert!(throttle.is_ready(t0 + Duration::from_millis(1)));
    }
}
