//! Trailing-edge debounce for hover redraws.
//!
//! Callers pass `Instant`s explicitly so the timing is testable without
//! sleeping.

use std::time::{Duration, Instant};

/// Coalesces bursts of requests into one action after a quiet period.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: None }
    }

    /// Record a request. A newer request replaces the pending one and
    /// restarts the delay.
    pub fn request(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.delay));
    }

    /// Take the pending value once its delay has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, due)) if now >= *due => self.pending.take().map(|(value, _)| value),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_after_delay() {
        let start = Instant::now();
        let mut d = Debouncer::new(Duration::from_millis(16));
        d.request("a", start);
        assert_eq!(d.poll(start + Duration::from_millis(10)), None);
        assert_eq!(d.poll(start + Duration::from_millis(16)), Some("a"));
        assert_eq!(d.poll(start + Duration::from_millis(40)), None);
    }

    #[test]
    fn burst_coalesces_to_last_value() {
        let start = Instant::now();
        let mut d = Debouncer::new(Duration::from_millis(16));
        for (i, v) in ["a", "b", "c"].into_iter().enumerate() {
            d.request(v, start + Duration::from_millis(i as u64 * 5));
        }
        // Last request at +10ms, due at +26ms
        assert_eq!(d.poll(start + Duration::from_millis(20)), None);
        assert_eq!(d.poll(start + Duration::from_millis(26)), Some("c"));
        assert!(!d.is_pending());
    }

    #[test]
    fn cancel_drops_pending() {
        let start = Instant::now();
        let mut d = Debouncer::new(Duration::from_millis(16));
        d.request(1, start);
        d.cancel();
        assert_eq!(d.poll(start + Duration::from_secs(1)), None);
    }
}
