//! Deterministic simulated time.
//!
//! Backoff between generation attempts is real waiting in production. In
//! simulation the clock only moves when a pause is requested, so tests can
//! assert the exact backoff schedule without sleeping.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Simulated clock with nanosecond precision.
///
/// Time only advances through `advance_ns` and the `sleep_*` helpers.
///
/// # Thread Safety
///
/// The clock uses atomic operations and is safe to share across tasks.
pub struct SimClock {
    /// Current time in nanoseconds since start
    now_ns: AtomicU64,
    /// Number of sleeps requested
    sleeps_count: AtomicU64,
}

/// Bounds for time operations.
const TIME_NS_MAX: u64 = u64::MAX - 1_000_000_000_000; // Leave room for advances

impl SimClock {
    /// Create a new clock starting at time 0.
    #[must_use]
    pub fn new() -> Self {
        Self {
            now_ns: AtomicU64::new(0),
            sleeps_count: AtomicU64::new(0),
        }
    }

    /// Get current time in nanoseconds.
    #[must_use]
    pub fn now_ns(&self) -> u64 {
        self.now_ns.load(Ordering::Acquire)
    }

    /// Get current time in milliseconds.
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.now_ns() / 1_000_000
    }

    /// Number of sleeps performed.
    #[must_use]
    pub fn sleeps_count(&self) -> u64 {
        self.sleeps_count.load(Ordering::Acquire)
    }

    /// Advance time by the given number of nanoseconds.
    pub fn advance_ns(&self, delta_ns: u64) {
        debug_assert!(delta_ns > 0, "Delta must be positive");

        let current = self.now_ns.load(Ordering::Acquire);
        debug_assert!(
            current <= TIME_NS_MAX - delta_ns,
            "Time advance would overflow"
        );

        self.now_ns.fetch_add(delta_ns, Ordering::Release);
    }

    /// Simulate a sleep by advancing time.
    ///
    /// Returns immediately. Zero-length sleeps are counted but do not move
    /// the clock. Time saturates at the clock's upper bound.
    pub fn sleep(&self, duration: Duration) {
        self.sleeps_count.fetch_add(1, Ordering::AcqRel);
        let headroom_ns = TIME_NS_MAX - self.now_ns();
        let delta_ns = u64::try_from(duration.as_nanos())
            .unwrap_or(u64::MAX)
            .min(headroom_ns);
        if delta_ns > 0 {
            self.advance_ns(delta_ns);
        }
    }

    /// Simulate a sleep in milliseconds.
    pub fn sleep_ms(&self, duration_ms: u64) {
        self.sleep(Duration::from_millis(duration_ms));
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_starts_at_zero() {
        let clock = SimClock::new();
        assert_eq!(clock.now_ns(), 0);
        assert_eq!(clock.sleeps_count(), 0);
    }

    #[test]
    fn test_sleep_accumulates() {
        let clock = SimClock::new();

        clock.sleep_ms(200);
        clock.sleep(Duration::from_millis(400));
        assert_eq!(clock.now_ms(), 600);
        assert_eq!(clock.now_ns(), 600_000_000);
        assert_eq!(clock.sleeps_count(), 2);
    }

    #[test]
    fn test_huge_sleeps_saturate() {
        let clock = SimClock::new();
        clock.sleep(Duration::MAX);
        clock.sleep(Duration::MAX);
        assert_eq!(clock.now_ns(), TIME_NS_MAX);
        assert_eq!(clock.sleeps_count(), 2);
    }

    #[test]
    fn test_zero_sleep_is_counted() {
        let clock = SimClock::new();
        clock.sleep(Duration::ZERO);
        assert_eq!(clock.now_ns(), 0);
        assert_eq!(clock.sleeps_count(), 1);
    }
}
