//! Monotonic clock abstraction
//!
//! Components that expire state (the response cache in particular) read time
//! through [`Clock`] so tests can move time forward without sleeping.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use cdf_connector_common::time::{Clock, MockClock, SystemClock};
//!
//! let clock = SystemClock;
//! let _now = clock.now();
//!
//! let mock = MockClock::new();
//! let start = mock.now();
//! mock.advance(Duration::from_secs(10));
//! assert_eq!(mock.now().duration_since(start), Duration::from_secs(10));
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Source of monotonic time.
pub trait Clock: Send + Sync + 'static {
    /// Current monotonic instant.
    fn now(&self) -> Instant;

    /// Instant `ttl` from now, saturating instead of overflowing.
    fn deadline(&self, ttl: Duration) -> Instant {
        let now = self.now();
        now.checked_add(ttl).unwrap_or(now)
    }
}

/// Real system clock. Use this in production code.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually driven clock for deterministic tests.
///
/// Clones share the same elapsed time, so a test can keep one handle and give
/// another to the component under test.
#[derive(Debug, Clone)]
pub struct MockClock {
    start: Instant,
    elapsed_nanos: Arc<AtomicU64>,
}

impl MockClock {
    /// Create a mock clock frozen at the current real instant.
    #[must_use]
    pub fn new() -> Self {
        Self { start: Instant::now(), elapsed_nanos: Arc::new(AtomicU64::new(0)) }
    }

    /// Move the clock forward by `duration`.
    pub fn advance(&self, duration: Duration) {
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.elapsed_nanos
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                Some(current.saturating_add(nanos))
            })
            .ok();
    }

    /// Set the total elapsed time since creation.
    pub fn set_elapsed(&self, duration: Duration) {
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.elapsed_nanos.store(nanos, Ordering::SeqCst);
    }

    /// Time simulated since the clock was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.elapsed_nanos.load(Ordering::SeqCst))
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for time::clock.
    use super::*;

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock;
        let now1 = clock.now();
        let now2 = clock.now();

        assert!(now2 >= now1);
    }

    /// Validates `MockClock::advance` accumulates across calls.
    ///
    /// Assertions:
    /// - Confirms `after.duration_since(start)` equals 6 seconds after
    ///   advancing by 1s, 2s and 3s.
    #[test]
    fn test_mock_clock_multiple_advances() {
        let clock = MockClock::new();
        let start = clock.now();

        clock.advance(Duration::from_secs(1));
        clock.advance(Duration::from_secs(2));
        clock.advance(Duration::from_secs(3));

        assert_eq!(clock.now().duration_since(start), Duration::from_secs(6));
        assert_eq!(clock.elapsed(), Duration::from_secs(6));
    }

    #[test]
    fn test_mock_clock_set_elapsed() {
        let clock = MockClock::new();

        clock.set_elapsed(Duration::from_secs(10));
        assert_eq!(clock.elapsed(), Duration::from_secs(10));

        clock.set_elapsed(Duration::from_secs(2));
        assert_eq!(clock.elapsed(), Duration::from_secs(2));
    }

    /// Validates that cloned clocks share elapsed time.
    ///
    /// Assertions:
    /// - Confirms the clone observes advances made through the original.
    #[test]
    fn test_mock_clock_clone_shares_time() {
        let clock1 = MockClock::new();
        clock1.advance(Duration::from_secs(10));

        let clock2 = clock1.clone();
        assert_eq!(clock2.elapsed(), Duration::from_secs(10));

        clock1.advance(Duration::from_secs(5));
        assert_eq!(clock2.elapsed(), Duration::from_secs(15));
        assert_eq!(clock1.now(), clock2.now());
    }

    #[test]
    fn test_deadline_adds_ttl() {
        let clock = MockClock::new();
        let deadline = clock.deadline(Duration::from_secs(10));

        clock.advance(Duration::from_secs(9));
        assert!(clock.now() < deadline);

        clock.advance(Duration::from_secs(1));
        assert!(clock.now() >= deadline);
    }
}
