//! Wall-clock abstraction for testability.
//!
//! Window boundaries are computed from [`Clock::now`] once per rule, so a
//! long run evaluates every rule against a fresh "now".
//!
//! # Example
//!
//! ```
//! use chrono::{TimeDelta, TimeZone, Utc};
//! use mailcheck_core::clock::{Clock, MockClock};
//!
//! let start = Utc.with_ymd_and_hms(2026, 10, 14, 12, 0, 0).unwrap();
//! let clock = MockClock::new(start);
//!
//! clock.advance(TimeDelta::minutes(5));
//! assert_eq!(clock.now(), start + TimeDelta::minutes(5));
//! ```

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, TimeDelta, Utc};

/// Abstraction over the current wall-clock time.
///
/// In production, use [`SystemClock`]. In tests, use [`MockClock`] to
/// control time deterministically.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// System clock that uses real time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A mock clock for testing time-dependent code.
///
/// The clock starts at a fixed instant and only moves when advanced, or by
/// a fixed step after every reading when built with [`MockClock::with_step`].
#[derive(Debug)]
pub struct MockClock {
    /// Current time in microseconds since the Unix epoch.
    micros: AtomicI64,
    /// Amount added after each call to [`Clock::now`], in microseconds.
    step_micros: i64,
}

impl MockClock {
    /// Creates a mock clock frozen at `start`.
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self::with_step(start, TimeDelta::zero())
    }

    /// Creates a mock clock that advances by `step` after every reading.
    #[must_use]
    pub fn with_step(start: DateTime<Utc>, step: TimeDelta) -> Self {
        Self {
            micros: AtomicI64::new(start.timestamp_micros()),
            step_micros: step.num_microseconds().unwrap_or(i64::MAX),
        }
    }

    /// Advances the clock by the given duration.
    pub fn advance(&self, delta: TimeDelta) {
        let micros = delta.num_microseconds().unwrap_or(i64::MAX);
        self.micros.fetch_add(micros, Ordering::SeqCst);
    }

    /// Sets the clock to a specific instant.
    pub fn set(&self, at: DateTime<Utc>) {
        self.micros.store(at.timestamp_micros(), Ordering::SeqCst);
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        let micros = self.micros.fetch_add(self.step_micros, Ordering::SeqCst);
        DateTime::from_timestamp_micros(micros).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 14, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_system_clock_is_current() {
        let before = Utc::now();
        let now = SystemClock.now();
        let after = Utc::now();

        assert!(before <= now && now <= after);
    }

    #[test]
    fn test_mock_clock_frozen() {
        let clock = MockClock::new(start());

        assert_eq!(clock.now(), start());
        assert_eq!(clock.now(), start());
    }

    #[test]
    fn test_mock_clock_advance_and_set() {
        let clock = MockClock::new(start());

        clock.advance(TimeDelta::hours(2));
        assert_eq!(clock.now(), start() + TimeDelta::hours(2));

        clock.set(start());
        assert_eq!(clock.now(), start());
    }

    #[test]
    fn test_mock_clock_step() {
        let clock = MockClock::with_step(start(), TimeDelta::seconds(30));

        assert_eq!(clock.now(), start());
        assert_eq!(clock.now(), start() + TimeDelta::seconds(30));
        assert_eq!(clock.now(), start() + TimeDelta::seconds(60));
    }
}
