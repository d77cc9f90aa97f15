//! Wall-clock sources
//!
//! Domain logic never asks the operating system for the time directly.
//! It receives a `Clock` so session bookkeeping stays deterministic in tests:
//! - `SystemClock` - the real UTC clock
//! - `ManualClock` - a clock that only moves when told to

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::cell::Cell;

/// A source of the current UTC time
pub trait Clock {
    /// The current instant
    fn now(&self) -> DateTime<Utc>;
}

/// The operating system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that stays put until advanced
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Cell<DateTime<Utc>>,
}

impl ManualClock {
    /// Create a clock frozen at the given instant
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Cell::new(now),
        }
    }

    /// Create a clock frozen at midnight UTC of the given date
    ///
    /// Falls back to the Unix epoch when the date does not exist.
    pub fn on_date(year: i32, month: u32, day: u32) -> Self {
        let now = Utc
            .with_ymd_and_hms(year, month, day, 0, 0, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        Self::at(now)
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    /// Jump to a specific instant
    pub fn set(&self, now: DateTime<Utc>) {
        self.now.set(now);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::on_date(2024, 3, 1);
        assert_eq!(clock.now().to_rfc3339(), "2024-03-01T00:00:00+00:00");

        clock.advance(Duration::days(1));
        assert_eq!(clock.now().to_rfc3339(), "2024-03-02T00:00:00+00:00");
    }

    #[test]
    fn test_manual_clock_invalid_date() {
        let clock = ManualClock::on_date(2023, 2, 30);
        assert_eq!(clock.now(), DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn test_system_clock_moves_forward() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
