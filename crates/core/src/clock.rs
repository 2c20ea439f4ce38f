//! Time source for services that stamp records with "today".

use chrono::NaiveDate;
use std::sync::Mutex;
use crate::Time;

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> Time;

    /// Current calendar day (UTC).
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Time {
        chrono::Utc::now()
    }
}

/// Manually advanced clock for tests and replays.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<Time>,
}

impl FixedClock {
    /// Create a clock frozen at `now`.
    pub fn new(now: Time) -> Self {
        Self { now: Mutex::new(now) }
    }

    /// Move the clock to a new instant.
    pub fn set(&self, now: Time) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    /// Move the clock forward by whole days.
    pub fn advance_days(&self, days: i64) {
        let mut guard = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *guard += chrono::Duration::days(days);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Time {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fixed_clock_advances() {
        let clock = FixedClock::new(chrono::Utc.with_ymd_and_hms(2025, 1, 31, 12, 0, 0).unwrap());
        clock.advance_days(1);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
    }
}
