// src/clock.rs
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::sync::{Arc, Mutex};

/// Source of "now". Everything that depends on the current moment takes one of
/// these so tests can pin time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Current calendar date in UTC. Local time is never consulted.
    fn today_utc(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock for tests and for replaying a past payroll run.
#[derive(Debug, Clone)]
pub struct FixedClock {
    current_time: Arc<Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            current_time: Arc::new(Mutex::new(now)),
        }
    }

    /// Parses `"%Y-%m-%d %H:%M:%S"` as a UTC timestamp.
    pub fn parse(datetime_str: &str) -> Option<Self> {
        NaiveDateTime::parse_from_str(datetime_str, "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|dt| Self::new(dt.and_utc()))
    }

    pub fn set_time(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.current_time.lock() {
            *guard = now;
        }
    }

    pub fn advance(&self, duration: chrono::Duration) {
        if let Ok(mut guard) = self.current_time.lock() {
            *guard += duration;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        match self.current_time.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn fixed_clock_parses_and_advances() {
        let clock = FixedClock::parse("2025-10-11 23:30:00").unwrap();
        assert_eq!(
            clock.today_utc(),
            NaiveDate::from_ymd_opt(2025, 10, 11).unwrap()
        );

        clock.advance(Duration::hours(1));
        assert_eq!(
            clock.today_utc(),
            NaiveDate::from_ymd_opt(2025, 10, 12).unwrap()
        );
    }

    #[test]
    fn fixed_clock_set_time_overrides() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        clock.set_time(Utc.with_ymd_and_hms(2025, 3, 9, 12, 0, 0).unwrap());
        assert_eq!(clock.now(), Utc.with_ymd_and_hms(2025, 3, 9, 12, 0, 0).unwrap());
    }

    #[test]
    fn fixed_clock_rejects_bad_input() {
        assert!(FixedClock::parse("not a date").is_none());
    }
}
