// src/period_generator.rs
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::error::PayrollError;
use crate::period::{Period, DATE_FORMAT, PERIOD_LENGTH_DAYS};

/// Biweekly pay schedule pinned to one known period end date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BiweeklySchedule {
    anchor_end: NaiveDate,
}

impl BiweeklySchedule {
    pub fn new(anchor_end: NaiveDate) -> Self {
        if anchor_end.weekday() != Weekday::Sat {
            warn!(
                "Payroll anchor {} is a {:?}, periods usually end on a Saturday",
                anchor_end,
                anchor_end.weekday()
            );
        }
        Self { anchor_end }
    }

    /// Parses the anchor from configuration (`YYYY-MM-DD`).
    pub fn parse(anchor: &str) -> Result<Self, PayrollError> {
        let anchor_end = NaiveDate::parse_from_str(anchor.trim(), DATE_FORMAT).map_err(|e| {
            PayrollError::invalid_argument(format!(
                "anchor end date '{}' is not a YYYY-MM-DD date: {}",
                anchor, e
            ))
        })?;
        Ok(Self::new(anchor_end))
    }

    pub fn anchor_end(&self) -> NaiveDate {
        self.anchor_end
    }

    pub fn periods(&self, count: usize, clock: &dyn Clock) -> Result<Vec<Period>, PayrollError> {
        build_biweekly_periods(self.anchor_end, count, clock.today_utc())
    }
}

/// End date of the period containing `today`, or of the most recently
/// completed one when `today` is not itself a boundary.
fn reference_end(anchor_end: NaiveDate, today: NaiveDate) -> Result<NaiveDate, PayrollError> {
    let days_since_anchor = (today - anchor_end).num_days();
    let k = days_since_anchor.div_euclid(PERIOD_LENGTH_DAYS);
    shift_days(anchor_end, k * PERIOD_LENGTH_DAYS)
}

fn shift_days(date: NaiveDate, days: i64) -> Result<NaiveDate, PayrollError> {
    Duration::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .ok_or_else(|| {
            PayrollError::invalid_argument(format!(
                "date overflow shifting {} by {} days",
                date, days
            ))
        })
}

fn shift_periods(date: NaiveDate, periods: i64) -> Result<NaiveDate, PayrollError> {
    let days = periods.checked_mul(PERIOD_LENGTH_DAYS).ok_or_else(|| {
        PayrollError::invalid_argument(format!(
            "cannot shift {} by {} periods",
            date, periods
        ))
    })?;
    shift_days(date, days)
}

fn period_ending(end: NaiveDate) -> Result<Period, PayrollError> {
    let start = shift_days(end, -(PERIOD_LENGTH_DAYS - 1))?;
    Ok(Period::from_dates(start, end))
}

/// Generates `count` consecutive 14-day periods around today, oldest first.
///
/// `count / 2` periods precede the reference period and the rest follow it, so
/// even counts split as `n/2` past, current, `n/2 - 1` future and odd counts
/// give the extra period to the future side. `count` of 0 or 1 yields only the
/// reference period. All arithmetic is on UTC calendar dates.
pub fn build_biweekly_periods(
    anchor_end: NaiveDate,
    count: usize,
    today: NaiveDate,
) -> Result<Vec<Period>, PayrollError> {
    let end_ref = reference_end(anchor_end, today)?;
    let total = i64::try_from(count.max(1)).map_err(|_| {
        PayrollError::invalid_argument(format!("period count {} is too large", count))
    })?;
    let past = total / 2;
    let future = total - past - 1;

    // Both ends of the range must be representable before anything is built.
    let first_start = shift_days(shift_periods(end_ref, -past)?, -(PERIOD_LENGTH_DAYS - 1))?;
    let last_end = shift_periods(end_ref, future)?;

    debug!(
        "Building {} biweekly periods around {} ({} to {}, anchor {}, today {})",
        total, end_ref, first_start, last_end, anchor_end, today
    );

    (-past..=future)
        .map(|offset| shift_periods(end_ref, offset).and_then(period_ending))
        .collect()
}
