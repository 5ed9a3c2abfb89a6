// src/period_picker.rs
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::period::Period;

/// Selects the active period for `now`.
///
/// Periods may come from the local generator (always with `start`/`end`) or
/// from the backend (sometimes id-only), so the lookup runs in three passes:
/// 1. containment on the explicit `start`/`end` fields,
/// 2. containment on the dates encoded in the id,
/// 3. the latest period already ended at `now`, else the first period.
///
/// Returns `None` only for an empty list.
pub fn pick_current_period(periods: &[Period], now: DateTime<Utc>) -> Option<&Period> {
    let first = periods.first()?;

    if let Some(period) = periods.iter().find(|p| {
        p.explicit_bounds()
            .is_some_and(|(start, end)| start <= now && now <= end)
    }) {
        return Some(period);
    }

    if let Some(period) = periods.iter().find(|p| {
        p.id_bounds()
            .is_some_and(|(start, end)| start <= now && now <= end)
    }) {
        debug!("Picked period {} from its id", period.id);
        return Some(period);
    }

    // Ties on end keep the earliest listed period.
    let latest_completed = periods
        .iter()
        .filter_map(|p| p.resolved_end().filter(|end| *end <= now).map(|end| (p, end)))
        .fold(None::<(&Period, DateTime<Utc>)>, |best, (p, end)| match best {
            Some((_, best_end)) if best_end >= end => best,
            _ => Some((p, end)),
        });

    match latest_completed {
        Some((period, _)) => {
            debug!("No period contains {}, using last completed {}", now, period.id);
            Some(period)
        }
        None => {
            debug!("No period contains or precedes {}, using first {}", now, first.id);
            Some(first)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::start_of_day;
    use chrono::{NaiveDate, TimeZone};

    fn d(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
    }

    fn at(y: i32, m: u32, day: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, day, h, 0, 0).unwrap()
    }

    fn january_periods() -> Vec<Period> {
        vec![
            Period::from_dates(d("2025-01-01"), d("2025-01-14")),
            Period::from_dates(d("2025-01-15"), d("2025-01-28")),
        ]
    }

    #[test]
    fn test_empty_list_returns_none() {
        assert!(pick_current_period(&[], at(2025, 1, 20, 0)).is_none());
    }

    #[test]
    fn test_picks_period_containing_now() {
        let periods = january_periods();
        let picked = pick_current_period(&periods, at(2025, 1, 20, 0)).unwrap();
        assert_eq!(picked.id, "2025-01-15_2025-01-28");
    }

    #[test]
    fn test_end_date_is_inclusive() {
        let periods = january_periods();
        let picked = pick_current_period(&periods, at(2025, 1, 14, 22)).unwrap();
        assert_eq!(picked.id, "2025-01-01_2025-01-14");
    }

    #[test]
    fn test_falls_back_to_id_when_bounds_missing() {
        let periods = vec![
            Period::from_id("2024-12-18_2024-12-31"),
            Period::from_id("2025-01-01_2025-01-14"),
        ];
        let picked = pick_current_period(&periods, at(2025, 1, 5, 12)).unwrap();
        assert_eq!(picked.id, "2025-01-01_2025-01-14");
    }

    #[test]
    fn test_explicit_bounds_take_precedence_over_id() {
        // An externally supplied period whose id disagrees with its fields.
        let mut mislabeled = Period::from_id("2025-01-15_2025-01-28");
        mislabeled.start = Some(start_of_day(d("2025-03-01")));
        mislabeled.end = Some(start_of_day(d("2025-03-15")));
        let by_fields = Period::from_dates(d("2025-01-15"), d("2025-01-28"));

        let periods = vec![mislabeled, by_fields];
        let picked = pick_current_period(&periods, at(2025, 1, 20, 0)).unwrap();
        assert_eq!(picked.start, Some(start_of_day(d("2025-01-15"))));
    }

    #[test]
    fn test_latest_completed_when_now_is_past_all_periods() {
        let periods = january_periods();
        let picked = pick_current_period(&periods, at(2025, 3, 1, 0)).unwrap();
        assert_eq!(picked.id, "2025-01-15_2025-01-28");
    }

    #[test]
    fn test_latest_completed_ignores_list_order() {
        let mut periods = january_periods();
        periods.reverse();
        periods.push(Period::from_id("not-a-period"));
        let picked = pick_current_period(&periods, at(2025, 2, 10, 0)).unwrap();
        assert_eq!(picked.id, "2025-01-15_2025-01-28");
    }

    #[test]
    fn test_first_period_when_all_in_future() {
        let periods = january_periods();
        let picked = pick_current_period(&periods, at(2024, 6, 1, 0)).unwrap();
        assert_eq!(picked.id, "2025-01-01_2025-01-14");
    }

    #[test]
    fn test_unparseable_periods_fall_back_to_first() {
        let periods = vec![Period::from_id("current"), Period::from_id("next")];
        let picked = pick_current_period(&periods, at(2025, 1, 1, 0)).unwrap();
        assert_eq!(picked.id, "current");
    }
}
