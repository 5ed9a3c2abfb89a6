// src/period.rs
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const PERIOD_LENGTH_DAYS: i64 = 14;
pub const DATE_FORMAT: &str = "%Y-%m-%d";

static PERIOD_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d{4}-\d{2}-\d{2})_(\d{4}-\d{2}-\d{2})\s*$").expect("period id regex is valid")
});

/// A 14-day payroll window. `start` is midnight UTC of the first day and `end`
/// the last instant of the final day, so containment covers the whole end date.
///
/// Periods coming from the backend may carry only `id` and `label`; the
/// timestamps are then `None` and the dates are recovered from the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(
        default,
        deserialize_with = "deserialize_start",
        skip_serializing_if = "Option::is_none"
    )]
    pub start: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "deserialize_end",
        skip_serializing_if = "Option::is_none"
    )]
    pub end: Option<DateTime<Utc>>,
}

impl Period {
    /// Builds a period from inclusive calendar dates.
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            id: format_period_id(start, end),
            label: format_period_label(start, end),
            start: Some(start_of_day(start)),
            end: Some(end_of_day(end)),
        }
    }

    /// A period known only by its id, as the backend sometimes sends them.
    pub fn from_id(id: impl Into<String>) -> Self {
        let id = id.into();
        let label = parse_period_id(&id)
            .map(|(start, end)| format_period_label(start, end))
            .unwrap_or_default();
        Self {
            id,
            label,
            start: None,
            end: None,
        }
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start
            .map(|ts| ts.date_naive())
            .or_else(|| parse_period_id(&self.id).map(|(start, _)| start))
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end
            .map(|ts| ts.date_naive())
            .or_else(|| parse_period_id(&self.id).map(|(_, end)| end))
    }

    /// Explicit `start`/`end` when both are present.
    pub fn explicit_bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }

    /// Bounds recovered from the id only.
    pub fn id_bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        parse_period_id(&self.id).map(|(start, end)| (start_of_day(start), end_of_day(end)))
    }

    /// Explicit end, falling back to the id.
    pub fn resolved_end(&self) -> Option<DateTime<Utc>> {
        self.end.or_else(|| self.id_bounds().map(|(_, end)| end))
    }
}

pub fn format_period_id(start: NaiveDate, end: NaiveDate) -> String {
    format!("{}_{}", start.format(DATE_FORMAT), end.format(DATE_FORMAT))
}

pub fn format_period_label(start: NaiveDate, end: NaiveDate) -> String {
    format!("{} - {}", start.format("%b %-d, %Y"), end.format("%b %-d, %Y"))
}

/// Parses `YYYY-MM-DD_YYYY-MM-DD`. Returns `None` for anything else, including
/// ids whose end precedes their start.
pub fn parse_period_id(id: &str) -> Option<(NaiveDate, NaiveDate)> {
    let caps = PERIOD_ID_RE.captures(id)?;
    let start = NaiveDate::parse_from_str(caps.get(1)?.as_str(), DATE_FORMAT).ok()?;
    let end = NaiveDate::parse_from_str(caps.get(2)?.as_str(), DATE_FORMAT).ok()?;
    if end < start {
        return None;
    }
    Some((start, end))
}

pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_nano_opt(23, 59, 59, 999_999_999)
        .unwrap_or_else(|| date.and_time(NaiveTime::MIN))
        .and_utc()
}

// Backend timestamps show up as RFC 3339 strings, bare dates or epoch millis.
// Anything unreadable becomes None and the picker falls back to the id.
fn timestamp_from_value(value: Value, end_of_date: bool) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
                return Some(ts.with_timezone(&Utc));
            }
            NaiveDate::parse_from_str(s, DATE_FORMAT).ok().map(|date| {
                if end_of_date {
                    end_of_day(date)
                } else {
                    start_of_day(date)
                }
            })
        }
        Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    }
}

fn deserialize_start<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| timestamp_from_value(v, false)))
}

fn deserialize_end<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| timestamp_from_value(v, true)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn d(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, DATE_FORMAT)
            .unwrap_or_else(|_| panic!("Invalid date string format: {}", date_str))
    }

    #[test]
    fn test_from_dates_builds_id_label_and_bounds() {
        let period = Period::from_dates(d("2025-09-28"), d("2025-10-11"));
        assert_eq!(period.id, "2025-09-28_2025-10-11");
        assert_eq!(period.label, "Sep 28, 2025 - Oct 11, 2025");
        assert_eq!(period.start, Some(start_of_day(d("2025-09-28"))));
        assert_eq!(
            period.end.unwrap() + Duration::nanoseconds(1),
            start_of_day(d("2025-10-12"))
        );
    }

    #[test]
    fn test_parse_period_id() {
        assert_eq!(
            parse_period_id("2025-01-01_2025-01-14"),
            Some((d("2025-01-01"), d("2025-01-14")))
        );
        assert_eq!(parse_period_id("2025-01-14_2025-01-01"), None);
        assert_eq!(parse_period_id("2025-13-01_2025-13-14"), None);
        assert_eq!(parse_period_id("current"), None);
        assert_eq!(parse_period_id(""), None);
    }

    #[test]
    fn test_from_id_recovers_dates() {
        let period = Period::from_id("2025-01-01_2025-01-14");
        assert_eq!(period.label, "Jan 1, 2025 - Jan 14, 2025");
        assert_eq!(period.start_date(), Some(d("2025-01-01")));
        assert_eq!(period.end_date(), Some(d("2025-01-14")));
        assert!(period.explicit_bounds().is_none());
    }

    #[test]
    fn test_deserialize_accepts_several_timestamp_shapes() {
        let json = r#"[
            {"id": "2025-01-01_2025-01-14", "label": "a", "start": "2025-01-01", "end": "2025-01-14"},
            {"id": "2025-01-15_2025-01-28", "start": "2025-01-15T00:00:00Z", "end": 1738108799000},
            {"id": "2025-01-29_2025-02-11", "start": null, "end": "garbage"}
        ]"#;
        let periods: Vec<Period> = serde_json::from_str(json).unwrap();

        assert_eq!(periods[0].start, Some(start_of_day(d("2025-01-01"))));
        assert_eq!(periods[0].end, Some(end_of_day(d("2025-01-14"))));
        assert_eq!(periods[1].start, Some(start_of_day(d("2025-01-15"))));
        assert_eq!(periods[1].end_date(), Some(d("2025-01-28")));
        assert_eq!(periods[1].label, "");
        assert_eq!(periods[2].start, None);
        assert_eq!(periods[2].end, None);
        assert_eq!(periods[2].end_date(), Some(d("2025-02-11")));
    }

    #[test]
    fn test_serialize_omits_missing_bounds() {
        let json = serde_json::to_value(Period::from_id("2025-01-01_2025-01-14")).unwrap();
        assert!(json.get("start").is_none());
        assert_eq!(json["id"], "2025-01-01_2025-01-14");
    }
}
