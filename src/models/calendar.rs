use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{Result, TrackerError};

/// Storage format for timestamps. Fixed width, so text order is time order.
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub(crate) fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub(crate) fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).ok()
}

/// Parse a user-supplied date or date-time.
///
/// Accepts `YYYY-MM-DD` (midnight), `YYYY-MM-DD HH:MM[:SS]` and the `T`
/// separated ISO form.
pub(crate) fn parse_date_input(s: &str) -> std::result::Result<NaiveDateTime, String> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN));
    }
    for fmt in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(ts);
        }
    }
    Err(format!("invalid date '{s}' (expected YYYY-MM-DD or YYYY-MM-DD HH:MM:SS)"))
}

/// Human readable "Month Year" label, e.g. `"September 2025"`.
pub(crate) fn month_year_label(ts: &NaiveDateTime) -> String {
    ts.format("%B %Y").to_string()
}

/// First day of the month named by a "Month Year" label.
///
/// Only the exact form `month_year_label` produces is accepted, so a label
/// that parses always matches the `monthYear` of the records it selects.
pub(crate) fn parse_month_year(label: &str) -> Result<NaiveDate> {
    let invalid = || {
        TrackerError::validation(format!(
            "invalid monthYear '{label}' (expected e.g. \"September 2025\")"
        ))
    };
    let trimmed = label.trim();
    let first = NaiveDate::parse_from_str(&format!("01 {trimmed}"), "%d %B %Y")
        .map_err(|_| invalid())?;
    if month_year_label(&midnight(first)) != trimmed {
        return Err(invalid());
    }
    Ok(first)
}

/// Half-open range `[first of month, first of next month)` for a label.
pub(crate) fn month_year_range(label: &str) -> Result<(NaiveDateTime, NaiveDateTime)> {
    let first = parse_month_year(label)?;
    Ok(month_range(first))
}

pub(crate) fn month_range(day: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let first = first_of_month(day);
    let next = first
        .checked_add_months(Months::new(1))
        .unwrap_or(NaiveDate::MAX);
    (midnight(first), midnight(next))
}

pub(crate) fn first_of_month(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

pub(crate) fn midnight(day: NaiveDate) -> NaiveDateTime {
    day.and_time(NaiveTime::MIN)
}
