//! Calendar helpers shared by both pipelines.
//!
//! Week dates are encoded as day numbers counted from 1970-01-01, the same
//! convention the charting layer uses for its date axis, so slopes come out
//! in "per day" units.

// External dependencies
use chrono::{Datelike, Duration, NaiveDate};

/// `num_days_from_ce()` of 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Day number of `date` counted from 1970-01-01.
#[inline]
pub fn day_number(date: NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
}

/// Sunday that starts the epidemiological week containing `date`.
#[inline]
pub fn epiweek_start(date: NaiveDate) -> NaiveDate {
    let offset = i64::from(date.weekday().num_days_from_sunday());
    date - Duration::days(offset)
}

/// Parse an ISO `YYYY-MM-DD` date, tolerating a trailing time component.
pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed
        .split(|c: char| c == 'T' || c == ' ')
        .next()
        .unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}
