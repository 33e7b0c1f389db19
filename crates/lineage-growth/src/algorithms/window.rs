//! Analysis-window selection.
//!
//! Trend estimates are only meaningful for weeks with enough sequenced
//! samples. This module counts records per epiweek, keeps the weeks whose
//! count exceeds a minimum, and returns the most recent of those in
//! chronological order.

// External dependencies
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::warn;

// Internal dependencies
use crate::primitives::records::SequenceRecord;

/// Default minimum number of records a week needs to qualify.
pub const DEFAULT_MIN_WEEK_COUNT: usize = 100;

/// Default number of trailing weeks in the analysis window.
pub const DEFAULT_WINDOW_WEEKS: usize = 8;

/// Number of records per epiweek, ascending by week.
pub fn weekly_counts<'a, I>(records: I) -> BTreeMap<NaiveDate, usize>
where
    I: IntoIterator<Item = &'a SequenceRecord>,
{
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry(record.epiweek).or_insert(0) += 1;
    }
    counts
}

/// Select the trailing analysis window.
///
/// Keeps weeks with strictly more than `min_count` records and returns the
/// last `n_weeks` of them, ascending. When fewer qualify, all qualifying
/// weeks are returned and a warning is logged.
pub fn select_weeks<'a, I>(records: I, min_count: usize, n_weeks: usize) -> Vec<NaiveDate>
where
    I: IntoIterator<Item = &'a SequenceRecord>,
{
    let qualifying: Vec<NaiveDate> = weekly_counts(records)
        .into_iter()
        .filter(|&(_, count)| count > min_count)
        .map(|(week, _)| week)
        .collect();

    if qualifying.len() < n_weeks {
        warn!(
            qualifying = qualifying.len(),
            requested = n_weeks,
            min_count,
            "fewer qualifying weeks than requested for the analysis window"
        );
    }

    let start = qualifying.len().saturating_sub(n_weeks);
    qualifying[start..].to_vec()
}
