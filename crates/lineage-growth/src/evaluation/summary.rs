//! Growth-rate summary tables.
//!
//! ## Purpose
//!
//! This module joins the per-lineage growth rates with observation counts,
//! current estimated proportions and human-readable variant names, and
//! produces the two tables stakeholders read: the full audit table and a
//! filtered table of fast movers plus the watch-list.
//!
//! ## Design notes
//!
//! * **Pure join**: every input is passed in; nothing is looked up globally.
//! * **Deterministic order**: rows are sorted by descending growth rate with
//!   ties broken by ascending label.
//!
//! ## Invariants
//!
//! * No row has a zero recent count.
//! * Every filtered row has `recent_count > min_recent_count` or is forced.
//! * The filtered table preserves the full table's row order.

// External dependencies
use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter, Result};

// Internal dependencies
use crate::algorithms::collapse::CollapseMap;
use crate::primitives::records::SequenceRecord;
use crate::primitives::reference::ReferenceTables;
use crate::primitives::table::ProportionTable;

/// Default number of fastest growers in the filtered table.
pub const DEFAULT_TOP_N: usize = 5;

/// Default recent-count floor for the fastest-grower selection.
pub const DEFAULT_MIN_RECENT_COUNT: usize = 5;

// ============================================================================
// Entries
// ============================================================================

/// One row of the growth-rate summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthRateEntry {
    /// Collapsed lineage label.
    pub lineage: String,

    /// Human-readable variant name, if known.
    pub variant: Option<String>,

    /// Records with this collapsed label in the full record set.
    pub total_count: usize,

    /// Records with this collapsed label inside the analysis window.
    #[serde(rename = "recent_counts")]
    pub recent_count: usize,

    /// Estimated proportion in the most recent window week.
    pub est_proportion: f64,

    /// Log-odds growth rate per day.
    pub growth_rate: f64,

    /// First window week.
    pub first_date: NaiveDate,

    /// Last window week.
    pub last_date: NaiveDate,
}

/// Options for the filtered table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryOptions {
    /// Number of fastest growers kept.
    pub top_n: usize,

    /// Fastest growers need strictly more recent records than this.
    pub min_recent_count: usize,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            min_recent_count: DEFAULT_MIN_RECENT_COUNT,
        }
    }
}

/// The full and filtered growth-rate tables.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthSummary {
    /// Every lineage with a non-zero recent count.
    pub full: Vec<GrowthRateEntry>,

    /// Fastest growers plus forced labels.
    pub filtered: Vec<GrowthRateEntry>,
}

// ============================================================================
// Counting
// ============================================================================

/// Records per collapsed label.
pub fn collapsed_counts<'a, I>(records: I, map: &CollapseMap) -> BTreeMap<String, usize>
where
    I: IntoIterator<Item = &'a SequenceRecord>,
{
    let mut counts = BTreeMap::new();
    for record in records {
        *counts
            .entry(map.resolve(&record.lineage).to_string())
            .or_insert(0) += 1;
    }
    counts
}

// ============================================================================
// Assembly
// ============================================================================

/// Join growth rates, counts, proportions and names into summary tables.
///
/// Only labels that are columns of `table` and have a growth rate are
/// considered.
pub fn assemble_summary(
    growth_rates: &BTreeMap<String, f64>,
    total_counts: &BTreeMap<String, usize>,
    recent_counts: &BTreeMap<String, usize>,
    table: &ProportionTable,
    references: &ReferenceTables,
    options: &SummaryOptions,
) -> GrowthSummary {
    let (Some(&first_date), Some(&last_date)) = (table.weeks.first(), table.weeks.last()) else {
        return GrowthSummary {
            full: Vec::new(),
            filtered: Vec::new(),
        };
    };

    let mut full: Vec<GrowthRateEntry> = table
        .labels
        .iter()
        .filter_map(|label| {
            let growth_rate = *growth_rates.get(label)?;
            let recent_count = recent_counts.get(label).copied().unwrap_or(0);
            if recent_count == 0 {
                return None;
            }
            Some(GrowthRateEntry {
                lineage: label.clone(),
                variant: references.variant_name(label).map(str::to_string),
                total_count: total_counts.get(label).copied().unwrap_or(0),
                recent_count,
                est_proportion: table.latest(label).unwrap_or(0.0),
                growth_rate,
                first_date,
                last_date,
            })
        })
        .collect();

    full.sort_by(by_growth_then_label);

    let fastest: BTreeSet<&str> = full
        .iter()
        .filter(|e| e.recent_count > options.min_recent_count)
        .take(options.top_n)
        .map(|e| e.lineage.as_str())
        .collect();

    let filtered = full
        .iter()
        .filter(|e| fastest.contains(e.lineage.as_str()) || references.is_forced(&e.lineage))
        .cloned()
        .collect();

    GrowthSummary { full, filtered }
}

fn by_growth_then_label(a: &GrowthRateEntry, b: &GrowthRateEntry) -> Ordering {
    b.growth_rate
        .total_cmp(&a.growth_rate)
        .then_with(|| a.lineage.cmp(&b.lineage))
}

// ============================================================================
// Display Implementation
// ============================================================================

impl Display for GrowthSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        writeln!(
            f,
            "{:<20} {:<12} {:>8} {:>8} {:>10} {:>12}",
            "Lineage", "Variant", "Total", "Recent", "Proportion", "Growth/day"
        )?;
        writeln!(f, "{:-<75}", "")?;
        for entry in &self.filtered {
            writeln!(
                f,
                "{:<20} {:<12} {:>8} {:>8} {:>10.4} {:>12.5}",
                entry.lineage,
                entry.variant.as_deref().unwrap_or("-"),
                entry.total_count,
                entry.recent_count,
                entry.est_proportion,
                entry.growth_rate
            )?;
        }
        if let (Some(first), Some(last)) = (self.full.first(), self.full.last()) {
            writeln!(
                f,
                "{} lineages, window {} to {}",
                self.full.len(),
                first.first_date,
                last.last_date
            )?;
        }
        Ok(())
    }
}
