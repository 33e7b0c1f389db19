//! Typed input records.
//!
//! ## Purpose
//!
//! This module defines the immutable rows the estimation pipelines consume:
//! genomic sequence records for the growth-rate engine and daily test
//! proportions for the takeover estimator.
//!
//! ## Invariants
//!
//! * Records are never mutated by the engine; every stage borrows them.
//! * `DailyProportion::proportion` is only defined for a positive denominator.

// External dependencies
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// Internal dependencies
use crate::primitives::dates::epiweek_start;

// ============================================================================
// Sequence Records
// ============================================================================

/// One sequenced genome sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceRecord {
    /// Unique sample identifier.
    pub id: String,

    /// Date the sample was collected.
    pub collection_date: NaiveDate,

    /// Sunday anchoring the epidemiological week of `collection_date`.
    pub epiweek: NaiveDate,

    /// Raw PANGO lineage label (e.g. "BA.5.2.6").
    pub lineage: String,

    /// Region or state tag.
    pub region: String,
}

impl SequenceRecord {
    /// Build a record, deriving the epiweek from the collection date.
    pub fn new(
        id: impl Into<String>,
        collection_date: NaiveDate,
        lineage: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            collection_date,
            epiweek: epiweek_start(collection_date),
            lineage: lineage.into(),
            region: region.into(),
        }
    }
}

/// Keep only the records tagged with `region`.
pub fn filter_region<'a>(records: &'a [SequenceRecord], region: &str) -> Vec<&'a SequenceRecord> {
    records.iter().filter(|r| r.region == region).collect()
}

// ============================================================================
// Daily Proportions
// ============================================================================

/// One day of test results carrying a proxy signal (e.g. SGTF).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyProportion {
    /// Reporting date.
    pub date: NaiveDate,

    /// Tests showing the signal.
    pub numerator: f64,

    /// All positive tests.
    pub denominator: f64,
}

impl DailyProportion {
    /// Create a new daily observation.
    pub fn new(date: NaiveDate, numerator: f64, denominator: f64) -> Self {
        Self {
            date,
            numerator,
            denominator,
        }
    }

    /// Observed proportion, or `None` when the denominator is not positive.
    pub fn proportion(&self) -> Option<f64> {
        if self.denominator > 0.0 && self.numerator.is_finite() && self.denominator.is_finite() {
            Some(self.numerator / self.denominator)
        } else {
            None
        }
    }
}
