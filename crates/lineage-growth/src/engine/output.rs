//! Output types for both pipelines.
//!
//! ## Purpose
//!
//! This module defines the report structs returned by the growth-rate and
//! takeover pipelines. Reports own every intermediate table a caller may
//! want to inspect or chart.
//!
//! ## Design notes
//!
//! * **Ergonomics**: Implements `Display` for human-readable output.
//! * **Inspection**: The collapse history, proportion table and raw growth
//!   rates are kept alongside the summary.
//!
//! ## Invariants
//!
//! * `TakeoverReport::dates`, `observed` and `smoothed` have equal length.
//! * Every estimate satisfies `lower <= upper`.
//!
//! ## Non-goals
//!
//! * This module does not perform calculations; it only stores results.

// External dependencies
use chrono::NaiveDate;
use ndarray::Array2;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result};

// Internal dependencies
use crate::algorithms::collapse::CollapseMap;
use crate::algorithms::levenberg::Termination;
use crate::evaluation::diagnostics::Diagnostics;
use crate::evaluation::summary::GrowthSummary;
use crate::evaluation::takeover::{TakeoverEstimates, TrajectoryPoint};
use crate::math::logistic::N_PARAMS;
use crate::primitives::table::ProportionTable;

// ============================================================================
// Growth Report
// ============================================================================

/// Output of the growth-rate pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthReport {
    /// Analysis window, ascending.
    pub window: Vec<NaiveDate>,

    /// Raw → collapsed lineage mapping with its round history.
    pub collapse: CollapseMap,

    /// Weekly estimated proportions.
    pub proportions: ProportionTable,

    /// Growth rate per collapsed label.
    pub growth_rates: BTreeMap<String, f64>,

    /// Full and filtered summary tables.
    pub summary: GrowthSummary,
}

impl GrowthReport {
    /// Growth rate of a collapsed label.
    pub fn growth_rate(&self, label: &str) -> Option<f64> {
        self.growth_rates.get(label).copied()
    }
}

impl Display for GrowthReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        writeln!(f, "Summary:")?;
        writeln!(
            f,
            "  Window:    {} weeks ({} collapsing rounds)",
            self.window.len(),
            self.collapse.rounds_run()
        )?;
        writeln!(f, "  Lineages:  {}", self.proportions.n_labels())?;
        writeln!(f)?;
        write!(f, "{}", self.summary)
    }
}

// ============================================================================
// Takeover Report
// ============================================================================

/// Fitted logistic mixture.
#[derive(Debug, Clone, PartialEq)]
pub struct MixtureFit {
    /// `[x0₁, r₁, x0₂, r₂, x0₃, r₃]`.
    pub params: [f64; N_PARAMS],

    /// Parameter covariance.
    pub covariance: Array2<f64>,

    /// Parameter standard errors.
    pub std_errors: [f64; N_PARAMS],

    /// Why the solver stopped.
    pub termination: Termination,

    /// Fit quality against the smoothed series.
    pub diagnostics: Diagnostics<f64>,
}

/// Output of the takeover pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TakeoverReport {
    /// Series dates.
    pub dates: Vec<NaiveDate>,

    /// Raw daily proportions.
    pub observed: Vec<f64>,

    /// Smoothed proportions used as the fit target.
    pub smoothed: Vec<f64>,

    /// Fitted mixture.
    pub fit: MixtureFit,

    /// Derived takeover quantities.
    pub estimates: TakeoverEstimates,

    /// Fitted curve and its envelope over the horizon.
    pub trajectory: Vec<TrajectoryPoint>,
}

impl Display for TakeoverReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        writeln!(f, "Summary:")?;
        writeln!(f, "  Days:        {}", self.dates.len())?;
        if let (Some(first), Some(last)) = (self.dates.first(), self.dates.last()) {
            writeln!(f, "  Range:       {} to {}", first, last)?;
        }
        writeln!(f, "  Termination: {:?}", self.fit.termination)?;
        writeln!(f)?;
        writeln!(f, "{:>6} {:>12} {:>12}", "Param", "Value", "Std. error")?;
        let names = ["x0_1", "r_1", "x0_2", "r_2", "x0_3", "r_3"];
        for (i, name) in names.iter().enumerate() {
            writeln!(
                f,
                "{:>6} {:>12.6} {:>12.6}",
                name, self.fit.params[i], self.fit.std_errors[i]
            )?;
        }
        writeln!(f)?;
        write!(f, "{}", self.fit.diagnostics)?;
        writeln!(f)?;
        write!(f, "{}", self.estimates)
    }
}
