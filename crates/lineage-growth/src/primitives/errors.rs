//! Error types for lineage growth and takeover estimation.
//!
//! ## Purpose
//!
//! This module defines the error conditions that can occur while loading
//! surveillance inputs, collapsing lineages, fitting the proportion model,
//! regressing growth rates, and fitting the takeover mixture curve.
//!
//! ## Design notes
//!
//! * **Contextual**: Errors include relevant values (e.g., got vs. required counts).
//! * **Deferred**: Builder misuse is recorded and reported by `build()`.
//! * **Distinguishable**: Input-shape errors and numerical-fit errors are separate
//!   variants so callers can tell "bad data" from "fit did not converge".
//!
//! ## Key concepts
//!
//! 1. **Input shape**: Empty tables, missing columns, too few analysis weeks.
//! 2. **Reference data**: Malformed variant-name or alias tables.
//! 3. **Parameters**: Out-of-range thresholds, levels, or horizons.
//! 4. **Numerical fits**: Too few usable points, singular systems, non-convergence.
//!
//! ## Invariants
//!
//! * All variants provide sufficient context for diagnosis.
//! * A missing variant-name mapping is never an error.
//!
//! ## Non-goals
//!
//! * This module does not perform the validation logic itself.
//! * This module does not provide error recovery or retry strategies.

// External dependencies
use std::error::Error;
use std::fmt::{Display, Formatter, Result};

// ============================================================================
// Error Type
// ============================================================================

/// Error type for estimation operations.
#[derive(Debug, Clone, PartialEq)]
pub enum EstimationError {
    /// The record set or series is empty.
    EmptyInput,

    /// A required column is absent from a tabular input.
    MissingColumn(String),

    /// A single input row could not be parsed.
    InvalidRecord {
        /// 1-based data row number (header excluded).
        row: usize,
        /// What went wrong.
        reason: String,
    },

    /// A reference table line does not have the expected shape.
    MalformedReference {
        /// Name of the reference table (e.g. "variant names").
        table: &'static str,
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        reason: String,
    },

    /// Input data contains NaN, infinite, or out-of-range values.
    InvalidNumericValue(String),

    /// Daily series dates are not strictly increasing.
    UnsortedDates {
        /// Index of the first offending row.
        index: usize,
    },

    /// Fewer analysis weeks qualified than the pipeline requires.
    InsufficientWeeks {
        /// Number of qualifying weeks found.
        got: usize,
        /// Number of weeks required.
        min: usize,
    },

    /// A series is shorter than an operation requires.
    TooFewObservations {
        /// Number of observations provided.
        got: usize,
        /// Minimum required observations.
        min: usize,
    },

    /// Regression for a lineage has too few finite log-odds points.
    TooFewPoints {
        /// Lineage whose regression failed.
        label: String,
        /// Number of usable points.
        got: usize,
        /// Minimum required points.
        min: usize,
    },

    /// A linear system in a solver step could not be solved.
    SingularSystem(&'static str),

    /// A nonlinear or iterative fit failed to converge.
    FitFailed {
        /// Iterations performed before giving up.
        iterations: usize,
        /// Why the fit stopped.
        reason: String,
    },

    /// A configuration parameter is outside its valid range.
    InvalidParameter {
        /// Name of the parameter.
        parameter: &'static str,
        /// Description of the accepted range.
        expected: &'static str,
    },

    /// Parameter was set multiple times in the builder.
    DuplicateParameter {
        /// Name of the parameter that was set multiple times.
        parameter: &'static str,
    },
}

impl EstimationError {
    /// Whether this error came from a numerical fit rather than from input shape.
    pub fn is_fit_failure(&self) -> bool {
        matches!(
            self,
            Self::TooFewPoints { .. } | Self::SingularSystem(_) | Self::FitFailed { .. }
        )
    }
}

// ============================================================================
// Display Implementation
// ============================================================================

impl Display for EstimationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Self::EmptyInput => write!(f, "Input is empty"),
            Self::MissingColumn(column) => write!(f, "Missing required column: {column}"),
            Self::InvalidRecord { row, reason } => {
                write!(f, "Invalid record at row {row}: {reason}")
            }
            Self::MalformedReference {
                table,
                line,
                reason,
            } => {
                write!(f, "Malformed {table} table at line {line}: {reason}")
            }
            Self::InvalidNumericValue(s) => write!(f, "Invalid numeric value: {s}"),
            Self::UnsortedDates { index } => {
                write!(f, "Dates must be strictly increasing (violated at index {index})")
            }
            Self::InsufficientWeeks { got, min } => {
                write!(
                    f,
                    "Insufficient analysis weeks: got {got}, need at least {min}"
                )
            }
            Self::TooFewObservations { got, min } => {
                write!(f, "Too few observations: got {got}, need at least {min}")
            }
            Self::TooFewPoints { label, got, min } => {
                write!(
                    f,
                    "Too few finite log-odds points for '{label}': got {got}, need at least {min}"
                )
            }
            Self::SingularSystem(context) => write!(f, "Singular linear system in {context}"),
            Self::FitFailed { iterations, reason } => {
                write!(f, "Fit failed after {iterations} iterations: {reason}")
            }
            Self::InvalidParameter {
                parameter,
                expected,
            } => {
                write!(f, "Invalid {parameter}: must be {expected}")
            }
            Self::DuplicateParameter { parameter } => {
                write!(
                    f,
                    "Parameter '{parameter}' was set multiple times. Each parameter can only be configured once."
                )
            }
        }
    }
}

// ============================================================================
// Standard Error Trait
// ============================================================================

impl Error for EstimationError {}
