//! Input validation for pipeline configuration and data.
//!
//! ## Purpose
//!
//! This module checks configuration parameters and input data before either
//! pipeline runs: non-empty record sets, strictly increasing daily series,
//! finite proportions and parameter bounds.
//!
//! ## Design notes
//!
//! * **Fail-Fast**: Validation stops at the first error encountered.
//! * **Efficiency**: Checks are ordered from cheap to expensive.
//!
//! ## Invariants
//!
//! * All validated inputs satisfy their respective mathematical constraints.
//! * Validation logic is deterministic and side-effect free.
//!
//! ## Non-goals
//!
//! * This module does not sort, transform, or filter input data.
//! * This module does not provide automatic correction of invalid inputs.

// Internal dependencies
use crate::evaluation::takeover::N_TERMS;
use crate::math::logistic::N_PARAMS;
use crate::primitives::errors::EstimationError;
use crate::primitives::records::{DailyProportion, SequenceRecord};

/// Smallest analysis window the growth pipeline accepts.
pub const MIN_REQUIRED_WEEKS: usize = 2;

// ============================================================================
// Validator
// ============================================================================

/// Validation utility for pipeline configuration and input data.
///
/// All methods return `Result<(), EstimationError>` and fail fast upon
/// identifying the first violation.
pub struct Validator;

impl Validator {
    // ========================================================================
    // Core Input Validation
    // ========================================================================

    /// Validate a sequence record set.
    pub fn validate_records(records: &[SequenceRecord]) -> Result<(), EstimationError> {
        if records.is_empty() {
            return Err(EstimationError::EmptyInput);
        }
        if let Some(row) = records.iter().position(|r| r.lineage.trim().is_empty()) {
            return Err(EstimationError::InvalidRecord {
                row: row + 1,
                reason: "empty lineage label".into(),
            });
        }
        Ok(())
    }

    /// Validate a daily proportion series.
    ///
    /// Dates must be strictly increasing and every proportion must be a
    /// finite value in [0, 1].
    pub fn validate_daily_series(
        series: &[DailyProportion],
        min_len: usize,
    ) -> Result<(), EstimationError> {
        if series.is_empty() {
            return Err(EstimationError::EmptyInput);
        }
        if series.len() < min_len {
            return Err(EstimationError::TooFewObservations {
                got: series.len(),
                min: min_len,
            });
        }

        if let Some(i) = series.windows(2).position(|w| w[1].date <= w[0].date) {
            return Err(EstimationError::UnsortedDates { index: i + 1 });
        }

        for (i, day) in series.iter().enumerate() {
            match day.proportion() {
                Some(p) if (0.0..=1.0).contains(&p) => {}
                _ => {
                    return Err(EstimationError::InvalidNumericValue(format!(
                        "{}/{} on {} (row {})",
                        day.numerator, day.denominator, day.date, i
                    )))
                }
            }
        }

        Ok(())
    }

    // ========================================================================
    // Parameter Validation
    // ========================================================================

    /// Validate the number of trailing weeks and how many of them are required.
    pub fn validate_window(window_weeks: usize, required_weeks: usize) -> Result<(), EstimationError> {
        if window_weeks < MIN_REQUIRED_WEEKS {
            return Err(EstimationError::InvalidParameter {
                parameter: "window_weeks",
                expected: "at least 2",
            });
        }
        if required_weeks < MIN_REQUIRED_WEEKS || required_weeks > window_weeks {
            return Err(EstimationError::InvalidParameter {
                parameter: "required_weeks",
                expected: "between 2 and window_weeks",
            });
        }
        Ok(())
    }

    /// Validate an iteration or round budget.
    pub fn validate_budget(value: usize, parameter: &'static str) -> Result<(), EstimationError> {
        const MAX_BUDGET: usize = 100_000;
        if value == 0 || value > MAX_BUDGET {
            return Err(EstimationError::InvalidParameter {
                parameter,
                expected: "between 1 and 100000",
            });
        }
        Ok(())
    }

    /// Validate a strictly positive finite value.
    pub fn validate_positive(value: f64, parameter: &'static str) -> Result<(), EstimationError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(EstimationError::InvalidParameter {
                parameter,
                expected: "a finite value > 0",
            });
        }
        Ok(())
    }

    /// Validate the initial guess of the mixture fit.
    pub fn validate_initial_guess(guess: &[f64; N_PARAMS]) -> Result<(), EstimationError> {
        for pair in guess.chunks(2) {
            let (x0, r) = (pair[0], pair[1]);
            if !x0.is_finite() || x0 <= 0.0 || x0 >= 1.0 {
                return Err(EstimationError::InvalidParameter {
                    parameter: "initial_guess",
                    expected: "initial fractions in (0, 1)",
                });
            }
            if !r.is_finite() || r < 0.0 {
                return Err(EstimationError::InvalidParameter {
                    parameter: "initial_guess",
                    expected: "non-negative finite rates",
                });
            }
        }
        Ok(())
    }

    /// Validate perturbation multipliers.
    pub fn validate_multipliers(multipliers: &[f64; N_PARAMS]) -> Result<(), EstimationError> {
        if multipliers.iter().any(|m| !m.is_finite()) {
            return Err(EstimationError::InvalidParameter {
                parameter: "perturbation",
                expected: "finite multipliers",
            });
        }
        Ok(())
    }

    /// Validate the 1-based mixture term whose rate is reported.
    pub fn validate_growth_term(term: usize) -> Result<(), EstimationError> {
        if !(1..=N_TERMS).contains(&term) {
            return Err(EstimationError::InvalidParameter {
                parameter: "growth_term",
                expected: "a term number in 1..=3",
            });
        }
        Ok(())
    }

    /// Validate that no parameters were set multiple times in the builder.
    pub fn validate_no_duplicates(
        duplicate_param: Option<&'static str>,
    ) -> Result<(), EstimationError> {
        if let Some(param) = duplicate_param {
            return Err(EstimationError::DuplicateParameter { parameter: param });
        }
        Ok(())
    }
}
