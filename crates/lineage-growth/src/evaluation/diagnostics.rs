//! Diagnostic metrics for curve-fit quality assessment.
//!
//! ## Purpose
//!
//! This module summarizes how closely a fitted curve tracks its target
//! series. The takeover report carries these next to its estimates so a
//! poor fit is visible before anyone reads the crossing dates.
//!
//! ## Design notes
//!
//! * **Residual-based**: Metrics are computed from residuals (y - ŷ).
//! * **Generics**: All computations are generic over `Float` types.
//!
//! ## Invariants
//!
//! * RMSE and MAE are non-negative.
//! * R^2 <= 1 (R^2 = 1 is a perfect fit).
//!
//! ## Non-goals
//!
//! * This module does not perform the fitting.
//! * This module does not provide p-values or formal hypothesis tests.

// External dependencies
use core::fmt::{Display, Formatter, Result};
use num_traits::Float;

// ============================================================================
// Diagnostics Structure
// ============================================================================

/// Diagnostic metrics for a fitted curve.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostics<T> {
    /// Root Mean Squared Error (RMSE).
    pub rmse: T,

    /// Mean Absolute Error (MAE).
    pub mae: T,

    /// Coefficient of determination (R^2).
    pub r_squared: T,

    /// Solver iterations.
    pub iterations: usize,
}

impl<T: Float> Diagnostics<T> {
    /// Compute diagnostic statistics from observed and fitted values.
    pub fn compute(y: &[T], y_fit: &[T], iterations: usize) -> Self {
        Diagnostics {
            rmse: Self::calculate_rmse(y, y_fit),
            mae: Self::calculate_mae(y, y_fit),
            r_squared: Self::calculate_r_squared(y, y_fit),
            iterations,
        }
    }

    // ========================================================================
    // Error Metrics
    // ========================================================================

    /// Compute the root mean squared error (RMSE).
    /// RMSE = sqrt((1/n) * sum (y_i - y_hat_i)^2).
    pub fn calculate_rmse(y: &[T], y_fit: &[T]) -> T {
        if y.is_empty() {
            return T::zero();
        }
        let n_t = T::from(y.len()).unwrap_or(T::one());
        let rss = y
            .iter()
            .zip(y_fit.iter())
            .fold(T::zero(), |acc, (&yi, &yf)| {
                let r = yi - yf;
                acc + r * r
            });

        (rss / n_t).sqrt()
    }

    /// Compute the mean absolute error (MAE).
    /// MAE = (1/n) * sum |y_i - y_hat_i|.
    pub fn calculate_mae(y: &[T], y_fit: &[T]) -> T {
        if y.is_empty() {
            return T::zero();
        }
        let n_t = T::from(y.len()).unwrap_or(T::one());
        let sum = y
            .iter()
            .zip(y_fit.iter())
            .fold(T::zero(), |acc, (&yi, &yf)| acc + (yi - yf).abs());

        sum / n_t
    }

    // ========================================================================
    // Goodness-of-Fit Metrics
    // ========================================================================

    /// Compute the coefficient of determination (R^2).
    /// R^2 = 1 - SS_res / SS_tot.
    pub fn calculate_r_squared(y: &[T], y_fit: &[T]) -> T {
        let n = y.len();
        if n <= 1 {
            return T::one();
        }

        let n_t = T::from(n).unwrap_or(T::one());
        let mean = y.iter().copied().fold(T::zero(), |acc, v| acc + v) / n_t;

        let (ss_tot, ss_res) =
            y.iter()
                .zip(y_fit.iter())
                .fold((T::zero(), T::zero()), |(tot, res), (&yi, &yf)| {
                    let deviation = yi - mean;
                    let residual = yi - yf;
                    (tot + deviation * deviation, res + residual * residual)
                });

        if ss_tot == T::zero() {
            // All y values are identical
            if ss_res == T::zero() {
                T::one()
            } else {
                T::zero()
            }
        } else {
            T::one() - ss_res / ss_tot
        }
    }
}

// ============================================================================
// Display Implementation
// ============================================================================

impl<T: Float + Display> Display for Diagnostics<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        writeln!(f, "Fit Diagnostics:")?;
        writeln!(f, "  RMSE:         {:.6}", self.rmse)?;
        writeln!(f, "  MAE:          {:.6}", self.mae)?;
        writeln!(f, "  R²:           {:.6}", self.r_squared)?;
        writeln!(f, "  Iterations:   {}", self.iterations)
    }
}
