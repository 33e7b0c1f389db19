//! Regression Logic
//!
//! ## Purpose
//!
//! This module turns a lineage's weekly proportion series into a single
//! growth rate: the slope of an ordinary least-squares line through the
//! log-odds of the proportions against the week's day number.
//!
//! ## Design notes
//!
//! * **Log-odds scale**: a lineage growing logistically has linear log-odds,
//!   so the slope is its relative growth rate per day.
//! * **Finite points only**: weeks where the proportion is exactly 0 or 1 are
//!   dropped before fitting.
//! * **Generic**: `LinearFit` works for any `Float`.

// External dependencies
use num_traits::Float;

// Internal dependencies
use crate::math::logit::finite_logits;
use crate::primitives::errors::EstimationError;

/// Minimum number of finite log-odds points needed for a slope.
pub const MIN_REGRESSION_POINTS: usize = 2;

// ============================================================================
// LinearFit
// ============================================================================

/// Linear regression fit result (slope and intercept).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit<T: Float> {
    /// Slope (beta_1)
    pub slope: T,

    /// Intercept (beta_0)
    pub intercept: T,

    /// Mean of x-values
    pub x_mean: T,

    /// Mean of y-values
    pub y_mean: T,
}

impl<T: Float> LinearFit<T> {
    /// Create a zero-initialized fit.
    pub fn zero() -> Self {
        Self {
            slope: T::zero(),
            intercept: T::zero(),
            x_mean: T::zero(),
            y_mean: T::zero(),
        }
    }

    /// Predict y-value for a given x using the model.
    #[inline]
    pub fn predict(&self, x: T) -> T {
        self.intercept + self.slope * x
    }

    /// Fit Ordinary Least Squares (OLS) regression.
    ///
    /// A degenerate x-range yields a zero slope through the y mean.
    pub fn fit_ols(x: &[T], y: &[T]) -> Self {
        let n = x.len();
        if n == 0 {
            return Self::zero();
        }

        let n_t = T::from(n).unwrap_or(T::one());

        let (sum_x, sum_y) = x
            .iter()
            .zip(y)
            .fold((T::zero(), T::zero()), |(sx, sy), (&xi, &yi)| (sx + xi, sy + yi));

        let x_mean = sum_x / n_t;
        let y_mean = sum_y / n_t;

        let mut variance = T::zero();
        let mut covariance = T::zero();
        for (&xi, &yi) in x.iter().zip(y) {
            let dx = xi - x_mean;
            variance = variance + dx * dx;
            covariance = covariance + dx * (yi - y_mean);
        }

        let tol = T::epsilon() * (T::one() + x_mean.abs()) * (T::one() + x_mean.abs());
        if variance <= tol {
            return Self {
                slope: T::zero(),
                intercept: y_mean,
                x_mean,
                y_mean,
            };
        }

        let slope = covariance / variance;
        let intercept = y_mean - slope * x_mean;

        Self {
            slope,
            intercept,
            x_mean,
            y_mean,
        }
    }

    /// Residuals `y - predict(x)`.
    pub fn residuals(&self, x: &[T], y: &[T]) -> Vec<T> {
        x.iter().zip(y).map(|(&xi, &yi)| yi - self.predict(xi)).collect()
    }
}

// ============================================================================
// Growth Rate
// ============================================================================

/// Fit the log-odds line for one lineage.
///
/// `x` holds day numbers and `p` the matching proportions. Points whose
/// log-odds are not finite are skipped; fewer than two usable points is an
/// error naming `label`.
pub fn logit_fit<T: Float>(label: &str, x: &[T], p: &[T]) -> Result<LinearFit<T>, EstimationError> {
    let (xs, ys) = finite_logits(x, p);
    if xs.len() < MIN_REGRESSION_POINTS {
        return Err(EstimationError::TooFewPoints {
            label: label.to_string(),
            got: xs.len(),
            min: MIN_REGRESSION_POINTS,
        });
    }
    Ok(LinearFit::fit_ols(&xs, &ys))
}

/// Relative growth rate per day of one lineage.
pub fn growth_rate<T: Float>(label: &str, x: &[T], p: &[T]) -> Result<T, EstimationError> {
    logit_fit(label, x, p).map(|fit| fit.slope)
}
