//! Savitzky–Golay smoothing.
//!
//! ## Purpose
//!
//! Denoises a uniformly spaced series by fitting a low-order polynomial to
//! each window of neighbouring points and evaluating it at the window centre.
//! Near the ends, where a centred window does not fit, the polynomial fitted
//! to the first (last) full window is evaluated at the edge positions instead
//! of padding the series.
//!
//! ## Invariants
//!
//! * Output has the same length as the input.
//! * Any polynomial of degree ≤ `polyorder` is reproduced exactly.
//!
//! ## Non-goals
//!
//! * Derivative estimation and non-uniform spacing are not supported.

// External dependencies
use ndarray::Array2;

// Internal dependencies
use crate::math::linalg::solve;
use crate::primitives::errors::EstimationError;

/// Window length used for the takeover fit target.
pub const TAKEOVER_WINDOW: usize = 5;

/// Polynomial order used for the takeover fit target.
pub const TAKEOVER_POLYORDER: usize = 2;

/// Savitzky–Golay filter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavitzkyGolay {
    window: usize,
    polyorder: usize,
}

impl SavitzkyGolay {
    /// Create a filter. `window` must be odd and greater than `polyorder`.
    pub fn new(window: usize, polyorder: usize) -> Result<Self, EstimationError> {
        if window % 2 == 0 || window == 0 {
            return Err(EstimationError::InvalidParameter {
                parameter: "window",
                expected: "a positive odd number",
            });
        }
        if polyorder >= window {
            return Err(EstimationError::InvalidParameter {
                parameter: "polyorder",
                expected: "less than the window length",
            });
        }
        Ok(Self { window, polyorder })
    }

    /// Window length.
    pub fn window(&self) -> usize {
        self.window
    }

    /// Polynomial order.
    pub fn polyorder(&self) -> usize {
        self.polyorder
    }

    /// Weights that, applied to one window of samples, give the fitted
    /// polynomial's value at `offset` (relative to the window centre).
    pub fn weights_at(&self, offset: f64) -> Result<Vec<f64>, EstimationError> {
        let half = (self.window / 2) as f64;
        let terms = self.polyorder + 1;

        // Normal matrix XᵀX for the Vandermonde design over positions -half..=half
        let positions: Vec<f64> = (0..self.window).map(|i| i as f64 - half).collect();
        let mut normal = Array2::<f64>::zeros((terms, terms));
        for &x in &positions {
            for r in 0..terms {
                for c in 0..terms {
                    normal[[r, c]] += x.powi((r + c) as i32);
                }
            }
        }

        // Solve (XᵀX) a = v(offset); weights are X a
        let target: Vec<f64> = (0..terms).map(|k| offset.powi(k as i32)).collect();
        let coeffs = solve(&normal, &target).ok_or(EstimationError::SingularSystem(
            "Savitzky-Golay normal equations",
        ))?;

        Ok(positions
            .iter()
            .map(|&x| {
                coeffs
                    .iter()
                    .enumerate()
                    .fold(0.0, |acc, (k, &a)| acc + a * x.powi(k as i32))
            })
            .collect())
    }

    /// Smooth `y`.
    pub fn apply(&self, y: &[f64]) -> Result<Vec<f64>, EstimationError> {
        let n = y.len();
        if n < self.window {
            return Err(EstimationError::TooFewObservations {
                got: n,
                min: self.window,
            });
        }

        let half = self.window / 2;
        let centre = self.weights_at(0.0)?;
        let mut out = vec![0.0; n];

        for i in half..n - half {
            let window = &y[i - half..=i + half];
            out[i] = dot(&centre, window);
        }

        // Edges: evaluate the first/last window's polynomial off-centre
        let head = &y[..self.window];
        let tail = &y[n - self.window..];
        for i in 0..half {
            let w = self.weights_at(i as f64 - half as f64)?;
            out[i] = dot(&w, head);

            let j = n - half + i;
            let w = self.weights_at((i + 1) as f64)?;
            out[j] = dot(&w, tail);
        }

        Ok(out)
    }
}

impl Default for SavitzkyGolay {
    fn default() -> Self {
        Self {
            window: TAKEOVER_WINDOW,
            polyorder: TAKEOVER_POLYORDER,
        }
    }
}

#[inline]
fn dot(w: &[f64], y: &[f64]) -> f64 {
    w.iter().zip(y).fold(0.0, |acc, (a, b)| acc + a * b)
}
