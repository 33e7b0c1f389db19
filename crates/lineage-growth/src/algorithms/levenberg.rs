//! Bounded nonlinear least squares.
//!
//! ## Purpose
//!
//! This module fits a parametric curve `f(t; θ)` to observations `(tᵢ, yᵢ)` by
//! minimizing `Σ (yᵢ − f(tᵢ; θ))²` with a projected Levenberg–Marquardt
//! iteration, then estimates the parameter covariance from the Jacobian at
//! the solution.
//!
//! ## Design notes
//!
//! * **Marquardt scaling**: the damping term is `λ · diag(JᵀJ)`, so each
//!   parameter is damped relative to its own curvature.
//! * **Projection**: every trial point is clamped to the model's lower bounds
//!   before it is evaluated.
//! * **Acceptance**: a step is taken only if it lowers the residual sum of
//!   squares; otherwise `λ` grows tenfold and the step is recomputed.
//! * **Stall**: if `λ` exceeds `MAX_DAMPING` no descent direction remains and
//!   the current point is returned as the solution.
//! * **Stopping** follows MINPACK `lmder`: the fit has converged once both the
//!   actual and the linearly predicted relative RSS reductions of a trial
//!   step are below `ftol`, even if that step was rejected.
//!
//! ## Key concepts
//!
//! * **ftol**: relative RSS reduction (actual and predicted) below which the
//!   fit has converged.
//! * **xtol**: relative step length below which the fit has converged.
//! * **gtol**: largest cosine between a Jacobian column and the residual
//!   vector below which the fit has converged.
//! * **RSS floor**: residuals this small are an exact fit.
//!
//! ## Invariants
//!
//! * Returned parameters satisfy the lower bounds.
//! * The covariance matrix is symmetric with a non-negative diagonal.

// External dependencies
use ndarray::Array2;
use tracing::{debug, warn};

// Internal dependencies
use crate::math::linalg::{pseudo_inverse_symmetric, solve};
use crate::math::logistic::{mixture, mixture_gradient, N_PARAMS};
use crate::primitives::errors::EstimationError;

/// Default iteration budget.
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

/// Default tolerance, `√ε` as in MINPACK and `scipy.optimize.curve_fit`.
pub const DEFAULT_TOLERANCE: f64 = 1.49012e-8;

/// Default relative RSS-reduction tolerance.
pub const DEFAULT_FTOL: f64 = DEFAULT_TOLERANCE;

/// Default relative step tolerance.
pub const DEFAULT_XTOL: f64 = DEFAULT_TOLERANCE;

/// Default gradient tolerance.
pub const DEFAULT_GTOL: f64 = DEFAULT_TOLERANCE;

/// Residual sum of squares treated as an exact fit.
pub const RSS_FLOOR: f64 = 1e-28;

/// Smallest initial fraction allowed for a logistic term.
pub const MIN_INITIAL_FRACTION: f64 = 1e-12;

const INITIAL_DAMPING: f64 = 1e-3;
const MAX_DAMPING: f64 = 1e16;

// ============================================================================
// Curve Model
// ============================================================================

/// A differentiable parametric curve with lower bounds on its parameters.
pub trait CurveModel {
    /// Number of parameters.
    fn n_params(&self) -> usize;

    /// Curve value at `t`.
    fn value(&self, t: f64, params: &[f64]) -> f64;

    /// Partial derivatives of the curve at `t`, written into `out`.
    fn gradient(&self, t: f64, params: &[f64], out: &mut [f64]);

    /// Lower bound for each parameter.
    fn lower_bounds(&self) -> Vec<f64>;
}

/// The three-wave logistic mixture `L₁ − L₂ + L₃`.
///
/// Rates are bounded below by zero and initial fractions by
/// [`MIN_INITIAL_FRACTION`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogisticMixture;

impl LogisticMixture {
    fn as_array(params: &[f64]) -> [f64; N_PARAMS] {
        let mut p = [0.0; N_PARAMS];
        p.copy_from_slice(&params[..N_PARAMS]);
        p
    }
}

impl CurveModel for LogisticMixture {
    fn n_params(&self) -> usize {
        N_PARAMS
    }

    fn value(&self, t: f64, params: &[f64]) -> f64 {
        mixture(t, &Self::as_array(params))
    }

    fn gradient(&self, t: f64, params: &[f64], out: &mut [f64]) {
        out.copy_from_slice(&mixture_gradient(t, &Self::as_array(params)));
    }

    fn lower_bounds(&self) -> Vec<f64> {
        (0..N_PARAMS)
            .map(|i| if i % 2 == 0 { MIN_INITIAL_FRACTION } else { 0.0 })
            .collect()
    }
}

// ============================================================================
// Solver Configuration
// ============================================================================

/// Stopping criteria for the Levenberg–Marquardt iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevenbergMarquardt {
    /// Iteration budget; exhausting it is a fit failure.
    pub max_iterations: usize,

    /// Relative RSS-reduction tolerance.
    pub ftol: f64,

    /// Relative step tolerance.
    pub xtol: f64,

    /// Gradient tolerance.
    pub gtol: f64,
}

impl Default for LevenbergMarquardt {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            ftol: DEFAULT_FTOL,
            xtol: DEFAULT_XTOL,
            gtol: DEFAULT_GTOL,
        }
    }
}

/// Why the iteration stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// RSS fell to [`RSS_FLOOR`].
    ExactFit,
    /// Actual and predicted RSS reductions fell below `ftol`.
    ResidualTolerance,
    /// Step length fell below `xtol`.
    StepTolerance,
    /// Gradient fell below `gtol`.
    GradientTolerance,
    /// Damping grew past its limit without finding a descent step.
    Stalled,
}

/// Result of a curve fit.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveFit {
    /// Fitted parameters.
    pub params: Vec<f64>,

    /// Parameter covariance, `pinv(JᵀJ) · RSS / (n − p)`.
    pub covariance: Array2<f64>,

    /// Square roots of the covariance diagonal.
    pub std_errors: Vec<f64>,

    /// Residual sum of squares at the solution.
    pub rss: f64,

    /// Iterations performed.
    pub iterations: usize,

    /// Stopping reason.
    pub termination: Termination,

    /// Numerical rank of `JᵀJ` at the solution.
    pub rank: usize,
}

// ============================================================================
// Solver
// ============================================================================

/// Outcome of the damping search within one iteration.
enum Trial {
    /// A step lowered the RSS.
    Accepted {
        candidate: Vec<f64>,
        candidate_rss: f64,
        step_norm: f64,
        converged: bool,
    },
    /// No step lowered the RSS, but the model predicts no further reduction.
    Converged,
    /// Damping grew past its limit.
    Exhausted,
}

impl LevenbergMarquardt {
    /// Fit `model` to `(t, y)` starting from `initial`.
    pub fn fit<M: CurveModel>(
        &self,
        model: &M,
        t: &[f64],
        y: &[f64],
        initial: &[f64],
    ) -> Result<CurveFit, EstimationError> {
        let n = t.len();
        let p = model.n_params();
        debug_assert_eq!(initial.len(), p);

        if n <= p {
            return Err(EstimationError::TooFewObservations { got: n, min: p + 1 });
        }

        let lower = model.lower_bounds();
        let mut params = project(initial, &lower);
        let mut rss = residual_sum_of_squares(model, t, y, &params);
        if !rss.is_finite() {
            return Err(EstimationError::FitFailed {
                iterations: 0,
                reason: "non-finite residuals at the initial guess".into(),
            });
        }

        let mut lambda = INITIAL_DAMPING;
        let mut iterations = 0;
        let termination = loop {
            if rss <= RSS_FLOOR {
                break Termination::ExactFit;
            }
            if iterations >= self.max_iterations {
                return Err(EstimationError::FitFailed {
                    iterations,
                    reason: format!("no convergence (rss = {:.3e})", rss),
                });
            }
            iterations += 1;

            let jacobian = jacobian(model, t, &params);
            let residuals = residuals(model, t, y, &params);
            let (jtj, jtr) = normal_equations(&jacobian, &residuals);

            if gradient_converged(&jtj, &jtr, rss, self.gtol) {
                break Termination::GradientTolerance;
            }

            let diag_floor = (0..p).fold(0.0_f64, |acc, i| acc.max(jtj[[i, i]])) * 1e-12;
            let mut trial = Trial::Exhausted;
            while lambda <= MAX_DAMPING {
                let mut damped = jtj.clone();
                for i in 0..p {
                    damped[[i, i]] += lambda * jtj[[i, i]].max(diag_floor).max(f64::MIN_POSITIVE);
                }

                let Some(delta) = solve(&damped, &jtr) else {
                    lambda *= 10.0;
                    continue;
                };

                let candidate: Vec<f64> = params.iter().zip(&delta).map(|(a, d)| a + d).collect();
                let candidate = project(&candidate, &lower);
                let step: Vec<f64> = candidate.iter().zip(&params).map(|(a, b)| a - b).collect();
                let candidate_rss = residual_sum_of_squares(model, t, y, &candidate);

                let actual = if candidate_rss.is_finite() {
                    (rss - candidate_rss) / rss
                } else {
                    -1.0
                };
                let predicted = predicted_reduction(&jtj, &jtr, &step) / rss;
                let converged = reduction_converged(actual, predicted, self.ftol);

                if candidate_rss.is_finite() && candidate_rss < rss {
                    lambda = (lambda / 10.0).max(f64::MIN_POSITIVE);
                    trial = Trial::Accepted {
                        candidate,
                        candidate_rss,
                        step_norm: norm(step.iter().copied()),
                        converged,
                    };
                    break;
                }
                if converged {
                    trial = Trial::Converged;
                    break;
                }
                lambda *= 10.0;
            }

            match trial {
                Trial::Exhausted => break Termination::Stalled,
                Trial::Converged => break Termination::ResidualTolerance,
                Trial::Accepted {
                    candidate,
                    candidate_rss,
                    step_norm,
                    converged,
                } => {
                    let param_norm = norm(params.iter().copied());
                    params = candidate;
                    rss = candidate_rss;

                    if converged {
                        break Termination::ResidualTolerance;
                    }
                    if step_norm <= self.xtol * param_norm {
                        break Termination::StepTolerance;
                    }
                }
            }
        };

        debug!(iterations, rss, ?termination, "curve fit finished");

        let jacobian = jacobian(model, t, &params);
        let (jtj, _) = normal_equations(&jacobian, &vec![0.0; n]);
        let (mut covariance, rank) = pseudo_inverse_symmetric(&jtj);
        if rank < p {
            warn!(rank, params = p, "parameter covariance is rank deficient");
        }

        let scale = rss / (n - p) as f64;
        covariance.mapv_inplace(|v| v * scale);
        symmetrize(&mut covariance);
        for i in 0..p {
            covariance[[i, i]] = covariance[[i, i]].max(0.0);
        }
        let std_errors = (0..p).map(|i| covariance[[i, i]].sqrt()).collect();

        Ok(CurveFit {
            params,
            covariance,
            std_errors,
            rss,
            iterations,
            termination,
            rank,
        })
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn project(params: &[f64], lower: &[f64]) -> Vec<f64> {
    params.iter().zip(lower).map(|(&v, &lo)| v.max(lo)).collect()
}

fn residuals<M: CurveModel>(model: &M, t: &[f64], y: &[f64], params: &[f64]) -> Vec<f64> {
    t.iter()
        .zip(y)
        .map(|(&ti, &yi)| yi - model.value(ti, params))
        .collect()
}

fn residual_sum_of_squares<M: CurveModel>(model: &M, t: &[f64], y: &[f64], params: &[f64]) -> f64 {
    residuals(model, t, y, params).iter().map(|r| r * r).sum()
}

fn jacobian<M: CurveModel>(model: &M, t: &[f64], params: &[f64]) -> Array2<f64> {
    let p = model.n_params();
    let mut jac = Array2::<f64>::zeros((t.len(), p));
    let mut row = vec![0.0; p];
    for (i, &ti) in t.iter().enumerate() {
        model.gradient(ti, params, &mut row);
        for (j, &g) in row.iter().enumerate() {
            jac[[i, j]] = g;
        }
    }
    jac
}

fn normal_equations(jacobian: &Array2<f64>, residuals: &[f64]) -> (Array2<f64>, Vec<f64>) {
    let jt = jacobian.t();
    let jtj = jt.dot(jacobian);
    let jtr = jacobian
        .columns()
        .into_iter()
        .map(|col| col.iter().zip(residuals).map(|(a, b)| a * b).sum())
        .collect();
    (jtj, jtr)
}

/// Reduction in RSS predicted by the linearized model for `step`.
fn predicted_reduction(jtj: &Array2<f64>, jtr: &[f64], step: &[f64]) -> f64 {
    let p = step.len();
    let mut linear = 0.0;
    let mut quadratic = 0.0;
    for i in 0..p {
        linear += step[i] * jtr[i];
        for j in 0..p {
            quadratic += step[i] * jtj[[i, j]] * step[j];
        }
    }
    2.0 * linear - quadratic
}

/// Both the actual and the predicted relative reductions are below `ftol`,
/// and the actual one is at most twice the predicted one.
fn reduction_converged(actual: f64, predicted: f64, ftol: f64) -> bool {
    let ratio = if predicted != 0.0 { actual / predicted } else { 0.0 };
    actual.abs() <= ftol && predicted <= ftol && 0.5 * ratio <= 1.0
}

fn gradient_converged(jtj: &Array2<f64>, jtr: &[f64], rss: f64, gtol: f64) -> bool {
    let r_norm = rss.sqrt();
    jtr.iter().enumerate().all(|(j, &g)| {
        let col_norm = jtj[[j, j]].sqrt();
        col_norm == 0.0 || (g / (col_norm * r_norm)).abs() <= gtol
    })
}

fn norm<I: Iterator<Item = f64>>(values: I) -> f64 {
    values.map(|v| v * v).sum::<f64>().sqrt()
}

fn symmetrize(m: &mut Array2<f64>) {
    let n = m.nrows();
    for i in 0..n {
        for j in i + 1..n {
            let avg = 0.5 * (m[[i, j]] + m[[j, i]]);
            m[[i, j]] = avg;
            m[[j, i]] = avg;
        }
    }
}
