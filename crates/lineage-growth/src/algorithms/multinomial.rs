//! Multinomial logistic proportion model.
//!
//! ## Purpose
//!
//! Weekly lineage counts are sparse: an emerging lineage may have zero
//! sequences in some weeks and a handful in others. Instead of smoothing raw
//! weekly fractions, this module fits a softmax regression of lineage
//! membership on the week number, which shares information across weeks and
//! always produces valid probability vectors.
//!
//! ## Design notes
//!
//! * **Grouped likelihood**: the only feature is the week, so observations are
//!   aggregated into a (week × lineage) count matrix.
//! * **Standardized feature**: week numbers are centred and scaled by their
//!   count-weighted mean and standard deviation before fitting.
//! * **Reference class**: the last class has zero coefficients; the others
//!   each carry an intercept and a slope.
//! * **Ridge on slopes**: an L2 penalty `λ/2 · Σ w²` with `λ = 1 / C` keeps
//!   slopes finite when a lineage is perfectly separated in time.
//! * **Newton–Raphson** with step halving on the penalized log-likelihood.
//!
//! ## Invariants
//!
//! * Predicted probabilities are in [0, 1] and sum to 1.
//! * Every class present in the count matrix gets a probability column.

// External dependencies
use chrono::NaiveDate;
use ndarray::Array2;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

// Internal dependencies
use crate::algorithms::collapse::CollapseMap;
use crate::math::linalg::solve;
use crate::primitives::dates::day_number;
use crate::primitives::errors::EstimationError;
use crate::primitives::records::SequenceRecord;
use crate::primitives::table::ProportionTable;

/// Default inverse regularization strength.
pub const DEFAULT_INVERSE_REGULARIZATION: f64 = 1.0;

/// Default Newton iteration budget.
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Default gradient tolerance.
pub const DEFAULT_TOLERANCE: f64 = 1e-8;

/// Maximum step halvings per Newton iteration.
const MAX_HALVINGS: usize = 40;

// ============================================================================
// Configuration
// ============================================================================

/// Solver settings for the multinomial model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MultinomialConfig {
    /// Inverse of the L2 penalty on slopes (larger means weaker penalty).
    pub inverse_regularization: f64,

    /// Newton iteration budget.
    pub max_iterations: usize,

    /// Convergence tolerance on the gradient (scaled by total count).
    pub tolerance: f64,
}

impl Default for MultinomialConfig {
    fn default() -> Self {
        Self {
            inverse_regularization: DEFAULT_INVERSE_REGULARIZATION,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

// ============================================================================
// Fitted Model
// ============================================================================

/// A fitted softmax regression on one scalar feature.
#[derive(Debug, Clone, PartialEq)]
pub struct MultinomialLogit {
    /// `(intercept, slope)` for each class; the last class is `(0, 0)`.
    pub coefficients: Vec<(f64, f64)>,

    /// Feature centre used for standardization.
    pub center: f64,

    /// Feature scale used for standardization.
    pub scale: f64,

    /// Newton iterations performed.
    pub iterations: usize,
}

impl MultinomialLogit {
    /// Fit the model to grouped counts.
    ///
    /// `x[t]` is the feature value of row `t` of `counts`; `counts[[t, k]]` is
    /// the number of observations of class `k` at `x[t]`.
    pub fn fit(
        x: &[f64],
        counts: &Array2<f64>,
        config: &MultinomialConfig,
    ) -> Result<Self, EstimationError> {
        let (n_rows, n_classes) = counts.dim();
        debug_assert_eq!(n_rows, x.len());

        let row_totals: Vec<f64> = counts.rows().into_iter().map(|r| r.sum()).collect();
        let total: f64 = row_totals.iter().sum();
        if n_classes == 0 || total <= 0.0 {
            return Err(EstimationError::EmptyInput);
        }

        let (center, scale) = weighted_moments(x, &row_totals, total);
        let z: Vec<f64> = x.iter().map(|&xi| (xi - center) / scale).collect();

        if n_classes == 1 {
            return Ok(Self {
                coefficients: vec![(0.0, 0.0)],
                center,
                scale,
                iterations: 0,
            });
        }

        let free = n_classes - 1;
        let lambda = 1.0 / config.inverse_regularization;
        let class_totals: Vec<f64> = counts.columns().into_iter().map(|c| c.sum()).collect();

        // Start from the marginal log-odds against the reference class
        let reference_total = class_totals[free] + 0.5;
        let mut theta = vec![0.0; 2 * free];
        for k in 0..free {
            theta[2 * k] = ((class_totals[k] + 0.5) / reference_total).ln();
        }

        let mut objective = penalized_log_likelihood(&theta, &z, counts, lambda);
        let tolerance = config.tolerance * total.max(1.0);

        for iteration in 0..config.max_iterations {
            let (gradient, hessian) = derivatives(&theta, &z, counts, &row_totals, lambda);

            let max_grad = gradient.iter().fold(0.0_f64, |acc, g| acc.max(g.abs()));
            if max_grad <= tolerance {
                debug!(iterations = iteration, objective, "multinomial fit converged");
                return Ok(Self::from_theta(&theta, center, scale, iteration));
            }

            let step =
                solve(&hessian, &gradient).ok_or(EstimationError::SingularSystem("multinomial Newton step"))?;

            // Step halving until the penalized likelihood does not decrease
            let mut factor = 1.0;
            let mut accepted = None;
            for _ in 0..MAX_HALVINGS {
                let candidate: Vec<f64> = theta
                    .iter()
                    .zip(&step)
                    .map(|(t, s)| t + factor * s)
                    .collect();
                let value = penalized_log_likelihood(&candidate, &z, counts, lambda);
                if value.is_finite() && value >= objective - 1e-12 * objective.abs() {
                    accepted = Some((candidate, value));
                    break;
                }
                factor *= 0.5;
            }

            let Some((candidate, value)) = accepted else {
                return Err(EstimationError::FitFailed {
                    iterations: iteration + 1,
                    reason: "line search could not improve the multinomial likelihood".into(),
                });
            };

            let improvement = value - objective;
            theta = candidate;
            objective = value;

            if improvement.abs() <= 1e-12 * (objective.abs() + 1.0) {
                debug!(iterations = iteration + 1, objective, "multinomial fit converged");
                return Ok(Self::from_theta(&theta, center, scale, iteration + 1));
            }
        }

        Err(EstimationError::FitFailed {
            iterations: config.max_iterations,
            reason: "multinomial Newton iterations exhausted".into(),
        })
    }

    fn from_theta(theta: &[f64], center: f64, scale: f64, iterations: usize) -> Self {
        let mut coefficients: Vec<(f64, f64)> =
            theta.chunks(2).map(|c| (c[0], c[1])).collect();
        coefficients.push((0.0, 0.0));
        Self {
            coefficients,
            center,
            scale,
            iterations,
        }
    }

    /// Number of classes.
    pub fn n_classes(&self) -> usize {
        self.coefficients.len()
    }

    /// Class probabilities at feature value `x`.
    pub fn predict_proba(&self, x: f64) -> Vec<f64> {
        let z = (x - self.center) / self.scale;
        let eta: Vec<f64> = self.coefficients.iter().map(|&(b, w)| b + w * z).collect();
        softmax(&eta)
    }

    /// Class probabilities at each feature value, one row per value.
    pub fn predict_proba_many(&self, x: &[f64]) -> Array2<f64> {
        let mut out = Array2::<f64>::zeros((x.len(), self.n_classes()));
        for (t, &xi) in x.iter().enumerate() {
            for (k, p) in self.predict_proba(xi).into_iter().enumerate() {
                out[[t, k]] = p;
            }
        }
        out
    }
}

// ============================================================================
// Weekly Proportions
// ============================================================================

/// Grouped (week × collapsed label) counts over the analysis window.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyCounts {
    /// Window weeks, ascending.
    pub weeks: Vec<NaiveDate>,

    /// Collapsed labels present in the window, ascending.
    pub labels: Vec<String>,

    /// Counts, shape `(weeks.len(), labels.len())`.
    pub counts: Array2<f64>,
}

impl WeeklyCounts {
    /// Tally window records by epiweek and collapsed label.
    pub fn tally<'a, I>(records: I, window: &[NaiveDate], map: &CollapseMap) -> Self
    where
        I: IntoIterator<Item = &'a SequenceRecord>,
    {
        let week_index: BTreeMap<NaiveDate, usize> =
            window.iter().enumerate().map(|(i, &w)| (w, i)).collect();

        let in_window: Vec<(usize, &str)> = records
            .into_iter()
            .filter_map(|r| {
                week_index
                    .get(&r.epiweek)
                    .map(|&i| (i, map.resolve(&r.lineage)))
            })
            .collect();

        let labels: Vec<String> = in_window
            .iter()
            .map(|&(_, label)| label)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();
        let label_index: BTreeMap<&str, usize> = labels
            .iter()
            .enumerate()
            .map(|(j, l)| (l.as_str(), j))
            .collect();

        let mut counts = Array2::<f64>::zeros((window.len(), labels.len()));
        for (i, label) in in_window {
            counts[[i, label_index[label]]] += 1.0;
        }

        Self {
            weeks: window.to_vec(),
            labels,
            counts,
        }
    }

    /// Total records per label over the whole window.
    pub fn label_totals(&self) -> BTreeMap<String, usize> {
        self.labels
            .iter()
            .zip(self.counts.columns())
            .map(|(label, column)| (label.clone(), column.sum() as usize))
            .collect()
    }
}

/// Fit the multinomial model to the window and tabulate proportions per week.
pub fn estimate_proportions<'a, I>(
    records: I,
    window: &[NaiveDate],
    map: &CollapseMap,
    config: &MultinomialConfig,
) -> Result<(ProportionTable, MultinomialLogit), EstimationError>
where
    I: IntoIterator<Item = &'a SequenceRecord>,
{
    let grouped = WeeklyCounts::tally(records, window, map);
    if grouped.labels.is_empty() {
        return Err(EstimationError::EmptyInput);
    }

    let x: Vec<f64> = grouped.weeks.iter().map(|&w| day_number(w)).collect();
    let model = MultinomialLogit::fit(&x, &grouped.counts, config)?;
    let values = model.predict_proba_many(&x);

    Ok((
        ProportionTable::new(grouped.weeks, grouped.labels, values),
        model,
    ))
}

// ============================================================================
// Likelihood and Derivatives
// ============================================================================

/// Numerically stable softmax.
pub fn softmax(eta: &[f64]) -> Vec<f64> {
    let max = eta.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = eta.iter().map(|&e| (e - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

fn class_probabilities(theta: &[f64], z: f64) -> Vec<f64> {
    let mut eta: Vec<f64> = theta.chunks(2).map(|c| c[0] + c[1] * z).collect();
    eta.push(0.0);
    softmax(&eta)
}

fn penalized_log_likelihood(theta: &[f64], z: &[f64], counts: &Array2<f64>, lambda: f64) -> f64 {
    let mut ll = 0.0;
    for (t, &zt) in z.iter().enumerate() {
        let p = class_probabilities(theta, zt);
        for (k, &pk) in p.iter().enumerate() {
            let n = counts[[t, k]];
            if n > 0.0 {
                ll += n * pk.max(f64::MIN_POSITIVE).ln();
            }
        }
    }
    let penalty: f64 = theta.chunks(2).map(|c| c[1] * c[1]).sum();
    ll - 0.5 * lambda * penalty
}

/// Gradient of the penalized log-likelihood and the negated Hessian.
fn derivatives(
    theta: &[f64],
    z: &[f64],
    counts: &Array2<f64>,
    row_totals: &[f64],
    lambda: f64,
) -> (Vec<f64>, Array2<f64>) {
    let dim = theta.len();
    let free = dim / 2;
    let mut gradient = vec![0.0; dim];
    let mut hessian = Array2::<f64>::zeros((dim, dim));

    for (t, &zt) in z.iter().enumerate() {
        let p = class_probabilities(theta, zt);
        let n_t = row_totals[t];
        let basis = [1.0, zt];

        for k in 0..free {
            let residual = counts[[t, k]] - n_t * p[k];
            gradient[2 * k] += residual;
            gradient[2 * k + 1] += residual * zt;

            for l in 0..free {
                let delta = if k == l { 1.0 } else { 0.0 };
                let w = n_t * p[k] * (delta - p[l]);
                for a in 0..2 {
                    for b in 0..2 {
                        hessian[[2 * k + a, 2 * l + b]] += w * basis[a] * basis[b];
                    }
                }
            }
        }
    }

    for k in 0..free {
        gradient[2 * k + 1] -= lambda * theta[2 * k + 1];
        hessian[[2 * k + 1, 2 * k + 1]] += lambda;
    }

    (gradient, hessian)
}

fn weighted_moments(x: &[f64], weights: &[f64], total: f64) -> (f64, f64) {
    let mean = x
        .iter()
        .zip(weights)
        .fold(0.0, |acc, (&xi, &wi)| acc + xi * wi)
        / total;
    let var = x
        .iter()
        .zip(weights)
        .fold(0.0, |acc, (&xi, &wi)| acc + wi * (xi - mean) * (xi - mean))
        / total;
    let sd = var.sqrt();
    (mean, if sd > 0.0 { sd } else { 1.0 })
}
