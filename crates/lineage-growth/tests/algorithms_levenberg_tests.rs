#![cfg(feature = "dev")]
//! Tests for the bounded Levenberg–Marquardt curve fitter.
//!
//! ## Test Organization
//!
//! 1. **Custom Models** - Exponential curve with an exact solution
//! 2. **Bounds** - Projection onto lower bounds
//! 3. **Stopping** - Tolerance-based termination on noisy data
//! 4. **Covariance** - Symmetry and non-negative variances
//! 5. **Failures** - Too few observations, iteration budget

use approx::assert_relative_eq;

use lineage_growth::internals::algorithms::levenberg::{
    CurveModel, LevenbergMarquardt, LogisticMixture, Termination,
};
use lineage_growth::internals::math::logistic::mixture;
use lineage_growth::internals::primitives::errors::EstimationError;

// ============================================================================
// Helper Models
// ============================================================================

/// `a · exp(b · t)` with `a ≥ 0`.
struct Exponential;

impl CurveModel for Exponential {
    fn n_params(&self) -> usize {
        2
    }

    fn value(&self, t: f64, params: &[f64]) -> f64 {
        params[0] * (params[1] * t).exp()
    }

    fn gradient(&self, t: f64, params: &[f64], out: &mut [f64]) {
        let e = (params[1] * t).exp();
        out[0] = e;
        out[1] = params[0] * t * e;
    }

    fn lower_bounds(&self) -> Vec<f64> {
        vec![0.0, f64::NEG_INFINITY]
    }
}

/// `c` with `c ≥ 1`.
struct Constant;

impl CurveModel for Constant {
    fn n_params(&self) -> usize {
        1
    }

    fn value(&self, _t: f64, params: &[f64]) -> f64 {
        params[0]
    }

    fn gradient(&self, _t: f64, _params: &[f64], out: &mut [f64]) {
        out[0] = 1.0;
    }

    fn lower_bounds(&self) -> Vec<f64> {
        vec![1.0]
    }
}

fn grid(n: usize) -> Vec<f64> {
    (0..n).map(|i| i as f64).collect()
}

// ============================================================================
// Custom Model Tests
// ============================================================================

/// Test that exact exponential data is recovered.
#[test]
fn test_fit_exponential_exact() {
    let t = grid(11);
    let y: Vec<f64> = t.iter().map(|&ti| 2.0 * (0.3 * ti).exp()).collect();

    let fit = LevenbergMarquardt::default()
        .fit(&Exponential, &t, &y, &[1.0, 0.1])
        .unwrap();

    assert_relative_eq!(fit.params[0], 2.0, max_relative = 1e-6);
    assert_relative_eq!(fit.params[1], 0.3, max_relative = 1e-6);
    assert!(fit.rss < 1e-8);
    assert!(fit.iterations > 0);
}

/// Test standard errors on noisy data are finite and positive.
#[test]
fn test_fit_exponential_noisy() {
    let t = grid(20);
    let y: Vec<f64> = t
        .iter()
        .enumerate()
        .map(|(i, &ti)| 2.0 * (0.1 * ti).exp() + if i % 2 == 0 { 0.05 } else { -0.05 })
        .collect();

    let fit = LevenbergMarquardt::default()
        .fit(&Exponential, &t, &y, &[1.0, 0.2])
        .unwrap();

    assert_relative_eq!(fit.params[1], 0.1, max_relative = 1e-2);
    assert!(fit.std_errors.iter().all(|s| s.is_finite() && *s > 0.0));
    assert_eq!(fit.rank, 2);
}

// ============================================================================
// Bounds Tests
// ============================================================================

/// Test that the solution respects the lower bound.
#[test]
fn test_fit_respects_lower_bound() {
    let t = grid(5);
    let y = vec![0.2; 5];

    let fit = LevenbergMarquardt::default()
        .fit(&Constant, &t, &y, &[3.0])
        .unwrap();

    assert!(fit.params[0] >= 1.0);
    assert_relative_eq!(fit.params[0], 1.0, epsilon = 1e-12);
    // The projected step is zero, so no reduction is predicted.
    assert_eq!(fit.termination, Termination::ResidualTolerance);
}

// ============================================================================
// Stopping Tests
// ============================================================================

/// Test that a noisy fit stops on a tolerance well inside the budget.
#[test]
fn test_fit_noisy_stops_on_tolerance() {
    let t = grid(20);
    let y: Vec<f64> = t
        .iter()
        .enumerate()
        .map(|(i, &ti)| 2.0 * (0.1 * ti).exp() + if i % 2 == 0 { 0.05 } else { -0.05 })
        .collect();

    let fit = LevenbergMarquardt::default()
        .fit(&Exponential, &t, &y, &[1.0, 0.2])
        .unwrap();

    assert!(matches!(
        fit.termination,
        Termination::ResidualTolerance | Termination::StepTolerance | Termination::GradientTolerance
    ));
    assert!(fit.iterations < 100);
}

/// Test that the mixture converges from a distant start on a noisy series
/// whose residuals cannot reach zero.
#[test]
fn test_fit_mixture_noisy_from_default_start() {
    let truth = [0.001, 0.0, 0.001, 0.0, 0.001, 0.1];
    let start = [0.001, 0.03, 0.001, 0.02, 0.001, 0.1];
    let t = grid(100);
    let y: Vec<f64> = t
        .iter()
        .enumerate()
        .map(|(i, &ti)| mixture(ti, &truth) + 0.01 * ((i * 7 % 11) as f64 - 5.0) / 5.0)
        .collect();

    let fit = LevenbergMarquardt::default()
        .fit(&LogisticMixture, &t, &y, &start)
        .unwrap();

    assert_ne!(fit.termination, Termination::ExactFit);
    assert!(fit.iterations < LevenbergMarquardt::default().max_iterations);
    assert!(fit.rss.is_finite());
}

// ============================================================================
// Covariance Tests
// ============================================================================

/// Test covariance symmetry and non-negative variances for the mixture model.
#[test]
fn test_mixture_covariance_well_formed() {
    let truth = [0.05, 0.08, 0.01, 0.06, 0.001, 0.12];
    let t = grid(90);
    let y: Vec<f64> = t
        .iter()
        .enumerate()
        .map(|(i, &ti)| mixture(ti, &truth) + 0.002 * ((i % 5) as f64 - 2.0))
        .collect();

    let fit = LevenbergMarquardt::default()
        .fit(&LogisticMixture, &t, &y, &truth)
        .unwrap();

    let cov = &fit.covariance;
    assert_eq!(cov.dim(), (6, 6));
    for i in 0..6 {
        assert!(cov[[i, i]] >= 0.0);
        for j in 0..6 {
            assert_eq!(cov[[i, j]], cov[[j, i]]);
        }
    }
    assert!(fit.params.iter().step_by(2).all(|&x0| x0 > 0.0));
    assert!(fit.params.iter().skip(1).step_by(2).all(|&r| r >= 0.0));
}

// ============================================================================
// Failure Tests
// ============================================================================

/// Test that n ≤ p observations is rejected.
#[test]
fn test_fit_too_few_observations() {
    let t = grid(2);
    let y = vec![1.0, 2.0];

    let err = LevenbergMarquardt::default()
        .fit(&Exponential, &t, &y, &[1.0, 0.1])
        .unwrap_err();
    assert_eq!(err, EstimationError::TooFewObservations { got: 2, min: 3 });
}

/// Test that exhausting the iteration budget is a fit failure.
#[test]
fn test_fit_iteration_budget() {
    let t = grid(30);
    let y: Vec<f64> = t.iter().map(|&ti| 5.0 * (0.2 * ti).exp()).collect();

    let solver = LevenbergMarquardt {
        max_iterations: 1,
        ..LevenbergMarquardt::default()
    };
    let err = solver.fit(&Exponential, &t, &y, &[0.1, 0.01]).unwrap_err();
    assert!(err.is_fit_failure());
    assert!(matches!(err, EstimationError::FitFailed { iterations: 1, .. }));
}

/// Test that a perfect starting point stops immediately.
#[test]
fn test_fit_exact_start() {
    let t = grid(6);
    let y = vec![1.0; 6];

    let fit = LevenbergMarquardt::default()
        .fit(&Constant, &t, &y, &[1.0])
        .unwrap();
    assert_eq!(fit.termination, Termination::ExactFit);
    assert_eq!(fit.iterations, 0);
}
