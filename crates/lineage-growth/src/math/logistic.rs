//! Logistic growth curves and the three-wave mixture.
//!
//! ## Purpose
//!
//! A variant replacing its predecessor is modelled by the logistic curve
//!
//! ```text
//! L(t; x0, r) = 1 / (1 + (1/x0 - 1) · e^(-r·t))
//! ```
//!
//! where `x0` is the share at `t = 0` and `r` the growth rate per day. The
//! takeover estimator fits
//!
//! ```text
//! f(t) = L(t; x0₁, r₁) − L(t; x0₂, r₂) + L(t; x0₃, r₃)
//! ```
//!
//! to capture a signal that rises with one wave, falls as a second wave
//! replaces it, and rises again with a third.
//!
//! ## Design notes
//!
//! * The mixture is an approximation that happens to fit successive
//!   replacement waves with one smooth function. It is not a generative
//!   model, and its parameters should not be read as wave-level estimates
//!   beyond the term used for growth reporting.
//! * Parameters are stored as `[x0₁, r₁, x0₂, r₂, x0₃, r₃]`.

// External dependencies
use num_traits::Float;

/// Number of parameters in the mixture.
pub const N_PARAMS: usize = 6;

/// Sign of each logistic term in the mixture.
pub const TERM_SIGNS: [f64; 3] = [1.0, -1.0, 1.0];

/// Standard logistic growth curve.
#[inline]
pub fn logistic<T: Float>(t: T, x0: T, r: T) -> T {
    let a = T::one() / x0 - T::one();
    T::one() / (T::one() + a * (-r * t).exp())
}

/// Partial derivatives `(∂L/∂x0, ∂L/∂r)` of the logistic curve.
#[inline]
pub fn logistic_gradient<T: Float>(t: T, x0: T, r: T) -> (T, T) {
    let a = T::one() / x0 - T::one();
    let e = (-r * t).exp();
    let l = T::one() / (T::one() + a * e);
    let l2 = l * l;
    (l2 * e / (x0 * x0), l2 * a * t * e)
}

/// Three-wave logistic mixture `L₁ − L₂ + L₃`.
#[inline]
pub fn mixture(t: f64, params: &[f64; N_PARAMS]) -> f64 {
    TERM_SIGNS
        .iter()
        .enumerate()
        .fold(0.0, |acc, (k, &sign)| {
            acc + sign * logistic(t, params[2 * k], params[2 * k + 1])
        })
}

/// Gradient of [`mixture`] with respect to all six parameters.
#[inline]
pub fn mixture_gradient(t: f64, params: &[f64; N_PARAMS]) -> [f64; N_PARAMS] {
    let mut grad = [0.0; N_PARAMS];
    for (k, &sign) in TERM_SIGNS.iter().enumerate() {
        let (d_x0, d_r) = logistic_gradient(t, params[2 * k], params[2 * k + 1]);
        grad[2 * k] = sign * d_x0;
        grad[2 * k + 1] = sign * d_r;
    }
    grad
}
