//! Log-odds transforms.
//!
//! `logit(p) = ln(p / (1 - p))` linearizes logistic growth so a proportion
//! trajectory can be summarized by a straight-line slope.

// External dependencies
use num_traits::Float;

/// Log-odds of `p`. Returns ±infinity at 0 and 1 and NaN outside [0, 1].
#[inline]
pub fn logit<T: Float>(p: T) -> T {
    (p / (T::one() - p)).ln()
}

/// Inverse of [`logit`].
#[inline]
pub fn expit<T: Float>(x: T) -> T {
    if x >= T::zero() {
        T::one() / (T::one() + (-x).exp())
    } else {
        let e = x.exp();
        e / (T::one() + e)
    }
}

/// Log-odds of each proportion paired with its x-value, keeping only finite results.
pub fn finite_logits<T: Float>(x: &[T], p: &[T]) -> (Vec<T>, Vec<T>) {
    x.iter()
        .zip(p.iter())
        .filter_map(|(&xi, &pi)| {
            let li = logit(pi);
            li.is_finite().then_some((xi, li))
        })
        .unzip()
}
