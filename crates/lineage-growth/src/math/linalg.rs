//! Small dense linear algebra.
//!
//! ## Purpose
//!
//! Tables in this crate are `ndarray` arrays; the factorizations come from
//! `nalgebra`. The systems are small (two coefficients per lineage, six
//! mixture parameters), so converting at the boundary is cheap.
//!
//! ## Invariants
//!
//! * Inputs are square; callers guarantee matching dimensions.
//! * `pseudo_inverse_symmetric` never fails: rank-deficient directions are dropped.

// External dependencies
use nalgebra::{DMatrix, DVector, SymmetricEigen};
use ndarray::Array2;

/// Pivot magnitude, relative to the largest entry, below which a system is
/// treated as singular.
const PIVOT_TOL: f64 = 1e-14;

fn to_dmatrix(a: &Array2<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(a.nrows(), a.ncols(), |i, j| a[[i, j]])
}

/// Solve `a · x = b` by LU decomposition with partial pivoting.
///
/// Returns `None` if `a` is (numerically) singular.
pub fn solve(a: &Array2<f64>, b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    debug_assert_eq!(a.dim(), (n, n));

    let m = to_dmatrix(a);
    let scale = m.amax().max(1.0);
    let lu = m.lu();

    let u = lu.u();
    if u.diagonal().iter().any(|d| d.abs() <= PIVOT_TOL * scale) {
        return None;
    }

    let x = lu.solve(&DVector::from_column_slice(b))?;
    x.iter().all(|v| v.is_finite()).then(|| x.iter().copied().collect())
}

/// Moore–Penrose pseudo-inverse of a symmetric positive semi-definite matrix.
///
/// Eigenvalues below `n · ε · λ_max` are treated as zero. Also returns the
/// numerical rank.
pub fn pseudo_inverse_symmetric(a: &Array2<f64>) -> (Array2<f64>, usize) {
    let n = a.nrows();
    let eigen = SymmetricEigen::new(to_dmatrix(a));

    let max_ev = eigen.eigenvalues.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let cutoff = max_ev * f64::EPSILON * n as f64;

    let mut inverse = DMatrix::<f64>::zeros(n, n);
    let mut rank = 0;
    for (k, &lambda) in eigen.eigenvalues.iter().enumerate() {
        if lambda <= cutoff {
            continue;
        }
        rank += 1;
        let v = eigen.eigenvectors.column(k);
        inverse += (v * v.transpose()) / lambda;
    }

    (Array2::from_shape_fn((n, n), |(i, j)| inverse[(i, j)]), rank)
}
