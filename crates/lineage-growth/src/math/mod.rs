//! Layer 2: Math
//!
//! # Purpose
//!
//! This layer provides pure mathematical functions used by both pipelines:
//! - Log-odds transforms
//! - Savitzky–Golay smoothing
//! - Logistic curves and the three-wave mixture
//! - Small dense linear algebra
//!
//! These are reusable building blocks with no pipeline-specific logic.
//!
//! # Architecture
//!
//! ```text
//! Layer 7: API
//!   ↓
//! Layer 6: Adapters
//!   ↓
//! Layer 5: Engine
//!   ↓
//! Layer 4: Evaluation
//!   ↓
//! Layer 3: Algorithms
//!   ↓
//! Layer 2: Math ← You are here
//!   ↓
//! Layer 1: Primitives
//! ```

/// Log-odds transforms.
pub mod logit;

/// Savitzky–Golay polynomial smoothing.
pub mod savgol;

/// Logistic curves and mixtures.
pub mod logistic;

/// Gaussian elimination, Jacobi eigen-decomposition, pseudo-inverse.
pub mod linalg;
