//! Layer 3: Algorithms
//!
//! This layer implements the estimation steps of both pipelines: window
//! selection, lineage collapsing, the multinomial proportion model, log-odds
//! growth regression, and the bounded curve fit behind the takeover
//! estimator. It is orchestrated by the engine layer.

// Analysis-window selection.
pub mod window;

// Hierarchical lineage collapsing.
pub mod collapse;

// Multinomial logistic proportion model.
pub mod multinomial;

// Log-odds growth-rate regression.
pub mod regression;

// Bounded Levenberg–Marquardt curve fitting.
pub mod levenberg;
