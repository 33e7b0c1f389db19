//! Layer 4: Evaluation
//!
//! # Purpose
//!
//! This layer turns fitted models into reported quantities:
//! - Growth-rate summary tables
//! - Takeover dates, growth rates and their bounds
//! - Diagnostic metrics for fit quality
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
//! Layer 4: Evaluation ← You are here
//!   ↓
//! Layer 3: Algorithms
//!   ↓
//! Layer 2: Math
//!   ↓
//! Layer 1: Primitives
//! ```

/// Growth-rate summary assembly.
pub mod summary;

/// Takeover estimates and trajectories.
pub mod takeover;

/// Diagnostic metrics for fit quality assessment.
pub mod diagnostics;
