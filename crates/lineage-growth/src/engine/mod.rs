//! Layer 5: Engine
//!
//! # Purpose
//!
//! This layer orchestrates both pipelines:
//! - Validation of inputs and configuration
//! - Step-by-step execution of the growth-rate and takeover pipelines
//! - Report types holding every intermediate result
//!
//! # Architecture
//!
//! ```text
//! Layer 7: API
//!   ↓
//! Layer 6: Adapters
//!   ↓
//! Layer 5: Engine ← You are here
//!   ↓
//! Layer 4: Evaluation
//!   ↓
//! Layer 3: Algorithms
//!   ↓
//! Layer 2: Math
//!   ↓
//! Layer 1: Primitives
//! ```

/// Pipeline executors.
pub mod executor;

/// Report types.
pub mod output;

/// Input and parameter validation.
pub mod validator;
