//! Layer 6: Adapters
//!
//! # Purpose
//!
//! This layer reads the tabular inputs both pipelines consume:
//! - Sequence record CSV files
//! - Daily proportion CSV files
//!
//! Column names are configurable; missing columns are reported by name.
//!
//! # Architecture
//!
//! ```text
//! Layer 7: API
//!   ↓
//! Layer 6: Adapters ← You are here
//!   ↓
//! Layer 5: Engine
//!   ↓
//! Layer 4: Evaluation
//!   ↓
//! Layer 3: Algorithms
//!   ↓
//! Layer 2: Math
//!   ↓
//! Layer 1: Primitives
//! ```

/// Shared CSV plumbing.
pub mod tabular;

/// Sequence record loader.
pub mod sequences;

/// Daily proportion loader.
pub mod daily;
