//! Layer 1: Primitives
//!
//! # Purpose
//!
//! This layer provides the typed records, reference tables, label arithmetic,
//! calendar helpers, and error types used throughout the crate. It has zero
//! internal dependencies within the crate.
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
//! Layer 2: Math
//!   ↓
//! Layer 1: Primitives ← You are here
//! ```

/// Shared error types.
pub mod errors;

/// Calendar and epiweek helpers.
pub mod dates;

/// Sequence and daily-proportion records.
pub mod records;

/// Lineage label arithmetic and alias tables.
pub mod lineage;

/// Forced-keep lists and variant names.
pub mod reference;

/// Weekly proportion table.
pub mod table;
