//! # lineage-growth — Lineage growth rates and variant takeover estimates
//!
//! Numerical core of a genomic-surveillance dashboard. Given sequenced
//! samples labelled with PANGO lineages, it estimates how fast each lineage
//! is growing; given a daily proxy signal such as S-gene target failure
//! (SGTF), it estimates when a new variant takes over.
//!
//! ## Pipelines
//!
//! **Growth rates**: collapse rare lineage labels into their ancestors, pick
//! the most recent well-sampled weeks, fit a multinomial logistic model of
//! lineage share over time, and report each lineage's log-odds growth rate
//! per day in a ranked summary table.
//!
//! **Takeover**: smooth a daily proportion series, fit a three-wave logistic
//! mixture, and report the dates the curve passes 50% and 99% together with
//! the growth rate, doubling time and transmission increase, each with
//! one-sigma bounds.
//!
//! ## Quick Start
//!
//! ### Growth rates
//!
//! ```rust,no_run
//! use lineage_growth::prelude::*;
//!
//! let file = std::fs::File::open("sequences.csv").expect("open");
//! let records = read_sequences(file, &SequenceColumns::default())?;
//! let references = ReferenceTables::with_defaults();
//!
//! let model = GrowthRates::new()
//!     .min_count(50)         // Keep labels with more than 50 recent records
//!     .window_weeks(8)       // Eight most recent qualifying weeks
//!     .build()?;
//!
//! let report = model.estimate(&records, &references)?;
//! println!("{}", report);
//! # Result::<(), EstimationError>::Ok(())
//! ```
//!
//! ### Takeover
//!
//! ```rust,no_run
//! use lineage_growth::prelude::*;
//!
//! let file = std::fs::File::open("sgtf.csv").expect("open");
//! let series = read_daily(file, &DailyColumns::default())?;
//!
//! let model = Takeover::new()
//!     .horizon_days(400)
//!     .perturbation(PerturbationPolicy::reference())
//!     .build()?;
//!
//! let report = model.fit(&series)?;
//! println!("{}", report.estimates);
//! # Result::<(), EstimationError>::Ok(())
//! ```
//!
//! ### Result and Error Handling
//!
//! Both `estimate` and `fit` return `Result<_, EstimationError>`. Input-shape
//! problems (empty input, missing columns, too few qualifying weeks) and
//! numerical failures (too few usable points, non-convergence) are distinct
//! variants; [`EstimationError::is_fit_failure`](prelude::EstimationError::is_fit_failure)
//! tells them apart.
//!
//! ## Logging
//!
//! The crate emits `tracing` events (collapsing rounds, solver summaries,
//! short-window and degenerate-covariance warnings) and never installs a
//! subscriber.

// Layer 1: Primitives - records, reference tables and basic utilities.
mod primitives;

// Layer 2: Math - pure mathematical functions.
mod math;

// Layer 3: Algorithms - collapsing, proportion model, regression, curve fit.
mod algorithms;

// Layer 4: Evaluation - summary tables, takeover estimates, diagnostics.
mod evaluation;

// Layer 5: Engine - orchestration and validation.
mod engine;

// Layer 6: Adapters - tabular input loaders.
mod adapters;

// High-level fluent API for both pipelines.
mod api;

// Standard prelude.
pub mod prelude {
    pub use crate::adapters::daily::{read_daily, read_daily_path, DailyColumns};
    pub use crate::adapters::sequences::{read_sequences, read_sequences_path, SequenceColumns};
    pub use crate::api::{
        Estimate, EstimationError, GrowthConfig, GrowthRateEntry, GrowthRateModel,
        GrowthRatesBuilder as GrowthRates, GrowthReport, GrowthSummary, MixtureFit,
        PerturbationPolicy, PerturbationPreset, TakeoverBuilder as Takeover, TakeoverConfig,
        TakeoverEstimates, TakeoverModel, TakeoverReport, TrajectoryPoint,
    };
    pub use crate::primitives::lineage::AliasTable;
    pub use crate::primitives::records::{filter_region, DailyProportion, SequenceRecord};
    pub use crate::primitives::reference::{
        parse_lineage_list, parse_variant_names, ReferenceTables,
    };
    pub use crate::primitives::table::ProportionTable;
}

// Internal modules for development and testing.
//
// This module re-exports internal modules for development and testing purposes.
// It is only available with the `dev` feature enabled.
#[cfg(feature = "dev")]
pub mod internals {
    pub mod primitives {
        pub use crate::primitives::*;
    }
    pub mod math {
        pub use crate::math::*;
    }
    pub mod algorithms {
        pub use crate::algorithms::*;
    }
    pub mod evaluation {
        pub use crate::evaluation::*;
    }
    pub mod engine {
        pub use crate::engine::*;
    }
    pub mod adapters {
        pub use crate::adapters::*;
    }
    pub mod api {
        pub use crate::api::*;
    }
}
