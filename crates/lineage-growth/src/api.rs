//! High-level API for growth-rate and takeover estimation.
//!
//! ## Purpose
//!
//! This module provides the user-facing entry points for both pipelines. It
//! implements fluent builders for configuring parameters, and serde config
//! structs so the same settings can be read from a file.
//!
//! ## Design notes
//!
//! * **Ergonomic**: Fluent builders with sensible defaults for all parameters.
//! * **Validated**: Parameters are validated when `.build()` is called.
//! * **Deferred errors**: Setting a parameter twice is recorded and reported
//!   by `.build()` rather than silently overwriting.
//!
//! ### Configuration Flow
//!
//! 1. Create a builder via `GrowthRates::new()` or `Takeover::new()`.
//! 2. Chain configuration methods (`.min_count()`, `.horizon_days()`, etc.),
//!    or seed it from a config struct with `from_config`.
//! 3. Call `.build()` to get a model, then `.estimate()` or `.fit()`.

// External dependencies
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// Internal dependencies
use crate::algorithms::collapse::{
    CollapseConfig, DEFAULT_ALIAS_FAMILY, DEFAULT_MIN_COUNT, DEFAULT_ROUNDS,
};
use crate::algorithms::levenberg::{
    LevenbergMarquardt, DEFAULT_FTOL, DEFAULT_GTOL, DEFAULT_MAX_ITERATIONS as DEFAULT_FIT_ITERATIONS,
    DEFAULT_XTOL,
};
use crate::algorithms::multinomial::{
    MultinomialConfig, DEFAULT_INVERSE_REGULARIZATION, DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE,
};
use crate::algorithms::window::{DEFAULT_MIN_WEEK_COUNT, DEFAULT_WINDOW_WEEKS};
use crate::engine::executor::{
    GrowthExecutor, GrowthPipelineConfig, TakeoverExecutor, TakeoverPipelineConfig,
};
use crate::engine::validator::Validator;
use crate::evaluation::summary::{SummaryOptions, DEFAULT_MIN_RECENT_COUNT, DEFAULT_TOP_N};
use crate::evaluation::takeover::{
    DEFAULT_GROWTH_TERM, DEFAULT_HORIZON_DAYS, DEFAULT_INITIAL_GUESS, DEFAULT_SERIAL_INTERVAL,
};
use crate::math::logistic::N_PARAMS;
use crate::math::savgol::{SavitzkyGolay, TAKEOVER_POLYORDER, TAKEOVER_WINDOW};
use crate::primitives::records::{DailyProportion, SequenceRecord};
use crate::primitives::reference::ReferenceTables;

// Publicly re-exported types
pub use crate::engine::output::{GrowthReport, MixtureFit, TakeoverReport};
pub use crate::evaluation::summary::{GrowthRateEntry, GrowthSummary};
pub use crate::evaluation::takeover::{Estimate, PerturbationPolicy, TakeoverEstimates, TrajectoryPoint};
pub use crate::primitives::errors::EstimationError;

// ============================================================================
// File Configuration
// ============================================================================

/// Growth-rate settings as read from a configuration file.
///
/// Every field is optional; absent fields take the builder defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GrowthConfig {
    /// Weeks need strictly more records than this to enter the window.
    pub min_week_count: Option<usize>,
    /// Number of trailing qualifying weeks in the window.
    pub window_weeks: Option<usize>,
    /// Fewer qualifying weeks than this is an error.
    pub required_weeks: Option<usize>,
    /// Labels need strictly more window records than this to be kept.
    pub min_count: Option<usize>,
    /// Maximum collapsing rounds.
    pub rounds: Option<usize>,
    /// Aliases allowed in re-compressed labels.
    pub alias_family: Option<Vec<String>>,
    /// Inverse L2 strength of the proportion model.
    pub inverse_regularization: Option<f64>,
    /// Newton iteration budget of the proportion model.
    pub max_iterations: Option<usize>,
    /// Number of fastest growers in the filtered table.
    pub top_n: Option<usize>,
    /// Fastest growers need strictly more recent records than this.
    pub min_recent_count: Option<usize>,
}

/// Named perturbation presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerturbationPreset {
    /// See [`PerturbationPolicy::reference`].
    Reference,
    /// See [`PerturbationPolicy::symmetric`].
    Symmetric,
}

impl PerturbationPreset {
    /// The policy this preset names.
    pub fn policy(self) -> PerturbationPolicy {
        match self {
            PerturbationPreset::Reference => PerturbationPolicy::reference(),
            PerturbationPreset::Symmetric => PerturbationPolicy::symmetric(),
        }
    }
}

/// Takeover settings as read from a configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TakeoverConfig {
    /// Savitzky–Golay window length.
    pub filter_window: Option<usize>,
    /// Savitzky–Golay polynomial order.
    pub filter_polyorder: Option<usize>,
    /// Starting parameters `[x0₁, r₁, x0₂, r₂, x0₃, r₃]`.
    pub initial_guess: Option<[f64; N_PARAMS]>,
    /// Solver iteration budget.
    pub max_iterations: Option<usize>,
    /// Solver tolerance (used for ftol, xtol and gtol).
    pub tolerance: Option<f64>,
    /// Number of simulated days.
    pub horizon_days: Option<usize>,
    /// Date crossings are searched from.
    pub anchor: Option<NaiveDate>,
    /// Serial interval in days.
    pub serial_interval: Option<f64>,
    /// Named perturbation preset.
    pub perturbation: Option<PerturbationPreset>,
    /// Explicit sigma multipliers; take precedence over the preset.
    pub perturbation_multipliers: Option<[f64; N_PARAMS]>,
    /// 1-based mixture term whose rate is the reported growth rate.
    pub growth_term: Option<usize>,
}

// ============================================================================
// Growth-Rate Builder
// ============================================================================

/// Fluent builder for the growth-rate pipeline.
#[derive(Debug, Clone, Default)]
pub struct GrowthRatesBuilder {
    /// Minimum records per window week (exclusive).
    pub min_week_count: Option<usize>,

    /// Number of trailing window weeks.
    pub window_weeks: Option<usize>,

    /// Minimum number of qualifying weeks.
    pub required_weeks: Option<usize>,

    /// Minimum window records per kept label (exclusive).
    pub min_count: Option<usize>,

    /// Maximum collapsing rounds.
    pub rounds: Option<usize>,

    /// Kept alias family.
    pub alias_family: Option<Vec<String>>,

    /// Inverse L2 strength.
    pub inverse_regularization: Option<f64>,

    /// Newton iteration budget.
    pub max_iterations: Option<usize>,

    /// Fastest growers reported.
    pub top_n: Option<usize>,

    /// Recent-count floor for fastest growers (exclusive).
    pub min_recent_count: Option<usize>,

    /// Tracks if any parameter was set multiple times (for validation).
    #[doc(hidden)]
    pub duplicate_param: Option<&'static str>,
}

macro_rules! setter {
    ($(#[$doc:meta])* $name:ident: $ty:ty) => {
        $(#[$doc])*
        pub fn $name(mut self, value: $ty) -> Self {
            if self.$name.is_some() {
                self.duplicate_param = Some(stringify!($name));
            }
            self.$name = Some(value);
            self
        }
    };
}

impl GrowthRatesBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a builder from file configuration.
    pub fn from_config(config: &GrowthConfig) -> Self {
        Self {
            min_week_count: config.min_week_count,
            window_weeks: config.window_weeks,
            required_weeks: config.required_weeks,
            min_count: config.min_count,
            rounds: config.rounds,
            alias_family: config.alias_family.clone(),
            inverse_regularization: config.inverse_regularization,
            max_iterations: config.max_iterations,
            top_n: config.top_n,
            min_recent_count: config.min_recent_count,
            duplicate_param: None,
        }
    }

    setter!(
        /// Set the minimum records a week needs (exclusive).
        min_week_count: usize
    );
    setter!(
        /// Set the number of trailing window weeks.
        window_weeks: usize
    );
    setter!(
        /// Set how many qualifying weeks are required.
        required_weeks: usize
    );
    setter!(
        /// Set the minimum window count for a label to be kept (exclusive).
        min_count: usize
    );
    setter!(
        /// Set the maximum number of collapsing rounds.
        rounds: usize
    );
    setter!(
        /// Set the aliases allowed in re-compressed labels.
        alias_family: Vec<String>
    );
    setter!(
        /// Set the inverse L2 strength of the proportion model.
        inverse_regularization: f64
    );
    setter!(
        /// Set the Newton iteration budget.
        max_iterations: usize
    );
    setter!(
        /// Set the number of fastest growers reported.
        top_n: usize
    );
    setter!(
        /// Set the recent-count floor for fastest growers (exclusive).
        min_recent_count: usize
    );

    /// Validate parameters and build the model.
    pub fn build(self) -> Result<GrowthRateModel, EstimationError> {
        Validator::validate_no_duplicates(self.duplicate_param)?;

        let window_weeks = self.window_weeks.unwrap_or(DEFAULT_WINDOW_WEEKS);
        let required_weeks = self.required_weeks.unwrap_or(window_weeks);
        Validator::validate_window(window_weeks, required_weeks)?;

        let rounds = self.rounds.unwrap_or(DEFAULT_ROUNDS);
        Validator::validate_budget(rounds, "rounds")?;

        let max_iterations = self.max_iterations.unwrap_or(DEFAULT_MAX_ITERATIONS);
        Validator::validate_budget(max_iterations, "max_iterations")?;

        let inverse_regularization = self
            .inverse_regularization
            .unwrap_or(DEFAULT_INVERSE_REGULARIZATION);
        Validator::validate_positive(inverse_regularization, "inverse_regularization")?;

        let top_n = self.top_n.unwrap_or(DEFAULT_TOP_N);
        Validator::validate_budget(top_n, "top_n")?;

        let alias_family = self
            .alias_family
            .unwrap_or_else(|| vec![DEFAULT_ALIAS_FAMILY.to_string()]);

        let config = GrowthPipelineConfig {
            min_week_count: self.min_week_count.unwrap_or(DEFAULT_MIN_WEEK_COUNT),
            window_weeks,
            required_weeks,
            collapse: CollapseConfig {
                min_count: self.min_count.unwrap_or(DEFAULT_MIN_COUNT),
                rounds,
                alias_family,
            },
            multinomial: MultinomialConfig {
                inverse_regularization,
                max_iterations,
                tolerance: DEFAULT_TOLERANCE,
            },
            summary: SummaryOptions {
                top_n,
                min_recent_count: self.min_recent_count.unwrap_or(DEFAULT_MIN_RECENT_COUNT),
            },
        };

        Ok(GrowthRateModel {
            executor: GrowthExecutor::from_config(config),
        })
    }
}

/// A configured growth-rate pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthRateModel {
    executor: GrowthExecutor,
}

impl GrowthRateModel {
    /// Resolved configuration.
    pub fn config(&self) -> &GrowthPipelineConfig {
        self.executor.config()
    }

    /// Run the pipeline over `records`.
    pub fn estimate(
        &self,
        records: &[SequenceRecord],
        references: &ReferenceTables,
    ) -> Result<GrowthReport, EstimationError> {
        self.executor.run(records, references)
    }
}

// ============================================================================
// Takeover Builder
// ============================================================================

/// Fluent builder for the takeover pipeline.
#[derive(Debug, Clone, Default)]
pub struct TakeoverBuilder {
    /// Savitzky–Golay window length.
    pub filter_window: Option<usize>,

    /// Savitzky–Golay polynomial order.
    pub filter_polyorder: Option<usize>,

    /// Starting parameters.
    pub initial_guess: Option<[f64; N_PARAMS]>,

    /// Solver iteration budget.
    pub max_iterations: Option<usize>,

    /// Solver tolerance.
    pub tolerance: Option<f64>,

    /// Simulated days.
    pub horizon_days: Option<usize>,

    /// Crossing search start.
    pub anchor: Option<NaiveDate>,

    /// Serial interval in days.
    pub serial_interval: Option<f64>,

    /// Perturbation policy.
    pub perturbation: Option<PerturbationPolicy>,

    /// Term whose rate is reported.
    pub growth_term: Option<usize>,

    /// Tracks if any parameter was set multiple times (for validation).
    #[doc(hidden)]
    pub duplicate_param: Option<&'static str>,
}

impl TakeoverBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a builder from file configuration.
    pub fn from_config(config: &TakeoverConfig) -> Self {
        let perturbation = config
            .perturbation_multipliers
            .map(PerturbationPolicy::custom)
            .or_else(|| config.perturbation.map(PerturbationPreset::policy));
        Self {
            filter_window: config.filter_window,
            filter_polyorder: config.filter_polyorder,
            initial_guess: config.initial_guess,
            max_iterations: config.max_iterations,
            tolerance: config.tolerance,
            horizon_days: config.horizon_days,
            anchor: config.anchor,
            serial_interval: config.serial_interval,
            perturbation,
            growth_term: config.growth_term,
            duplicate_param: None,
        }
    }

    setter!(
        /// Set the smoothing window length (odd).
        filter_window: usize
    );
    setter!(
        /// Set the smoothing polynomial order.
        filter_polyorder: usize
    );
    setter!(
        /// Set the starting parameters `[x0₁, r₁, x0₂, r₂, x0₃, r₃]`.
        initial_guess: [f64; N_PARAMS]
    );
    setter!(
        /// Set the solver iteration budget.
        max_iterations: usize
    );
    setter!(
        /// Set the solver tolerance.
        tolerance: f64
    );
    setter!(
        /// Set the number of simulated days.
        horizon_days: usize
    );
    setter!(
        /// Set the date crossings are searched from.
        anchor: NaiveDate
    );
    setter!(
        /// Set the serial interval in days.
        serial_interval: f64
    );
    setter!(
        /// Set the perturbation policy for the bounds.
        perturbation: PerturbationPolicy
    );
    setter!(
        /// Set the 1-based mixture term whose rate is the reported growth rate.
        growth_term: usize
    );

    /// Validate parameters and build the model.
    pub fn build(self) -> Result<TakeoverModel, EstimationError> {
        Validator::validate_no_duplicates(self.duplicate_param)?;

        let filter = SavitzkyGolay::new(
            self.filter_window.unwrap_or(TAKEOVER_WINDOW),
            self.filter_polyorder.unwrap_or(TAKEOVER_POLYORDER),
        )?;

        let initial_guess = self.initial_guess.unwrap_or(DEFAULT_INITIAL_GUESS);
        Validator::validate_initial_guess(&initial_guess)?;

        let max_iterations = self.max_iterations.unwrap_or(DEFAULT_FIT_ITERATIONS);
        Validator::validate_budget(max_iterations, "max_iterations")?;

        let solver = match self.tolerance {
            Some(tol) => {
                Validator::validate_positive(tol, "tolerance")?;
                LevenbergMarquardt {
                    max_iterations,
                    ftol: tol,
                    xtol: tol,
                    gtol: tol,
                }
            }
            None => LevenbergMarquardt {
                max_iterations,
                ftol: DEFAULT_FTOL,
                xtol: DEFAULT_XTOL,
                gtol: DEFAULT_GTOL,
            },
        };

        let horizon_days = self.horizon_days.unwrap_or(DEFAULT_HORIZON_DAYS);
        Validator::validate_budget(horizon_days, "horizon_days")?;

        let serial_interval = self.serial_interval.unwrap_or(DEFAULT_SERIAL_INTERVAL);
        Validator::validate_positive(serial_interval, "serial_interval")?;

        let policy = self.perturbation.unwrap_or_default();
        Validator::validate_multipliers(&policy.multipliers)?;

        let growth_term = self.growth_term.unwrap_or(DEFAULT_GROWTH_TERM);
        Validator::validate_growth_term(growth_term)?;

        let config = TakeoverPipelineConfig {
            filter,
            initial_guess,
            solver,
            horizon_days,
            anchor: self.anchor,
            serial_interval,
            policy,
            growth_term,
        };

        Ok(TakeoverModel {
            executor: TakeoverExecutor::from_config(config),
        })
    }
}

/// A configured takeover pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TakeoverModel {
    executor: TakeoverExecutor,
}

impl TakeoverModel {
    /// Resolved configuration.
    pub fn config(&self) -> &TakeoverPipelineConfig {
        self.executor.config()
    }

    /// Fit the mixture to a daily series and derive the estimates.
    pub fn fit(&self, series: &[DailyProportion]) -> Result<TakeoverReport, EstimationError> {
        self.executor.run(series)
    }
}
