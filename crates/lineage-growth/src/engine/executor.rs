//! Execution engine for growth-rate and takeover estimation.
//!
//! ## Purpose
//!
//! This module orchestrates the two pipelines. The growth pipeline selects
//! the analysis window, collapses lineages, fits the proportion model,
//! regresses per-lineage growth rates and assembles the summary tables. The
//! takeover pipeline smooths a daily proportion series, fits the logistic
//! mixture and derives the takeover estimates.
//!
//! ## Design notes
//!
//! * Configuration is fully resolved before execution; the executors never
//!   apply defaults of their own.
//! * Every step is a pure function over typed tables; the executors only
//!   thread results from one step to the next.
//! * Each completed run is logged at `info` level.
//!
//! ## Invariants
//!
//! * The growth pipeline never returns a summary with fewer window weeks than
//!   `required_weeks`.
//! * The takeover pipeline's trajectory covers exactly `horizon_days` days.
//!
//! ## Non-goals
//!
//! * This module does not validate configuration (handled by the builders).
//! * This module does not read or write files.

// External dependencies
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, info};

// Internal dependencies
use crate::algorithms::collapse::{collapse_lineages, CollapseConfig};
use crate::algorithms::levenberg::{LevenbergMarquardt, LogisticMixture};
use crate::algorithms::multinomial::{estimate_proportions, MultinomialConfig};
use crate::algorithms::regression::growth_rate;
use crate::algorithms::window::select_weeks;
use crate::engine::output::{GrowthReport, MixtureFit, TakeoverReport};
use crate::engine::validator::Validator;
use crate::evaluation::diagnostics::Diagnostics;
use crate::evaluation::summary::{assemble_summary, collapsed_counts, SummaryOptions};
use crate::evaluation::takeover::{derive_estimates, PerturbationPolicy, Projection};
use crate::math::logistic::{mixture, N_PARAMS};
use crate::math::savgol::SavitzkyGolay;
use crate::primitives::errors::EstimationError;
use crate::primitives::records::{DailyProportion, SequenceRecord};
use crate::primitives::reference::ReferenceTables;

// ============================================================================
// Growth Pipeline
// ============================================================================

/// Resolved configuration for the growth-rate pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthPipelineConfig {
    /// Weeks need strictly more records than this to enter the window.
    pub min_week_count: usize,

    /// Number of trailing qualifying weeks in the window.
    pub window_weeks: usize,

    /// Fewer qualifying weeks than this is an error.
    pub required_weeks: usize,

    /// Lineage collapsing settings.
    pub collapse: CollapseConfig,

    /// Proportion model settings.
    pub multinomial: MultinomialConfig,

    /// Filtered-table settings.
    pub summary: SummaryOptions,
}

/// Executor for the growth-rate pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthExecutor {
    config: GrowthPipelineConfig,
}

impl GrowthExecutor {
    /// Create an executor from a resolved configuration.
    pub fn from_config(config: GrowthPipelineConfig) -> Self {
        Self { config }
    }

    /// The configuration this executor runs with.
    pub fn config(&self) -> &GrowthPipelineConfig {
        &self.config
    }

    /// Run the full growth-rate pipeline.
    pub fn run(
        &self,
        records: &[SequenceRecord],
        references: &ReferenceTables,
    ) -> Result<GrowthReport, EstimationError> {
        let config = &self.config;
        Validator::validate_records(records)?;

        let window = select_weeks(records, config.min_week_count, config.window_weeks);
        if window.len() < config.required_weeks {
            return Err(EstimationError::InsufficientWeeks {
                got: window.len(),
                min: config.required_weeks,
            });
        }

        let collapse = collapse_lineages(records, &window, references, &config.collapse);
        debug!(
            rounds = collapse.rounds_run(),
            labels = collapse.collapsed_labels().len(),
            "lineages collapsed"
        );

        let (proportions, model) =
            estimate_proportions(records, &window, &collapse, &config.multinomial)?;
        debug!(iterations = model.iterations, "proportion model fitted");

        let x = proportions.week_numbers();
        let mut growth_rates = BTreeMap::new();
        for (j, label) in proportions.labels.iter().enumerate() {
            let p = proportions.values.column(j).to_vec();
            growth_rates.insert(label.clone(), growth_rate(label, &x, &p)?);
        }

        let total_counts = collapsed_counts(records, &collapse);
        let recent_counts = collapsed_counts(
            records.iter().filter(|r| window.binary_search(&r.epiweek).is_ok()),
            &collapse,
        );

        let summary = assemble_summary(
            &growth_rates,
            &total_counts,
            &recent_counts,
            &proportions,
            references,
            &config.summary,
        );

        info!(
            records = records.len(),
            weeks = window.len(),
            lineages = summary.full.len(),
            reported = summary.filtered.len(),
            "growth-rate pipeline complete"
        );

        Ok(GrowthReport {
            window,
            collapse,
            proportions,
            growth_rates,
            summary,
        })
    }
}

// ============================================================================
// Takeover Pipeline
// ============================================================================

/// Resolved configuration for the takeover pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TakeoverPipelineConfig {
    /// Smoothing filter applied before fitting.
    pub filter: SavitzkyGolay,

    /// Starting parameters, `(x0, r)` per term.
    pub initial_guess: [f64; N_PARAMS],

    /// Solver stopping criteria.
    pub solver: LevenbergMarquardt,

    /// Number of simulated days.
    pub horizon_days: usize,

    /// Crossing dates are searched from here on; `None` means the series start.
    pub anchor: Option<NaiveDate>,

    /// Serial interval in days.
    pub serial_interval: f64,

    /// Sigma multipliers for the perturbed curves.
    pub policy: PerturbationPolicy,

    /// 1-based mixture term whose rate is reported as the growth rate.
    pub growth_term: usize,
}

/// Executor for the takeover pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TakeoverExecutor {
    config: TakeoverPipelineConfig,
}

impl TakeoverExecutor {
    /// Create an executor from a resolved configuration.
    pub fn from_config(config: TakeoverPipelineConfig) -> Self {
        Self { config }
    }

    /// The configuration this executor runs with.
    pub fn config(&self) -> &TakeoverPipelineConfig {
        &self.config
    }

    /// Minimum series length the pipeline can fit.
    pub fn min_observations(&self) -> usize {
        self.config.filter.window().max(N_PARAMS + 1)
    }

    /// Run the full takeover pipeline.
    pub fn run(&self, series: &[DailyProportion]) -> Result<TakeoverReport, EstimationError> {
        let config = &self.config;
        Validator::validate_daily_series(series, self.min_observations())?;

        let start = series[0].date;
        let dates: Vec<NaiveDate> = series.iter().map(|d| d.date).collect();
        let observed: Vec<f64> = series
            .iter()
            .map(|d| d.proportion().unwrap_or(f64::NAN))
            .collect();
        let t: Vec<f64> = dates
            .iter()
            .map(|&d| (d - start).num_days() as f64)
            .collect();

        let smoothed = config.filter.apply(&observed)?;

        let fit = config
            .solver
            .fit(&LogisticMixture, &t, &smoothed, &config.initial_guess)?;

        let mut params = [0.0; N_PARAMS];
        params.copy_from_slice(&fit.params);
        let mut std_errors = [0.0; N_PARAMS];
        std_errors.copy_from_slice(&fit.std_errors);

        let fitted: Vec<f64> = t.iter().map(|&ti| mixture(ti, &params)).collect();
        let diagnostics = Diagnostics::compute(&smoothed, &fitted, fit.iterations);

        let projection = Projection {
            start,
            anchor: config.anchor.unwrap_or(start),
            horizon_days: config.horizon_days,
            serial_interval: config.serial_interval,
            policy: config.policy,
            growth_term: config.growth_term,
        };
        let (estimates, trajectory) = derive_estimates(&params, &std_errors, &projection);

        info!(
            days = series.len(),
            iterations = fit.iterations,
            rmse = diagnostics.rmse,
            growth_rate = estimates.growth_rate.estimate,
            "takeover pipeline complete"
        );

        Ok(TakeoverReport {
            dates,
            observed,
            smoothed,
            fit: MixtureFit {
                params,
                covariance: fit.covariance,
                std_errors,
                termination: fit.termination,
                diagnostics,
            },
            estimates,
            trajectory,
        })
    }
}
