#![cfg(feature = "dev")]
//! Tests for the high-level builders and both end-to-end pipelines.
//!
//! ## Test Organization
//!
//! 1. **Builder Validation** - Defaults, duplicates and invalid parameters
//! 2. **File Configuration** - Seeding builders from config structs
//! 3. **Growth Pipeline** - Synthetic records with a known winner, repeat
//!    runs and the filtered-table rule
//! 4. **Takeover Pipeline** - Synthetic logistic series across lengths and
//!    sampling noise, and growth-term selection

use approx::assert_relative_eq;
use chrono::{Duration, NaiveDate};
use rand::prelude::*;
use rand_distr::Binomial;

use lineage_growth::prelude::*;

// ============================================================================
// Helper Functions
// ============================================================================

fn week(offset: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 6, 5).unwrap() + Duration::weeks(offset)
}

/// `counts[w][k]` records of `labels[k]` in week `w`.
fn weekly_records(labels: &[&str], counts: &[&[usize]]) -> Vec<SequenceRecord> {
    let mut out = Vec::new();
    for (w, row) in counts.iter().enumerate() {
        for (k, &n) in row.iter().enumerate() {
            for i in 0..n {
                out.push(SequenceRecord::new(
                    format!("{}-{w}-{i}", labels[k]),
                    week(w as i64) + Duration::days((i % 7) as i64),
                    labels[k],
                    "San Diego",
                ));
            }
        }
    }
    out
}

/// Daily series following one logistic wave with `x0 = 0.001` and rate `r`.
fn logistic_series(days: usize, r: f64) -> Vec<DailyProportion> {
    let start = NaiveDate::from_ymd_opt(2021, 12, 1).unwrap();
    (0..days)
        .map(|d| {
            let t = d as f64;
            let p = 1.0 / (1.0 + 999.0 * (-r * t).exp());
            DailyProportion::new(start + Duration::days(d as i64), 1000.0 * p, 1000.0)
        })
        .collect()
}

/// Eight weeks of seeded counts over a mix of common and rare labels.
fn generated_records(seed: u64) -> Vec<SequenceRecord> {
    let labels = ["BA.2", "BA.2.12.1", "BA.4", "BA.4.6", "BA.5", "BA.5.2", "BF.7", "BQ.1.1"];
    let means = [60.0, 25.0, 12.0, 3.0, 40.0, 8.0, 2.0, 1.0];
    let mut rng = StdRng::seed_from_u64(seed);

    let mut rows: Vec<Vec<usize>> = Vec::new();
    for _ in 0..8 {
        let row = means
            .iter()
            .map(|&m| Binomial::new(4 * m as u64, 0.25).unwrap().sample(&mut rng) as usize)
            .collect();
        rows.push(row);
    }
    let row_refs: Vec<&[usize]> = rows.iter().map(|r| r.as_slice()).collect();
    weekly_records(&labels, &row_refs)
}

/// Binomially sampled daily series around one logistic wave.
fn sampled_logistic_series(days: usize, r: f64, per_day: u64, seed: u64) -> Vec<DailyProportion> {
    let mut rng = StdRng::seed_from_u64(seed);
    logistic_series(days, r)
        .into_iter()
        .map(|day| {
            let p = day.numerator / day.denominator;
            let hits = Binomial::new(per_day, p).unwrap().sample(&mut rng);
            DailyProportion::new(day.date, hits as f64, per_day as f64)
        })
        .collect()
}

fn generated_model() -> GrowthRateModel {
    GrowthRates::new()
        .min_week_count(20)
        .window_weeks(8)
        .min_count(10)
        .build()
        .unwrap()
}

// ============================================================================
// Builder Validation Tests
// ============================================================================

/// Test that defaults resolve as documented.
#[test]
fn test_growth_builder_defaults() {
    let model = GrowthRates::new().build().unwrap();
    let config = model.config();

    assert_eq!(config.window_weeks, 8);
    assert_eq!(config.required_weeks, 8);
    assert_eq!(config.min_week_count, 100);
    assert_eq!(config.collapse.min_count, 50);
    assert_eq!(config.summary.top_n, 5);
}

/// Test that setting a parameter twice is reported at build time.
#[test]
fn test_duplicate_parameter() {
    let err = GrowthRates::new().min_count(10).min_count(20).build().unwrap_err();
    assert_eq!(err, EstimationError::DuplicateParameter { parameter: "min_count" });

    let err = Takeover::new().horizon_days(100).horizon_days(200).build().unwrap_err();
    assert_eq!(err, EstimationError::DuplicateParameter { parameter: "horizon_days" });
}

/// Test rejection of out-of-range parameters.
#[test]
fn test_invalid_parameters() {
    assert!(matches!(
        GrowthRates::new().window_weeks(1).build(),
        Err(EstimationError::InvalidParameter { parameter: "window_weeks", .. })
    ));
    assert!(matches!(
        GrowthRates::new().window_weeks(4).required_weeks(6).build(),
        Err(EstimationError::InvalidParameter { parameter: "required_weeks", .. })
    ));
    assert!(matches!(
        GrowthRates::new().inverse_regularization(0.0).build(),
        Err(EstimationError::InvalidParameter { parameter: "inverse_regularization", .. })
    ));
    assert!(matches!(
        Takeover::new().filter_window(4).build(),
        Err(EstimationError::InvalidParameter { .. })
    ));
    assert!(matches!(
        Takeover::new().initial_guess([0.0, 0.1, 0.001, 0.1, 0.001, 0.1]).build(),
        Err(EstimationError::InvalidParameter { parameter: "initial_guess", .. })
    ));
    assert!(matches!(
        Takeover::new().serial_interval(-1.0).build(),
        Err(EstimationError::InvalidParameter { parameter: "serial_interval", .. })
    ));
    for term in [0, 4] {
        assert!(matches!(
            Takeover::new().growth_term(term).build(),
            Err(EstimationError::InvalidParameter { parameter: "growth_term", .. })
        ));
    }
}

// ============================================================================
// File Configuration Tests
// ============================================================================

/// Test seeding builders from deserialized configuration.
#[test]
fn test_from_config() {
    let growth: GrowthConfig =
        serde_json::from_str(r#"{"min_count": 20, "window_weeks": 4}"#).unwrap();
    let model = GrowthRates::from_config(&growth).build().unwrap();
    assert_eq!(model.config().collapse.min_count, 20);
    assert_eq!(model.config().required_weeks, 4);

    let takeover: TakeoverConfig =
        serde_json::from_str(r#"{"perturbation": "symmetric", "horizon_days": 200}"#).unwrap();
    let model = Takeover::from_config(&takeover).build().unwrap();
    assert_eq!(model.config().policy, PerturbationPolicy::symmetric());
    assert_eq!(model.config().horizon_days, 200);

    assert!(serde_json::from_str::<GrowthConfig>(r#"{"min_cuont": 20}"#).is_err());
}

// ============================================================================
// Growth Pipeline Tests
// ============================================================================

/// Test that a lineage displacing another gets the larger growth rate.
#[test]
fn test_growth_pipeline_ranks_winner() {
    let records = weekly_records(
        &["BA.2", "BA.5"],
        &[&[80, 20], &[60, 40], &[40, 60], &[20, 80]],
    );
    let model = GrowthRates::new()
        .min_week_count(50)
        .window_weeks(4)
        .build()
        .unwrap();

    let report = model.estimate(&records, &ReferenceTables::new()).unwrap();

    assert_eq!(report.window.len(), 4);
    assert!(report.growth_rate("BA.5").unwrap() > 0.0);
    assert!(report.growth_rate("BA.2").unwrap() < 0.0);
    assert!(report.proportions.max_row_sum_error() < 1e-10);

    let top = &report.summary.full[0];
    assert_eq!(top.lineage, "BA.5");
    assert_eq!(top.total_count, 200);
    assert_eq!(top.recent_count, 200);
    assert_eq!(report.summary.filtered.len(), 2);
}

/// Test growth-rate recovery from binomially sampled weekly shares.
///
/// The rising lineage's log-odds grow by 0.05 per day.
#[test]
fn test_growth_pipeline_sampled_shares() {
    let mut rng = StdRng::seed_from_u64(42);
    let per_week = 300_u64;
    let slope = 0.05;

    let mut rows: Vec<[usize; 2]> = Vec::new();
    for w in 0..6 {
        let eta = slope * (7.0 * w as f64) - 1.0;
        let p = 1.0 / (1.0 + (-eta).exp());
        let rising = Binomial::new(per_week, p).unwrap().sample(&mut rng) as usize;
        rows.push([per_week as usize - rising, rising]);
    }
    let row_refs: Vec<&[usize]> = rows.iter().map(|r| r.as_slice()).collect();
    let records = weekly_records(&["BA.2", "BA.5"], &row_refs);

    let report = GrowthRates::new()
        .window_weeks(6)
        .build()
        .unwrap()
        .estimate(&records, &ReferenceTables::new())
        .unwrap();

    assert_relative_eq!(report.growth_rate("BA.5").unwrap(), slope, max_relative = 0.3);
    assert_relative_eq!(report.growth_rate("BA.2").unwrap(), -slope, max_relative = 0.3);
}

/// Test that running the pipeline twice, or again on its own collapsed
/// labels, reproduces the report.
#[test]
fn test_growth_pipeline_idempotent() {
    let records = generated_records(7);
    let references = ReferenceTables::new().forced(["BA.4.6"]);
    let model = generated_model();

    let first = model.estimate(&records, &references).unwrap();
    let second = model.estimate(&records, &references).unwrap();
    assert_eq!(first, second);

    let relabelled: Vec<SequenceRecord> = records
        .iter()
        .map(|r| SequenceRecord {
            lineage: first.collapse.resolve(&r.lineage).to_string(),
            ..r.clone()
        })
        .collect();
    let again = model.estimate(&relabelled, &references).unwrap();

    assert_eq!(again.window, first.window);
    assert_eq!(
        again.growth_rates.keys().collect::<Vec<_>>(),
        first.growth_rates.keys().collect::<Vec<_>>()
    );
    for (label, rate) in &first.growth_rates {
        assert_relative_eq!(again.growth_rates[label], *rate, epsilon = 1e-9);
    }
}

/// Test that every filtered row has more than five recent records or is on
/// the forced list.
#[test]
fn test_growth_pipeline_filtered_rows() {
    let references = ReferenceTables::new().forced(["BA.4.6", "BF.7"]);
    let model = generated_model();

    for seed in 0..8 {
        let report = model.estimate(&generated_records(seed), &references).unwrap();
        let filtered = &report.summary.filtered;
        assert!(!filtered.is_empty());

        for entry in filtered {
            assert!(
                entry.recent_count > 5 || references.is_forced(&entry.lineage),
                "seed {seed}: {} has {} recent records",
                entry.lineage,
                entry.recent_count
            );
            assert!(report.summary.full.contains(entry));
        }
    }
}

/// Test that too few qualifying weeks is an input-shape error.
#[test]
fn test_growth_pipeline_insufficient_weeks() {
    let records = weekly_records(&["BA.2", "BA.5"], &[&[80, 30], &[60, 50], &[5, 5]]);
    let model = GrowthRates::new()
        .min_week_count(50)
        .window_weeks(4)
        .required_weeks(3)
        .build()
        .unwrap();

    let err = model.estimate(&records, &ReferenceTables::new()).unwrap_err();
    assert_eq!(err, EstimationError::InsufficientWeeks { got: 2, min: 3 });
    assert!(!err.is_fit_failure());
}

/// Test that an empty record set is rejected.
#[test]
fn test_growth_pipeline_empty() {
    let model = GrowthRates::new().build().unwrap();
    let err = model.estimate(&[], &ReferenceTables::new()).unwrap_err();
    assert_eq!(err, EstimationError::EmptyInput);
}

// ============================================================================
// Takeover Pipeline Tests
// ============================================================================

/// Test that the fitted growth rate and doubling time recover the true wave.
#[test]
fn test_takeover_recovers_logistic() {
    let series = logistic_series(120, 0.1);
    let report = Takeover::new().build().unwrap().fit(&series).unwrap();

    let growth = report.estimates.growth_rate.estimate;
    assert_relative_eq!(growth, 0.1, max_relative = 0.1);

    let doubling = report.estimates.doubling_time.estimate;
    assert_relative_eq!(doubling, std::f64::consts::LN_2 / 0.1, max_relative = 0.1);

    assert!(report.estimates.date50.estimate.is_some());
    assert!(report.estimates.date99.estimate >= report.estimates.date50.estimate);
    assert_eq!(report.trajectory.len(), 400);
    assert_eq!(report.smoothed.len(), series.len());
}

/// Test that noise-free waves of every length from 20 to 200 days fit, and
/// that the tracked term recovers the rate once the wave is under way.
#[test]
fn test_takeover_fits_across_lengths() {
    let model = Takeover::new().build().unwrap();

    for days in (20..=200).step_by(5) {
        let series = logistic_series(days, 0.1);
        let report = match model.fit(&series) {
            Ok(report) => report,
            Err(err) => panic!("{days} days: {err}"),
        };
        assert!(report.fit.diagnostics.rmse.is_finite());

        if days >= 60 {
            let growth = report.estimates.growth_rate.estimate;
            assert_relative_eq!(growth, 0.1, max_relative = 0.1);
        }
    }
}

/// Test growth-rate recovery from binomially sampled daily shares.
///
/// Each day draws 400 sequences; every seed must fit and put the wave's rate
/// in the reported term.
#[test]
fn test_takeover_sampled_shares() {
    let model = Takeover::new().build().unwrap();

    for seed in 0..8 {
        let series = sampled_logistic_series(100, 0.1, 400, seed);
        let report = match model.fit(&series) {
            Ok(report) => report,
            Err(err) => panic!("seed {seed}: {err}"),
        };

        let growth = report.estimates.growth_rate.estimate;
        assert!(
            (growth - 0.1).abs() <= 0.025,
            "seed {seed}: growth rate {growth}"
        );
    }
}

/// Test that the reported rate is the rate of the selected term.
#[test]
fn test_takeover_growth_term() {
    let series = logistic_series(120, 0.1);

    for term in 1..=3 {
        let report = Takeover::new().growth_term(term).build().unwrap().fit(&series).unwrap();
        assert_eq!(report.estimates.growth_rate.estimate, report.fit.params[2 * term - 1]);
    }

    let config: TakeoverConfig = serde_json::from_str(r#"{"growth_term": 2}"#).unwrap();
    assert_eq!(Takeover::from_config(&config).build().unwrap().config().growth_term, 2);
}

/// Test that the fitted covariance is symmetric with non-negative variances.
#[test]
fn test_takeover_covariance_well_formed() {
    let series = logistic_series(120, 0.1);
    let report = Takeover::new().build().unwrap().fit(&series).unwrap();

    let cov = &report.fit.covariance;
    for i in 0..6 {
        assert!(cov[[i, i]] >= 0.0);
        assert!(report.fit.std_errors[i] >= 0.0);
        for j in 0..6 {
            assert_eq!(cov[[i, j]], cov[[j, i]]);
        }
    }
    for point in &report.trajectory {
        assert!(point.fit_lower <= point.fit_upper);
    }
}

/// Test input checks on the daily series.
#[test]
fn test_takeover_invalid_series() {
    let model = Takeover::new().build().unwrap();

    let short = logistic_series(4, 0.1);
    assert!(matches!(
        model.fit(&short),
        Err(EstimationError::TooFewObservations { got: 4, .. })
    ));

    let mut unsorted = logistic_series(20, 0.1);
    unsorted.swap(3, 4);
    assert_eq!(model.fit(&unsorted).unwrap_err(), EstimationError::UnsortedDates { index: 4 });

    let mut zero = logistic_series(20, 0.1);
    zero[5].denominator = 0.0;
    assert!(matches!(model.fit(&zero), Err(EstimationError::InvalidNumericValue(_))));
}
