//! Lineage growth and takeover benchmarks using Criterion.
//!
//! Benchmarks cover:
//! - Growth pipeline scalability (1K to 100K records)
//! - Individual stages (week selection, collapsing, proportion model)
//! - Takeover pipeline over short and long daily series
//! - Pathological cases (many rare labels, flat series)

use chrono::{Duration, NaiveDate};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use lineage_growth::internals::algorithms::collapse::{CollapseConfig, collapse_lineages};
use lineage_growth::internals::algorithms::multinomial::{MultinomialConfig, estimate_proportions};
use lineage_growth::internals::algorithms::window::select_weeks;
use lineage_growth::prelude::*;
use rand::prelude::*;
use rand_distr::{Binomial, Normal};
use std::hint::black_box;

// ============================================================================
// Data Generation with Reproducible RNG
// ============================================================================

const LINEAGES: [&str; 8] = [
    "BA.2",
    "BA.2.12.1",
    "BA.5",
    "BA.5.2",
    "BA.5.2.1",
    "BQ.1",
    "BQ.1.1",
    "XBB.1.5",
];

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 6, 5).unwrap_or_default()
}

/// Generate sequence records over `weeks` weeks with lineages drifting
/// towards the end of the label list.
fn generate_records(size: usize, weeks: i64, seed: u64) -> Vec<SequenceRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 0.5).unwrap();
    let start = start_date();

    (0..size)
        .map(|i| {
            let day = rng.random_range(0..weeks * 7);
            let drift = day as f64 / (weeks * 7) as f64 * (LINEAGES.len() - 1) as f64;
            let idx = (drift + noise.sample(&mut rng))
                .round()
                .clamp(0.0, (LINEAGES.len() - 1) as f64) as usize;
            SequenceRecord::new(
                format!("seq{i}"),
                start + Duration::days(day),
                LINEAGES[idx],
                "San Diego",
            )
        })
        .collect()
}

/// Generate records where most labels are unique sub-lineages.
fn generate_rare_label_records(size: usize, seed: u64) -> Vec<SequenceRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = start_date();

    (0..size)
        .map(|i| {
            let day = rng.random_range(0..56);
            let base = LINEAGES[rng.random_range(0..LINEAGES.len())];
            let lineage = format!("{base}.{}", rng.random_range(1..200));
            SequenceRecord::new(format!("seq{i}"), start + Duration::days(day), lineage, "San Diego")
        })
        .collect()
}

/// Generate a daily SGTF-like series from a logistic curve with binomial noise.
fn generate_daily_series(days: usize, seed: u64) -> Vec<DailyProportion> {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = start_date();
    let total = 400_u64;

    (0..days)
        .map(|d| {
            let p = 0.001 / (0.001 + 0.999 * (-0.2 * d as f64).exp());
            let hits = Binomial::new(total, p.clamp(0.0, 1.0)).unwrap().sample(&mut rng);
            DailyProportion::new(start + Duration::days(d as i64), hits as f64, total as f64)
        })
        .collect()
}

// ============================================================================
// Benchmark Functions
// ============================================================================

fn bench_growth_scalability(c: &mut Criterion) {
    let mut group = c.benchmark_group("growth_scalability");
    group.sample_size(20);
    let references = ReferenceTables::with_defaults();

    for size in [1_000, 10_000, 100_000] {
        let records = generate_records(size, 12, 42);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("pipeline", size), &size, |b, _| {
            b.iter(|| {
                GrowthRates::new()
                    .min_count(10)
                    .build()
                    .unwrap()
                    .estimate(black_box(&records), &references)
                    .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_growth_stages(c: &mut Criterion) {
    let mut group = c.benchmark_group("growth_stages");
    let references = ReferenceTables::with_defaults();
    let records = generate_records(20_000, 12, 7);
    let window = select_weeks(&records, 20, 8);
    let config = CollapseConfig::default();
    let map = collapse_lineages(&records, &window, &references, &config);

    group.bench_function("select_weeks", |b| {
        b.iter(|| select_weeks(black_box(&records), 20, 8))
    });

    group.bench_function("collapse", |b| {
        b.iter(|| collapse_lineages(black_box(&records), &window, &references, &config))
    });

    group.bench_function("proportions", |b| {
        b.iter(|| {
            estimate_proportions(black_box(&records), &window, &map, &MultinomialConfig::default())
                .unwrap()
        })
    });

    group.finish();
}

fn bench_takeover(c: &mut Criterion) {
    let mut group = c.benchmark_group("takeover");
    group.sample_size(30);

    for days in [60, 120, 240] {
        let series = generate_daily_series(days, 42);

        group.bench_with_input(BenchmarkId::new("fit", days), &days, |b, _| {
            b.iter(|| Takeover::new().build().unwrap().fit(black_box(&series)).unwrap())
        });
    }
    group.finish();
}

fn bench_pathological(c: &mut Criterion) {
    let mut group = c.benchmark_group("pathological");
    group.sample_size(20);
    let references = ReferenceTables::with_defaults();

    // Many rare labels force several collapsing rounds
    let rare = generate_rare_label_records(20_000, 42);
    group.bench_function("rare_labels", |b| {
        b.iter(|| {
            GrowthRates::new()
                .min_count(20)
                .build()
                .unwrap()
                .estimate(black_box(&rare), &references)
                .unwrap()
        })
    });

    // Flat series
    let start = start_date();
    let flat: Vec<DailyProportion> = (0..90)
        .map(|d| DailyProportion::new(start + Duration::days(d), 40.0, 400.0))
        .collect();
    group.bench_function("flat_series", |b| {
        b.iter(|| Takeover::new().build().unwrap().fit(black_box(&flat)))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_growth_scalability,
    bench_growth_stages,
    bench_takeover,
    bench_pathological,
);

criterion_main!(benches);
