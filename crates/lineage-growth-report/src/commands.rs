use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context;
use lineage_growth::prelude::*;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::cli::{GrowthArgs, TakeoverArgs};
use crate::config::ReportConfig;
use crate::output;

fn open(path: &Path) -> anyhow::Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    Ok(BufReader::new(file))
}

/// Build the reference tables from the optional files in `args`.
pub fn load_references(args: &GrowthArgs) -> anyhow::Result<ReferenceTables> {
    let mut references = ReferenceTables::with_defaults();

    if let Some(path) = &args.forced {
        let labels = parse_lineage_list(open(path)?)
            .with_context(|| format!("invalid lineage list {}", path.display()))?;
        references = references.forced(labels);
    }
    if let Some(path) = &args.variant_names {
        let names = parse_variant_names(open(path)?)
            .with_context(|| format!("invalid variant names {}", path.display()))?;
        references = references.variant_names(names);
    }
    if let Some(path) = &args.aliases {
        let aliases = AliasTable::from_json_reader(open(path)?)
            .with_context(|| format!("invalid alias key {}", path.display()))?;
        references = references.aliases(aliases);
    }

    Ok(references)
}

/// Run the growth-rate pipeline for every requested region.
pub fn growth(args: &GrowthArgs, config: &ReportConfig, out_dir: &Path) -> anyhow::Result<()> {
    let references = load_references(args)?;
    let model = GrowthRates::from_config(&config.growth_with(args))
        .build()
        .context("invalid growth-rate settings")?;

    let records = read_sequences(open(&args.sequences)?, &SequenceColumns::default())
        .with_context(|| format!("failed to read {}", args.sequences.display()))?;
    info!(records = records.len(), regions = args.regions.len(), "sequences loaded");

    let results: Vec<(String, Result<GrowthReport, EstimationError>)> = args
        .regions
        .par_iter()
        .map(|region| {
            let subset: Vec<SequenceRecord> =
                filter_region(&records, region).into_iter().cloned().collect();
            (region.clone(), model.estimate(&subset, &references))
        })
        .collect();

    for (region, report) in completed_regions(results, args.allow_partial)? {
        let slug = output::region_slug(&region);
        output::write_growth_rates(
            out_dir,
            &format!("{slug}_growth_rates.csv"),
            &report.summary.filtered,
        )?;
        output::write_growth_rates(
            out_dir,
            &format!("{slug}_growth_rates_full.csv"),
            &report.summary.full,
        )?;
        output::write_proportions(out_dir, &format!("{slug}_proportions.csv"), &report.proportions)?;
        println!("{region}\n{report}");
    }
    Ok(())
}

/// Split per-region results into the completed reports.
///
/// Any failed region is an error naming every failure, unless
/// `allow_partial` is set and at least one region completed.
fn completed_regions<T>(
    results: Vec<(String, Result<T, EstimationError>)>,
    allow_partial: bool,
) -> anyhow::Result<Vec<(String, T)>> {
    let total = results.len();
    let mut completed = Vec::with_capacity(total);
    let mut failures = Vec::new();
    for (region, result) in results {
        match result {
            Ok(report) => completed.push((region, report)),
            Err(error) => failures.push(format!("{region}: {error}")),
        }
    }

    if failures.is_empty() {
        return Ok(completed);
    }
    if allow_partial && !completed.is_empty() {
        for failure in &failures {
            warn!(%failure, "growth-rate pipeline failed; continuing with remaining regions");
        }
        return Ok(completed);
    }
    anyhow::bail!(
        "growth-rate pipeline failed for {} of {} regions: {}",
        failures.len(),
        total,
        failures.join("; ")
    )
}

/// Run the takeover pipeline.
pub fn takeover(args: &TakeoverArgs, config: &ReportConfig, out_dir: &Path) -> anyhow::Result<()> {
    let model = Takeover::from_config(&config.takeover_with(args))
        .build()
        .context("invalid takeover settings")?;

    let columns = DailyColumns {
        date: args.date_column.clone(),
        numerator: args.numerator_column.clone(),
        denominator: args.denominator_column.clone(),
    };
    let series = read_daily(open(&args.series)?, &columns)
        .with_context(|| format!("failed to read {}", args.series.display()))?;

    let report = model.fit(&series).context("takeover fit failed")?;

    output::write_estimates(out_dir, "takeover_estimates.csv", &report.estimates)?;
    output::write_trajectory(out_dir, "takeover_trajectory.csv", &report.trajectory)?;
    println!("{report}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;

    use lineage_growth::prelude::EstimationError;

    use super::{completed_regions, growth, load_references};
    use crate::cli::GrowthArgs;
    use crate::config::ReportConfig;

    fn args() -> GrowthArgs {
        GrowthArgs {
            sequences: PathBuf::from("sequences.csv"),
            regions: vec!["San Diego".into()],
            forced: None,
            variant_names: None,
            aliases: None,
            min_count: None,
            window_weeks: None,
            required_weeks: None,
            top_n: None,
            allow_partial: false,
        }
    }

    /// Two regions: "Alpha" has three qualifying weeks, "Beta" only one.
    fn two_region_sequences() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "ID,collection_date,epiweek,lineage,state").expect("write header");
        let weeks = [
            ("Alpha", "2022-06-06", 8, 2),
            ("Alpha", "2022-06-13", 6, 4),
            ("Alpha", "2022-06-20", 4, 6),
            ("Beta", "2022-06-06", 5, 5),
        ];
        for (region, date, ba2, ba5) in weeks {
            for i in 0..ba2 {
                writeln!(file, "{region}-{date}-a{i},{date},,BA.2,{region}").expect("write row");
            }
            for i in 0..ba5 {
                writeln!(file, "{region}-{date}-b{i},{date},,BA.5,{region}").expect("write row");
            }
        }
        file
    }

    fn small_window_config() -> ReportConfig {
        let mut config = ReportConfig::default();
        config.growth.min_week_count = Some(5);
        config.growth.window_weeks = Some(2);
        config.growth.min_count = Some(1);
        config
    }

    #[test]
    fn reference_files_override_defaults() {
        let mut forced = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(forced, "BA.2.12.1\n\nXBB.1.5").expect("write forced list");
        let mut names = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(names, "XBB.1.5,Kraken").expect("write names");

        let mut args = args();
        args.forced = Some(forced.path().to_path_buf());
        args.variant_names = Some(names.path().to_path_buf());

        let references = load_references(&args).expect("reference files load");
        assert!(references.is_forced("XBB.1.5"));
        assert!(references.is_forced("BA.2.12.1"));
        assert_eq!(references.variant_name("XBB.1.5"), Some("Kraken"));
    }

    #[test]
    fn missing_reference_file_is_reported() {
        let mut args = args();
        args.forced = Some(PathBuf::from("/nonexistent/forced.txt"));
        let error = load_references(&args).expect_err("missing file fails");
        assert!(format!("{error:#}").contains("/nonexistent/forced.txt"));
    }

    #[test]
    fn any_failed_region_fails_the_run() {
        let results: Vec<(String, Result<u32, EstimationError>)> = vec![
            ("Alpha".into(), Ok(1)),
            ("Beta".into(), Err(EstimationError::InsufficientWeeks { got: 1, min: 2 })),
        ];
        let error = completed_regions(results, false).expect_err("partial failure is an error");
        let message = format!("{error:#}");
        assert!(message.contains("1 of 2 regions"));
        assert!(message.contains("Beta"));
    }

    #[test]
    fn allow_partial_keeps_completed_regions() {
        let results: Vec<(String, Result<u32, EstimationError>)> = vec![
            ("Alpha".into(), Ok(1)),
            ("Beta".into(), Err(EstimationError::EmptyInput)),
        ];
        let completed = completed_regions(results, true).expect("partial run allowed");
        assert_eq!(completed, vec![("Alpha".to_string(), 1)]);

        let results: Vec<(String, Result<u32, EstimationError>)> =
            vec![("Beta".into(), Err(EstimationError::EmptyInput))];
        assert!(completed_regions(results, true).is_err());
    }

    #[test]
    fn growth_run_fails_when_one_region_fails() {
        let sequences = two_region_sequences();
        let out_dir = tempfile::tempdir().expect("temp dir");
        let mut args = args();
        args.sequences = sequences.path().to_path_buf();
        args.regions = vec!["Alpha".into(), "Beta".into()];

        let error = growth(&args, &small_window_config(), out_dir.path())
            .expect_err("Beta has too few weeks");
        assert!(format!("{error:#}").contains("Beta"));
        assert!(!out_dir.path().join("alpha_growth_rates.csv").exists());

        args.allow_partial = true;
        growth(&args, &small_window_config(), out_dir.path()).expect("partial run allowed");
        assert!(out_dir.path().join("alpha_growth_rates.csv").exists());
        assert!(!out_dir.path().join("beta_growth_rates.csv").exists());
    }
}
