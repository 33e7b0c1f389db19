use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::Context;
use lineage_growth::prelude::{GrowthRateEntry, ProportionTable, TakeoverEstimates, TrajectoryPoint};
use serde::Serialize;

/// File-name stem for a region: lowercase, non-alphanumerics become `_`.
pub fn region_slug(region: &str) -> String {
    region
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

fn create(dir: &Path, name: &str) -> anyhow::Result<(PathBuf, File)> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let path = dir.join(name);
    let file = File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
    Ok((path, file))
}

/// Write serializable rows as CSV.
pub fn write_rows<T: Serialize>(dir: &Path, name: &str, rows: &[T]) -> anyhow::Result<PathBuf> {
    let (path, file) = create(dir, name)?;
    let mut writer = csv::Writer::from_writer(file);
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    writer.flush()?;
    Ok(path)
}

/// Write a growth-rate table.
pub fn write_growth_rates(dir: &Path, name: &str, rows: &[GrowthRateEntry]) -> anyhow::Result<PathBuf> {
    write_rows(dir, name, rows)
}

/// Write the weekly proportion table, one row per week.
pub fn write_proportions(dir: &Path, name: &str, table: &ProportionTable) -> anyhow::Result<PathBuf> {
    let (path, file) = create(dir, name)?;
    let mut writer = csv::Writer::from_writer(file);

    let mut header = vec!["week".to_string()];
    header.extend(table.labels.iter().cloned());
    writer.write_record(&header)?;

    for (i, week) in table.weeks.iter().enumerate() {
        let mut row = vec![week.to_string()];
        row.extend(table.values.row(i).iter().map(|v| v.to_string()));
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(path)
}

/// Write the takeover estimate table.
pub fn write_estimates(dir: &Path, name: &str, estimates: &TakeoverEstimates) -> anyhow::Result<PathBuf> {
    write_rows(dir, name, &estimates.rows())
}

/// Write the fitted trajectory.
pub fn write_trajectory(dir: &Path, name: &str, points: &[TrajectoryPoint]) -> anyhow::Result<PathBuf> {
    write_rows(dir, name, points)
}
