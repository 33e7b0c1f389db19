//! Daily proportion loader.
//!
//! Reads one row per reporting day with a numerator column (tests showing
//! the signal) and a denominator column (all positive tests). Rows are kept
//! in file order; ordering is checked by the takeover pipeline.

// External dependencies
use std::fs::File;
use std::io::Read;
use std::path::Path;

// Internal dependencies
use crate::adapters::tabular::{csv_reader, date_field, number_field, row_error, Header};
use crate::primitives::errors::EstimationError;
use crate::primitives::records::DailyProportion;

/// Column names of a daily proportion file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyColumns {
    /// Reporting date.
    pub date: String,
    /// Signal count.
    pub numerator: String,
    /// Total count.
    pub denominator: String,
}

impl Default for DailyColumns {
    fn default() -> Self {
        Self {
            date: "Date".into(),
            numerator: "sgtf_likely".into(),
            denominator: "total_positive".into(),
        }
    }
}

/// Read a daily proportion series from CSV.
pub fn read_daily<R: Read>(
    reader: R,
    columns: &DailyColumns,
) -> Result<Vec<DailyProportion>, EstimationError> {
    let mut csv = csv_reader(reader);
    let header = Header::read(&mut csv)?;

    let date = header.require(&columns.date)?;
    let numerator = header.require(&columns.numerator)?;
    let denominator = header.require(&columns.denominator)?;

    let mut series = Vec::new();
    for (idx, row) in csv.records().enumerate() {
        let row_number = idx + 1;
        let row = row.map_err(|e| row_error(row_number, e))?;
        series.push(DailyProportion::new(
            date_field(&row, date, row_number, &columns.date)?,
            number_field(&row, numerator, row_number, &columns.numerator)?,
            number_field(&row, denominator, row_number, &columns.denominator)?,
        ));
    }
    Ok(series)
}

/// Read a daily proportion series from a CSV file.
pub fn read_daily_path<P: AsRef<Path>>(
    path: P,
    columns: &DailyColumns,
) -> Result<Vec<DailyProportion>, EstimationError> {
    let file = File::open(path.as_ref()).map_err(|e| EstimationError::InvalidRecord {
        row: 0,
        reason: format!("{}: {}", path.as_ref().display(), e),
    })?;
    read_daily(file, columns)
}
