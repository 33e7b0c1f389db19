//! Header lookup and field parsing shared by the CSV loaders.

// External dependencies
use csv::{Reader, ReaderBuilder, StringRecord};
use std::io::Read;

// Internal dependencies
use crate::primitives::dates::parse_iso_date;
use crate::primitives::errors::EstimationError;

/// Open a headered, comma-separated reader that trims whitespace.
pub fn csv_reader<R: Read>(reader: R) -> Reader<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader)
}

/// Column positions resolved from a header row.
#[derive(Debug, Clone)]
pub struct Header {
    names: Vec<String>,
}

impl Header {
    /// Read the header row.
    pub fn read<R: Read>(reader: &mut Reader<R>) -> Result<Self, EstimationError> {
        let headers = reader.headers().map_err(|e| EstimationError::InvalidRecord {
            row: 0,
            reason: e.to_string(),
        })?;
        Ok(Self {
            names: headers.iter().map(str::to_string).collect(),
        })
    }

    /// Position of a required column.
    pub fn require(&self, column: &str) -> Result<usize, EstimationError> {
        self.position(column)
            .ok_or_else(|| EstimationError::MissingColumn(column.to_string()))
    }

    /// Position of an optional column.
    pub fn position(&self, column: &str) -> Option<usize> {
        self.names.iter().position(|name| name == column)
    }
}

/// Field `idx` of `record`, or the empty string when the row is short.
pub fn field(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or("")
}

/// Parse a required date field.
pub fn date_field(
    record: &StringRecord,
    idx: usize,
    row: usize,
    column: &str,
) -> Result<chrono::NaiveDate, EstimationError> {
    let raw = field(record, idx);
    parse_iso_date(raw).ok_or_else(|| EstimationError::InvalidRecord {
        row,
        reason: format!("{} '{}' is not an ISO date", column, raw),
    })
}

/// Parse a required numeric field.
pub fn number_field(
    record: &StringRecord,
    idx: usize,
    row: usize,
    column: &str,
) -> Result<f64, EstimationError> {
    let raw = field(record, idx);
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| {
            EstimationError::InvalidNumericValue(format!("{}='{}' (row {})", column, raw, row))
        })
}

/// Convert a CSV read error into a row error.
pub fn row_error(row: usize, err: csv::Error) -> EstimationError {
    EstimationError::InvalidRecord {
        row,
        reason: err.to_string(),
    }
}
