//! Sequence record loader.
//!
//! Reads one row per sequenced sample. Every column is required; an empty
//! epiweek cell is derived from the collection date, while text that is not
//! an ISO date is an error.

// External dependencies
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

// Internal dependencies
use crate::adapters::tabular::{csv_reader, date_field, field, row_error, Header};
use crate::primitives::dates::epiweek_start;
use crate::primitives::errors::EstimationError;
use crate::primitives::records::SequenceRecord;

/// Column names of a sequence record file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceColumns {
    /// Sample identifier.
    pub id: String,
    /// Collection date.
    pub collection_date: String,
    /// Epiweek start date; empty cells are derived.
    pub epiweek: String,
    /// Lineage label.
    pub lineage: String,
    /// Region or state tag.
    pub region: String,
}

impl Default for SequenceColumns {
    fn default() -> Self {
        Self {
            id: "ID".into(),
            collection_date: "collection_date".into(),
            epiweek: "epiweek".into(),
            lineage: "lineage".into(),
            region: "state".into(),
        }
    }
}

/// Read sequence records from CSV.
///
/// Rows with an empty lineage are skipped; unparseable dates are errors.
/// A missing column is [`EstimationError::MissingColumn`].
pub fn read_sequences<R: Read>(
    reader: R,
    columns: &SequenceColumns,
) -> Result<Vec<SequenceRecord>, EstimationError> {
    let mut csv = csv_reader(reader);
    let header = Header::read(&mut csv)?;

    let id = header.require(&columns.id)?;
    let collection_date = header.require(&columns.collection_date)?;
    let lineage = header.require(&columns.lineage)?;
    let region = header.require(&columns.region)?;
    let epiweek = header.require(&columns.epiweek)?;

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for (idx, row) in csv.records().enumerate() {
        let row_number = idx + 1;
        let row = row.map_err(|e| row_error(row_number, e))?;

        let label = field(&row, lineage);
        if label.is_empty() {
            skipped += 1;
            continue;
        }

        let date = date_field(&row, collection_date, row_number, &columns.collection_date)?;
        let week = if field(&row, epiweek).is_empty() {
            epiweek_start(date)
        } else {
            date_field(&row, epiweek, row_number, &columns.epiweek)?
        };

        records.push(SequenceRecord {
            id: field(&row, id).to_string(),
            collection_date: date,
            epiweek: week,
            lineage: label.to_string(),
            region: field(&row, region).to_string(),
        });
    }

    debug!(records = records.len(), skipped, "sequence records loaded");
    Ok(records)
}

/// Read sequence records from a CSV file.
pub fn read_sequences_path<P: AsRef<Path>>(
    path: P,
    columns: &SequenceColumns,
) -> Result<Vec<SequenceRecord>, EstimationError> {
    let file = File::open(path.as_ref()).map_err(|e| EstimationError::InvalidRecord {
        row: 0,
        reason: format!("{}: {}", path.as_ref().display(), e),
    })?;
    read_sequences(file, columns)
}
