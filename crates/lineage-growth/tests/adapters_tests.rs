#![cfg(feature = "dev")]
//! Tests for the tabular input loaders.
//!
//! ## Test Organization
//!
//! 1. **Sequence Records** - Column mapping, epiweek derivation, skipped rows
//! 2. **Daily Series** - Numeric parsing and custom columns
//! 3. **Errors** - Missing columns and malformed fields, including epiweeks

use chrono::NaiveDate;

use lineage_growth::internals::primitives::errors::EstimationError;
use lineage_growth::prelude::{read_daily, read_sequences, DailyColumns, SequenceColumns};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ============================================================================
// Sequence Record Tests
// ============================================================================

/// Test that empty epiweek cells are derived from the collection date.
#[test]
fn test_sequences_derive_epiweek() {
    let csv = "ID,collection_date,epiweek,lineage,state\n\
               s1,2022-06-08,,BA.5.2.1,San Diego\n\
               s2,2022-06-13,,BQ.1,San Diego\n";
    let records = read_sequences(csv.as_bytes(), &SequenceColumns::default()).unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].epiweek, date(2022, 6, 5));
    assert_eq!(records[1].epiweek, date(2022, 6, 12));
    assert_eq!(records[1].lineage, "BQ.1");
    assert_eq!(records[0].region, "San Diego");
}

/// Test that a present epiweek column is used, and empty cells fall back.
#[test]
fn test_sequences_epiweek_column() {
    let csv = "ID,collection_date,epiweek,lineage,state\n\
               s1,2022-06-08,2022-06-05,BA.5,CA\n\
               s2,2022-06-09,,BA.5,CA\n";
    let records = read_sequences(csv.as_bytes(), &SequenceColumns::default()).unwrap();

    assert_eq!(records[0].epiweek, date(2022, 6, 5));
    assert_eq!(records[1].epiweek, date(2022, 6, 5));
}

/// Test that rows without a lineage are skipped.
#[test]
fn test_sequences_skip_empty_lineage() {
    let csv = "ID,collection_date,epiweek,lineage,state\n\
               s1,2022-06-08,,,San Diego\n\
               s2,2022-06-08,,BA.2,San Diego\n";
    let records = read_sequences(csv.as_bytes(), &SequenceColumns::default()).unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, "s2");
}

/// Test custom column names.
#[test]
fn test_sequences_custom_columns() {
    let csv = "strain,date,week,pango,division\nx,2022-06-08,,BA.2,Baja California\n";
    let columns = SequenceColumns {
        id: "strain".into(),
        collection_date: "date".into(),
        epiweek: "week".into(),
        lineage: "pango".into(),
        region: "division".into(),
    };
    let records = read_sequences(csv.as_bytes(), &columns).unwrap();
    assert_eq!(records[0].region, "Baja California");
}

// ============================================================================
// Daily Series Tests
// ============================================================================

/// Test reading a daily series with default columns.
#[test]
fn test_daily_default_columns() {
    let csv = "Date,sgtf_likely,total_positive\n\
               2021-12-01,5,100\n\
               2021-12-02,8.5,110\n";
    let series = read_daily(csv.as_bytes(), &DailyColumns::default()).unwrap();

    assert_eq!(series.len(), 2);
    assert_eq!(series[0].date, date(2021, 12, 1));
    assert_eq!(series[1].numerator, 8.5);
    assert_eq!(series[0].proportion(), Some(0.05));
}

// ============================================================================
// Error Tests
// ============================================================================

/// Test that a missing required column is named in the error.
#[test]
fn test_missing_column() {
    let csv = "ID,collection_date,state\ns1,2022-06-08,San Diego\n";
    let err = read_sequences(csv.as_bytes(), &SequenceColumns::default()).unwrap_err();
    assert_eq!(err, EstimationError::MissingColumn("lineage".into()));

    let csv = "Date,sgtf_likely\n2021-12-01,5\n";
    let err = read_daily(csv.as_bytes(), &DailyColumns::default()).unwrap_err();
    assert_eq!(err, EstimationError::MissingColumn("total_positive".into()));
}

/// Test that the epiweek column is required.
#[test]
fn test_missing_epiweek_column() {
    let csv = "ID,collection_date,lineage,state\ns1,2022-06-08,BA.2,San Diego\n";
    let err = read_sequences(csv.as_bytes(), &SequenceColumns::default()).unwrap_err();
    assert_eq!(err, EstimationError::MissingColumn("epiweek".into()));
}

/// Test that an epiweek that is present but not an ISO date is rejected.
#[test]
fn test_malformed_epiweek() {
    let csv = "ID,collection_date,epiweek,lineage,state\n\
               s1,2022-06-08,2022-06-05,BA.2,CA\n\
               s2,2022-06-08,06/05/2022,BA.2,CA\n";
    let err = read_sequences(csv.as_bytes(), &SequenceColumns::default()).unwrap_err();
    match err {
        EstimationError::InvalidRecord { row, reason } => {
            assert_eq!(row, 2);
            assert!(reason.contains("epiweek"));
        }
        other => panic!("expected InvalidRecord, got {other:?}"),
    }
}

/// Test malformed dates and numbers.
#[test]
fn test_malformed_fields() {
    let csv = "ID,collection_date,epiweek,lineage,state\ns1,June 8,,BA.2,CA\n";
    let err = read_sequences(csv.as_bytes(), &SequenceColumns::default()).unwrap_err();
    assert!(matches!(err, EstimationError::InvalidRecord { row: 1, .. }));

    let csv = "Date,sgtf_likely,total_positive\n2021-12-01,five,100\n";
    let err = read_daily(csv.as_bytes(), &DailyColumns::default()).unwrap_err();
    assert!(matches!(err, EstimationError::InvalidNumericValue(_)));
}
