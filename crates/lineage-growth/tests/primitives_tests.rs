#![cfg(feature = "dev")]
//! Tests for records, calendar helpers, lineage labels and reference tables.
//!
//! ## Test Organization
//!
//! 1. **Dates** - Day numbers, epiweeks and ISO parsing
//! 2. **Labels** - Parent, top level and alias shape
//! 3. **Alias Table** - Decompression, family re-compression, JSON loading
//! 4. **Reference Parsers** - Lineage lists and variant names
//! 5. **Records** - Proportions and region filtering

use chrono::NaiveDate;

use lineage_growth::internals::primitives::dates::{
    day_number, epiweek_start, parse_iso_date,
};
use lineage_growth::internals::primitives::errors::EstimationError;
use lineage_growth::internals::primitives::lineage::{
    has_parent, is_two_letter_alias, parent, top_level,
};
use lineage_growth::prelude::{
    filter_region, parse_lineage_list, parse_variant_names, AliasTable, DailyProportion,
    SequenceRecord,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ============================================================================
// Date Tests
// ============================================================================

/// Test day numbers counted from 1970-01-01.
#[test]
fn test_day_numbers() {
    assert_eq!(day_number(date(1970, 1, 1)), 0.0);
    assert_eq!(day_number(date(1970, 1, 8)), 7.0);
    assert_eq!(day_number(date(2022, 1, 8)), 19_000.0);
}

/// Test that epiweeks start on Sunday.
#[test]
fn test_epiweek_start() {
    // 2022-06-08 is a Wednesday
    assert_eq!(epiweek_start(date(2022, 6, 8)), date(2022, 6, 5));
    assert_eq!(epiweek_start(date(2022, 6, 5)), date(2022, 6, 5));
    assert_eq!(epiweek_start(date(2022, 6, 11)), date(2022, 6, 5));
}

/// Test ISO date parsing with and without time components.
#[test]
fn test_parse_iso_date() {
    assert_eq!(parse_iso_date("2022-06-05"), Some(date(2022, 6, 5)));
    assert_eq!(parse_iso_date(" 2022-06-05T12:00:00 "), Some(date(2022, 6, 5)));
    assert_eq!(parse_iso_date("06/05/2022"), None);
    assert_eq!(parse_iso_date(""), None);
}

// ============================================================================
// Label Tests
// ============================================================================

/// Test label arithmetic.
#[test]
fn test_label_helpers() {
    assert_eq!(parent("BA.5.2.1"), Some("BA.5.2"));
    assert_eq!(parent("XBB"), None);
    assert!(has_parent("BA.5"));
    assert!(!has_parent("B"));
    assert_eq!(top_level("BQ.1.1"), "BQ");
    assert!(is_two_letter_alias("BQ.1"));
    assert!(!is_two_letter_alias("BQ"));
    assert!(!is_two_letter_alias("XBB.1.5"));
    assert!(!is_two_letter_alias("B.1.1.529"));
}

// ============================================================================
// Alias Table Tests
// ============================================================================

/// Test recursive decompression through chained aliases.
#[test]
fn test_alias_decompress() {
    let aliases = AliasTable::pango_default();
    assert_eq!(aliases.decompress("BQ.1").as_deref(), Some("B.1.1.529.5.3.1.1.1.1.1"));
    assert_eq!(aliases.decompress("BA.5").as_deref(), Some("B.1.1.529.5"));
    assert_eq!(aliases.decompress("XBB.1"), None);
}

/// Test re-compression with a restricted alias family.
#[test]
fn test_alias_compress_with_family() {
    let aliases = AliasTable::pango_default();
    let full = aliases.decompress("BQ.1").unwrap();

    let family = vec!["BA".to_string()];
    assert_eq!(aliases.compress_with(&full, &family).as_deref(), Some("BA.5.3.1.1.1.1.1"));

    // Longest matching expansion wins
    let family = vec!["BA".to_string(), "BE".to_string()];
    assert_eq!(aliases.compress_with(&full, &family).as_deref(), Some("BE.1.1.1.1"));

    let family = vec!["AY".to_string()];
    assert_eq!(aliases.compress_with(&full, &family), None);
}

/// Test loading an alias key document.
#[test]
fn test_alias_from_json() {
    let json = r#"{"A": "", "B": "", "BA": "B.1.1.529", "BE": "BA.5.3.1", "XBB": ["BJ.1", "BM.1.1.1"]}"#;
    let aliases = AliasTable::from_json_reader(json.as_bytes()).unwrap();

    assert_eq!(aliases.len(), 2);
    assert_eq!(aliases.decompress("BE.1").as_deref(), Some("B.1.1.529.5.3.1.1"));
}

/// Test that malformed alias JSON is a reference error.
#[test]
fn test_alias_from_json_malformed() {
    let err = AliasTable::from_json_reader("[1, 2]".as_bytes()).unwrap_err();
    assert!(matches!(err, EstimationError::MalformedReference { table: "alias key", .. }));
}

// ============================================================================
// Reference Parser Tests
// ============================================================================

/// Test lineage list parsing with comments and blank lines.
#[test]
fn test_parse_lineage_list() {
    let text = "# watch list\nBA.5\n\n  BQ.1.1  \nXBB.1.5\n";
    let labels = parse_lineage_list(text.as_bytes()).unwrap();
    assert_eq!(labels, vec!["BA.5", "BQ.1.1", "XBB.1.5"]);
}

/// Test variant-name parsing and its column check.
#[test]
fn test_parse_variant_names() {
    let names = parse_variant_names("BQ.1.1, Cerberus\nXBB.1.5,Kraken\n".as_bytes()).unwrap();
    assert_eq!(names["BQ.1.1"], "Cerberus");
    assert_eq!(names["XBB.1.5"], "Kraken");

    let err = parse_variant_names("BA.5\n".as_bytes()).unwrap_err();
    assert!(matches!(
        err,
        EstimationError::MalformedReference { table: "variant names", line: 1, .. }
    ));
}

// ============================================================================
// Record Tests
// ============================================================================

/// Test daily proportions and non-positive denominators.
#[test]
fn test_daily_proportion() {
    assert_eq!(DailyProportion::new(date(2021, 12, 1), 30.0, 120.0).proportion(), Some(0.25));
    assert_eq!(DailyProportion::new(date(2021, 12, 1), 0.0, 0.0).proportion(), None);
}

/// Test region filtering and epiweek derivation.
#[test]
fn test_filter_region() {
    let records = vec![
        SequenceRecord::new("a", date(2022, 6, 8), "BA.5", "San Diego"),
        SequenceRecord::new("b", date(2022, 6, 8), "BA.5", "California"),
        SequenceRecord::new("c", date(2022, 6, 9), "BA.2", "San Diego"),
    ];
    let subset = filter_region(&records, "San Diego");

    assert_eq!(subset.len(), 2);
    assert!(subset.iter().all(|r| r.epiweek == date(2022, 6, 5)));
}
