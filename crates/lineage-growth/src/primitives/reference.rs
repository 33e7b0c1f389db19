//! Externally curated reference tables.
//!
//! ## Purpose
//!
//! Public-health stakeholders maintain two small tables next to the sequence
//! data: a watch-list of lineages that must always be tracked, and a mapping
//! from lineage to a human-readable variant name. Both are injected into each
//! pipeline call through [`ReferenceTables`]; nothing here is global.
//!
//! ## Invariants
//!
//! * Variant-name files have exactly two comma-separated columns per line.
//! * Lookups of unmapped lineages return `None`, never an error.

// External dependencies
use std::collections::BTreeMap;
use std::io::BufRead;

// Internal dependencies
use crate::primitives::errors::EstimationError;
use crate::primitives::lineage::AliasTable;

/// Lineages tracked by the CDC variant proportions report when the dashboard
/// growth table was introduced.
pub const CDC_TRACKED_LINEAGES: &[&str] = &[
    "BA.5",
    "BA.5.2.6",
    "BA.4.6",
    "BQ.1.1",
    "BQ.1",
    "BN.1",
    "BF.7",
    "BA.4",
    "BA.2.75",
    "BA.2.75.2",
    "BA.2.12.1",
    "BA.2",
    "B.1.1.519",
    "BA.1.1",
    "B.1.617.2",
];

// ============================================================================
// Reference Tables
// ============================================================================

/// Reference data passed into every pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceTables {
    /// Labels that survive collapsing and always appear in the filtered table.
    pub forced: Vec<String>,

    /// Lineage → variant name (e.g. "B.1.617.2" → "Delta").
    pub variant_names: BTreeMap<String, String>,

    /// Alias table used to decompress two-letter aliases while collapsing.
    pub aliases: AliasTable,
}

impl ReferenceTables {
    /// Empty tables: no forced labels, no names, no aliases.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tables seeded with the CDC watch-list and the built-in alias table.
    pub fn with_defaults() -> Self {
        Self {
            forced: CDC_TRACKED_LINEAGES.iter().map(|s| s.to_string()).collect(),
            variant_names: BTreeMap::new(),
            aliases: AliasTable::pango_default(),
        }
    }

    /// Replace the forced-keep list.
    pub fn forced<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.forced = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the variant-name mapping.
    pub fn variant_names(mut self, names: BTreeMap<String, String>) -> Self {
        self.variant_names = names;
        self
    }

    /// Replace the alias table.
    pub fn aliases(mut self, aliases: AliasTable) -> Self {
        self.aliases = aliases;
        self
    }

    /// Whether `label` is on the forced-keep list.
    pub fn is_forced(&self, label: &str) -> bool {
        self.forced.iter().any(|f| f == label)
    }

    /// Variant name for `label`, if one is mapped.
    pub fn variant_name(&self, label: &str) -> Option<&str> {
        self.variant_names.get(label).map(String::as_str)
    }
}

// ============================================================================
// Parsers
// ============================================================================

/// Parse a lineage list: one label per line, blank lines and `#` comments ignored.
pub fn parse_lineage_list<R: BufRead>(reader: R) -> Result<Vec<String>, EstimationError> {
    let mut labels = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| EstimationError::MalformedReference {
            table: "lineage list",
            line: idx + 1,
            reason: e.to_string(),
        })?;
        let label = line.trim();
        if label.is_empty() || label.starts_with('#') {
            continue;
        }
        labels.push(label.to_string());
    }
    Ok(labels)
}

/// Parse a variant-name table with lines of the form `label,name`.
pub fn parse_variant_names<R: BufRead>(
    reader: R,
) -> Result<BTreeMap<String, String>, EstimationError> {
    let mut names = BTreeMap::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| EstimationError::MalformedReference {
            table: "variant names",
            line: idx + 1,
            reason: e.to_string(),
        })?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let columns: Vec<&str> = trimmed.split(',').collect();
        if columns.len() != 2 {
            return Err(EstimationError::MalformedReference {
                table: "variant names",
                line: idx + 1,
                reason: format!("expected 2 columns, found {}", columns.len()),
            });
        }

        names.insert(columns[0].trim().to_string(), columns[1].trim().to_string());
    }
    Ok(names)
}
