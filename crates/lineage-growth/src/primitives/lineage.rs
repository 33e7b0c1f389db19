//! PANGO lineage label primitives.
//!
//! ## Purpose
//!
//! Lineage labels are dot-separated paths of increasing specificity
//! ("B.1.1.529.5.2"). Long paths are abbreviated with two- or three-letter
//! aliases ("BA.5.2" for "B.1.1.529.5.2"). This module provides the label
//! arithmetic the collapsing algorithm needs: parent promotion, alias
//! decompression, and re-compression restricted to an alias family.
//!
//! ## Invariants
//!
//! * `parent` never invents segments; it only removes the last one.
//! * Decompression of a label whose top-level segment is not a known alias
//!   returns `None`.
//! * Recombinant aliases (multiple parents) are never decompressed.

// External dependencies
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Read;

// Internal dependencies
use crate::primitives::errors::EstimationError;

/// Label assigned to records whose lineage cannot be collapsed into any accepted label.
pub const OTHER_LABEL: &str = "Other";

/// Hierarchy separator.
pub const SEPARATOR: char = '.';

/// Guard against alias cycles in malformed alias keys.
const MAX_ALIAS_DEPTH: usize = 32;

// ============================================================================
// Label Arithmetic
// ============================================================================

/// Parent label (last segment removed), or `None` for a top-level label.
#[inline]
pub fn parent(label: &str) -> Option<&str> {
    label.rsplit_once(SEPARATOR).map(|(head, _)| head)
}

/// Whether the label has a hierarchical parent.
#[inline]
pub fn has_parent(label: &str) -> bool {
    label.contains(SEPARATOR)
}

/// Top-level segment of a label.
#[inline]
pub fn top_level(label: &str) -> &str {
    label.split(SEPARATOR).next().unwrap_or(label)
}

/// Whether `label` has the shape "XY.<...>": a two-letter alias followed by at
/// least one further segment.
pub fn is_two_letter_alias(label: &str) -> bool {
    let head = top_level(label);
    head.len() == 2 && head.bytes().all(|b| b.is_ascii_uppercase()) && has_parent(label)
}

// ============================================================================
// Alias Table
// ============================================================================

/// Mapping from alias prefix to the lineage it abbreviates.
///
/// Expansions may themselves start with an alias ("BQ" → "BE.1.1.1"); they are
/// resolved recursively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    aliases: BTreeMap<String, String>,
}

impl AliasTable {
    /// Create an empty alias table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in table covering the Delta and Omicron aliases tracked by the dashboard.
    pub fn pango_default() -> Self {
        let entries = [
            ("AY", "B.1.617.2"),
            ("BA", "B.1.1.529"),
            ("BE", "BA.5.3.1"),
            ("BF", "BA.5.2.1"),
            ("BQ", "BE.1.1.1"),
            ("BL", "BA.2.75.1"),
            ("BM", "BA.2.75.3"),
            ("BN", "BA.2.75.5"),
            ("BR", "BA.2.75.4"),
            ("CA", "BA.2.75.2"),
            ("CH", "BM.4.1.1"),
            ("C", "B.1.1.1"),
            ("P", "B.1.1.28"),
            ("Q", "B.1.1.7"),
        ];
        let mut table = Self::new();
        for (alias, expansion) in entries {
            table.insert(alias, expansion);
        }
        table
    }

    /// Load a PANGO `alias_key.json` document.
    ///
    /// Empty expansions (the roots "A" and "B") and recombinant entries
    /// (array-valued) are skipped.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, EstimationError> {
        let value: Value =
            serde_json::from_reader(reader).map_err(|e| EstimationError::MalformedReference {
                table: "alias key",
                line: e.line(),
                reason: e.to_string(),
            })?;

        let object = value
            .as_object()
            .ok_or_else(|| EstimationError::MalformedReference {
                table: "alias key",
                line: 1,
                reason: "expected a JSON object".into(),
            })?;

        let mut table = Self::new();
        for (alias, expansion) in object {
            if let Some(text) = expansion.as_str() {
                if !text.is_empty() {
                    table.insert(alias, text);
                }
            }
        }
        Ok(table)
    }

    /// Add or replace an alias.
    pub fn insert(&mut self, alias: impl Into<String>, expansion: impl Into<String>) {
        self.aliases.insert(alias.into(), expansion.into());
    }

    /// Number of aliases.
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    /// Whether the table has no aliases.
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Expand every alias prefix of `label`, returning its full dotted ancestry.
    ///
    /// Returns `None` if the top-level segment is not a known alias.
    pub fn decompress(&self, label: &str) -> Option<String> {
        let mut current = label.to_string();
        let mut expanded = false;

        for _ in 0..MAX_ALIAS_DEPTH {
            let (head, rest) = match current.split_once(SEPARATOR) {
                Some((head, rest)) => (head, Some(rest)),
                None => (current.as_str(), None),
            };

            let Some(expansion) = self.aliases.get(head) else {
                break;
            };

            current = match rest {
                Some(rest) => format!("{expansion}{SEPARATOR}{rest}"),
                None => expansion.clone(),
            };
            expanded = true;
        }

        expanded.then_some(current)
    }

    /// Re-compress a full ancestry using only the aliases in `family`.
    ///
    /// The alias with the longest matching expansion wins. Returns `None` when
    /// no alias in the family prefixes `full`.
    pub fn compress_with(&self, full: &str, family: &[String]) -> Option<String> {
        let mut best: Option<(usize, String)> = None;

        for alias in family {
            let Some(expansion) = self.decompress(alias) else {
                continue;
            };

            let candidate = if full == expansion {
                Some(alias.clone())
            } else {
                full.strip_prefix(expansion.as_str())
                    .and_then(|rest| rest.strip_prefix(SEPARATOR))
                    .map(|rest| format!("{alias}{SEPARATOR}{rest}"))
            };

            if let Some(candidate) = candidate {
                if best.as_ref().map_or(true, |(len, _)| expansion.len() > *len) {
                    best = Some((expansion.len(), candidate));
                }
            }
        }

        best.map(|(_, label)| label)
    }
}
