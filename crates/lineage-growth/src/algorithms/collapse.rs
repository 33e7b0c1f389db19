//! Lineage collapsing.
//!
//! ## Purpose
//!
//! Raw PANGO labels form a long-tailed, open-ended hierarchy. Before the
//! proportion model can be fitted, rare labels are merged into their
//! ancestors until every label in the analysis window is either common
//! enough to model or on the stakeholders' watch-list.
//!
//! ## Design notes
//!
//! * **Immutable rounds**: each round maps the previous round's assignment to
//!   a new one; every intermediate assignment is kept in the result.
//! * **Label-level**: rounds operate on the distinct raw labels, weighted by
//!   their window counts, rather than on individual records.
//! * **Alias aware**: a two-letter alias outside the kept family ("BQ.1") is
//!   rewritten in terms of the kept family ("BA.5.3.1.1.1.1.1") so it can later
//!   merge with siblings written under that family.
//! * **Forced foreign aliases**: forcing a foreign alias keeps that label, not
//!   its descendants. A rare "BQ.1.1.5" is rewritten to
//!   "BA.5.3.1.1.1.1.1.1.5" on its first promotion and climbs the BA family
//!   from there, so it never reaches a forced "BQ.1.1".
//!
//! ## Key concepts
//!
//! * **Accepted set**: labels whose window count exceeds the threshold, plus
//!   the forced-keep list.
//! * **Promotion**: dropping the last dotted segment.
//! * **Floor**: labels without a separator are never promoted and never
//!   become "Other".
//!
//! ## Invariants
//!
//! * Every raw label in the full record set has exactly one collapsed label.
//! * Forced labels always map to themselves.
//! * Rounds bound computation only; they do not cap the number of labels.

// External dependencies
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

// Internal dependencies
use crate::primitives::lineage::{has_parent, is_two_letter_alias, parent, top_level, OTHER_LABEL};
use crate::primitives::records::SequenceRecord;
use crate::primitives::reference::ReferenceTables;

/// Default minimum window count for a label to be accepted.
pub const DEFAULT_MIN_COUNT: usize = 50;

/// Default maximum number of collapsing rounds.
pub const DEFAULT_ROUNDS: usize = 10;

/// Default alias family kept when re-compressing decompressed aliases.
pub const DEFAULT_ALIAS_FAMILY: &str = "BA";

// ============================================================================
// Configuration
// ============================================================================

/// Parameters for lineage collapsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollapseConfig {
    /// Labels need strictly more window records than this to be accepted.
    pub min_count: usize,

    /// Maximum number of rounds.
    pub rounds: usize,

    /// Aliases allowed in re-compressed labels.
    pub alias_family: Vec<String>,
}

impl Default for CollapseConfig {
    fn default() -> Self {
        Self {
            min_count: DEFAULT_MIN_COUNT,
            rounds: DEFAULT_ROUNDS,
            alias_family: vec![DEFAULT_ALIAS_FAMILY.to_string()],
        }
    }
}

// ============================================================================
// Result
// ============================================================================

/// Raw label → collapsed label, with the per-round history.
#[derive(Debug, Clone, PartialEq)]
pub struct CollapseMap {
    mapping: BTreeMap<String, String>,
    history: Vec<BTreeMap<String, String>>,
    accepted: BTreeSet<String>,
}

impl CollapseMap {
    /// Collapsed label for a raw label seen during collapsing.
    pub fn get(&self, raw: &str) -> Option<&str> {
        self.mapping.get(raw).map(String::as_str)
    }

    /// Collapsed label for `raw`, or `raw` itself if it was never seen.
    pub fn resolve<'a>(&'a self, raw: &'a str) -> &'a str {
        self.get(raw).unwrap_or(raw)
    }

    /// Full raw → collapsed mapping.
    pub fn mapping(&self) -> &BTreeMap<String, String> {
        &self.mapping
    }

    /// Assignment after each round (index 0 is after round 1), before the
    /// final "Other" pass.
    pub fn history(&self) -> &[BTreeMap<String, String>] {
        &self.history
    }

    /// Assignment after round `round` (0-based).
    pub fn round(&self, round: usize) -> Option<&BTreeMap<String, String>> {
        self.history.get(round)
    }

    /// Number of rounds actually run.
    pub fn rounds_run(&self) -> usize {
        self.history.len()
    }

    /// Accepted labels after the final round (including forced labels).
    pub fn accepted(&self) -> &BTreeSet<String> {
        &self.accepted
    }

    /// Distinct collapsed labels.
    pub fn collapsed_labels(&self) -> BTreeSet<&str> {
        self.mapping.values().map(String::as_str).collect()
    }
}

// ============================================================================
// Algorithm
// ============================================================================

/// Collapse the lineage labels of `records`.
///
/// Counts are taken over records whose epiweek is in `window`; the returned
/// mapping covers every raw label in `records`.
pub fn collapse_lineages<'a, I>(
    records: I,
    window: &[NaiveDate],
    references: &ReferenceTables,
    config: &CollapseConfig,
) -> CollapseMap
where
    I: IntoIterator<Item = &'a SequenceRecord>,
{
    let window: BTreeSet<NaiveDate> = window.iter().copied().collect();

    let mut raw_window_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut current: BTreeMap<String, String> = BTreeMap::new();
    for record in records {
        current
            .entry(record.lineage.clone())
            .or_insert_with(|| record.lineage.clone());
        if window.contains(&record.epiweek) {
            *raw_window_counts.entry(record.lineage.clone()).or_insert(0) += 1;
        }
    }

    let mut history = Vec::with_capacity(config.rounds);
    for round in 0..config.rounds {
        let counts = tally(&raw_window_counts, &current);
        let accepted = accepted_set(&counts, config.min_count, &references.forced);

        let next: BTreeMap<String, String> = current
            .iter()
            .map(|(raw, label)| (raw.clone(), promote(label, &accepted, references, config)))
            .collect();

        let changed = next.iter().filter(|(raw, label)| current[*raw] != **label).count();
        debug!(
            round = round + 1,
            accepted = accepted.len(),
            changed,
            "lineage collapsing round"
        );

        history.push(next.clone());
        current = next;
        if changed == 0 {
            break;
        }
    }

    let counts = tally(&raw_window_counts, &current);
    let accepted = accepted_set(&counts, config.min_count, &references.forced);

    let mapping = current
        .into_iter()
        .map(|(raw, label)| {
            if accepted.contains(&label) || !has_parent(&label) {
                (raw, label)
            } else {
                (raw, OTHER_LABEL.to_string())
            }
        })
        .collect();

    CollapseMap {
        mapping,
        history,
        accepted,
    }
}

/// Window counts per current label.
fn tally(
    raw_counts: &BTreeMap<String, usize>,
    assignment: &BTreeMap<String, String>,
) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for (raw, &n) in raw_counts {
        let label = assignment.get(raw).unwrap_or(raw);
        *counts.entry(label.clone()).or_insert(0) += n;
    }
    counts
}

fn accepted_set(
    counts: &BTreeMap<String, usize>,
    min_count: usize,
    forced: &[String],
) -> BTreeSet<String> {
    counts
        .iter()
        .filter(|&(_, &n)| n > min_count)
        .map(|(label, _)| label.clone())
        .chain(forced.iter().cloned())
        .collect()
}

/// One promotion step for a single label.
fn promote(
    label: &str,
    accepted: &BTreeSet<String>,
    references: &ReferenceTables,
    config: &CollapseConfig,
) -> String {
    if accepted.contains(label) || !has_parent(label) {
        return label.to_string();
    }

    let parent_label = parent(label).unwrap_or(label);

    let foreign_alias = is_two_letter_alias(label)
        && !config.alias_family.iter().any(|a| a == top_level(label));
    if foreign_alias {
        let rewritten = references
            .aliases
            .decompress(label)
            .and_then(|full| references.aliases.compress_with(&full, &config.alias_family))
            .filter(|candidate| candidate != label);
        if let Some(rewritten) = rewritten {
            return rewritten;
        }
    }

    parent_label.to_string()
}
