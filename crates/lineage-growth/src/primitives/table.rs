//! Weekly proportion table.
//!
//! Rows are analysis weeks in chronological order, columns are collapsed
//! lineage labels, and every row is a probability vector.

// External dependencies
use chrono::NaiveDate;
use ndarray::{Array2, ArrayView1};
use std::fmt::{Display, Formatter, Result};

// Internal dependencies
use crate::primitives::dates::day_number;

/// Dense (week × lineage) matrix of estimated proportions.
#[derive(Debug, Clone, PartialEq)]
pub struct ProportionTable {
    /// Week start dates, ascending.
    pub weeks: Vec<NaiveDate>,

    /// Column labels.
    pub labels: Vec<String>,

    /// Proportions, shape `(weeks.len(), labels.len())`.
    pub values: Array2<f64>,
}

impl ProportionTable {
    /// Assemble a table. `values` must have one row per week and one column per label.
    pub fn new(weeks: Vec<NaiveDate>, labels: Vec<String>, values: Array2<f64>) -> Self {
        debug_assert_eq!(values.dim(), (weeks.len(), labels.len()));
        Self {
            weeks,
            labels,
            values,
        }
    }

    /// Number of weeks (rows).
    pub fn n_weeks(&self) -> usize {
        self.weeks.len()
    }

    /// Number of labels (columns).
    pub fn n_labels(&self) -> usize {
        self.labels.len()
    }

    /// Column index of `label`.
    pub fn label_index(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Proportion series for `label`, one value per week.
    pub fn column(&self, label: &str) -> Option<ArrayView1<'_, f64>> {
        self.label_index(label).map(|j| self.values.column(j))
    }

    /// Proportion of `label` in the most recent week.
    pub fn latest(&self, label: &str) -> Option<f64> {
        let j = self.label_index(label)?;
        let last = self.weeks.len().checked_sub(1)?;
        Some(self.values[[last, j]])
    }

    /// Week dates encoded as day numbers.
    pub fn week_numbers(&self) -> Vec<f64> {
        self.weeks.iter().map(|&w| day_number(w)).collect()
    }

    /// Largest absolute deviation of any row sum from 1.
    pub fn max_row_sum_error(&self) -> f64 {
        self.values
            .rows()
            .into_iter()
            .map(|row| (row.sum() - 1.0).abs())
            .fold(0.0, f64::max)
    }
}

impl Display for ProportionTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{:>10}", "Week")?;
        for label in &self.labels {
            write!(f, " {:>12}", label)?;
        }
        writeln!(f)?;
        writeln!(f, "{:-<width$}", "", width = 10 + 13 * self.labels.len())?;

        for (i, week) in self.weeks.iter().enumerate() {
            write!(f, "{:>10}", week.format("%Y-%m-%d").to_string())?;
            for j in 0..self.labels.len() {
                write!(f, " {:>12.6}", self.values[[i, j]])?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
