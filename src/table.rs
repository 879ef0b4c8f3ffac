//! In-memory tabular dataset of student-level observations
//!
//! The dataset is loaded once per session by the ingestion collaborator and
//! treated as immutable by every analysis: derived columns are added to
//! private copies via [`Dataset::with_column`], never in place. Column
//! presence is validated here, in one place, instead of ad hoc inside each
//! analysis.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::error::{AnalysisError, Result};

/// A single observation cell: numeric score, categorical answer, or absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
    Number(f64),
    Text(String),
    Missing,
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Label used when partitioning rows by this value. Missing cells form
    /// a distinct "Unknown" bucket rather than being dropped.
    pub fn group_label(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Number(n) if n.fract() == 0.0 => format!("{}", *n as i64),
            Value::Number(n) => format!("{n}"),
            Value::Missing => "Unknown".to_string(),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<Option<f64>> for Value {
    fn from(n: Option<f64>) -> Self {
        match n {
            Some(n) => Value::Number(n),
            None => Value::Missing,
        }
    }
}

/// Column-oriented table of observation rows
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// Column keys in insertion order
    keys: Vec<String>,
    cells: HashMap<String, Vec<Value>>,
    rows: usize,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of observation rows (students)
    pub fn row_count(&self) -> usize {
        self.rows
    }

    /// Column keys in insertion order
    pub fn column_names(&self) -> &[String] {
        &self.keys
    }

    pub fn has_column(&self, key: &str) -> bool {
        self.cells.contains_key(key)
    }

    /// Append a column during initial construction. The first column fixes
    /// the row count; later columns must match it.
    pub fn insert_column<V: Into<Value>>(
        &mut self,
        key: &str,
        values: Vec<V>,
    ) -> Result<()> {
        if self.cells.contains_key(key) {
            return Err(AnalysisError::DuplicateColumn(key.to_string()));
        }
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if self.keys.is_empty() {
            self.rows = values.len();
        } else if values.len() != self.rows {
            return Err(AnalysisError::LengthMismatch {
                column: key.to_string(),
                expected: self.rows,
                actual: values.len(),
            });
        }
        self.keys.push(key.to_string());
        self.cells.insert(key.to_string(), values);
        Ok(())
    }

    /// Copy of this dataset with one derived column appended. The receiver
    /// is left untouched; analyses share the loaded table read-only.
    pub fn with_column<V: Into<Value>>(&self, key: &str, values: Vec<V>) -> Result<Dataset> {
        let mut copy = self.clone();
        copy.insert_column(key, values)?;
        Ok(copy)
    }

    pub fn column(&self, key: &str) -> Option<&[Value]> {
        self.cells.get(key).map(Vec::as_slice)
    }

    /// Access a structurally required column (grouping keys, survey fields).
    /// Absence is a recoverable failure surfaced to the caller, unlike
    /// requested value columns which are filtered silently.
    pub fn require_column(&self, key: &str) -> Result<&[Value]> {
        self.column(key)
            .ok_or_else(|| AnalysisError::MissingColumn(key.to_string()))
    }

    /// Subset of `requested` that exists in this dataset, preserving the
    /// requested order. Absent columns are dropped silently: the uploaded
    /// spreadsheet decides which fields are available, not the analysis.
    pub fn filter_existing_columns<'a>(&self, requested: &[&'a str]) -> Vec<&'a str> {
        let (present, absent): (Vec<&str>, Vec<&str>) = requested
            .iter()
            .partition(|key| self.cells.contains_key(**key));
        if !absent.is_empty() {
            debug!(?absent, "dropping requested columns absent from dataset");
        }
        present
    }

    /// Per-row numeric view of a column. Text and missing cells are `None`.
    pub fn numeric(&self, key: &str) -> Option<Vec<Option<f64>>> {
        self.cells
            .get(key)
            .map(|col| col.iter().map(Value::as_number).collect())
    }

    /// Non-missing numeric values of a column, in row order. Empty when the
    /// column is absent.
    pub fn numeric_present(&self, key: &str) -> Vec<f64> {
        self.cells
            .get(key)
            .map(|col| col.iter().filter_map(Value::as_number).collect())
            .unwrap_or_default()
    }

    /// Rows where the categorical column `key` equals `value`, as a new
    /// dataset. Missing cells never match.
    pub fn filter_eq(&self, key: &str, value: &str) -> Result<Dataset> {
        let column = self.require_column(key)?;
        let selected: Vec<usize> = column
            .iter()
            .enumerate()
            .filter(|(_, v)| v.as_text() == Some(value))
            .map(|(i, _)| i)
            .collect();
        Ok(self.select_rows(&selected))
    }

    fn select_rows(&self, indices: &[usize]) -> Dataset {
        let mut cells = HashMap::with_capacity(self.cells.len());
        for (key, col) in &self.cells {
            let picked: Vec<Value> = indices.iter().map(|&i| col[i].clone()).collect();
            cells.insert(key.clone(), picked);
        }
        Dataset {
            keys: self.keys.clone(),
            cells,
            rows: indices.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        let mut ds = Dataset::new();
        ds.insert_column("clpm", vec![Value::Number(10.0), Value::Missing, Value::Number(30.0)])
            .unwrap();
        ds.insert_column("school", vec!["A", "B", "A"]).unwrap();
        ds
    }

    #[test]
    fn test_insert_and_row_count() {
        let ds = sample();
        assert_eq!(ds.row_count(), 3);
        assert_eq!(ds.column_names(), &["clpm", "school"]);
    }

    #[test]
    fn test_insert_length_mismatch() {
        let mut ds = sample();
        let err = ds.insert_column("orf", vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, AnalysisError::LengthMismatch { .. }));
    }

    #[test]
    fn test_insert_duplicate() {
        let mut ds = sample();
        let err = ds.insert_column("clpm", vec![1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, AnalysisError::DuplicateColumn(_)));
    }

    #[test]
    fn test_filter_existing_columns_preserves_order() {
        let ds = sample();
        assert_eq!(
            ds.filter_existing_columns(&["clpm", "ghost"]),
            vec!["clpm"]
        );
        assert_eq!(
            ds.filter_existing_columns(&["school", "clpm"]),
            vec!["school", "clpm"]
        );
    }

    #[test]
    fn test_require_column_missing() {
        let ds = sample();
        let err = ds.require_column("gender").unwrap_err();
        assert_eq!(err.to_string(), "required column not found: gender");
    }

    #[test]
    fn test_numeric_views() {
        let ds = sample();
        assert_eq!(
            ds.numeric("clpm").unwrap(),
            vec![Some(10.0), None, Some(30.0)]
        );
        assert_eq!(ds.numeric_present("clpm"), vec![10.0, 30.0]);
        // Text column has no numeric values
        assert_eq!(ds.numeric_present("school"), Vec::<f64>::new());
        // Absent column degrades to empty
        assert_eq!(ds.numeric_present("ghost"), Vec::<f64>::new());
    }

    #[test]
    fn test_filter_eq() {
        let ds = sample();
        let filtered = ds.filter_eq("school", "A").unwrap();
        assert_eq!(filtered.row_count(), 2);
        assert_eq!(filtered.numeric_present("clpm"), vec![10.0, 30.0]);
    }

    #[test]
    fn test_with_column_leaves_original_untouched() {
        let ds = sample();
        let augmented = ds.with_column("total", vec![1.0, 2.0, 3.0]).unwrap();
        assert!(augmented.has_column("total"));
        assert!(!ds.has_column("total"));
        assert_eq!(ds.row_count(), augmented.row_count());
    }

    #[test]
    fn test_group_label() {
        assert_eq!(Value::Text("North".into()).group_label(), "North");
        assert_eq!(Value::Number(3.0).group_label(), "3");
        assert_eq!(Value::Number(2.5).group_label(), "2.5");
        assert_eq!(Value::Missing.group_label(), "Unknown");
    }
}
