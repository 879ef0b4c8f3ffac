//! Typed error conditions for the analysis core
//!
//! Every computation returns partial results where it can; these errors
//! cover the structural failures that cannot be degraded around (a missing
//! grouping column, a malformed dataset). Missing *value* columns are
//! filtered silently and never reach this enum.

use thiserror::Error;

/// Errors for dataset construction and analysis operations
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// A structurally required column (e.g. a grouping key) is absent.
    /// Recoverable: the caller surfaces a warning and keeps the session.
    #[error("required column not found: {0}")]
    MissingColumn(String),

    #[error("column {column} has {actual} rows, dataset has {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("column already exists: {0}")]
    DuplicateColumn(String),

    /// Not enough observations to compute the requested result at all
    /// (per-row insufficiency is reported by omitting the row instead).
    #[error("insufficient data: {0}")]
    InsufficientData(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
