//! Evaluar - Statistical analysis core for EGRA/EGMA assessment data
//!
//! This library computes the descriptive statistics, reliability
//! coefficients, hypothesis tests, and benchmark comparisons behind an
//! early-grade assessment dashboard. It owns nothing but the numbers:
//! chart rendering, document export, and spreadsheet ingestion are the
//! caller's collaborators, fed by the structured result records returned
//! here. Every result is recomputed in full from the loaded dataset; there
//! is no cached or persisted state.

pub mod benchmark;
pub mod catalog;
pub mod derive;
pub mod describe;
pub mod error;
pub mod hypothesis;
pub mod reliability;
pub mod table;

mod special;

pub use error::{AnalysisError, Result};
pub use table::{Dataset, Value};
