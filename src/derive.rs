//! Derived fields shared across analyses
//!
//! Total score, zero-score rates, performance tiers, and the
//! language-exposure grouping. All derivations leave the loaded dataset
//! untouched; the `with_*` variants return an augmented copy.
//!
//! Total score sums the values that are present, so a missing item counts
//! as 0. That matches summed-score reporting but cannot distinguish "did
//! not attempt" from "scored zero"; zero-rate and total-score consumers
//! inherit the ambiguity.

use serde::Serialize;
use tracing::debug;

use crate::describe::partition_rows;
use crate::error::{AnalysisError, Result};
use crate::table::{Dataset, Value};

/// Zero-score share of one column
#[derive(Debug, Clone, Serialize)]
pub struct ZeroRateRow {
    pub column: String,
    /// Rows scoring exactly 0 as a share of all rows, in percent. Missing
    /// rows stay in the denominator.
    pub percentage: f64,
}

/// Performance tier relative to the cohort's cut points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Tier {
    /// At or above the 75th percentile cut
    Mastery,
    /// At or above the median cut
    Developing,
    Emergent,
}

impl Tier {
    pub fn label(&self) -> &'static str {
        match self {
            Tier::Mastery => "mastery",
            Tier::Developing => "developing",
            Tier::Emergent => "emergent",
        }
    }
}

/// Language-exposure group from the home-language survey answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LanguageExposure {
    EnglishAlways,
    DutchAlways,
    EnglishFrequently,
    EnglishSometimes,
    DutchFrequently,
    DutchSometimes,
    OtherLanguage,
    Other,
}

impl LanguageExposure {
    pub fn label(&self) -> &'static str {
        match self {
            LanguageExposure::EnglishAlways => "English Always",
            LanguageExposure::DutchAlways => "Dutch Always",
            LanguageExposure::EnglishFrequently => "English Frequently",
            LanguageExposure::EnglishSometimes => "English Sometimes",
            LanguageExposure::DutchFrequently => "Dutch Frequently",
            LanguageExposure::DutchSometimes => "Dutch Sometimes",
            LanguageExposure::OtherLanguage => "Other Language",
            LanguageExposure::Other => "Other",
        }
    }
}

/// Row-wise sum over the selected columns, missing values contributing 0.
/// Absent columns are dropped from the selection first.
pub fn total_score(dataset: &Dataset, value_keys: &[&str]) -> Vec<f64> {
    let present = dataset.filter_existing_columns(value_keys);
    let columns: Vec<Vec<Option<f64>>> = present
        .iter()
        .filter_map(|key| dataset.numeric(key))
        .collect();

    (0..dataset.row_count())
        .map(|row| {
            columns
                .iter()
                .filter_map(|column| column[row])
                .sum()
        })
        .collect()
}

/// Copy of the dataset with the row-wise total appended under `total_key`
pub fn with_total_score(
    dataset: &Dataset,
    value_keys: &[&str],
    total_key: &str,
) -> Result<Dataset> {
    dataset.with_column(total_key, total_score(dataset, value_keys))
}

/// Percentage of rows scoring exactly 0 per column, over the full row
/// count. An empty dataset reports no rows at all.
pub fn zero_rate(dataset: &Dataset, value_keys: &[&str]) -> Vec<ZeroRateRow> {
    let rows = dataset.row_count();
    if rows == 0 {
        return Vec::new();
    }
    dataset
        .filter_existing_columns(value_keys)
        .into_iter()
        .map(|key| {
            let zeros = dataset
                .numeric(key)
                .map(|column| column.iter().filter(|v| **v == Some(0.0)).count())
                .unwrap_or(0);
            let percentage = zeros as f64 / rows as f64 * 100.0;
            ZeroRateRow {
                column: key.to_string(),
                percentage: (percentage * 100.0).round() / 100.0,
            }
        })
        .collect()
}

// Linear-interpolation percentile over sorted data (R-7, the pandas
// default)
fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let index = q * (sorted.len() - 1) as f64;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let weight = index - lower as f64;
        sorted[lower] * (1.0 - weight) + sorted[upper] * weight
    }
}

/// Classify each row's total score against cut points derived from the
/// per-group mean totals: the 50th and 75th percentile of the group means
/// become two global cuts shared by every row. Rows with a missing total
/// are unclassified.
///
/// Cut points intentionally come from the between-group mean distribution,
/// not the per-row distribution; see the design notes before changing.
pub fn performance_tiers(
    dataset: &Dataset,
    total_key: &str,
    group_key: &str,
) -> Result<Vec<Option<Tier>>> {
    let totals = dataset
        .numeric(total_key)
        .ok_or_else(|| AnalysisError::MissingColumn(total_key.to_string()))?;
    let groups = partition_rows(dataset, group_key)?;

    let mut group_means: Vec<f64> = groups
        .values()
        .filter_map(|indices| {
            let values: Vec<f64> = indices.iter().filter_map(|&i| totals[i]).collect();
            if values.is_empty() {
                None
            } else {
                Some(values.iter().sum::<f64>() / values.len() as f64)
            }
        })
        .collect();
    if group_means.is_empty() {
        return Err(AnalysisError::InsufficientData(format!(
            "no group of {group_key} has any {total_key} observations"
        )));
    }

    group_means.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let p50 = percentile(&group_means, 0.50);
    let p75 = percentile(&group_means, 0.75);
    debug!(p50, p75, groups = group_means.len(), "tier cut points");

    Ok(totals
        .iter()
        .map(|total| {
            total.map(|t| {
                if t >= p75 {
                    Tier::Mastery
                } else if t >= p50 {
                    Tier::Developing
                } else {
                    Tier::Emergent
                }
            })
        })
        .collect())
}

/// First-match-wins classification over the home-language survey fields.
/// All three survey columns are structurally required; a missing answer
/// simply fails its rule and falls through.
pub fn language_exposure_groups(dataset: &Dataset) -> Result<Vec<LanguageExposure>> {
    let english = dataset.require_column("st_english_home")?;
    let dutch = dataset.require_column("st_dutch_home")?;
    let other = dataset.require_column("st_other_language")?;

    Ok((0..dataset.row_count())
        .map(|row| {
            let english = english[row].as_text();
            let dutch = dutch[row].as_text();
            match (english, dutch) {
                (Some("Always"), _) => LanguageExposure::EnglishAlways,
                (_, Some("Always")) => LanguageExposure::DutchAlways,
                (Some("Frequently"), _) => LanguageExposure::EnglishFrequently,
                (Some("Sometimes"), _) => LanguageExposure::EnglishSometimes,
                (_, Some("Frequently")) => LanguageExposure::DutchFrequently,
                (_, Some("Sometimes")) => LanguageExposure::DutchSometimes,
                _ if other[row].as_text() == Some("Yes") => LanguageExposure::OtherLanguage,
                _ => LanguageExposure::Other,
            }
        })
        .collect())
}

/// Copy of the dataset with the exposure label appended as a categorical
/// `language_group` column, ready for grouping
pub fn with_language_exposure(dataset: &Dataset) -> Result<Dataset> {
    let labels: Vec<Value> = language_exposure_groups(dataset)?
        .into_iter()
        .map(|group| Value::Text(group.label().to_string()))
        .collect();
    dataset.with_column("language_group", labels)
}
