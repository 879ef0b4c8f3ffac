//! Internal-consistency reliability of test item batteries
//!
//! Cronbach's alpha over a set of item columns, with the fixed ordinal
//! band classification used in reporting. Rows are complete-case filtered
//! across the item set before computation (listwise deletion): a student
//! who skipped any item contributes to no item's variance.
//!
//! Alpha fails closed: fewer than 2 items, no complete rows, or zero
//! total-score variance yields no coefficient, never a fabricated 0.

use serde::Serialize;
use tracing::debug;

use crate::catalog::{EGMA_SCORES, EGRA_SCORES};
use crate::error::Result;
use crate::table::Dataset;

/// Ordinal reliability band for a Cronbach's alpha coefficient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReliabilityBand {
    /// Alpha could not be computed
    Insufficient,
    /// α ≥ 0.9
    Excellent,
    /// 0.7 ≤ α < 0.9
    Good,
    /// 0.6 ≤ α < 0.7
    Acceptable,
    /// α < 0.6
    Poor,
}

impl ReliabilityBand {
    /// Band boundaries are inclusive on the lower bound: exactly 0.9 is
    /// Excellent, exactly 0.7 is Good, exactly 0.6 is Acceptable.
    pub fn classify(alpha: Option<f64>) -> Self {
        match alpha {
            None => ReliabilityBand::Insufficient,
            Some(a) if a >= 0.9 => ReliabilityBand::Excellent,
            Some(a) if a >= 0.7 => ReliabilityBand::Good,
            Some(a) if a >= 0.6 => ReliabilityBand::Acceptable,
            Some(_) => ReliabilityBand::Poor,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReliabilityBand::Insufficient => "insufficient",
            ReliabilityBand::Excellent => "excellent",
            ReliabilityBand::Good => "good",
            ReliabilityBand::Acceptable => "acceptable",
            ReliabilityBand::Poor => "poor",
        }
    }
}

/// Reliability assessment of one named test battery
#[derive(Debug, Clone, Serialize)]
pub struct ReliabilityResult {
    pub test: String,
    /// `None` marks insufficient data, surfaced as such, not as 0
    pub alpha: Option<f64>,
    pub band: ReliabilityBand,
}

// Sample variance, divisor n-1
fn sample_variance(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)
}

/// Cronbach's alpha over the item columns present in the dataset:
/// α = (k/(k−1)) × (1 − Σ item variances / Var(row sums)).
///
/// Listwise deletion across the item set, sample variance throughout.
/// `None` when fewer than 2 item columns survive, fewer than 2 complete
/// rows remain, or the total-score variance is exactly zero.
pub fn cronbach_alpha(dataset: &Dataset, item_keys: &[&str]) -> Option<f64> {
    let present = dataset.filter_existing_columns(item_keys);
    let k = present.len();
    if k < 2 {
        return None;
    }

    let columns: Vec<Vec<Option<f64>>> = present
        .iter()
        .filter_map(|key| dataset.numeric(key))
        .collect();

    // Complete cases only: item scores per column, restricted to rows where
    // every item is present
    let mut items: Vec<Vec<f64>> = vec![Vec::new(); k];
    'rows: for row in 0..dataset.row_count() {
        let mut values = Vec::with_capacity(k);
        for column in &columns {
            match column[row] {
                Some(v) => values.push(v),
                None => continue 'rows,
            }
        }
        for (item, v) in items.iter_mut().zip(values) {
            item.push(v);
        }
    }

    let n = items[0].len();
    if n < 2 {
        debug!(complete_rows = n, "too few complete rows for alpha");
        return None;
    }

    let item_variance_sum: f64 = items.iter().map(|item| sample_variance(item)).sum();
    let row_sums: Vec<f64> = (0..n)
        .map(|row| items.iter().map(|item| item[row]).sum())
        .collect();
    let total_variance = sample_variance(&row_sums);
    if total_variance == 0.0 {
        return None;
    }

    let kf = k as f64;
    Some(kf / (kf - 1.0) * (1.0 - item_variance_sum / total_variance))
}

/// Alpha plus its band for one named battery
pub fn assess_reliability(dataset: &Dataset, test: &str, item_keys: &[&str]) -> ReliabilityResult {
    let alpha = cronbach_alpha(dataset, item_keys);
    ReliabilityResult {
        test: test.to_string(),
        alpha,
        band: ReliabilityBand::classify(alpha),
    }
}

/// The standard three-way reliability report: EGRA per teaching language,
/// EGMA over the whole dataset. Requires the `language_teaching` column.
pub fn assess_battery_reliability(dataset: &Dataset) -> Result<Vec<ReliabilityResult>> {
    let egra: Vec<&str> = EGRA_SCORES.keys().collect();
    let egma: Vec<&str> = EGMA_SCORES.keys().collect();

    let english = dataset.filter_eq("language_teaching", "English")?;
    let dutch = dataset.filter_eq("language_teaching", "Dutch")?;

    Ok(vec![
        assess_reliability(&english, "EGRA English", &egra),
        assess_reliability(&dutch, "EGRA Dutch", &egra),
        assess_reliability(dataset, "EGMA", &egma),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;

    fn items(columns: &[(&str, Vec<Value>)]) -> Dataset {
        let mut ds = Dataset::new();
        for (key, values) in columns {
            ds.insert_column(key, values.clone()).unwrap();
        }
        ds
    }

    fn num(values: &[f64]) -> Vec<Value> {
        values.iter().map(|&v| Value::Number(v)).collect()
    }

    #[test]
    fn test_alpha_single_column_is_none() {
        let ds = items(&[("a", num(&[1.0, 2.0, 3.0]))]);
        assert_eq!(cronbach_alpha(&ds, &["a"]), None);
    }

    #[test]
    fn test_alpha_zero_total_variance_is_none() {
        // Row sums all equal 5: no variance to apportion
        let ds = items(&[
            ("a", num(&[1.0, 2.0, 3.0])),
            ("b", num(&[4.0, 3.0, 2.0])),
        ]);
        assert_eq!(cronbach_alpha(&ds, &["a", "b"]), None);
    }

    #[test]
    fn test_alpha_perfectly_consistent_items() {
        // Identical items with nonzero variance: alpha reaches 1
        let ds = items(&[
            ("a", num(&[1.0, 2.0, 3.0, 4.0])),
            ("b", num(&[1.0, 2.0, 3.0, 4.0])),
            ("c", num(&[1.0, 2.0, 3.0, 4.0])),
        ]);
        let alpha = cronbach_alpha(&ds, &["a", "b", "c"]).unwrap();
        assert!((alpha - 1.0).abs() < 1e-9, "alpha = {alpha}");
    }

    #[test]
    fn test_alpha_listwise_deletion() {
        // Second row incomplete: dropped from every item's variance
        let ds = items(&[
            (
                "a",
                vec![
                    Value::Number(1.0),
                    Value::Missing,
                    Value::Number(3.0),
                    Value::Number(4.0),
                ],
            ),
            ("b", num(&[1.0, 99.0, 3.0, 4.0])),
        ]);
        let alpha = cronbach_alpha(&ds, &["a", "b"]).unwrap();
        // With the incomplete row gone the two items are identical
        assert!((alpha - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_alpha_absent_items_filtered_first() {
        let ds = items(&[
            ("a", num(&[1.0, 2.0, 3.0])),
            ("b", num(&[1.5, 2.5, 3.5])),
        ]);
        // "ghost" drops out; two real items remain
        assert!(cronbach_alpha(&ds, &["a", "ghost", "b"]).is_some());
        // Only one real item left after filtering
        assert_eq!(cronbach_alpha(&ds, &["a", "ghost"]), None);
    }

    #[test]
    fn test_alpha_known_value() {
        // Hand-computed: item variances 1.0 and 4.0, row sums [3,6,9]
        // with variance 9.0; alpha = 2 * (1 - 5/9) = 8/9
        let ds = items(&[
            ("a", num(&[1.0, 2.0, 3.0])),
            ("b", num(&[2.0, 4.0, 6.0])),
        ]);
        let alpha = cronbach_alpha(&ds, &["a", "b"]).unwrap();
        assert!((alpha - 8.0 / 9.0).abs() < 1e-9, "alpha = {alpha}");
    }

    #[test]
    fn test_classify_band_boundaries() {
        assert_eq!(ReliabilityBand::classify(None), ReliabilityBand::Insufficient);
        assert_eq!(ReliabilityBand::classify(Some(0.9)), ReliabilityBand::Excellent);
        assert_eq!(ReliabilityBand::classify(Some(0.89)), ReliabilityBand::Good);
        assert_eq!(ReliabilityBand::classify(Some(0.7)), ReliabilityBand::Good);
        assert_eq!(ReliabilityBand::classify(Some(0.69)), ReliabilityBand::Acceptable);
        assert_eq!(ReliabilityBand::classify(Some(0.6)), ReliabilityBand::Acceptable);
        assert_eq!(ReliabilityBand::classify(Some(0.59)), ReliabilityBand::Poor);
    }

    #[test]
    fn test_band_labels() {
        assert_eq!(ReliabilityBand::Insufficient.label(), "insufficient");
        assert_eq!(ReliabilityBand::Excellent.label(), "excellent");
        assert_eq!(ReliabilityBand::Poor.label(), "poor");
    }

    #[test]
    fn test_assess_reliability_marks_insufficient() {
        let ds = items(&[("a", num(&[1.0, 2.0]))]);
        let result = assess_reliability(&ds, "EGRA", &["a"]);
        assert_eq!(result.alpha, None);
        assert_eq!(result.band, ReliabilityBand::Insufficient);
        assert_eq!(result.test, "EGRA");
    }

    #[test]
    fn test_assess_battery_requires_language_column() {
        let ds = items(&[("clpm", num(&[1.0, 2.0]))]);
        assert!(assess_battery_reliability(&ds).is_err());
    }
}
