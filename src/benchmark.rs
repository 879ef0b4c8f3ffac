//! Comparison of observed column means against fixed external benchmarks
//!
//! For each score column present in both the dataset and the benchmark
//! table, reports the observed mean (over non-missing values) and the
//! signed gap from the international target. Columns absent from the
//! dataset are skipped, not reported as zero; so are columns with no
//! observations at all.

use serde::Serialize;
use tracing::warn;

use crate::catalog::BenchmarkEntry;
use crate::table::Dataset;

/// One benchmark comparison row: observed mean vs external target
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkComparisonRow {
    pub label: String,
    pub code: String,
    pub observed_mean: f64,
    pub benchmark: f64,
    /// observed − benchmark; negative means below the target
    pub gap: f64,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Compare each benchmarked column's sample mean against its target.
/// Values are rounded to 2 decimals for presentation, like every other
/// result record.
pub fn compare_to_benchmarks(
    dataset: &Dataset,
    benchmarks: &[BenchmarkEntry],
) -> Vec<BenchmarkComparisonRow> {
    benchmarks
        .iter()
        .filter(|entry| dataset.has_column(entry.code))
        .filter_map(|entry| {
            let values = dataset.numeric_present(entry.code);
            if values.is_empty() {
                warn!(code = entry.code, "benchmarked column has no observations, skipping");
                return None;
            }
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            Some(BenchmarkComparisonRow {
                label: entry.label.to_string(),
                code: entry.code.to_string(),
                observed_mean: round2(mean),
                benchmark: entry.target,
                gap: round2(mean - entry.target),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::INTERNATIONAL_BENCHMARKS;
    use crate::table::Value;

    fn dataset() -> Dataset {
        let mut ds = Dataset::new();
        ds.insert_column("clpm", vec![50.0, 60.0, 70.0]).unwrap();
        ds.insert_column(
            "phoneme",
            vec![Value::Number(4.0), Value::Missing, Value::Number(6.0)],
        )
        .unwrap();
        ds.insert_column(
            "orf",
            vec![Value::Missing, Value::Missing, Value::Missing],
        )
        .unwrap();
        ds
    }

    #[test]
    fn test_gap_is_signed_difference() {
        let rows = compare_to_benchmarks(&dataset(), INTERNATIONAL_BENCHMARKS);

        let clpm = rows.iter().find(|r| r.code == "clpm").unwrap();
        assert_eq!(clpm.observed_mean, 60.0);
        assert_eq!(clpm.benchmark, 60.0);
        assert_eq!(clpm.gap, 0.0);

        // Mean over non-missing values only: (4 + 6) / 2
        let phoneme = rows.iter().find(|r| r.code == "phoneme").unwrap();
        assert_eq!(phoneme.observed_mean, 5.0);
        assert_eq!(phoneme.gap, -3.0);
    }

    #[test]
    fn test_absent_columns_skipped() {
        let rows = compare_to_benchmarks(&dataset(), INTERNATIONAL_BENCHMARKS);
        assert!(rows.iter().all(|r| r.code != "cwpm"));
        assert!(rows.iter().all(|r| r.code != "addition"));
    }

    #[test]
    fn test_all_missing_column_skipped_not_zero() {
        let rows = compare_to_benchmarks(&dataset(), INTERNATIONAL_BENCHMARKS);
        assert!(rows.iter().all(|r| r.code != "orf"));
    }

    #[test]
    fn test_labels_come_from_benchmark_table() {
        let rows = compare_to_benchmarks(&dataset(), INTERNATIONAL_BENCHMARKS);
        let clpm = rows.iter().find(|r| r.code == "clpm").unwrap();
        assert_eq!(clpm.label, "Lettres Correctes Par Minute");
    }
}
