//! Per-group and overall descriptive statistics
//!
//! Partitions observation rows by a categorical column and computes the
//! eight-number summary (count, mean, std, min, quartiles, max) for each
//! selected score column. Basic moments go through trueno's SIMD vector
//! ops; quartiles use aprender's `DescriptiveStats` quantile (R-7 with
//! linear interpolation, the same method pandas uses).
//!
//! Missing values are excluded per column (pairwise-complete), not
//! row-deleted globally. Statistics are rounded to 2 decimal places in the
//! result records, which are the presentation contract.

use std::collections::BTreeMap;

use aprender::stats::DescriptiveStats;
use serde::Serialize;
use tracing::debug;
use trueno::Vector;

use crate::error::Result;
use crate::table::Dataset;

/// Eight-number summary for one (group, column) cell
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStats {
    /// Non-missing observations backing the other fields
    pub count: u64,
    pub mean: f32,
    /// Sample standard deviation (divisor n-1); NaN below 2 observations
    pub std: f32,
    pub min: f32,
    pub p25: f32,
    pub median: f32,
    pub p75: f32,
    pub max: f32,
}

impl ColumnStats {
    /// All statistics undefined: the group has no observations for this
    /// column. NaN, never a fabricated zero.
    fn empty() -> Self {
        Self {
            count: 0,
            mean: f32::NAN,
            std: f32::NAN,
            min: f32::NAN,
            p25: f32::NAN,
            median: f32::NAN,
            p75: f32::NAN,
            max: f32::NAN,
        }
    }
}

/// Summary of one column over the whole dataset
#[derive(Debug, Clone, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub stats: ColumnStats,
}

/// Summary of one column within one group
#[derive(Debug, Clone, Serialize)]
pub struct GroupColumnStats {
    pub group: String,
    pub column: String,
    pub stats: ColumnStats,
}

/// Descriptive statistics partitioned by a grouping column
#[derive(Debug, Clone, Serialize)]
pub struct GroupStatsResult {
    pub group_key: String,
    pub rows: Vec<GroupColumnStats>,
}

/// Mean of one column within one group, rounded for presentation
#[derive(Debug, Clone, Serialize)]
pub struct GroupMeanRow {
    pub group: String,
    pub column: String,
    pub mean: f32,
}

fn round2(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}

/// Eight-number summary of a sample. Empty input reports undefined
/// statistics rather than failing.
pub fn column_stats(values: &[f32]) -> ColumnStats {
    if values.is_empty() {
        return ColumnStats::empty();
    }
    let n = values.len();
    let v = Vector::from_slice(values);

    let mean = v.mean().unwrap_or(f32::NAN);
    let min = v.min().unwrap_or(f32::NAN);
    let max = v.max().unwrap_or(f32::NAN);
    // trueno variance divides by n; rescale to the n-1 sample form
    let std = if n < 2 {
        f32::NAN
    } else {
        (v.variance().unwrap_or(f32::NAN) * n as f32 / (n as f32 - 1.0)).sqrt()
    };

    let quartiles = DescriptiveStats::new(&v);
    let p25 = quartiles.quantile(0.25).unwrap_or(f32::NAN);
    let median = quartiles.quantile(0.5).unwrap_or(f32::NAN);
    let p75 = quartiles.quantile(0.75).unwrap_or(f32::NAN);

    ColumnStats {
        count: n as u64,
        mean: round2(mean),
        std: round2(std),
        min: round2(min),
        p25: round2(p25),
        median: round2(median),
        p75: round2(p75),
        max: round2(max),
    }
}

/// Partition rows by the distinct values of `group_key` in ascending label
/// order, Missing cells forming an "Unknown" bucket. Returns row indices
/// per group.
pub(crate) fn partition_rows(
    dataset: &Dataset,
    group_key: &str,
) -> Result<BTreeMap<String, Vec<usize>>> {
    let column = dataset.require_column(group_key)?;
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (i, value) in column.iter().enumerate() {
        groups.entry(value.group_label()).or_default().push(i);
    }
    Ok(groups)
}

fn values_at(dataset: &Dataset, key: &str, indices: &[usize]) -> Vec<f32> {
    let Some(column) = dataset.numeric(key) else {
        return Vec::new();
    };
    indices
        .iter()
        .filter_map(|&i| column[i])
        .map(|v| v as f32)
        .collect()
}

/// Descriptive statistics for each selected column within each group of
/// `group_key`. Absent value columns are dropped silently; an absent
/// grouping column is a structural failure.
pub fn describe_by_group(
    dataset: &Dataset,
    group_key: &str,
    value_keys: &[&str],
) -> Result<GroupStatsResult> {
    let present = dataset.filter_existing_columns(value_keys);
    let groups = partition_rows(dataset, group_key)?;
    debug!(group_key, groups = groups.len(), columns = present.len(), "describe by group");

    let mut rows = Vec::with_capacity(groups.len() * present.len());
    for (group, indices) in &groups {
        for key in &present {
            let values = values_at(dataset, key, indices);
            rows.push(GroupColumnStats {
                group: group.clone(),
                column: (*key).to_string(),
                stats: column_stats(&values),
            });
        }
    }
    Ok(GroupStatsResult {
        group_key: group_key.to_string(),
        rows,
    })
}

/// Descriptive statistics for each selected column over the whole dataset
pub fn describe_overall(dataset: &Dataset, value_keys: &[&str]) -> Vec<ColumnSummary> {
    dataset
        .filter_existing_columns(value_keys)
        .into_iter()
        .map(|key| {
            let values: Vec<f32> = dataset
                .numeric_present(key)
                .into_iter()
                .map(|v| v as f32)
                .collect();
            ColumnSummary {
                column: key.to_string(),
                stats: column_stats(&values),
            }
        })
        .collect()
}

/// Group means only, rounded to 2 decimals. Lighter than the full describe
/// for the tables most analyses start from.
pub fn mean_by_group(
    dataset: &Dataset,
    group_key: &str,
    value_keys: &[&str],
) -> Result<Vec<GroupMeanRow>> {
    let present = dataset.filter_existing_columns(value_keys);
    let groups = partition_rows(dataset, group_key)?;

    let mut rows = Vec::with_capacity(groups.len() * present.len());
    for (group, indices) in &groups {
        for key in &present {
            let values = values_at(dataset, key, indices);
            let mean = if values.is_empty() {
                f32::NAN
            } else {
                Vector::from_slice(&values).mean().unwrap_or(f32::NAN)
            };
            rows.push(GroupMeanRow {
                group: group.clone(),
                column: (*key).to_string(),
                mean: round2(mean),
            });
        }
    }
    Ok(rows)
}
