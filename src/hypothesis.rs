//! Non-parametric hypothesis tests over dataset columns
//!
//! Three test kinds cover every comparison the analyses ask for: two
//! independent groups (Mann-Whitney U), paired continuous columns
//! (Spearman rank correlation), and two-or-more groups (Kruskal-Wallis).
//! Ranks use average-rank tie handling and the asymptotic approximations
//! with tie correction throughout.
//!
//! Insufficient data for one column never aborts a battery: the column's
//! result row is omitted and the remaining tests proceed.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::catalog::ColumnCatalog;
use crate::describe::partition_rows;
use crate::error::Result;
use crate::special;
use crate::table::Dataset;

/// Fixed significance threshold for classification
pub const ALPHA: f64 = 0.05;

/// Classification of a p-value at α=0.05
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Significance {
    Significant,
    NotSignificant,
}

impl Significance {
    pub fn from_p(p: f64) -> Self {
        if p < ALPHA {
            Significance::Significant
        } else {
            Significance::NotSignificant
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Significance::Significant => "significant",
            Significance::NotSignificant => "not significant",
        }
    }
}

/// Raw statistic and p-value of one rank test
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankTest {
    pub statistic: f64,
    pub p_value: f64,
}

/// One result row of a test battery
#[derive(Debug, Clone, Serialize)]
pub struct TestOutcome {
    /// Human-readable column label from the catalog
    pub label: String,
    pub statistic: f64,
    pub p_value: f64,
    pub significance: Significance,
}

impl TestOutcome {
    fn new(label: &str, test: RankTest) -> Self {
        Self {
            label: label.to_string(),
            statistic: test.statistic,
            p_value: test.p_value,
            significance: Significance::from_p(test.p_value),
        }
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: statistic={:.3}, p={:.5} ({})",
            self.label,
            self.statistic,
            self.p_value,
            self.significance.label()
        )
    }
}

/// Test variant plus its grouping specification. The value column is
/// supplied per invocation so one descriptor can drive a whole battery.
#[derive(Debug, Clone, Copy)]
pub enum TestKind<'a> {
    /// Mann-Whitney U between the rows where `group_key` equals `group_a`
    /// and those where it equals `group_b`
    TwoGroupRank {
        group_key: &'a str,
        group_a: &'a str,
        group_b: &'a str,
    },
    /// Spearman rank correlation of the value column against `against_key`
    RankCorrelation { against_key: &'a str },
    /// Kruskal-Wallis across all distinct values of `group_key`
    MultiGroupRank { group_key: &'a str },
}

// Average ranks for sorted (value, tag) pairs; tied runs share the mean of
// their positional ranks.
fn average_ranks(sorted: &[(f64, usize)]) -> Vec<f64> {
    let n = sorted.len();
    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && (sorted[j].0 - sorted[i].0).abs() < 1e-12 {
            j += 1;
        }
        let avg_rank = (i + 1 + j) as f64 / 2.0;
        for rank in ranks.iter_mut().take(j).skip(i) {
            *rank = avg_rank;
        }
        i = j;
    }
    ranks
}

// Σ tₖ(tₖ² - 1) over tied runs, for the variance corrections
fn tie_correction(sorted: &[(f64, usize)]) -> f64 {
    let n = sorted.len();
    let mut correction = 0.0;
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && (sorted[j].0 - sorted[i].0).abs() < 1e-12 {
            j += 1;
        }
        let t = (j - i) as f64;
        if t > 1.0 {
            correction += t * (t * t - 1.0);
        }
        i = j;
    }
    correction
}

fn sorted_with_tags(groups: &[&[f64]]) -> Vec<(f64, usize)> {
    let total: usize = groups.iter().map(|g| g.len()).sum();
    let mut combined = Vec::with_capacity(total);
    for (tag, group) in groups.iter().enumerate() {
        for &v in *group {
            combined.push((v, tag));
        }
    }
    combined.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    combined
}

/// Mann-Whitney U, two-sided, normal approximation with tie correction and
/// continuity correction (the scipy asymptotic path). Reports U for the
/// first sample. `None` when either sample is empty or every observation
/// is tied.
pub fn mann_whitney_u(a: &[f64], b: &[f64]) -> Option<RankTest> {
    if a.is_empty() || b.is_empty() {
        return None;
    }
    let n1 = a.len() as f64;
    let n2 = b.len() as f64;
    let n = n1 + n2;

    let combined = sorted_with_tags(&[a, b]);
    let ranks = average_ranks(&combined);

    let r1: f64 = combined
        .iter()
        .zip(ranks.iter())
        .filter(|((_, tag), _)| *tag == 0)
        .map(|(_, &r)| r)
        .sum();
    let u1 = r1 - n1 * (n1 + 1.0) / 2.0;

    let ties = tie_correction(&combined);
    let mu = n1 * n2 / 2.0;
    let sigma_sq = n1 * n2 / 12.0 * (n + 1.0 - ties / (n * (n - 1.0)));
    if !(sigma_sq > 0.0) {
        return None;
    }

    let z = ((u1 - mu).abs() - 0.5).max(0.0) / sigma_sq.sqrt();
    let p_value = 2.0 * (1.0 - special::normal_cdf(z));

    Some(RankTest {
        statistic: u1,
        p_value: p_value.clamp(0.0, 1.0),
    })
}

/// Spearman rank correlation of two paired samples. The p-value comes from
/// the t-distribution on the correlation of the ranks. `None` below 3
/// pairs or when either side has no rank variance; |ρ| = 1 reports p = 0.
pub fn spearman(x: &[f64], y: &[f64]) -> Option<RankTest> {
    if x.len() != y.len() || x.len() < 3 {
        return None;
    }
    let n = x.len();

    let rank_of = |values: &[f64]| -> Vec<f64> {
        let mut tagged: Vec<(f64, usize)> =
            values.iter().copied().zip(0..n).collect();
        tagged.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        let ranks = average_ranks(&tagged);
        let mut by_row = vec![0.0; n];
        for ((_, row), rank) in tagged.iter().zip(ranks.iter()) {
            by_row[*row] = *rank;
        }
        by_row
    };

    let rx = rank_of(x);
    let ry = rank_of(y);

    let nf = n as f64;
    let mean = (nf + 1.0) / 2.0;
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for i in 0..n {
        let dx = rx[i] - mean;
        let dy = ry[i] - mean;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return None;
    }

    let rho = (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0);
    let p_value = if 1.0 - rho * rho < 1e-12 {
        0.0
    } else {
        let df = nf - 2.0;
        let t = rho * (df / (1.0 - rho * rho)).sqrt();
        special::students_t_two_sided_p(t, df)
    };

    Some(RankTest {
        statistic: rho,
        p_value,
    })
}

/// Kruskal-Wallis H across two or more groups, tie-corrected, referred to
/// χ²(k−1). Size-1 groups are permitted (they reduce power, a caller
/// concern). `None` below 2 groups, below 2 total observations, or when
/// every observation is tied.
pub fn kruskal_wallis(groups: &[&[f64]]) -> Option<RankTest> {
    let k = groups.len();
    if k < 2 || groups.iter().any(|g| g.is_empty()) {
        return None;
    }
    let total: usize = groups.iter().map(|g| g.len()).sum();
    if total < 2 {
        return None;
    }
    let nf = total as f64;

    let combined = sorted_with_tags(groups);
    let ranks = average_ranks(&combined);

    let mut rank_sums = vec![0.0; k];
    for ((_, tag), &rank) in combined.iter().zip(ranks.iter()) {
        rank_sums[*tag] += rank;
    }

    let mean_rank = (nf + 1.0) / 2.0;
    let mut h = 0.0;
    for (tag, group) in groups.iter().enumerate() {
        let ni = group.len() as f64;
        let mean_rank_i = rank_sums[tag] / ni;
        h += ni * (mean_rank_i - mean_rank).powi(2);
    }
    h *= 12.0 / (nf * (nf + 1.0));

    let denom = 1.0 - tie_correction(&combined) / (nf * nf * nf - nf);
    if denom <= 1e-15 {
        // Every observation identical: the test statistic is undefined
        return None;
    }
    h /= denom;

    let df = (k - 1) as f64;
    let p_value = special::chi_squared_sf(h, df);

    Some(RankTest {
        statistic: h,
        p_value,
    })
}

fn numeric_where(
    dataset: &Dataset,
    value_key: &str,
    group_column: &[crate::table::Value],
    group_value: &str,
) -> Vec<f64> {
    let Some(values) = dataset.numeric(value_key) else {
        return Vec::new();
    };
    group_column
        .iter()
        .zip(values.iter())
        .filter(|(g, _)| g.as_text() == Some(group_value))
        .filter_map(|(_, v)| *v)
        .collect()
}

/// Run one test over one value column. `Ok(None)` means the column had
/// insufficient data for this test; structural failures (absent grouping
/// or value column) are errors.
pub fn run_test(
    dataset: &Dataset,
    kind: TestKind<'_>,
    value_key: &str,
    catalog: &ColumnCatalog,
) -> Result<Option<TestOutcome>> {
    dataset.require_column(value_key)?;
    let label = catalog.label_or_key(value_key);

    let test = match kind {
        TestKind::TwoGroupRank {
            group_key,
            group_a,
            group_b,
        } => {
            let group_column = dataset.require_column(group_key)?;
            let a = numeric_where(dataset, value_key, group_column, group_a);
            let b = numeric_where(dataset, value_key, group_column, group_b);
            mann_whitney_u(&a, &b)
        }
        TestKind::RankCorrelation { against_key } => {
            let against = dataset
                .numeric(against_key)
                .ok_or_else(|| crate::error::AnalysisError::MissingColumn(against_key.into()))?;
            let values = dataset.numeric(value_key).unwrap_or_default();
            // Pairwise-complete: keep rows where both sides are present
            let (xs, ys): (Vec<f64>, Vec<f64>) = against
                .iter()
                .zip(values.iter())
                .filter_map(|(x, y)| x.zip(*y))
                .unzip();
            spearman(&xs, &ys)
        }
        TestKind::MultiGroupRank { group_key } => {
            let groups = partition_rows(dataset, group_key)?;
            let values = dataset.numeric(value_key).unwrap_or_default();
            let samples: Vec<Vec<f64>> = groups
                .values()
                .map(|indices| indices.iter().filter_map(|&i| values[i]).collect())
                .filter(|sample: &Vec<f64>| !sample.is_empty())
                .collect();
            let refs: Vec<&[f64]> = samples.iter().map(Vec::as_slice).collect();
            kruskal_wallis(&refs)
        }
    };

    if test.is_none() {
        debug!(value_key, "insufficient data for test, omitting result row");
    }
    Ok(test.map(|t| TestOutcome::new(label, t)))
}

/// Map one test kind over a list of score columns. Absent columns are
/// dropped up front; columns with insufficient data are skipped. Partial
/// results are always preferred over aborting the battery.
pub fn run_battery(
    dataset: &Dataset,
    kind: TestKind<'_>,
    value_keys: &[&str],
    catalog: &ColumnCatalog,
) -> Result<Vec<TestOutcome>> {
    let present = dataset.filter_existing_columns(value_keys);
    let mut outcomes = Vec::with_capacity(present.len());
    for key in present {
        if let Some(outcome) = run_test(dataset, kind, key, catalog)? {
            outcomes.push(outcome);
        }
    }
    Ok(outcomes)
}
