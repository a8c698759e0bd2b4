//! Association between two categorical variables.
//!
//! # Mathematical Background
//!
//! ## Pearson χ² test of independence
//!
//! ```text
//! E_ij = (row_i total)(col_j total) / n
//! χ²   = Σ (O_ij - E_ij)² / E_ij
//! ```
//!
//! A 2×2 table (one degree of freedom) gets Yates' continuity correction,
//! each |O - E| shrunk by min(0.5, |O - E|).
//!
//! ## Bias-corrected Cramér's V (Bergsma 2013)
//!
//! ```text
//! φ²  = χ² / n
//! φ²c = max(0, φ² - (k-1)(r-1)/(n-1))
//! r̃   = r - (r-1)²/(n-1),   k̃ = k - (k-1)²/(n-1)
//! V   = sqrt(φ²c / min(k̃-1, r̃-1))
//! ```
//!
//! # Examples
//!
//! ```
//! use appraiser::stats::{cramers_v_corrected, ContingencyTable};
//!
//! let fuel = ["gas", "gas", "diesel", "diesel", "gas", "diesel"];
//! let tier = ["low", "low", "high", "high", "low", "high"];
//! let table = ContingencyTable::from_labels(&fuel, &tier).expect("equal lengths");
//!
//! let v = cramers_v_corrected(&table);
//! assert!(v > 0.5);
//! ```

use crate::error::{AppraiserError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cross-tabulated counts of two categorical variables.
///
/// Rows and columns are kept in sorted label order. Rows and columns whose
/// total is zero never appear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContingencyTable {
    row_labels: Vec<String>,
    col_labels: Vec<String>,
    counts: Vec<Vec<usize>>,
}

impl ContingencyTable {
    /// Cross-tabulate two parallel label sequences.
    ///
    /// # Errors
    ///
    /// Returns an error if the sequences differ in length.
    pub fn from_labels<R, C>(rows: &[R], cols: &[C]) -> Result<Self>
    where
        R: AsRef<str>,
        C: AsRef<str>,
    {
        if rows.len() != cols.len() {
            return Err(AppraiserError::DimensionMismatch {
                expected: format!("{} row labels", rows.len()),
                actual: format!("{} column labels", cols.len()),
            });
        }

        let mut cells: BTreeMap<(&str, &str), usize> = BTreeMap::new();
        for (r, c) in rows.iter().zip(cols) {
            *cells.entry((r.as_ref(), c.as_ref())).or_insert(0) += 1;
        }

        let mut row_labels: Vec<String> = cells.keys().map(|(r, _)| (*r).to_string()).collect();
        row_labels.dedup();
        let mut col_labels: Vec<String> = cells.keys().map(|(_, c)| (*c).to_string()).collect();
        col_labels.sort();
        col_labels.dedup();

        let mut counts = vec![vec![0; col_labels.len()]; row_labels.len()];
        for ((r, c), n) in cells {
            // labels were collected from these keys, so both searches hit
            if let (Ok(i), Ok(j)) = (
                row_labels.binary_search_by(|l| l.as_str().cmp(r)),
                col_labels.binary_search_by(|l| l.as_str().cmp(c)),
            ) {
                counts[i][j] = n;
            }
        }

        Ok(Self {
            row_labels,
            col_labels,
            counts,
        })
    }

    /// Build from explicit counts, dropping all-zero rows and columns.
    ///
    /// # Errors
    ///
    /// Returns an error if the label counts do not match the count grid.
    pub fn from_counts(
        row_labels: Vec<String>,
        col_labels: Vec<String>,
        counts: Vec<Vec<usize>>,
    ) -> Result<Self> {
        if counts.len() != row_labels.len() {
            return Err(AppraiserError::dimension_mismatch(
                "contingency rows",
                row_labels.len(),
                counts.len(),
            ));
        }
        if let Some(bad) = counts.iter().find(|row| row.len() != col_labels.len()) {
            return Err(AppraiserError::dimension_mismatch(
                "contingency columns",
                col_labels.len(),
                bad.len(),
            ));
        }

        let keep_cols: Vec<usize> = (0..col_labels.len())
            .filter(|&j| counts.iter().any(|row| row[j] > 0))
            .collect();
        let (row_labels, counts): (Vec<String>, Vec<Vec<usize>>) = row_labels
            .into_iter()
            .zip(counts)
            .filter(|(_, row)| row.iter().any(|&c| c > 0))
            .map(|(label, row)| {
                let kept = keep_cols.iter().map(|&j| row[j]).collect::<Vec<usize>>();
                (label, kept)
            })
            .unzip();
        let col_labels = keep_cols.iter().map(|&j| col_labels[j].clone()).collect();

        Ok(Self {
            row_labels,
            col_labels,
            counts,
        })
    }

    /// (rows, columns) after empty ones were dropped.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.row_labels.len(), self.col_labels.len())
    }

    /// Row category labels.
    #[must_use]
    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    /// Column category labels.
    #[must_use]
    pub fn col_labels(&self) -> &[String] {
        &self.col_labels
    }

    /// Count in cell (i, j).
    #[must_use]
    pub fn count(&self, i: usize, j: usize) -> usize {
        self.counts[i][j]
    }

    /// Total number of observations.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    fn row_totals(&self) -> Vec<f64> {
        self.counts
            .iter()
            .map(|row| row.iter().sum::<usize>() as f64)
            .collect()
    }

    fn col_totals(&self) -> Vec<f64> {
        (0..self.col_labels.len())
            .map(|j| self.counts.iter().map(|row| row[j]).sum::<usize>() as f64)
            .collect()
    }
}

/// Result of a χ² test of independence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChiSquareResult {
    /// χ² statistic
    pub statistic: f64,

    /// Degrees of freedom, (r-1)(k-1)
    pub df: usize,

    /// Whether Yates' continuity correction was applied
    pub corrected: bool,
}

/// Pearson χ² statistic for independence of a contingency table's rows and columns.
///
/// Tables with fewer than two rows or columns have statistic 0 and df 0.
#[must_use]
pub fn chi_square(table: &ContingencyTable) -> ChiSquareResult {
    let (r, k) = table.shape();
    let n = table.total() as f64;
    let df = r.saturating_sub(1) * k.saturating_sub(1);
    if df == 0 || n == 0.0 {
        return ChiSquareResult {
            statistic: 0.0,
            df,
            corrected: false,
        };
    }

    let corrected = df == 1;
    let row_totals = table.row_totals();
    let col_totals = table.col_totals();

    let mut statistic = 0.0;
    for (i, row_total) in row_totals.iter().enumerate() {
        for (j, col_total) in col_totals.iter().enumerate() {
            let expected = row_total * col_total / n;
            let mut deviation = (table.count(i, j) as f64 - expected).abs();
            if corrected {
                deviation -= deviation.min(0.5);
            }
            statistic += deviation * deviation / expected;
        }
    }

    ChiSquareResult {
        statistic,
        df,
        corrected,
    }
}

/// Bias-corrected Cramér's V in `[0, 1]`, rounded to 4 decimals.
///
/// Degenerate tables (a single row or column, n ≤ 1, or a non-positive
/// corrected denominator) score 0.0.
#[must_use]
pub fn cramers_v_corrected(table: &ContingencyTable) -> f64 {
    let (r, k) = table.shape();
    let n = table.total() as f64;
    if n <= 1.0 || r < 2 || k < 2 {
        return 0.0;
    }

    let chi2 = chi_square(table).statistic;
    let (r, k) = (r as f64, k as f64);
    let phi2 = chi2 / n;
    let phi2_corr = (phi2 - (k - 1.0) * (r - 1.0) / (n - 1.0)).max(0.0);
    let r_corr = r - (r - 1.0).powi(2) / (n - 1.0);
    let k_corr = k - (k - 1.0).powi(2) / (n - 1.0);

    let denom = (k_corr - 1.0).min(r_corr - 1.0);
    if denom <= 0.0 {
        return 0.0;
    }
    let v = (phi2_corr / denom).sqrt().clamp(0.0, 1.0);
    super::round_to(v, 4)
}
