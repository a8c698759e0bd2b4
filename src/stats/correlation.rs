//! Pairwise correlation coefficients and labeled correlation matrices.
//!
//! # Mathematical Background
//!
//! ## Pearson
//!
//! ```text
//! ρ(X, Y) = Cov(X, Y) / (σ_X σ_Y)
//! ```
//!
//! ## Spearman
//!
//! Pearson correlation of the average-tie ranks of X and Y.
//!
//! ## Kendall tau-b
//!
//! ```text
//! τ_b = (n_c - n_d) / sqrt((n_0 - n_1)(n_0 - n_2))
//! ```
//!
//! where `n_0 = n(n-1)/2`, `n_1` and `n_2` count pairs tied in X and in Y.
//!
//! A constant input has no defined correlation; every coefficient here
//! returns NaN for it rather than an error.
//!
//! # Examples
//!
//! ```
//! use appraiser::stats::{pearson, spearman};
//!
//! let x = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let y = [1.0, 4.0, 9.0, 16.0, 25.0];
//!
//! let r = pearson(&x, &y).expect("equal lengths");
//! let rho = spearman(&x, &y).expect("equal lengths");
//! assert!(r > 0.9 && r < 1.0);
//! assert!((rho - 1.0).abs() < 1e-12); // monotone relationship
//! ```

use super::average_ranks;
use crate::error::{AppraiserError, Result};
use crate::primitives::Matrix;
use serde::{Deserialize, Serialize};
use std::fmt;

/// True when every value equals the first, compared exactly.
fn is_constant(values: &[f64]) -> bool {
    values.split_first().map_or(true, |(first, rest)| rest.iter().all(|v| v == first))
}

/// Correlation coefficient family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationMethod {
    /// Linear correlation.
    Pearson,
    /// Rank correlation (Pearson on ranks).
    Spearman,
    /// Concordance-based rank correlation (tau-b).
    Kendall,
}

impl CorrelationMethod {
    /// All three methods in reporting order.
    pub const ALL: [CorrelationMethod; 3] = [Self::Pearson, Self::Spearman, Self::Kendall];

    /// Coefficient for one pair of columns.
    ///
    /// # Errors
    ///
    /// Returns an error on length mismatch or empty input.
    pub fn coefficient(self, x: &[f64], y: &[f64]) -> Result<f64> {
        match self {
            Self::Pearson => pearson(x, y),
            Self::Spearman => spearman(x, y),
            Self::Kendall => kendall_tau_b(x, y),
        }
    }
}

impl fmt::Display for CorrelationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pearson => "pearson",
            Self::Spearman => "spearman",
            Self::Kendall => "kendall",
        };
        f.write_str(name)
    }
}

fn check_pair(x: &[f64], y: &[f64]) -> Result<()> {
    if x.len() != y.len() {
        return Err(AppraiserError::DimensionMismatch {
            expected: format!("{} values in x", x.len()),
            actual: format!("{} values in y", y.len()),
        });
    }
    if x.is_empty() {
        return Err(AppraiserError::empty_input("correlation"));
    }
    Ok(())
}

/// Pearson product-moment correlation.
///
/// Returns NaN when either input is constant.
///
/// # Errors
///
/// Returns an error if the slices differ in length or are empty.
pub fn pearson(x: &[f64], y: &[f64]) -> Result<f64> {
    check_pair(x, y)?;
    if is_constant(x) || is_constant(y) {
        return Ok(f64::NAN);
    }
    let n = x.len() as f64;
    let x_mean = x.iter().sum::<f64>() / n;
    let y_mean = y.iter().sum::<f64>() / n;

    let mut cov_sum = 0.0;
    let mut x_var_sum = 0.0;
    let mut y_var_sum = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        let dx = xi - x_mean;
        let dy = yi - y_mean;
        cov_sum += dx * dy;
        x_var_sum += dx * dx;
        y_var_sum += dy * dy;
    }

    let x_std = (x_var_sum / n).sqrt();
    let y_std = (y_var_sum / n).sqrt();
    if x_std == 0.0 || y_std == 0.0 {
        return Ok(f64::NAN);
    }

    let r = (cov_sum / n) / (x_std * y_std);
    Ok(r.clamp(-1.0, 1.0))
}

/// Spearman rank correlation with average ranks for ties.
///
/// # Errors
///
/// Returns an error if the slices differ in length or are empty.
pub fn spearman(x: &[f64], y: &[f64]) -> Result<f64> {
    check_pair(x, y)?;
    pearson(&average_ranks(x), &average_ranks(y))
}

/// Kendall rank correlation, tau-b variant (tie-adjusted).
///
/// O(n²) over all pairs.
///
/// # Errors
///
/// Returns an error if the slices differ in length or are empty.
pub fn kendall_tau_b(x: &[f64], y: &[f64]) -> Result<f64> {
    check_pair(x, y)?;
    let n = x.len();

    let mut concordant: i64 = 0;
    let mut discordant: i64 = 0;
    let mut ties_x: i64 = 0;
    let mut ties_y: i64 = 0;
    for i in 0..n {
        for j in (i + 1)..n {
            let dx = x[i] - x[j];
            let dy = y[i] - y[j];
            let tied_x = dx == 0.0;
            let tied_y = dy == 0.0;
            if tied_x {
                ties_x += 1;
            }
            if tied_y {
                ties_y += 1;
            }
            if tied_x || tied_y {
                continue;
            }
            if (dx > 0.0) == (dy > 0.0) {
                concordant += 1;
            } else {
                discordant += 1;
            }
        }
    }

    let n0 = (n * n.saturating_sub(1) / 2) as f64;
    let denom = ((n0 - ties_x as f64) * (n0 - ties_y as f64)).sqrt();
    if denom <= 0.0 {
        return Ok(f64::NAN);
    }
    let tau = (concordant - discordant) as f64 / denom;
    Ok(tau.clamp(-1.0, 1.0))
}

/// Square correlation matrix with the column names it was computed over.
///
/// Diagonal entries are 1.0. Off-diagonal entries involving a constant
/// column are NaN (serialized as `null`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    method: CorrelationMethod,
    names: Vec<String>,
    values: Matrix<f64>,
}

impl CorrelationMatrix {
    /// Coefficient family this matrix holds.
    #[must_use]
    pub fn method(&self) -> CorrelationMethod {
        self.method
    }

    /// Column names, in row/column order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Matrix dimension.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True when computed over zero columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Entry at (i, j).
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values.get(i, j)
    }

    /// Entry for a pair of column names.
    #[must_use]
    pub fn value(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.index_of(a)?;
        let j = self.index_of(b)?;
        Some(self.values.get(i, j))
    }

    /// Position of a column name.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Underlying row-major matrix.
    #[must_use]
    pub fn matrix(&self) -> &Matrix<f64> {
        &self.values
    }

    /// True if `(i, j)` and `(j, i)` agree within `tol`, NaN pairing with NaN.
    #[must_use]
    pub fn is_symmetric(&self, tol: f64) -> bool {
        let p = self.len();
        (0..p).all(|i| {
            (i + 1..p).all(|j| {
                let a = self.values.get(i, j);
                let b = self.values.get(j, i);
                (a.is_nan() && b.is_nan()) || (a - b).abs() <= tol
            })
        })
    }
}

/// Correlation matrix over named columns of equal length.
///
/// Constant columns are logged and produce NaN off-diagonal entries.
///
/// # Errors
///
/// Returns an error if there are no columns, the columns are empty, or
/// their lengths differ.
pub fn correlation_matrix(
    columns: &[(&str, &[f64])],
    method: CorrelationMethod,
) -> Result<CorrelationMatrix> {
    let p = columns.len();
    let Some((_, first)) = columns.first() else {
        return Err(AppraiserError::empty_input("correlation matrix columns"));
    };
    let n = first.len();
    if n == 0 {
        return Err(AppraiserError::empty_input("correlation matrix rows"));
    }
    for (name, col) in columns {
        if col.len() != n {
            return Err(AppraiserError::dimension_mismatch(name, n, col.len()));
        }
    }

    // Spearman reuses the Pearson kernel on ranks computed once per column.
    let ranked: Vec<Vec<f64>>;
    let inputs: Vec<&[f64]> = if method == CorrelationMethod::Spearman {
        ranked = columns.iter().map(|(_, c)| average_ranks(c)).collect();
        ranked.iter().map(Vec::as_slice).collect()
    } else {
        columns.iter().map(|(_, c)| *c).collect()
    };
    let kernel: fn(&[f64], &[f64]) -> Result<f64> = match method {
        CorrelationMethod::Kendall => kendall_tau_b,
        CorrelationMethod::Pearson | CorrelationMethod::Spearman => pearson,
    };

    let mut values = Matrix::zeros(p, p);
    for i in 0..p {
        values.set(i, i, 1.0);
        for j in (i + 1)..p {
            let r = kernel(inputs[i], inputs[j])?;
            values.set(i, j, r);
            values.set(j, i, r);
        }
    }

    for (name, col) in columns {
        if is_constant(col) {
            tracing::warn!(column = *name, %method, "zero-variance column; correlations undefined");
        }
    }

    Ok(CorrelationMatrix {
        method,
        names: columns.iter().map(|(name, _)| (*name).to_string()).collect(),
        values,
    })
}

#[cfg(test)]
#[path = "correlation_tests.rs"]
mod tests;
