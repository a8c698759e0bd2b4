//! Descriptive statistics, correlation and categorical association.
//!
//! - Mean, population standard deviation and R-7 quantiles (Hyndman & Fan 1996)
//! - Average-tie ranks (the Spearman building block)
//! - [`correlation`]: Pearson, Spearman and Kendall tau-b, plus labeled matrices
//! - [`association`]: contingency tables, χ² and bias-corrected Cramér's V
//!
//! # Examples
//!
//! ```
//! use appraiser::stats::DescriptiveStats;
//!
//! let data = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let stats = DescriptiveStats::new(&data);
//!
//! assert_eq!(stats.quantile(0.5).expect("median of non-empty data"), 3.0);
//! assert_eq!(stats.quantile(0.0).expect("min of non-empty data"), 1.0);
//! assert_eq!(stats.quantile(1.0).expect("max of non-empty data"), 5.0);
//! ```

pub mod association;
pub mod correlation;

pub use association::{chi_square, cramers_v_corrected, ChiSquareResult, ContingencyTable};
pub use correlation::{
    correlation_matrix, kendall_tau_b, pearson, spearman, CorrelationMatrix, CorrelationMethod,
};

use crate::error::{AppraiserError, Result};

/// Descriptive statistics over a borrowed slice of observations.
#[derive(Debug, Clone, Copy)]
pub struct DescriptiveStats<'a> {
    data: &'a [f64],
}

impl<'a> DescriptiveStats<'a> {
    /// Wrap a slice without copying it.
    #[must_use]
    pub fn new(data: &'a [f64]) -> Self {
        Self { data }
    }

    /// Number of observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when there are no observations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Arithmetic mean; 0.0 for empty data.
    #[must_use]
    pub fn mean(&self) -> f64 {
        mean(self.data)
    }

    /// Population standard deviation (divides by n); 0.0 for empty data.
    #[must_use]
    pub fn std(&self) -> f64 {
        population_std(self.data)
    }

    /// Quantile using linear interpolation between order statistics (R-7).
    ///
    /// # Errors
    ///
    /// Returns an error if the data is empty or `q` is outside `[0, 1]`.
    pub fn quantile(&self, q: f64) -> Result<f64> {
        let mut sorted = self.data.to_vec();
        sorted.sort_by(f64::total_cmp);
        quantile_sorted(&sorted, q)
    }

    /// Several quantiles from one sort, in the order requested.
    ///
    /// # Errors
    ///
    /// Same conditions as [`DescriptiveStats::quantile`].
    pub fn quantiles(&self, qs: &[f64]) -> Result<Vec<f64>> {
        let mut sorted = self.data.to_vec();
        sorted.sort_by(f64::total_cmp);
        qs.iter().map(|&q| quantile_sorted(&sorted, q)).collect()
    }
}

/// Arithmetic mean; 0.0 for empty input.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation: `sqrt((1/n) Σ (x - x̄)²)`.
#[must_use]
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// R-7 quantile on data that is already sorted ascending.
///
/// # Errors
///
/// Returns an error if `sorted` is empty or `q` is outside `[0, 1]`.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Result<f64> {
    if sorted.is_empty() {
        return Err(AppraiserError::empty_input("quantile"));
    }
    if !(0.0..=1.0).contains(&q) {
        return Err(AppraiserError::configuration(
            "quantile",
            format!("must be in [0, 1], got {q}"),
        ));
    }

    // h = (n - 1) * q, 0-indexed position
    let h = (sorted.len() - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    let fraction = h - lo as f64;
    Ok(sorted[lo] + fraction * (sorted[hi] - sorted[lo]))
}

/// 1-based ranks with ties sharing the average of the positions they span.
///
/// `[10, 20, 20, 30]` ranks as `[1, 2.5, 2.5, 4]`.
#[must_use]
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // positions start..end hold ranks start+1..=end
        let avg = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = avg;
        }
        start = end;
    }
    ranks
}

/// Round half away from zero to `places` decimals.
#[must_use]
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
#[path = "tests_descriptive_contract.rs"]
mod tests_descriptive_contract;
