//! Quartile price tiers.

use crate::error::{AppraiserError, Result};
use crate::stats::DescriptiveStats;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Price quartile of a vehicle, cheapest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceTier {
    /// Up to the first quartile (minimum included).
    Economy,
    /// Above Q1, up to the median.
    Mid,
    /// Above the median, up to Q3.
    Premium,
    /// Above Q3.
    Luxury,
}

impl PriceTier {
    /// All tiers in ascending order.
    pub const ALL: [PriceTier; 4] = [Self::Economy, Self::Mid, Self::Premium, Self::Luxury];

    /// Lower-case tier name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Economy => "economy",
            Self::Mid => "mid",
            Self::Premium => "premium",
            Self::Luxury => "luxury",
        }
    }

    /// Tier of `value` given the quartile edges `[q1, median, q3]`.
    #[must_use]
    pub fn for_value(value: f64, edges: &[f64; 3]) -> Self {
        if value <= edges[0] {
            Self::Economy
        } else if value <= edges[1] {
            Self::Mid
        } else if value <= edges[2] {
            Self::Premium
        } else {
            Self::Luxury
        }
    }

    /// R-7 quartile edges of `values`.
    ///
    /// # Errors
    ///
    /// Returns an error if `values` is empty.
    pub fn edges(values: &[f64]) -> Result<[f64; 3]> {
        let q = DescriptiveStats::new(values).quantiles(&[0.25, 0.5, 0.75])?;
        Ok([q[0], q[1], q[2]])
    }

    /// Bins every value into a quartile tier.
    ///
    /// Repeated edges (heavily tied prices) leave some tiers empty rather
    /// than failing.
    ///
    /// # Errors
    ///
    /// Returns an error if `values` is empty or holds a non-finite value.
    ///
    /// # Examples
    ///
    /// ```
    /// use appraiser::analysis::PriceTier;
    ///
    /// let tiers = PriceTier::assign(&[5_000.0, 9_000.0, 14_000.0, 40_000.0]).expect("non-empty");
    /// assert_eq!(tiers, PriceTier::ALL.to_vec());
    /// ```
    pub fn assign(values: &[f64]) -> Result<Vec<Self>> {
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(AppraiserError::validation(
                "target",
                format!("non-finite value at row {pos}"),
            ));
        }
        let edges = Self::edges(values)?;
        Ok(values.iter().map(|&v| Self::for_value(v, &edges)).collect())
    }
}

impl fmt::Display for PriceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
