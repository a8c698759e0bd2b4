//! Statistical association between vehicle attributes and price.
//!
//! Everything here is a pure function of the dataset handed to
//! [`CorrelationEngine`]; nothing is cached between calls and the regression
//! stack is not involved.

mod tier;

pub use tier::PriceTier;

use crate::data::{Column, Dataset};
use crate::error::{AppraiserError, Result};
use crate::stats::{
    correlation_matrix, cramers_v_corrected, pearson, round_to, ContingencyTable,
    CorrelationMatrix, CorrelationMethod,
};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

/// Pearson, Spearman and Kendall matrices over the same numeric columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrices {
    /// Linear correlation.
    pub pearson: CorrelationMatrix,
    /// Rank correlation.
    pub spearman: CorrelationMatrix,
    /// Kendall tau-b.
    pub kendall: CorrelationMatrix,
}

/// Qualitative reading of the Pearson/Spearman agreement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyBand {
    /// Above 95%: outliers barely move the linear correlations.
    Excellent,
    /// Above 85%: small deviations between the two measures.
    High,
    /// Otherwise: strong outliers pull the measures apart.
    Low,
}

impl ConsistencyBand {
    /// Band for a consistency percentage.
    #[must_use]
    pub fn from_percentage(pct: f64) -> Self {
        if pct > 95.0 {
            Self::Excellent
        } else if pct > 85.0 {
            Self::High
        } else {
            Self::Low
        }
    }

    /// Human-readable interpretation.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Excellent => {
                "Excellent consistency. The dataset is clean and outlier influence is negligible."
            }
            Self::High => {
                "High consistency. Pearson and Spearman largely agree, with some small deviations."
            }
            Self::Low => {
                "Low consistency / significant outlier influence. Pearson and Spearman diverge, \
                 which points to strong outliers (opportunity vehicles) in the dataset."
            }
        }
    }

    /// Display severity tag.
    #[must_use]
    pub fn severity(self) -> &'static str {
        match self {
            Self::Excellent => "success",
            Self::High => "primary",
            Self::Low => "warning",
        }
    }
}

/// Agreement between the Pearson and Spearman matrices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    /// Mean |Pearson - Spearman| over all defined entries, 4 decimals.
    pub mean_abs_diff: f64,
    /// `(1 - mean_abs_diff) * 100`, 2 decimals.
    pub consistency_pct: f64,
    /// Qualitative band of `consistency_pct`.
    pub band: ConsistencyBand,
}

/// Association strength of one categorical column with the price tiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationScore {
    /// Categorical column name.
    pub feature: String,
    /// Bias-corrected Cramér's V, 4 decimals.
    pub score: f64,
}

/// Numeric features most strongly correlated with the target, by sign.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Influencers {
    /// Positive correlations, strongest first.
    pub positive: Vec<(String, f64)>,
    /// Negative correlations, most negative first.
    pub negative: Vec<(String, f64)>,
}

/// On-demand correlation and association queries over one dataset.
///
/// # Examples
///
/// ```
/// use appraiser::analysis::CorrelationEngine;
/// use appraiser::data::{Dataset, Record};
///
/// let rows: Vec<Record> = (0..8)
///     .map(|i| {
///         let hp = 60.0 + 10.0 * f64::from(i);
///         Record::new()
///             .with("horsepower", hp)
///             .with("highway_mpg", 50.0 - hp / 5.0)
///             .with("price", 100.0 * hp)
///     })
///     .collect();
/// let ds = Dataset::from_records(&rows).expect("consistent records");
///
/// let influencers = CorrelationEngine::new(&ds).top_influencers("price", 3).expect("price exists");
/// assert_eq!(influencers.positive[0].0, "horsepower");
/// assert_eq!(influencers.negative[0].0, "highway_mpg");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CorrelationEngine<'a> {
    dataset: &'a Dataset,
}

impl<'a> CorrelationEngine<'a> {
    /// Borrows `dataset` for the lifetime of the engine.
    #[must_use]
    pub fn new(dataset: &'a Dataset) -> Self {
        Self { dataset }
    }

    fn numeric_columns(&self) -> Result<Vec<(&'a str, &'a [f64])>> {
        if self.dataset.is_empty() {
            return Err(AppraiserError::empty_input("correlation analysis"));
        }
        let columns: Vec<(&str, &[f64])> = self
            .dataset
            .iter_columns()
            .filter_map(|(name, col)| match col {
                Column::Numeric(v) => Some((name, v.as_slice())),
                Column::Categorical(_) => None,
            })
            .collect();
        if columns.is_empty() {
            return Err(AppraiserError::configuration(
                "columns",
                "dataset has no numeric columns",
            ));
        }
        Ok(columns)
    }

    /// Correlation matrix of one kind over every numeric column.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty dataset or one without numeric columns.
    pub fn correlation_matrix(&self, method: CorrelationMethod) -> Result<CorrelationMatrix> {
        correlation_matrix(&self.numeric_columns()?, method)
    }

    /// All three matrices over every numeric column, target included.
    ///
    /// Zero-variance columns yield NaN off-diagonal entries and a warning.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty dataset or one without numeric columns.
    pub fn correlation_matrices(&self) -> Result<CorrelationMatrices> {
        let columns = self.numeric_columns()?;
        Ok(CorrelationMatrices {
            pearson: correlation_matrix(&columns, CorrelationMethod::Pearson)?,
            spearman: correlation_matrix(&columns, CorrelationMethod::Spearman)?,
            kendall: correlation_matrix(&columns, CorrelationMethod::Kendall)?,
        })
    }

    /// How closely Spearman tracks Pearson; a proxy for outlier density.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty dataset or one without numeric columns.
    pub fn consistency_report(&self) -> Result<ConsistencyReport> {
        let columns = self.numeric_columns()?;
        let p = correlation_matrix(&columns, CorrelationMethod::Pearson)?;
        let s = correlation_matrix(&columns, CorrelationMethod::Spearman)?;
        Ok(consistency_between(&p, &s))
    }

    /// Bias-corrected Cramér's V of every categorical column against the
    /// quartile tier of `target`, in dataset column order.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty dataset or when `target` is missing or
    /// not numeric.
    #[instrument(name = "categorical_association", skip(self), fields(rows = self.dataset.n_rows()))]
    pub fn categorical_association(&self, target: &str) -> Result<Vec<AssociationScore>> {
        if self.dataset.is_empty() {
            return Err(AppraiserError::empty_input("categorical association"));
        }
        let tiers: Vec<&str> = PriceTier::assign(self.dataset.numeric(target)?.as_slice())?
            .into_iter()
            .map(PriceTier::as_str)
            .collect();

        let mut scores = Vec::new();
        for (name, column) in self.dataset.iter_columns() {
            let Column::Categorical(values) = column else {
                continue;
            };
            let table = ContingencyTable::from_labels(values.as_slice(), &tiers[..])?;
            if table.shape().0 < 2 {
                warn!(column = name, "single-category column; association reported as 0");
            }
            scores.push(AssociationScore {
                feature: name.to_string(),
                score: cramers_v_corrected(&table),
            });
        }
        Ok(scores)
    }

    /// The `k` strongest positive and `k` strongest negative Pearson
    /// correlates of `target` among the other numeric columns.
    ///
    /// Columns with undefined (NaN) or zero correlation appear in neither list.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty dataset or when `target` is missing or
    /// not numeric.
    pub fn top_influencers(&self, target: &str, k: usize) -> Result<Influencers> {
        let columns = self.numeric_columns()?;
        let y = self.dataset.numeric(target)?.as_slice();

        let mut scored = Vec::new();
        for (name, values) in columns {
            if name == target {
                continue;
            }
            let r = pearson(values, y)?;
            if !r.is_nan() {
                scored.push((name.to_string(), round_to(r, 4)));
            }
        }

        let mut positive: Vec<(String, f64)> =
            scored.iter().filter(|(_, r)| *r > 0.0).cloned().collect();
        positive.sort_by(|a, b| b.1.total_cmp(&a.1));
        positive.truncate(k);

        let mut negative: Vec<(String, f64)> =
            scored.into_iter().filter(|(_, r)| *r < 0.0).collect();
        negative.sort_by(|a, b| a.1.total_cmp(&b.1));
        negative.truncate(k);

        Ok(Influencers { positive, negative })
    }
}

/// Consistency of two matrices over the same columns.
///
/// The mean absolute difference is taken per column first, then averaged
/// across columns; NaN entries are skipped at both levels, so a constant
/// column contributes only its zero diagonal.
#[must_use]
pub fn consistency_between(
    pearson: &CorrelationMatrix,
    spearman: &CorrelationMatrix,
) -> ConsistencyReport {
    let p = pearson.len();
    let column_means: Vec<f64> = (0..p)
        .filter_map(|j| {
            let diffs: Vec<f64> = (0..p)
                .map(|i| (pearson.get(i, j) - spearman.get(i, j)).abs())
                .filter(|d| !d.is_nan())
                .collect();
            (!diffs.is_empty()).then(|| diffs.iter().sum::<f64>() / diffs.len() as f64)
        })
        .collect();
    let mean_diff = if column_means.is_empty() {
        0.0
    } else {
        column_means.iter().sum::<f64>() / column_means.len() as f64
    };

    let consistency_pct = round_to((1.0 - mean_diff) * 100.0, 2);
    ConsistencyReport {
        mean_abs_diff: round_to(mean_diff, 4),
        consistency_pct,
        band: ConsistencyBand::from_percentage(consistency_pct),
    }
}
