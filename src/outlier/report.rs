//! Per-row scoring output of one training pass.

use super::PriceLabel;
use crate::data::Dataset;
use crate::error::Result;
use crate::stats::round_to;
use serde::{Deserialize, Serialize};

/// Derived fields for one dataset row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlierRow {
    /// Row position in the scored dataset.
    pub index: usize,
    /// Observed price.
    pub actual: f64,
    /// In-sample model estimate.
    pub predicted: f64,
    /// `actual - predicted`.
    pub residual: f64,
    /// `residual / residual_std`.
    pub z_score: f64,
    /// Classification of the unrounded z-score.
    pub label: PriceLabel,
}

impl OutlierRow {
    /// Copy with money and z-score fields rounded to 2 decimals for display.
    ///
    /// The label is carried over, not recomputed from the rounded z-score.
    #[must_use]
    pub fn rounded(&self) -> Self {
        Self {
            predicted: round_to(self.predicted, 2),
            residual: round_to(self.residual, 2),
            z_score: round_to(self.z_score, 2),
            ..*self
        }
    }
}

/// Result of a full `train_and_score` pass.
///
/// `labeled` is a copy of the input with `predicted`, `residual`, `z_score`
/// and `label` columns appended; `normal` holds exactly its NORMAL rows.
#[derive(Debug, Clone)]
pub struct OutlierReport {
    rows: Vec<OutlierRow>,
    labeled: Dataset,
    normal: Dataset,
    residual_std: f64,
    r_squared: f64,
}

/// Serializable summary used by [`OutlierReport::to_json`].
#[derive(Serialize)]
struct ReportView {
    residual_std: f64,
    r_squared: f64,
    opportunities: usize,
    overpriced: usize,
    normal: usize,
    rows: Vec<OutlierRow>,
}

impl OutlierReport {
    pub(crate) fn new(
        rows: Vec<OutlierRow>,
        labeled: Dataset,
        normal: Dataset,
        residual_std: f64,
        r_squared: f64,
    ) -> Self {
        Self {
            rows,
            labeled,
            normal,
            residual_std,
            r_squared,
        }
    }

    /// One entry per input row, in input order.
    #[must_use]
    pub fn rows(&self) -> &[OutlierRow] {
        &self.rows
    }

    /// Number of scored rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when nothing was scored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Input rows plus the derived columns.
    #[must_use]
    pub fn labeled(&self) -> &Dataset {
        &self.labeled
    }

    /// The NORMAL rows of [`labeled`](Self::labeled).
    #[must_use]
    pub fn normal(&self) -> &Dataset {
        &self.normal
    }

    /// Residual spread used as the z-score denominator (1.0 when the raw
    /// spread was zero).
    #[must_use]
    pub fn residual_std(&self) -> f64 {
        self.residual_std
    }

    /// In-sample R² over every row.
    #[must_use]
    pub fn r_squared(&self) -> f64 {
        self.r_squared
    }

    /// Number of rows carrying `label`.
    #[must_use]
    pub fn count(&self, label: PriceLabel) -> usize {
        self.rows.iter().filter(|r| r.label == label).count()
    }

    /// Rows carrying `label`, in input order.
    pub fn rows_with(&self, label: PriceLabel) -> impl Iterator<Item = &OutlierRow> {
        self.rows.iter().filter(move |r| r.label == label)
    }

    /// The `n` most underpriced rows, most negative z-score first.
    #[must_use]
    pub fn top_opportunities(&self, n: usize) -> Vec<&OutlierRow> {
        let mut picks: Vec<&OutlierRow> = self.rows_with(PriceLabel::Opportunity).collect();
        picks.sort_by(|a, b| a.z_score.total_cmp(&b.z_score));
        picks.truncate(n);
        picks
    }

    /// JSON with label counts and display-rounded rows.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        let view = ReportView {
            residual_std: round_to(self.residual_std, 2),
            r_squared: round_to(self.r_squared, 4),
            opportunities: self.count(PriceLabel::Opportunity),
            overpriced: self.count(PriceLabel::Overpriced),
            normal: self.count(PriceLabel::Normal),
            rows: self.rows.iter().map(OutlierRow::rounded).collect(),
        };
        Ok(serde_json::to_string(&view)?)
    }
}
