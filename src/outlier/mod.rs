//! Residual-based price outlier detection.
//!
//! The model is fitted on the whole dataset and then asked to predict those
//! same rows. Residuals are measured against the model's own fit, not a
//! held-out split: the goal is to flag anomalies inside a known dataset, not
//! to estimate generalization error. Adding a train/test split here would
//! change which rows get flagged.
//!
//! ```text
//! residual = actual - predicted
//! z        = residual / std(residuals)      (population std; 0 -> 1)
//! z < -1.5 -> OPPORTUNITY   z > 1.5 -> OVERPRICED   otherwise NORMAL
//! ```

mod report;

pub use report::{OutlierReport, OutlierRow};

use crate::config::EngineConfig;
use crate::data::{Column, Dataset};
use crate::error::{AppraiserError, Result};
use crate::metrics::r_squared;
use crate::model::{target_vector, PriceModel};
use crate::primitives::Vector;
use crate::stats::population_std;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Absolute z-score beyond which a row is an outlier.
pub const Z_THRESHOLD: f64 = 1.5;

/// Residual spreads at or below this are treated as zero.
const MIN_RESIDUAL_STD: f64 = 1e-9;

/// Price classification of one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceLabel {
    /// Priced well below the model estimate.
    Opportunity,
    /// Priced well above the model estimate.
    Overpriced,
    /// Within the threshold band.
    Normal,
}

impl PriceLabel {
    /// Applies the ±[`Z_THRESHOLD`] rule.
    ///
    /// ```
    /// use appraiser::outlier::PriceLabel;
    ///
    /// assert_eq!(PriceLabel::from_z_score(-1.6), PriceLabel::Opportunity);
    /// assert_eq!(PriceLabel::from_z_score(1.5), PriceLabel::Normal);
    /// assert_eq!(PriceLabel::from_z_score(2.0), PriceLabel::Overpriced);
    /// ```
    #[must_use]
    pub fn from_z_score(z: f64) -> Self {
        if z < -Z_THRESHOLD {
            Self::Opportunity
        } else if z > Z_THRESHOLD {
            Self::Overpriced
        } else {
            Self::Normal
        }
    }

    /// Upper-case label text.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Opportunity => "OPPORTUNITY",
            Self::Overpriced => "OVERPRICED",
            Self::Normal => "NORMAL",
        }
    }
}

impl fmt::Display for PriceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of the fitted model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelState {
    /// No training pass has succeeded yet.
    Untrained,
    /// A fitted model and its report are available.
    Trained,
}

/// A fitted model together with the report of the pass that produced it.
#[derive(Debug, Clone)]
pub struct ScoredModel {
    model: PriceModel,
    report: OutlierReport,
}

impl ScoredModel {
    /// The fitted model.
    #[must_use]
    pub fn model(&self) -> &PriceModel {
        &self.model
    }

    /// Labels and derived tables of the pass.
    #[must_use]
    pub fn report(&self) -> &OutlierReport {
        &self.report
    }

    /// R² of the model on the NORMAL rows only.
    ///
    /// # Errors
    ///
    /// Returns [`AppraiserError::EmptyInput`] if the pass labeled no row
    /// NORMAL.
    pub fn clean_r_squared(&self) -> Result<f64> {
        let normal = self.report.normal();
        if normal.is_empty() {
            return Err(AppraiserError::empty_input("NORMAL subset"));
        }
        self.model.score(normal)
    }
}

/// Trains the price model and labels every row by its residual z-score.
///
/// Holds the most recent [`ScoredModel`]. Training passes are serialized;
/// each publishes its result with one pointer swap, so readers see either
/// the old or the new model, never a mix. A failed pass leaves the previous
/// model in force.
#[derive(Debug)]
pub struct OutlierScorer {
    config: EngineConfig,
    current: RwLock<Option<Arc<ScoredModel>>>,
    training: Mutex<()>,
}

impl OutlierScorer {
    /// Creates an untrained scorer.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            current: RwLock::new(None),
            training: Mutex::new(()),
        }
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Untrained until the first successful pass; never goes back.
    #[must_use]
    pub fn state(&self) -> ModelState {
        match self.snapshot() {
            Some(_) => ModelState::Trained,
            None => ModelState::Untrained,
        }
    }

    /// The most recently published model, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<ScoredModel>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Fits on `dataset`, scores it in-sample and publishes the result.
    ///
    /// # Errors
    ///
    /// [`AppraiserError::EmptyInput`] for a zero-row dataset, configuration
    /// errors for schema or target problems, [`AppraiserError::Training`]
    /// when fitting fails. On error the previously published model stays.
    #[instrument(name = "train_and_score", skip(self, dataset), fields(rows = dataset.n_rows()))]
    pub fn train_and_score(&self, dataset: &Dataset) -> Result<Arc<ScoredModel>> {
        let _guard = self
            .training
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let started = Instant::now();

        if dataset.is_empty() {
            return Err(AppraiserError::empty_input("train_and_score"));
        }
        info!(
            rows = dataset.n_rows(),
            trees = self.config.forest.n_estimators,
            "training price model"
        );

        let scored = Arc::new(self.score(dataset)?);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&scored));

        let report = scored.report();
        info!(
            opportunities = report.count(PriceLabel::Opportunity),
            overpriced = report.count(PriceLabel::Overpriced),
            normal = report.count(PriceLabel::Normal),
            r_squared = report.r_squared(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "training pass published"
        );
        Ok(scored)
    }

    /// R² of the current model on its NORMAL subset.
    ///
    /// # Errors
    ///
    /// [`AppraiserError::NotTrained`] before the first pass, and
    /// [`AppraiserError::EmptyInput`] if no row was labeled NORMAL.
    pub fn clean_metrics(&self) -> Result<f64> {
        self.snapshot()
            .ok_or(AppraiserError::NotTrained)?
            .clean_r_squared()
    }

    fn score(&self, dataset: &Dataset) -> Result<ScoredModel> {
        let config = &self.config;
        let model = PriceModel::fit(
            dataset,
            config.schema.clone(),
            &config.target,
            &config.forest,
        )?;

        let actual = target_vector(dataset, &config.target)?;
        let predicted = model
            .predict(dataset)
            .map_err(|e| AppraiserError::training(format!("in-sample prediction: {e}")))?;
        let residuals: Vec<f64> = actual
            .as_slice()
            .iter()
            .zip(predicted.as_slice())
            .map(|(a, p)| a - p)
            .collect();

        let raw_std = population_std(&residuals);
        let residual_std = if raw_std <= MIN_RESIDUAL_STD {
            warn!(raw_std, "residual spread is zero; using 1.0 as z-score denominator");
            1.0
        } else {
            raw_std
        };
        debug!(residual_std, "residual spread");

        let rows: Vec<OutlierRow> = residuals
            .iter()
            .enumerate()
            .map(|(index, &residual)| {
                let z_score = residual / residual_std;
                OutlierRow {
                    index,
                    actual: actual[index],
                    predicted: predicted[index],
                    residual,
                    z_score,
                    label: PriceLabel::from_z_score(z_score),
                }
            })
            .collect();

        let labeled = augment(dataset, &rows)?;
        let normal_idx: Vec<usize> = rows
            .iter()
            .filter(|r| r.label == PriceLabel::Normal)
            .map(|r| r.index)
            .collect();
        let normal = labeled.select_rows(&normal_idx);
        let in_sample = r_squared(&predicted, &actual)?;

        Ok(ScoredModel {
            model,
            report: OutlierReport::new(rows, labeled, normal, residual_std, in_sample),
        })
    }
}

/// Copy of `dataset` with the derived columns appended.
fn augment(dataset: &Dataset, rows: &[OutlierRow]) -> Result<Dataset> {
    let numeric = |f: fn(&OutlierRow) -> f64| {
        Column::Numeric(Vector::from_vec(rows.iter().map(f).collect()))
    };
    dataset
        .with_column("predicted", numeric(|r| r.predicted))?
        .with_column("residual", numeric(|r| r.residual))?
        .with_column("z_score", numeric(|r| r.z_score))?
        .with_column(
            "label",
            Column::Categorical(rows.iter().map(|r| r.label.to_string()).collect()),
        )
}
