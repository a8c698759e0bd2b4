//! The appraisal engine: model lifecycle plus the prediction and analysis
//! entry points a presentation layer calls.
//!
//! An [`Appraiser`] starts [`ModelState::Untrained`]. The first successful
//! [`train_and_score`](Appraiser::train_and_score) makes it `Trained`, and it
//! stays trained: later passes replace the model atomically or, on failure,
//! leave it alone. Every other method takes `&self`, so one engine can be
//! shared across threads behind an `Arc`.

use crate::analysis::{
    AssociationScore, ConsistencyReport, CorrelationEngine, CorrelationMatrices, Influencers,
};
use crate::config::EngineConfig;
use crate::data::{Dataset, Record};
use crate::error::{AppraiserError, Result};
use crate::outlier::{ModelState, OutlierRow, OutlierScorer, ScoredModel};
use crate::stats::round_to;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Outcome of a single-record prediction.
///
/// `Unavailable` is distinct from `Estimate(0.0)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Prediction {
    /// Rounded price estimate.
    Estimate(f64),
    /// The model could not produce a usable number for this record.
    Unavailable,
}

impl Prediction {
    /// The estimate, if there is one.
    #[must_use]
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Estimate(v) => Some(v),
            Self::Unavailable => None,
        }
    }

    /// Returns true for [`Prediction::Estimate`].
    #[must_use]
    pub fn is_available(self) -> bool {
        matches!(self, Self::Estimate(_))
    }
}

/// How a listed price compares with the model's fair value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingVerdict {
    /// Listed more than the margin below fair value.
    Opportunity,
    /// Listed more than the margin above fair value.
    Overpriced,
    /// Within the margin.
    Fair,
}

impl ListingVerdict {
    /// Verdict for `listed - predicted`; the margin itself counts as fair.
    ///
    /// ```
    /// use appraiser::engine::ListingVerdict;
    ///
    /// assert_eq!(ListingVerdict::from_difference(-2_500.0, 2_000.0), ListingVerdict::Opportunity);
    /// assert_eq!(ListingVerdict::from_difference(2_000.0, 2_000.0), ListingVerdict::Fair);
    /// assert_eq!(ListingVerdict::from_difference(2_000.5, 2_000.0), ListingVerdict::Overpriced);
    /// ```
    #[must_use]
    pub fn from_difference(difference: f64, margin: f64) -> Self {
        if difference < -margin {
            Self::Opportunity
        } else if difference > margin {
            Self::Overpriced
        } else {
            Self::Fair
        }
    }

    /// Display severity tag.
    #[must_use]
    pub fn severity(self) -> &'static str {
        match self {
            Self::Opportunity => "success",
            Self::Overpriced => "danger",
            Self::Fair => "primary",
        }
    }

    /// Short human-readable reading.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Opportunity => "Opportunity: listed well below its fair value.",
            Self::Overpriced => "Overpriced: listed well above its fair value.",
            Self::Fair => "Fair price: listed close to its fair value.",
        }
    }
}

impl fmt::Display for ListingVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Opportunity => "opportunity",
            Self::Overpriced => "overpriced",
            Self::Fair => "fair",
        };
        f.write_str(name)
    }
}

/// A listed price checked against the model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ListingAssessment {
    /// Rounded fair-value estimate.
    pub predicted: f64,
    /// Price the vehicle is listed at.
    pub listed: f64,
    /// `listed - predicted`.
    pub difference: f64,
    /// Reading of `difference` against the configured margin.
    pub verdict: ListingVerdict,
}

/// Lifecycle owner of the price model and façade over the analysis queries.
///
/// # Examples
///
/// ```
/// use appraiser::config::EngineConfig;
/// use appraiser::data::{Dataset, Record};
/// use appraiser::engine::Appraiser;
/// use appraiser::outlier::ModelState;
/// use appraiser::preprocessing::FeatureSchema;
///
/// let schema = FeatureSchema::new(vec!["horsepower".into()], vec!["brand".into()]).expect("valid");
/// let appraiser = Appraiser::new(
///     EngineConfig::default().with_schema(schema).with_n_estimators(20),
/// )
/// .expect("valid config");
/// assert_eq!(appraiser.state(), ModelState::Untrained);
///
/// let rows: Vec<Record> = (0..10)
///     .map(|i| {
///         Record::new()
///             .with("brand", if i % 2 == 0 { "audi" } else { "bmw" })
///             .with("horsepower", 90.0 + 10.0 * f64::from(i))
///             .with("price", 10_000.0 + 900.0 * f64::from(i))
///     })
///     .collect();
/// appraiser
///     .train_and_score(&Dataset::from_records(&rows).expect("consistent"))
///     .expect("trainable");
///
/// let car = Record::new().with("brand", "audi").with("horsepower", 120.0);
/// assert!(appraiser.predict_single(&car).expect("all fields").is_available());
/// ```
#[derive(Debug)]
pub struct Appraiser {
    scorer: OutlierScorer,
}

impl Appraiser {
    /// Validates `config` and returns an untrained engine.
    ///
    /// # Errors
    ///
    /// Returns a configuration error describing the first invalid setting.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            scorer: OutlierScorer::new(config),
        })
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        self.scorer.config()
    }

    /// Whether a model has been published.
    #[must_use]
    pub fn state(&self) -> ModelState {
        self.scorer.state()
    }

    /// Fits, scores in-sample, and publishes. See
    /// [`OutlierScorer::train_and_score`].
    ///
    /// # Errors
    ///
    /// Propagates empty-input, configuration and training errors; the
    /// previous model stays in force.
    pub fn train_and_score(&self, dataset: &Dataset) -> Result<Arc<ScoredModel>> {
        self.scorer.train_and_score(dataset)
    }

    /// The current model and its report.
    ///
    /// # Errors
    ///
    /// Returns [`AppraiserError::NotTrained`] before the first pass.
    pub fn current(&self) -> Result<Arc<ScoredModel>> {
        self.scorer.snapshot().ok_or(AppraiserError::NotTrained)
    }

    /// R² on the NORMAL rows of the last pass.
    ///
    /// # Errors
    ///
    /// [`AppraiserError::NotTrained`] before the first pass,
    /// [`AppraiserError::EmptyInput`] when no row was labeled NORMAL.
    pub fn clean_r_squared(&self) -> Result<f64> {
        self.scorer.clean_metrics()
    }

    /// Fair-value estimate for one flat record, rounded to
    /// `prediction_precision` decimals.
    ///
    /// Unseen categories are fine: they encode as an all-zero indicator
    /// block. Caller errors come back as `Err`; anything that goes wrong
    /// inside the model degrades to [`Prediction::Unavailable`].
    ///
    /// # Errors
    ///
    /// [`AppraiserError::NotTrained`] before the first pass and
    /// [`AppraiserError::Validation`] naming a missing or unparseable field.
    pub fn predict_single(&self, record: &Record) -> Result<Prediction> {
        let scored = self.current()?;
        match scored.model().predict_record(record) {
            Ok(value) if value.is_finite() => {
                let places = self.config().prediction_precision as i32;
                Ok(Prediction::Estimate(round_to(value, places)))
            }
            Ok(value) => {
                warn!(value, "model produced a non-finite estimate");
                Ok(Prediction::Unavailable)
            }
            Err(err @ AppraiserError::Validation { .. }) => Err(err),
            Err(err) => {
                warn!(error = %err, "single-record prediction failed");
                Ok(Prediction::Unavailable)
            }
        }
    }

    /// Compares `listed_price` with the fair value of `record`.
    ///
    /// `Ok(None)` when the model has no estimate for the record.
    ///
    /// # Errors
    ///
    /// Same as [`predict_single`](Self::predict_single), plus a validation
    /// error for a non-finite `listed_price`.
    pub fn assess_listing(
        &self,
        record: &Record,
        listed_price: f64,
    ) -> Result<Option<ListingAssessment>> {
        if !listed_price.is_finite() {
            return Err(AppraiserError::validation(
                "listed_price",
                format!("not a finite number: {listed_price}"),
            ));
        }
        let Some(predicted) = self.predict_single(record)?.value() else {
            return Ok(None);
        };
        let difference = listed_price - predicted;
        Ok(Some(ListingAssessment {
            predicted,
            listed: listed_price,
            difference,
            verdict: ListingVerdict::from_difference(difference, self.config().listing_margin),
        }))
    }

    /// Sorted training-time values of every categorical feature.
    ///
    /// # Errors
    ///
    /// Returns [`AppraiserError::NotTrained`] before the first pass.
    pub fn category_options(&self) -> Result<BTreeMap<String, Vec<String>>> {
        let scored = self.current()?;
        let encoder = scored.model().encoder();
        Ok(encoder
            .schema()
            .categorical()
            .iter()
            .map(|name| {
                let values = encoder.categories(name).unwrap_or_default().to_vec();
                (name.clone(), values)
            })
            .collect())
    }

    /// Up to `opportunity_limit` OPPORTUNITY rows, most underpriced first.
    ///
    /// # Errors
    ///
    /// Returns [`AppraiserError::NotTrained`] before the first pass.
    pub fn top_opportunities(&self) -> Result<Vec<OutlierRow>> {
        let scored = self.current()?;
        Ok(scored
            .report()
            .top_opportunities(self.config().opportunity_limit)
            .into_iter()
            .copied()
            .collect())
    }

    /// Importances of the encoded model inputs, largest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppraiserError::NotTrained`] before the first pass.
    pub fn feature_importances(&self) -> Result<Vec<(String, f64)>> {
        let mut importances = self.current()?.model().feature_importances();
        importances.sort_by(|a, b| b.1.total_cmp(&a.1));
        Ok(importances)
    }

    /// Pearson, Spearman and Kendall matrices of `dataset`.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty dataset or one without numeric columns.
    pub fn correlation_matrices(&self, dataset: &Dataset) -> Result<CorrelationMatrices> {
        CorrelationEngine::new(dataset).correlation_matrices()
    }

    /// Pearson/Spearman agreement of `dataset`.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty dataset or one without numeric columns.
    pub fn consistency_report(&self, dataset: &Dataset) -> Result<ConsistencyReport> {
        CorrelationEngine::new(dataset).consistency_report()
    }

    /// Cramér's V of each categorical column against the target's price tier.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty dataset or a missing target column.
    pub fn categorical_association(&self, dataset: &Dataset) -> Result<Vec<AssociationScore>> {
        CorrelationEngine::new(dataset).categorical_association(&self.config().target)
    }

    /// The configured number of strongest positive and negative correlates
    /// of the target.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty dataset or a missing target column.
    pub fn top_influencers(&self, dataset: &Dataset) -> Result<Influencers> {
        let config = self.config();
        CorrelationEngine::new(dataset).top_influencers(&config.target, config.top_k)
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
