//! The fitted price model: encoder vocabulary plus forest, built together.

use crate::config::ForestConfig;
use crate::data::{Dataset, Record};
use crate::error::{AppraiserError, Result};
use crate::metrics::r_squared;
use crate::preprocessing::{FeatureEncoder, FeatureSchema};
use crate::primitives::{Matrix, Vector};
use crate::traits::Estimator;
use crate::tree::RandomForestRegressor;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Encoder and regressor fitted in one pass over the same dataset.
///
/// Immutable once built. Retraining builds a new `PriceModel`, so a reader
/// never sees the vocabulary of one pass with the trees of another.
///
/// # Examples
///
/// ```
/// use appraiser::config::ForestConfig;
/// use appraiser::data::{Dataset, Record};
/// use appraiser::model::PriceModel;
/// use appraiser::preprocessing::FeatureSchema;
///
/// let rows: Vec<Record> = (0..6)
///     .map(|i| {
///         Record::new()
///             .with("brand", if i % 2 == 0 { "audi" } else { "bmw" })
///             .with("horsepower", 90.0 + 10.0 * f64::from(i))
///             .with("price", 10_000.0 + 1_000.0 * f64::from(i))
///     })
///     .collect();
/// let ds = Dataset::from_records(&rows).expect("consistent records");
/// let schema = FeatureSchema::new(vec!["horsepower".into()], vec!["brand".into()]).expect("valid");
///
/// let model = PriceModel::fit(&ds, schema, "price", &ForestConfig::default()).expect("trainable");
/// assert_eq!(model.predict(&ds).expect("same schema").len(), 6);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceModel {
    encoder: FeatureEncoder,
    forest: RandomForestRegressor,
    target: String,
}

impl PriceModel {
    /// Learns the categorical vocabulary and fits the forest on `dataset`.
    ///
    /// # Errors
    ///
    /// Schema and target problems surface as configuration errors and a
    /// zero-row dataset as [`AppraiserError::EmptyInput`]. Anything that goes
    /// wrong while encoding or fitting becomes [`AppraiserError::Training`].
    pub fn fit(
        dataset: &Dataset,
        schema: FeatureSchema,
        target: &str,
        forest: &ForestConfig,
    ) -> Result<Self> {
        if dataset.is_empty() {
            return Err(AppraiserError::empty_input("price model training"));
        }
        let y = target_vector(dataset, target)?;

        let mut encoder = FeatureEncoder::new(schema);
        let x = encoder.fit_transform(dataset).map_err(into_training)?;
        debug!(
            rows = x.n_rows(),
            encoded_features = x.n_cols(),
            trees = forest.n_estimators,
            "fitting forest"
        );

        let mut regressor = forest.build();
        regressor.fit(&x, &y).map_err(into_training)?;

        Ok(Self {
            encoder,
            forest: regressor,
            target: target.to_string(),
        })
    }

    /// Name of the target column the model was trained on.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The fitted encoder.
    #[must_use]
    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    /// Encodes `dataset` with the training-time vocabulary.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the schema does not match.
    pub fn encode(&self, dataset: &Dataset) -> Result<Matrix<f64>> {
        self.encoder.transform(dataset)
    }

    /// One prediction per row of `dataset`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the schema does not match.
    pub fn predict(&self, dataset: &Dataset) -> Result<Vector<f64>> {
        self.predict_encoded(&self.encode(dataset)?)
    }

    /// Predictions for an already encoded matrix.
    ///
    /// # Errors
    ///
    /// Returns a dimension mismatch if `x` is not as wide as the training
    /// encoding.
    pub fn predict_encoded(&self, x: &Matrix<f64>) -> Result<Vector<f64>> {
        self.forest.predict(x)
    }

    /// Unrounded prediction for one flat record.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming a missing or unparseable field.
    pub fn predict_record(&self, record: &Record) -> Result<f64> {
        let row = self.encoder.encode_record(record)?;
        let x = Matrix::from_vec(1, row.len(), row)
            .map_err(|e| AppraiserError::training(format!("encoded record: {e}")))?;
        Ok(self.forest.predict(&x)?[0])
    }

    /// R² of the model on `dataset` against its target column.
    ///
    /// # Errors
    ///
    /// Returns an error if the dataset is empty or misses a schema field or
    /// the target.
    pub fn score(&self, dataset: &Dataset) -> Result<f64> {
        let y = target_vector(dataset, &self.target)?;
        r_squared(&self.predict(dataset)?, &y)
    }

    /// (encoded column name, importance) pairs, importances summing to 1.
    #[must_use]
    pub fn feature_importances(&self) -> Vec<(String, f64)> {
        let Some(importances) = self.forest.feature_importances() else {
            return Vec::new();
        };
        self.encoder
            .feature_names()
            .into_iter()
            .zip(importances)
            .collect()
    }
}

/// Extracts the target column, rejecting non-finite prices.
pub(crate) fn target_vector(dataset: &Dataset, target: &str) -> Result<Vector<f64>> {
    let y = dataset.numeric(target)?;
    if let Some(pos) = y.as_slice().iter().position(|v| !v.is_finite()) {
        return Err(AppraiserError::training(format!(
            "target '{target}' is not finite at row {pos}"
        )));
    }
    Ok(y.clone())
}

/// Keeps the caller-facing classes and folds the rest into a training failure.
fn into_training(err: AppraiserError) -> AppraiserError {
    match err {
        AppraiserError::Configuration { .. }
        | AppraiserError::EmptyInput { .. }
        | AppraiserError::Training { .. } => err,
        other => AppraiserError::training(other.to_string()),
    }
}
