//! Feature encoding: mixed-type vehicle records to a numeric matrix.
//!
//! Output column layout is fixed by the schema and the vocabulary learned in
//! [`FeatureEncoder::fit`]:
//!
//! ```text
//! [brand=alfa-romero, brand=audi, ..., fuel_type=diesel, fuel_type=gas, ..., horsepower, engine_size, ...]
//!  └─ one indicator block per categorical feature (schema order,  ─┘  └─ numeric passthrough ─┘
//!     categories sorted lexicographically)
//! ```
//!
//! A category that was not seen during `fit` encodes as an all-zero block.
//! It is never an error and never lands on a known category.

mod schema;

pub use schema::FeatureSchema;

use crate::data::{Dataset, Record};
use crate::error::{AppraiserError, Result};
use crate::primitives::Matrix;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// One-hot encoder for categorical features with numeric passthrough.
///
/// # Examples
///
/// ```
/// use appraiser::data::{Dataset, Record};
/// use appraiser::preprocessing::{FeatureEncoder, FeatureSchema};
///
/// let ds = Dataset::from_records(&[
///     Record::new().with("brand", "audi").with("horsepower", 102.0),
///     Record::new().with("brand", "bmw").with("horsepower", 101.0),
/// ])
/// .expect("consistent records");
/// let schema = FeatureSchema::new(vec!["horsepower".into()], vec!["brand".into()]).expect("valid");
///
/// let mut encoder = FeatureEncoder::new(schema);
/// let x = encoder.fit_transform(&ds).expect("schema matches");
/// assert_eq!(x.shape(), (2, 3)); // brand=audi, brand=bmw, horsepower
///
/// let unseen = Record::new().with("brand", "lada").with("horsepower", 70.0);
/// assert_eq!(encoder.encode_record(&unseen).expect("fields present"), vec![0.0, 0.0, 70.0]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureEncoder {
    schema: FeatureSchema,
    vocabulary: Option<Vec<Vec<String>>>,
}

impl FeatureEncoder {
    /// Creates an unfitted encoder for `schema`.
    #[must_use]
    pub fn new(schema: FeatureSchema) -> Self {
        Self {
            schema,
            vocabulary: None,
        }
    }

    /// The schema this encoder was built for.
    #[must_use]
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Returns true once [`fit`](Self::fit) has learned a vocabulary.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.vocabulary.is_some()
    }

    /// Learns the sorted set of observed categories for every categorical
    /// feature.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the schema does not match the dataset.
    pub fn fit(&mut self, dataset: &Dataset) -> Result<()> {
        self.schema.validate_against(dataset)?;

        let mut vocabulary = Vec::with_capacity(self.schema.categorical().len());
        for name in self.schema.categorical() {
            let distinct: BTreeSet<&str> = dataset
                .categorical(name)?
                .iter()
                .map(String::as_str)
                .collect();
            debug!(feature = %name, categories = distinct.len(), "learned vocabulary");
            vocabulary.push(distinct.into_iter().map(str::to_string).collect());
        }

        self.vocabulary = Some(vocabulary);
        Ok(())
    }

    /// Encodes every row of `dataset`.
    ///
    /// # Errors
    ///
    /// Returns [`AppraiserError::NotTrained`] before `fit`, a configuration
    /// error if the schema does not match, and a validation error for a
    /// non-finite numeric value.
    pub fn transform(&self, dataset: &Dataset) -> Result<Matrix<f64>> {
        let vocabulary = self.vocabulary()?;
        self.schema.validate_against(dataset)?;

        let n_rows = dataset.n_rows();
        let width = self.n_features_out();
        let mut x = Matrix::zeros(n_rows, width);

        let mut offset = 0;
        for (name, categories) in self.schema.categorical().iter().zip(vocabulary) {
            for (row, value) in dataset.categorical(name)?.iter().enumerate() {
                if let Ok(pos) = categories.binary_search(value) {
                    x.set(row, offset + pos, 1.0);
                }
            }
            offset += categories.len();
        }

        for name in self.schema.numeric() {
            for (row, &value) in dataset.numeric(name)?.as_slice().iter().enumerate() {
                if !value.is_finite() {
                    return Err(AppraiserError::validation(
                        name,
                        format!("row {row}: non-finite value {value}"),
                    ));
                }
                x.set(row, offset, value);
            }
            offset += 1;
        }

        Ok(x)
    }

    /// Fits and transforms in one step.
    ///
    /// # Errors
    ///
    /// See [`fit`](Self::fit) and [`transform`](Self::transform).
    pub fn fit_transform(&mut self, dataset: &Dataset) -> Result<Matrix<f64>> {
        self.fit(dataset)?;
        self.transform(dataset)
    }

    /// Encodes a single flat record with the training-time vocabulary.
    ///
    /// Every schema field must be present. Numeric fields accept numbers or
    /// numeric text; categorical fields accept any value (numbers are
    /// rendered as text).
    ///
    /// # Errors
    ///
    /// Returns [`AppraiserError::NotTrained`] before `fit` and a validation
    /// error naming the first missing or unparseable field.
    pub fn encode_record(&self, record: &Record) -> Result<Vec<f64>> {
        let vocabulary = self.vocabulary()?;
        let mut row = vec![0.0; self.n_features_out()];

        let mut offset = 0;
        for (name, categories) in self.schema.categorical().iter().zip(vocabulary) {
            let value = record
                .get(name)
                .ok_or_else(|| AppraiserError::validation(name, "required field is missing"))?
                .as_category();
            if let Ok(pos) = categories.binary_search(&value) {
                row[offset + pos] = 1.0;
            }
            offset += categories.len();
        }

        for name in self.schema.numeric() {
            let value = record
                .get(name)
                .ok_or_else(|| AppraiserError::validation(name, "required field is missing"))?;
            row[offset] = value.as_numeric().ok_or_else(|| {
                AppraiserError::validation(name, format!("not a finite number: {value:?}"))
            })?;
            offset += 1;
        }

        Ok(row)
    }

    /// Number of encoded columns (0 before `fit`).
    #[must_use]
    pub fn n_features_out(&self) -> usize {
        self.vocabulary.as_ref().map_or(0, |vocab| {
            vocab.iter().map(Vec::len).sum::<usize>() + self.schema.numeric().len()
        })
    }

    /// Encoded column names in matrix order (`feature=category` for indicator
    /// columns, the bare name for numeric ones).
    #[must_use]
    pub fn feature_names(&self) -> Vec<String> {
        let Some(vocabulary) = &self.vocabulary else {
            return Vec::new();
        };
        self.schema
            .categorical()
            .iter()
            .zip(vocabulary)
            .flat_map(|(name, cats)| cats.iter().map(move |c| format!("{name}={c}")))
            .chain(self.schema.numeric().iter().cloned())
            .collect()
    }

    /// Sorted categories observed for `feature` during `fit`.
    #[must_use]
    pub fn categories(&self, feature: &str) -> Option<&[String]> {
        let vocabulary = self.vocabulary.as_ref()?;
        self.schema
            .categorical()
            .iter()
            .position(|n| n == feature)
            .map(|idx| vocabulary[idx].as_slice())
    }

    fn vocabulary(&self) -> Result<&[Vec<String>]> {
        self.vocabulary.as_deref().ok_or(AppraiserError::NotTrained)
    }
}
