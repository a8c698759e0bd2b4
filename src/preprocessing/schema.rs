//! Static declaration of the model's input columns.

use crate::data::{Column, Dataset};
use crate::error::{AppraiserError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Frozen lists of numeric and categorical feature names.
///
/// The schema must be a subset of every dataset it is used with; a missing
/// field or a field of the wrong kind is a configuration error.
///
/// # Examples
///
/// ```
/// use appraiser::preprocessing::FeatureSchema;
///
/// let schema = FeatureSchema::new(
///     vec!["horsepower".into()],
///     vec!["brand".into(), "fuel_type".into()],
/// )
/// .expect("names are distinct");
/// assert_eq!(schema.n_fields(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    numeric: Vec<String>,
    categorical: Vec<String>,
}

impl FeatureSchema {
    /// Creates a schema.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if both lists are empty or a name is
    /// empty or repeated.
    pub fn new(numeric: Vec<String>, categorical: Vec<String>) -> Result<Self> {
        let schema = Self {
            numeric,
            categorical,
        };
        schema.check()?;
        Ok(schema)
    }

    /// The vehicle-pricing schema: power, engine size, highway efficiency and
    /// curb weight as numbers; brand, fuel type, body style, drivetrain and
    /// aspiration as categories.
    #[must_use]
    pub fn vehicle() -> Self {
        Self {
            numeric: ["horsepower", "engine_size", "highway_mpg", "curb_weight"]
                .map(String::from)
                .to_vec(),
            categorical: ["brand", "fuel_type", "body_style", "drivetrain", "aspiration"]
                .map(String::from)
                .to_vec(),
        }
    }

    /// Numeric feature names in schema order.
    #[must_use]
    pub fn numeric(&self) -> &[String] {
        &self.numeric
    }

    /// Categorical feature names in schema order.
    #[must_use]
    pub fn categorical(&self) -> &[String] {
        &self.categorical
    }

    /// Total number of declared fields.
    #[must_use]
    pub fn n_fields(&self) -> usize {
        self.numeric.len() + self.categorical.len()
    }

    /// Categorical names followed by numeric names.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.categorical
            .iter()
            .chain(self.numeric.iter())
            .map(String::as_str)
    }

    /// Checks internal consistency (non-empty, distinct names).
    ///
    /// # Errors
    ///
    /// Returns a configuration error describing the first problem found.
    pub fn check(&self) -> Result<()> {
        if self.n_fields() == 0 {
            return Err(AppraiserError::configuration(
                "schema",
                "at least one feature is required",
            ));
        }
        let mut seen = HashSet::with_capacity(self.n_fields());
        for name in self.fields() {
            if name.is_empty() {
                return Err(AppraiserError::configuration(
                    "schema",
                    "feature names cannot be empty",
                ));
            }
            if !seen.insert(name) {
                return Err(AppraiserError::configuration(name, "feature declared twice"));
            }
        }
        Ok(())
    }

    /// Checks that every declared feature exists in `dataset` with the
    /// declared kind.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the offending field.
    pub fn validate_against(&self, dataset: &Dataset) -> Result<()> {
        for name in &self.numeric {
            if let Column::Categorical(_) = dataset.column(name)? {
                return Err(AppraiserError::configuration(
                    name,
                    "declared numeric but the dataset column is categorical",
                ));
            }
        }
        for name in &self.categorical {
            if let Column::Numeric(_) = dataset.column(name)? {
                return Err(AppraiserError::configuration(
                    name,
                    "declared categorical but the dataset column is numeric",
                ));
            }
        }
        Ok(())
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::vehicle()
    }
}
