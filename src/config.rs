//! Engine configuration.
//!
//! Every field has a default, so an empty YAML document is a valid
//! configuration:
//!
//! ```yaml
//! target: price
//! schema:
//!   numeric: [horsepower, engine_size, highway_mpg, curb_weight]
//!   categorical: [brand, fuel_type, body_style, drivetrain, aspiration]
//! forest:
//!   n_estimators: 100
//!   max_depth: null
//!   min_samples_leaf: 2
//!   random_state: 42
//! prediction_precision: 2
//! listing_margin: 2000.0
//! top_k: 3
//! opportunity_limit: 5
//! ```

use crate::error::{AppraiserError, Result};
use crate::preprocessing::FeatureSchema;
use crate::tree::RandomForestRegressor;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Hyperparameters of the price regressor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of bagged trees.
    pub n_estimators: usize,
    /// Depth cap per tree; `None` grows until leaves are pure.
    pub max_depth: Option<usize>,
    /// Minimum rows on each side of a split.
    pub min_samples_leaf: usize,
    /// Bootstrap seed; `None` draws fresh entropy on every fit.
    pub random_state: Option<u64>,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_leaf: 2,
            random_state: Some(42),
        }
    }
}

impl ForestConfig {
    /// Build an unfitted forest with these hyperparameters.
    #[must_use]
    pub fn build(&self) -> RandomForestRegressor {
        let mut forest = RandomForestRegressor::new(self.n_estimators)
            .with_min_samples_leaf(self.min_samples_leaf);
        if let Some(depth) = self.max_depth {
            forest = forest.with_max_depth(depth);
        }
        if let Some(seed) = self.random_state {
            forest = forest.with_random_state(seed);
        }
        forest
    }
}

/// Full engine configuration.
///
/// # Examples
///
/// ```
/// use appraiser::config::EngineConfig;
///
/// let config = EngineConfig::from_yaml_str("forest:\n  n_estimators: 25\n")
///     .expect("valid yaml");
/// assert_eq!(config.forest.n_estimators, 25);
/// assert_eq!(config.target, "price");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Name of the numeric target column.
    pub target: String,
    /// Model input columns.
    pub schema: FeatureSchema,
    /// Regressor hyperparameters.
    pub forest: ForestConfig,
    /// Decimal places of single-record predictions.
    pub prediction_precision: u32,
    /// Absolute band around the fair value inside which a listing is fair.
    pub listing_margin: f64,
    /// Length of each influencer list.
    pub top_k: usize,
    /// Length of the top-opportunities list.
    pub opportunity_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            target: "price".to_string(),
            schema: FeatureSchema::vehicle(),
            forest: ForestConfig::default(),
            prediction_precision: 2,
            listing_margin: 2000.0,
            top_k: 3,
            opportunity_limit: 5,
        }
    }
}

impl EngineConfig {
    /// Parses and validates a YAML document.
    ///
    /// # Errors
    ///
    /// Returns a serialization error for malformed YAML and a configuration
    /// error for invalid values.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, otherwise the same
    /// errors as [`EngineConfig::from_yaml_str`].
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let yaml = fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&yaml)
    }

    /// Checks value ranges and schema consistency.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the offending key.
    pub fn validate(&self) -> Result<()> {
        if self.target.trim().is_empty() {
            return Err(AppraiserError::configuration("target", "must not be empty"));
        }
        self.schema.check()?;
        if self.schema.fields().any(|f| f == self.target) {
            return Err(AppraiserError::configuration(
                "target",
                format!("'{}' is also listed as a model input", self.target),
            ));
        }
        if self.forest.n_estimators == 0 {
            return Err(AppraiserError::configuration(
                "forest.n_estimators",
                "must be at least 1",
            ));
        }
        if self.forest.min_samples_leaf == 0 {
            return Err(AppraiserError::configuration(
                "forest.min_samples_leaf",
                "must be at least 1",
            ));
        }
        if !self.listing_margin.is_finite() || self.listing_margin < 0.0 {
            return Err(AppraiserError::configuration(
                "listing_margin",
                format!("must be a non-negative number, got {}", self.listing_margin),
            ));
        }
        if self.prediction_precision > 10 {
            return Err(AppraiserError::configuration(
                "prediction_precision",
                "at most 10 decimal places",
            ));
        }
        Ok(())
    }

    /// Sets the target column.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    /// Sets the feature schema.
    #[must_use]
    pub fn with_schema(mut self, schema: FeatureSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Sets the number of trees.
    #[must_use]
    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.forest.n_estimators = n_estimators;
        self
    }

    /// Caps tree depth.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.forest.max_depth = Some(max_depth);
        self
    }

    /// Sets or clears the bootstrap seed.
    #[must_use]
    pub fn with_random_state(mut self, random_state: Option<u64>) -> Self {
        self.forest.random_state = random_state;
        self
    }

    /// Sets the listing verdict margin.
    #[must_use]
    pub fn with_listing_margin(mut self, margin: f64) -> Self {
        self.listing_margin = margin;
        self
    }

    /// Sets the influencer list length.
    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }
}
