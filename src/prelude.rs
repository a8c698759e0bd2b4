//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use appraiser::prelude::*;
//! ```

pub use crate::analysis::{CorrelationEngine, PriceTier};
pub use crate::config::{EngineConfig, ForestConfig};
pub use crate::data::{Column, Dataset, Record, Value};
pub use crate::engine::{Appraiser, ListingVerdict, Prediction};
pub use crate::error::AppraiserError;
pub use crate::metrics::{mae, mse, r_squared, rmse};
pub use crate::outlier::{ModelState, PriceLabel, Z_THRESHOLD};
pub use crate::preprocessing::{FeatureEncoder, FeatureSchema};
pub use crate::primitives::{Matrix, Vector};
pub use crate::stats::CorrelationMethod;
pub use crate::traits::Estimator;
pub use crate::tree::{DecisionTreeRegressor, RandomForestRegressor};
