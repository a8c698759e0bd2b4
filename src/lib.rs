//! Appraiser: used-car price modelling and residual outlier detection.
//!
//! A random forest is fitted on a cleaned vehicle table, each listing is
//! compared against the model's fair value, and listings whose residual
//! z-score leaves the ±1.5σ band are flagged as opportunities or
//! overpriced. Alongside the model, a correlation engine answers
//! Pearson/Spearman/Kendall, Cramér's V and top-influencer queries over the
//! same table.
//!
//! # Quick Start
//!
//! ```
//! use appraiser::prelude::*;
//!
//! let schema = FeatureSchema::new(vec!["horsepower".into()], vec!["brand".into()]).expect("valid");
//! let engine = Appraiser::new(EngineConfig::default().with_schema(schema).with_n_estimators(30))
//!     .expect("valid config");
//!
//! let rows: Vec<Record> = [10_000.0, 12_000.0, 11_000.0, 50_000.0, 10_500.0]
//!     .iter()
//!     .map(|&price| {
//!         Record::new()
//!             .with("brand", "toyota")
//!             .with("horsepower", 95.0)
//!             .with("price", price)
//!     })
//!     .collect();
//! let scored = engine
//!     .train_and_score(&Dataset::from_records(&rows).expect("consistent"))
//!     .expect("trainable");
//!
//! assert_eq!(scored.report().rows()[3].label, PriceLabel::Overpriced);
//! assert_eq!(scored.report().count(PriceLabel::Normal), 4);
//! ```
//!
//! # Modules
//!
//! - [`primitives`]: Core Vector and Matrix types
//! - [`data`]: Records and the named-column [`Dataset`](data::Dataset)
//! - [`preprocessing`]: Feature schema and one-hot encoder
//! - [`tree`]: Regression trees and the random forest
//! - [`metrics`]: R², MSE, MAE, RMSE
//! - [`stats`]: Descriptive statistics, correlation and association measures
//! - [`model`]: Encoder and forest fitted together
//! - [`outlier`]: Residual z-score labeling and the atomically published model
//! - [`analysis`]: Correlation matrices, consistency, Cramér's V, influencers
//! - [`engine`]: The [`Appraiser`](engine::Appraiser) lifecycle object
//! - [`config`]: YAML-loadable engine configuration
//! - [`logging`]: Optional `tracing` subscriber setup

pub mod analysis;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod outlier;
pub mod prelude;
pub mod preprocessing;
pub mod primitives;
pub mod stats;
pub mod traits;
pub mod tree;

pub use engine::{Appraiser, Prediction};
pub use error::{AppraiserError, Result};
pub use primitives::{Matrix, Vector};
pub use traits::Estimator;
