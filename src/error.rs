//! Error types for appraiser operations.
//!
//! Every variant carries enough context to identify the offending field or
//! dataset size. Degenerate statistics (zero residual spread, zero-variance
//! columns, single-category association columns) are absorbed by numeric
//! guards and never show up here.

use thiserror::Error;

/// Main error type for appraiser operations.
///
/// # Examples
///
/// ```
/// use appraiser::error::AppraiserError;
///
/// let err = AppraiserError::configuration("brand", "column not present in dataset");
/// assert!(err.to_string().contains("brand"));
/// ```
#[derive(Error, Debug)]
pub enum AppraiserError {
    /// Schema or configuration references something that does not exist or is invalid.
    #[error("Configuration error for '{field}': {message}")]
    Configuration {
        /// Offending field or configuration key
        field: String,
        /// What is wrong with it
        message: String,
    },

    /// A dataset with zero rows was handed to an operation that needs data.
    #[error("Empty input: {context}")]
    EmptyInput {
        /// Operation that received the empty input
        context: String,
    },

    /// A single record failed validation before prediction.
    #[error("Validation failed for '{field}': {message}")]
    Validation {
        /// Offending record field
        field: String,
        /// What is wrong with it
        message: String,
    },

    /// The underlying regressor could not be fitted.
    #[error("Training failed: {message}")]
    Training {
        /// Failure description
        message: String,
    },

    /// Prediction or scoring was requested before any successful training pass.
    #[error("Model not trained: call train_and_score() first")]
    NotTrained,

    /// Matrix/vector dimensions don't match for the operation.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimensions description
        expected: String,
        /// Actual dimensions found
        actual: String,
    },

    /// I/O error while reading configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppraiserError {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a validation error.
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an empty input error.
    #[must_use]
    pub fn empty_input(context: &str) -> Self {
        Self::EmptyInput {
            context: context.to_string(),
        }
    }

    /// Create a training error.
    #[must_use]
    pub fn training(message: impl Into<String>) -> Self {
        Self::Training {
            message: message.into(),
        }
    }

    /// Create a dimension mismatch error with descriptive context.
    #[must_use]
    pub fn dimension_mismatch(context: &str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            expected: format!("{context}={expected}"),
            actual: format!("{actual}"),
        }
    }
}

impl From<serde_yaml::Error> for AppraiserError {
    fn from(err: serde_yaml::Error) -> Self {
        AppraiserError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for AppraiserError {
    fn from(err: serde_json::Error) -> Self {
        AppraiserError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, AppraiserError>;
