//! Core trait for the regression stage.

use crate::error::Result;
use crate::metrics::r_squared;
use crate::primitives::{Matrix, Vector};

/// Supervised regression estimator following fit/predict/score conventions.
///
/// `predict` and `score` are only defined after a successful `fit`; calling
/// them earlier yields [`AppraiserError::NotTrained`](crate::AppraiserError::NotTrained).
///
/// # Examples
///
/// ```
/// use appraiser::prelude::*;
///
/// let x = Matrix::from_vec(6, 1, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).expect("6x1");
/// let y = Vector::from_slice(&[10.0, 20.0, 30.0, 40.0, 50.0, 60.0]);
///
/// let mut model = RandomForestRegressor::new(20).with_random_state(7);
/// model.fit(&x, &y).expect("non-empty data");
/// assert!(model.score(&x, &y).expect("fitted") > 0.8);
/// ```
pub trait Estimator {
    /// Fits the model to training data.
    ///
    /// # Errors
    ///
    /// Returns an error if fitting fails (empty data, dimension mismatch...).
    fn fit(&mut self, x: &Matrix<f64>, y: &Vector<f64>) -> Result<()>;

    /// Predicts one target value per input row.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is not fitted or the width differs from
    /// the training matrix.
    fn predict(&self, x: &Matrix<f64>) -> Result<Vector<f64>>;

    /// Coefficient of determination of the predictions on `(x, y)`.
    ///
    /// # Errors
    ///
    /// Propagates `predict` errors and length mismatches.
    fn score(&self, x: &Matrix<f64>, y: &Vector<f64>) -> Result<f64> {
        let predictions = self.predict(x)?;
        r_squared(&predictions, y)
    }
}
