//! Regression evaluation metrics (R², MSE, MAE, RMSE).

use crate::error::{AppraiserError, Result};
use crate::primitives::Vector;

fn check_lengths(y_pred: &Vector<f64>, y_true: &Vector<f64>) -> Result<()> {
    if y_pred.len() != y_true.len() {
        return Err(AppraiserError::dimension_mismatch(
            "predictions",
            y_true.len(),
            y_pred.len(),
        ));
    }
    if y_true.is_empty() {
        return Err(AppraiserError::empty_input("metric over zero samples"));
    }
    Ok(())
}

/// Computes the coefficient of determination (R²).
///
/// R² = 1 - (`SS_res` / `SS_tot`)
///
/// A constant `y_true` (`SS_tot` = 0) yields 0.0.
///
/// # Examples
///
/// ```
/// use appraiser::metrics::r_squared;
/// use appraiser::primitives::Vector;
///
/// let y_true = Vector::from_slice(&[3.0, -0.5, 2.0, 7.0]);
/// let y_pred = Vector::from_slice(&[2.5, 0.0, 2.0, 8.0]);
/// let r2 = r_squared(&y_pred, &y_true).expect("same length");
/// assert!(r2 > 0.9);
/// ```
///
/// # Errors
///
/// Returns an error if the vectors differ in length or are empty.
pub fn r_squared(y_pred: &Vector<f64>, y_true: &Vector<f64>) -> Result<f64> {
    check_lengths(y_pred, y_true)?;

    let y_mean = y_true.mean();
    let ss_res: f64 = y_true
        .as_slice()
        .iter()
        .zip(y_pred.as_slice())
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    let ss_tot: f64 = y_true.as_slice().iter().map(|t| (t - y_mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return Ok(0.0);
    }

    Ok(1.0 - ss_res / ss_tot)
}

/// Computes the Mean Squared Error (MSE).
///
/// # Errors
///
/// Returns an error if the vectors differ in length or are empty.
pub fn mse(y_pred: &Vector<f64>, y_true: &Vector<f64>) -> Result<f64> {
    check_lengths(y_pred, y_true)?;
    let sum: f64 = y_true
        .as_slice()
        .iter()
        .zip(y_pred.as_slice())
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    Ok(sum / y_true.len() as f64)
}

/// Computes the Mean Absolute Error (MAE).
///
/// # Errors
///
/// Returns an error if the vectors differ in length or are empty.
pub fn mae(y_pred: &Vector<f64>, y_true: &Vector<f64>) -> Result<f64> {
    check_lengths(y_pred, y_true)?;
    let sum: f64 = y_true
        .as_slice()
        .iter()
        .zip(y_pred.as_slice())
        .map(|(t, p)| (t - p).abs())
        .sum();
    Ok(sum / y_true.len() as f64)
}

/// Computes the Root Mean Squared Error (RMSE).
///
/// # Errors
///
/// Returns an error if the vectors differ in length or are empty.
pub fn rmse(y_pred: &Vector<f64>, y_true: &Vector<f64>) -> Result<f64> {
    mse(y_pred, y_true).map(f64::sqrt)
}
