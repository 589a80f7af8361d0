//! Regressor trait and evaluation metrics

use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Regression metrics on a held-out set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Error
    pub mae: f64,
    /// R-squared
    pub r2: f64,
    pub n_samples: usize,
}

impl ModelMetrics {
    /// Compute regression metrics.
    ///
    /// R² is 0 when `y_true` is constant.
    pub fn compute_regression(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(PipelineError::ShapeError {
                expected: format!("{} predictions", y_true.len()),
                actual: format!("{} predictions", y_pred.len()),
            });
        }
        if y_true.is_empty() {
            return Err(PipelineError::DataError("cannot score an empty set".to_string()));
        }

        let n = y_true.len() as f64;
        let errors = y_true - y_pred;

        let ss_res = errors.mapv(|e| e * e).sum();
        let mse = ss_res / n;
        let mae = errors.mapv(f64::abs).sum() / n;

        let y_mean = y_true.sum() / n;
        let ss_tot = y_true.mapv(|y| (y - y_mean).powi(2)).sum();
        let r2 = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };

        Ok(Self {
            mse,
            rmse: mse.sqrt(),
            mae,
            r2,
            n_samples: y_true.len(),
        })
    }
}

/// R² of `y_pred` against `y_true`
pub fn r2_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    Ok(ModelMetrics::compute_regression(y_true, y_pred)?.r2)
}

/// A regression model trained on a dense feature matrix
pub trait Regressor {
    /// Fit the model to training data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Predict one value per row of `x`
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Human-readable model name
    fn name(&self) -> &'static str;

    fn is_fitted(&self) -> bool;

    /// R² on `(x, y)`
    fn score(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        let y_pred = self.predict(x)?;
        r2_score(y, &y_pred)
    }
}

/// Reject empty inputs and mismatched `x`/`y` lengths
pub(crate) fn check_training_data(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(PipelineError::ShapeError {
            expected: format!("y length = {}", x.nrows()),
            actual: format!("y length = {}", y.len()),
        });
    }
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(PipelineError::TrainingError(format!(
            "empty training data ({} x {})",
            x.nrows(),
            x.ncols()
        )));
    }
    Ok(())
}

/// Reject prediction inputs whose width differs from the fitted width
pub(crate) fn check_n_features(x: &Array2<f64>, expected: usize) -> Result<()> {
    if x.ncols() != expected {
        return Err(PipelineError::ShapeError {
            expected: format!("{} features", expected),
            actual: format!("{} features", x.ncols()),
        });
    }
    Ok(())
}
