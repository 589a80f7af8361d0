//! Feature scaling implementations

use super::FeatureBlock;
use crate::error::{PipelineError, Result};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

/// Type of scaler to use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalerType {
    /// Standard scaling (z-score normalization): (x - mean) / std
    Standard,
    /// Min-Max scaling: (x - min) / (max - min)
    MinMax,
    /// Max absolute scaling: x / max(|x|)
    MaxAbs,
}

/// Parameters for one fitted column
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScalerParams {
    center: f64,    // mean or min
    scale: f64,     // std, range or max |x|
}

/// Feature scaler over dense numeric blocks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    scaler_type: ScalerType,
    /// Subtract the center before scaling. Only honoured by `Standard`.
    with_mean: bool,
    params: Vec<ScalerParams>,
    is_fitted: bool,
}

impl Scaler {
    /// Create a new scaler
    pub fn new(scaler_type: ScalerType) -> Self {
        Self {
            scaler_type,
            with_mean: true,
            params: Vec::new(),
            is_fitted: false,
        }
    }

    /// Standard scaler that divides by the standard deviation without centering
    pub fn without_centering(mut self) -> Self {
        self.with_mean = false;
        self
    }

    pub fn scaler_type(&self) -> &ScalerType {
        &self.scaler_type
    }

    /// Fitted (center, scale) per column
    pub fn params(&self) -> Vec<(f64, f64)> {
        self.params.iter().map(|p| (p.center, p.scale)).collect()
    }

    /// Fit the scaler to the data
    pub fn fit(&mut self, block: &FeatureBlock) -> Result<&mut Self> {
        let arr = dense(block)?;
        self.params = arr
            .axis_iter(Axis(1))
            .map(|col| self.compute_params(col.to_vec()))
            .collect();

        self.is_fitted = true;
        Ok(self)
    }

    /// Transform the data
    pub fn transform(&self, block: FeatureBlock) -> Result<FeatureBlock> {
        let mut arr = self.check_input(block)?;
        for (mut col, params) in arr.axis_iter_mut(Axis(1)).zip(&self.params) {
            let center = self.effective_center(params);
            col.mapv_inplace(|v| (v - center) / params.scale);
        }
        Ok(FeatureBlock::Dense(arr))
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, block: FeatureBlock) -> Result<FeatureBlock> {
        self.fit(&block)?;
        self.transform(block)
    }

    /// Inverse transform the data
    pub fn inverse_transform(&self, block: FeatureBlock) -> Result<FeatureBlock> {
        let mut arr = self.check_input(block)?;
        for (mut col, params) in arr.axis_iter_mut(Axis(1)).zip(&self.params) {
            let center = self.effective_center(params);
            col.mapv_inplace(|v| v * params.scale + center);
        }
        Ok(FeatureBlock::Dense(arr))
    }

    fn check_input(&self, block: FeatureBlock) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(PipelineError::ModelNotFitted);
        }
        let arr = block.into_dense()?;
        if arr.ncols() != self.params.len() {
            return Err(PipelineError::ShapeError {
                expected: format!("{} columns", self.params.len()),
                actual: format!("{} columns", arr.ncols()),
            });
        }
        Ok(arr)
    }

    fn effective_center(&self, params: &ScalerParams) -> f64 {
        if self.with_mean || self.scaler_type != ScalerType::Standard {
            params.center
        } else {
            0.0
        }
    }

    fn compute_params(&self, values: Vec<f64>) -> ScalerParams {
        let n = values.len().max(1) as f64;

        match self.scaler_type {
            ScalerType::Standard => {
                let mean = values.iter().sum::<f64>() / n;
                // Population variance (ddof = 0)
                let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                let std = var.sqrt();
                ScalerParams {
                    center: mean,
                    scale: if negligible(std, mean.abs()) { 1.0 } else { std },
                }
            }
            ScalerType::MinMax => {
                let min = values.iter().copied().fold(f64::INFINITY, f64::min);
                let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let range = max - min;
                ScalerParams {
                    center: if min.is_finite() { min } else { 0.0 },
                    scale: if !range.is_finite() || negligible(range, min.abs().max(max.abs())) {
                        1.0
                    } else {
                        range
                    },
                }
            }
            ScalerType::MaxAbs => {
                let max_abs = values.iter().map(|x| x.abs()).fold(0.0f64, f64::max);
                ScalerParams {
                    center: 0.0,
                    scale: if max_abs == 0.0 { 1.0 } else { max_abs },
                }
            }
        }
    }
}

/// A spread this small relative to the data is rounding noise from a constant column
fn negligible(spread: f64, magnitude: f64) -> bool {
    spread <= 10.0 * f64::EPSILON * magnitude.max(1.0)
}

fn dense(block: &FeatureBlock) -> Result<&Array2<f64>> {
    match block {
        FeatureBlock::Dense(arr) => Ok(arr),
        _ => Err(PipelineError::PreprocessingError(
            "scaler expects a dense numeric block; impute or encode first".to_string(),
        )),
    }
}
