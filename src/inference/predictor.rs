//! Prediction with persisted artifacts

use super::StudentRecord;
use crate::error::{PipelineError, Result, Stage, StageContext};
use crate::export::load_object;
use crate::preprocessing::ColumnTransformer;
use crate::training::{Regressor, TrainedModel};
use ndarray::Array1;
use polars::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Fitted preprocessor and model, applied together
#[derive(Debug, Clone)]
pub struct PredictPipeline {
    preprocessor: ColumnTransformer,
    model: TrainedModel,
}

impl PredictPipeline {
    /// Load both artifacts from disk
    pub fn load(preprocessor_path: impl AsRef<Path>, model_path: impl AsRef<Path>) -> Result<Self> {
        let preprocessor: ColumnTransformer =
            load_object(preprocessor_path.as_ref()).in_stage(Stage::Prediction)?;
        let model: TrainedModel = load_object(model_path.as_ref()).in_stage(Stage::Prediction)?;
        info!(
            preprocessor = %preprocessor_path.as_ref().display(),
            model = model.name(),
            "Loaded prediction artifacts"
        );
        Self::from_parts(preprocessor, model)
    }

    /// Pair an in-memory preprocessor and model
    pub fn from_parts(preprocessor: ColumnTransformer, model: TrainedModel) -> Result<Self> {
        if !preprocessor.is_fitted() || !model.is_fitted() {
            return Err(PipelineError::ModelNotFitted).in_stage(Stage::Prediction);
        }
        Ok(Self { preprocessor, model })
    }

    pub fn preprocessor(&self) -> &ColumnTransformer {
        &self.preprocessor
    }

    pub fn model(&self) -> &TrainedModel {
        &self.model
    }

    pub fn model_name(&self) -> &'static str {
        self.model.name()
    }

    /// Transform raw feature columns and predict
    pub fn predict(&self, features: &DataFrame) -> Result<Array1<f64>> {
        self.predict_frame(features).in_stage(Stage::Prediction)
    }

    /// Predict one value per record
    pub fn predict_records(&self, records: &[StudentRecord]) -> Result<Array1<f64>> {
        let df = StudentRecord::to_dataframe(records).in_stage(Stage::Prediction)?;
        self.predict(&df)
    }

    fn predict_frame(&self, features: &DataFrame) -> Result<Array1<f64>> {
        if features.height() == 0 {
            return Ok(Array1::zeros(0));
        }
        let x = self.preprocessor.transform(features)?;
        debug!(rows = x.nrows(), width = x.ncols(), "Transformed prediction input");
        self.model.predict(&x)
    }
}
