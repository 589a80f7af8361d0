//! Sequential step pipelines

use super::{FeatureBlock, Imputer, OneHotEncoder, Scaler};
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A single preprocessing step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TransformStep {
    Impute(Imputer),
    OneHot(OneHotEncoder),
    Scale(Scaler),
}

impl TransformStep {
    fn fit_transform(&mut self, block: FeatureBlock) -> Result<FeatureBlock> {
        match self {
            TransformStep::Impute(step) => step.fit_transform(block),
            TransformStep::OneHot(step) => step.fit_transform(block),
            TransformStep::Scale(step) => step.fit_transform(block),
        }
    }

    fn transform(&self, block: FeatureBlock) -> Result<FeatureBlock> {
        match self {
            TransformStep::Impute(step) => step.transform(block),
            TransformStep::OneHot(step) => step.transform(block),
            TransformStep::Scale(step) => step.transform(block),
        }
    }

    /// Output names given the names of this step's input columns
    fn feature_names_out(&self, input_names: Vec<String>) -> Vec<String> {
        match self {
            TransformStep::OneHot(encoder) => encoder.feature_names_out(&input_names),
            TransformStep::Impute(_) | TransformStep::Scale(_) => input_names,
        }
    }
}

/// Named steps applied in order; each step is fit on the output of the
/// previous one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pipeline {
    steps: Vec<(String, TransformStep)>,
    is_fitted: bool,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to append a named step
    pub fn with_step(mut self, name: impl Into<String>, step: TransformStep) -> Self {
        self.steps.push((name.into(), step));
        self.is_fitted = false;
        self
    }

    pub fn steps(&self) -> &[(String, TransformStep)] {
        &self.steps
    }

    /// Look up a step by name
    pub fn step(&self, name: &str) -> Option<&TransformStep> {
        self.steps.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    /// Fit every step in order and return the transformed block
    pub fn fit_transform(&mut self, block: FeatureBlock) -> Result<FeatureBlock> {
        let mut current = block;
        for (name, step) in &mut self.steps {
            current = step.fit_transform(current).map_err(|e| step_error(name, e))?;
            debug!(step = %name, width = current.n_cols(), "Fitted pipeline step");
        }
        self.is_fitted = true;
        Ok(current)
    }

    /// Apply fitted steps in order
    pub fn transform(&self, block: FeatureBlock) -> Result<FeatureBlock> {
        if !self.is_fitted {
            return Err(PipelineError::ModelNotFitted);
        }
        self.steps
            .iter()
            .try_fold(block, |current, (name, step)| {
                step.transform(current).map_err(|e| step_error(name, e))
            })
    }

    /// Output feature names for the given input column names
    pub fn feature_names_out(&self, input_names: &[String]) -> Vec<String> {
        self.steps
            .iter()
            .fold(input_names.to_vec(), |names, (_, step)| step.feature_names_out(names))
    }
}

fn step_error(name: &str, err: PipelineError) -> PipelineError {
    match err {
        PipelineError::PreprocessingError(msg) => {
            PipelineError::PreprocessingError(format!("step '{}': {}", name, msg))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::{ImputeStrategy, ScalerType, UnknownCategoryPolicy};

    #[test]
    fn test_numeric_pipeline() {
        let mut pipeline = Pipeline::new()
            .with_step("imputer", TransformStep::Impute(Imputer::new(ImputeStrategy::Median)))
            .with_step("scaler", TransformStep::Scale(Scaler::new(ScalerType::Standard)));

        let out = pipeline
            .fit_transform(FeatureBlock::Numeric(vec![vec![Some(1.0), None, Some(3.0)]]))
            .unwrap()
            .into_dense()
            .unwrap();

        // Imputed to [1, 2, 3], standardized around 2
        assert_eq!(out.shape(), &[3, 1]);
        assert!(out[[1, 0]].abs() < 1e-12);
        assert!(pipeline.is_fitted());
    }

    #[test]
    fn test_categorical_pipeline_names() {
        let mut pipeline = Pipeline::new()
            .with_step("imputer", TransformStep::Impute(Imputer::new(ImputeStrategy::MostFrequent)))
            .with_step(
                "one_hot_encoder",
                TransformStep::OneHot(OneHotEncoder::new(UnknownCategoryPolicy::Ignore)),
            )
            .with_step(
                "scaler",
                TransformStep::Scale(Scaler::new(ScalerType::Standard).without_centering()),
            );

        let block = FeatureBlock::Categorical(vec![vec![
            Some("none".to_string()),
            Some("completed".to_string()),
            None,
        ]]);
        let out = pipeline.fit_transform(block).unwrap().into_dense().unwrap();

        assert_eq!(out.ncols(), 2);
        let names = pipeline.feature_names_out(&["test_preparation_course".to_string()]);
        assert_eq!(
            names,
            vec!["test_preparation_course_completed", "test_preparation_course_none"]
        );
    }

    #[test]
    fn test_step_errors_name_the_step() {
        let mut pipeline = Pipeline::new()
            .with_step("scaler", TransformStep::Scale(Scaler::new(ScalerType::Standard)));
        let err = pipeline
            .fit_transform(FeatureBlock::Numeric(vec![vec![Some(1.0)]]))
            .unwrap_err();
        assert!(err.to_string().contains("step 'scaler'"));
    }

    #[test]
    fn test_transform_before_fit() {
        let pipeline = Pipeline::new();
        assert!(matches!(
            pipeline.transform(FeatureBlock::Numeric(vec![])),
            Err(PipelineError::ModelNotFitted)
        ));
    }
}
