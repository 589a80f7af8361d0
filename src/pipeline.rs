//! End-to-end training pipeline

use crate::error::{PipelineError, Result};
use crate::ingestion::{DataIngestion, IngestionArtifacts, IngestionConfig};
use crate::training::{ModelTrainer, ModelTrainerConfig, TrainingReport};
use crate::transformation::{DataTransformation, DataTransformationConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Configuration for all training stages
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub ingestion: IngestionConfig,
    pub transformation: DataTransformationConfig,
    pub trainer: ModelTrainerConfig,
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a JSON config; missing sections and fields take their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Rebase every artifact path onto `dir`
    pub fn with_artifacts_dir(mut self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        self.ingestion = self.ingestion.with_artifacts_dir(dir);
        self.transformation = self.transformation.with_artifacts_dir(dir);
        self.trainer = self.trainer.with_artifacts_dir(dir);
        self
    }

    pub fn with_source_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ingestion.source_path = path.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        let test_size = self.ingestion.test_size;
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(PipelineError::ConfigError(format!(
                "ingestion.test_size must be in (0, 1), got {}",
                test_size
            )));
        }
        if self.trainer.candidates.is_empty() {
            return Err(PipelineError::ConfigError(
                "trainer.candidates must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Summary of a full training run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub ingestion: IngestionArtifacts,
    pub preprocessor_path: PathBuf,
    /// Width of the transformed arrays, target included
    pub n_transformed_columns: usize,
    pub training: TrainingReport,
    pub elapsed_secs: f64,
}

/// Runs ingestion, transformation and training in order
#[derive(Debug, Clone, Default)]
pub struct TrainPipeline {
    config: PipelineConfig,
}

impl TrainPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&self) -> Result<PipelineReport> {
        let start = Instant::now();
        self.config.validate()?;

        let ingestion = DataIngestion::new(self.config.ingestion.clone()).initiate_data_ingestion()?;

        let transformed = DataTransformation::new(self.config.transformation.clone())
            .initiate_data_transformation(&ingestion.train_data_path, &ingestion.test_data_path)?;

        let training = ModelTrainer::new(self.config.trainer.clone())
            .initiate_model_trainer(&transformed.train, &transformed.test)?;

        let elapsed_secs = start.elapsed().as_secs_f64();
        info!(
            best_model = %training.best_model_name,
            r2 = training.best_r2,
            elapsed_secs,
            "Training pipeline finished"
        );

        Ok(PipelineReport {
            ingestion,
            preprocessor_path: transformed.preprocessor_path,
            n_transformed_columns: transformed.train.ncols(),
            training,
            elapsed_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_with_artifacts_dir_rebases_all_outputs() {
        let cfg = PipelineConfig::default().with_artifacts_dir("out");
        assert_eq!(cfg.ingestion.train_data_path, PathBuf::from("out/train.csv"));
        assert_eq!(cfg.transformation.preprocessor_path, PathBuf::from("out/preprocessor.bin"));
        assert_eq!(cfg.trainer.model_path, PathBuf::from("out/model.bin"));
    }

    #[test]
    fn test_from_file_partial_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "ingestion": { "test_size": 0.25 }, "trainer": { "min_r2": 0.5 } }"#)
            .unwrap();

        let cfg = PipelineConfig::from_file(&path).unwrap();
        assert!((cfg.ingestion.test_size - 0.25).abs() < 1e-12);
        assert_eq!(cfg.ingestion.random_state, 42);
        assert!((cfg.trainer.min_r2 - 0.5).abs() < 1e-12);
        assert_eq!(cfg.transformation.target_column, "math_score");
    }

    #[test]
    fn test_from_file_rejects_bad_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "ingestion": { "test_size": 1.5 } }"#).unwrap();
        assert!(matches!(
            PipelineConfig::from_file(&path),
            Err(PipelineError::ConfigError(_))
        ));

        assert!(PipelineConfig::from_file(dir.path().join("missing.json")).is_err());
    }
}
