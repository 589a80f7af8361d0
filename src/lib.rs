//! Student performance - end-to-end regression pipeline
//!
//! Predicts a student's `math_score` from demographic columns and the
//! reading and writing scores. The crate provides:
//! - Data ingestion with a seeded train/test split
//! - Column-wise preprocessing (imputation, scaling, one-hot encoding)
//! - Model selection over linear, tree and neighbour regressors
//! - Prediction from persisted artifacts
//!
//! # Modules
//!
//! ## Stages
//! - [`ingestion`] - Source table, raw copy and train/test split
//! - [`transformation`] - Fit and apply the column transformer
//! - [`training`] - Candidate regressors and model selection
//! - [`inference`] - Prediction with the saved preprocessor and model
//! - [`pipeline`] - Runs the training stages in order
//!
//! ## Building blocks
//! - [`preprocessing`] - Imputer, encoder, scaler and column transformer
//! - [`export`] - Binary artifact persistence
//! - [`utils`] - CSV loading and saving
//!
//! ## Services
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Stages
pub mod ingestion;
pub mod transformation;
pub mod training;
pub mod inference;
pub mod pipeline;

// Building blocks
pub mod preprocessing;
pub mod export;
pub mod utils;

// Services
pub mod cli;

pub use error::{PipelineError, Result, Stage, StageContext};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{PipelineError, Result, Stage, StageContext};

    // Stages
    pub use crate::ingestion::{DataIngestion, IngestionArtifacts, IngestionConfig};
    pub use crate::transformation::{DataTransformation, DataTransformationConfig, TransformationArtifacts};
    pub use crate::training::{ModelTrainer, ModelTrainerConfig, ModelType, Regressor, TrainedModel, TrainingReport};
    pub use crate::inference::{PredictPipeline, StudentRecord};
    pub use crate::pipeline::{PipelineConfig, PipelineReport, TrainPipeline};

    // Preprocessing
    pub use crate::preprocessing::{ColumnTransformer, ImputeStrategy, PreprocessingConfig, ScalerType, UnknownCategoryPolicy};

    // Persistence
    pub use crate::export::{load_object, save_object};
}
