//! Error types for the student-performance pipeline
//!
//! Every stage reports failures through [`PipelineError`]. Stage entry points
//! wrap the underlying cause with [`StageContext::in_stage`], which records the
//! stage name and the `file:line` of the call site.

use std::fmt;
use std::panic::Location;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Pipeline stage that produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Ingestion,
    Transformation,
    Serialization,
    Training,
    Prediction,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Ingestion => "ingestion",
            Stage::Transformation => "transformation",
            Stage::Serialization => "serialization",
            Stage::Training => "training",
            Stage::Prediction => "prediction",
        };
        f.write_str(name)
    }
}

/// Main error type for the pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Preprocessing error: {0}")]
    PreprocessingError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Inference error: {0}")]
    InferenceError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Unknown category '{value}' in column '{column}'")]
    UnknownCategory { column: String, value: String },

    #[error("No acceptable model: best R² {best_score:.4} is below {threshold:.4}")]
    NoAcceptableModel { best_score: f64, threshold: f64 },

    #[error("{stage} stage failed at {location}: {source}")]
    Stage {
        stage: Stage,
        location: String,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    /// Stage recorded on this error, if it has been wrapped
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Call site recorded on this error, if it has been wrapped
    pub fn location(&self) -> Option<&str> {
        match self {
            PipelineError::Stage { location, .. } => Some(location.as_str()),
            _ => None,
        }
    }

    /// Innermost error with all stage wrappers removed
    pub fn root_cause(&self) -> &PipelineError {
        match self {
            PipelineError::Stage { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl From<polars::error::PolarsError> for PipelineError {
    fn from(err: polars::error::PolarsError) -> Self {
        PipelineError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::SerializationError(err.to_string())
    }
}

impl From<bincode::Error> for PipelineError {
    fn from(err: bincode::Error) -> Self {
        PipelineError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for PipelineError {
    fn from(err: ndarray::ShapeError) -> Self {
        PipelineError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

/// Attach a stage and call-site location to a failing result.
///
/// Errors that already carry a stage pass through unchanged, so the
/// innermost context is the one reported at the top level.
pub trait StageContext<T> {
    fn in_stage(self, stage: Stage) -> Result<T>;
}

impl<T, E> StageContext<T> for std::result::Result<T, E>
where
    E: Into<PipelineError>,
{
    #[track_caller]
    fn in_stage(self, stage: Stage) -> Result<T> {
        let location = Location::caller();
        self.map_err(|e| match e.into() {
            wrapped @ PipelineError::Stage { .. } => wrapped,
            source => PipelineError::Stage {
                stage,
                location: format!("{}:{}", location.file(), location.line()),
                source: Box::new(source),
            },
        })
    }
}
