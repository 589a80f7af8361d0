//! Inference
//!
//! Loads the persisted preprocessor and model and predicts `math_score`
//! for raw student rows.

mod predictor;
mod record;

pub use predictor::PredictPipeline;
pub use record::StudentRecord;
