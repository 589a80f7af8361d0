//! Model selection over the transformed arrays

use super::config::ModelTrainerConfig;
use super::decision_tree::DecisionTreeRegressor;
use super::knn::KNNRegressor;
use super::linear_models::{LassoRegression, LinearRegression, RidgeRegression};
use super::models::{ModelMetrics, Regressor};
use crate::error::{PipelineError, Result, Stage, StageContext};
use crate::export::save_object;
use ndarray::{s, Array1, Array2};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

/// Serializable union of the candidate regressors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TrainedModel {
    LinearRegression(LinearRegression),
    Ridge(RidgeRegression),
    Lasso(LassoRegression),
    DecisionTree(DecisionTreeRegressor),
    KNeighbors(KNNRegressor),
}

impl TrainedModel {
    fn as_regressor(&self) -> &dyn Regressor {
        match self {
            TrainedModel::LinearRegression(m) => m,
            TrainedModel::Ridge(m) => m,
            TrainedModel::Lasso(m) => m,
            TrainedModel::DecisionTree(m) => m,
            TrainedModel::KNeighbors(m) => m,
        }
    }

    fn as_regressor_mut(&mut self) -> &mut dyn Regressor {
        match self {
            TrainedModel::LinearRegression(m) => m,
            TrainedModel::Ridge(m) => m,
            TrainedModel::Lasso(m) => m,
            TrainedModel::DecisionTree(m) => m,
            TrainedModel::KNeighbors(m) => m,
        }
    }
}

impl Regressor for TrainedModel {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.as_regressor_mut().fit(x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.as_regressor().predict(x)
    }

    fn name(&self) -> &'static str {
        self.as_regressor().name()
    }

    fn is_fitted(&self) -> bool {
        self.as_regressor().is_fitted()
    }
}

/// Test-set evaluation of one candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelScore {
    pub name: String,
    pub metrics: ModelMetrics,
    pub training_time_secs: f64,
}

/// Output of [`ModelTrainer::initiate_model_trainer`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Every candidate, in configuration order
    pub scores: Vec<ModelScore>,
    pub best_model_name: String,
    /// Test R² of the best model
    pub best_r2: f64,
    pub model_path: PathBuf,
}

impl TrainingReport {
    pub fn score(&self, name: &str) -> Option<&ModelScore> {
        self.scores.iter().find(|s| s.name == name)
    }
}

/// Split a transformed array into features and its last column
pub fn split_features_target(data: &Array2<f64>) -> Result<(Array2<f64>, Array1<f64>)> {
    if data.ncols() < 2 {
        return Err(PipelineError::ShapeError {
            expected: "at least one feature column and a target column".to_string(),
            actual: format!("{} columns", data.ncols()),
        });
    }
    let last = data.ncols() - 1;
    Ok((data.slice(s![.., ..last]).to_owned(), data.column(last).to_owned()))
}

/// Model-training stage
#[derive(Debug, Clone, Default)]
pub struct ModelTrainer {
    config: ModelTrainerConfig,
}

impl ModelTrainer {
    pub fn new(config: ModelTrainerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ModelTrainerConfig {
        &self.config
    }

    /// Fit every candidate on `train`, score on `test` and persist the best.
    ///
    /// Both arrays carry the target as their last column.
    pub fn initiate_model_trainer(&self, train: &Array2<f64>, test: &Array2<f64>) -> Result<TrainingReport> {
        self.select_best(train, test).in_stage(Stage::Training)
    }

    fn select_best(&self, train: &Array2<f64>, test: &Array2<f64>) -> Result<TrainingReport> {
        info!("Split training and test input data");
        let (x_train, y_train) = split_features_target(train)?;
        let (x_test, y_test) = split_features_target(test)?;

        if self.config.candidates.is_empty() {
            return Err(PipelineError::ConfigError("no candidate models configured".to_string()));
        }

        let mut scores = Vec::with_capacity(self.config.candidates.len());
        let mut best: Option<(TrainedModel, f64)> = None;

        for candidate in &self.config.candidates {
            let mut model = candidate.build();
            let start = Instant::now();
            model.fit(&x_train, &y_train)?;
            let training_time_secs = start.elapsed().as_secs_f64();

            let y_pred = model.predict(&x_test)?;
            let metrics = ModelMetrics::compute_regression(&y_test, &y_pred)?;
            info!(
                model = model.name(),
                r2 = metrics.r2,
                rmse = metrics.rmse,
                mae = metrics.mae,
                "Evaluated candidate"
            );

            scores.push(ModelScore {
                name: model.name().to_string(),
                metrics,
                training_time_secs,
            });

            if !metrics.r2.is_finite() {
                warn!(model = model.name(), r2 = metrics.r2, "Skipping candidate with non-finite score");
                continue;
            }
            let improves = best.as_ref().map_or(true, |(_, r2)| metrics.r2 > *r2);
            if improves {
                best = Some((model, metrics.r2));
            }
        }

        let (best_model, best_r2) = best
            .ok_or_else(|| PipelineError::TrainingError("no candidate produced a finite score".to_string()))?;

        if best_r2 < self.config.min_r2 {
            warn!(
                model = best_model.name(),
                r2 = best_r2,
                threshold = self.config.min_r2,
                "No best model found"
            );
            return Err(PipelineError::NoAcceptableModel {
                best_score: best_r2,
                threshold: self.config.min_r2,
            });
        }

        info!(model = best_model.name(), r2 = best_r2, "Best found model on both training and testing dataset");
        save_object(&best_model, &self.config.model_path)?;

        Ok(TrainingReport {
            scores,
            best_model_name: best_model.name().to_string(),
            best_r2,
            model_path: self.config.model_path.clone(),
        })
    }
}
