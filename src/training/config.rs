//! Training configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::decision_tree::DecisionTreeRegressor;
use super::knn::KNNRegressor;
use super::linear_models::{LassoRegression, LinearRegression, RidgeRegression};
use super::trainer::TrainedModel;
use crate::utils::rebase_path;

/// Candidate model and its hyper-parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModelType {
    LinearRegression,
    Ridge { alpha: f64 },
    Lasso { alpha: f64 },
    DecisionTree {
        max_depth: Option<usize>,
        min_samples_split: usize,
    },
    KNeighbors { n_neighbors: usize },
}

impl ModelType {
    /// Unfitted model for this candidate
    pub fn build(&self) -> TrainedModel {
        match self {
            ModelType::LinearRegression => TrainedModel::LinearRegression(LinearRegression::new()),
            ModelType::Ridge { alpha } => TrainedModel::Ridge(RidgeRegression::new(*alpha)),
            ModelType::Lasso { alpha } => TrainedModel::Lasso(LassoRegression::new(*alpha)),
            ModelType::DecisionTree {
                max_depth,
                min_samples_split,
            } => {
                let mut tree = DecisionTreeRegressor::new().with_min_samples_split(*min_samples_split);
                tree.max_depth = *max_depth;
                TrainedModel::DecisionTree(tree)
            }
            ModelType::KNeighbors { n_neighbors } => {
                TrainedModel::KNeighbors(KNNRegressor::with_k(*n_neighbors))
            }
        }
    }
}

/// Default candidate set
pub fn default_candidates() -> Vec<ModelType> {
    vec![
        ModelType::LinearRegression,
        ModelType::Ridge { alpha: 1.0 },
        ModelType::Lasso { alpha: 1.0 },
        ModelType::DecisionTree {
            max_depth: Some(8),
            min_samples_split: 2,
        },
        ModelType::KNeighbors { n_neighbors: 5 },
    ]
}

/// Configuration for the model-training stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelTrainerConfig {
    /// Where the best model is written
    pub model_path: PathBuf,
    /// Minimum test R² for the best model to be accepted
    pub min_r2: f64,
    pub candidates: Vec<ModelType>,
}

impl Default for ModelTrainerConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("artifacts/model.bin"),
            min_r2: 0.6,
            candidates: default_candidates(),
        }
    }
}

impl ModelTrainerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }

    pub fn with_min_r2(mut self, min_r2: f64) -> Self {
        self.min_r2 = min_r2;
        self
    }

    pub fn with_candidates(mut self, candidates: Vec<ModelType>) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn with_artifacts_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.model_path = rebase_path(dir.as_ref(), &self.model_path);
        self
    }
}
