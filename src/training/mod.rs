//! Model training
//!
//! Candidate regressors:
//! - Linear models (OLS, Ridge, Lasso)
//! - CART regression tree
//! - K-Nearest Neighbors
//!
//! [`ModelTrainer`] fits each candidate on the transformed train array,
//! scores it on the test array and persists the best one.

mod config;
mod models;
mod trainer;
pub mod decision_tree;
pub mod knn;
pub mod linear_models;

pub use config::{default_candidates, ModelTrainerConfig, ModelType};
pub use decision_tree::{DecisionTreeRegressor, TreeNode};
pub use knn::{DistanceMetric, KNNConfig, KNNRegressor, WeightScheme};
pub use linear_models::{LassoRegression, LinearRegression, RidgeRegression};
pub use models::{r2_score, ModelMetrics, Regressor};
pub use trainer::{split_features_target, ModelScore, ModelTrainer, TrainedModel, TrainingReport};
