//! K-nearest-neighbours regressor

use super::models::{check_n_features, check_training_data, Regressor};
use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Distance metric for KNN
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum DistanceMetric {
    /// L2
    #[default]
    Euclidean,
    /// L1
    Manhattan,
}

/// Weighting of neighbour targets
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum WeightScheme {
    #[default]
    Uniform,
    /// Inverse distance
    Distance,
}

/// KNN configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KNNConfig {
    pub n_neighbors: usize,
    pub metric: DistanceMetric,
    pub weights: WeightScheme,
}

impl Default for KNNConfig {
    fn default() -> Self {
        Self {
            n_neighbors: 5,
            metric: DistanceMetric::Euclidean,
            weights: WeightScheme::Uniform,
        }
    }
}

/// Regressor predicting the mean target of the k closest training rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KNNRegressor {
    config: KNNConfig,
    x_train: Option<Array2<f64>>,
    y_train: Option<Array1<f64>>,
}

impl Default for KNNRegressor {
    fn default() -> Self {
        Self::new(KNNConfig::default())
    }
}

impl KNNRegressor {
    pub fn new(config: KNNConfig) -> Self {
        Self {
            config,
            x_train: None,
            y_train: None,
        }
    }

    /// Default config with `k` neighbours
    pub fn with_k(k: usize) -> Self {
        Self::new(KNNConfig {
            n_neighbors: k,
            ..Default::default()
        })
    }

    pub fn config(&self) -> &KNNConfig {
        &self.config
    }

    /// Store the training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        check_training_data(x, y)?;
        if self.config.n_neighbors == 0 {
            return Err(PipelineError::InvalidParameter {
                name: "n_neighbors".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        self.x_train = Some(x.clone());
        self.y_train = Some(y.clone());
        Ok(self)
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let (x_train, y_train) = match (&self.x_train, &self.y_train) {
            (Some(x), Some(y)) => (x, y),
            _ => return Err(PipelineError::ModelNotFitted),
        };
        check_n_features(x, x_train.ncols())?;

        let k = self.config.n_neighbors.min(x_train.nrows());
        Ok(x
            .rows()
            .into_iter()
            .map(|row| {
                let neighbors = find_k_nearest(row, x_train, y_train, k, self.config.metric);
                weighted_mean(&neighbors, self.config.weights)
            })
            .collect())
    }
}

/// Max-heap entry keyed on distance
#[derive(PartialEq)]
struct Neighbor {
    dist: f64,
    target: f64,
}

impl Eq for Neighbor {}

impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Neighbor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist.partial_cmp(&other.dist).unwrap_or(Ordering::Equal)
    }
}

/// The k smallest distances, O(n log k)
fn find_k_nearest(
    point: ArrayView1<f64>,
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    k: usize,
    metric: DistanceMetric,
) -> Vec<Neighbor> {
    let mut heap = BinaryHeap::with_capacity(k + 1);

    for (row, &target) in x_train.rows().into_iter().zip(y_train.iter()) {
        let dist = distance(point, row, metric);
        if heap.len() < k {
            heap.push(Neighbor { dist, target });
        } else if heap.peek().is_some_and(|top| dist < top.dist) {
            heap.pop();
            heap.push(Neighbor { dist, target });
        }
    }

    heap.into_vec()
}

fn distance(a: ArrayView1<f64>, b: ArrayView1<f64>, metric: DistanceMetric) -> f64 {
    let diffs = a.iter().zip(b.iter()).map(|(ai, bi)| ai - bi);
    match metric {
        DistanceMetric::Euclidean => diffs.map(|d| d * d).sum::<f64>().sqrt(),
        DistanceMetric::Manhattan => diffs.map(f64::abs).sum(),
    }
}

fn weighted_mean(neighbors: &[Neighbor], weights: WeightScheme) -> f64 {
    if weights == WeightScheme::Distance {
        // An exact match decides the prediction
        let exact: Vec<f64> = neighbors
            .iter()
            .filter(|n| n.dist == 0.0)
            .map(|n| n.target)
            .collect();
        if !exact.is_empty() {
            return exact.iter().sum::<f64>() / exact.len() as f64;
        }
    }

    let (num, den) = neighbors.iter().fold((0.0, 0.0), |(num, den), n| {
        let w = match weights {
            WeightScheme::Uniform => 1.0,
            WeightScheme::Distance => 1.0 / n.dist,
        };
        (num + w * n.target, den + w)
    });
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

impl Regressor for KNNRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        KNNRegressor::fit(self, x, y).map(|_| ())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        KNNRegressor::predict(self, x)
    }

    fn name(&self) -> &'static str {
        "K-Neighbors Regressor"
    }

    fn is_fitted(&self) -> bool {
        self.x_train.is_some()
    }
}
