//! CART regression tree

use super::models::{check_n_features, check_training_data, Regressor};
use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with prediction value
    Leaf { value: f64, n_samples: usize },
    /// Internal node; rows with `x[feature_idx] <= threshold` go left
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
        impurity: f64,
    },
}

impl TreeNode {
    fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    fn n_leaves(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => left.n_leaves() + right.n_leaves(),
        }
    }
}

/// Best split found for one node
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    /// Reduction in summed squared error
    gain: f64,
}

/// Regression tree grown by variance reduction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeRegressor {
    root: Option<TreeNode>,
    /// Maximum depth (`None` grows until leaves are pure)
    pub max_depth: Option<usize>,
    /// Minimum samples required to split a node
    pub min_samples_split: usize,
    /// Minimum samples in each leaf
    pub min_samples_leaf: usize,
    n_features: usize,
    feature_importances: Option<Array1<f64>>,
}

impl Default for DecisionTreeRegressor {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTreeRegressor {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            n_features: 0,
            feature_importances: None,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    /// Normalized impurity decrease per feature
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    pub fn depth(&self) -> Option<usize> {
        self.root.as_ref().map(TreeNode::depth)
    }

    pub fn n_leaves(&self) -> Option<usize> {
        self.root.as_ref().map(TreeNode::n_leaves)
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        check_training_data(x, y)?;
        if self.min_samples_split < 2 {
            return Err(PipelineError::InvalidParameter {
                name: "min_samples_split".to_string(),
                value: self.min_samples_split.to_string(),
                reason: "must be at least 2".to_string(),
            });
        }
        if self.min_samples_leaf == 0 {
            return Err(PipelineError::InvalidParameter {
                name: "min_samples_leaf".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        self.n_features = x.ncols();
        let mut importances = vec![0.0; self.n_features];
        let indices: Vec<usize> = (0..x.nrows()).collect();
        self.root = Some(self.build_tree(x, y, indices, 0, &mut importances));

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            importances.iter_mut().for_each(|imp| *imp /= total);
        }
        self.feature_importances = Some(Array1::from_vec(importances));
        Ok(self)
    }

    fn build_tree(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: Vec<usize>,
        depth: usize,
        importances: &mut [f64],
    ) -> TreeNode {
        let n_samples = indices.len();
        let (sum, sq_sum) = indices
            .iter()
            .fold((0.0, 0.0), |(s, sq), &i| (s + y[i], sq + y[i] * y[i]));
        let mean = sum / n_samples as f64;
        let impurity = (sq_sum / n_samples as f64 - mean * mean).max(0.0);

        let should_stop = n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.is_some_and(|d| depth >= d)
            || impurity <= 1e-12;

        let split = if should_stop {
            None
        } else {
            self.find_best_split(x, y, &indices, sum, sq_sum)
        };

        let Some(split) = split else {
            return TreeNode::Leaf {
                value: mean,
                n_samples,
            };
        };

        importances[split.feature_idx] += split.gain;

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| x[[i, split.feature_idx]] <= split.threshold);

        let left = Box::new(self.build_tree(x, y, left_idx, depth + 1, importances));
        let right = Box::new(self.build_tree(x, y, right_idx, depth + 1, importances));

        TreeNode::Split {
            feature_idx: split.feature_idx,
            threshold: split.threshold,
            left,
            right,
            n_samples,
            impurity,
        }
    }

    /// Scan every feature in sorted order, keeping running sums so each
    /// candidate threshold costs O(1).
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        total_sum: f64,
        total_sq: f64,
    ) -> Option<SplitCandidate> {
        let n = indices.len();
        let parent_sse = total_sq - total_sum * total_sum / n as f64;
        let mut best: Option<SplitCandidate> = None;
        let mut sorted = indices.to_vec();

        for feature_idx in 0..x.ncols() {
            sorted.sort_by(|&a, &b| {
                x[[a, feature_idx]]
                    .partial_cmp(&x[[b, feature_idx]])
                    .unwrap_or(Ordering::Equal)
            });

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;
            for pos in 0..n - 1 {
                let yi = y[sorted[pos]];
                left_sum += yi;
                left_sq += yi * yi;

                let here = x[[sorted[pos], feature_idx]];
                let next = x[[sorted[pos + 1], feature_idx]];
                if next <= here {
                    continue;
                }

                let n_left = pos + 1;
                let n_right = n - n_left;
                if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                    continue;
                }

                let right_sum = total_sum - left_sum;
                let right_sq = total_sq - left_sq;
                let child_sse = (left_sq - left_sum * left_sum / n_left as f64)
                    + (right_sq - right_sum * right_sum / n_right as f64);
                let gain = parent_sse - child_sse;

                if gain > 1e-12 && best.as_ref().map_or(true, |b| gain > b.gain) {
                    best = Some(SplitCandidate {
                        feature_idx,
                        threshold: (here + next) / 2.0,
                        gain,
                    });
                }
            }
        }

        best
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(PipelineError::ModelNotFitted)?;
        check_n_features(x, self.n_features)?;
        Ok(x.rows().into_iter().map(|row| predict_row(root, row)).collect())
    }
}

fn predict_row(mut node: &TreeNode, row: ArrayView1<f64>) -> f64 {
    loop {
        match node {
            TreeNode::Leaf { value, .. } => return *value,
            TreeNode::Split {
                feature_idx,
                threshold,
                left,
                right,
                ..
            } => {
                node = if row[*feature_idx] <= *threshold { left } else { right };
            }
        }
    }
}

impl Regressor for DecisionTreeRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        DecisionTreeRegressor::fit(self, x, y).map(|_| ())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        DecisionTreeRegressor::predict(self, x)
    }

    fn name(&self) -> &'static str {
        "Decision Tree"
    }

    fn is_fitted(&self) -> bool {
        self.root.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_step_function_is_learned_exactly() {
        let x = array![[1.0], [2.0], [3.0], [10.0], [11.0], [12.0]];
        let y = array![5.0, 5.0, 5.0, 20.0, 20.0, 20.0];

        let mut tree = DecisionTreeRegressor::new();
        tree.fit(&x, &y).unwrap();

        assert_eq!(tree.depth(), Some(1));
        let pred = tree.predict(&array![[0.0], [6.0], [7.0], [100.0]]).unwrap();
        assert_eq!(pred, array![5.0, 5.0, 20.0, 20.0]);
    }

    #[test]
    fn test_max_depth_limits_tree() {
        let x = Array2::from_shape_fn((32, 1), |(i, _)| i as f64);
        let y = Array1::from_shape_fn(32, |i| (i * i) as f64);

        let mut tree = DecisionTreeRegressor::new().with_max_depth(2);
        tree.fit(&x, &y).unwrap();
        assert!(tree.depth().unwrap() <= 2);
        assert!(tree.n_leaves().unwrap() <= 4);
    }

    #[test]
    fn test_min_samples_split_stops_growth() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![1.0, 2.0, 3.0, 4.0];
        let mut tree = DecisionTreeRegressor::new().with_min_samples_split(5);
        tree.fit(&x, &y).unwrap();

        assert_eq!(tree.n_leaves(), Some(1));
        assert_eq!(tree.predict(&array![[0.0]]).unwrap()[0], 2.5);
    }

    #[test]
    fn test_importances_pick_informative_feature() {
        let x = array![
            [0.0, 7.0],
            [0.0, 1.0],
            [0.0, 4.0],
            [1.0, 2.0],
            [1.0, 8.0],
            [1.0, 3.0],
        ];
        let y = array![0.0, 0.0, 0.0, 10.0, 10.0, 10.0];
        let mut tree = DecisionTreeRegressor::new();
        tree.fit(&x, &y).unwrap();

        let imp = tree.feature_importances().unwrap();
        assert!((imp[0] - 1.0).abs() < 1e-12);
        assert_eq!(imp[1], 0.0);
    }

    #[test]
    fn test_unfitted_and_invalid() {
        let x = array![[1.0], [2.0]];
        assert!(matches!(
            DecisionTreeRegressor::new().predict(&x),
            Err(PipelineError::ModelNotFitted)
        ));

        let mut tree = DecisionTreeRegressor::new().with_min_samples_split(1);
        assert!(tree.fit(&x, &array![1.0, 2.0]).is_err());
    }
}
