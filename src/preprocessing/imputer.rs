//! Missing value imputation strategies

use super::FeatureBlock;
use crate::error::{PipelineError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Strategy for imputing missing values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImputeStrategy {
    /// Replace with mean (numeric only)
    Mean,
    /// Replace with median (numeric only)
    Median,
    /// Replace with mode / most frequent value
    MostFrequent,
    /// Replace with a constant value
    Constant(f64),
    /// Replace with a constant string (categorical)
    ConstantString(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum ImputeValue {
    Numeric(f64),
    String(String),
}

/// Imputer for handling missing values.
///
/// Numeric and dense input comes out as a dense matrix; categorical input
/// stays categorical with every cell filled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Imputer {
    strategy: ImputeStrategy,
    fill_values: Vec<ImputeValue>,
    is_fitted: bool,
}

impl Imputer {
    /// Create a new imputer with the specified strategy
    pub fn new(strategy: ImputeStrategy) -> Self {
        Self {
            strategy,
            fill_values: Vec::new(),
            is_fitted: false,
        }
    }

    pub fn strategy(&self) -> &ImputeStrategy {
        &self.strategy
    }

    /// Fitted fill value for a numeric column
    pub fn numeric_fill_value(&self, column: usize) -> Option<f64> {
        match self.fill_values.get(column)? {
            ImputeValue::Numeric(v) => Some(*v),
            ImputeValue::String(_) => None,
        }
    }

    /// Fitted fill value for a categorical column
    pub fn categorical_fill_value(&self, column: usize) -> Option<&str> {
        match self.fill_values.get(column)? {
            ImputeValue::String(s) => Some(s.as_str()),
            ImputeValue::Numeric(_) => None,
        }
    }

    /// Fit the imputer to a block
    pub fn fit(&mut self, block: &FeatureBlock) -> Result<&mut Self> {
        self.fill_values = match block {
            FeatureBlock::Numeric(cols) => cols
                .iter()
                .enumerate()
                .map(|(idx, col)| {
                    let observed: Vec<f64> = col.iter().flatten().copied().collect();
                    self.numeric_fill_value_for(idx, observed)
                })
                .collect::<Result<Vec<_>>>()?,
            FeatureBlock::Dense(arr) => arr
                .columns()
                .into_iter()
                .enumerate()
                .map(|(idx, col)| {
                    let observed: Vec<f64> = col.iter().copied().filter(|v| !v.is_nan()).collect();
                    self.numeric_fill_value_for(idx, observed)
                })
                .collect::<Result<Vec<_>>>()?,
            FeatureBlock::Categorical(cols) => cols
                .iter()
                .enumerate()
                .map(|(idx, col)| {
                    let observed: Vec<&str> = col.iter().flatten().map(String::as_str).collect();
                    self.categorical_fill_value_for(idx, observed)
                })
                .collect::<Result<Vec<_>>>()?,
        };

        self.is_fitted = true;
        Ok(self)
    }

    /// Replace missing values with the fitted statistics
    pub fn transform(&self, block: FeatureBlock) -> Result<FeatureBlock> {
        if !self.is_fitted {
            return Err(PipelineError::ModelNotFitted);
        }
        if block.n_cols() != self.fill_values.len() {
            return Err(PipelineError::ShapeError {
                expected: format!("{} columns", self.fill_values.len()),
                actual: format!("{} columns", block.n_cols()),
            });
        }

        match block {
            FeatureBlock::Numeric(cols) => {
                let n_rows = cols.first().map_or(0, |c| c.len());
                let fills = self.numeric_fills()?;
                let arr = Array2::from_shape_fn((n_rows, cols.len()), |(r, c)| {
                    cols[c][r].unwrap_or(fills[c])
                });
                Ok(FeatureBlock::Dense(arr))
            }
            FeatureBlock::Dense(mut arr) => {
                let fills = self.numeric_fills()?;
                for (mut col, fill) in arr.columns_mut().into_iter().zip(fills) {
                    col.mapv_inplace(|v| if v.is_nan() { fill } else { v });
                }
                Ok(FeatureBlock::Dense(arr))
            }
            FeatureBlock::Categorical(cols) => {
                let filled = cols
                    .into_iter()
                    .zip(&self.fill_values)
                    .map(|(col, fill)| {
                        let fill = match fill {
                            ImputeValue::String(s) => s.clone(),
                            ImputeValue::Numeric(v) => v.to_string(),
                        };
                        col.into_iter()
                            .map(|v| Some(v.unwrap_or_else(|| fill.clone())))
                            .collect()
                    })
                    .collect();
                Ok(FeatureBlock::Categorical(filled))
            }
        }
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, block: FeatureBlock) -> Result<FeatureBlock> {
        self.fit(&block)?;
        self.transform(block)
    }

    fn numeric_fills(&self) -> Result<Vec<f64>> {
        self.fill_values
            .iter()
            .map(|v| match v {
                ImputeValue::Numeric(x) => Ok(*x),
                ImputeValue::String(s) => Err(PipelineError::PreprocessingError(format!(
                    "string fill value '{}' cannot be applied to a numeric column",
                    s
                ))),
            })
            .collect()
    }

    fn numeric_fill_value_for(&self, column: usize, mut observed: Vec<f64>) -> Result<ImputeValue> {
        if let ImputeStrategy::Constant(v) = self.strategy {
            return Ok(ImputeValue::Numeric(v));
        }
        if observed.is_empty() {
            return Err(empty_column(column));
        }

        match &self.strategy {
            ImputeStrategy::Mean => {
                let mean = observed.iter().sum::<f64>() / observed.len() as f64;
                Ok(ImputeValue::Numeric(mean))
            }
            ImputeStrategy::Median => {
                observed.sort_by(f64::total_cmp);
                let mid = observed.len() / 2;
                let median = if observed.len() % 2 == 0 {
                    (observed[mid - 1] + observed[mid]) / 2.0
                } else {
                    observed[mid]
                };
                Ok(ImputeValue::Numeric(median))
            }
            ImputeStrategy::MostFrequent => {
                // Keyed by bit pattern; ties resolve to the smallest value
                let mut counts: BTreeMap<u64, (f64, usize)> = BTreeMap::new();
                for v in observed {
                    counts.entry(v.to_bits()).or_insert((v, 0)).1 += 1;
                }
                let mode = counts
                    .into_values()
                    .max_by(|a, b| a.1.cmp(&b.1).then(b.0.total_cmp(&a.0)))
                    .map(|(v, _)| v)
                    .unwrap_or(0.0);
                Ok(ImputeValue::Numeric(mode))
            }
            ImputeStrategy::ConstantString(s) => Ok(ImputeValue::String(s.clone())),
            ImputeStrategy::Constant(v) => Ok(ImputeValue::Numeric(*v)),
        }
    }

    fn categorical_fill_value_for(&self, column: usize, observed: Vec<&str>) -> Result<ImputeValue> {
        match &self.strategy {
            ImputeStrategy::ConstantString(s) => Ok(ImputeValue::String(s.clone())),
            ImputeStrategy::Constant(v) => Ok(ImputeValue::String(v.to_string())),
            ImputeStrategy::MostFrequent => {
                // BTreeMap iterates in sorted order, so ties keep the smallest category
                let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
                for v in observed {
                    *counts.entry(v).or_insert(0) += 1;
                }
                let mut best: Option<(&str, usize)> = None;
                for (value, count) in counts {
                    if best.map_or(true, |(_, c)| count > c) {
                        best = Some((value, count));
                    }
                }
                best.map(|(v, _)| ImputeValue::String(v.to_string()))
                    .ok_or_else(|| empty_column(column))
            }
            ImputeStrategy::Mean | ImputeStrategy::Median => Err(PipelineError::PreprocessingError(format!(
                "{:?} imputation cannot be used with categorical data",
                self.strategy
            ))),
        }
    }
}

fn empty_column(column: usize) -> PipelineError {
    PipelineError::PreprocessingError(format!(
        "column {} has no observed values to compute a fill value from",
        column
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric(cols: Vec<Vec<Option<f64>>>) -> FeatureBlock {
        FeatureBlock::Numeric(cols)
    }

    fn categorical(cols: Vec<Vec<Option<&str>>>) -> FeatureBlock {
        FeatureBlock::Categorical(
            cols.into_iter()
                .map(|c| c.into_iter().map(|v| v.map(str::to_string)).collect())
                .collect(),
        )
    }

    #[test]
    fn test_imputer_creation() {
        let imputer = Imputer::new(ImputeStrategy::Mean);
        assert!(!imputer.is_fitted);
    }

    #[test]
    fn test_impute_strategy_serialize() {
        let strategy = ImputeStrategy::Constant(5.0);
        let json = serde_json::to_string(&strategy).unwrap();
        assert!(json.contains("Constant"));
        assert!(json.contains("5"));
    }

    #[test]
    fn test_mean_imputation() {
        let mut imputer = Imputer::new(ImputeStrategy::Mean);
        let result = imputer
            .fit_transform(numeric(vec![vec![Some(1.0), None, Some(3.0), Some(4.0)]]))
            .unwrap()
            .into_dense()
            .unwrap();

        // Mean of [1, 3, 4] = 8/3
        assert!((result[[1, 0]] - 2.666666666666667).abs() < 0.001);
    }

    #[test]
    fn test_median_even_count_averages_middle() {
        let mut imputer = Imputer::new(ImputeStrategy::Median);
        imputer
            .fit(&numeric(vec![vec![Some(4.0), Some(1.0), None, Some(3.0), Some(10.0)]]))
            .unwrap();
        assert_eq!(imputer.numeric_fill_value(0), Some(3.5));
    }

    #[test]
    fn test_most_frequent_tie_picks_smallest() {
        let mut imputer = Imputer::new(ImputeStrategy::MostFrequent);
        imputer
            .fit(&categorical(vec![vec![Some("b"), Some("a"), Some("b"), Some("a"), None]]))
            .unwrap();
        assert_eq!(imputer.categorical_fill_value(0), Some("a"));
    }

    #[test]
    fn test_categorical_fill() {
        let mut imputer = Imputer::new(ImputeStrategy::MostFrequent);
        let out = imputer
            .fit_transform(categorical(vec![vec![Some("x"), Some("y"), Some("y"), None]]))
            .unwrap();
        assert_eq!(out, categorical(vec![vec![Some("x"), Some("y"), Some("y"), Some("y")]]));
    }

    #[test]
    fn test_median_on_categorical_fails() {
        let mut imputer = Imputer::new(ImputeStrategy::Median);
        let err = imputer.fit(&categorical(vec![vec![Some("x")]])).unwrap_err();
        assert!(matches!(err, PipelineError::PreprocessingError(_)));
    }

    #[test]
    fn test_all_missing_column_fails() {
        let mut imputer = Imputer::new(ImputeStrategy::Median);
        assert!(imputer.fit(&numeric(vec![vec![None, None]])).is_err());
    }

    #[test]
    fn test_transform_requires_fit() {
        let imputer = Imputer::new(ImputeStrategy::Median);
        let err = imputer.transform(numeric(vec![vec![Some(1.0)]])).unwrap_err();
        assert!(matches!(err, PipelineError::ModelNotFitted));
    }
}
