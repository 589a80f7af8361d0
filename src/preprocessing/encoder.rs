//! One-hot encoding for categorical columns

use super::FeatureBlock;
use crate::error::{PipelineError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// What to do with a category that was not seen during fit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnknownCategoryPolicy {
    /// Fail the transform
    Error,
    /// Emit an all-zero indicator block for that column
    Ignore,
}

impl Default for UnknownCategoryPolicy {
    fn default() -> Self {
        UnknownCategoryPolicy::Ignore
    }
}

/// One-hot encoder: one indicator column per known category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneHotEncoder {
    handle_unknown: UnknownCategoryPolicy,
    /// Input column names, used in error messages
    columns: Vec<String>,
    /// Sorted categories per input column
    categories: Vec<Vec<String>>,
    is_fitted: bool,
}

impl Default for OneHotEncoder {
    fn default() -> Self {
        Self::new(UnknownCategoryPolicy::default())
    }
}

impl OneHotEncoder {
    /// Create a new encoder
    pub fn new(handle_unknown: UnknownCategoryPolicy) -> Self {
        Self {
            handle_unknown,
            columns: Vec::new(),
            categories: Vec::new(),
            is_fitted: false,
        }
    }

    /// Name the input columns for error reporting
    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = columns;
        self
    }

    /// Categories learned for each input column
    pub fn categories(&self) -> &[Vec<String>] {
        &self.categories
    }

    /// Total number of output columns
    pub fn n_features_out(&self) -> usize {
        self.categories.iter().map(Vec::len).sum()
    }

    /// Fit the encoder on a categorical block
    pub fn fit(&mut self, block: &FeatureBlock) -> Result<&mut Self> {
        let FeatureBlock::Categorical(cols) = block else {
            return Err(PipelineError::PreprocessingError(
                "one-hot encoder expects categorical input".to_string(),
            ));
        };

        self.categories = cols
            .iter()
            .map(|col| {
                let mut cats: Vec<String> = col.iter().flatten().cloned().collect();
                cats.sort();
                cats.dedup();
                cats
            })
            .collect();

        self.is_fitted = true;
        Ok(self)
    }

    /// Encode a categorical block into a dense indicator matrix
    pub fn transform(&self, block: FeatureBlock) -> Result<FeatureBlock> {
        if !self.is_fitted {
            return Err(PipelineError::ModelNotFitted);
        }
        let FeatureBlock::Categorical(cols) = block else {
            return Err(PipelineError::PreprocessingError(
                "one-hot encoder expects categorical input".to_string(),
            ));
        };
        if cols.len() != self.categories.len() {
            return Err(PipelineError::ShapeError {
                expected: format!("{} columns", self.categories.len()),
                actual: format!("{} columns", cols.len()),
            });
        }

        let n_rows = cols.first().map_or(0, |c| c.len());
        let mut out = Array2::zeros((n_rows, self.n_features_out()));

        let mut offset = 0;
        for (col_idx, (col, cats)) in cols.iter().zip(&self.categories).enumerate() {
            for (row, value) in col.iter().enumerate() {
                let position = value
                    .as_deref()
                    .and_then(|v| cats.binary_search_by(|c| c.as_str().cmp(v)).ok());
                match (position, self.handle_unknown) {
                    (Some(pos), _) => out[[row, offset + pos]] = 1.0,
                    (None, UnknownCategoryPolicy::Ignore) => {}
                    (None, UnknownCategoryPolicy::Error) => {
                        return Err(PipelineError::UnknownCategory {
                            column: self
                                .columns
                                .get(col_idx)
                                .cloned()
                                .unwrap_or_else(|| format!("column {}", col_idx)),
                            value: value.clone().unwrap_or_else(|| "<null>".to_string()),
                        });
                    }
                }
            }
            offset += cats.len();
        }

        Ok(FeatureBlock::Dense(out))
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, block: FeatureBlock) -> Result<FeatureBlock> {
        self.fit(&block)?;
        self.transform(block)
    }

    /// Output names `<column>_<category>` for the given input names
    pub fn feature_names_out(&self, input_names: &[String]) -> Vec<String> {
        input_names
            .iter()
            .zip(&self.categories)
            .flat_map(|(name, cats)| cats.iter().map(move |c| format!("{}_{}", name, c)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(values: &[&[Option<&str>]]) -> FeatureBlock {
        FeatureBlock::Categorical(
            values
                .iter()
                .map(|c| c.iter().map(|v| v.map(str::to_string)).collect())
                .collect(),
        )
    }

    #[test]
    fn test_onehot_sorted_categories() {
        let mut encoder = OneHotEncoder::default();
        let out = encoder
            .fit_transform(block(&[&[Some("male"), Some("female"), Some("male")]]))
            .unwrap()
            .into_dense()
            .unwrap();

        assert_eq!(encoder.categories()[0], vec!["female", "male"]);
        assert_eq!(out.shape(), &[3, 2]);
        assert_eq!(out.row(0).to_vec(), vec![0.0, 1.0]);
        assert_eq!(out.row(1).to_vec(), vec![1.0, 0.0]);
    }

    #[test]
    fn test_unknown_category_ignored() {
        let mut encoder = OneHotEncoder::new(UnknownCategoryPolicy::Ignore);
        encoder.fit(&block(&[&[Some("a"), Some("b")]])).unwrap();

        let out = encoder
            .transform(block(&[&[Some("c")]]))
            .unwrap()
            .into_dense()
            .unwrap();
        assert_eq!(out.row(0).to_vec(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_unknown_category_error() {
        let mut encoder = OneHotEncoder::new(UnknownCategoryPolicy::Error);
        encoder.fit(&block(&[&[Some("a"), Some("b")]])).unwrap();

        let err = encoder.transform(block(&[&[Some("c")]])).unwrap_err();
        assert!(matches!(err, PipelineError::UnknownCategory { value, .. } if value == "c"));

        let mut named = OneHotEncoder::new(UnknownCategoryPolicy::Error).with_columns(vec!["lunch".to_string()]);
        named.fit(&block(&[&[Some("a")]])).unwrap();
        let err = named.transform(block(&[&[Some("z")]])).unwrap_err();
        assert!(matches!(err, PipelineError::UnknownCategory { column, .. } if column == "lunch"));
    }

    #[test]
    fn test_multi_column_offsets_and_names() {
        let mut encoder = OneHotEncoder::default();
        let out = encoder
            .fit_transform(block(&[
                &[Some("x"), Some("y")],
                &[Some("p"), Some("q")],
            ]))
            .unwrap()
            .into_dense()
            .unwrap();

        assert_eq!(out.row(1).to_vec(), vec![0.0, 1.0, 0.0, 1.0]);
        let names = encoder.feature_names_out(&["c1".to_string(), "c2".to_string()]);
        assert_eq!(names, vec!["c1_x", "c1_y", "c2_p", "c2_q"]);
    }
}
