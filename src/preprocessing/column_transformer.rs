//! Column transformer: routes named column groups through their own
//! pipelines and concatenates the dense results.

use super::{ColumnKind, FeatureBlock, Pipeline};
use crate::error::{PipelineError, Result};
use ndarray::{concatenate, Array2, ArrayView2, Axis};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// One named group of columns and the pipeline applied to it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnGroup {
    pub name: String,
    pub kind: ColumnKind,
    pub columns: Vec<String>,
    pub pipeline: Pipeline,
}

impl ColumnGroup {
    pub fn new(name: impl Into<String>, kind: ColumnKind, columns: Vec<String>, pipeline: Pipeline) -> Self {
        Self {
            name: name.into(),
            kind,
            columns,
            pipeline,
        }
    }
}

/// Fitted preprocessor mapping a table to a fixed-width numeric matrix.
///
/// Output columns are the group outputs in declaration order. Columns not
/// named by any group are dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnTransformer {
    groups: Vec<ColumnGroup>,
    n_features_out: usize,
    is_fitted: bool,
    /// Seconds spent in the last fit call
    fit_time: Option<f64>,
    /// Rows seen during fit
    n_samples_fit: usize,
}

impl ColumnTransformer {
    pub fn new(groups: Vec<ColumnGroup>) -> Self {
        Self {
            groups,
            n_features_out: 0,
            is_fitted: false,
            fit_time: None,
            n_samples_fit: 0,
        }
    }

    pub fn groups(&self) -> &[ColumnGroup] {
        &self.groups
    }

    /// Look up a group by name
    pub fn group(&self, name: &str) -> Option<&ColumnGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    pub fn n_features_out(&self) -> usize {
        self.n_features_out
    }

    pub fn n_samples_fit(&self) -> usize {
        self.n_samples_fit
    }

    pub fn fit_time(&self) -> Option<f64> {
        self.fit_time
    }

    /// Every input column consumed by some group
    pub fn input_columns(&self) -> Vec<&str> {
        self.groups
            .iter()
            .flat_map(|g| g.columns.iter().map(String::as_str))
            .collect()
    }

    /// Fit every group pipeline on `df`
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        self.fit_transform(df)?;
        Ok(self)
    }

    /// Fit on `df` and return its transformed matrix
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<Array2<f64>> {
        let start = Instant::now();

        let outputs = self
            .groups
            .iter_mut()
            .map(|group| {
                let block = FeatureBlock::from_frame(df, &group.columns, group.kind)?;
                let out = group.pipeline.fit_transform(block)?.into_dense()?;
                debug!(group = %group.name, width = out.ncols(), "Fitted column group");
                Ok(out)
            })
            .collect::<Result<Vec<_>>>()?;

        let result = hstack(&outputs, df.height())?;
        self.n_features_out = result.ncols();
        self.n_samples_fit = df.height();
        self.is_fitted = true;
        self.fit_time = Some(start.elapsed().as_secs_f64());

        info!(
            rows = df.height(),
            features_out = self.n_features_out,
            "Fitted column transformer"
        );
        Ok(result)
    }

    /// Transform `df` with the fitted pipelines
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(PipelineError::ModelNotFitted);
        }

        let outputs = self
            .groups
            .iter()
            .map(|group| {
                let block = FeatureBlock::from_frame(df, &group.columns, group.kind)?;
                group.pipeline.transform(block)?.into_dense()
            })
            .collect::<Result<Vec<_>>>()?;

        let result = hstack(&outputs, df.height())?;
        if result.ncols() != self.n_features_out {
            return Err(PipelineError::ShapeError {
                expected: format!("{} output features", self.n_features_out),
                actual: format!("{} output features", result.ncols()),
            });
        }
        Ok(result)
    }

    /// Output names, prefixed with the group name: `num_pipeline__writing_score`
    pub fn feature_names_out(&self) -> Vec<String> {
        self.groups
            .iter()
            .flat_map(|g| {
                g.pipeline
                    .feature_names_out(&g.columns)
                    .into_iter()
                    .map(move |n| format!("{}__{}", g.name, n))
            })
            .collect()
    }
}

fn hstack(blocks: &[Array2<f64>], n_rows: usize) -> Result<Array2<f64>> {
    if blocks.is_empty() {
        return Ok(Array2::zeros((n_rows, 0)));
    }
    let views: Vec<ArrayView2<f64>> = blocks.iter().map(|b| b.view()).collect();
    Ok(concatenate(Axis(1), &views)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::PreprocessingConfig;

    fn create_test_dataframe() -> DataFrame {
        df!(
            "age" => &[25.0, 30.0, 35.0, 40.0, 45.0],
            "income" => &[50000.0, 60000.0, 70000.0, 80000.0, 90000.0],
            "city" => &["NYC", "LA", "NYC", "SF", "LA"],
            "label" => &[1.0, 0.0, 1.0, 0.0, 1.0],
        )
        .unwrap()
    }

    fn transformer() -> ColumnTransformer {
        PreprocessingConfig::new()
            .with_numeric_columns(&["age", "income"])
            .with_categorical_columns(&["city"])
            .build()
    }

    #[test]
    fn test_output_width_and_order() {
        let df = create_test_dataframe();
        let mut ct = transformer();
        let out = ct.fit_transform(&df).unwrap();

        assert_eq!(out.shape(), &[5, 5]);
        assert_eq!(
            ct.feature_names_out(),
            vec![
                "num_pipeline__age",
                "num_pipeline__income",
                "cat_pipeline__city_LA",
                "cat_pipeline__city_NYC",
                "cat_pipeline__city_SF",
            ]
        );
    }

    #[test]
    fn test_unnamed_columns_are_dropped() {
        let df = create_test_dataframe();
        let mut ct = transformer();
        ct.fit(&df).unwrap();
        assert!(!ct.input_columns().contains(&"label"));
        assert_eq!(ct.n_features_out(), 5);
    }

    #[test]
    fn test_transform_matches_fit_transform() {
        let df = create_test_dataframe();
        let mut ct = transformer();
        let fitted = ct.fit_transform(&df).unwrap();
        let again = ct.transform(&df).unwrap();
        assert_eq!(fitted, again);
    }

    #[test]
    fn test_missing_input_column() {
        let df = create_test_dataframe();
        let mut ct = transformer();
        ct.fit(&df).unwrap();

        let partial = df.drop("income").unwrap();
        let err = ct.transform(&partial).unwrap_err();
        assert!(matches!(err, PipelineError::FeatureNotFound(name) if name == "income"));
    }

    #[test]
    fn test_transform_requires_fit() {
        let ct = transformer();
        assert!(matches!(
            ct.transform(&create_test_dataframe()),
            Err(PipelineError::ModelNotFitted)
        ));
    }
}
