//! Data transformation stage
//!
//! Fits the column transformer on the train split, applies it to both
//! splits and persists the fitted transformer.

use crate::error::{PipelineError, Result, Stage, StageContext};
use crate::export::save_object;
use crate::preprocessing::{numeric_column, ColumnTransformer, PreprocessingConfig};
use crate::utils::{rebase_path, DataLoader};
use ndarray::{concatenate, Array1, Array2, Axis};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Configuration for the transformation stage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataTransformationConfig {
    /// Where the fitted transformer is written
    pub preprocessor_path: PathBuf,
    pub target_column: String,
    pub preprocessing: PreprocessingConfig,
}

impl Default for DataTransformationConfig {
    fn default() -> Self {
        Self {
            preprocessor_path: PathBuf::from("artifacts/preprocessor.bin"),
            target_column: "math_score".to_string(),
            preprocessing: PreprocessingConfig::default(),
        }
    }
}

impl DataTransformationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preprocessor_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.preprocessor_path = path.into();
        self
    }

    pub fn with_target_column(mut self, name: impl Into<String>) -> Self {
        self.target_column = name.into();
        self
    }

    pub fn with_preprocessing(mut self, preprocessing: PreprocessingConfig) -> Self {
        self.preprocessing = preprocessing;
        self
    }

    pub fn with_artifacts_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.preprocessor_path = rebase_path(dir.as_ref(), &self.preprocessor_path);
        self
    }
}

/// Output of [`DataTransformation::initiate_data_transformation`].
///
/// Both arrays carry the target as their last column.
#[derive(Debug, Clone)]
pub struct TransformationArtifacts {
    pub train: Array2<f64>,
    pub test: Array2<f64>,
    pub preprocessor_path: PathBuf,
}

/// Transformation stage
#[derive(Debug, Clone, Default)]
pub struct DataTransformation {
    config: DataTransformationConfig,
    loader: DataLoader,
}

impl DataTransformation {
    pub fn new(config: DataTransformationConfig) -> Self {
        Self {
            config,
            loader: DataLoader::new(),
        }
    }

    pub fn config(&self) -> &DataTransformationConfig {
        &self.config
    }

    /// Unfitted column transformer for the configured columns
    pub fn get_data_transformer(&self) -> ColumnTransformer {
        let pre = &self.config.preprocessing;
        info!(numerical = ?pre.numeric_columns, "Numerical columns");
        info!(categorical = ?pre.categorical_columns, "Categorical columns");
        pre.build()
    }

    /// Read both splits, fit on train, transform both and save the transformer
    pub fn initiate_data_transformation(
        &self,
        train_path: impl AsRef<Path>,
        test_path: impl AsRef<Path>,
    ) -> Result<TransformationArtifacts> {
        self.transform_splits(train_path.as_ref(), test_path.as_ref())
            .in_stage(Stage::Transformation)
    }

    fn transform_splits(&self, train_path: &Path, test_path: &Path) -> Result<TransformationArtifacts> {
        self.check_target_not_a_feature()?;

        let train_df = self.loader.load_csv(train_path)?;
        let test_df = self.loader.load_csv(test_path)?;
        info!(
            train_rows = train_df.height(),
            test_rows = test_df.height(),
            "Read train and test data completed"
        );

        let target = &self.config.target_column;
        let train_target = target_values(&train_df, target)?;
        let test_target = target_values(&test_df, target)?;

        info!("Applying preprocessing object on training and testing dataframes");
        let mut preprocessor = self.get_data_transformer();
        let train_features = preprocessor.fit_transform(&train_df)?;
        let test_features = preprocessor.transform(&test_df)?;

        let train = append_target(train_features, &train_target)?;
        let test = append_target(test_features, &test_target)?;

        save_object(&preprocessor, &self.config.preprocessor_path)?;
        info!(
            path = %self.config.preprocessor_path.display(),
            width = train.ncols(),
            "Saved preprocessing object"
        );

        Ok(TransformationArtifacts {
            train,
            test,
            preprocessor_path: self.config.preprocessor_path.clone(),
        })
    }

    fn check_target_not_a_feature(&self) -> Result<()> {
        let pre = &self.config.preprocessing;
        let target = &self.config.target_column;
        if pre.numeric_columns.contains(target) || pre.categorical_columns.contains(target) {
            return Err(PipelineError::ConfigError(format!(
                "target column '{}' is also listed as a feature",
                target
            )));
        }
        Ok(())
    }
}

/// Target values; a missing target cell is a data error
pub fn target_values(df: &DataFrame, target: &str) -> Result<Array1<f64>> {
    let values = numeric_column(df, target)?;
    values
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.ok_or_else(|| {
                PipelineError::DataError(format!("missing target '{}' in row {}", target, row))
            })
        })
        .collect::<Result<Vec<f64>>>()
        .map(Array1::from)
}

/// Append `target` as the last column of `features`
pub fn append_target(features: Array2<f64>, target: &Array1<f64>) -> Result<Array2<f64>> {
    if features.nrows() != target.len() {
        return Err(PipelineError::ShapeError {
            expected: format!("{} target values", features.nrows()),
            actual: format!("{} target values", target.len()),
        });
    }
    let target_col = target.view().insert_axis(Axis(1));
    Ok(concatenate(Axis(1), &[features.view(), target_col])?)
}
