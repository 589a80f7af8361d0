//! Data preprocessing module
//!
//! Column-wise preprocessing for the student table:
//! - Missing value imputation (median, mean, most frequent, constant)
//! - Feature scaling (standard, min-max, max-abs)
//! - One-hot encoding of categorical columns
//! - Step pipelines and a column transformer that routes named column
//!   groups through their own pipeline and concatenates the results

mod config;
mod imputer;
mod scaler;
mod encoder;
mod pipeline;
mod column_transformer;

pub use config::{PreprocessingConfig, CATEGORICAL_COLUMNS, NUMERIC_COLUMNS};
pub use imputer::{Imputer, ImputeStrategy};
pub use scaler::{Scaler, ScalerType};
pub use encoder::{OneHotEncoder, UnknownCategoryPolicy};
pub use pipeline::{Pipeline, TransformStep};
pub use column_transformer::{ColumnGroup, ColumnTransformer};

use crate::error::{PipelineError, Result};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of raw column a group reads from the input table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

/// Intermediate data handed from one pipeline step to the next.
///
/// Raw blocks are column-major and keep missing values as `None`; the
/// dense block is the numeric matrix every pipeline must end with.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureBlock {
    Numeric(Vec<Vec<Option<f64>>>),
    Categorical(Vec<Vec<Option<String>>>),
    Dense(Array2<f64>),
}

impl FeatureBlock {
    /// Number of rows in the block
    pub fn n_rows(&self) -> usize {
        match self {
            FeatureBlock::Numeric(cols) => cols.first().map_or(0, |c| c.len()),
            FeatureBlock::Categorical(cols) => cols.first().map_or(0, |c| c.len()),
            FeatureBlock::Dense(arr) => arr.nrows(),
        }
    }

    /// Number of columns in the block
    pub fn n_cols(&self) -> usize {
        match self {
            FeatureBlock::Numeric(cols) => cols.len(),
            FeatureBlock::Categorical(cols) => cols.len(),
            FeatureBlock::Dense(arr) => arr.ncols(),
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            FeatureBlock::Numeric(_) => "numeric",
            FeatureBlock::Categorical(_) => "categorical",
            FeatureBlock::Dense(_) => "dense",
        }
    }

    /// Read the named columns of `df` into a raw block of the given kind
    pub fn from_frame(df: &DataFrame, columns: &[String], kind: ColumnKind) -> Result<Self> {
        match kind {
            ColumnKind::Numeric => columns
                .iter()
                .map(|name| numeric_column(df, name))
                .collect::<Result<Vec<_>>>()
                .map(FeatureBlock::Numeric),
            ColumnKind::Categorical => columns
                .iter()
                .map(|name| categorical_column(df, name))
                .collect::<Result<Vec<_>>>()
                .map(FeatureBlock::Categorical),
        }
    }

    /// Unwrap the dense matrix, failing if the pipeline stopped early
    pub fn into_dense(self) -> Result<Array2<f64>> {
        match self {
            FeatureBlock::Dense(arr) => Ok(arr),
            other => Err(PipelineError::PreprocessingError(format!(
                "pipeline produced a {} block, expected a dense numeric matrix",
                other.kind_name()
            ))),
        }
    }
}

/// Extract a column as `f64` values; nulls and NaN become `None`
pub fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .map_err(|_| PipelineError::FeatureNotFound(name.to_string()))?;
    let casted = column.cast(&DataType::Float64)?;
    let values = casted
        .as_materialized_series()
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect();
    Ok(values)
}

/// Extract a column as strings; nulls become `None`
pub fn categorical_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df
        .column(name)
        .map_err(|_| PipelineError::FeatureNotFound(name.to_string()))?;
    let casted = column.cast(&DataType::String)?;
    let values = casted
        .as_materialized_series()
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect();
    Ok(values)
}
