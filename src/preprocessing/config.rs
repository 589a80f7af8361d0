//! Preprocessing configuration

use serde::{Deserialize, Serialize};
use super::{
    ColumnGroup, ColumnKind, ColumnTransformer, ImputeStrategy, Imputer, OneHotEncoder, Pipeline,
    Scaler, ScalerType, TransformStep, UnknownCategoryPolicy,
};

/// Numeric feature columns of the student table
pub const NUMERIC_COLUMNS: [&str; 2] = ["writing_score", "reading_score"];

/// Categorical feature columns of the student table
pub const CATEGORICAL_COLUMNS: [&str; 5] = [
    "gender",
    "race_ethnicity",
    "parental_level_of_education",
    "lunch",
    "test_preparation_course",
];

/// Configuration for the column transformer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessingConfig {
    /// Columns routed through the numeric pipeline
    pub numeric_columns: Vec<String>,

    /// Columns routed through the categorical pipeline
    pub categorical_columns: Vec<String>,

    /// Strategy for handling missing numeric values
    pub numeric_impute_strategy: ImputeStrategy,

    /// Strategy for handling missing categorical values
    pub categorical_impute_strategy: ImputeStrategy,

    /// Scaler applied to numeric features
    pub scaler_type: ScalerType,

    /// Policy for categories that were not seen at fit time
    pub handle_unknown: UnknownCategoryPolicy,

    /// Whether one-hot output is scaled (without centering)
    pub scale_categorical: bool,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            numeric_columns: NUMERIC_COLUMNS.iter().map(|s| s.to_string()).collect(),
            categorical_columns: CATEGORICAL_COLUMNS.iter().map(|s| s.to_string()).collect(),
            numeric_impute_strategy: ImputeStrategy::Median,
            categorical_impute_strategy: ImputeStrategy::MostFrequent,
            scaler_type: ScalerType::Standard,
            handle_unknown: UnknownCategoryPolicy::Ignore,
            scale_categorical: true,
        }
    }
}

impl PreprocessingConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set numeric columns
    pub fn with_numeric_columns(mut self, columns: &[&str]) -> Self {
        self.numeric_columns = columns.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Builder method to set categorical columns
    pub fn with_categorical_columns(mut self, columns: &[&str]) -> Self {
        self.categorical_columns = columns.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Builder method to set numeric impute strategy
    pub fn with_numeric_impute(mut self, strategy: ImputeStrategy) -> Self {
        self.numeric_impute_strategy = strategy;
        self
    }

    /// Builder method to set categorical impute strategy
    pub fn with_categorical_impute(mut self, strategy: ImputeStrategy) -> Self {
        self.categorical_impute_strategy = strategy;
        self
    }

    /// Builder method to set scaler type
    pub fn with_scaler(mut self, scaler_type: ScalerType) -> Self {
        self.scaler_type = scaler_type;
        self
    }

    /// Builder method to set the unknown-category policy
    pub fn with_handle_unknown(mut self, policy: UnknownCategoryPolicy) -> Self {
        self.handle_unknown = policy;
        self
    }

    /// Build the unfitted column transformer.
    ///
    /// `num_pipeline`: imputer, scaler. `cat_pipeline`: imputer,
    /// one_hot_encoder, scaler (no centering). Empty groups are left out.
    pub fn build(&self) -> ColumnTransformer {
        let mut groups = Vec::with_capacity(2);

        if !self.numeric_columns.is_empty() {
            let pipeline = Pipeline::new()
                .with_step(
                    "imputer",
                    TransformStep::Impute(Imputer::new(self.numeric_impute_strategy.clone())),
                )
                .with_step(
                    "scaler",
                    TransformStep::Scale(Scaler::new(self.scaler_type.clone())),
                );
            groups.push(ColumnGroup::new(
                "num_pipeline",
                ColumnKind::Numeric,
                self.numeric_columns.clone(),
                pipeline,
            ));
        }

        if !self.categorical_columns.is_empty() {
            let mut pipeline = Pipeline::new()
                .with_step(
                    "imputer",
                    TransformStep::Impute(Imputer::new(self.categorical_impute_strategy.clone())),
                )
                .with_step(
                    "one_hot_encoder",
                    TransformStep::OneHot(
                        OneHotEncoder::new(self.handle_unknown)
                            .with_columns(self.categorical_columns.clone()),
                    ),
                );
            if self.scale_categorical {
                pipeline = pipeline.with_step(
                    "scaler",
                    TransformStep::Scale(Scaler::new(ScalerType::Standard).without_centering()),
                );
            }
            groups.push(ColumnGroup::new(
                "cat_pipeline",
                ColumnKind::Categorical,
                self.categorical_columns.clone(),
                pipeline,
            ));
        }

        ColumnTransformer::new(groups)
    }
}
