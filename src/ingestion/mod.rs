//! Data ingestion
//!
//! Reads the source table, keeps a raw copy and writes a seeded
//! train/test split next to it.

mod split;

pub use split::{split_indices, train_test_split, SplitIndices};

use crate::error::{Result, Stage, StageContext};
use crate::utils::{rebase_path, DataLoader, DataSaver};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Paths and split parameters for the ingestion stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// Source CSV
    pub source_path: PathBuf,
    /// Copy of the full source table
    pub raw_data_path: PathBuf,
    pub train_data_path: PathBuf,
    pub test_data_path: PathBuf,
    /// Fraction of rows held out for testing
    pub test_size: f64,
    /// Seed for the shuffle
    pub random_state: u64,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            source_path: PathBuf::from("notebook/data/stud.csv"),
            raw_data_path: PathBuf::from("artifacts/data.csv"),
            train_data_path: PathBuf::from("artifacts/train.csv"),
            test_data_path: PathBuf::from("artifacts/test.csv"),
            test_size: 0.2,
            random_state: 42,
        }
    }
}

impl IngestionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_path = path.into();
        self
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Place the three output files under `dir`, keeping their file names
    pub fn with_artifacts_dir(mut self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        self.raw_data_path = rebase_path(dir, &self.raw_data_path);
        self.train_data_path = rebase_path(dir, &self.train_data_path);
        self.test_data_path = rebase_path(dir, &self.test_data_path);
        self
    }
}

/// Files written by [`DataIngestion::initiate_data_ingestion`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionArtifacts {
    pub raw_data_path: PathBuf,
    pub train_data_path: PathBuf,
    pub test_data_path: PathBuf,
}

/// Ingestion stage
#[derive(Debug, Clone, Default)]
pub struct DataIngestion {
    config: IngestionConfig,
    loader: DataLoader,
}

impl DataIngestion {
    pub fn new(config: IngestionConfig) -> Self {
        Self {
            config,
            loader: DataLoader::new(),
        }
    }

    pub fn config(&self) -> &IngestionConfig {
        &self.config
    }

    /// Read the source CSV, write the raw copy and the train/test split
    pub fn initiate_data_ingestion(&self) -> Result<IngestionArtifacts> {
        info!(source = %self.config.source_path.display(), "Entered the data ingestion stage");
        self.ingest().in_stage(Stage::Ingestion)
    }

    fn ingest(&self) -> Result<IngestionArtifacts> {
        let cfg = &self.config;

        let mut df = self.loader.load_csv(&cfg.source_path)?;
        info!(rows = df.height(), columns = df.width(), "Read the dataset");

        DataSaver::save_csv(&mut df, &cfg.raw_data_path)?;

        let (mut train, mut test) = train_test_split(&df, cfg.test_size, cfg.random_state)?;
        info!(
            train_rows = train.height(),
            test_rows = test.height(),
            seed = cfg.random_state,
            "Train test split initiated"
        );

        DataSaver::save_csv(&mut train, &cfg.train_data_path)?;
        DataSaver::save_csv(&mut test, &cfg.test_data_path)?;

        info!("Ingestion of the data is completed");
        Ok(IngestionArtifacts {
            raw_data_path: cfg.raw_data_path.clone(),
            train_data_path: cfg.train_data_path.clone(),
            test_data_path: cfg.test_data_path.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use std::fs;

    #[test]
    fn test_default_paths() {
        let cfg = IngestionConfig::default();
        assert_eq!(cfg.source_path, PathBuf::from("notebook/data/stud.csv"));
        assert_eq!(cfg.train_data_path, PathBuf::from("artifacts/train.csv"));
        assert!((cfg.test_size - 0.2).abs() < 1e-12);
        assert_eq!(cfg.random_state, 42);
    }

    #[test]
    fn test_with_artifacts_dir_keeps_file_names() {
        let cfg = IngestionConfig::default().with_artifacts_dir("/tmp/run1");
        assert_eq!(cfg.raw_data_path, PathBuf::from("/tmp/run1/data.csv"));
        assert_eq!(cfg.test_data_path, PathBuf::from("/tmp/run1/test.csv"));
        assert_eq!(cfg.source_path, PathBuf::from("notebook/data/stud.csv"));
    }

    #[test]
    fn test_ingestion_writes_three_files() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("stud.csv");
        let mut rows = String::from("gender,math_score\n");
        for i in 0..20 {
            rows.push_str(&format!("{},{}\n", if i % 2 == 0 { "female" } else { "male" }, 50 + i));
        }
        fs::write(&source, rows).unwrap();

        let cfg = IngestionConfig::new()
            .with_source_path(&source)
            .with_artifacts_dir(dir.path().join("artifacts"));
        let artifacts = DataIngestion::new(cfg).initiate_data_ingestion().unwrap();

        let loader = DataLoader::new();
        assert_eq!(loader.load_csv(&artifacts.raw_data_path).unwrap().height(), 20);
        assert_eq!(loader.load_csv(&artifacts.train_data_path).unwrap().height(), 16);
        assert_eq!(loader.load_csv(&artifacts.test_data_path).unwrap().height(), 4);
    }

    #[test]
    fn test_missing_source_is_wrapped() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = IngestionConfig::new()
            .with_source_path(dir.path().join("nope.csv"))
            .with_artifacts_dir(dir.path());
        let err = DataIngestion::new(cfg).initiate_data_ingestion().unwrap_err();

        assert_eq!(err.stage(), Some(Stage::Ingestion));
        assert!(matches!(err.root_cause(), PipelineError::IoError(_)));
    }
}
