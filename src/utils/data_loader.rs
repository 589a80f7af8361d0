//! CSV loading and saving

use crate::error::{PipelineError, Result};
use polars::prelude::*;
use std::fs::{self, File};
use std::path::Path;

/// CSV reader with a fixed schema-inference window
#[derive(Debug, Clone)]
pub struct DataLoader {
    /// Rows scanned to infer column types
    infer_schema_length: usize,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Create a new data loader
    pub fn new() -> Self {
        Self {
            infer_schema_length: 1000,
        }
    }

    /// Set the number of rows used for schema inference
    pub fn with_infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = rows;
        self
    }

    /// Load a CSV file with a header row; empty cells become nulls
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(PipelineError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("CSV file not found: {}", path.display()),
            )));
        }

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;
        Ok(df)
    }
}

/// Writes data frames to disk
pub struct DataSaver;

impl DataSaver {
    /// Save to CSV with a header and no index column, creating parent directories
    pub fn save_csv(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut file = File::create(path)?;
        CsvWriter::new(&mut file).include_header(true).finish(df)?;
        Ok(())
    }
}
