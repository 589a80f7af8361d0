//! Utility functions and types

pub mod data_loader;

pub use data_loader::{DataLoader, DataSaver};

use std::path::{Path, PathBuf};

/// `path`'s file name joined onto `dir`
pub fn rebase_path(dir: &Path, path: &Path) -> PathBuf {
    match path.file_name() {
        Some(name) => dir.join(name),
        None => dir.to_path_buf(),
    }
}
