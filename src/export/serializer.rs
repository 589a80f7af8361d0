//! Binary object persistence
//!
//! Objects are encoded with `bincode` and wrapped in an envelope carrying
//! magic bytes, a format version, the save time and a checksum of the
//! payload. There is no schema migration: an object must be loaded by the
//! same type (and crate version) that saved it.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

use crate::error::{PipelineError, Result, Stage, StageContext};

/// On-disk envelope around a serialized object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedObject {
    /// Magic bytes for format detection
    pub magic: [u8; 4],
    /// Format version
    pub format_version: u32,
    /// Save timestamp (RFC 3339)
    pub saved_at: String,
    /// Encoded object
    pub payload: Vec<u8>,
    /// Checksum of `payload`
    pub checksum: u64,
}

impl SerializedObject {
    /// Magic bytes for pipeline artifact files
    pub const MAGIC: [u8; 4] = [b'S', b'P', b'A', b'F'];
    /// Current format version
    pub const VERSION: u32 = 1;

    /// Wrap an encoded payload
    pub fn new(payload: Vec<u8>) -> Self {
        let checksum = Self::compute_checksum(&payload);
        Self {
            magic: Self::MAGIC,
            format_version: Self::VERSION,
            saved_at: chrono::Utc::now().to_rfc3339(),
            payload,
            checksum,
        }
    }

    /// FNV-1a over the payload bytes
    fn compute_checksum(data: &[u8]) -> u64 {
        const FNV_OFFSET: u64 = 14695981039346656037;
        const FNV_PRIME: u64 = 1099511628211;

        data.iter().fold(FNV_OFFSET, |hash, byte| {
            (hash ^ *byte as u64).wrapping_mul(FNV_PRIME)
        })
    }

    /// Check magic, version and checksum
    pub fn verify(&self) -> Result<()> {
        if self.magic != Self::MAGIC {
            return Err(PipelineError::SerializationError(
                "not a pipeline artifact (bad magic bytes)".to_string(),
            ));
        }
        if self.format_version != Self::VERSION {
            return Err(PipelineError::SerializationError(format!(
                "unsupported artifact format version {}",
                self.format_version
            )));
        }
        if Self::compute_checksum(&self.payload) != self.checksum {
            return Err(PipelineError::SerializationError(
                "checksum verification failed - file may be corrupted".to_string(),
            ));
        }
        Ok(())
    }
}

/// Persist `obj` at `path`, creating the parent directory if needed
pub fn save_object<T: Serialize>(obj: &T, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    write_envelope(obj, path).in_stage(Stage::Serialization)?;
    info!(path = %path.display(), "Saved object");
    Ok(())
}

/// Load an object previously written by [`save_object`]
pub fn load_object<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    read_envelope(path.as_ref()).in_stage(Stage::Serialization)
}

fn write_envelope<T: Serialize>(obj: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let envelope = SerializedObject::new(bincode::serialize(obj)?);
    let mut writer = BufWriter::new(File::create(path)?);
    bincode::serialize_into(&mut writer, &envelope)?;
    writer.flush()?;
    Ok(())
}

fn read_envelope<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let reader = BufReader::new(File::open(path)?);
    let envelope: SerializedObject = bincode::deserialize_from(reader)?;
    envelope.verify()?;
    Ok(bincode::deserialize(&envelope.payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        weights: Vec<f64>,
        tags: BTreeMap<String, u32>,
    }

    fn sample() -> Sample {
        Sample {
            name: "scaler".to_string(),
            weights: vec![0.5, -1.25, 3.0],
            tags: BTreeMap::from([("a".to_string(), 1), ("b".to_string(), 2)]),
        }
    }

    #[test]
    fn test_save_creates_parent_dirs_and_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("obj.bin");

        save_object(&sample(), &path).unwrap();
        assert!(path.exists());

        let loaded: Sample = load_object(&path).unwrap();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn test_corrupted_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("obj.bin");
        save_object(&sample(), &path).unwrap();

        let mut bytes = fs::read(&path).unwrap();
        let last = bytes.len() - 9; // inside the payload, before the checksum
        bytes[last] ^= 0xFF;
        fs::write(&path, bytes).unwrap();

        let err = load_object::<Sample>(&path).unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Serialization));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_object::<Sample>(dir.path().join("absent.bin")).unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Serialization));
        assert!(matches!(err.root_cause(), PipelineError::IoError(_)));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_failed_flush_is_reported() {
        // writes to /dev/full fail with ENOSPC once the buffer is flushed
        let err = save_object(&sample(), "/dev/full").unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Serialization));
        assert!(matches!(err.root_cause(), PipelineError::IoError(_)));
    }

    #[test]
    fn test_checksum_is_stable() {
        let a = SerializedObject::new(vec![1, 2, 3]);
        let b = SerializedObject::new(vec![1, 2, 3]);
        assert_eq!(a.checksum, b.checksum);
        assert!(a.verify().is_ok());
    }
}
