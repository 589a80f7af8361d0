//! Seeded train/test splitting

use crate::error::{PipelineError, Result};
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Row indices of a train/test partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

/// Shuffle `0..n_samples` with a seeded RNG and cut off `ceil(test_size * n)`
/// test rows; the remaining rows form the train set.
pub fn split_indices(n_samples: usize, test_size: f64, random_state: u64) -> Result<SplitIndices> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(PipelineError::InvalidParameter {
            name: "test_size".to_string(),
            value: test_size.to_string(),
            reason: "must be in the open interval (0, 1)".to_string(),
        });
    }

    let n_test = (test_size * n_samples as f64).ceil() as usize;
    let n_train = n_samples.saturating_sub(n_test);
    if n_train == 0 || n_test == 0 {
        return Err(PipelineError::InvalidParameter {
            name: "test_size".to_string(),
            value: test_size.to_string(),
            reason: format!(
                "with {} samples the split leaves {} train and {} test rows",
                n_samples, n_train, n_test
            ),
        });
    }

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(random_state);
    indices.shuffle(&mut rng);

    let train_indices = indices.split_off(n_test);
    Ok(SplitIndices {
        train_indices,
        test_indices: indices,
    })
}

/// Split `df` into (train, test) frames
pub fn train_test_split(df: &DataFrame, test_size: f64, random_state: u64) -> Result<(DataFrame, DataFrame)> {
    let split = split_indices(df.height(), test_size, random_state)?;
    let train = take_rows(df, &split.train_indices)?;
    let test = take_rows(df, &split.test_indices)?;
    Ok((train, test))
}

fn take_rows(df: &DataFrame, indices: &[usize]) -> Result<DataFrame> {
    let idx: Vec<IdxSize> = indices.iter().map(|&i| i as IdxSize).collect();
    let idx = IdxCa::from_vec("idx".into(), idx);
    Ok(df.take(&idx)?)
}
