//! Time series cross-validation

use serde::{Deserialize, Serialize};

use crate::error::{ProgressError, Result};

/// Time series split for cross-validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeriesSplit {
    /// Training indices
    pub train_indices: Vec<usize>,
    /// Test indices
    pub test_indices: Vec<usize>,
    /// Fold number
    pub fold: usize,
}

/// Expanding-window time series cross-validator.
///
/// The samples are cut into `n_splits + 1` consecutive blocks of
/// `n_samples / (n_splits + 1)` rows; fold `k` validates on block `k + 1` and
/// trains on everything before it. The first block absorbs the remainder, so
/// the validation blocks end exactly at the last sample.
#[derive(Debug, Clone)]
pub struct TimeSeriesCV {
    /// Number of splits
    n_splits: usize,
}

impl TimeSeriesCV {
    /// Create new time series CV
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits: n_splits.max(2),
        }
    }

    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// Generate splits
    pub fn split(&self, n_samples: usize) -> Result<Vec<TimeSeriesSplit>> {
        let n_folds = self.n_splits + 1;
        if n_folds > n_samples {
            return Err(ProgressError::ValidationError(format!(
                "Cannot have number of folds ({}) greater than number of samples ({})",
                n_folds, n_samples
            )));
        }

        let test_size = n_samples / n_folds;
        let first_test_start = n_samples - self.n_splits * test_size;
        let splits = (0..self.n_splits)
            .map(|fold| {
                let test_start = first_test_start + fold * test_size;

                TimeSeriesSplit {
                    train_indices: (0..test_start).collect(),
                    test_indices: (test_start..test_start + test_size).collect(),
                    fold,
                }
            })
            .collect();

        Ok(splits)
    }
}
