//! Model artifact serialization
//!
//! Artifacts are a bincode encoded [`SerializedModel`] envelope
//! holding the metadata and the bincode-encoded pipeline, guarded by magic
//! bytes and an FNV-1a checksum.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ProgressError, Result};
use crate::timeseries::{FEATURE_NAMES, TARGET_NAME};
use crate::training::{Algorithm, ExerciseResult, Pipeline};

/// Lowercase the exercise name and replace spaces with underscores.
pub fn sanitize_exercise_name(exercise: &str) -> String {
    exercise.to_lowercase().replace(' ', "_")
}

/// Artifact file name, e.g. `bench_press_hgb.pkl`.
pub fn artifact_file_name(exercise: &str, algorithm: Algorithm) -> String {
    format!("{}_{}.pkl", sanitize_exercise_name(exercise), algorithm.tag())
}

/// Model metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Exercise the model predicts
    pub exercise: String,
    /// Algorithm tag
    pub algorithm: String,
    /// Training timestamp (RFC 3339)
    pub trained_at: String,
    /// Input column order
    pub feature_names: Vec<String>,
    pub target_name: String,
    /// Selected hyperparameters
    pub hyperparameters: BTreeMap<String, String>,
    pub cv_rmse: Option<f64>,
    pub holdout_rmse: f64,
    pub n_train: usize,
    pub n_holdout: usize,
}

impl ModelMetadata {
    /// Create metadata for a freshly selected model
    pub fn from_result(result: &ExerciseResult) -> Self {
        Self {
            exercise: result.exercise.clone(),
            algorithm: result.algorithm.tag().to_string(),
            trained_at: Utc::now().to_rfc3339(),
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            target_name: TARGET_NAME.to_string(),
            hyperparameters: result.params.to_pairs().into_iter().collect(),
            cv_rmse: result.cv_rmse,
            holdout_rmse: result.holdout_rmse,
            n_train: result.n_train,
            n_holdout: result.n_holdout,
        }
    }
}

/// Serializable model wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedModel {
    /// Magic bytes for format detection
    pub magic: [u8; 4],
    /// Format version
    pub format_version: u32,
    pub metadata: ModelMetadata,
    /// Bincode-encoded pipeline
    pub model_data: Vec<u8>,
    /// Checksum for integrity verification
    pub checksum: u64,
}

impl SerializedModel {
    /// Magic bytes for progression model files
    pub const MAGIC: [u8; 4] = *b"GPML";
    /// Current format version
    pub const VERSION: u32 = 1;

    pub fn new(metadata: ModelMetadata, model_data: Vec<u8>) -> Self {
        let checksum = Self::compute_checksum(&model_data);
        Self {
            magic: Self::MAGIC,
            format_version: Self::VERSION,
            metadata,
            model_data,
            checksum,
        }
    }

    /// FNV-1a hash
    fn compute_checksum(data: &[u8]) -> u64 {
        const FNV_OFFSET: u64 = 14695981039346656037;
        const FNV_PRIME: u64 = 1099511628211;

        data.iter().fold(FNV_OFFSET, |hash, byte| {
            (hash ^ *byte as u64).wrapping_mul(FNV_PRIME)
        })
    }

    pub fn verify_checksum(&self) -> bool {
        Self::compute_checksum(&self.model_data) == self.checksum
    }

    /// Check magic, version and checksum, then decode the pipeline.
    pub fn into_pipeline(self) -> Result<(Pipeline, ModelMetadata)> {
        if self.magic != Self::MAGIC {
            return Err(ProgressError::SerializationError(
                "Not a progression model artifact".to_string(),
            ));
        }
        if self.format_version > Self::VERSION {
            return Err(ProgressError::SerializationError(format!(
                "Unsupported artifact version {}",
                self.format_version
            )));
        }
        if !self.verify_checksum() {
            return Err(ProgressError::SerializationError(
                "Checksum verification failed - file may be corrupted".to_string(),
            ));
        }

        let pipeline: Pipeline = bincode::deserialize(&self.model_data)?;
        Ok((pipeline, self.metadata))
    }
}

/// Write a pipeline artifact to `path`.
pub fn save_model(
    pipeline: &Pipeline,
    metadata: ModelMetadata,
    path: impl AsRef<Path>,
) -> Result<()> {
    let model_data = bincode::serialize(pipeline)?;
    let serialized = SerializedModel::new(metadata, model_data);

    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);

    bincode::serialize_into(&mut writer, &serialized)?;
    writer.flush()?;

    Ok(())
}

/// Read a pipeline artifact written by [`save_model`].
pub fn load_model(path: impl AsRef<Path>) -> Result<(Pipeline, ModelMetadata)> {
    let bytes = std::fs::read(path.as_ref())?;
    let serialized: SerializedModel = bincode::deserialize(&bytes)?;
    serialized.into_pipeline()
}

/// Save the winning pipeline of an exercise under `output_dir`, returning the
/// artifact file name.
pub fn save_exercise_model(result: &ExerciseResult, output_dir: impl AsRef<Path>) -> Result<String> {
    let file_name = artifact_file_name(&result.exercise, result.algorithm);
    let path: PathBuf = output_dir.as_ref().join(&file_name);

    save_model(&result.pipeline, ModelMetadata::from_result(result), &path)?;

    info!(exercise = %result.exercise, path = %path.display(), "Saved model artifact");
    Ok(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> ModelMetadata {
        ModelMetadata {
            exercise: "Squat".to_string(),
            algorithm: "ridge".to_string(),
            trained_at: String::new(),
            feature_names: Vec::new(),
            target_name: TARGET_NAME.to_string(),
            hyperparameters: BTreeMap::new(),
            cv_rmse: None,
            holdout_rmse: 1.5,
            n_train: 8,
            n_holdout: 2,
        }
    }

    #[test]
    fn test_artifact_file_name() {
        assert_eq!(artifact_file_name("Bench Press", Algorithm::Hgb), "bench_press_hgb.pkl");
        assert_eq!(artifact_file_name("Squat", Algorithm::LinReg), "squat_linreg.pkl");
        assert_eq!(sanitize_exercise_name("Romanian Dead Lift"), "romanian_dead_lift");
    }

    #[test]
    fn test_serialized_model_checksum() {
        let serialized = SerializedModel::new(metadata(), vec![1, 2, 3, 4, 5]);
        assert!(serialized.verify_checksum());
        assert_eq!(serialized.magic, *b"GPML");
    }

    #[test]
    fn test_serialized_model_checksum_failure() {
        let mut serialized = SerializedModel::new(metadata(), vec![1, 2, 3, 4, 5]);

        // Corrupt the data
        serialized.model_data[0] = 99;

        assert!(!serialized.verify_checksum());
        assert!(serialized.into_pipeline().is_err());
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut serialized = SerializedModel::new(metadata(), Vec::new());
        serialized.magic = *b"KOLM";
        let err = serialized.into_pipeline().unwrap_err();
        assert!(matches!(err, ProgressError::SerializationError(_)));
    }

    #[test]
    fn test_fnv1a_known_value() {
        // FNV-1a 64 of "a"
        assert_eq!(SerializedModel::compute_checksum(b"a"), 0xaf63dc4c8601ec8c);
        assert_eq!(SerializedModel::compute_checksum(b""), 14695981039346656037);
    }
}
