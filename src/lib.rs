//! Gym progress ML - weight progression model trainer
//!
//! This crate trains one regression model per exercise that predicts the
//! weight of a user's next session from their recent history:
//! - Workout history acquisition from PostgreSQL
//! - Lag, velocity and rolling-volume features per (user, exercise)
//! - Linear, ridge and histogram gradient boosting candidates
//! - Time-series cross-validated grid search and hold-out selection
//! - Checksummed model artifacts and a console summary
//!
//! # Modules
//!
//! - [`config`] - Environment-driven configuration
//! - [`data`] - Workout records and the history query
//! - [`timeseries`] - Progression features and time-series CV splits
//! - [`preprocessing`] - Feature standardization
//! - [`training`] - Models, pipelines, grid search and selection
//! - [`export`] - Model artifact serialization
//! - [`report`] - Summary lines

// Core error handling
pub mod error;
pub mod config;

// Data processing
pub mod data;
pub mod timeseries;
pub mod preprocessing;

// Core ML modules
pub mod training;

// Output
pub mod export;
pub mod report;

pub use error::{ProgressError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{ProgressError, Result};

    // Configuration
    pub use crate::config::{DatabaseConfig, JobConfig};

    // Data
    pub use crate::data::{fetch_workout_history, WorkoutRecord};

    // Time series
    pub use crate::timeseries::{engineer_features, split_by_exercise, ExerciseDataset, FeatureRow, TimeSeriesCV, FEATURE_NAMES};

    // Preprocessing
    pub use crate::preprocessing::StandardScaler;

    // Training
    pub use crate::training::{select_model, train_all, Algorithm, ExerciseResult, GridSearch, HyperParams, Model, Pipeline};

    // Export
    pub use crate::export::{artifact_file_name, load_model, save_exercise_model, ModelMetadata};

    // Reporting
    pub use crate::report::format_summary_line;
}
