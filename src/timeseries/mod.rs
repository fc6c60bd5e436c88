//! Time series module
//!
//! Provides the per-group progression features and the chronological
//! cross-validation splitter used during hyperparameter search.

mod features;
mod validation;

pub use features::{
    engineer_features, split_by_exercise, ExerciseDataset, FeatureRecord, FeatureRow,
    ProgressionFeatureConfig, ProgressionFeatures, FEATURE_NAMES, TARGET_NAME,
};
pub use validation::{TimeSeriesCV, TimeSeriesSplit};
