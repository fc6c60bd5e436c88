//! Progression feature engineering
//!
//! Features are computed independently inside each (user, exercise) group of
//! chronologically ordered workout records:
//! - rolling mean of training volume
//! - day gap to the previous session
//! - lag-1 and lag-2 weights and the velocity between sessions
//! - the next session's weight as the regression target

use std::collections::HashMap;

use chrono::NaiveDateTime;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::{sort_records, WorkoutRecord};
use crate::error::{ProgressError, Result};

/// Column order of the model input matrix.
pub const FEATURE_NAMES: [&str; 8] = [
    "lag1_w",
    "lag2_w",
    "velocity",
    "rolling_vol",
    "days_since",
    "sets",
    "reps",
    "weight",
];

/// Name of the regression target.
pub const TARGET_NAME: &str = "target";

/// Configuration for the rolling volume statistic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressionFeatureConfig {
    /// Trailing window for the volume mean
    pub rolling_window: usize,
    /// Minimum observations inside the window
    pub min_periods: usize,
}

impl Default for ProgressionFeatureConfig {
    fn default() -> Self {
        Self {
            rolling_window: 3,
            min_periods: 1,
        }
    }
}

/// Every derived column for one record, before incomplete rows are dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub record: WorkoutRecord,
    pub total_volume: f64,
    pub rolling_vol: Option<f64>,
    pub days_since: f64,
    pub lag1_w: Option<f64>,
    pub lag2_w: Option<f64>,
    pub velocity: Option<f64>,
    pub target: Option<f64>,
}

impl FeatureRecord {
    /// Convert into a supervised row when every feature and the target exist.
    pub fn complete(&self) -> Option<FeatureRow> {
        Some(FeatureRow {
            user_id: self.record.user_id,
            exercise_name: self.record.exercise_name.clone(),
            date: self.record.date,
            sets: self.record.sets,
            reps: self.record.reps,
            weight: self.record.weight,
            total_volume: self.total_volume,
            rolling_vol: self.rolling_vol?,
            days_since: self.days_since,
            lag1_w: self.lag1_w?,
            lag2_w: self.lag2_w?,
            velocity: self.velocity?,
            target: self.target?,
        })
    }
}

/// One supervised-learning observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub user_id: i64,
    pub exercise_name: String,
    pub date: NaiveDateTime,
    pub sets: f64,
    pub reps: f64,
    pub weight: f64,
    pub total_volume: f64,
    pub rolling_vol: f64,
    pub days_since: f64,
    pub lag1_w: f64,
    pub lag2_w: f64,
    pub velocity: f64,
    pub target: f64,
}

impl FeatureRow {
    /// Model inputs in [`FEATURE_NAMES`] order.
    pub fn features(&self) -> [f64; 8] {
        [
            self.lag1_w,
            self.lag2_w,
            self.velocity,
            self.rolling_vol,
            self.days_since,
            self.sets,
            self.reps,
            self.weight,
        ]
    }
}

/// Progression feature generator
#[derive(Debug, Clone, Default)]
pub struct ProgressionFeatures {
    config: ProgressionFeatureConfig,
}

impl ProgressionFeatures {
    pub fn new(config: ProgressionFeatureConfig) -> Self {
        Self { config }
    }

    /// Compute every derived column, keeping rows with missing values.
    ///
    /// Records are sorted by (user, exercise, date) first; the output follows
    /// that order.
    pub fn compute(&self, records: &[WorkoutRecord]) -> Vec<FeatureRecord> {
        let mut sorted = records.to_vec();
        sort_records(&mut sorted);

        let mut out = Vec::with_capacity(sorted.len());
        let mut start = 0;
        while start < sorted.len() {
            let mut end = start + 1;
            while end < sorted.len()
                && sorted[end].user_id == sorted[start].user_id
                && sorted[end].exercise_name == sorted[start].exercise_name
            {
                end += 1;
            }
            out.extend(self.compute_group(&sorted[start..end]));
            start = end;
        }
        out
    }

    /// Compute features and drop rows with insufficient history or no
    /// following session.
    pub fn transform(&self, records: &[WorkoutRecord]) -> Vec<FeatureRow> {
        let computed = self.compute(records);
        let total = computed.len();
        let rows: Vec<FeatureRow> = computed.iter().filter_map(FeatureRecord::complete).collect();
        debug!(total, kept = rows.len(), dropped = total - rows.len(), "Engineered progression features");
        rows
    }

    fn compute_group(&self, group: &[WorkoutRecord]) -> Vec<FeatureRecord> {
        let weights: Vec<f64> = group.iter().map(|r| r.weight).collect();
        let volumes: Vec<f64> = group.iter().map(WorkoutRecord::total_volume).collect();
        let dates: Vec<NaiveDateTime> = group.iter().map(|r| r.date).collect();

        let rolling = rolling_mean(&volumes, self.config.rolling_window, self.config.min_periods);
        let gaps = day_gaps(&dates);
        let lag1 = shift(&weights, 1);
        let lag2 = shift(&weights, 2);
        let target = lead(&weights, 1);

        group
            .iter()
            .enumerate()
            .map(|(i, record)| FeatureRecord {
                record: record.clone(),
                total_volume: volumes[i],
                rolling_vol: rolling[i],
                days_since: gaps[i],
                lag1_w: lag1[i],
                lag2_w: lag2[i],
                velocity: lag1[i].map(|prev| weights[i] - prev),
                target: target[i],
            })
            .collect()
    }
}

/// Engineer features with the default configuration.
pub fn engineer_features(records: &[WorkoutRecord]) -> Vec<FeatureRow> {
    ProgressionFeatures::default().transform(records)
}

/// Value `lag` positions earlier, `None` where no such position exists.
fn shift(series: &[f64], lag: usize) -> Vec<Option<f64>> {
    (0..series.len())
        .map(|i| i.checked_sub(lag).map(|j| series[j]))
        .collect()
}

/// Value `lead` positions later.
fn lead(series: &[f64], lead: usize) -> Vec<Option<f64>> {
    (0..series.len())
        .map(|i| series.get(i + lead).copied())
        .collect()
}

/// Trailing mean over up to `window` values, `None` below `min_periods`.
fn rolling_mean(series: &[f64], window: usize, min_periods: usize) -> Vec<Option<f64>> {
    let window = window.max(1);
    (0..series.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let values = &series[start..=i];
            if values.len() >= min_periods {
                Some(values.iter().sum::<f64>() / values.len() as f64)
            } else {
                None
            }
        })
        .collect()
}

/// Whole days since the previous timestamp; the first gap is 0.
fn day_gaps(dates: &[NaiveDateTime]) -> Vec<f64> {
    let mut gaps = Vec::with_capacity(dates.len());
    for i in 0..dates.len() {
        if i == 0 {
            gaps.push(0.0);
        } else {
            let delta = dates[i] - dates[i - 1];
            gaps.push(delta.num_seconds().div_euclid(86_400) as f64);
        }
    }
    gaps
}

/// All supervised rows of one exercise, in chronological order.
#[derive(Debug, Clone)]
pub struct ExerciseDataset {
    pub exercise: String,
    pub rows: Vec<FeatureRow>,
}

impl ExerciseDataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Feature matrix, one row per observation.
    pub fn x(&self) -> Result<Array2<f64>> {
        let data: Vec<f64> = self.rows.iter().flat_map(|row| row.features()).collect();
        Array2::from_shape_vec((self.rows.len(), FEATURE_NAMES.len()), data).map_err(|e| {
            ProgressError::DataError(format!("Failed to build feature matrix: {}", e))
        })
    }

    /// Next-session weights.
    pub fn y(&self) -> Array1<f64> {
        self.rows.iter().map(|row| row.target).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDateTime> {
        self.rows.iter().map(|row| row.date).collect()
    }
}

/// Partition rows by exercise name, in order of first appearance.
///
/// Within an exercise, rows from every user are interleaved by date (ties by
/// user id), so the tail of each dataset is its most recent data.
pub fn split_by_exercise(rows: Vec<FeatureRow>) -> Vec<ExerciseDataset> {
    let mut order: Vec<String> = Vec::new();
    let mut buckets: HashMap<String, Vec<FeatureRow>> = HashMap::new();

    for row in rows {
        if !buckets.contains_key(&row.exercise_name) {
            order.push(row.exercise_name.clone());
        }
        buckets.entry(row.exercise_name.clone()).or_default().push(row);
    }

    order
        .into_iter()
        .map(|exercise| {
            let mut rows = buckets.remove(&exercise).unwrap_or_default();
            rows.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.user_id.cmp(&b.user_id)));
            ExerciseDataset { exercise, rows }
        })
        .collect()
}
