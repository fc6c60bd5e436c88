//! Workout history acquisition
//!
//! One fixed join of `workouts` and `exercises`, read into memory in a single
//! pass. The relational schema belongs to the gym-tracker backend; this crate
//! only reads it.

mod loader;

pub use loader::{fetch_workout_history, records_from_rows, WorkoutRow, WORKOUT_HISTORY_QUERY};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One exercise entry within a workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutRecord {
    pub user_id: i64,
    pub exercise_name: String,
    pub date: NaiveDateTime,
    pub sets: f64,
    pub reps: f64,
    pub weight: f64,
}

impl WorkoutRecord {
    /// Training volume of the entry: weight × reps × sets.
    pub fn total_volume(&self) -> f64 {
        self.weight * self.reps * self.sets
    }
}

/// Sort records by (user, exercise, date). The sort is stable, so entries
/// sharing a timestamp keep their query order.
pub fn sort_records(records: &mut [WorkoutRecord]) {
    records.sort_by(|a, b| {
        a.user_id
            .cmp(&b.user_id)
            .then_with(|| a.exercise_name.cmp(&b.exercise_name))
            .then_with(|| a.date.cmp(&b.date))
    });
}
