//! Postgres reader for the workout history join

use chrono::NaiveDateTime;
use sqlx::postgres::PgPoolOptions;
use sqlx::FromRow;
use tracing::{debug, info};

use super::{sort_records, WorkoutRecord};
use crate::config::DatabaseConfig;
use crate::error::Result;

/// Join of every workout with its exercise entries, ordered for grouping.
///
/// Columns are cast so decoding does not depend on how the backend declared
/// them (BIGINT ids, NUMERIC or REAL weights, TIMESTAMP start times).
pub const WORKOUT_HISTORY_QUERY: &str = "\
    SELECT w.user_id::INT8            AS user_id, \
           e.exercise::TEXT           AS exercise_name, \
           w.start_time::TIMESTAMP    AS date, \
           e.sets::FLOAT8             AS sets, \
           e.reps::FLOAT8             AS reps, \
           e.weight::FLOAT8           AS weight \
      FROM workouts w \
      JOIN exercises e ON w.id = e.workout_id \
     ORDER BY w.user_id, e.exercise, w.start_time";

/// Raw row as returned by [`WORKOUT_HISTORY_QUERY`].
#[derive(Debug, Clone, FromRow)]
pub struct WorkoutRow {
    pub user_id: i64,
    pub exercise_name: String,
    pub date: NaiveDateTime,
    pub sets: Option<f64>,
    pub reps: Option<f64>,
    pub weight: Option<f64>,
}

/// Read the full workout history over a single connection.
pub async fn fetch_workout_history(config: &DatabaseConfig) -> Result<Vec<WorkoutRecord>> {
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect_with(config.connect_options())
        .await?;

    let rows = sqlx::query_as::<_, WorkoutRow>(WORKOUT_HISTORY_QUERY)
        .fetch_all(&pool)
        .await?;
    pool.close().await;

    info!(rows = rows.len(), host = %config.host, database = %config.database, "Fetched workout history");
    Ok(records_from_rows(rows))
}

/// Drop rows missing sets, reps or weight and order the rest by
/// (user, exercise, date).
pub fn records_from_rows(rows: Vec<WorkoutRow>) -> Vec<WorkoutRecord> {
    let total = rows.len();
    let mut records: Vec<WorkoutRecord> = rows
        .into_iter()
        .filter_map(|row| {
            Some(WorkoutRecord {
                sets: row.sets?,
                reps: row.reps?,
                weight: row.weight?,
                user_id: row.user_id,
                exercise_name: row.exercise_name,
                date: row.date,
            })
        })
        .collect();

    let dropped = total - records.len();
    if dropped > 0 {
        debug!(dropped, "Dropped workout rows with missing sets, reps or weight");
    }

    sort_records(&mut records);
    records
}
