//! Gym progress ML - batch trainer entry point
//!
//! Reads the workout history, selects one model per exercise, writes the
//! artifacts and prints a summary line per exercise.

use anyhow::Context;
use tracing::{info, warn};

use gym_progress_ml::config::JobConfig;
use gym_progress_ml::data::fetch_workout_history;
use gym_progress_ml::export::save_exercise_model;
use gym_progress_ml::report::format_summary_line;
use gym_progress_ml::timeseries::{engineer_features, split_by_exercise};
use gym_progress_ml::training::select_model;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the variables may come from the environment
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gym_progress_ml=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = JobConfig::from_env().context("Failed to load configuration")?;
    info!(database = ?config.database, output_dir = %config.output_dir.display(), "Starting training run");

    let records = fetch_workout_history(&config.database)
        .await
        .context("Failed to fetch workout history")?;

    let rows = engineer_features(&records);
    let datasets = split_by_exercise(rows);
    if datasets.is_empty() {
        warn!(records = records.len(), "No exercise has enough history to train on");
    }

    let mut summary = Vec::with_capacity(datasets.len());
    for dataset in &datasets {
        let Some(result) = select_model(dataset)
            .with_context(|| format!("Model selection failed for {}", dataset.exercise))?
        else {
            continue;
        };

        let file_name = save_exercise_model(&result, &config.output_dir)
            .with_context(|| format!("Failed to save model for {}", result.exercise))?;
        summary.push(format_summary_line(&result, &file_name));
    }

    for line in &summary {
        println!("{}", line);
    }

    info!(models = summary.len(), "Training run complete");
    Ok(())
}
