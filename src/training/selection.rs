//! Per-exercise model selection
//!
//! Each exercise is split chronologically into training and hold-out rows.
//! Every candidate algorithm is tuned on the training rows (when there are
//! enough of them) and the one with the lowest hold-out RMSE is kept.

use ndarray::{s, Array1, Array2};
use tracing::{debug, info, warn};

use super::models::{rmse, Model};
use super::pipeline::{Algorithm, HyperParams, Pipeline};
use super::search::GridSearch;
use crate::error::{ProgressError, Result};
use crate::timeseries::{ExerciseDataset, TimeSeriesCV};

/// Share of each exercise's rows held out for final evaluation
pub const HOLDOUT_FRACTION: f64 = 0.2;

/// Bounds on the number of cross-validation folds
pub const MIN_FOLDS: usize = 2;
pub const MAX_FOLDS: usize = 5;

/// Best model found for one exercise
#[derive(Debug, Clone)]
pub struct ExerciseResult {
    pub exercise: String,
    pub algorithm: Algorithm,
    pub params: HyperParams,
    /// Mean validation RMSE, only known when a grid search ran
    pub cv_rmse: Option<f64>,
    pub holdout_rmse: f64,
    pub n_train: usize,
    pub n_holdout: usize,
    pub pipeline: Pipeline,
}

/// Evaluation of one candidate on the hold-out rows
#[derive(Debug, Clone)]
pub struct CandidateOutcome {
    pub pipeline: Pipeline,
    pub cv_rmse: Option<f64>,
    pub holdout_rmse: f64,
}

/// Sizes of the chronological (train, hold-out) split of `n` rows.
///
/// The hold-out gets `ceil(0.2 * n)` rows.
pub fn holdout_split(n: usize) -> (usize, usize) {
    let n_holdout = ((n as f64) * HOLDOUT_FRACTION).ceil() as usize;
    let n_holdout = n_holdout.min(n);
    (n - n_holdout, n_holdout)
}

/// Number of time-series folds for a training partition of `n_train` rows
pub fn fold_count(n_train: usize) -> usize {
    (n_train / 2).clamp(MIN_FOLDS, MAX_FOLDS)
}

/// Whether a grid of `combinations` entries is searched on `n_train` rows
pub fn should_grid_search(n_train: usize, combinations: usize) -> bool {
    combinations > 0 && n_train > combinations + 1
}

/// Tune (or fit with defaults) one candidate, then score it on the hold-out rows.
pub fn evaluate_candidate(
    algorithm: Algorithm,
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    x_holdout: &Array2<f64>,
    y_holdout: &Array1<f64>,
) -> Result<CandidateOutcome> {
    let n_train = x_train.nrows();
    let grid = algorithm.param_grid();

    let (pipeline, cv_rmse) = if should_grid_search(n_train, grid.len()) {
        let cv = TimeSeriesCV::new(fold_count(n_train));
        let result = GridSearch::new(grid, cv).fit(x_train, y_train)?;
        debug!(
            algorithm = %algorithm,
            params = ?result.best_params,
            cv_rmse = result.cv_rmse,
            "Grid search finished"
        );
        (result.pipeline, Some(result.cv_rmse))
    } else {
        debug!(algorithm = %algorithm, n_train, combinations = grid.len(), "Fitting defaults without search");
        let mut pipeline = Pipeline::new(algorithm.default_params());
        pipeline.fit(x_train, y_train)?;
        (pipeline, None)
    };

    let holdout_rmse = rmse(y_holdout, &pipeline.predict(x_holdout)?)?;

    Ok(CandidateOutcome {
        pipeline,
        cv_rmse,
        holdout_rmse,
    })
}

/// Select the best candidate for one exercise.
///
/// Returns `Ok(None)` when the hold-out takes every row, leaving nothing to
/// train on. A single training row is enough.
pub fn select_model(dataset: &ExerciseDataset) -> Result<Option<ExerciseResult>> {
    let (n_train, n_holdout) = holdout_split(dataset.len());
    if n_train == 0 {
        warn!(
            exercise = %dataset.exercise,
            rows = dataset.len(),
            "Skipping exercise with no rows left to train on"
        );
        return Ok(None);
    }

    let x = dataset.x()?;
    let y = dataset.y();
    let x_train = x.slice(s![..n_train, ..]).to_owned();
    let y_train = y.slice(s![..n_train]).to_owned();
    let x_holdout = x.slice(s![n_train.., ..]).to_owned();
    let y_holdout = y.slice(s![n_train..]).to_owned();

    let mut best: Option<(Algorithm, CandidateOutcome)> = None;
    for algorithm in Algorithm::ALL {
        let outcome = evaluate_candidate(algorithm, &x_train, &y_train, &x_holdout, &y_holdout)?;
        debug!(
            exercise = %dataset.exercise,
            algorithm = %algorithm,
            holdout_rmse = outcome.holdout_rmse,
            "Evaluated candidate"
        );

        let better = match &best {
            Some((_, current)) => outcome.holdout_rmse < current.holdout_rmse,
            None => true,
        };
        if better {
            best = Some((algorithm, outcome));
        }
    }

    let (algorithm, outcome) = best.ok_or_else(|| {
        ProgressError::TrainingError(format!("No candidate evaluated for {}", dataset.exercise))
    })?;

    info!(
        exercise = %dataset.exercise,
        algorithm = %algorithm,
        holdout_rmse = outcome.holdout_rmse,
        cv_rmse = ?outcome.cv_rmse,
        n_train,
        n_holdout,
        "Selected model"
    );

    Ok(Some(ExerciseResult {
        exercise: dataset.exercise.clone(),
        algorithm,
        params: *outcome.pipeline.params(),
        cv_rmse: outcome.cv_rmse,
        holdout_rmse: outcome.holdout_rmse,
        n_train,
        n_holdout,
        pipeline: outcome.pipeline,
    }))
}

/// Run selection for every exercise, in order. Stops at the first error.
pub fn train_all(datasets: &[ExerciseDataset]) -> Result<Vec<ExerciseResult>> {
    let mut results = Vec::with_capacity(datasets.len());
    for dataset in datasets {
        if let Some(result) = select_model(dataset)? {
            results.push(result);
        }
    }
    Ok(results)
}
