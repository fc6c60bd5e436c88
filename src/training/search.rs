//! Exhaustive hyperparameter search with time-series cross-validation

use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::models::{rmse, Model};
use super::pipeline::{HyperParams, Pipeline};
use crate::error::{ProgressError, Result};
use crate::timeseries::TimeSeriesCV;

/// Mean validation RMSE of one hyperparameter combination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateScore {
    pub params: HyperParams,
    pub fold_rmse: Vec<f64>,
    pub mean_rmse: f64,
}

/// Outcome of a search: the refitted winner and its CV score
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub pipeline: Pipeline,
    pub best_params: HyperParams,
    pub cv_rmse: f64,
    pub scores: Vec<CandidateScore>,
}

/// Grid search over pipeline hyperparameters
#[derive(Debug, Clone)]
pub struct GridSearch {
    grid: Vec<HyperParams>,
    cv: TimeSeriesCV,
}

impl GridSearch {
    pub fn new(grid: Vec<HyperParams>, cv: TimeSeriesCV) -> Self {
        Self { grid, cv }
    }

    /// Score every combination, then refit the best on all of `x`.
    ///
    /// The lowest mean fold RMSE wins; on ties the combination listed first
    /// is kept.
    pub fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<SearchResult> {
        if self.grid.is_empty() {
            return Err(ProgressError::ValidationError(
                "Grid search needs at least one combination".to_string(),
            ));
        }

        let splits = self.cv.split(x.nrows())?;

        let scores: Vec<CandidateScore> = self
            .grid
            .par_iter()
            .map(|params| -> Result<CandidateScore> {
                let fold_rmse = splits
                    .iter()
                    .map(|split| {
                        let x_train = x.select(Axis(0), &split.train_indices);
                        let y_train = y.select(Axis(0), &split.train_indices);
                        let x_val = x.select(Axis(0), &split.test_indices);
                        let y_val = y.select(Axis(0), &split.test_indices);

                        let mut pipeline = Pipeline::new(*params);
                        pipeline.fit(&x_train, &y_train)?;
                        rmse(&y_val, &pipeline.predict(&x_val)?)
                    })
                    .collect::<Result<Vec<f64>>>()?;

                let mean_rmse = fold_rmse.iter().sum::<f64>() / fold_rmse.len() as f64;
                debug!(?params, mean_rmse, folds = fold_rmse.len(), "Scored grid combination");

                Ok(CandidateScore {
                    params: *params,
                    fold_rmse,
                    mean_rmse,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let best = scores
            .iter()
            .fold(None::<&CandidateScore>, |best, candidate| match best {
                Some(b) if b.mean_rmse <= candidate.mean_rmse || candidate.mean_rmse.is_nan() => Some(b),
                _ => Some(candidate),
            })
            .ok_or_else(|| ProgressError::ComputationError("No grid combination scored".to_string()))?;

        let best_params = best.params;
        let cv_rmse = best.mean_rmse;

        let mut pipeline = Pipeline::new(best_params);
        pipeline.fit(x, y)?;

        Ok(SearchResult {
            pipeline,
            best_params,
            cv_rmse,
            scores,
        })
    }
}
