//! Console summary of the selected models

use crate::training::ExerciseResult;

/// CV RMSE to two decimals, or `N/A` when no search ran.
pub fn format_cv(cv_rmse: Option<f64>) -> String {
    match cv_rmse {
        Some(value) => format!("{:.2}", value),
        None => "N/A".to_string(),
    }
}

/// One summary line for an exercise and its artifact file.
pub fn format_summary_line(result: &ExerciseResult, file_name: &str) -> String {
    format!(
        "{:15} | algo={:6} | CV RMSE={:>5} | Hold-out RMSE={:.2} lbs | file={}",
        result.exercise,
        result.algorithm.tag(),
        format_cv(result.cv_rmse),
        result.holdout_rmse,
        file_name
    )
}
