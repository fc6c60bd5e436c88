//! Integration test: per-exercise model selection

use chrono::{Duration, NaiveDate};
use gym_progress_ml::data::WorkoutRecord;
use gym_progress_ml::export::artifact_file_name;
use gym_progress_ml::timeseries::{engineer_features, split_by_exercise, ExerciseDataset};
use gym_progress_ml::training::{
    evaluate_candidate, fold_count, holdout_split, select_model, should_grid_search, train_all,
    Algorithm, Model,
};
use ndarray::s;

fn linear_trend(exercise: &str, user_id: i64, sessions: usize, start: f64, step: f64) -> Vec<WorkoutRecord> {
    let base = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(7, 0, 0)
        .unwrap();
    (0..sessions)
        .map(|i| WorkoutRecord {
            user_id,
            exercise_name: exercise.to_string(),
            date: base + Duration::days(2 * i as i64),
            sets: 3.0,
            reps: 8.0,
            weight: start + step * i as f64,
        })
        .collect()
}

fn dataset(records: &[WorkoutRecord]) -> ExerciseDataset {
    let mut datasets = split_by_exercise(engineer_features(records));
    assert_eq!(datasets.len(), 1);
    datasets.remove(0)
}

#[test]
fn test_linear_trend_selects_linreg() {
    // 100, 102, ..., 118
    let data = dataset(&linear_trend("Bench Press", 1, 10, 100.0, 2.0));
    assert_eq!(data.len(), 7);

    let result = select_model(&data).unwrap().expect("enough rows to train");
    assert_eq!(result.n_train, 5);
    assert_eq!(result.n_holdout, 2);
    assert_eq!(result.algorithm, Algorithm::LinReg);
    assert!(result.holdout_rmse < 1e-3, "holdout RMSE {}", result.holdout_rmse);
    assert_eq!(result.cv_rmse, None);

    // The refitted pipeline predicts the next session
    let x = data.x().unwrap();
    let predictions = result.pipeline.predict(&x).unwrap();
    assert!((predictions[6] - 118.0).abs() < 1e-3);
}

#[test]
fn test_fold_count_bounds() {
    for n_train in 4..200 {
        let folds = fold_count(n_train);
        assert!((2..=5).contains(&folds));
        assert!(folds <= n_train / 2);
    }
    assert_eq!(fold_count(2), 2);
}

#[test]
fn test_grid_search_skipped_for_small_training_sets() {
    let ridge = Algorithm::Ridge.param_grid().len();
    let hgb = Algorithm::Hgb.param_grid().len();

    for n_train in 0..=ridge + 1 {
        assert!(!should_grid_search(n_train, ridge));
    }
    for n_train in 0..=hgb + 1 {
        assert!(!should_grid_search(n_train, hgb));
    }
    assert!(!should_grid_search(1_000, Algorithm::LinReg.param_grid().len()));
}

#[test]
fn test_cv_rmse_reported_only_after_search() {
    // 16 sessions -> 13 rows -> 10 training rows: ridge and hgb are searched
    let data = dataset(&linear_trend("Squat", 4, 16, 80.0, 2.5));
    let (n_train, _) = holdout_split(data.len());
    assert_eq!(n_train, 10);

    let x = data.x().unwrap();
    let y = data.y();
    let (x_train, x_holdout) = (x.slice(s![..n_train, ..]).to_owned(), x.slice(s![n_train.., ..]).to_owned());
    let (y_train, y_holdout) = (y.slice(s![..n_train]).to_owned(), y.slice(s![n_train..]).to_owned());

    let linreg = evaluate_candidate(Algorithm::LinReg, &x_train, &y_train, &x_holdout, &y_holdout).unwrap();
    assert!(linreg.cv_rmse.is_none());

    let ridge = evaluate_candidate(Algorithm::Ridge, &x_train, &y_train, &x_holdout, &y_holdout).unwrap();
    assert!(ridge.cv_rmse.is_some());

    // Defaults only below the threshold
    let (x_small, y_small) = (x_train.slice(s![..5, ..]).to_owned(), y_train.slice(s![..5]).to_owned());
    let ridge_small = evaluate_candidate(Algorithm::Ridge, &x_small, &y_small, &x_holdout, &y_holdout).unwrap();
    assert!(ridge_small.cv_rmse.is_none());
    assert_eq!(*ridge_small.pipeline.params(), Algorithm::Ridge.default_params());
}

#[test]
fn test_holdout_is_chronological_across_users() {
    let mut records = linear_trend("Deadlift", 1, 12, 100.0, 5.0);
    // Second user trains on odd days
    records.extend(linear_trend("Deadlift", 2, 12, 60.0, 2.5).into_iter().map(|mut r| {
        r.date = r.date + Duration::days(1);
        r
    }));

    let data = dataset(&records);
    let (n_train, n_holdout) = holdout_split(data.len());
    assert_eq!(n_train + n_holdout, data.len());

    let dates = data.dates();
    let last_train = dates[..n_train].iter().max().unwrap();
    let first_holdout = dates[n_train..].iter().min().unwrap();
    assert!(first_holdout >= last_train);

    let result = select_model(&data).unwrap().unwrap();
    assert_eq!(result.n_train, n_train);
    assert_eq!(result.n_holdout, n_holdout);
}

#[test]
fn test_tiny_exercise_is_skipped() {
    // 4 sessions -> 1 row, which the hold-out takes
    let data = dataset(&linear_trend("Curl", 1, 4, 10.0, 1.0));
    assert_eq!(data.len(), 1);
    assert_eq!(holdout_split(1), (0, 1));
    assert!(select_model(&data).unwrap().is_none());
}

#[test]
fn test_single_training_row_is_trained() {
    // 5 sessions -> 2 rows -> 1 training row, 1 hold-out row
    let data = dataset(&linear_trend("Lateral Raise", 3, 5, 8.0, 1.0));
    assert_eq!(data.len(), 2);

    let result = select_model(&data).unwrap().expect("one training row is enough");
    assert_eq!(result.n_train, 1);
    assert_eq!(result.n_holdout, 1);
    assert_eq!(result.cv_rmse, None);

    // Every candidate predicts the single training target, so the first one is kept
    assert_eq!(result.algorithm, Algorithm::LinReg);
    let y = data.y();
    assert!((result.holdout_rmse - (y[1] - y[0]).abs()).abs() < 1e-9);
}

#[test]
fn test_train_all_keeps_exercise_order() {
    let mut records = linear_trend("Overhead Press", 1, 10, 40.0, 1.0);
    records.extend(linear_trend("Curl", 1, 4, 10.0, 1.0));
    records.extend(linear_trend("Bench Press", 2, 10, 70.0, 2.5));

    let datasets = split_by_exercise(engineer_features(&records));
    let results = train_all(&datasets).unwrap();

    let names: Vec<&str> = results.iter().map(|r| r.exercise.as_str()).collect();
    let expected: Vec<&str> = datasets
        .iter()
        .filter(|d| d.exercise != "Curl")
        .map(|d| d.exercise.as_str())
        .collect();
    assert_eq!(names, expected);
}

#[test]
fn test_artifact_name() {
    assert_eq!(artifact_file_name("Bench Press", Algorithm::Hgb), "bench_press_hgb.pkl");
}
