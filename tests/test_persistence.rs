//! Integration test: model artifact persistence

use chrono::{Duration, NaiveDate};
use gym_progress_ml::data::WorkoutRecord;
use gym_progress_ml::export::{load_model, save_exercise_model, save_model, ModelMetadata};
use gym_progress_ml::timeseries::{engineer_features, split_by_exercise, FEATURE_NAMES};
use gym_progress_ml::training::{select_model, ExerciseResult, Model};
use gym_progress_ml::ProgressError;

fn trained(exercise: &str, sessions: usize) -> (ExerciseResult, ndarray::Array2<f64>) {
    let base = NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(6, 0, 0)
        .unwrap();
    let records: Vec<WorkoutRecord> = (0..sessions)
        .map(|i| WorkoutRecord {
            user_id: 11,
            exercise_name: exercise.to_string(),
            date: base + Duration::days(3 * i as i64),
            sets: 4.0,
            reps: if i % 2 == 0 { 6.0 } else { 8.0 },
            weight: 50.0 + 2.5 * i as f64 + if i % 3 == 0 { 1.0 } else { 0.0 },
        })
        .collect();

    let datasets = split_by_exercise(engineer_features(&records));
    let x = datasets[0].x().unwrap();
    let result = select_model(&datasets[0]).unwrap().unwrap();
    (result, x)
}

#[test]
fn test_save_and_load_exercise_model() {
    let dir = tempfile::tempdir().unwrap();
    let (result, x) = trained("Bench Press", 20);

    let file_name = save_exercise_model(&result, dir.path()).unwrap();
    assert_eq!(file_name, format!("bench_press_{}.pkl", result.algorithm.tag()));

    let path = dir.path().join(&file_name);
    assert!(path.exists());

    let (pipeline, metadata) = load_model(&path).unwrap();
    assert_eq!(metadata.exercise, "Bench Press");
    assert_eq!(metadata.algorithm, result.algorithm.tag());
    assert_eq!(metadata.feature_names, FEATURE_NAMES.to_vec());
    assert_eq!(metadata.holdout_rmse, result.holdout_rmse);
    assert_eq!(metadata.cv_rmse, result.cv_rmse);

    // Loaded pipeline predicts exactly like the original
    let original = result.pipeline.predict(&x).unwrap();
    let restored = pipeline.predict(&x).unwrap();
    assert_eq!(original, restored);
}

#[test]
fn test_save_model_to_explicit_path() {
    let dir = tempfile::tempdir().unwrap();
    let (result, x) = trained("Squat", 14);
    let path = dir.path().join("squat_custom.pkl");

    save_model(&result.pipeline, ModelMetadata::from_result(&result), &path).unwrap();
    let (pipeline, metadata) = load_model(&path).unwrap();

    assert_eq!(metadata.n_train, result.n_train);
    assert_eq!(metadata.n_holdout, result.n_holdout);
    assert_eq!(result.pipeline.predict(&x).unwrap(), pipeline.predict(&x).unwrap());
}

#[test]
fn test_corrupted_artifact_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (result, _) = trained("Row", 12);
    let file_name = save_exercise_model(&result, dir.path()).unwrap();
    let path = dir.path().join(file_name);

    let mut bytes = std::fs::read(&path).unwrap();
    let last = bytes.len() - 9;
    bytes[last] ^= 0xFF;
    std::fs::write(&path, bytes).unwrap();

    let err = load_model(&path).unwrap_err();
    assert!(matches!(err, ProgressError::SerializationError(_)));
}

#[test]
fn test_missing_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_model(dir.path().join("nope.pkl")).unwrap_err();
    assert!(matches!(err, ProgressError::IoError(_)));
}
