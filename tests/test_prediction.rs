//! Integration test: predictions from persisted artifacts

mod common;

use polars::prelude::*;
use student_performance::inference::{PredictPipeline, StudentRecord};
use student_performance::pipeline::{PipelineConfig, TrainPipeline};
use student_performance::training::{split_features_target, Regressor};
use student_performance::transformation::DataTransformation;
use student_performance::utils::DataLoader;
use student_performance::{PipelineError, Stage};

/// Train once in a temp dir and hand back the config
fn trained(dir: &std::path::Path) -> PipelineConfig {
    let source = dir.join("stud.csv");
    common::write_student_csv(&source, 200);
    let cfg = PipelineConfig::new()
        .with_source_path(source)
        .with_artifacts_dir(dir.join("artifacts"));
    TrainPipeline::new(cfg.clone()).run().unwrap();
    cfg
}

fn load(cfg: &PipelineConfig) -> PredictPipeline {
    PredictPipeline::load(&cfg.transformation.preprocessor_path, &cfg.trainer.model_path).unwrap()
}

#[test]
fn test_predict_records() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = trained(dir.path());
    let pipeline = load(&cfg);

    let records = vec![
        StudentRecord::new("female", "group B", "bachelor's degree", "standard", "none")
            .with_reading_score(72.0)
            .with_writing_score(74.0),
        StudentRecord::new("male", "group C", "some college", "free/reduced", "completed")
            .with_reading_score(45.0)
            .with_writing_score(41.0),
    ];
    let predictions = pipeline.predict_records(&records).unwrap();

    assert_eq!(predictions.len(), 2);
    assert!(predictions.iter().all(|p| p.is_finite()));
    // higher reading/writing scores and a standard lunch
    assert!(predictions[0] > predictions[1]);
}

#[test]
fn test_missing_scores_and_unseen_category() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = load(&trained(dir.path()));

    let records = vec![
        StudentRecord::new("female", "group Z", "high school", "standard", "none"),
        StudentRecord::new("male", "group A", "doctorate", "standard", "none").with_reading_score(60.0),
    ];
    let predictions = pipeline.predict_records(&records).unwrap();

    assert_eq!(predictions.len(), 2);
    assert!(predictions.iter().all(|p| p.is_finite()));
}

#[test]
fn test_loaded_pipeline_matches_in_memory_model() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = trained(dir.path());
    let pipeline = load(&cfg);

    let test_df = DataLoader::new().load_csv(&cfg.ingestion.test_data_path).unwrap();
    let from_frame = pipeline.predict(&test_df).unwrap();

    let artifacts = DataTransformation::new(cfg.transformation.clone())
        .initiate_data_transformation(&cfg.ingestion.train_data_path, &cfg.ingestion.test_data_path)
        .unwrap();
    let (x_test, _) = split_features_target(&artifacts.test).unwrap();
    let in_memory = pipeline.model().predict(&x_test).unwrap();

    assert_eq!(from_frame.len(), test_df.height());
    for (a, b) in from_frame.iter().zip(in_memory.iter()) {
        assert!((a - b).abs() < 1e-9);
    }
}

#[test]
fn test_empty_input_gives_empty_output() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = load(&trained(dir.path()));

    let predictions = pipeline.predict_records(&[]).unwrap();
    assert!(predictions.is_empty());
}

#[test]
fn test_missing_artifact_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = PredictPipeline::load(dir.path().join("preprocessor.bin"), dir.path().join("model.bin"))
        .unwrap_err();

    assert!(err.stage().is_some());
    assert!(matches!(err.root_cause(), PipelineError::IoError(_)));
}

#[test]
fn test_frame_without_feature_column_reports_prediction_stage() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = load(&trained(dir.path()));

    let df = df!(
        "gender" => &["female"],
        "race_ethnicity" => &["group B"],
        "parental_level_of_education" => &["high school"],
        "lunch" => &["standard"],
        "reading_score" => &[70.0],
        "writing_score" => &[71.0],
    )
    .unwrap();
    let err = pipeline.predict(&df).unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Prediction));
    assert!(matches!(
        err.root_cause(),
        PipelineError::FeatureNotFound(name) if name == "test_preparation_course"
    ));
}
