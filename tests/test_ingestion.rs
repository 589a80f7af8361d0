//! Integration test: data ingestion (source → raw copy → train/test split)

mod common;

use polars::prelude::*;
use std::collections::HashSet;
use std::fs;
use student_performance::ingestion::{DataIngestion, IngestionConfig};
use student_performance::utils::DataLoader;
use student_performance::{PipelineError, Stage};

fn write_id_csv(path: &std::path::Path, n: usize) {
    let mut out = String::from("id,gender,math_score\n");
    for i in 0..n {
        out.push_str(&format!("{},{},{}\n", i, if i % 2 == 0 { "female" } else { "male" }, i % 100));
    }
    fs::write(path, out).unwrap();
}

fn ids(df: &DataFrame) -> Vec<i64> {
    df.column("id")
        .unwrap()
        .as_materialized_series()
        .i64()
        .unwrap()
        .into_no_null_iter()
        .collect()
}

#[test]
fn test_split_is_80_20_disjoint_and_complete() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("stud.csv");
    write_id_csv(&source, 1000);

    let config = IngestionConfig::new()
        .with_source_path(&source)
        .with_artifacts_dir(dir.path().join("artifacts"));
    let artifacts = DataIngestion::new(config).initiate_data_ingestion().unwrap();

    let loader = DataLoader::new();
    let raw = loader.load_csv(&artifacts.raw_data_path).unwrap();
    let train = loader.load_csv(&artifacts.train_data_path).unwrap();
    let test = loader.load_csv(&artifacts.test_data_path).unwrap();

    assert_eq!(raw.height(), 1000);
    assert_eq!(train.height(), 800);
    assert_eq!(test.height(), 200);
    assert_eq!(train.width(), 3);

    let train_ids: HashSet<i64> = ids(&train).into_iter().collect();
    let test_ids: HashSet<i64> = ids(&test).into_iter().collect();
    assert!(train_ids.is_disjoint(&test_ids));
    assert_eq!(train_ids.len() + test_ids.len(), 1000);
    assert_eq!(
        train_ids.union(&test_ids).copied().collect::<HashSet<_>>(),
        (0..1000).collect::<HashSet<i64>>()
    );
}

#[test]
fn test_split_rounds_test_size_up() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("stud.csv");
    write_id_csv(&source, 11);

    let config = IngestionConfig::new()
        .with_source_path(&source)
        .with_artifacts_dir(dir.path());
    let artifacts = DataIngestion::new(config).initiate_data_ingestion().unwrap();

    let loader = DataLoader::new();
    assert_eq!(loader.load_csv(&artifacts.train_data_path).unwrap().height(), 8);
    assert_eq!(loader.load_csv(&artifacts.test_data_path).unwrap().height(), 3);
}

#[test]
fn test_same_seed_same_split() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("stud.csv");
    common::write_student_csv(&source, 120);

    let run = |out: &str| {
        let config = IngestionConfig::new()
            .with_source_path(&source)
            .with_artifacts_dir(dir.path().join(out));
        DataIngestion::new(config).initiate_data_ingestion().unwrap()
    };
    let a = run("a");
    let b = run("b");

    assert_eq!(
        fs::read(&a.train_data_path).unwrap(),
        fs::read(&b.train_data_path).unwrap()
    );
    assert_eq!(
        fs::read(&a.test_data_path).unwrap(),
        fs::read(&b.test_data_path).unwrap()
    );

    let config = IngestionConfig::new()
        .with_source_path(&source)
        .with_random_state(7)
        .with_artifacts_dir(dir.path().join("c"));
    let c = DataIngestion::new(config).initiate_data_ingestion().unwrap();
    assert_ne!(
        fs::read(&a.test_data_path).unwrap(),
        fs::read(&c.test_data_path).unwrap()
    );
}

#[test]
fn test_missing_source_reports_ingestion_stage() {
    let dir = tempfile::tempdir().unwrap();
    let config = IngestionConfig::new()
        .with_source_path(dir.path().join("does_not_exist.csv"))
        .with_artifacts_dir(dir.path());

    let err = DataIngestion::new(config).initiate_data_ingestion().unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Ingestion));
    let location = err.location().unwrap();
    assert!(location.contains("ingestion"), "location was {}", location);
    assert!(matches!(err.root_cause(), PipelineError::IoError(_)));
    assert!(err.to_string().contains("does_not_exist.csv"));
    assert!(!dir.path().join("train.csv").exists());
}

#[test]
fn test_invalid_test_size_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("stud.csv");
    write_id_csv(&source, 10);

    let config = IngestionConfig::new()
        .with_source_path(&source)
        .with_test_size(1.0)
        .with_artifacts_dir(dir.path().join("out"));
    let err = DataIngestion::new(config).initiate_data_ingestion().unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Ingestion));
    assert!(matches!(err.root_cause(), PipelineError::InvalidParameter { .. }));
}
