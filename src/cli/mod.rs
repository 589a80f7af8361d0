//! Command-line interface for the training pipeline and predictions.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::inference::{PredictPipeline, StudentRecord};
use crate::ingestion::DataIngestion;
use crate::pipeline::{PipelineConfig, TrainPipeline};
use crate::training::{ModelTrainer, TrainingReport};
use crate::transformation::DataTransformation;

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├─────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "student-performance")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train and serve a math-score regressor for student records")]
#[command(long_about = None)]
pub struct Cli {
    /// JSON pipeline configuration
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory for every artifact (overrides the configured paths)
    #[arg(long, global = true)]
    pub artifacts_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Copy the source table and write the train/test split
    Ingest {
        /// Source CSV
        #[arg(short, long)]
        source: Option<PathBuf>,
    },

    /// Fit the preprocessor on the train split and save it
    Transform,

    /// Transform the existing splits and select the best model
    Train,

    /// Run ingestion, transformation and training (default)
    Run {
        /// Source CSV
        #[arg(short, long)]
        source: Option<PathBuf>,
    },

    /// Predict the math score of one student
    Predict {
        #[arg(long)]
        gender: String,

        #[arg(long)]
        race_ethnicity: String,

        #[arg(long)]
        parental_level_of_education: String,

        #[arg(long)]
        lunch: String,

        #[arg(long)]
        test_preparation_course: String,

        #[arg(long)]
        reading_score: Option<f64>,

        #[arg(long)]
        writing_score: Option<f64>,
    },
}

/// Configuration from `--config` (or defaults), rebased by `--artifacts-dir`
pub fn load_config(config: Option<&Path>, artifacts_dir: Option<&Path>) -> anyhow::Result<PipelineConfig> {
    let mut cfg = match config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(dir) = artifacts_dir {
        cfg = cfg.with_artifacts_dir(dir);
    }
    Ok(cfg)
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_ingest(cfg: &PipelineConfig) -> anyhow::Result<()> {
    section("Ingest");

    step_run(&format!("Splitting {}", cfg.ingestion.source_path.display()));
    let start = Instant::now();
    let artifacts = DataIngestion::new(cfg.ingestion.clone()).initiate_data_ingestion()?;
    step_done(&format!("{:?}", start.elapsed()));

    println!();
    println!("  {} {}", muted(&format!("{:<8}", "Raw")), artifacts.raw_data_path.display());
    println!("  {} {}", muted(&format!("{:<8}", "Train")), artifacts.train_data_path.display());
    println!("  {} {}", muted(&format!("{:<8}", "Test")), artifacts.test_data_path.display());
    println!();
    Ok(())
}

pub fn cmd_transform(cfg: &PipelineConfig) -> anyhow::Result<()> {
    section("Transform");

    step_run("Fitting preprocessor");
    let start = Instant::now();
    let artifacts = DataTransformation::new(cfg.transformation.clone())
        .initiate_data_transformation(&cfg.ingestion.train_data_path, &cfg.ingestion.test_data_path)?;
    step_done(&format!(
        "{} train × {} test rows, {} cols in {:?}",
        artifacts.train.nrows(),
        artifacts.test.nrows(),
        artifacts.train.ncols(),
        start.elapsed()
    ));

    println!();
    println!("  {} {}", muted(&format!("{:<14}", "Preprocessor")), artifacts.preprocessor_path.display());
    println!();
    Ok(())
}

pub fn cmd_train(cfg: &PipelineConfig) -> anyhow::Result<()> {
    section("Train");

    step_run("Transforming splits");
    let artifacts = DataTransformation::new(cfg.transformation.clone())
        .initiate_data_transformation(&cfg.ingestion.train_data_path, &cfg.ingestion.test_data_path)?;
    step_done(&format!("{} cols", artifacts.train.ncols()));

    step_run("Fitting candidates");
    let start = Instant::now();
    let report = ModelTrainer::new(cfg.trainer.clone())
        .initiate_model_trainer(&artifacts.train, &artifacts.test)?;
    step_done(&format!("{:?}", start.elapsed()));

    print_training_report(&report);
    Ok(())
}

pub fn cmd_run(cfg: &PipelineConfig) -> anyhow::Result<()> {
    section("Run");

    step_run("Ingest → transform → train");
    let report = TrainPipeline::new(cfg.clone()).run()?;
    step_done(&format!("{:.2}s", report.elapsed_secs));

    print_training_report(&report.training);
    Ok(())
}

pub fn cmd_predict(cfg: &PipelineConfig, record: StudentRecord) -> anyhow::Result<()> {
    section("Predict");

    step_run("Loading artifacts");
    let pipeline = PredictPipeline::load(&cfg.transformation.preprocessor_path, &cfg.trainer.model_path)?;
    step_done(pipeline.model_name());

    let prediction = pipeline.predict_records(std::slice::from_ref(&record))?;
    let score = prediction.first().copied().unwrap_or(f64::NAN);

    println!();
    println!("  {} {}", muted(&format!("{:<16}", "math_score")), format!("{:.2}", score).white().bold());
    println!();
    Ok(())
}

fn print_training_report(report: &TrainingReport) {
    println!();
    line_box_top();
    for score in &report.scores {
        let r2 = format!("{:>8.4}", score.metrics.r2);
        let r2 = if score.name == report.best_model_name { ok(&r2) } else { r2.white() };
        line_box(&format!("{} {} {}", muted(&format!("{:<24}", score.name)), muted("R²"), r2));
    }
    line_box_sep();
    line_box(&kv("Best", &format!("{} ({:.4})", report.best_model_name, report.best_r2)));
    line_box(&kv("Saved", &report.model_path.display().to_string()));
    line_box_bottom();
    println!();
}
