//! Student performance - main entry point

use clap::Parser;
use student_performance::cli::{
    cmd_ingest, cmd_predict, cmd_run, cmd_train, cmd_transform, load_config, Cli, Commands,
};
use student_performance::inference::StudentRecord;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "student_performance=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut cfg = load_config(cli.config.as_deref(), cli.artifacts_dir.as_deref())?;

    match cli.command {
        Some(Commands::Ingest { source }) => {
            if let Some(source) = source {
                cfg = cfg.with_source_path(source);
            }
            cmd_ingest(&cfg)?;
        }
        Some(Commands::Transform) => {
            cmd_transform(&cfg)?;
        }
        Some(Commands::Train) => {
            cmd_train(&cfg)?;
        }
        Some(Commands::Run { source }) => {
            if let Some(source) = source {
                cfg = cfg.with_source_path(source);
            }
            cmd_run(&cfg)?;
        }
        Some(Commands::Predict {
            gender,
            race_ethnicity,
            parental_level_of_education,
            lunch,
            test_preparation_course,
            reading_score,
            writing_score,
        }) => {
            let record = StudentRecord {
                gender,
                race_ethnicity,
                parental_level_of_education,
                lunch,
                test_preparation_course,
                reading_score,
                writing_score,
            };
            cmd_predict(&cfg, record)?;
        }
        None => {
            // Default: full training run
            cmd_run(&cfg)?;
        }
    }

    Ok(())
}
