//! Batch job: load the raw datasets, run the pipeline, write the results.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use medbot_lib::config::{self, DataPaths};
use medbot_lib::pipeline::{
    create_backup, load_raw_datasets, persist_output, write_processed, DataPipeline,
    InMemorySink,
};

#[derive(Parser)]
#[command(name = "process-data")]
#[command(version, about = "Validate, canonicalize and encode the raw medical datasets", long_about = None)]
struct Cli {
    /// Base data directory holding raw/, processed/ and backups/
    /// (default: $MEDBOT_DATA_DIR or model/data)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Skip the timestamped backup
    #[arg(long)]
    no_backup: bool,

    /// Upsert the validated records into an in-memory store and report counts
    #[arg(long)]
    persist: bool,
}

fn main() -> ExitCode {
    medbot_lib::init_tracing();
    let cli = Cli::parse();

    let paths = match cli.data_dir {
        Some(base) => DataPaths::under(&base),
        None => DataPaths::from_env(),
    };
    tracing::info!(
        app = config::APP_NAME,
        version = config::APP_VERSION,
        raw = %paths.raw_dir.display(),
        "Starting data processing"
    );

    let datasets = match load_raw_datasets(&paths.raw_dir) {
        Ok(datasets) => datasets,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load raw data");
            return ExitCode::FAILURE;
        }
    };

    let mut pipeline = DataPipeline::new();
    let output = match pipeline.run(&datasets) {
        Ok(output) => output,
        Err(e) => {
            for (collection, counts) in &e.report.collections {
                tracing::error!(
                    collection,
                    processed = counts.processed,
                    skipped = counts.skipped,
                    "Collection counts before failure"
                );
            }
            for problem in pipeline.quality_errors() {
                tracing::error!(problem = %problem, "Quality gate");
            }
            tracing::error!(stage = %e.stage, error = %e.failure, "Data processing failed");
            return ExitCode::FAILURE;
        }
    };

    for (collection, counts) in &output.report.collections {
        tracing::info!(
            collection,
            processed = counts.processed,
            skipped = counts.skipped,
            "Collection processed"
        );
    }

    if let Err(e) = write_processed(&paths.processed_dir, &output) {
        tracing::error!(error = %e, "Failed to write processed data");
        return ExitCode::FAILURE;
    }

    if !cli.no_backup {
        if let Err(e) = create_backup(&paths.backups_dir, &output) {
            tracing::error!(error = %e, "Failed to create backup");
            return ExitCode::FAILURE;
        }
    }

    if cli.persist {
        let mut sink = InMemorySink::new();
        match persist_output(&mut sink, &output) {
            Ok(summary) => tracing::info!(?summary, "Persistence check passed"),
            Err(e) => {
                tracing::error!(error = %e, "Persistence failed");
                return ExitCode::FAILURE;
            }
        }
    }

    tracing::info!("Data processing completed");
    ExitCode::SUCCESS
}
