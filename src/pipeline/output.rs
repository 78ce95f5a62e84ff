//! Writes processed results and timestamped backups as pretty JSON.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use thiserror::Error;

use crate::models::Patient;

use super::artifact::TrainingArtifact;
use super::orchestrator::{PipelineOutput, RunReport};
use super::rules::RuleMaps;

pub const PATIENTS_FILE: &str = "patients.json";
pub const MEDICAL_RULES_FILE: &str = "medical_rules.json";
pub const TRAINING_DATA_FILE: &str = "training_data.json";

const BACKUP_PREFIX: &str = "processed_data_backup_";
const BACKUP_TIMESTAMP: &str = "%Y%m%d_%H%M%S";

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Cannot write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot serialize {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Paths of the files written by [`write_processed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFiles {
    pub patients: PathBuf,
    pub medical_rules: PathBuf,
    pub training_data: PathBuf,
}

#[derive(Serialize)]
struct Backup<'a> {
    patients: &'a [Patient],
    medical_rules: &'a RuleMaps,
    training_data: &'a TrainingArtifact,
    report: &'a RunReport,
}

/// Write patients, rule maps and the training artifact into `dir`.
pub fn write_processed(dir: &Path, output: &PipelineOutput) -> Result<WrittenFiles, OutputError> {
    create_dir(dir)?;
    let files = WrittenFiles {
        patients: dir.join(PATIENTS_FILE),
        medical_rules: dir.join(MEDICAL_RULES_FILE),
        training_data: dir.join(TRAINING_DATA_FILE),
    };
    write_json(&files.patients, &output.patients)?;
    write_json(&files.medical_rules, &output.medical_rules)?;
    write_json(&files.training_data, &output.training_artifact)?;
    tracing::info!(dir = %dir.display(), "Processed data written");
    Ok(files)
}

/// Write a single backup document named after the current local time.
pub fn create_backup(dir: &Path, output: &PipelineOutput) -> Result<PathBuf, OutputError> {
    create_backup_at(dir, output, Local::now().naive_local())
}

pub fn create_backup_at(
    dir: &Path,
    output: &PipelineOutput,
    at: NaiveDateTime,
) -> Result<PathBuf, OutputError> {
    create_dir(dir)?;
    let path = dir.join(backup_file_name(at));
    let backup = Backup {
        patients: &output.patients,
        medical_rules: &output.medical_rules,
        training_data: &output.training_artifact,
        report: &output.report,
    };
    write_json(&path, &backup)?;
    tracing::info!(file = %path.display(), "Backup created");
    Ok(path)
}

pub fn backup_file_name(at: NaiveDateTime) -> String {
    format!("{BACKUP_PREFIX}{}.json", at.format(BACKUP_TIMESTAMP))
}

fn create_dir(dir: &Path) -> Result<(), OutputError> {
    fs::create_dir_all(dir).map_err(|source| OutputError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), OutputError> {
    let io_error = |source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_error)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|source| OutputError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(io_error)
}
