//! Reads the raw dataset files from disk.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use super::datasets::{DatasetKind, RawDatasets};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Required data file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Load every dataset file found under `dir`.
///
/// A missing required file is an error; a missing optional file is left out.
pub fn load_raw_datasets(dir: &Path) -> Result<RawDatasets, LoadError> {
    let mut datasets = RawDatasets::new();
    for kind in DatasetKind::all() {
        let path = dir.join(kind.file_name());
        if !path.is_file() {
            if kind.is_required() {
                return Err(LoadError::MissingFile(path));
            }
            tracing::debug!(dataset = %kind, "Optional data file absent");
            continue;
        }
        let payload = load_json(&path)?;
        tracing::info!(dataset = %kind, file = %path.display(), "Loaded data file");
        datasets.insert(*kind, payload);
    }
    Ok(datasets)
}

fn load_json(path: &Path) -> Result<Value, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })
}
