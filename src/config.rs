use std::path::{Path, PathBuf};

/// Application-level constants
pub const APP_NAME: &str = "MedBot";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Env var overriding the base data directory.
pub const DATA_DIR_ENV: &str = "MEDBOT_DATA_DIR";

/// Env var enabling verbose logging.
pub const DEV_ENV: &str = "MEDBOT_DEV";

const DEFAULT_DATA_DIR: &str = "model/data";

/// True when `MEDBOT_DEV` is set to anything but "0".
pub fn is_dev() -> bool {
    std::env::var(DEV_ENV).is_ok_and(|v| v != "0")
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    if is_dev() {
        "medbot_lib=debug,process_data=debug"
    } else {
        "medbot_lib=info,process_data=info"
    }
}

/// Where raw inputs are read from and processed outputs are written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub raw_dir: PathBuf,
    pub processed_dir: PathBuf,
    pub backups_dir: PathBuf,
}

impl DataPaths {
    /// Lay out `raw/`, `processed/` and `backups/` under `base`.
    pub fn under(base: &Path) -> Self {
        Self {
            raw_dir: base.join("raw"),
            processed_dir: base.join("processed"),
            backups_dir: base.join("backups"),
        }
    }

    /// Resolve from `MEDBOT_DATA_DIR`, falling back to `model/data`.
    pub fn from_env() -> Self {
        let base = std::env::var(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));
        Self::under(&base)
    }
}
