//! Pre-flight checks over the raw datasets.
//!
//! Nothing is transformed here. The gate only answers whether the inputs are
//! complete and non-empty enough for the processor to run, and keeps a
//! human-readable log of every problem found by the last check.

use thiserror::Error;

use super::datasets::{DatasetKind, RawDatasets};
use super::extract::extract_named_list;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Quality gate failed: {}", .0.join("; "))]
pub struct QualityGateError(pub Vec<String>);

#[derive(Debug, Default)]
pub struct QualityGate {
    errors: Vec<String>,
}

impl QualityGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every required dataset is present and holds a record list.
    /// An optional dataset, when present, must hold a record list too.
    pub fn check_completeness(&mut self, datasets: &RawDatasets) -> bool {
        self.errors.clear();
        for kind in DatasetKind::all() {
            self.check_shape(datasets, *kind);
        }
        self.errors.is_empty()
    }

    /// Completeness, plus every required record list is non-empty.
    pub fn check_consistency(&mut self, datasets: &RawDatasets) -> bool {
        self.errors.clear();
        for kind in DatasetKind::all() {
            let Some(len) = self.check_shape(datasets, *kind) else {
                continue;
            };
            if len == 0 && kind.is_required() {
                self.errors.push(format!("Dataset '{kind}' is empty"));
            }
        }
        self.errors.is_empty()
    }

    /// Run both checks. The error carries the log of whichever failed first.
    pub fn verify(&mut self, datasets: &RawDatasets) -> Result<(), QualityGateError> {
        if !self.check_completeness(datasets) || !self.check_consistency(datasets) {
            tracing::warn!(errors = self.errors.len(), "Quality gate rejected inputs");
            return Err(QualityGateError(self.errors.clone()));
        }
        tracing::debug!("Quality gate passed");
        Ok(())
    }

    /// Problems found by the most recent check.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Record any shape problem and return the list length when readable.
    /// A keyed container only counts when the list sits under a named key.
    fn check_shape(&mut self, datasets: &RawDatasets, kind: DatasetKind) -> Option<usize> {
        let Some(payload) = datasets.get(kind) else {
            if kind.is_required() {
                self.errors.push(format!("Missing dataset '{kind}'"));
            }
            return None;
        };
        match extract_named_list(payload, kind.list_key()) {
            Ok(items) => Some(items.len()),
            Err(e) => {
                self.errors.push(format!("Dataset '{kind}' has no record list: {e}"));
                None
            }
        }
    }
}
