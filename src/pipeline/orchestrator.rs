//! Pipeline orchestrator: quality gate → entity processing → rules and
//! encodings → training artifact.
//!
//! A run walks the stages in a fixed order. Any stage error moves the
//! pipeline to `Failed` and ends the run; there is no retry and no partial
//! output. Both outcomes carry the per-collection processed/skipped counts.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::models::enums::str_enum;
use crate::models::{Condition, Department, Patient, Symptom, Visit};

use super::artifact::{assemble_artifact, ArtifactError, TrainingArtifact};
use super::datasets::{DatasetKind, RawDatasets};
use super::encoding::{build_encodings, EncodingError};
use super::extract::{extract_list, ExtractionError};
use super::processor::{
    process_conditions, process_conversations, process_departments, process_patients,
    process_symptoms, process_visits, BatchRecord, ProcessedBatch, ProcessingError,
};
use super::quality::{QualityGate, QualityGateError};
use super::rules::{build_rule_maps, RuleMaps};

str_enum!(PipelineStage {
    NotStarted => "not_started",
    ValidatingInputs => "validating_inputs",
    ProcessingPatients => "processing_patients",
    ProcessingRules => "processing_rules",
    ProcessingTraining => "processing_training",
    Completed => "completed",
    Failed => "failed",
});

impl PipelineStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

// ---------------------------------------------------------------------------
// Errors and reporting
// ---------------------------------------------------------------------------

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineFailure {
    #[error(transparent)]
    QualityGate(#[from] QualityGateError),

    #[error("Required dataset '{0}' is missing")]
    MissingDataset(DatasetKind),

    #[error("Cannot read records of '{dataset}': {source}")]
    Extraction {
        dataset: DatasetKind,
        source: ExtractionError,
    },

    #[error(transparent)]
    Processing(#[from] ProcessingError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

/// A failed run: where it stopped, why, and what was counted until then.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Pipeline failed during {stage}: {failure}")]
pub struct PipelineError {
    pub stage: PipelineStage,
    #[source]
    pub failure: PipelineFailure,
    pub report: RunReport,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CollectionReport {
    pub processed: usize,
    pub skipped: usize,
}

/// Processed and skipped record counts per collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub collections: BTreeMap<&'static str, CollectionReport>,
}

impl RunReport {
    fn record(&mut self, collection: &'static str, processed: usize, skipped: usize) {
        self.collections
            .insert(collection, CollectionReport { processed, skipped });
    }

    pub fn get(&self, collection: &str) -> Option<CollectionReport> {
        self.collections.get(collection).copied()
    }

    pub fn total_processed(&self) -> usize {
        self.collections.values().map(|c| c.processed).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.collections.values().map(|c| c.skipped).sum()
    }
}

/// Everything a successful run hands to persistence and training.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub patients: Vec<Patient>,
    pub visits: Vec<Visit>,
    pub symptoms: Vec<Symptom>,
    pub conditions: Vec<Condition>,
    pub departments: Vec<Department>,
    pub medical_rules: RuleMaps,
    pub training_artifact: TrainingArtifact,
    pub report: RunReport,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct DataPipeline {
    stage: PipelineStage,
    gate: QualityGate,
}

impl Default for DataPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl DataPipeline {
    pub fn new() -> Self {
        Self {
            stage: PipelineStage::NotStarted,
            gate: QualityGate::new(),
        }
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    /// Problems found by the quality gate in the last run.
    pub fn quality_errors(&self) -> &[String] {
        self.gate.errors()
    }

    /// Run every stage over `datasets`. Each call starts from scratch.
    pub fn run(&mut self, datasets: &RawDatasets) -> Result<PipelineOutput, PipelineError> {
        self.stage = PipelineStage::NotStarted;
        let mut report = RunReport::default();

        match self.execute(datasets, &mut report) {
            Ok(mut output) => {
                self.transition(PipelineStage::Completed);
                output.report = report;
                Ok(output)
            }
            Err(failure) => {
                let stage = self.stage;
                tracing::error!(
                    stage = %stage,
                    error = %failure,
                    processed = report.total_processed(),
                    skipped = report.total_skipped(),
                    "Pipeline run failed"
                );
                self.transition(PipelineStage::Failed);
                Err(PipelineError {
                    stage,
                    failure,
                    report,
                })
            }
        }
    }

    fn execute(
        &mut self,
        datasets: &RawDatasets,
        report: &mut RunReport,
    ) -> Result<PipelineOutput, PipelineFailure> {
        self.transition(PipelineStage::ValidatingInputs);
        self.gate.verify(datasets)?;

        self.transition(PipelineStage::ProcessingPatients);
        let patients = tally(report, process_patients(records(datasets, DatasetKind::Patients)?))?;
        let visits =
            tally_optional(report, process_visits(records(datasets, DatasetKind::Visits)?));

        self.transition(PipelineStage::ProcessingRules);
        let symptoms = tally(report, process_symptoms(records(datasets, DatasetKind::Symptoms)?))?;
        let conditions =
            tally(report, process_conditions(records(datasets, DatasetKind::Conditions)?))?;
        let departments =
            tally(report, process_departments(records(datasets, DatasetKind::Departments)?))?;
        let medical_rules = build_rule_maps(&symptoms, &conditions, &departments);

        self.transition(PipelineStage::ProcessingTraining);
        let conversations = tally(
            report,
            process_conversations(
                records(datasets, DatasetKind::GeneralConversations)?,
                records(datasets, DatasetKind::MedicalConversations)?,
            ),
        )?;
        let (embeddings, vocabularies) = build_encodings(&symptoms)?;
        let training_artifact =
            assemble_artifact(conversations, medical_rules.clone(), embeddings, vocabularies)?;

        Ok(PipelineOutput {
            patients,
            visits,
            symptoms,
            conditions,
            departments,
            medical_rules,
            training_artifact,
            report: RunReport::default(),
        })
    }

    fn transition(&mut self, to: PipelineStage) {
        tracing::info!(from = %self.stage, to = %to, "Pipeline stage transition");
        self.stage = to;
    }
}

/// Record list of one dataset. An absent optional dataset reads as empty.
fn records(datasets: &RawDatasets, kind: DatasetKind) -> Result<&[Value], PipelineFailure> {
    match datasets.get(kind) {
        Some(payload) => extract_list(payload, kind.list_key())
            .map_err(|source| PipelineFailure::Extraction { dataset: kind, source }),
        None if kind.is_required() => Err(PipelineFailure::MissingDataset(kind)),
        None => Ok(&[]),
    }
}

fn tally<T: BatchRecord>(
    report: &mut RunReport,
    outcome: Result<ProcessedBatch<T>, ProcessingError>,
) -> Result<Vec<T>, PipelineFailure> {
    match outcome {
        Ok(batch) => {
            report.record(T::COLLECTION, batch.processed_count(), batch.skipped_count());
            Ok(batch.records)
        }
        Err(error) => {
            match &error {
                ProcessingError::BatchEmpty { skipped, .. } => {
                    report.record(T::COLLECTION, 0, *skipped)
                }
            }
            Err(error.into())
        }
    }
}

/// Like [`tally`] for a collection the run can do without: a batch with no
/// valid record is counted and dropped instead of failing the run.
fn tally_optional<T: BatchRecord>(
    report: &mut RunReport,
    outcome: Result<ProcessedBatch<T>, ProcessingError>,
) -> Vec<T> {
    match outcome {
        Ok(batch) => {
            report.record(T::COLLECTION, batch.processed_count(), batch.skipped_count());
            batch.records
        }
        Err(ProcessingError::BatchEmpty { collection, skipped }) => {
            report.record(T::COLLECTION, 0, skipped);
            tracing::warn!(collection, skipped, "No valid records, continuing without collection");
            Vec::new()
        }
    }
}
