//! Persistence seam for validated records.
//!
//! A sink receives records that already passed validation and upserts them
//! by natural id: writing the same record twice leaves one copy.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::models::{Department, Patient, Symptom, Visit};

use super::orchestrator::PipelineOutput;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("Visit {visit_id} references unknown patient {patient_id}")]
    UnknownPatient { visit_id: String, patient_id: String },

    #[error("Storage backend error: {0}")]
    Backend(String),
}

pub trait RecordSink {
    fn upsert_patient(&mut self, patient: &Patient) -> Result<(), SinkError>;
    fn upsert_symptom(&mut self, symptom: &Symptom) -> Result<(), SinkError>;
    fn upsert_department(&mut self, department: &Department) -> Result<(), SinkError>;
    fn upsert_visit(&mut self, visit: &Visit) -> Result<(), SinkError>;
}

/// Sink backed by ordered maps. Visits must reference a stored patient.
#[derive(Debug, Default)]
pub struct InMemorySink {
    pub patients: BTreeMap<String, Patient>,
    pub symptoms: BTreeMap<i64, Symptom>,
    pub departments: BTreeMap<i64, Department>,
    pub visits: BTreeMap<String, Visit>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordSink for InMemorySink {
    fn upsert_patient(&mut self, patient: &Patient) -> Result<(), SinkError> {
        self.patients
            .insert(patient.patient_id().to_string(), patient.clone());
        Ok(())
    }

    fn upsert_symptom(&mut self, symptom: &Symptom) -> Result<(), SinkError> {
        self.symptoms.insert(symptom.id(), symptom.clone());
        Ok(())
    }

    fn upsert_department(&mut self, department: &Department) -> Result<(), SinkError> {
        self.departments.insert(department.id(), department.clone());
        Ok(())
    }

    fn upsert_visit(&mut self, visit: &Visit) -> Result<(), SinkError> {
        if !self.patients.contains_key(visit.patient_id()) {
            return Err(SinkError::UnknownPatient {
                visit_id: visit.visit_id().to_string(),
                patient_id: visit.patient_id().to_string(),
            });
        }
        self.visits.insert(visit.visit_id().to_string(), visit.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PersistSummary {
    pub patients: usize,
    pub symptoms: usize,
    pub departments: usize,
    pub visits: usize,
}

/// Upsert everything a run produced. Patients go first so visits can
/// reference them.
pub fn persist_output<S: RecordSink + ?Sized>(
    sink: &mut S,
    output: &PipelineOutput,
) -> Result<PersistSummary, SinkError> {
    for patient in &output.patients {
        sink.upsert_patient(patient)?;
    }
    for symptom in &output.symptoms {
        sink.upsert_symptom(symptom)?;
    }
    for department in &output.departments {
        sink.upsert_department(department)?;
    }
    for visit in &output.visits {
        sink.upsert_visit(visit)?;
    }

    let summary = PersistSummary {
        patients: output.patients.len(),
        symptoms: output.symptoms.len(),
        departments: output.departments.len(),
        visits: output.visits.len(),
    };
    tracing::info!(
        patients = summary.patients,
        symptoms = summary.symptoms,
        departments = summary.departments,
        visits = summary.visits,
        "Records persisted"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::patient::tests::sample_draft;
    use crate::models::{SymptomRecord, VisitDraft};
    use crate::pipeline::artifact::assemble_artifact;
    use crate::pipeline::encoding::build_encodings;
    use crate::pipeline::orchestrator::RunReport;
    use crate::pipeline::rules::RuleMaps;

    fn visit(id: &str, patient: &str) -> Visit {
        let draft: VisitDraft = serde_json::from_value(serde_json::json!({
            "visit_id": id,
            "patient_id": patient,
            "timestamp": "2024-03-01T08:30:00",
            "symptoms": ["ho"],
            "chatbot_analysis": {
                "predicted_conditions": [],
                "recommended_department": "nội khoa",
                "priority_level": "mild",
                "queue_number": 1
            }
        }))
        .unwrap();
        Visit::try_from(draft).unwrap()
    }

    fn output(visits: Vec<Visit>) -> PipelineOutput {
        let symptoms = vec![Symptom::try_from(SymptomRecord {
            symptom_id: 1,
            symptom_name: "ho".into(),
            priority_level: "mild".into(),
            related_conditions: vec![],
        })
        .unwrap()];
        let (embeddings, vocabularies) = build_encodings(&symptoms).unwrap();
        PipelineOutput {
            patients: vec![Patient::try_from(sample_draft("P001", "0987654321")).unwrap()],
            visits,
            symptoms,
            conditions: vec![],
            departments: vec![],
            medical_rules: RuleMaps::default(),
            training_artifact: assemble_artifact(
                vec![],
                RuleMaps::default(),
                embeddings,
                vocabularies,
            )
            .unwrap(),
            report: RunReport::default(),
        }
    }

    #[test]
    fn persisting_twice_is_idempotent() {
        let output = output(vec![visit("V001", "P001")]);
        let mut sink = InMemorySink::new();
        let first = persist_output(&mut sink, &output).unwrap();
        persist_output(&mut sink, &output).unwrap();
        assert_eq!(first.patients, 1);
        assert_eq!(sink.patients.len(), 1);
        assert_eq!(sink.symptoms.len(), 1);
        assert_eq!(sink.visits.len(), 1);
    }

    #[test]
    fn upsert_replaces_by_natural_id() {
        let mut sink = InMemorySink::new();
        sink.upsert_patient(&Patient::try_from(sample_draft("P001", "0987654321")).unwrap())
            .unwrap();
        sink.upsert_patient(&Patient::try_from(sample_draft("P001", "0911111111")).unwrap())
            .unwrap();
        assert_eq!(sink.patients["P001"].basic_info().contact.phone, "0911111111");
    }

    #[test]
    fn visit_for_unknown_patient_is_rejected() {
        let output = output(vec![visit("V001", "P999")]);
        let err = persist_output(&mut InMemorySink::new(), &output).unwrap_err();
        assert_eq!(
            err,
            SinkError::UnknownPatient {
                visit_id: "V001".into(),
                patient_id: "P999".into()
            }
        );
    }
}
