//! Entity processor: canonicalize raw records and build validated entities.
//!
//! Each record is handled independently. A record that cannot be parsed,
//! canonicalized or validated is logged with its payload and skipped; the
//! rest of the collection carries on. Only a collection in which *every*
//! record failed is an error.
//!
//! Records are processed on the rayon pool and collected back in input
//! order before the fold, so output order and skip indices never depend on
//! scheduling.

use std::borrow::Borrow;
use std::collections::HashSet;

use rayon::prelude::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::models::{
    BasicInfo, Condition, ConditionRecord, Conversation, ConversationRecord, ConversationType,
    Department, DepartmentRecord, Lifestyle, MedicalHistory, Medication, Patient, PatientDraft,
    Surgery, Symptom, SymptomRecord, ValidationError, Visit, VisitDraft,
};

use super::canonical::{
    standardize, standardize_address, standardize_medical_text, standardize_name,
    standardize_symptom,
};

/// Logged payloads are cut to this many characters.
const MAX_LOGGED_PAYLOAD: usize = 500;

/// Canonical spellings that mean "nothing recorded" in a list field.
const NONE_MARKERS: &[&str] = &["không", "khong", "none", ""];

// ---------------------------------------------------------------------------
// Error and result types
// ---------------------------------------------------------------------------

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProcessingError {
    #[error("Every record in '{collection}' failed validation ({skipped} skipped)")]
    BatchEmpty {
        collection: &'static str,
        skipped: usize,
    },
}

/// One record dropped from a collection, by input position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRecord {
    pub index: usize,
    #[serde(serialize_with = "serialize_reason")]
    pub reason: ValidationError,
}

fn serialize_reason<S: serde::Serializer>(
    reason: &ValidationError,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(reason)
}

/// Outcome of processing one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedBatch<T> {
    pub records: Vec<T>,
    pub skipped: Vec<SkippedRecord>,
}

impl<T> Default for ProcessedBatch<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<T> ProcessedBatch<T> {
    pub fn processed_count(&self) -> usize {
        self.records.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Fail when a non-empty input produced no records at all.
    fn require_records(self, collection: &'static str) -> Result<Self, ProcessingError> {
        if self.records.is_empty() && !self.skipped.is_empty() {
            tracing::error!(
                collection,
                skipped = self.skipped.len(),
                "No record in collection passed validation"
            );
            return Err(ProcessingError::BatchEmpty {
                collection,
                skipped: self.skipped.len(),
            });
        }
        Ok(self)
    }
}

/// Entities that can flow through the per-record fold.
pub trait BatchRecord: Send {
    /// Collection name used in logs, errors and the run report.
    const COLLECTION: &'static str;

    /// Natural id, unique within one batch. `None` for records without one.
    fn natural_id(&self) -> Option<String>;
}

impl BatchRecord for Patient {
    const COLLECTION: &'static str = "patients";

    fn natural_id(&self) -> Option<String> {
        Some(self.patient_id().to_string())
    }
}

impl BatchRecord for Symptom {
    const COLLECTION: &'static str = "symptoms";

    fn natural_id(&self) -> Option<String> {
        Some(self.id().to_string())
    }
}

impl BatchRecord for Condition {
    const COLLECTION: &'static str = "conditions";

    fn natural_id(&self) -> Option<String> {
        Some(self.id().to_string())
    }
}

impl BatchRecord for Department {
    const COLLECTION: &'static str = "departments";

    fn natural_id(&self) -> Option<String> {
        Some(self.id().to_string())
    }
}

impl BatchRecord for Visit {
    const COLLECTION: &'static str = "visits";

    fn natural_id(&self) -> Option<String> {
        Some(self.visit_id().to_string())
    }
}

impl BatchRecord for Conversation {
    const COLLECTION: &'static str = "conversations";

    fn natural_id(&self) -> Option<String> {
        None
    }
}

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

pub fn process_patients(raw: &[Value]) -> Result<ProcessedBatch<Patient>, ProcessingError> {
    run_batch(raw, |_, value| {
        let patient: RawPatient = parse(value)?;
        Patient::try_from(patient.canonicalize()?)
    })
    .require_records(Patient::COLLECTION)
}

pub fn process_symptoms(raw: &[Value]) -> Result<ProcessedBatch<Symptom>, ProcessingError> {
    run_batch(raw, |_, value| {
        let mut record: SymptomRecord = parse(value)?;
        record.symptom_name = standardize_symptom(&record.symptom_name);
        record.priority_level = standardize(&record.priority_level);
        record.related_conditions = standardize_each(&record.related_conditions);
        Symptom::try_from(record)
    })
    .require_records(Symptom::COLLECTION)
}

pub fn process_conditions(raw: &[Value]) -> Result<ProcessedBatch<Condition>, ProcessingError> {
    run_batch(raw, |_, value| {
        let mut record: ConditionRecord = parse(value)?;
        record.condition_name = standardize(&record.condition_name);
        record.symptoms = record.symptoms.iter().map(|s| standardize_symptom(s)).collect();
        record.department_name = standardize(&record.department_name);
        Condition::try_from(record)
    })
    .require_records(Condition::COLLECTION)
}

pub fn process_departments(
    raw: &[Value],
) -> Result<ProcessedBatch<Department>, ProcessingError> {
    run_batch(raw, |_, value| {
        let mut record: DepartmentRecord = parse(value)?;
        record.department_name = standardize(&record.department_name);
        record.common_conditions = standardize_each(&record.common_conditions);
        Department::try_from(record)
    })
    .require_records(Department::COLLECTION)
}

pub fn process_visits(raw: &[Value]) -> Result<ProcessedBatch<Visit>, ProcessingError> {
    run_batch(raw, |_, value| {
        let mut draft: VisitDraft = parse(value)?;
        draft.symptoms = draft.symptoms.iter().map(|s| standardize_symptom(s)).collect();
        let analysis = &mut draft.chatbot_analysis;
        analysis.recommended_department = standardize(&analysis.recommended_department);
        for predicted in &mut analysis.predicted_conditions {
            predicted.condition_name = standardize(&predicted.condition_name);
        }
        Visit::try_from(draft)
    })
    .require_records(Visit::COLLECTION)
}

/// Tag and merge both conversation sources: general first, then medical.
/// Skip indices run over the merged sequence.
pub fn process_conversations(
    general: &[Value],
    medical: &[Value],
) -> Result<ProcessedBatch<Conversation>, ProcessingError> {
    let merged: Vec<&Value> = general.iter().chain(medical).collect();
    let general_len = general.len();
    run_batch(&merged, |index, value| {
        let record: ConversationRecord = parse(value)?;
        if record.instruction.trim().is_empty() {
            return Err(ValidationError::EmptyField("instruction"));
        }
        let kind = if index < general_len {
            ConversationType::General
        } else {
            ConversationType::Medical
        };
        Ok(Conversation::tagged(record, kind))
    })
    .require_records(Conversation::COLLECTION)
}

// ---------------------------------------------------------------------------
// Per-record fold
// ---------------------------------------------------------------------------

fn run_batch<V, T, F>(raw: &[V], build: F) -> ProcessedBatch<T>
where
    V: Borrow<Value> + Sync,
    T: BatchRecord,
    F: Fn(usize, &Value) -> Result<T, ValidationError> + Sync,
{
    let outcomes: Vec<Result<T, ValidationError>> = raw
        .par_iter()
        .enumerate()
        .map(|(index, value)| build(index, value.borrow()))
        .collect();

    let mut batch = ProcessedBatch::default();
    let mut seen = HashSet::new();
    for (index, outcome) in outcomes.into_iter().enumerate() {
        let outcome = outcome.and_then(|record| match record.natural_id() {
            Some(id) if !seen.insert(id.clone()) => Err(ValidationError::DuplicateId {
                collection: T::COLLECTION,
                id,
            }),
            _ => Ok(record),
        });
        match outcome {
            Ok(record) => batch.records.push(record),
            Err(reason) => {
                tracing::warn!(
                    collection = T::COLLECTION,
                    index,
                    error = %reason,
                    payload = %truncate_payload(raw[index].borrow()),
                    "Skipping invalid record"
                );
                batch.skipped.push(SkippedRecord { index, reason });
            }
        }
    }

    tracing::debug!(
        collection = T::COLLECTION,
        processed = batch.records.len(),
        skipped = batch.skipped.len(),
        "Collection processed"
    );
    batch
}

fn parse<T: DeserializeOwned>(value: &Value) -> Result<T, ValidationError> {
    Ok(T::deserialize(value)?)
}

fn standardize_each(values: &[String]) -> Vec<String> {
    values.iter().map(|v| standardize(v)).collect()
}

fn truncate_payload(value: &Value) -> String {
    let text = value.to_string();
    match text.char_indices().nth(MAX_LOGGED_PAYLOAD) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text,
    }
}

// ---------------------------------------------------------------------------
// Tolerant raw patient shape
// ---------------------------------------------------------------------------

/// A list field that older exports sometimes wrote as a single string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TextOrList<T> {
    List(Vec<T>),
    Text(String),
}

impl<T> Default for TextOrList<T> {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

fn is_none_marker(text: &str) -> bool {
    NONE_MARKERS.contains(&standardize(text).as_str())
}

impl TextOrList<String> {
    fn into_strings(self) -> Vec<String> {
        match self {
            Self::List(items) => items,
            Self::Text(text) if is_none_marker(&text) => Vec::new(),
            Self::Text(text) => vec![text],
        }
    }
}

impl<T> TextOrList<T> {
    /// Structured lists accept a none marker but no other free text.
    fn into_structured(self, field: &'static str) -> Result<Vec<T>, ValidationError> {
        match self {
            Self::List(items) => Ok(items),
            Self::Text(text) if is_none_marker(&text) => Ok(Vec::new()),
            Self::Text(value) => Err(ValidationError::ExpectedList { field, value }),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawMedicalHistory {
    #[serde(default)]
    chronic_conditions: TextOrList<String>,
    #[serde(default)]
    allergies: TextOrList<String>,
    #[serde(default)]
    past_surgeries: TextOrList<Surgery>,
    #[serde(default)]
    current_medications: TextOrList<Medication>,
}

#[derive(Debug, Deserialize)]
struct RawPatient {
    patient_id: String,
    basic_info: BasicInfo,
    #[serde(default)]
    medical_history: RawMedicalHistory,
    lifestyle: Lifestyle,
}

impl RawPatient {
    fn canonicalize(self) -> Result<PatientDraft, ValidationError> {
        let mut basic_info = self.basic_info;
        basic_info.name = standardize_name(&basic_info.name);
        basic_info.contact.address = standardize_address(&basic_info.contact.address);
        basic_info.emergency_contact.name = standardize_name(&basic_info.emergency_contact.name);

        let history = self.medical_history;
        let past_surgeries = history
            .past_surgeries
            .into_structured("past_surgeries")?
            .into_iter()
            .map(|s| Surgery {
                procedure: standardize(&s.procedure),
                date: s.date.trim().to_string(),
            })
            .collect();
        let current_medications = history
            .current_medications
            .into_structured("current_medications")?
            .into_iter()
            .map(|m| Medication {
                name: standardize(&m.name),
                dosage: standardize_medical_text(&m.dosage),
                frequency: standardize_medical_text(&m.frequency),
            })
            .collect();

        Ok(PatientDraft {
            patient_id: self.patient_id.trim().to_string(),
            basic_info,
            medical_history: MedicalHistory {
                chronic_conditions: standardize_each(&history.chronic_conditions.into_strings()),
                allergies: standardize_each(&history.allergies.into_strings()),
                past_surgeries,
                current_medications,
            },
            lifestyle: self.lifestyle,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::patient::tests::sample_draft;
    use serde_json::json;

    fn patient_value(id: &str, phone: &str) -> Value {
        serde_json::to_value(sample_draft(id, phone)).unwrap()
    }

    #[test]
    fn one_bad_phone_skips_one_record() {
        let raw: Vec<Value> = (1..=10)
            .map(|i| {
                let phone = if i == 4 { "12345" } else { "0987654321" };
                patient_value(&format!("P{i:03}"), phone)
            })
            .collect();
        let batch = process_patients(&raw).unwrap();
        assert_eq!(batch.processed_count(), 9);
        assert_eq!(batch.skipped_count(), 1);
        assert_eq!(batch.skipped[0].index, 3);
        assert!(matches!(batch.skipped[0].reason, ValidationError::InvalidPhone { .. }));
        assert!(batch.records.iter().all(|p| p.patient_id() != "P004"));
    }

    #[test]
    fn all_invalid_patients_is_batch_empty() {
        let raw = vec![patient_value("X001", "0987654321"), json!({"patient_id": "P002"})];
        let err = process_patients(&raw).unwrap_err();
        assert_eq!(
            err,
            ProcessingError::BatchEmpty {
                collection: "patients",
                skipped: 2
            }
        );
    }

    #[test]
    fn empty_input_is_not_an_error() {
        let batch = process_patients(&[]).unwrap();
        assert_eq!(batch.processed_count(), 0);
        assert_eq!(batch.skipped_count(), 0);
    }

    #[test]
    fn patient_text_fields_are_canonicalized() {
        let mut value = patient_value("P001", "0987654321");
        value["basic_info"]["name"] = "  nguyễn   văn AN ".into();
        value["basic_info"]["contact"]["address"] = "12 lê lợi,quận 1".into();
        value["medical_history"]["chronic_conditions"] = json!(["Cao Huyết Áp "]);
        value["medical_history"]["current_medications"] =
            json!([{"name": "Paracetamol", "dosage": "500 mg", "frequency": "2 lan/ngay"}]);
        let batch = process_patients(&[value]).unwrap();
        let patient = &batch.records[0];
        assert_eq!(patient.basic_info().name, "Nguyễn Văn An");
        assert_eq!(patient.basic_info().contact.address, "12 lê lợi, Quận 1");
        assert_eq!(patient.medical_history().chronic_conditions, ["cao huyết áp"]);
        let medication = &patient.medical_history().current_medications[0];
        assert_eq!(medication.name, "paracetamol");
        assert_eq!(medication.dosage, "500mg");
        assert_eq!(medication.frequency, "2 lần/ngày");
    }

    #[test]
    fn none_marker_becomes_empty_list() {
        let mut value = patient_value("P001", "0987654321");
        value["medical_history"]["past_surgeries"] = "Không".into();
        value["medical_history"]["current_medications"] = "không".into();
        value["medical_history"]["allergies"] = "khong".into();
        let batch = process_patients(&[value]).unwrap();
        let history = batch.records[0].medical_history();
        assert!(history.past_surgeries.is_empty());
        assert!(history.current_medications.is_empty());
        assert!(history.allergies.is_empty());
    }

    #[test]
    fn single_string_becomes_one_element_list() {
        let mut value = patient_value("P001", "0987654321");
        value["medical_history"]["allergies"] = "Phấn Hoa".into();
        let batch = process_patients(&[value]).unwrap();
        assert_eq!(batch.records[0].medical_history().allergies, ["phấn hoa"]);
    }

    #[test]
    fn free_text_in_structured_list_is_rejected() {
        let mut value = patient_value("P001", "0987654321");
        value["medical_history"]["past_surgeries"] = "mổ ruột thừa".into();
        let raw = vec![value, patient_value("P002", "0987654321")];
        let batch = process_patients(&raw).unwrap();
        assert_eq!(batch.processed_count(), 1);
        assert!(matches!(
            batch.skipped[0].reason,
            ValidationError::ExpectedList { field: "past_surgeries", .. }
        ));
    }

    #[test]
    fn duplicate_ids_are_skipped() {
        let raw = vec![
            patient_value("P001", "0987654321"),
            patient_value("P001", "0911111111"),
        ];
        let batch = process_patients(&raw).unwrap();
        assert_eq!(batch.processed_count(), 1);
        assert_eq!(batch.records[0].basic_info().contact.phone, "0987654321");
        assert_eq!(
            batch.skipped[0].reason,
            ValidationError::DuplicateId {
                collection: "patients",
                id: "P001".into()
            }
        );
    }

    #[test]
    fn symptom_cross_references_are_canonical() {
        let raw = vec![json!({
            "symptom_id": 1,
            "symptom_name": "Dau Dau",
            "priority_level": " Mild ",
            "related_conditions": ["Cảm Lạnh", "cảm lạnh"]
        })];
        let batch = process_symptoms(&raw).unwrap();
        let symptom = &batch.records[0];
        assert_eq!(symptom.name(), "đau đầu");
        assert_eq!(symptom.priority_level(), "mild");
        assert_eq!(symptom.related_conditions(), ["cảm lạnh", "cảm lạnh"]);
    }

    #[test]
    fn condition_and_department_names_are_canonical() {
        let conditions = process_conditions(&[json!({
            "condition_id": 1,
            "condition_name": "Cảm Lạnh",
            "symptoms": ["ho khan", "SỐT"],
            "department_name": "Nội Khoa"
        })])
        .unwrap();
        let condition = &conditions.records[0];
        assert_eq!(condition.name(), "cảm lạnh");
        assert_eq!(condition.symptoms(), ["ho", "sốt"]);
        assert_eq!(condition.department_name(), "nội khoa");

        let departments = process_departments(&[json!({
            "department_id": 1,
            "department_name": "Nội Khoa",
            "common_conditions": ["Cảm Lạnh"]
        })])
        .unwrap();
        assert_eq!(departments.records[0].name(), "nội khoa");
        assert_eq!(departments.records[0].common_conditions(), ["cảm lạnh"]);
    }

    #[test]
    fn visits_are_canonicalized_and_validated() {
        let visit = json!({
            "visit_id": "V001",
            "patient_id": "P001",
            "timestamp": "2024-03-01T08:30:00",
            "symptoms": ["Dau Dau"],
            "chatbot_analysis": {
                "predicted_conditions": [{"condition_name": "Cảm Lạnh", "confidence": 0.7}],
                "recommended_department": "Nội Khoa",
                "priority_level": "moderate",
                "queue_number": 2
            }
        });
        let mut bad = visit.clone();
        bad["visit_id"] = "001".into();
        let batch = process_visits(&[visit, bad]).unwrap();
        assert_eq!(batch.processed_count(), 1);
        let visit = &batch.records[0];
        assert_eq!(visit.symptoms(), ["đau đầu"]);
        assert_eq!(visit.chatbot_analysis().recommended_department, "nội khoa");
        assert_eq!(
            visit.chatbot_analysis().predicted_conditions[0].condition_name,
            "cảm lạnh"
        );
        assert_eq!(batch.skipped[0].reason, ValidationError::InvalidVisitId("001".into()));
    }

    #[test]
    fn conversations_merge_general_then_medical() {
        let general = vec![
            json!({"instruction": "g1", "input": "", "output": "a"}),
            json!({"instruction": "g2", "output": "b"}),
        ];
        let medical = vec![
            json!({"instruction": "m1", "input": "x", "output": "c"}),
            json!({"output": "missing instruction"}),
        ];
        let batch = process_conversations(&general, &medical).unwrap();
        let kinds: Vec<_> = batch.records.iter().map(|c| c.conversation_type).collect();
        assert_eq!(
            kinds,
            [ConversationType::General, ConversationType::General, ConversationType::Medical]
        );
        assert_eq!(batch.records[2].instruction, "m1");
        assert_eq!(batch.skipped[0].index, 3);
    }

    #[test]
    fn output_order_follows_input_order() {
        let raw: Vec<Value> = (0..200)
            .map(|i| json!({"department_id": i, "department_name": format!("khoa {i}")}))
            .collect();
        let batch = process_departments(&raw).unwrap();
        let ids: Vec<i64> = batch.records.iter().map(Department::id).collect();
        assert_eq!(ids, (0..200).collect::<Vec<i64>>());
    }

    #[test]
    fn long_payloads_are_truncated() {
        let value = Value::String("đ".repeat(2_000));
        let text = truncate_payload(&value);
        assert_eq!(text.chars().count(), MAX_LOGGED_PAYLOAD + 3);
        assert!(text.ends_with("..."));
    }
}
