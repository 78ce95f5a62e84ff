//! The named raw inputs of a pipeline run.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::models::enums::str_enum;

str_enum!(DatasetKind {
    GeneralConversations => "alpaca_data",
    MedicalConversations => "chatdoctor_data",
    Conditions => "disease_details",
    Departments => "departments",
    Patients => "patient_info",
    Symptoms => "symptoms",
    Visits => "visits",
});

impl DatasetKind {
    /// The six datasets every run needs. Visits are optional.
    pub const REQUIRED: [DatasetKind; 6] = [
        Self::GeneralConversations,
        Self::MedicalConversations,
        Self::Conditions,
        Self::Departments,
        Self::Patients,
        Self::Symptoms,
    ];

    pub fn is_required(&self) -> bool {
        !matches!(self, Self::Visits)
    }

    /// Key under which the record list is expected inside a keyed container.
    pub fn list_key(&self) -> &'static str {
        match self {
            Self::GeneralConversations | Self::MedicalConversations => "conversations",
            Self::Conditions => "conditions",
            Self::Departments => "departments",
            Self::Patients => "patients",
            Self::Symptoms => "symptoms",
            Self::Visits => "visits",
        }
    }

    /// File name of this dataset inside the raw data directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::GeneralConversations => "alpaca_data.json",
            Self::MedicalConversations => "chatdoctor5k.json",
            Self::Conditions => "Disease_Details_Data.json",
            Self::Departments => "Medical_Departments.json",
            Self::Patients => "PatientInformation.json",
            Self::Symptoms => "Symptoms_MedicalConditions.json",
            Self::Visits => "visits.json",
        }
    }
}

/// Raw JSON payloads keyed by dataset, exactly as loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDatasets {
    payloads: BTreeMap<DatasetKind, Value>,
}

impl RawDatasets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: DatasetKind, payload: Value) -> Option<Value> {
        self.payloads.insert(kind, payload)
    }

    pub fn with(mut self, kind: DatasetKind, payload: Value) -> Self {
        self.insert(kind, payload);
        self
    }

    pub fn get(&self, kind: DatasetKind) -> Option<&Value> {
        self.payloads.get(&kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = DatasetKind> + '_ {
        self.payloads.keys().copied()
    }
}
