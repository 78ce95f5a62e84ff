//! Record-level validation errors.
//!
//! A `ValidationError` never aborts a batch on its own: the entity processor
//! logs it, counts the record as skipped and moves on to the next record.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid phone number format for {field}: '{value}'")]
    InvalidPhone { field: &'static str, value: String },

    #[error("Invalid patient ID format: '{0}'")]
    InvalidPatientId(String),

    #[error("Invalid visit ID format: '{0}'")]
    InvalidVisitId(String),

    #[error("Duplicate {collection} id within batch: {id}")]
    DuplicateId { collection: &'static str, id: String },

    #[error("Field '{0}' must not be empty")]
    EmptyField(&'static str),

    #[error("Field '{field}' expects a list, got the text '{value}'")]
    ExpectedList { field: &'static str, value: String },

    #[error("Confidence for '{condition}' out of range: {value}")]
    ConfidenceOutOfRange { condition: String, value: f64 },

    #[error("Unknown {field} value: '{value}'")]
    InvalidEnum { field: &'static str, value: String },

    #[error("Malformed record: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for ValidationError {
    fn from(e: serde_json::Error) -> Self {
        Self::Malformed(e.to_string())
    }
}
