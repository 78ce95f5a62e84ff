pub mod conversation;
pub mod enums;
pub mod error;
pub mod medical;
pub mod patient;
pub mod visit;

pub use conversation::{Conversation, ConversationRecord};
pub use enums::{ConversationType, SeverityLevel};
pub use error::ValidationError;
pub use medical::{
    Condition, ConditionRecord, Department, DepartmentRecord, Symptom, SymptomRecord,
};
pub use patient::{
    BasicInfo, Contact, EmergencyContact, Lifestyle, MedicalHistory, Medication, Patient,
    PatientDraft, Surgery,
};
pub use visit::{ChatbotAnalysis, PredictedCondition, Visit, VisitDraft};
