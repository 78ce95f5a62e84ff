use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::SeverityLevel;
use super::error::ValidationError;
use super::patient::validate_patient_id;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictedCondition {
    pub condition_name: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatbotAnalysis {
    pub predicted_conditions: Vec<PredictedCondition>,
    pub recommended_department: String,
    pub priority_level: SeverityLevel,
    pub queue_number: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitDraft {
    pub visit_id: String,
    pub patient_id: String,
    pub timestamp: NaiveDateTime,
    pub symptoms: Vec<String>,
    pub chatbot_analysis: ChatbotAnalysis,
}

/// A triage visit recorded by the chatbot front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "VisitDraft")]
pub struct Visit {
    visit_id: String,
    patient_id: String,
    timestamp: NaiveDateTime,
    symptoms: Vec<String>,
    chatbot_analysis: ChatbotAnalysis,
}

impl Visit {
    pub fn visit_id(&self) -> &str {
        &self.visit_id
    }

    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn symptoms(&self) -> &[String] {
        &self.symptoms
    }

    pub fn chatbot_analysis(&self) -> &ChatbotAnalysis {
        &self.chatbot_analysis
    }
}

impl TryFrom<VisitDraft> for Visit {
    type Error = ValidationError;

    fn try_from(draft: VisitDraft) -> Result<Self, Self::Error> {
        validate_visit_id(&draft.visit_id)?;
        validate_patient_id(&draft.patient_id)?;
        for predicted in &draft.chatbot_analysis.predicted_conditions {
            if !(0.0..=1.0).contains(&predicted.confidence) {
                return Err(ValidationError::ConfidenceOutOfRange {
                    condition: predicted.condition_name.clone(),
                    value: predicted.confidence,
                });
            }
        }

        Ok(Self {
            visit_id: draft.visit_id,
            patient_id: draft.patient_id,
            timestamp: draft.timestamp,
            symptoms: draft.symptoms,
            chatbot_analysis: draft.chatbot_analysis,
        })
    }
}

/// Visit ids start with `V` and are at least four characters long.
pub fn validate_visit_id(id: &str) -> Result<(), ValidationError> {
    if id.starts_with('V') && id.chars().count() >= 4 {
        Ok(())
    } else {
        Err(ValidationError::InvalidVisitId(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft_json() -> serde_json::Value {
        serde_json::json!({
            "visit_id": "V001",
            "patient_id": "P001",
            "timestamp": "2024-03-01T08:30:00",
            "symptoms": ["đau đầu"],
            "chatbot_analysis": {
                "predicted_conditions": [{"condition_name": "cảm lạnh", "confidence": 0.8}],
                "recommended_department": "nội khoa",
                "priority_level": "mild",
                "queue_number": 4
            }
        })
    }

    #[test]
    fn parses_valid_visit() {
        let visit: Visit = serde_json::from_value(draft_json()).unwrap();
        assert_eq!(visit.visit_id(), "V001");
        assert_eq!(visit.chatbot_analysis().priority_level, SeverityLevel::Mild);
        assert_eq!(visit.chatbot_analysis().queue_number, 4);
    }

    #[test]
    fn rejects_bad_visit_id() {
        let mut value = draft_json();
        value["visit_id"] = "X001".into();
        let draft: VisitDraft = serde_json::from_value(value).unwrap();
        assert_eq!(
            Visit::try_from(draft).unwrap_err(),
            ValidationError::InvalidVisitId("X001".into())
        );
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        let mut value = draft_json();
        value["chatbot_analysis"]["predicted_conditions"][0]["confidence"] = 1.5.into();
        let draft: VisitDraft = serde_json::from_value(value).unwrap();
        assert!(matches!(
            Visit::try_from(draft),
            Err(ValidationError::ConfidenceOutOfRange { .. })
        ));
    }

    #[test]
    fn rejects_unknown_priority() {
        let mut value = draft_json();
        value["chatbot_analysis"]["priority_level"] = "urgent".into();
        assert!(serde_json::from_value::<VisitDraft>(value).is_err());
    }
}
