//! Medical knowledge entities: symptoms, conditions and departments.
//!
//! Cross-references between them are by canonical name, not by id.
//! The `*Record` types are the wire shape of the raw knowledge files; the
//! validated entities are built from them after canonicalization.

use serde::{Deserialize, Serialize};

use super::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomRecord {
    pub symptom_id: i64,
    pub symptom_name: String,
    /// Older exports call this field `severity_level`.
    #[serde(alias = "severity_level")]
    pub priority_level: String,
    #[serde(default)]
    pub related_conditions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionRecord {
    pub condition_id: i64,
    pub condition_name: String,
    #[serde(default)]
    pub symptoms: Vec<String>,
    pub department_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentRecord {
    pub department_id: i64,
    pub department_name: String,
    #[serde(default)]
    pub common_conditions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SymptomRecord")]
pub struct Symptom {
    symptom_id: i64,
    symptom_name: String,
    priority_level: String,
    related_conditions: Vec<String>,
}

impl Symptom {
    pub fn id(&self) -> i64 {
        self.symptom_id
    }

    pub fn name(&self) -> &str {
        &self.symptom_name
    }

    pub fn priority_level(&self) -> &str {
        &self.priority_level
    }

    /// Related condition names in source order. May contain duplicates.
    pub fn related_conditions(&self) -> &[String] {
        &self.related_conditions
    }
}

impl TryFrom<SymptomRecord> for Symptom {
    type Error = ValidationError;

    fn try_from(record: SymptomRecord) -> Result<Self, Self::Error> {
        require_text("symptom_name", &record.symptom_name)?;
        require_text("priority_level", &record.priority_level)?;
        Ok(Self {
            symptom_id: record.symptom_id,
            symptom_name: record.symptom_name,
            priority_level: record.priority_level,
            related_conditions: record.related_conditions,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ConditionRecord")]
pub struct Condition {
    condition_id: i64,
    condition_name: String,
    symptoms: Vec<String>,
    department_name: String,
}

impl Condition {
    pub fn id(&self) -> i64 {
        self.condition_id
    }

    pub fn name(&self) -> &str {
        &self.condition_name
    }

    pub fn symptoms(&self) -> &[String] {
        &self.symptoms
    }

    pub fn department_name(&self) -> &str {
        &self.department_name
    }
}

impl TryFrom<ConditionRecord> for Condition {
    type Error = ValidationError;

    fn try_from(record: ConditionRecord) -> Result<Self, Self::Error> {
        require_text("condition_name", &record.condition_name)?;
        require_text("department_name", &record.department_name)?;
        Ok(Self {
            condition_id: record.condition_id,
            condition_name: record.condition_name,
            symptoms: record.symptoms,
            department_name: record.department_name,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DepartmentRecord")]
pub struct Department {
    department_id: i64,
    department_name: String,
    common_conditions: Vec<String>,
}

impl Department {
    pub fn id(&self) -> i64 {
        self.department_id
    }

    pub fn name(&self) -> &str {
        &self.department_name
    }

    pub fn common_conditions(&self) -> &[String] {
        &self.common_conditions
    }
}

impl TryFrom<DepartmentRecord> for Department {
    type Error = ValidationError;

    fn try_from(record: DepartmentRecord) -> Result<Self, Self::Error> {
        require_text("department_name", &record.department_name)?;
        Ok(Self {
            department_id: record.department_id,
            department_name: record.department_name,
            common_conditions: record.common_conditions,
        })
    }
}

fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::EmptyField(field))
    } else {
        Ok(())
    }
}
