//! Name-keyed rule maps over the processed knowledge entities.
//!
//! Keys are canonical names. Maps keep input order; a later entity with the
//! same name replaces the earlier one in place. Cross-references (a
//! condition's department, a symptom's related conditions) are carried as-is
//! and are not checked against the sibling collections.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::models::{Condition, Department, Symptom};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomRule {
    pub symptom_id: i64,
    pub name: String,
    pub severity: String,
    pub conditions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionRule {
    pub condition_id: i64,
    pub name: String,
    pub symptoms: Vec<String>,
    pub department: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentRule {
    pub department_id: i64,
    pub name: String,
    pub conditions: Vec<String>,
}

/// Symptom vectors, condition mappings and department rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleMaps {
    pub symptoms: IndexMap<String, SymptomRule>,
    pub conditions: IndexMap<String, ConditionRule>,
    pub departments: IndexMap<String, DepartmentRule>,
}

pub fn build_rule_maps(
    symptoms: &[Symptom],
    conditions: &[Condition],
    departments: &[Department],
) -> RuleMaps {
    let symptoms = symptoms
        .iter()
        .map(|s| {
            let rule = SymptomRule {
                symptom_id: s.id(),
                name: s.name().to_string(),
                severity: s.priority_level().to_string(),
                conditions: s.related_conditions().to_vec(),
            };
            (rule.name.clone(), rule)
        })
        .collect();

    let conditions = conditions
        .iter()
        .map(|c| {
            let rule = ConditionRule {
                condition_id: c.id(),
                name: c.name().to_string(),
                symptoms: c.symptoms().to_vec(),
                department: c.department_name().to_string(),
            };
            (rule.name.clone(), rule)
        })
        .collect();

    let departments = departments
        .iter()
        .map(|d| {
            let rule = DepartmentRule {
                department_id: d.id(),
                name: d.name().to_string(),
                conditions: d.common_conditions().to_vec(),
            };
            (rule.name.clone(), rule)
        })
        .collect();

    let maps = RuleMaps {
        symptoms,
        conditions,
        departments,
    };
    tracing::debug!(
        symptoms = maps.symptoms.len(),
        conditions = maps.conditions.len(),
        departments = maps.departments.len(),
        "Rule maps built"
    );
    maps
}
