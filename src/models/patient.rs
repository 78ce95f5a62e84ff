use serde::{Deserialize, Serialize};

use super::error::ValidationError;

/// Minimum patient id length, prefix included ("P001").
pub const MIN_PATIENT_ID_LEN: usize = 4;

/// Phone numbers are exactly this many ASCII digits.
pub const PHONE_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub phone: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub name: String,
    pub relationship: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Surgery {
    pub procedure: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifestyle {
    pub smoking: String,
    pub alcohol: String,
    pub exercise: String,
    pub diet: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicalHistory {
    pub chronic_conditions: Vec<String>,
    pub allergies: Vec<String>,
    pub past_surgeries: Vec<Surgery>,
    pub current_medications: Vec<Medication>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicInfo {
    pub name: String,
    pub date_of_birth: String,
    pub gender: String,
    pub blood_type: String,
    pub contact: Contact,
    pub emergency_contact: EmergencyContact,
}

/// Unvalidated patient, as produced by the normalization pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientDraft {
    pub patient_id: String,
    pub basic_info: BasicInfo,
    pub medical_history: MedicalHistory,
    pub lifestyle: Lifestyle,
}

/// A validated patient. Only obtainable through `TryFrom<PatientDraft>`,
/// so the id and both phone numbers always satisfy their format rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PatientDraft")]
pub struct Patient {
    patient_id: String,
    basic_info: BasicInfo,
    medical_history: MedicalHistory,
    lifestyle: Lifestyle,
}

impl Patient {
    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }

    pub fn basic_info(&self) -> &BasicInfo {
        &self.basic_info
    }

    pub fn medical_history(&self) -> &MedicalHistory {
        &self.medical_history
    }

    pub fn lifestyle(&self) -> &Lifestyle {
        &self.lifestyle
    }
}

impl TryFrom<PatientDraft> for Patient {
    type Error = ValidationError;

    fn try_from(draft: PatientDraft) -> Result<Self, Self::Error> {
        validate_patient_id(&draft.patient_id)?;
        validate_phone("contact.phone", &draft.basic_info.contact.phone)?;
        validate_phone(
            "emergency_contact.phone",
            &draft.basic_info.emergency_contact.phone,
        )?;

        Ok(Self {
            patient_id: draft.patient_id,
            basic_info: draft.basic_info,
            medical_history: draft.medical_history,
            lifestyle: draft.lifestyle,
        })
    }
}

/// Patient ids start with `P` and are at least four characters long.
pub fn validate_patient_id(id: &str) -> Result<(), ValidationError> {
    if id.starts_with('P') && id.chars().count() >= MIN_PATIENT_ID_LEN {
        Ok(())
    } else {
        Err(ValidationError::InvalidPatientId(id.to_string()))
    }
}

/// Phone numbers are exactly ten ASCII digits with a leading `0`.
pub fn validate_phone(field: &'static str, phone: &str) -> Result<(), ValidationError> {
    let valid = phone.len() == PHONE_LEN
        && phone.starts_with('0')
        && phone.bytes().all(|b| b.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidPhone {
            field,
            value: phone.to_string(),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use proptest::prelude::*;

    pub(crate) fn sample_draft(id: &str, phone: &str) -> PatientDraft {
        PatientDraft {
            patient_id: id.into(),
            basic_info: BasicInfo {
                name: "Nguyễn Văn An".into(),
                date_of_birth: "1990-01-01".into(),
                gender: "Nam".into(),
                blood_type: "A+".into(),
                contact: Contact {
                    phone: phone.into(),
                    address: "12 Lê Lợi, Quận 1, Hồ Chí Minh".into(),
                },
                emergency_contact: EmergencyContact {
                    name: "Trần Thị Bình".into(),
                    relationship: "Vợ".into(),
                    phone: "0912345678".into(),
                },
            },
            medical_history: MedicalHistory {
                chronic_conditions: vec!["cao huyết áp".into()],
                allergies: vec![],
                past_surgeries: vec![],
                current_medications: vec![],
            },
            lifestyle: Lifestyle {
                smoking: "Không".into(),
                alcohol: "Thỉnh thoảng".into(),
                exercise: "Đi bộ".into(),
                diet: "Ăn chay".into(),
            },
        }
    }

    #[test]
    fn valid_draft_becomes_patient() {
        let patient = Patient::try_from(sample_draft("P001", "0987654321")).unwrap();
        assert_eq!(patient.patient_id(), "P001");
        assert_eq!(patient.basic_info().contact.phone, "0987654321");
    }

    #[test]
    fn rejects_bad_patient_id() {
        for id in ["invalid", "P01", "p001", ""] {
            let err = Patient::try_from(sample_draft(id, "0987654321")).unwrap_err();
            assert_eq!(err, ValidationError::InvalidPatientId(id.into()));
        }
    }

    #[test]
    fn rejects_bad_phone() {
        for phone in ["987654321", "1987654321", "09876543210", "09876o4321", "０987654321"] {
            let err = Patient::try_from(sample_draft("P001", phone)).unwrap_err();
            assert!(matches!(err, ValidationError::InvalidPhone { field: "contact.phone", .. }));
        }
    }

    #[test]
    fn rejects_bad_emergency_phone() {
        let mut draft = sample_draft("P001", "0987654321");
        draft.basic_info.emergency_contact.phone = "12345".into();
        let err = Patient::try_from(draft).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidPhone { field: "emergency_contact.phone", .. }
        ));
    }

    #[test]
    fn deserialize_runs_validation() {
        let mut value = serde_json::to_value(sample_draft("P001", "0987654321")).unwrap();
        assert!(serde_json::from_value::<Patient>(value.clone()).is_ok());
        value["patient_id"] = "X001".into();
        assert!(serde_json::from_value::<Patient>(value).is_err());
    }

    proptest! {
        #[test]
        fn phone_valid_iff_ten_digits_leading_zero(phone in "[0-9a-z+ ]{0,12}") {
            let expected = phone.len() == 10
                && phone.starts_with('0')
                && phone.chars().all(|c| c.is_ascii_digit());
            prop_assert_eq!(validate_phone("contact.phone", &phone).is_ok(), expected);
        }

        #[test]
        fn generated_phones_always_valid(rest in "[0-9]{9}") {
            let phone = format!("0{rest}");
            prop_assert!(validate_phone("contact.phone", &phone).is_ok());
        }

        #[test]
        fn patient_id_valid_iff_prefix_and_length(id in "[PpX]?[0-9A-Z]{0,6}") {
            let expected = id.starts_with('P') && id.chars().count() >= 4;
            prop_assert_eq!(validate_patient_id(&id).is_ok(), expected);
        }
    }
}
