//! The training artifact: the single document handed to model training.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::models::Conversation;

use super::encoding::{Embeddings, Vocabularies, Vocabulary};
use super::rules::RuleMaps;

/// Top-level keys every artifact must carry, in document order.
pub const REQUIRED_SECTIONS: [&str; 5] =
    ["conversations", "rules", "embeddings", "encoders", "metadata"];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArtifactError {
    #[error("Training artifact is missing required section '{0}'")]
    MissingSection(&'static str),

    #[error("Training artifact is not an object")]
    NotAnObject,

    #[error("Malformed training artifact: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderSummary {
    pub classes: Vec<String>,
    pub count: usize,
}

impl From<&Vocabulary> for EncoderSummary {
    fn from(vocab: &Vocabulary) -> Self {
        Self {
            classes: vocab.classes().to_vec(),
            count: vocab.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactMetadata {
    pub conversation_count: usize,
    pub symptom_count: usize,
    pub condition_count: usize,
    pub department_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingArtifact {
    pub conversations: Vec<Conversation>,
    pub rules: RuleMaps,
    /// Symptom name → `[severity code, condition codes...]`.
    pub embeddings: IndexMap<String, Vec<u32>>,
    pub encoders: BTreeMap<String, EncoderSummary>,
    pub metadata: ArtifactMetadata,
}

impl TrainingArtifact {
    /// Read an artifact back, checking the required sections first so a
    /// truncated document names what is missing.
    pub fn from_json(value: &Value) -> Result<Self, ArtifactError> {
        let object = value.as_object().ok_or(ArtifactError::NotAnObject)?;
        if let Some(missing) = REQUIRED_SECTIONS
            .into_iter()
            .find(|key| !object.contains_key(*key))
        {
            return Err(ArtifactError::MissingSection(missing));
        }
        Self::deserialize(value).map_err(|e| ArtifactError::Malformed(e.to_string()))
    }
}

/// Collects the artifact sections; `build` fails on the first one missing.
#[derive(Debug, Default)]
pub struct ArtifactBuilder {
    conversations: Option<Vec<Conversation>>,
    rules: Option<RuleMaps>,
    embeddings: Option<Embeddings>,
    vocabularies: Option<Vocabularies>,
}

impl ArtifactBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn conversations(mut self, conversations: Vec<Conversation>) -> Self {
        self.conversations = Some(conversations);
        self
    }

    pub fn rules(mut self, rules: RuleMaps) -> Self {
        self.rules = Some(rules);
        self
    }

    pub fn embeddings(mut self, embeddings: Embeddings) -> Self {
        self.embeddings = Some(embeddings);
        self
    }

    pub fn vocabularies(mut self, vocabularies: Vocabularies) -> Self {
        self.vocabularies = Some(vocabularies);
        self
    }

    pub fn build(self) -> Result<TrainingArtifact, ArtifactError> {
        let conversations = self
            .conversations
            .ok_or(ArtifactError::MissingSection("conversations"))?;
        let rules = self.rules.ok_or(ArtifactError::MissingSection("rules"))?;
        let embeddings = self
            .embeddings
            .ok_or(ArtifactError::MissingSection("embeddings"))?;
        let vocabularies = self
            .vocabularies
            .ok_or(ArtifactError::MissingSection("encoders"))?;

        let metadata = ArtifactMetadata {
            conversation_count: conversations.len(),
            symptom_count: rules.symptoms.len(),
            condition_count: rules.conditions.len(),
            department_count: rules.departments.len(),
        };
        let encoders = vocabularies
            .iter()
            .map(|vocab| (vocab.axis().to_string(), EncoderSummary::from(vocab)))
            .collect();
        let embeddings = embeddings
            .into_iter()
            .map(|(name, embedding)| (name, embedding.vector))
            .collect();

        Ok(TrainingArtifact {
            conversations,
            rules,
            embeddings,
            encoders,
            metadata,
        })
    }
}

pub fn assemble_artifact(
    conversations: Vec<Conversation>,
    rules: RuleMaps,
    embeddings: Embeddings,
    vocabularies: Vocabularies,
) -> Result<TrainingArtifact, ArtifactError> {
    let artifact = ArtifactBuilder::new()
        .conversations(conversations)
        .rules(rules)
        .embeddings(embeddings)
        .vocabularies(vocabularies)
        .build()?;
    tracing::info!(
        conversations = artifact.metadata.conversation_count,
        symptoms = artifact.metadata.symptom_count,
        conditions = artifact.metadata.condition_count,
        departments = artifact.metadata.department_count,
        "Training artifact assembled"
    );
    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConversationRecord, ConversationType, Symptom, SymptomRecord};
    use crate::pipeline::encoding::build_encodings;
    use crate::pipeline::rules::build_rule_maps;

    fn sample_artifact() -> TrainingArtifact {
        let symptoms = [Symptom::try_from(SymptomRecord {
            symptom_id: 1,
            symptom_name: "đau đầu".into(),
            priority_level: "mild".into(),
            related_conditions: vec!["cảm lạnh".into()],
        })
        .unwrap()];
        let conversation = Conversation::tagged(
            ConversationRecord {
                instruction: "Tôi bị đau đầu".into(),
                input: String::new(),
                output: "Bạn nên nghỉ ngơi".into(),
            },
            ConversationType::Medical,
        );
        let (embeddings, vocabs) = build_encodings(&symptoms).unwrap();
        assemble_artifact(
            vec![conversation],
            build_rule_maps(&symptoms, &[], &[]),
            embeddings,
            vocabs,
        )
        .unwrap()
    }

    #[test]
    fn metadata_counts_sections() {
        let artifact = sample_artifact();
        assert_eq!(
            artifact.metadata,
            ArtifactMetadata {
                conversation_count: 1,
                symptom_count: 1,
                condition_count: 0,
                department_count: 0,
            }
        );
        assert_eq!(artifact.embeddings["đau đầu"], [0, 0]);
        assert_eq!(artifact.encoders["severity"].classes, ["mild"]);
        assert_eq!(artifact.encoders["conditions"].count, 1);
    }

    #[test]
    fn serialized_shape() {
        let value = serde_json::to_value(sample_artifact()).unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, REQUIRED_SECTIONS);
        assert_eq!(value["metadata"]["conversationCount"], 1);
        assert_eq!(value["conversations"][0]["conversation_type"], "medical");
    }

    #[test]
    fn builder_reports_missing_section() {
        let err = ArtifactBuilder::new()
            .conversations(vec![])
            .rules(RuleMaps::default())
            .build()
            .unwrap_err();
        assert_eq!(err, ArtifactError::MissingSection("embeddings"));
    }

    #[test]
    fn read_back_round_trip() {
        let artifact = sample_artifact();
        let value = serde_json::to_value(&artifact).unwrap();
        assert_eq!(TrainingArtifact::from_json(&value).unwrap(), artifact);
    }

    #[test]
    fn read_back_names_first_missing_section() {
        let mut value = serde_json::to_value(sample_artifact()).unwrap();
        let object = value.as_object_mut().unwrap();
        object.remove("encoders");
        object.remove("metadata");
        assert_eq!(
            TrainingArtifact::from_json(&value).unwrap_err(),
            ArtifactError::MissingSection("encoders")
        );
    }

    #[test]
    fn read_back_rejects_non_object() {
        assert_eq!(
            TrainingArtifact::from_json(&serde_json::json!([])).unwrap_err(),
            ArtifactError::NotAnObject
        );
    }
}
