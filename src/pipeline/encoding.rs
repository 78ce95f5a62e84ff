//! Categorical encodings for symptoms.
//!
//! Two passes, never interleaved:
//! 1. Fit: collect the distinct severity labels and related-condition names
//!    over the whole symptom collection into sorted vocabularies.
//! 2. Encode: for each symptom, emit `[severity code, condition codes...]`,
//!    condition codes in the symptom's own related-conditions order.
//!
//! Codes are ranks in sorted order, so they depend only on which values
//! occur, never on the order symptoms arrive in.

use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Symptom;

pub const SEVERITY_AXIS: &str = "severity";
pub const CONDITIONS_AXIS: &str = "conditions";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("Value '{value}' was not seen while fitting the '{axis}' vocabulary")]
    UnseenCategory { axis: String, value: String },
}

/// Sorted distinct values of one categorical axis and their integer codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    axis: String,
    classes: Vec<String>,
    codes: BTreeMap<String, u32>,
}

impl Vocabulary {
    pub fn fit<I, S>(axis: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let classes: Vec<String> = values
            .into_iter()
            .map(Into::into)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let codes = classes
            .iter()
            .zip(0u32..)
            .map(|(class, code)| (class.clone(), code))
            .collect();
        Self {
            axis: axis.to_string(),
            classes,
            codes,
        }
    }

    pub fn axis(&self) -> &str {
        &self.axis
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn encode(&self, value: &str) -> Result<u32, EncodingError> {
        self.codes
            .get(value)
            .copied()
            .ok_or_else(|| EncodingError::UnseenCategory {
                axis: self.axis.clone(),
                value: value.to_string(),
            })
    }
}

/// Both fitted axes. Immutable once fitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabularies {
    pub severity: Vocabulary,
    pub conditions: Vocabulary,
}

impl Vocabularies {
    /// Pass 1.
    pub fn fit(symptoms: &[Symptom]) -> Self {
        let severity = Vocabulary::fit(SEVERITY_AXIS, symptoms.iter().map(|s| s.priority_level()));
        let conditions = Vocabulary::fit(
            CONDITIONS_AXIS,
            symptoms
                .iter()
                .flat_map(|s| s.related_conditions().iter().map(String::as_str)),
        );
        tracing::debug!(
            severity = severity.len(),
            conditions = conditions.len(),
            "Vocabularies fitted"
        );
        Self {
            severity,
            conditions,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vocabulary> {
        [&self.severity, &self.conditions].into_iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomEmbedding {
    pub symptom_id: i64,
    pub name: String,
    pub severity_encoded: u32,
    pub conditions_encoded: Vec<u32>,
    pub vector: Vec<u32>,
}

impl SymptomEmbedding {
    fn encode(symptom: &Symptom, vocabularies: &Vocabularies) -> Result<Self, EncodingError> {
        let severity_encoded = vocabularies.severity.encode(symptom.priority_level())?;
        let conditions_encoded = symptom
            .related_conditions()
            .iter()
            .map(|c| vocabularies.conditions.encode(c))
            .collect::<Result<Vec<_>, _>>()?;
        let vector = std::iter::once(severity_encoded)
            .chain(conditions_encoded.iter().copied())
            .collect();
        Ok(Self {
            symptom_id: symptom.id(),
            name: symptom.name().to_string(),
            severity_encoded,
            conditions_encoded,
            vector,
        })
    }
}

/// Per-symptom embeddings keyed by canonical symptom name, in input order.
pub type Embeddings = IndexMap<String, SymptomEmbedding>;

/// Pass 2. Fails on the first symptom, in input order, holding a value the
/// vocabularies do not know.
pub fn encode_symptoms(
    symptoms: &[Symptom],
    vocabularies: &Vocabularies,
) -> Result<Embeddings, EncodingError> {
    let encoded: Vec<Result<SymptomEmbedding, EncodingError>> = symptoms
        .par_iter()
        .map(|s| SymptomEmbedding::encode(s, vocabularies))
        .collect();

    let mut embeddings = Embeddings::with_capacity(encoded.len());
    for embedding in encoded {
        let embedding = embedding?;
        embeddings.insert(embedding.name.clone(), embedding);
    }
    Ok(embeddings)
}

/// Fit on `symptoms`, then encode them.
pub fn build_encodings(symptoms: &[Symptom]) -> Result<(Embeddings, Vocabularies), EncodingError> {
    let vocabularies = Vocabularies::fit(symptoms);
    let embeddings = encode_symptoms(symptoms, &vocabularies)?;
    Ok((embeddings, vocabularies))
}
