//! Tolerant lookup of a record list inside loosely shaped input files.
//!
//! Upstream exports disagree on shape: some are a bare array, some wrap the
//! array under the collection name, a plural of it, `data` or `items`.

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    #[error("No list found for '{expected}'; available keys: {available:?}")]
    NoList {
        expected: String,
        available: Vec<String>,
    },

    #[error("Expected a list or an object for '{expected}', got {found}")]
    UnsupportedShape {
        expected: String,
        found: &'static str,
    },
}

/// Keys tried after the expected key and its plural.
const FALLBACK_KEYS: &[&str] = &["data", "items"];

/// The two payload shapes a collection file may take.
#[derive(Debug, Clone, Copy)]
pub enum RawPayload<'a> {
    Sequence(&'a [Value]),
    KeyedContainer(&'a Map<String, Value>),
}

impl<'a> RawPayload<'a> {
    /// Classify a JSON value; scalars and null are not payloads.
    pub fn classify(value: &'a Value, expected_key: &str) -> Result<Self, ExtractionError> {
        match value {
            Value::Array(items) => Ok(Self::Sequence(items)),
            Value::Object(map) => Ok(Self::KeyedContainer(map)),
            other => Err(ExtractionError::UnsupportedShape {
                expected: expected_key.to_string(),
                found: json_type_name(other),
            }),
        }
    }
}

/// Find the record list for `expected_key` inside `payload`.
///
/// Search order for keyed containers: `expected_key`, `expected_key + "s"`,
/// `data`, `items`, then the first array-valued field in document order.
pub fn extract_list<'a>(
    payload: &'a Value,
    expected_key: &str,
) -> Result<&'a [Value], ExtractionError> {
    match RawPayload::classify(payload, expected_key)? {
        RawPayload::Sequence(items) => Ok(items),
        RawPayload::KeyedContainer(map) => find_in_container(map, expected_key),
    }
}

/// Like [`extract_list`], but a keyed container must hold the list under one
/// of the named keys. No first-array fallback.
pub fn extract_named_list<'a>(
    payload: &'a Value,
    expected_key: &str,
) -> Result<&'a [Value], ExtractionError> {
    match RawPayload::classify(payload, expected_key)? {
        RawPayload::Sequence(items) => Ok(items),
        RawPayload::KeyedContainer(map) => {
            named_list(map, expected_key).ok_or_else(|| no_list(map, expected_key))
        }
    }
}

fn named_list<'a>(map: &'a Map<String, Value>, expected_key: &str) -> Option<&'a [Value]> {
    let plural = format!("{expected_key}s");
    let found = [expected_key, plural.as_str()]
        .into_iter()
        .chain(FALLBACK_KEYS.iter().copied())
        .find_map(|key| map.get(key).and_then(Value::as_array))
        .map(Vec::as_slice);
    found
}

fn no_list(map: &Map<String, Value>, expected_key: &str) -> ExtractionError {
    ExtractionError::NoList {
        expected: expected_key.to_string(),
        available: map.keys().cloned().collect(),
    }
}

fn find_in_container<'a>(
    map: &'a Map<String, Value>,
    expected_key: &str,
) -> Result<&'a [Value], ExtractionError> {
    if let Some(items) = named_list(map, expected_key) {
        return Ok(items);
    }

    if let Some(items) = map.values().find_map(Value::as_array) {
        tracing::debug!(
            expected = expected_key,
            "No named list found, using first array-valued field"
        );
        return Ok(items.as_slice());
    }

    Err(no_list(map, expected_key))
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
