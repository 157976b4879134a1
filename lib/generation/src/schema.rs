//! Record schema validation for raw generation output.

use reframe_core::{GeneratedRecord, GenerationMode};
use serde_json::{Map, Value};
use thiserror::Error;

const DYSFUNCTIONAL_KEYS: [&str; 2] = ["dysfunctional", "dysfunctional_text"];
const FUNCTIONAL_KEYS: [&str; 2] = ["functional", "functional_text"];

/// Why a raw response did not match the expected record schema
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Malformed JSON: {0}")]
    Malformed(String),

    #[error("Response is not a JSON array")]
    NotArray,

    #[error("Record {index} is not a JSON object")]
    NotObject { index: usize },

    #[error("Record {index} is missing `{field}`")]
    MissingField { index: usize, field: &'static str },

    #[error("Record {index} has an empty `{field}`")]
    EmptyField { index: usize, field: &'static str },
}

/// Parse a raw response into records for `mode`.
///
/// The response must be a JSON array of objects. Every object needs a
/// non-empty `dysfunctional` string; in [`GenerationMode::Pairs`] it also needs
/// a non-empty `functional` string. The `_text` key spellings are accepted too.
/// An empty array is valid and yields no records.
pub fn parse_records(raw: &str, mode: GenerationMode) -> Result<Vec<GeneratedRecord>, ValidationError> {
    let value: Value =
        serde_json::from_str(raw.trim()).map_err(|e| ValidationError::Malformed(e.to_string()))?;
    let items = match value {
        Value::Array(items) => items,
        _ => return Err(ValidationError::NotArray),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let Value::Object(object) = item else {
                return Err(ValidationError::NotObject { index });
            };
            let dysfunctional = required_text(&object, index, &DYSFUNCTIONAL_KEYS)?;
            let functional = match mode {
                GenerationMode::Pairs => Some(required_text(&object, index, &FUNCTIONAL_KEYS)?),
                GenerationMode::DysfunctionalOnly => optional_text(&object, &FUNCTIONAL_KEYS),
            };
            Ok(GeneratedRecord {
                dysfunctional_text: dysfunctional,
                functional_text: functional,
            })
        })
        .collect()
}

fn lookup<'a>(object: &'a Map<String, Value>, keys: &[&'static str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| object.get(*key))
}

fn required_text(
    object: &Map<String, Value>,
    index: usize,
    keys: &[&'static str],
) -> Result<String, ValidationError> {
    let field = keys[0];
    match lookup(object, keys) {
        Some(Value::String(text)) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        Some(Value::String(_)) => Err(ValidationError::EmptyField { index, field }),
        _ => Err(ValidationError::MissingField { index, field }),
    }
}

fn optional_text(object: &Map<String, Value>, keys: &[&'static str]) -> Option<String> {
    match lookup(object, keys) {
        Some(Value::String(text)) if !text.trim().is_empty() => Some(text.trim().to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairs() {
        let raw = r#"
            [
                {"dysfunctional": "You never listen.", "functional": "I'd like to be heard."},
                {"dysfunctional_text": "Typical of you.", "functional_text": "Can we talk about it?"}
            ]
        "#;
        let records = parse_records(raw, GenerationMode::Pairs).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].dysfunctional_text, "You never listen.");
        assert_eq!(records[1].functional_text.as_deref(), Some("Can we talk about it?"));
    }

    #[test]
    fn test_pairs_require_functional() {
        let raw = r#"[{"dysfunctional": "You never listen."}]"#;
        assert_eq!(
            parse_records(raw, GenerationMode::Pairs),
            Err(ValidationError::MissingField { index: 0, field: "functional" })
        );
    }

    #[test]
    fn test_dysfunctional_only() {
        let raw = r#"[{"dysfunctional": "You never listen."}, {"dysfunctional": "Whatever."}]"#;
        let records = parse_records(raw, GenerationMode::DysfunctionalOnly).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.functional_text.is_none()));
    }

    #[test]
    fn test_empty_array_is_valid() {
        assert_eq!(parse_records(" [] ", GenerationMode::Pairs), Ok(Vec::new()));
    }

    #[test]
    fn test_rejections() {
        let mode = GenerationMode::Pairs;
        assert!(matches!(
            parse_records("Sure! Here are your pairs:", mode),
            Err(ValidationError::Malformed(_))
        ));
        assert_eq!(
            parse_records(r#"{"dysfunctional": "a", "functional": "b"}"#, mode),
            Err(ValidationError::NotArray)
        );
        assert_eq!(
            parse_records(r#"["just a string"]"#, mode),
            Err(ValidationError::NotObject { index: 0 })
        );
        assert_eq!(
            parse_records(r#"[{"dysfunctional": "  ", "functional": "b"}]"#, mode),
            Err(ValidationError::EmptyField { index: 0, field: "dysfunctional" })
        );
        assert_eq!(
            parse_records(r#"[{"dysfunctional": 3, "functional": "b"}]"#, mode),
            Err(ValidationError::MissingField { index: 0, field: "dysfunctional" })
        );
    }

    #[test]
    fn test_trailing_comma_is_malformed() {
        let raw = r#"[{"dysfunctional": "a", "functional": "b"},]"#;
        assert!(matches!(
            parse_records(raw, GenerationMode::Pairs),
            Err(ValidationError::Malformed(_))
        ));
    }
}
