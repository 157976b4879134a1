use serde::{Deserialize, Serialize};

use crate::vector::Vector;

/// Identifier assigned by the embedding store on insert
pub type ExampleId = i64;

/// A dysfunctional text and its functional rewrite.
///
/// Serialized with the `dysfunctional` / `functional` keys used by the
/// exported JSON and CSV datasets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExamplePair {
    #[serde(rename = "dysfunctional", alias = "dysfunctional_text")]
    pub dysfunctional_text: String,
    #[serde(rename = "functional", alias = "functional_text")]
    pub functional_text: String,
}

impl ExamplePair {
    pub fn new(dysfunctional_text: impl Into<String>, functional_text: impl Into<String>) -> Self {
        Self {
            dysfunctional_text: dysfunctional_text.into(),
            functional_text: functional_text.into(),
        }
    }
}

/// One record parsed from a generation response.
///
/// `functional_text` is absent when the record came from a dysfunctional-only run
/// and has not been rewritten yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneratedRecord {
    #[serde(rename = "dysfunctional", alias = "dysfunctional_text")]
    pub dysfunctional_text: String,
    #[serde(
        rename = "functional",
        alias = "functional_text",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub functional_text: Option<String>,
}

impl GeneratedRecord {
    /// The complete pair, when the functional side is present
    pub fn to_pair(&self) -> Option<ExamplePair> {
        self.functional_text
            .as_ref()
            .map(|functional| ExamplePair::new(self.dysfunctional_text.clone(), functional.clone()))
    }
}

impl From<ExamplePair> for GeneratedRecord {
    fn from(pair: ExamplePair) -> Self {
        Self {
            dysfunctional_text: pair.dysfunctional_text,
            functional_text: Some(pair.functional_text),
        }
    }
}

/// A pair plus the embedding of its dysfunctional text, ready for insertion
#[derive(Debug, Clone, PartialEq)]
pub struct NewExample {
    pub pair: ExamplePair,
    pub embedding: Vector,
}

impl NewExample {
    pub fn new(pair: ExamplePair, embedding: impl Into<Vector>) -> Self {
        Self {
            pair,
            embedding: embedding.into(),
        }
    }
}

/// A stored corpus entry
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    pub id: ExampleId,
    pub dysfunctional_text: String,
    pub functional_text: String,
    pub embedding: Vector,
}

impl Example {
    /// Drop the embedding payload, keeping only the text pair
    pub fn into_pair(self) -> ExamplePair {
        ExamplePair {
            dysfunctional_text: self.dysfunctional_text,
            functional_text: self.functional_text,
        }
    }
}

/// Ranked examples with their similarity scores, highest first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievalResult {
    pub examples: Vec<ExamplePair>,
    pub scores: Vec<f32>,
}

impl RetrievalResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Iterate `(pair, score)` in rank order
    pub fn iter(&self) -> impl Iterator<Item = (&ExamplePair, f32)> {
        self.examples.iter().zip(self.scores.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_uses_dataset_keys() {
        let pair = ExamplePair::new("You never help.", "I'd appreciate some help.");
        let json = serde_json::to_value(&pair).unwrap();
        assert_eq!(json["dysfunctional"], "You never help.");
        assert_eq!(json["functional"], "I'd appreciate some help.");
    }

    #[test]
    fn test_pair_accepts_long_keys() {
        let pair: ExamplePair = serde_json::from_str(
            r#"{"dysfunctional_text": "a", "functional_text": "b"}"#,
        )
        .unwrap();
        assert_eq!(pair, ExamplePair::new("a", "b"));
    }

    #[test]
    fn test_generated_record_without_functional() {
        let record: GeneratedRecord =
            serde_json::from_str(r#"{"dysfunctional": "You're useless."}"#).unwrap();
        assert_eq!(record.functional_text, None);
        assert_eq!(record.to_pair(), None);
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"dysfunctional":"You're useless."}"#
        );
    }

    #[test]
    fn test_into_pair_strips_embedding() {
        let example = Example {
            id: 7,
            dysfunctional_text: "a".to_string(),
            functional_text: "b".to_string(),
            embedding: Vector::new(vec![1.0]),
        };
        assert_eq!(example.into_pair(), ExamplePair::new("a", "b"));
    }
}
