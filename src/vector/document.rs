//! Record-to-text preparation for embedding.
//!
//! Many embedding models are influenced by term frequency, so field importance
//! is approximated by repeating each field's text proportionally to its
//! weight. The repetition trick lives entirely behind this module; replacing
//! it with real weighted pooling would not touch the rest of the pipeline.

use std::collections::HashMap;

/// Scale constant: a field with weight `w` is repeated `ceil(w * 10)` times.
const REPEAT_SCALE: f32 = 10.0;

/// A named text field extracted from a record, in stable field order
#[derive(Debug, Clone)]
pub struct WeightedField {
    pub name: &'static str,
    pub text: String,
}

impl WeightedField {
    pub fn new(name: &'static str, text: impl Into<String>) -> Self {
        Self {
            name,
            text: text.into(),
        }
    }
}

/// Per-field importance coefficients in [0, 1], global per record type
#[derive(Debug, Clone, Default)]
pub struct FieldWeights {
    weights: HashMap<&'static str, f32>,
}

impl FieldWeights {
    pub fn new(weights: &[(&'static str, f32)]) -> Self {
        Self {
            weights: weights.iter().copied().collect(),
        }
    }

    pub fn get(&self, name: &str) -> f32 {
        self.weights.get(name).copied().unwrap_or(0.0)
    }
}

/// Turn a record's weighted fields into a single text blob for embedding.
///
/// Deterministic: the same fields and weights always produce a byte-identical
/// string, which is what makes re-embedding idempotent. Fields that are empty
/// or carry zero weight contribute nothing. An empty result must be rejected
/// by the caller with `VectorError::EmptyContent` before any remote call.
pub fn prepare(fields: &[WeightedField], weights: &FieldWeights) -> String {
    let mut parts: Vec<&str> = Vec::new();

    for field in fields {
        let text = field.text.trim();
        if text.is_empty() {
            continue;
        }

        let repeats = (weights.get(field.name) * REPEAT_SCALE).ceil() as usize;
        for _ in 0..repeats {
            parts.push(text);
        }
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights() -> FieldWeights {
        FieldWeights::new(&[("title", 0.5), ("description", 0.3), ("tags", 0.2)])
    }

    #[test]
    fn test_repetition_follows_weight() {
        let fields = vec![
            WeightedField::new("title", "pool exhausted"),
            WeightedField::new("description", "nightly batch"),
        ];

        let text = prepare(&fields, &weights());

        // title: ceil(0.5 * 10) = 5 repeats, description: ceil(0.3 * 10) = 3
        assert_eq!(text.matches("pool exhausted").count(), 5);
        assert_eq!(text.matches("nightly batch").count(), 3);
        // stable field order: all title repeats precede the description
        assert!(text.find("pool exhausted").unwrap() < text.find("nightly batch").unwrap());
    }

    #[test]
    fn test_deterministic_output() {
        let fields = vec![
            WeightedField::new("title", "redis latency"),
            WeightedField::new("tags", "cache redis"),
        ];
        let w = weights();

        assert_eq!(prepare(&fields, &w), prepare(&fields, &w));
    }

    #[test]
    fn test_missing_and_empty_fields_contribute_nothing() {
        let fields = vec![
            WeightedField::new("title", "   "),
            WeightedField::new("description", ""),
        ];
        assert_eq!(prepare(&fields, &weights()), "");

        // Field without a configured weight repeats zero times
        let unknown = vec![WeightedField::new("comments", "lots of text")];
        assert_eq!(prepare(&unknown, &weights()), "");
    }

    #[test]
    fn test_fractional_weight_rounds_up() {
        let w = FieldWeights::new(&[("title", 0.05)]);
        let fields = vec![WeightedField::new("title", "x")];
        // ceil(0.05 * 10) = 1: even a lightly weighted field appears once
        assert_eq!(prepare(&fields, &w), "x");
    }
}
