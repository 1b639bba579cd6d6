//! Caller-supplied prediction inputs.
//!
//! A [`PredictionInput`] is an insertion-ordered map of feature name to an
//! already-numeric value. Yes/no style answers are coerced to `1.0`/`0.0`
//! here, before the aligner ever sees them.

use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};

use crate::error::InputError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionInput {
    entries: IndexMap<String, f64>,
}

impl PredictionInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `value`. A name that is already present keeps its
    /// original position and takes the new value.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.entries.insert(name.into(), value);
    }

    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in the order they were first supplied.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.entries.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.values().copied()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for PredictionInput {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut input = PredictionInput::new();
        for (name, value) in iter {
            input.insert(name, value);
        }
        input
    }
}

/// Maps a yes/no style answer onto `1.0` / `0.0`.
pub fn coerce_flag(raw: &str) -> Result<f64, InputError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" | "1" => Ok(1.0),
        "no" | "n" | "false" | "0" => Ok(0.0),
        _ => Err(InputError::InvalidFlag(raw.to_string())),
    }
}

/// Parses a single free-form cell: a number if it looks like one, otherwise
/// a yes/no flag.
pub fn coerce_text(raw: &str) -> Result<f64, InputError> {
    match raw.trim().parse::<f64>() {
        Ok(value) => Ok(value),
        Err(_) => coerce_flag(raw),
    }
}

/// A raw JSON value accepted for a feature.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Number(f64),
    Flag(bool),
    Text(String),
}

impl InputValue {
    pub fn coerce(&self) -> Result<f64, InputError> {
        match self {
            InputValue::Number(value) => Ok(*value),
            InputValue::Flag(true) => Ok(1.0),
            InputValue::Flag(false) => Ok(0.0),
            InputValue::Text(text) => coerce_text(text),
        }
    }
}

impl<'de> Deserialize<'de> for PredictionInput {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct InputVisitor;

        impl<'de> Visitor<'de> for InputVisitor {
            type Value = PredictionInput;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping feature names to numbers or yes/no values")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut input = PredictionInput::new();
                while let Some((name, raw)) = map.next_entry::<String, InputValue>()? {
                    let value = raw
                        .coerce()
                        .map_err(|err| de::Error::custom(format!("{}: {}", name, err)))?;
                    input.insert(name, value);
                }
                Ok(input)
            }
        }

        deserializer.deserialize_map(InputVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_first_position() {
        let mut input = PredictionInput::new();
        input.insert("A", 1.0);
        input.insert("B", 2.0);
        input.insert("A", 3.0);

        let entries: Vec<_> = input.iter().collect();
        assert_eq!(entries, vec![("A", 3.0), ("B", 2.0)]);
    }

    #[test]
    fn test_large_input_keeps_order() {
        let count = 100_000;
        let mut input: PredictionInput =
            (0..count).map(|i| (format!("feature_{}", i), i as f64)).collect();
        input.insert("feature_0", -1.0);

        assert_eq!(input.len(), count);
        assert_eq!(input.get("feature_0"), Some(-1.0));
        assert_eq!(input.get("feature_99999"), Some(99_999.0));
        assert_eq!(input.iter().next(), Some(("feature_0", -1.0)));
        assert_eq!(input.iter().last(), Some(("feature_99999", 99_999.0)));
    }

    #[test]
    fn test_coerce_flag() {
        assert_eq!(coerce_flag("Yes"), Ok(1.0));
        assert_eq!(coerce_flag(" no "), Ok(0.0));
        assert_eq!(coerce_flag("TRUE"), Ok(1.0));
        assert!(coerce_flag("maybe").is_err());
    }

    #[test]
    fn test_deserialize_preserves_order_and_coerces() {
        let input: PredictionInput = serde_json::from_str(
            r#"{"Scholarship_holder": "Yes", "Age_at_enrollment": 19, "Debtor": false, "Grade": "12.5"}"#,
        )
        .unwrap();

        let entries: Vec<_> = input.iter().collect();
        assert_eq!(
            entries,
            vec![
                ("Scholarship_holder", 1.0),
                ("Age_at_enrollment", 19.0),
                ("Debtor", 0.0),
                ("Grade", 12.5),
            ]
        );
    }

    #[test]
    fn test_deserialize_rejects_unknown_text() {
        let result: Result<PredictionInput, _> = serde_json::from_str(r#"{"Gender": "Other"}"#);
        assert!(result.is_err());
    }
}
