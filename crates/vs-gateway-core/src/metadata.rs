//! Metadata maps attached to vector stores and files

use crate::limits::ValidationLimits;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Message returned by [`explain_metadata`] when no specific rule is violated
pub const GENERIC_METADATA_MESSAGE: &str = "invalid metadata";

/// Validated string-to-string metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MetadataMap(BTreeMap<String, String>);

impl MetadataMap {
    /// Validate and convert with the default limits
    pub fn from_value(value: &Value) -> Result<Self, MetadataViolation> {
        parse_map(value, &ValidationLimits::DEFAULT)
    }

    pub fn from_value_with(value: &Value, limits: &ValidationLimits) -> Result<Self, MetadataViolation> {
        parse_map(value, limits)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<'de> Deserialize<'de> for MetadataMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).map_err(serde::de::Error::custom)
    }
}

/// A single violated metadata rule
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataViolation {
    #[error("metadata must be an object of string keys to string values")]
    NotObject,

    #[error("metadata must not have more than {limit} entries (got {actual})")]
    TooManyEntries { limit: usize, actual: usize },

    #[error("metadata key '{key}' exceeds {limit} characters")]
    KeyTooLong { key: String, limit: usize },

    #[error("metadata value for key '{key}' must be a string")]
    ValueNotString { key: String },

    #[error("metadata value for key '{key}' exceeds {limit} characters")]
    ValueTooLong { key: String, limit: usize },
}

/// Keys are echoed back in messages; keep the echo bounded
fn truncate_key(key: &str, limit: usize) -> String {
    if key.chars().count() <= limit {
        key.to_string()
    } else {
        let head: String = key.chars().take(limit).collect();
        format!("{head}...")
    }
}

fn parse_map(value: &Value, limits: &ValidationLimits) -> Result<MetadataMap, MetadataViolation> {
    let obj = value.as_object().ok_or(MetadataViolation::NotObject)?;

    if obj.len() > limits.max_metadata_entries {
        return Err(MetadataViolation::TooManyEntries {
            limit: limits.max_metadata_entries,
            actual: obj.len(),
        });
    }

    let mut out = BTreeMap::new();
    for (key, value) in obj {
        if key.chars().count() > limits.max_metadata_key_chars {
            return Err(MetadataViolation::KeyTooLong {
                key: truncate_key(key, limits.max_metadata_key_chars),
                limit: limits.max_metadata_key_chars,
            });
        }
        let text = value
            .as_str()
            .ok_or_else(|| MetadataViolation::ValueNotString { key: key.clone() })?;
        if text.chars().count() > limits.max_metadata_value_chars {
            return Err(MetadataViolation::ValueTooLong {
                key: key.clone(),
                limit: limits.max_metadata_value_chars,
            });
        }
        out.insert(key.clone(), text.to_string());
    }

    Ok(MetadataMap(out))
}

/// Check an optional metadata payload; absence and `null` are valid
pub fn validate_metadata(map: Option<&Value>) -> bool {
    validate_metadata_with(map, &ValidationLimits::DEFAULT)
}

pub fn validate_metadata_with(map: Option<&Value>, limits: &ValidationLimits) -> bool {
    match map {
        None | Some(Value::Null) => true,
        Some(value) => parse_map(value, limits).is_ok(),
    }
}

/// Most specific violated rule for `map`, or a generic message
pub fn explain_metadata(map: Option<&Value>) -> String {
    explain_metadata_with(map, &ValidationLimits::DEFAULT)
}

pub fn explain_metadata_with(map: Option<&Value>, limits: &ValidationLimits) -> String {
    match map {
        None | Some(Value::Null) => GENERIC_METADATA_MESSAGE.to_string(),
        Some(value) => match parse_map(value, limits) {
            Err(violation) => violation.to_string(),
            Ok(_) => GENERIC_METADATA_MESSAGE.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn map_with(entries: usize) -> Value {
        let mut m = Map::new();
        for i in 0..entries {
            m.insert(format!("k{i}"), Value::String("v".into()));
        }
        Value::Object(m)
    }

    #[test]
    fn absent_and_null_are_valid() {
        assert!(validate_metadata(None));
        assert!(validate_metadata(Some(&Value::Null)));
    }

    #[test]
    fn entry_count_limit() {
        assert!(validate_metadata(Some(&map_with(16))));
        let over = map_with(17);
        assert!(!validate_metadata(Some(&over)));
        assert_eq!(
            explain_metadata(Some(&over)),
            "metadata must not have more than 16 entries (got 17)"
        );
    }

    #[test]
    fn seventeen_entries_fail_before_content_checks() {
        let mut m = Map::new();
        for i in 0..17 {
            m.insert(format!("k{i}"), json!(i));
        }
        assert_eq!(
            explain_metadata(Some(&Value::Object(m))),
            "metadata must not have more than 16 entries (got 17)"
        );
    }

    #[test]
    fn key_length_limit() {
        let ok = json!({ "a".repeat(64): "v" });
        assert!(validate_metadata(Some(&ok)));

        let long = json!({ "a".repeat(65): "v" });
        assert!(!validate_metadata(Some(&long)));
        assert_eq!(
            explain_metadata(Some(&long)),
            format!("metadata key '{}...' exceeds 64 characters", "a".repeat(64))
        );
    }

    #[test]
    fn lengths_count_characters_not_bytes() {
        let key = "é".repeat(64);
        let value = "ü".repeat(512);
        assert!(validate_metadata(Some(&json!({ key: value }))));
    }

    #[test]
    fn value_length_limit() {
        assert!(validate_metadata(Some(&json!({"k": "x".repeat(512)}))));
        let long = json!({"k": "x".repeat(513)});
        assert_eq!(
            explain_metadata(Some(&long)),
            "metadata value for key 'k' exceeds 512 characters"
        );
    }

    #[test]
    fn non_string_values_rejected() {
        for v in [json!(1), json!(true), json!(null), json!({"a": "b"}), json!(["a"])] {
            let m = json!({"k": v});
            assert!(!validate_metadata(Some(&m)));
            assert_eq!(
                explain_metadata(Some(&m)),
                "metadata value for key 'k' must be a string"
            );
        }
    }

    #[test]
    fn arrays_and_scalars_rejected() {
        for v in [json!(["a", "b"]), json!("a"), json!(3)] {
            assert_eq!(
                explain_metadata(Some(&v)),
                "metadata must be an object of string keys to string values"
            );
        }
    }

    #[test]
    fn typed_map_round_trip() {
        let raw = json!({"team": "search", "env": "prod"});
        let map = MetadataMap::from_value(&raw).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("team"), Some("search"));
        assert_eq!(serde_json::to_value(&map).unwrap(), raw);

        let err = serde_json::from_value::<MetadataMap>(json!({"n": 1})).unwrap_err();
        assert!(err.to_string().contains("must be a string"));
    }

    #[test]
    fn explain_is_idempotent() {
        let m = json!({"k": 5});
        assert_eq!(explain_metadata(Some(&m)), explain_metadata(Some(&m)));
        assert_eq!(validate_metadata(Some(&m)), validate_metadata(Some(&m)));
    }
}
