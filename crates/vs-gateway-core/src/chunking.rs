//! Chunking policies for files added to a vector store
//!
//! Wire shape accepted from callers:
//!
//! ```text
//! { "type": "auto" }
//! { "type": "static", "static": { "maxTokens": 800, "overlapTokens": 400 } }
//! ```

use crate::limits::ValidationLimits;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Message returned by [`explain_chunking`] when no specific rule is violated
pub const GENERIC_CHUNKING_MESSAGE: &str = "invalid chunking_strategy";

/// Token bounds for the static policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StaticChunking {
    #[serde(rename = "maxTokens")]
    pub max_tokens: u32,
    #[serde(rename = "overlapTokens")]
    pub overlap_tokens: u32,
}

/// How source content is split before indexing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChunkingPolicy {
    /// Provider picks the chunk size
    Auto,
    Static {
        #[serde(rename = "static")]
        config: StaticChunking,
    },
}

impl ChunkingPolicy {
    /// Validate and convert with the default limits
    pub fn from_value(value: &Value) -> Result<Self, ChunkingViolation> {
        parse_policy(value, &ValidationLimits::DEFAULT)
    }

    /// Validate and convert with explicit limits
    pub fn from_value_with(value: &Value, limits: &ValidationLimits) -> Result<Self, ChunkingViolation> {
        parse_policy(value, limits)
    }

    /// Render in the provider's field names
    pub fn to_provider_value(&self) -> Value {
        match self {
            Self::Auto => json!({ "type": "auto" }),
            Self::Static { config } => json!({
                "type": "static",
                "static": {
                    "max_chunk_size_tokens": config.max_tokens,
                    "chunk_overlap_tokens": config.overlap_tokens,
                }
            }),
        }
    }
}

impl<'de> Deserialize<'de> for ChunkingPolicy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).map_err(serde::de::Error::custom)
    }
}

/// A single violated chunking rule
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkingViolation {
    #[error("chunking_strategy must be an object")]
    NotObject,

    #[error("chunking_strategy must have a string 'type' field")]
    MissingType,

    #[error("unsupported chunking_strategy type '{0}'; expected 'auto' or 'static'")]
    UnknownType(String),

    #[error("auto chunking_strategy must not contain additional fields (found '{0}')")]
    AutoExtraField(String),

    #[error("static chunking_strategy requires a 'static' object")]
    MissingStatic,

    #[error("static.maxTokens must be an integer")]
    MaxTokensNotInteger,

    /// `actual` is the number as the caller wrote it
    #[error("static.maxTokens must be between {min} and {max} (got {actual})")]
    MaxTokensOutOfRange { min: i64, max: i64, actual: String },

    #[error("static.overlapTokens must be an integer")]
    OverlapNotInteger,

    #[error("static.overlapTokens must be non-negative (got {0})")]
    OverlapNegative(String),

    #[error("static.overlapTokens must not exceed half of static.maxTokens ({limit}) (got {actual})")]
    OverlapTooLarge { limit: u32, actual: String },
}

/// JSON integer, including floats with no fractional part.
///
/// Floats beyond `i128` saturate; the result is only compared, never shown.
fn as_integer(value: &Value) -> Option<i128> {
    if let Some(i) = value.as_i64() {
        return Some(i.into());
    }
    if let Some(u) = value.as_u64() {
        return Some(u.into());
    }
    let f = value.as_f64()?;
    (f.is_finite() && f.fract() == 0.0).then(|| f as i128)
}

fn parse_policy(value: &Value, limits: &ValidationLimits) -> Result<ChunkingPolicy, ChunkingViolation> {
    let obj = value.as_object().ok_or(ChunkingViolation::NotObject)?;
    let ty = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ChunkingViolation::MissingType)?;

    match ty {
        "auto" => match obj.keys().find(|k| k.as_str() != "type") {
            Some(extra) => Err(ChunkingViolation::AutoExtraField(extra.clone())),
            None => Ok(ChunkingPolicy::Auto),
        },
        "static" => {
            let config = obj
                .get("static")
                .and_then(Value::as_object)
                .ok_or(ChunkingViolation::MissingStatic)?;

            let raw_max = config.get("maxTokens");
            let max_tokens = raw_max
                .and_then(as_integer)
                .ok_or(ChunkingViolation::MaxTokensNotInteger)?;
            let out_of_range = || ChunkingViolation::MaxTokensOutOfRange {
                min: limits.min_chunk_max_tokens,
                max: limits.max_chunk_max_tokens,
                actual: raw_max.map(Value::to_string).unwrap_or_default(),
            };
            if max_tokens < limits.min_chunk_max_tokens.into()
                || max_tokens > limits.max_chunk_max_tokens.into()
            {
                return Err(out_of_range());
            }
            let max_tokens = u32::try_from(max_tokens).map_err(|_| out_of_range())?;

            let raw_overlap = config.get("overlapTokens");
            let overlap_tokens = raw_overlap
                .and_then(as_integer)
                .ok_or(ChunkingViolation::OverlapNotInteger)?;
            let shown_overlap = || raw_overlap.map(Value::to_string).unwrap_or_default();
            if overlap_tokens < 0 {
                return Err(ChunkingViolation::OverlapNegative(shown_overlap()));
            }
            // Exactly half is allowed.
            let limit = max_tokens / 2;
            let overlap_tokens = u32::try_from(overlap_tokens)
                .ok()
                .filter(|overlap| *overlap <= limit)
                .ok_or_else(|| ChunkingViolation::OverlapTooLarge {
                    limit,
                    actual: shown_overlap(),
                })?;

            Ok(ChunkingPolicy::Static {
                config: StaticChunking {
                    max_tokens,
                    overlap_tokens,
                },
            })
        }
        other => Err(ChunkingViolation::UnknownType(other.to_string())),
    }
}

/// Check an optional chunking payload; absence is valid
pub fn validate_chunking(policy: Option<&Value>) -> bool {
    validate_chunking_with(policy, &ValidationLimits::DEFAULT)
}

pub fn validate_chunking_with(policy: Option<&Value>, limits: &ValidationLimits) -> bool {
    match policy {
        None => true,
        Some(value) => parse_policy(value, limits).is_ok(),
    }
}

/// Most specific violated rule for `policy`, or a generic message
pub fn explain_chunking(policy: Option<&Value>) -> String {
    explain_chunking_with(policy, &ValidationLimits::DEFAULT)
}

pub fn explain_chunking_with(policy: Option<&Value>, limits: &ValidationLimits) -> String {
    match policy.map(|value| parse_policy(value, limits)) {
        Some(Err(violation)) => violation.to_string(),
        _ => GENERIC_CHUNKING_MESSAGE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn static_policy(max: Value, overlap: Value) -> Value {
        json!({"type": "static", "static": {"maxTokens": max, "overlapTokens": overlap}})
    }

    #[test]
    fn absent_policy_is_valid() {
        assert!(validate_chunking(None));
    }

    #[test]
    fn auto_only_with_type_key() {
        assert!(validate_chunking(Some(&json!({"type": "auto"}))));

        let stray = json!({"type": "auto", "static": {"maxTokens": 800, "overlapTokens": 400}});
        assert!(!validate_chunking(Some(&stray)));
        assert_eq!(
            explain_chunking(Some(&stray)),
            "auto chunking_strategy must not contain additional fields (found 'static')"
        );

        let extra = json!({"type": "auto", "name": null});
        assert!(!validate_chunking(Some(&extra)));
    }

    #[test]
    fn static_overlap_boundary() {
        assert!(validate_chunking(Some(&static_policy(json!(800), json!(400)))));

        let over = static_policy(json!(800), json!(401));
        assert!(!validate_chunking(Some(&over)));
        assert_eq!(
            explain_chunking(Some(&over)),
            "static.overlapTokens must not exceed half of static.maxTokens (400) (got 401)"
        );
    }

    #[test]
    fn static_overlap_uses_floor_of_half() {
        assert!(validate_chunking(Some(&static_policy(json!(101), json!(50)))));
        assert!(!validate_chunking(Some(&static_policy(json!(101), json!(51)))));
    }

    #[test]
    fn static_max_tokens_range() {
        assert!(validate_chunking(Some(&static_policy(json!(100), json!(0)))));
        assert!(validate_chunking(Some(&static_policy(json!(4096), json!(2048)))));
        assert_eq!(
            explain_chunking(Some(&static_policy(json!(99), json!(0)))),
            "static.maxTokens must be between 100 and 4096 (got 99)"
        );
        assert!(!validate_chunking(Some(&static_policy(json!(4097), json!(0)))));
    }

    #[test]
    fn static_requires_integers() {
        assert_eq!(
            explain_chunking(Some(&static_policy(json!(800.5), json!(0)))),
            "static.maxTokens must be an integer"
        );
        assert_eq!(
            explain_chunking(Some(&static_policy(json!("800"), json!(0)))),
            "static.maxTokens must be an integer"
        );
        assert_eq!(
            explain_chunking(Some(&static_policy(json!(800), json!(1.5)))),
            "static.overlapTokens must be an integer"
        );
        // Integral floats are integers on the wire.
        assert!(validate_chunking(Some(&static_policy(json!(800.0), json!(400.0)))));
    }

    #[test]
    fn huge_integers_report_the_caller_value() {
        assert_eq!(
            explain_chunking(Some(&static_policy(json!(u64::MAX), json!(0)))),
            "static.maxTokens must be between 100 and 4096 (got 18446744073709551615)"
        );
        assert_eq!(
            explain_chunking(Some(&static_policy(json!(800), json!(u64::MAX)))),
            "static.overlapTokens must not exceed half of static.maxTokens (400) (got 18446744073709551615)"
        );
        assert_eq!(
            explain_chunking(Some(&static_policy(json!(1e30), json!(0)))),
            "static.maxTokens must be between 100 and 4096 (got 1e30)"
        );
    }

    #[test]
    fn limits_wider_than_u32_never_truncate() {
        let limits = ValidationLimits {
            max_chunk_max_tokens: 10_000_000_000,
            ..ValidationLimits::DEFAULT
        };
        // u32::MAX + 101 would wrap to 100 with a plain cast
        let p = static_policy(json!(4_294_967_396u64), json!(0));
        assert!(!validate_chunking_with(Some(&p), &limits));
        assert_eq!(
            explain_chunking_with(Some(&p), &limits),
            "static.maxTokens must be between 100 and 10000000000 (got 4294967396)"
        );
    }

    #[test]
    fn static_rejects_negative_overlap() {
        assert_eq!(
            explain_chunking(Some(&static_policy(json!(800), json!(-1)))),
            "static.overlapTokens must be non-negative (got -1)"
        );
    }

    #[test]
    fn static_requires_sub_object() {
        let missing = json!({"type": "static"});
        assert_eq!(
            explain_chunking(Some(&missing)),
            "static chunking_strategy requires a 'static' object"
        );
        let wrong = json!({"type": "static", "static": [800, 400]});
        assert!(!validate_chunking(Some(&wrong)));
    }

    #[test]
    fn rejects_malformed_envelopes() {
        assert_eq!(explain_chunking(Some(&json!(null))), "chunking_strategy must be an object");
        assert_eq!(
            explain_chunking(Some(&json!({"static": {}}))),
            "chunking_strategy must have a string 'type' field"
        );
        assert_eq!(
            explain_chunking(Some(&json!({"type": "semantic"}))),
            "unsupported chunking_strategy type 'semantic'; expected 'auto' or 'static'"
        );
    }

    #[test]
    fn typed_policy_and_provider_rendering() {
        let policy = ChunkingPolicy::from_value(&static_policy(json!(800), json!(400))).unwrap();
        assert_eq!(
            policy,
            ChunkingPolicy::Static {
                config: StaticChunking {
                    max_tokens: 800,
                    overlap_tokens: 400
                }
            }
        );
        assert_eq!(
            serde_json::to_value(policy).unwrap(),
            static_policy(json!(800), json!(400))
        );
        assert_eq!(
            policy.to_provider_value(),
            json!({"type": "static", "static": {"max_chunk_size_tokens": 800, "chunk_overlap_tokens": 400}})
        );
        assert_eq!(serde_json::to_value(ChunkingPolicy::Auto).unwrap(), json!({"type": "auto"}));
    }

    #[test]
    fn custom_limits_apply() {
        let limits = ValidationLimits {
            max_chunk_max_tokens: 1000,
            ..ValidationLimits::DEFAULT
        };
        let p = static_policy(json!(2000), json!(0));
        assert!(validate_chunking(Some(&p)));
        assert!(!validate_chunking_with(Some(&p), &limits));
    }

    #[test]
    fn explain_is_idempotent() {
        let p = static_policy(json!(800), json!(401));
        assert_eq!(explain_chunking(Some(&p)), explain_chunking(Some(&p)));
        assert_eq!(explain_chunking(None), GENERIC_CHUNKING_MESSAGE);
    }
}
