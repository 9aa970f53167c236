//! Constraint validator facade
//!
//! Bundles the filter, chunking and metadata checks behind one value that
//! carries its limits table. The boolean/explain pairs are pure; the
//! `ensure_*` wrappers are the request boundary and turn a failed check into
//! [`GatewayError::Validation`].

use crate::chunking::{self, ChunkingPolicy};
use crate::error::{GatewayError, Result};
use crate::filter::{self, FilterExpression};
use crate::limits::ValidationLimits;
use crate::metadata::{self, MetadataMap};
use crate::metrics::ValidationMetrics;
use serde_json::Value;
use tracing::debug;

/// Request field names used in rejection errors
pub mod fields {
    pub const FILTERS: &str = "filters";
    pub const CHUNKING_STRATEGY: &str = "chunking_strategy";
    pub const METADATA: &str = "metadata";
}

/// Stateless validator over a fixed limits table
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstraintValidator {
    limits: ValidationLimits,
}

impl ConstraintValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: ValidationLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &ValidationLimits {
        &self.limits
    }

    pub fn validate_filter(&self, expr: &Value) -> bool {
        filter::validate_filter(expr)
    }

    pub fn explain_filter(&self, expr: &Value) -> String {
        filter::explain_filter(expr)
    }

    pub fn validate_chunking(&self, policy: Option<&Value>) -> bool {
        chunking::validate_chunking_with(policy, &self.limits)
    }

    pub fn explain_chunking(&self, policy: Option<&Value>) -> String {
        chunking::explain_chunking_with(policy, &self.limits)
    }

    pub fn validate_metadata(&self, map: Option<&Value>) -> bool {
        metadata::validate_metadata_with(map, &self.limits)
    }

    pub fn explain_metadata(&self, map: Option<&Value>) -> String {
        metadata::explain_metadata_with(map, &self.limits)
    }

    /// Validate-or-throw for search filters
    pub fn ensure_filter(&self, expr: &Value) -> Result<FilterExpression> {
        FilterExpression::from_value(expr).map_err(|e| reject(fields::FILTERS, e.to_string()))
    }

    /// Validate-or-throw for an optional chunking policy
    pub fn ensure_chunking(&self, policy: Option<&Value>) -> Result<Option<ChunkingPolicy>> {
        policy
            .map(|value| {
                ChunkingPolicy::from_value_with(value, &self.limits)
                    .map_err(|e| reject(fields::CHUNKING_STRATEGY, e.to_string()))
            })
            .transpose()
    }

    /// Validate-or-throw for an optional metadata map; `null` counts as absent
    pub fn ensure_metadata(&self, map: Option<&Value>) -> Result<Option<MetadataMap>> {
        match map {
            None | Some(Value::Null) => Ok(None),
            Some(value) => MetadataMap::from_value_with(value, &self.limits)
                .map(Some)
                .map_err(|e| reject(fields::METADATA, e.to_string())),
        }
    }
}

fn reject(field: &'static str, message: String) -> GatewayError {
    debug!(field, reason = %message, "Rejected request payload");
    ValidationMetrics::new().record_rejection(field);
    GatewayError::validation(field, message)
}

/// Validate-or-throw for search filters with default limits
pub fn ensure_filter(expr: &Value) -> Result<FilterExpression> {
    ConstraintValidator::default().ensure_filter(expr)
}

/// Validate-or-throw for a chunking policy with default limits
pub fn ensure_chunking(policy: Option<&Value>) -> Result<Option<ChunkingPolicy>> {
    ConstraintValidator::default().ensure_chunking(policy)
}

/// Validate-or-throw for metadata with default limits
pub fn ensure_metadata(map: Option<&Value>) -> Result<Option<MetadataMap>> {
    ConstraintValidator::default().ensure_metadata(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ensure_filter_maps_to_validation_error() {
        let err = ensure_filter(&json!({"type": "and", "filters": []})).unwrap_err();
        match err {
            GatewayError::Validation { field, message } => {
                assert_eq!(field, "filters");
                assert_eq!(message, "compound filter 'filters' must not be empty");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn ensure_wrappers_pass_through_valid_payloads() {
        assert!(ensure_filter(&json!({"type": "eq", "key": "k", "value": 1})).is_ok());
        assert_eq!(ensure_chunking(None).unwrap(), None);
        assert_eq!(
            ensure_chunking(Some(&json!({"type": "auto"}))).unwrap(),
            Some(ChunkingPolicy::Auto)
        );
        assert_eq!(ensure_metadata(Some(&Value::Null)).unwrap(), None);
        let map = ensure_metadata(Some(&json!({"a": "b"}))).unwrap().unwrap();
        assert_eq!(map.get("a"), Some("b"));
    }

    #[test]
    fn ensure_message_matches_explain() {
        let v = ConstraintValidator::new();
        let bad = json!({"type": "static", "static": {"maxTokens": 800, "overlapTokens": 401}});
        let err = v.ensure_chunking(Some(&bad)).unwrap_err();
        assert!(err.is_rejection());
        assert_eq!(
            err.to_string(),
            format!("Invalid chunking_strategy: {}", v.explain_chunking(Some(&bad)))
        );
    }

    #[test]
    fn configured_limits_flow_through() {
        let v = ConstraintValidator::with_limits(ValidationLimits {
            max_metadata_entries: 1,
            ..ValidationLimits::DEFAULT
        });
        let two = json!({"a": "1", "b": "2"});
        assert!(!v.validate_metadata(Some(&two)));
        assert_eq!(
            v.explain_metadata(Some(&two)),
            "metadata must not have more than 1 entries (got 2)"
        );
        assert!(ConstraintValidator::new().validate_metadata(Some(&two)));
    }
}
