//! Inbound request bodies and their validated, provider-ready forms
//!
//! Inbound types keep the constrained fragments as raw JSON so the validators
//! see exactly what the caller sent. `into_params` runs the validators and
//! yields typed parameters that render to the provider's wire format.

use crate::chunking::ChunkingPolicy;
use crate::error::{GatewayError, Result};
use crate::filter::FilterExpression;
use crate::metadata::MetadataMap;
use crate::validate::ConstraintValidator;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};

/// Largest `max_num_results` the provider accepts for a search
pub const MAX_SEARCH_RESULTS: u32 = 50;

/// Expiration policy for a vector store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiresAfter {
    /// Only `last_active_at` is defined by the provider
    pub anchor: ExpiryAnchor,
    pub days: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryAnchor {
    LastActiveAt,
}

/// Keeps an explicit `null` as `Some(Value::Null)`; only a missing field is `None`
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

// ============================================================================
// Vector Store Creation
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateVectorStoreRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub file_ids: Vec<String>,
    #[serde(default, deserialize_with = "present")]
    pub chunking_strategy: Option<Value>,
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub expires_after: Option<ExpiresAfter>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateVectorStoreParams {
    pub name: Option<String>,
    pub file_ids: Vec<String>,
    pub chunking: Option<ChunkingPolicy>,
    pub metadata: Option<MetadataMap>,
    pub expires_after: Option<ExpiresAfter>,
}

impl CreateVectorStoreRequest {
    pub fn into_params(self, validator: &ConstraintValidator) -> Result<CreateVectorStoreParams> {
        let chunking = validator.ensure_chunking(self.chunking_strategy.as_ref())?;
        let metadata = validator.ensure_metadata(self.metadata.as_ref())?;
        Ok(CreateVectorStoreParams {
            name: self.name,
            file_ids: self.file_ids,
            chunking,
            metadata,
            expires_after: self.expires_after,
        })
    }
}

impl CreateVectorStoreParams {
    pub fn to_provider_body(&self) -> Value {
        let mut body = Map::new();
        if let Some(ref name) = self.name {
            body.insert("name".into(), json!(name));
        }
        if !self.file_ids.is_empty() {
            body.insert("file_ids".into(), json!(self.file_ids));
        }
        if let Some(ref chunking) = self.chunking {
            body.insert("chunking_strategy".into(), chunking.to_provider_value());
        }
        if let Some(ref metadata) = self.metadata {
            body.insert("metadata".into(), json!(metadata));
        }
        if let Some(ref expires) = self.expires_after {
            body.insert("expires_after".into(), json!(expires));
        }
        Value::Object(body)
    }
}

// ============================================================================
// File Attachment
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct AttachFileRequest {
    pub file_id: String,
    #[serde(default, deserialize_with = "present")]
    pub chunking_strategy: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttachFileParams {
    pub file_id: String,
    pub chunking: Option<ChunkingPolicy>,
}

impl AttachFileRequest {
    pub fn into_params(self, validator: &ConstraintValidator) -> Result<AttachFileParams> {
        if self.file_id.is_empty() {
            return Err(GatewayError::validation("file_id", "file_id must not be empty"));
        }
        Ok(AttachFileParams {
            chunking: validator.ensure_chunking(self.chunking_strategy.as_ref())?,
            file_id: self.file_id,
        })
    }
}

impl AttachFileParams {
    pub fn to_provider_body(&self) -> Value {
        let mut body = json!({ "file_id": self.file_id });
        if let Some(ref chunking) = self.chunking {
            body["chunking_strategy"] = chunking.to_provider_value();
        }
        body
    }
}

// ============================================================================
// File Batches
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CreateFileBatchRequest {
    pub file_ids: Vec<String>,
    #[serde(default, deserialize_with = "present")]
    pub chunking_strategy: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateFileBatchParams {
    pub file_ids: Vec<String>,
    pub chunking: Option<ChunkingPolicy>,
}

impl CreateFileBatchRequest {
    pub fn into_params(self, validator: &ConstraintValidator) -> Result<CreateFileBatchParams> {
        if self.file_ids.is_empty() {
            return Err(GatewayError::validation("file_ids", "file_ids must not be empty"));
        }
        Ok(CreateFileBatchParams {
            chunking: validator.ensure_chunking(self.chunking_strategy.as_ref())?,
            file_ids: self.file_ids,
        })
    }
}

impl CreateFileBatchParams {
    pub fn to_provider_body(&self) -> Value {
        let mut body = json!({ "file_ids": self.file_ids });
        if let Some(ref chunking) = self.chunking {
            body["chunking_strategy"] = chunking.to_provider_value();
        }
        body
    }
}

// ============================================================================
// Search
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub filters: Option<Value>,
    #[serde(default)]
    pub max_num_results: Option<u32>,
    #[serde(default)]
    pub rewrite_query: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    pub query: String,
    pub filters: Option<FilterExpression>,
    pub max_num_results: Option<u32>,
    pub rewrite_query: Option<bool>,
}

impl SearchRequest {
    pub fn into_params(self, validator: &ConstraintValidator) -> Result<SearchParams> {
        if self.query.trim().is_empty() {
            return Err(GatewayError::validation("query", "query must not be empty"));
        }
        if let Some(n) = self.max_num_results {
            if n == 0 || n > MAX_SEARCH_RESULTS {
                return Err(GatewayError::validation(
                    "max_num_results",
                    format!("max_num_results must be between 1 and {MAX_SEARCH_RESULTS}"),
                ));
            }
        }
        // An explicit null means "no filter", same as omitting it.
        let filters = match self.filters {
            None | Some(Value::Null) => None,
            Some(ref f) => Some(validator.ensure_filter(f)?),
        };
        Ok(SearchParams {
            query: self.query,
            filters,
            max_num_results: self.max_num_results,
            rewrite_query: self.rewrite_query,
        })
    }
}

impl SearchParams {
    pub fn to_provider_body(&self) -> Value {
        let mut body = json!({ "query": self.query });
        if let Some(ref filters) = self.filters {
            body["filters"] = filters.to_value();
        }
        if let Some(n) = self.max_num_results {
            body["max_num_results"] = json!(n);
        }
        if let Some(rewrite) = self.rewrite_query {
            body["rewrite_query"] = json!(rewrite);
        }
        body
    }
}

/// One text fragment of a search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchContent {
    #[serde(rename = "type")]
    pub content_type: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub file_id: String,
    #[serde(default)]
    pub filename: Option<String>,
    pub score: f64,
    #[serde(default)]
    pub attributes: Option<Value>,
    #[serde(default)]
    pub content: Vec<SearchContent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub search_query: Option<Value>,
    pub data: Vec<SearchHit>,
    #[serde(default)]
    pub has_more: bool,
}
