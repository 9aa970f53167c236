//! Error types for the vector store gateway
//!
//! Uses `thiserror` for ergonomic error handling with full context preservation.

use std::fmt;
use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Primary error type for all gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Inbound payload violated a structural or numeric constraint
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// Transport, HTTP or protocol failure talking to the provider
    #[error("Provider error: {message}")]
    Provider {
        message: String,
        status: Option<u16>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Message serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Resource did not reach a terminal status before the deadline
    #[error("Timeout: resource {resource_id} not terminal after {max_wait_ms}ms")]
    Timeout { resource_id: String, max_wait_ms: u64 },

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Create a validation error for the named request field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a provider error
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
            status: None,
            source: None,
        }
    }

    /// Create a provider error carrying the HTTP status it answered with
    pub fn provider_status(message: impl Into<String>, status: u16) -> Self {
        Self::Provider {
            message: message.into(),
            status: Some(status),
            source: None,
        }
    }

    /// Create a provider error with source
    pub fn provider_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Provider {
            message: message.into(),
            status: None,
            source: Some(Box::new(source)),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(resource_id: impl Into<String>, max_wait_ms: u64) -> Self {
        Self::Timeout {
            resource_id: resource_id.into(),
            max_wait_ms,
        }
    }

    /// Operation is still pending on the provider side.
    ///
    /// Callers surface this as "try again later" rather than as a hard failure.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Request was rejected before reaching the provider
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// HTTP status reported by the provider, if any
    pub fn provider_status_code(&self) -> Option<u16> {
        match self {
            Self::Provider { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<config::ConfigError> for GatewayError {
    fn from(err: config::ConfigError) -> Self {
        Self::config(err.to_string())
    }
}

/// Error context for enhanced debugging
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub component: &'static str,
    pub operation: String,
    pub resource_id: Option<String>,
    pub vector_store_id: Option<String>,
}

impl ErrorContext {
    pub fn new(component: &'static str, operation: impl Into<String>) -> Self {
        Self {
            component,
            operation: operation.into(),
            resource_id: None,
            vector_store_id: None,
        }
    }

    pub fn with_resource(mut self, id: impl Into<String>) -> Self {
        self.resource_id = Some(id.into());
        self
    }

    pub fn with_vector_store(mut self, id: impl Into<String>) -> Self {
        self.vector_store_id = Some(id.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}::{}]", self.component, self.operation)?;
        if let Some(ref id) = self.vector_store_id {
            write!(f, " vector_store={}", id)?;
        }
        if let Some(ref id) = self.resource_id {
            write!(f, " resource={}", id)?;
        }
        Ok(())
    }
}

/// Extension trait for adding context to errors
pub trait ErrorContextExt<T> {
    fn with_context(self, ctx: ErrorContext) -> Result<T>;
}

impl<T> ErrorContextExt<T> for Result<T> {
    fn with_context(self, ctx: ErrorContext) -> Result<T> {
        self.map_err(|e| {
            if e.is_pending() {
                tracing::warn!(
                    error = %e,
                    component = ctx.component,
                    operation = %ctx.operation,
                    resource_id = ?ctx.resource_id,
                    vector_store_id = ?ctx.vector_store_id,
                    "Operation still pending"
                );
            } else {
                tracing::error!(
                    error = %e,
                    component = ctx.component,
                    operation = %ctx.operation,
                    resource_id = ?ctx.resource_id,
                    vector_store_id = ?ctx.vector_store_id,
                    "Operation failed"
                );
            }
            e
        })
    }
}
