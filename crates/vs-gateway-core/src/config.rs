//! Configuration types for the vector store gateway
//!
//! Uses the `config` crate for layered configuration from files and environment.

use crate::limits::ValidationLimits;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Upstream provider connection
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Resource-completion poller
    #[serde(default)]
    pub poller: PollerConfig,

    /// Validator limits table
    #[serde(default)]
    pub limits: ValidationLimits,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// Provider connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API base URL, without trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer API key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Optional organization header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,

    /// Connection timeout
    #[serde(with = "humantime_serde", default = "default_connect_timeout")]
    pub connect_timeout: Duration,

    /// Request timeout
    #[serde(with = "humantime_serde", default = "default_request_timeout")]
    pub request_timeout: Duration,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(60)
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            organization: None,
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl ProviderConfig {
    /// Parsed base URL
    pub fn base_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(self.base_url.trim_end_matches('/'))
    }
}

// ============================================================================
// Poller Configuration
// ============================================================================

/// Backoff schedule and deadline for resource polling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Sleep after the first non-terminal observation
    #[serde(with = "humantime_serde", default = "default_initial_backoff")]
    pub initial_backoff: Duration,

    /// Added to the sleep after every further non-terminal observation
    #[serde(with = "humantime_serde", default = "default_backoff_step")]
    pub backoff_step: Duration,

    /// Upper bound on a single sleep
    #[serde(with = "humantime_serde", default = "default_max_backoff")]
    pub max_backoff: Duration,

    /// Default deadline when the caller gives none
    #[serde(with = "humantime_serde", default = "default_max_wait")]
    pub max_wait: Duration,
}

fn default_initial_backoff() -> Duration {
    Duration::from_millis(5_000)
}

fn default_backoff_step() -> Duration {
    Duration::from_millis(5_000)
}

fn default_max_backoff() -> Duration {
    Duration::from_millis(20_000)
}

fn default_max_wait() -> Duration {
    Duration::from_millis(600_000)
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            initial_backoff: default_initial_backoff(),
            backoff_step: default_backoff_step(),
            max_backoff: default_max_backoff(),
            max_wait: default_max_wait(),
        }
    }
}

// ============================================================================
// Observability Configuration
// ============================================================================

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format: "json" or "pretty"
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

// ============================================================================
// Configuration Loading
// ============================================================================

impl GatewayConfig {
    /// Load configuration from file and environment
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Add default values
        builder = builder.add_source(config::Config::try_from(&Self::default())?);

        // Add config file if specified
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Add environment variables with prefix VS_GATEWAY_
        builder = builder.add_source(
            config::Environment::with_prefix("VS_GATEWAY")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.check()?;
        Ok(config)
    }

    /// Reject internally inconsistent settings
    pub fn check(&self) -> Result<(), config::ConfigError> {
        self.provider
            .base_url()
            .map_err(|e| config::ConfigError::Message(format!("provider.base_url: {e}")))?;
        self.limits
            .check()
            .map_err(|e| config::ConfigError::Message(format!("limits: {e}")))?;
        if self.poller.initial_backoff.is_zero() {
            return Err(config::ConfigError::Message(
                "poller.initial_backoff must be positive".to_string(),
            ));
        }
        if self.poller.max_backoff < self.poller.initial_backoff {
            return Err(config::ConfigError::Message(
                "poller.max_backoff must not be below poller.initial_backoff".to_string(),
            ));
        }
        Ok(())
    }
}
