//! Numeric limits enforced by the constraint validators

use serde::{Deserialize, Serialize};

/// Smallest accepted `static.maxTokens`
pub const MIN_CHUNK_MAX_TOKENS: i64 = 100;
/// Largest accepted `static.maxTokens`
pub const MAX_CHUNK_MAX_TOKENS: i64 = 4096;
/// Maximum number of metadata entries
pub const MAX_METADATA_ENTRIES: usize = 16;
/// Maximum metadata key length, in characters
pub const MAX_METADATA_KEY_CHARS: usize = 64;
/// Maximum metadata value length, in characters
pub const MAX_METADATA_VALUE_CHARS: usize = 512;

/// Immutable limits table shared by all validators.
///
/// The defaults mirror what the provider accepts. Overrides come from
/// configuration; nothing mutates a table once a validator holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationLimits {
    #[serde(default = "default_min_chunk_tokens")]
    pub min_chunk_max_tokens: i64,

    #[serde(default = "default_max_chunk_tokens")]
    pub max_chunk_max_tokens: i64,

    #[serde(default = "default_metadata_entries")]
    pub max_metadata_entries: usize,

    #[serde(default = "default_metadata_key_chars")]
    pub max_metadata_key_chars: usize,

    #[serde(default = "default_metadata_value_chars")]
    pub max_metadata_value_chars: usize,
}

fn default_min_chunk_tokens() -> i64 {
    MIN_CHUNK_MAX_TOKENS
}

fn default_max_chunk_tokens() -> i64 {
    MAX_CHUNK_MAX_TOKENS
}

fn default_metadata_entries() -> usize {
    MAX_METADATA_ENTRIES
}

fn default_metadata_key_chars() -> usize {
    MAX_METADATA_KEY_CHARS
}

fn default_metadata_value_chars() -> usize {
    MAX_METADATA_VALUE_CHARS
}

impl ValidationLimits {
    /// Provider defaults, usable in const context
    pub const DEFAULT: Self = Self {
        min_chunk_max_tokens: MIN_CHUNK_MAX_TOKENS,
        max_chunk_max_tokens: MAX_CHUNK_MAX_TOKENS,
        max_metadata_entries: MAX_METADATA_ENTRIES,
        max_metadata_key_chars: MAX_METADATA_KEY_CHARS,
        max_metadata_value_chars: MAX_METADATA_VALUE_CHARS,
    };

    /// Check the table is internally consistent
    pub fn check(&self) -> Result<(), String> {
        if self.min_chunk_max_tokens < 1 {
            return Err("min_chunk_max_tokens must be positive".to_string());
        }
        if self.max_chunk_max_tokens > i64::from(u32::MAX) {
            return Err(format!(
                "max_chunk_max_tokens ({}) exceeds {}",
                self.max_chunk_max_tokens,
                u32::MAX
            ));
        }
        if self.min_chunk_max_tokens > self.max_chunk_max_tokens {
            return Err(format!(
                "min_chunk_max_tokens ({}) exceeds max_chunk_max_tokens ({})",
                self.min_chunk_max_tokens, self.max_chunk_max_tokens
            ));
        }
        Ok(())
    }
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self::DEFAULT
    }
}
