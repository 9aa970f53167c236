//! Backoff schedule for resource polling

use std::time::Duration;
use vs_gateway_core::PollerConfig;

/// Capped linear backoff: `initial`, `initial + step`, ... up to `max`.
///
/// With the defaults the sleeps run 5s, 10s, 15s, 20s, 20s, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearBackoff {
    pub initial: Duration,
    pub step: Duration,
    pub max: Duration,
}

impl Default for LinearBackoff {
    fn default() -> Self {
        Self::from_config(&PollerConfig::default())
    }
}

impl LinearBackoff {
    pub fn new(initial: Duration, step: Duration, max: Duration) -> Self {
        Self { initial, step, max }
    }

    pub fn from_config(config: &PollerConfig) -> Self {
        Self {
            initial: config.initial_backoff,
            step: config.backoff_step,
            max: config.max_backoff,
        }
    }

    /// First sleep of a session
    pub fn first(&self) -> Duration {
        std::cmp::min(self.initial, self.max)
    }

    /// Sleep that follows `current`
    pub fn next(&self, current: Duration) -> Duration {
        std::cmp::min(current.saturating_add(self.step), self.max)
    }
}
