//! # Retry Configuration
//!
//! - `min_delay_secs`: delay after the first failure (default: 10 minutes)
//! - `max_delay_secs`: cap for the exponential schedule (default: 24 hours)
//! - `marker_ttl_secs`: markers untouched this long are forgotten (default: 30 days)

use serde::{Deserialize, Serialize};

/// Configuration for the retry schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub min_delay_secs: u64,
    pub max_delay_secs: u64,
    pub marker_ttl_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            min_delay_secs: 10 * 60,
            max_delay_secs: 24 * 60 * 60,
            marker_ttl_secs: 30 * 24 * 60 * 60,
        }
    }
}

impl RetryConfig {
    pub fn new(min_delay_secs: u64, max_delay_secs: u64, marker_ttl_secs: u64) -> Self {
        Self {
            min_delay_secs,
            max_delay_secs,
            marker_ttl_secs,
        }
    }

    /// Validate configuration values.
    pub fn is_valid(&self) -> bool {
        self.min_delay_secs > 0
            && self.min_delay_secs <= self.max_delay_secs
            && self.marker_ttl_secs >= self.max_delay_secs
    }

    /// Delay before the next attempt after `retry_count` repeated failures.
    pub fn delay_for(&self, retry_count: u32) -> u64 {
        let factor = 1u64.checked_shl(retry_count).unwrap_or(u64::MAX);
        self.min_delay_secs
            .saturating_mul(factor)
            .min(self.max_delay_secs)
    }
}
