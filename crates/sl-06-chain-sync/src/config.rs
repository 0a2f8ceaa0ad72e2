//! # Sync Configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Delay between bootstrap and handshake attempts.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 5_000;

/// Sync engine configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Fixed delay between retries, in milliseconds.
    pub retry_delay_ms: u64,

    /// Give up bootstrap / handshake after this many attempts.
    /// `None` retries forever.
    pub max_attempts: Option<u32>,

    /// Interval of the periodic resync driver, in seconds.
    pub resync_interval_secs: u64,

    /// Minimum difficulty any accepted block must declare.
    pub min_difficulty_bits: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            max_attempts: None,
            resync_interval_secs: 30,
            min_difficulty_bits: 8,
        }
    }
}

impl SyncConfig {
    /// Create a config for testing (fast, bounded retries, no PoW).
    pub fn for_testing() -> Self {
        Self {
            retry_delay_ms: 10,
            max_attempts: Some(3),
            resync_interval_secs: 1,
            min_difficulty_bits: 0,
        }
    }

    /// Retry delay.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Whether another attempt is allowed after `attempts` failures.
    pub fn may_retry(&self, attempts: u32) -> bool {
        self.max_attempts.map_or(true, |max| attempts < max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SyncConfig::default();
        assert_eq!(config.retry_delay(), Duration::from_secs(5));
        assert!(config.may_retry(1_000_000));
    }

    #[test]
    fn test_testing_config() {
        let config = SyncConfig::for_testing();
        assert!(config.may_retry(2));
        assert!(!config.may_retry(3));
    }
}
