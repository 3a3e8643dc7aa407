//! Response cache configuration.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

const fn default_ttl_secs() -> u64 {
    30
}

const fn default_capacity() -> usize {
    50
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// How long a cached read stays fresh. Writes never invalidate cached
    /// reads, so this is also the staleness window after a mutation.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Maximum number of cached responses (oldest evicted first).
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            capacity: default_capacity(),
        }
    }
}

impl CacheConfig {
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if the capacity is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache.capacity".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}
