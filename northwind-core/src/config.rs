//! Configuration types

use crate::*;
use std::time::Duration;

/// Repository facade configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    /// Upper bound on a single store call. A call that exceeds it is treated
    /// as having affected no rows.
    pub store_timeout: Duration,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_secs(5),
        }
    }
}

impl RepositoryConfig {
    /// Create a repository config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the store call timeout.
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> NorthwindResult<()> {
        if self.store_timeout.is_zero() {
            return Err(NorthwindError::Config(ConfigError::InvalidValue {
                field: "store_timeout".to_string(),
                value: format!("{:?}", self.store_timeout),
                reason: "store_timeout must be positive".to_string(),
            }));
        }
        Ok(())
    }
}

/// Entity cache configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Initial capacity of each per-kind map. The cache still grows past it;
    /// this is a sizing hint, not a bound.
    pub initial_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 128,
        }
    }
}

impl CacheConfig {
    /// Create a cache config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial capacity.
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }
}
