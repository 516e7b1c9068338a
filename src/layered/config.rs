//! Configuration for the layered cache

use crate::error::{CacheError, Result};
use crate::lfu::LfuConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for [`LayeredCache`](crate::layered::LayeredCache)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayeredConfig {
    /// Local LFU tier: capacity, default TTL and sweep interval
    pub local: LfuConfig,

    /// TTL for values written to the remote tier. Zero stores without expiry.
    pub remote_ttl: Duration,
}

impl Default for LayeredConfig {
    fn default() -> Self {
        Self {
            local: LfuConfig::default(),
            remote_ttl: Duration::from_secs(300),
        }
    }
}

impl LayeredConfig {
    /// Create a new builder
    pub fn builder() -> LayeredConfigBuilder {
        LayeredConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.local.validate()?;

        if self.remote_ttl > Duration::from_secs(u64::from(u32::MAX)) {
            return Err(CacheError::Config(
                "remote_ttl is out of range for the remote tier".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for [`LayeredConfig`]
#[derive(Debug, Default)]
pub struct LayeredConfigBuilder {
    local: Option<LfuConfig>,
    local_capacity: Option<usize>,
    local_ttl: Option<Duration>,
    local_ttl_jitter: Option<f64>,
    sweep_interval: Option<Duration>,
    remote_ttl: Option<Duration>,
}

impl LayeredConfigBuilder {
    /// Start from a complete local tier configuration
    pub fn local(mut self, config: LfuConfig) -> Self {
        self.local = Some(config);
        self
    }

    /// Local capacity (0 = unbounded)
    pub fn local_capacity(mut self, capacity: usize) -> Self {
        self.local_capacity = Some(capacity);
        self
    }

    /// Local default TTL (zero = never expire)
    pub fn local_ttl(mut self, ttl: Duration) -> Self {
        self.local_ttl = Some(ttl);
        self
    }

    /// Local TTL jitter factor (0.0 - 1.0)
    pub fn local_ttl_jitter(mut self, jitter: f64) -> Self {
        self.local_ttl_jitter = Some(jitter);
        self
    }

    /// Local sweep interval (zero = no sweep)
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = Some(interval);
        self
    }

    /// Remote tier TTL (zero = no expiry)
    pub fn remote_ttl(mut self, ttl: Duration) -> Self {
        self.remote_ttl = Some(ttl);
        self
    }

    /// Build the configuration
    pub fn build(self) -> LayeredConfig {
        let defaults = LayeredConfig::default();
        let mut local = self.local.unwrap_or(defaults.local);

        if let Some(capacity) = self.local_capacity {
            local.capacity = capacity;
        }
        if let Some(ttl) = self.local_ttl {
            local.default_ttl = ttl;
        }
        if let Some(jitter) = self.local_ttl_jitter {
            local.ttl_jitter = jitter;
        }
        if let Some(interval) = self.sweep_interval {
            local.cleanup_interval = interval;
        }

        LayeredConfig {
            local,
            remote_ttl: self.remote_ttl.unwrap_or(defaults.remote_ttl),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LayeredConfig::default();
        assert_eq!(config.remote_ttl, Duration::from_secs(300));
        assert_eq!(config.local.capacity, 100_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_overrides_local_fields() {
        let config = LayeredConfig::builder()
            .local(LfuConfig::small())
            .local_capacity(100_000)
            .local_ttl(Duration::from_secs(5))
            .sweep_interval(Duration::ZERO)
            .remote_ttl(Duration::from_secs(5))
            .build();

        assert_eq!(config.local.capacity, 100_000);
        assert_eq!(config.local.default_ttl, Duration::from_secs(5));
        assert!(config.local.cleanup_interval.is_zero());
        assert_eq!(config.remote_ttl, Duration::from_secs(5));
    }

    #[test]
    fn test_validation_covers_local_tier() {
        let config = LayeredConfig::builder().local_ttl_jitter(2.0).build();
        assert!(matches!(config.validate(), Err(CacheError::Config(_))));

        let config = LayeredConfig::builder()
            .remote_ttl(Duration::from_secs(u64::MAX))
            .build();
        assert!(config.validate().is_err());
    }
}
