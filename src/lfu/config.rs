//! Configuration for the LFU engine

use crate::error::{CacheError, Result};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Configuration for [`LfuCache`](crate::lfu::LfuCache)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LfuConfig {
    /// Target number of entries. The cache grows to twice this before it
    /// evicts back down. 0 means unbounded.
    pub capacity: usize,

    /// Time-to-live applied by `insert`. Zero means entries never expire.
    pub default_ttl: Duration,

    /// TTL jitter factor (0.0 - 1.0)
    /// Spreads expiries of entries loaded together
    pub ttl_jitter: f64,

    /// Interval of the background sweep. Entries untouched for a full
    /// interval are reclaimed. Zero disables the sweep.
    pub cleanup_interval: Duration,
}

impl Default for LfuConfig {
    fn default() -> Self {
        Self {
            capacity: 100_000,
            default_ttl: Duration::from_secs(60),
            ttl_jitter: 0.0,
            cleanup_interval: Duration::from_secs(60),
        }
    }
}

impl LfuConfig {
    /// Create a new builder for the configuration
    pub fn builder() -> LfuConfigBuilder {
        LfuConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.ttl_jitter) {
            return Err(CacheError::Config(
                "ttl_jitter must be between 0.0 and 1.0".to_string(),
            ));
        }

        if self.capacity > usize::MAX / 2 {
            return Err(CacheError::Config(format!(
                "capacity {} is too large",
                self.capacity
            )));
        }

        Ok(())
    }

    /// TTL for the next insert, with jitter applied. `None` when entries
    /// should not expire.
    pub fn ttl_with_jitter(&self) -> Option<Duration> {
        if self.default_ttl.is_zero() {
            return None;
        }
        if self.ttl_jitter <= 0.0 {
            return Some(self.default_ttl);
        }

        let base_secs = self.default_ttl.as_secs_f64();
        let jitter_range = base_secs * self.ttl_jitter.min(1.0);
        let jitter = (rand::random::<f64>() * 2.0 - 1.0) * jitter_range;
        let final_secs = (base_secs + jitter).max(0.001);

        // past Duration::MAX only when the base ttl is already near it
        Some(Duration::try_from_secs_f64(final_secs).unwrap_or(Duration::MAX))
    }

    /// Absolute expiry for an entry inserted at `now`
    pub fn expiry_from(&self, now: Instant) -> Option<Instant> {
        self.ttl_with_jitter().and_then(|ttl| now.checked_add(ttl))
    }
}

/// Builder for [`LfuConfig`]
#[derive(Debug, Default)]
pub struct LfuConfigBuilder {
    capacity: Option<usize>,
    default_ttl: Option<Duration>,
    ttl_jitter: Option<f64>,
    cleanup_interval: Option<Duration>,
}

impl LfuConfigBuilder {
    /// Set the target capacity (0 = unbounded)
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Set the default TTL (zero = never expire)
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// Set TTL jitter factor (0.0 - 1.0)
    pub fn ttl_jitter(mut self, jitter: f64) -> Self {
        self.ttl_jitter = Some(jitter);
        self
    }

    /// Set the sweep interval (zero = no background sweep)
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = Some(interval);
        self
    }

    /// Build the configuration
    pub fn build(self) -> LfuConfig {
        let defaults = LfuConfig::default();

        LfuConfig {
            capacity: self.capacity.unwrap_or(defaults.capacity),
            default_ttl: self.default_ttl.unwrap_or(defaults.default_ttl),
            ttl_jitter: self.ttl_jitter.unwrap_or(defaults.ttl_jitter),
            cleanup_interval: self.cleanup_interval.unwrap_or(defaults.cleanup_interval),
        }
    }
}

/// Preset configurations
impl LfuConfig {
    /// No capacity bound, no expiry, no sweep
    pub fn unbounded() -> Self {
        Self {
            capacity: 0,
            default_ttl: Duration::ZERO,
            ttl_jitter: 0.0,
            cleanup_interval: Duration::ZERO,
        }
    }

    /// Small hot set with short-lived entries
    pub fn small() -> Self {
        Self {
            capacity: 1_000,
            default_ttl: Duration::from_secs(30),
            cleanup_interval: Duration::from_secs(30),
            ..Default::default()
        }
    }

    /// Large hot set; jitter keeps bulk loads from expiring together
    pub fn large() -> Self {
        Self {
            capacity: 1_000_000,
            default_ttl: Duration::from_secs(600),
            ttl_jitter: 0.10,
            cleanup_interval: Duration::from_secs(300),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LfuConfig::default();
        assert_eq!(config.capacity, 100_000);
        assert_eq!(config.default_ttl, Duration::from_secs(60));
        assert_eq!(config.cleanup_interval, Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut invalid = LfuConfig::default();
        invalid.ttl_jitter = 1.5;
        assert!(matches!(invalid.validate(), Err(CacheError::Config(_))));

        let mut invalid = LfuConfig::default();
        invalid.capacity = usize::MAX;
        assert!(invalid.validate().is_err());

        assert!(LfuConfig::unbounded().validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = LfuConfig::builder()
            .capacity(5)
            .default_ttl(Duration::from_millis(10))
            .cleanup_interval(Duration::ZERO)
            .build();

        assert_eq!(config.capacity, 5);
        assert_eq!(config.default_ttl, Duration::from_millis(10));
        assert!(config.cleanup_interval.is_zero());
        assert_eq!(config.ttl_jitter, 0.0);
    }

    #[test]
    fn test_zero_ttl_never_expires() {
        let config = LfuConfig::unbounded();
        assert!(config.ttl_with_jitter().is_none());
        assert!(config.expiry_from(Instant::now()).is_none());
    }

    #[test]
    fn test_ttl_with_jitter() {
        let config = LfuConfig {
            default_ttl: Duration::from_secs(3600),
            ttl_jitter: 0.1,
            ..Default::default()
        };

        for _ in 0..20 {
            let ttl = config.ttl_with_jitter().unwrap().as_secs_f64();
            assert!(ttl >= 3600.0 - 360.0);
            assert!(ttl <= 3600.0 + 360.0);
        }
    }

    #[test]
    fn test_jitter_on_huge_ttl_saturates() {
        let config = LfuConfig {
            default_ttl: Duration::MAX,
            ttl_jitter: 0.5,
            ..Default::default()
        };

        for _ in 0..20 {
            let ttl = config.ttl_with_jitter().unwrap();
            assert!(ttl >= Duration::MAX / 4);
        }
        assert!(config.expiry_from(Instant::now()).is_none());
    }

    #[test]
    fn test_presets() {
        assert_eq!(LfuConfig::unbounded().capacity, 0);
        assert_eq!(LfuConfig::small().capacity, 1_000);
        assert_eq!(LfuConfig::large().capacity, 1_000_000);
        assert!(LfuConfig::large().validate().is_ok());
    }
}
