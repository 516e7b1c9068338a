//! Statistics and event types for the LFU engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An entry removed by capacity pressure or an explicit `evict` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eviction<K, V> {
    pub key: K,
    pub value: V,
}

/// Outcome of one sweep pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepReport {
    /// Entries removed because their expiry passed
    pub expired: usize,

    /// Entries removed because nobody touched them for a full sweep interval
    pub stale: usize,

    /// When the sweep ran
    pub swept_at: DateTime<Utc>,
}

impl SweepReport {
    pub fn removed(&self) -> usize {
        self.expired + self.stale
    }
}

/// Counters for the LFU engine
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LfuStats {
    /// Total number of hits
    pub hits: u64,

    /// Total number of misses (including lazily expired entries)
    pub misses: u64,

    /// Entries currently held
    pub entries: usize,

    /// Live frequency buckets
    pub buckets: usize,

    /// Entries removed by frequency-based eviction
    pub evictions: u64,

    /// Entries found expired on read
    pub expirations_lazy: u64,

    /// Entries reclaimed by the background sweep
    pub sweep_reclaimed: u64,

    /// Last completed sweep
    pub last_sweep_at: Option<DateTime<Utc>>,
}

impl LfuStats {
    /// Cache hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }

    /// Entries removed for any reason other than explicit deletion
    pub fn total_removed(&self) -> u64 {
        self.evictions + self.expirations_lazy + self.sweep_reclaimed
    }
}

impl fmt::Display for LfuStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LfuStats {{ hits: {}, misses: {}, hit_rate: {:.2}%, entries: {}, buckets: {}, evictions: {}, removed: {} }}",
            self.hits,
            self.misses,
            self.hit_rate(),
            self.entries,
            self.buckets,
            self.evictions,
            self.total_removed()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        let stats = LfuStats {
            hits: 80,
            misses: 20,
            ..Default::default()
        };
        assert_eq!(stats.hit_rate(), 80.0);
        assert_eq!(LfuStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_total_removed() {
        let stats = LfuStats {
            evictions: 3,
            expirations_lazy: 2,
            sweep_reclaimed: 5,
            ..Default::default()
        };
        assert_eq!(stats.total_removed(), 10);
    }

    #[test]
    fn test_display() {
        let stats = LfuStats {
            hits: 100,
            misses: 50,
            entries: 7,
            evictions: 4,
            expirations_lazy: 1,
            ..Default::default()
        };
        let display = stats.to_string();
        assert!(display.contains("hits: 100"));
        assert!(display.contains("hit_rate: 66.67%"));
        assert!(display.contains("removed: 5"));
    }

    #[test]
    fn test_sweep_report_removed() {
        let report = SweepReport {
            expired: 2,
            stale: 3,
            swept_at: Utc::now(),
        };
        assert_eq!(report.removed(), 5);
    }
}
