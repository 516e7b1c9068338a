//! Tier-level counters for the layered cache

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters updated on every layered lookup.
///
/// Relaxed ordering throughout: the numbers feed monitoring, nothing
/// synchronizes on them.
#[derive(Debug, Default)]
pub struct TierStats {
    local_hits: AtomicU64,
    remote_hits: AtomicU64,
    loader_hits: AtomicU64,
    misses: AtomicU64,
    remote_errors: AtomicU64,
    loader_calls: AtomicU64,
    dedup_waits: AtomicU64,
}

impl TierStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_local_hits(&self, n: usize) {
        self.local_hits.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_remote_hits(&self, n: usize) {
        self.remote_hits.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_loader_hits(&self, n: usize) {
        self.loader_hits.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_misses(&self, n: usize) {
        self.misses.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_remote_error(&self) {
        self.remote_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_loader_call(&self) {
        self.loader_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dedup_wait(&self) {
        self.dedup_waits.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> TierStatsSnapshot {
        TierStatsSnapshot {
            local_hits: self.local_hits.load(Ordering::Relaxed),
            remote_hits: self.remote_hits.load(Ordering::Relaxed),
            loader_hits: self.loader_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            remote_errors: self.remote_errors.load(Ordering::Relaxed),
            loader_calls: self.loader_calls.load(Ordering::Relaxed),
            dedup_waits: self.dedup_waits.load(Ordering::Relaxed),
        }
    }
}

/// Serializable view of [`TierStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TierStatsSnapshot {
    /// Keys answered by the local LFU tier
    pub local_hits: u64,

    /// Keys answered by the remote tier
    pub remote_hits: u64,

    /// Keys answered by the loader
    pub loader_hits: u64,

    /// Keys no tier could answer
    pub misses: u64,

    /// Remote calls that failed and were treated as misses
    pub remote_errors: u64,

    /// Loader invocations (one per single-key load or batch)
    pub loader_calls: u64,

    /// Callers that joined another caller's in-flight load
    pub dedup_waits: u64,
}

impl TierStatsSnapshot {
    /// Keys resolved by any tier
    pub fn hits(&self) -> u64 {
        self.local_hits + self.remote_hits + self.loader_hits
    }

    /// Share of lookups resolved by any tier, as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits() + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits() as f64 / total as f64) * 100.0
        }
    }

    /// Share of lookups resolved without leaving the process, as a percentage
    pub fn local_hit_rate(&self) -> f64 {
        let total = self.hits() + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.local_hits as f64 / total as f64) * 100.0
        }
    }
}

impl fmt::Display for TierStatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TierStats {{ local: {}, remote: {}, loader: {}, misses: {}, hit_rate: {:.2}%, remote_errors: {}, dedup_waits: {} }}",
            self.local_hits,
            self.remote_hits,
            self.loader_hits,
            self.misses,
            self.hit_rate(),
            self.remote_errors,
            self.dedup_waits
        )
    }
}
