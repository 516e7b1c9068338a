//! Key map plus frequency buckets: the unlocked core of the LFU engine
//!
//! Every method here assumes the caller holds the engine lock. The store
//! keeps three things consistent: `len()` equals the map's cardinality,
//! every entry's key is a member of exactly the bucket the entry points at,
//! and every bucket is reachable from the list head.

use crate::lfu::buckets::FrequencyBuckets;
use crate::lfu::entry::LfuEntry;
use crate::lfu::types::Eviction;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::Instant;

/// Result of a lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<V> {
    Hit(V),
    /// The entry existed but its expiry had passed; it has been removed
    Expired,
    Miss,
}

impl<V> Lookup<V> {
    pub fn into_option(self) -> Option<V> {
        match self {
            Lookup::Hit(v) => Some(v),
            Lookup::Expired | Lookup::Miss => None,
        }
    }
}

/// What a `set` did
#[derive(Debug)]
pub struct SetOutcome<K, V> {
    /// True when the key was new
    pub inserted: bool,

    /// Entries evicted because the insert pushed size past twice the capacity
    pub evicted: Vec<Eviction<K, V>>,
}

/// Counts from one sweep pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepCounts {
    pub expired: usize,
    pub stale: usize,
}

/// Keys, entries and the bucket list they index into
#[derive(Debug)]
pub struct FrequencyStore<K, V> {
    entries: HashMap<K, LfuEntry<V>>,
    buckets: FrequencyBuckets<K>,
    /// 0 disables capacity-triggered eviction
    capacity: usize,
}

impl<K, V> FrequencyStore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            buckets: FrequencyBuckets::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Access count of a live key
    pub fn frequency_of(&self, key: &K) -> Option<u64> {
        let bucket = self.entries.get(key)?.bucket?;
        self.buckets.frequency(bucket)
    }

    /// Look up `key`, removing it if expired and promoting it otherwise
    pub fn get(&mut self, key: &K, now: Instant) -> Lookup<V> {
        let expired = match self.entries.get(key) {
            None => return Lookup::Miss,
            Some(entry) => entry.is_expired_at(now),
        };
        if expired {
            self.remove(key);
            return Lookup::Expired;
        }

        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.bucket = Some(self.buckets.promote(key, entry.bucket));
                entry.mark_accessed_at(now);
                Lookup::Hit(entry.value.clone())
            }
            None => Lookup::Miss,
        }
    }

    /// Insert or overwrite `key`.
    ///
    /// Overwriting counts as an access. A new key starts at frequency 1; if
    /// that pushes the size past twice the capacity, the store evicts back
    /// down to the capacity.
    pub fn set(&mut self, key: K, value: V, expires_at: Option<Instant>, now: Instant) -> SetOutcome<K, V> {
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.update(value, expires_at);
            entry.bucket = Some(self.buckets.promote(&key, entry.bucket));
            entry.mark_accessed_at(now);
            return SetOutcome {
                inserted: false,
                evicted: Vec::new(),
            };
        }

        let mut entry = LfuEntry::new(value, expires_at, now);
        entry.bucket = Some(self.buckets.promote(&key, None));
        self.entries.insert(key, entry);

        let evicted = if self.capacity > 0 && self.entries.len() > self.capacity * 2 {
            let excess = self.entries.len() - self.capacity;
            self.evict(excess)
        } else {
            Vec::new()
        };

        SetOutcome {
            inserted: true,
            evicted,
        }
    }

    /// Remove `key`, returning its value if it was present
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let entry = self.entries.remove(key)?;
        if let Some(bucket) = entry.bucket {
            self.buckets.remove(key, bucket);
        }
        Some(entry.value)
    }

    /// Remove up to `count` entries, lowest frequency first
    pub fn evict(&mut self, count: usize) -> Vec<Eviction<K, V>> {
        self.buckets
            .take_lowest(count)
            .into_iter()
            .filter_map(|key| {
                let entry = self.entries.remove(&key)?;
                Some(Eviction {
                    key,
                    value: entry.value,
                })
            })
            .collect()
    }

    /// Remove entries that expired, or that were last touched before
    /// `stale_before` when a cutoff is given
    pub fn sweep(&mut self, now: Instant, stale_before: Option<Instant>) -> SweepCounts {
        let mut counts = SweepCounts::default();
        let mut doomed = Vec::new();

        for (key, entry) in &self.entries {
            if entry.is_expired_at(now) {
                counts.expired += 1;
                doomed.push(key.clone());
            } else if stale_before.is_some_and(|cutoff| entry.is_stale_since(cutoff)) {
                counts.stale += 1;
                doomed.push(key.clone());
            }
        }

        for key in &doomed {
            self.remove(key);
        }
        counts
    }

    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.buckets.clear();
        count
    }

    /// Bucket frequencies in list order
    pub fn frequencies(&self) -> Vec<u64> {
        self.buckets.frequencies()
    }

    /// True when the map and the bucket list agree
    pub fn is_consistent(&self) -> bool {
        let frequencies = self.buckets.frequencies();
        let ascending = frequencies.windows(2).all(|w| w[0] < w[1]);
        let members_match = self.buckets.member_count() == self.entries.len();
        let all_bucketed = self
            .entries
            .values()
            .all(|e| e.bucket.and_then(|b| self.buckets.frequency(b)).is_some());
        ascending && members_match && all_bucketed && frequencies.len() == self.buckets.len()
    }
}
