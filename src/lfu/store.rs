//! LFU cache engine: frequency store behind one lock, plus the sweep task

use crate::lfu::{
    config::LfuConfig,
    frequency::{FrequencyStore, Lookup},
    types::{Eviction, LfuStats, SweepReport},
};
use crate::types::{CacheKey, CacheValue};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError, Weak};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Approximate LFU cache with lazy and periodic expiration
///
/// This implementation provides:
/// - O(1) promotion between frequency buckets on every hit
/// - Bulk eviction of the least frequently used entries once the size
///   passes twice the configured capacity
/// - Expiry checked on read and by a background sweep that also reclaims
///   entries untouched for a whole sweep interval
/// - Optional notification channel for evicted entries
///
/// All state sits behind a single lock taken once per operation. Dropping
/// the cache or calling [`shutdown`](Self::shutdown) stops the sweep task.
pub struct LfuCache<K, V> {
    config: LfuConfig,
    state: Arc<Mutex<EngineState<K, V>>>,
    eviction_sink: Option<mpsc::UnboundedSender<Eviction<K, V>>>,
    shutdown_tx: watch::Sender<bool>,
    sweeper: StdMutex<Option<JoinHandle<()>>>,
}

struct EngineState<K, V> {
    store: FrequencyStore<K, V>,
    stats: LfuStats,
}

impl<K: CacheKey, V: CacheValue> LfuCache<K, V> {
    /// Create a new cache with the given configuration
    pub fn new(config: LfuConfig) -> Self {
        Self::build(config, None)
    }

    /// Create a cache that reports every evicted entry on `sink`.
    ///
    /// Only capacity-triggered and explicit evictions are reported; expiry
    /// and sweep removals are not.
    pub fn with_eviction_sink(
        config: LfuConfig,
        sink: mpsc::UnboundedSender<Eviction<K, V>>,
    ) -> Self {
        Self::build(config, Some(sink))
    }

    fn build(config: LfuConfig, eviction_sink: Option<mpsc::UnboundedSender<Eviction<K, V>>>) -> Self {
        info!("Initializing LFU cache with config: {:?}", config);

        let state = Arc::new(Mutex::new(EngineState {
            store: FrequencyStore::new(config.capacity),
            stats: LfuStats::default(),
        }));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let sweeper = if config.cleanup_interval.is_zero() {
            None
        } else {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => Some(handle.spawn(run_sweeper(
                    Arc::downgrade(&state),
                    config.cleanup_interval,
                    shutdown_rx,
                ))),
                Err(_) => {
                    warn!("No tokio runtime available, background sweep disabled");
                    None
                }
            }
        };

        Self {
            config,
            state,
            eviction_sink,
            shutdown_tx,
            sweeper: StdMutex::new(sweeper),
        }
    }

    /// The configuration this cache was built with
    pub fn config(&self) -> &LfuConfig {
        &self.config
    }

    /// Get a value, advancing its access frequency.
    ///
    /// An entry whose expiry has passed is removed and reported as a miss.
    pub async fn get(&self, key: &K) -> Option<V> {
        let mut state = self.state.lock().await;

        match state.store.get(key, Instant::now()) {
            Lookup::Hit(value) => {
                state.stats.hits += 1;
                debug!("LFU hit: {}", key);
                Some(value)
            }
            Lookup::Expired => {
                state.stats.misses += 1;
                state.stats.expirations_lazy += 1;
                debug!("LFU entry expired: {}", key);
                None
            }
            Lookup::Miss => {
                state.stats.misses += 1;
                debug!("LFU miss: {}", key);
                None
            }
        }
    }

    /// Insert or overwrite a value with an explicit expiry (`None` = never)
    pub async fn set(&self, key: K, value: V, expires_at: Option<Instant>) {
        let mut state = self.state.lock().await;
        let outcome = state.store.set(key, value, expires_at, Instant::now());

        if !outcome.evicted.is_empty() {
            state.stats.evictions += outcome.evicted.len() as u64;
            debug!(
                "Capacity exceeded, evicted {} entries down to {}",
                outcome.evicted.len(),
                state.store.len()
            );
            self.notify(outcome.evicted);
        }
    }

    /// Insert or overwrite a value using the configured default TTL
    pub async fn insert(&self, key: K, value: V) {
        let expires_at = self.config.expiry_from(Instant::now());
        self.set(key, value, expires_at).await;
    }

    /// Remove an entry, returning its value if it was present
    pub async fn remove(&self, key: &K) -> Option<V> {
        let mut state = self.state.lock().await;
        let removed = state.store.remove(key);
        if removed.is_some() {
            debug!("Removed LFU entry: {}", key);
        }
        removed
    }

    /// Evict up to `count` entries, least frequently used first.
    /// Returns the number actually evicted.
    pub async fn evict(&self, count: usize) -> usize {
        let mut state = self.state.lock().await;
        let evicted = state.store.evict(count);
        let n = evicted.len();

        state.stats.evictions += n as u64;
        self.notify(evicted);
        n
    }

    /// Look up several keys independently; absent keys are omitted
    pub async fn multi_get(&self, keys: &[K]) -> HashMap<K, V> {
        let mut values = HashMap::with_capacity(keys.len());
        for key in keys {
            if let Some(value) = self.get(key).await {
                values.insert(key.clone(), value);
            }
        }
        values
    }

    /// Set several entries independently, all with the same expiry
    pub async fn multi_set<I>(&self, entries: I, expires_at: Option<Instant>)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in entries {
            self.set(key, value, expires_at).await;
        }
    }

    /// Set several entries independently using the configured default TTL
    pub async fn multi_insert<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in entries {
            self.insert(key, value).await;
        }
    }

    /// Check if a key is present, without touching its frequency
    pub async fn contains_key(&self, key: &K) -> bool {
        self.state.lock().await.store.contains_key(key)
    }

    /// Current access frequency of a key
    pub async fn frequency_of(&self, key: &K) -> Option<u64> {
        self.state.lock().await.store.frequency_of(key)
    }

    /// Number of entries
    pub async fn len(&self) -> usize {
        self.state.lock().await.store.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.store.is_empty()
    }

    /// Remove every entry without notifying the eviction sink
    pub async fn clear(&self) {
        let count = self.state.lock().await.store.clear();
        info!("Cleared {} entries from LFU cache", count);
    }

    /// Run one sweep now
    pub async fn sweep(&self) -> SweepReport {
        sweep_state(&self.state, self.config.cleanup_interval).await
    }

    /// Get cache statistics
    pub async fn stats(&self) -> LfuStats {
        let state = self.state.lock().await;
        let mut stats = state.stats.clone();
        stats.entries = state.store.len();
        stats.buckets = state.store.bucket_count();
        stats
    }

    /// True while the background sweep task is running
    pub fn is_sweeping(&self) -> bool {
        self.sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the background sweep and wait for it to finish. Idempotent.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        let handle = self
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("LFU sweep task ended abnormally: {}", e);
            }
            info!("LFU sweep task stopped");
        }
    }

    fn notify(&self, evicted: Vec<Eviction<K, V>>) {
        let Some(sink) = &self.eviction_sink else {
            return;
        };
        for eviction in evicted {
            if sink.send(eviction).is_err() {
                debug!("Eviction receiver closed, dropping notifications");
                break;
            }
        }
    }
}

impl<K, V> Drop for LfuCache<K, V> {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}

async fn sweep_state<K: CacheKey, V: CacheValue>(
    state: &Mutex<EngineState<K, V>>,
    interval: Duration,
) -> SweepReport {
    let now = Instant::now();
    let stale_before = if interval.is_zero() {
        None
    } else {
        now.checked_sub(interval)
    };

    let mut state = state.lock().await;
    let counts = state.store.sweep(now, stale_before);
    let swept_at = Utc::now();

    state.stats.sweep_reclaimed += (counts.expired + counts.stale) as u64;
    state.stats.last_sweep_at = Some(swept_at);

    SweepReport {
        expired: counts.expired,
        stale: counts.stale,
        swept_at,
    }
}

/// Background task for periodic sweeping
async fn run_sweeper<K: CacheKey, V: CacheValue>(
    state: Weak<Mutex<EngineState<K, V>>>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    info!("Starting LFU sweep task (interval: {:?})", interval);

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(state) = state.upgrade() else {
                    break;
                };
                let report = sweep_state(&state, interval).await;
                if report.removed() > 0 {
                    debug!(
                        "Sweep removed {} expired and {} stale entries",
                        report.expired, report.stale
                    );
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    debug!("LFU sweep task exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(capacity: usize) -> LfuConfig {
        LfuConfig::builder()
            .capacity(capacity)
            .default_ttl(Duration::ZERO)
            .cleanup_interval(Duration::ZERO)
            .build()
    }

    #[tokio::test]
    async fn test_basic_set_and_get() {
        let cache = LfuCache::new(config(1000));
        let expiry = Instant::now() + Duration::from_secs(1);

        cache.set("a".to_string(), "a".to_string(), Some(expiry)).await;
        assert_eq!(cache.get(&"a".to_string()).await, Some("a".to_string()));
        assert_eq!(cache.len().await, 1);

        cache.set("b".to_string(), "b".to_string(), Some(expiry)).await;
        assert_eq!(cache.get(&"b".to_string()).await, Some("b".to_string()));
        assert_eq!(cache.len().await, 2);

        // a is now at frequency 3, b at 2
        cache.get(&"a".to_string()).await;
        assert_eq!(cache.evict(1).await, 1);

        assert_eq!(cache.get(&"a".to_string()).await, Some("a".to_string()));
        assert_eq!(cache.get(&"b".to_string()).await, None);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_bounds_management() {
        let cache = LfuCache::new(config(5));
        for i in 0..100 {
            cache.set(i.to_string(), i, None).await;
            assert!(cache.len().await <= 10);
        }
    }

    #[tokio::test]
    async fn test_eviction_notification() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let cache = LfuCache::with_eviction_sink(config(1000), tx);

        cache.set("a".to_string(), "b".to_string(), None).await;
        cache.evict(1).await;

        let eviction = rx.recv().await.unwrap();
        assert_eq!(eviction.key, "a");
        assert_eq!(eviction.value, "b");
    }

    #[tokio::test]
    async fn test_lazy_expiration() {
        let cache = LfuCache::new(config(1000));
        let expiry = Instant::now() + Duration::from_millis(10);

        cache.set("a".to_string(), "b".to_string(), Some(expiry)).await;
        assert_eq!(cache.get(&"a".to_string()).await, Some("b".to_string()));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cache.get(&"a".to_string()).await, None);

        let stats = cache.stats().await;
        assert_eq!(stats.expirations_lazy, 1);
        assert_eq!(stats.entries, 0);
    }

    #[tokio::test]
    async fn test_background_sweep() {
        let config = LfuConfig::builder()
            .capacity(1000)
            .cleanup_interval(Duration::from_millis(30))
            .build();
        let cache = LfuCache::new(config);
        assert!(cache.is_sweeping());

        let expiry = Instant::now() + Duration::from_millis(10);
        cache.set("a".to_string(), "b".to_string(), Some(expiry)).await;
        assert_eq!(cache.get(&"a".to_string()).await, Some("b".to_string()));
        assert_eq!(cache.len().await, 1);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(cache.len().await, 0);

        let stats = cache.stats().await;
        assert!(stats.sweep_reclaimed >= 1);
        assert!(stats.last_sweep_at.is_some());

        cache.shutdown().await;
        assert!(!cache.is_sweeping());
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let config = LfuConfig::builder()
            .cleanup_interval(Duration::from_secs(60))
            .build();
        let cache: LfuCache<String, String> = LfuCache::new(config);

        cache.shutdown().await;
        cache.shutdown().await;
        assert!(!cache.is_sweeping());
    }

    #[test]
    fn test_without_runtime_no_sweeper() {
        let config = LfuConfig::builder()
            .cleanup_interval(Duration::from_secs(1))
            .build();
        let cache: LfuCache<String, u32> = LfuCache::new(config);
        assert!(!cache.is_sweeping());
    }

    #[tokio::test]
    async fn test_insert_uses_default_ttl() {
        let config = LfuConfig::builder()
            .default_ttl(Duration::from_millis(20))
            .cleanup_interval(Duration::ZERO)
            .build();
        let cache = LfuCache::new(config);

        cache.insert(1u32, "one".to_string()).await;
        assert_eq!(cache.get(&1).await, Some("one".to_string()));

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cache.get(&1).await, None);
    }

    #[tokio::test]
    async fn test_multi_get_and_multi_set() {
        let cache = LfuCache::new(config(0));
        cache
            .multi_set(vec![("a".to_string(), 1), ("b".to_string(), 2)], None)
            .await;

        let keys = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let values = cache.multi_get(&keys).await;

        assert_eq!(values.len(), 2);
        assert_eq!(values.get("a"), Some(&1));
        assert_eq!(values.get("b"), Some(&2));
        assert!(!values.contains_key("c"));
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let cache = LfuCache::new(config(0));
        cache.set("a".to_string(), 1, None).await;
        cache.set("b".to_string(), 2, None).await;

        assert_eq!(cache.remove(&"a".to_string()).await, Some(1));
        assert_eq!(cache.remove(&"a".to_string()).await, None);
        assert!(!cache.contains_key(&"a".to_string()).await);

        cache.clear().await;
        assert!(cache.is_empty().await);
        assert_eq!(cache.stats().await.buckets, 0);
    }

    #[tokio::test]
    async fn test_stats() {
        let cache = LfuCache::new(config(0));
        cache.set("a".to_string(), 1, None).await;
        cache.get(&"a".to_string()).await;
        cache.get(&"missing".to_string()).await;

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.buckets, 1);
    }
}
