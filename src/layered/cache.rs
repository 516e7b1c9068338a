//! Read-through cache over three tiers: local LFU, remote, loader

use crate::error::Result;
use crate::layered::{
    config::LayeredConfig,
    loader::Loader,
    singleflight::SingleFlight,
    stats::{TierStats, TierStatsSnapshot},
};
use crate::lfu::LfuCache;
use crate::remote::{RemoteError, RemoteTier};
use crate::types::{CacheKey, CacheValue};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Layered read-through cache
///
/// Lookups cascade through the tiers in order of cost:
/// 1. the in-process [`LfuCache`]
/// 2. the shared [`RemoteTier`], whose hits are copied into the local tier
/// 3. the [`Loader`], whose results are written to the local tier and then
///    to the remote tier
///
/// Remote failures never reach the caller: they are logged, counted and
/// treated as misses. Writes go to the local tier first and then to the
/// remote tier, without atomicity across the two.
///
/// Cloning is cheap and every clone shares the same tiers.
pub struct LayeredCache<K: CacheKey, V: CacheValue> {
    inner: Arc<Inner<K, V>>,
}

struct Inner<K: CacheKey, V: CacheValue> {
    config: LayeredConfig,
    local: Arc<LfuCache<K, V>>,
    remote: Arc<dyn RemoteTier<K, V>>,
    loader: Arc<dyn Loader<K, V>>,
    flights: SingleFlight<V>,
    stats: TierStats,
}

impl<K: CacheKey, V: CacheValue> Clone for LayeredCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: CacheKey, V: CacheValue> LayeredCache<K, V> {
    /// Build the cache, creating the local tier from `config.local`
    pub fn new(
        config: LayeredConfig,
        remote: Arc<dyn RemoteTier<K, V>>,
        loader: Arc<dyn Loader<K, V>>,
    ) -> Result<Self> {
        config.validate()?;
        let local = Arc::new(LfuCache::new(config.local.clone()));
        Ok(Self::assemble(config, local, remote, loader))
    }

    /// Build the cache around an existing local tier, e.g. one created with
    /// an eviction sink. `config.local` is ignored in favour of the local
    /// tier's own configuration.
    pub fn with_local(
        config: LayeredConfig,
        local: Arc<LfuCache<K, V>>,
        remote: Arc<dyn RemoteTier<K, V>>,
        loader: Arc<dyn Loader<K, V>>,
    ) -> Result<Self> {
        config.validate()?;
        let config = LayeredConfig {
            local: local.config().clone(),
            ..config
        };
        Ok(Self::assemble(config, local, remote, loader))
    }

    fn assemble(
        config: LayeredConfig,
        local: Arc<LfuCache<K, V>>,
        remote: Arc<dyn RemoteTier<K, V>>,
        loader: Arc<dyn Loader<K, V>>,
    ) -> Self {
        info!(
            "Initializing layered cache (local capacity: {}, remote: {}, remote ttl: {:?})",
            config.local.capacity,
            remote.name(),
            config.remote_ttl
        );

        Self {
            inner: Arc::new(Inner {
                config,
                local,
                remote,
                loader,
                flights: SingleFlight::new(),
                stats: TierStats::new(),
            }),
        }
    }

    /// Look up one key, falling through local, remote and loader.
    ///
    /// `None` means no tier and not the loader produced a value.
    pub async fn get(&self, key: &K) -> Option<V> {
        if let Some(value) = self.inner.local_hit(key).await {
            return Some(value);
        }
        self.inner.load_through(key).await
    }

    /// Like [`get`](Self::get), but concurrent local misses for the same key
    /// share one remote lookup and at most one loader call.
    ///
    /// Keys are coalesced by their `Display` form. Callers for different
    /// keys never wait on each other. If the caller that started a load is
    /// dropped, the remaining waiters keep driving it.
    pub async fn get_with_dedup(&self, key: &K) -> Option<V> {
        if let Some(value) = self.inner.local_hit(key).await {
            return Some(value);
        }

        let inner = Arc::clone(&self.inner);
        let owned = key.clone();
        let (value, joined) = self
            .inner
            .flights
            .run(&key.to_string(), move || async move {
                inner.load_through(&owned).await
            })
            .await;

        if joined {
            self.inner.stats.record_dedup_wait();
            debug!("Joined in-flight load for {}", key);
        }
        value
    }

    /// Write one value to the local tier and then the remote tier
    pub async fn set(&self, key: K, value: V) {
        self.inner.local.insert(key.clone(), value.clone()).await;

        if let Err(e) = self
            .inner
            .remote
            .set(&key, &value, self.inner.config.remote_ttl)
            .await
        {
            self.inner.remote_failed("set", &e);
        }
    }

    /// Look up several keys, cascading only the residual misses to each
    /// lower tier.
    ///
    /// Remote hits are copied into the local tier; loader results into both.
    /// Keys nobody can resolve are absent from the result. Duplicate keys are
    /// looked up once. No deduplication across concurrent callers.
    pub async fn multi_get(&self, keys: &[K]) -> HashMap<K, V> {
        let inner = &self.inner;
        let mut seen = HashSet::with_capacity(keys.len());
        let keys: Vec<K> = keys
            .iter()
            .filter(|k| seen.insert(*k))
            .cloned()
            .collect();

        if keys.is_empty() {
            return HashMap::new();
        }

        // Local tier
        let mut values = inner.local.multi_get(&keys).await;
        inner.stats.record_local_hits(values.len());
        let misses: Vec<K> = keys
            .into_iter()
            .filter(|k| !values.contains_key(k))
            .collect();
        if misses.is_empty() {
            return values;
        }

        // Remote tier
        let remote_hits = match inner.remote.multi_get(&misses).await {
            Ok(hits) => hits,
            Err(e) => {
                inner.remote_failed("multi_get", &e);
                HashMap::new()
            }
        };
        let misses: Vec<K> = misses
            .into_iter()
            .filter(|k| !remote_hits.contains_key(k))
            .collect();
        if !remote_hits.is_empty() {
            inner.stats.record_remote_hits(remote_hits.len());
            inner
                .local
                .multi_insert(remote_hits.iter().map(|(k, v)| (k.clone(), v.clone())))
                .await;
            values.extend(remote_hits);
        }
        if misses.is_empty() {
            return values;
        }

        // Loader
        inner.stats.record_loader_call();
        let mut loaded = inner.loader.load(&misses).await;
        loaded.retain(|k, _| misses.contains(k));
        inner.stats.record_loader_hits(loaded.len());
        inner.stats.record_misses(misses.len() - loaded.len());
        debug!(
            "Loader resolved {} of {} residual keys",
            loaded.len(),
            misses.len()
        );

        if !loaded.is_empty() {
            inner.backfill(&loaded).await;
            values.extend(loaded);
        }
        values
    }

    /// Write several values to the local tier and then the remote tier.
    /// An empty map is a no-op.
    pub async fn multi_set(&self, entries: HashMap<K, V>) {
        if entries.is_empty() {
            return;
        }
        self.inner.backfill(&entries).await;
    }

    /// The local LFU tier, for direct inspection
    pub fn local(&self) -> &Arc<LfuCache<K, V>> {
        &self.inner.local
    }

    pub fn config(&self) -> &LayeredConfig {
        &self.inner.config
    }

    /// Counters across all tiers
    pub fn stats(&self) -> TierStatsSnapshot {
        self.inner.stats.snapshot()
    }

    /// Number of keys with a deduplicated load in progress
    pub fn in_flight(&self) -> usize {
        self.inner.flights.in_flight()
    }

    /// Stop the local tier's background sweep
    pub async fn shutdown(&self) {
        self.inner.local.shutdown().await;
        info!("Layered cache shut down");
    }
}

impl<K: CacheKey, V: CacheValue> Inner<K, V> {
    async fn local_hit(&self, key: &K) -> Option<V> {
        let value = self.local.get(key).await?;
        self.stats.record_local_hits(1);
        Some(value)
    }

    /// Remote lookup, then loader, with backfill. Runs after a local miss.
    async fn load_through(&self, key: &K) -> Option<V> {
        match self.remote.get(key).await {
            Ok(Some(value)) => {
                self.stats.record_remote_hits(1);
                debug!("Remote hit for {}", key);
                self.local.insert(key.clone(), value.clone()).await;
                return Some(value);
            }
            Ok(None) => {}
            Err(e) => self.remote_failed("get", &e),
        }

        self.stats.record_loader_call();
        let mut loaded = self.loader.load(std::slice::from_ref(key)).await;
        let Some(value) = loaded.remove(key) else {
            self.stats.record_misses(1);
            debug!("No tier resolved {}", key);
            return None;
        };

        self.stats.record_loader_hits(1);
        self.local.insert(key.clone(), value.clone()).await;
        if let Err(e) = self
            .remote
            .set(key, &value, self.config.remote_ttl)
            .await
        {
            self.remote_failed("set", &e);
        }
        Some(value)
    }

    async fn backfill(&self, entries: &HashMap<K, V>) {
        self.local
            .multi_insert(entries.iter().map(|(k, v)| (k.clone(), v.clone())))
            .await;

        if let Err(e) = self
            .remote
            .multi_set(entries, self.config.remote_ttl)
            .await
        {
            self.remote_failed("multi_set", &e);
        }
    }

    fn remote_failed(&self, operation: &str, error: &RemoteError) {
        self.stats.record_remote_error();
        if error.is_transport() {
            warn!(
                "Remote tier '{}' {} failed, continuing without it: {}",
                self.remote.name(),
                operation,
                error
            );
        } else {
            warn!(
                "Remote tier '{}' {} hit a bad value, treating it as a miss: {}",
                self.remote.name(),
                operation,
                error
            );
        }
    }
}
