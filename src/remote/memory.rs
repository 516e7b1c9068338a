//! In-process remote tier
//!
//! Behaves like a shared key-value store: values are indexed by the key's
//! wire form and honour TTLs. It can be switched into an unavailable state
//! where every call fails with a transport error, which is how the layered
//! cache's fail-open path is exercised without a real backend.

use super::{RemoteError, RemoteTier};
use crate::types::{CacheKey, CacheValue};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct StoredValue<V> {
    value: V,
    expires_at: Option<Instant>,
}

impl<V> StoredValue<V> {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// Remote tier held in process memory
pub struct MemoryRemote<V> {
    data: RwLock<HashMap<String, StoredValue<V>>>,
    unavailable: AtomicBool,
    calls: AtomicU64,
}

impl<V: CacheValue> MemoryRemote<V> {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
            unavailable: AtomicBool::new(false),
            calls: AtomicU64::new(0),
        }
    }

    /// Simulate the backend going away (or coming back)
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of tier operations served or rejected so far
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Read a value by wire key without counting a call
    pub async fn peek(&self, wire_key: &str) -> Option<V> {
        let data = self.data.read().await;
        data.get(wire_key)
            .filter(|stored| stored.is_live(Instant::now()))
            .map(|stored| stored.value.clone())
    }

    /// Number of live entries
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.data
            .read()
            .await
            .values()
            .filter(|stored| stored.is_live(now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn begin_call(&self) -> Result<(), RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RemoteError::Transport("memory remote unavailable".to_string()));
        }
        Ok(())
    }

    fn stored(value: V, ttl: Duration, now: Instant) -> StoredValue<V> {
        let expires_at = if ttl.is_zero() {
            None
        } else {
            now.checked_add(ttl)
        };
        StoredValue { value, expires_at }
    }
}

impl<V: CacheValue> Default for MemoryRemote<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<K: CacheKey, V: CacheValue> RemoteTier<K, V> for MemoryRemote<V> {
    async fn get(&self, key: &K) -> Result<Option<V>, RemoteError> {
        self.begin_call()?;
        Ok(self.peek(&key.to_string()).await)
    }

    async fn set(&self, key: &K, value: &V, ttl: Duration) -> Result<(), RemoteError> {
        self.begin_call()?;
        let stored = Self::stored(value.clone(), ttl, Instant::now());
        self.data.write().await.insert(key.to_string(), stored);
        Ok(())
    }

    async fn multi_get(&self, keys: &[K]) -> Result<HashMap<K, V>, RemoteError> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }
        self.begin_call()?;

        let now = Instant::now();
        let data = self.data.read().await;
        let values = keys
            .iter()
            .filter_map(|key| {
                data.get(&key.to_string())
                    .filter(|stored| stored.is_live(now))
                    .map(|stored| (key.clone(), stored.value.clone()))
            })
            .collect();
        Ok(values)
    }

    async fn multi_set(&self, entries: &HashMap<K, V>, ttl: Duration) -> Result<(), RemoteError> {
        if entries.is_empty() {
            return Ok(());
        }
        self.begin_call()?;

        let now = Instant::now();
        let mut data = self.data.write().await;
        data.retain(|_, stored| stored.is_live(now));
        for (key, value) in entries {
            data.insert(key.to_string(), Self::stored(value.clone(), ttl, now));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
