//! Redis remote tier
//!
//! Values are marshalled to strings with a [`ValueCodec`] and stored under
//! `prefix + key`:
//! - single reads use `GET`, batch reads one `MGET`
//! - writes use `SET key value PX ttl_ms` (plain `SET` for a zero ttl)
//! - batch writes are pipelined
//!
//! The connection is a `ConnectionManager`, which reconnects on its own
//! after a dropped connection; calls made while it is down fail with
//! [`RemoteError::Transport`].

use super::{RemoteError, RemoteTier, ValueCodec};
use crate::types::{CacheKey, CacheValue};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};

pub struct RedisRemote<C> {
    connection: ConnectionManager,
    /// Optional key prefix for namespacing (e.g., "myapp:" → "myapp:video_1")
    prefix: String,
    codec: C,
}

impl<C> RedisRemote<C> {
    /// Connect without a key prefix
    pub async fn connect(connection_string: &str, codec: C) -> Result<Self, RemoteError> {
        Self::with_prefix(connection_string, None, codec).await
    }

    /// Connect with an optional key prefix prepended to every key
    pub async fn with_prefix(
        connection_string: &str,
        prefix: Option<&str>,
        codec: C,
    ) -> Result<Self, RemoteError> {
        let client = Client::open(connection_string).map_err(transport)?;
        let connection = ConnectionManager::new(client).await.map_err(transport)?;

        info!("Connected redis remote tier at {}", connection_string);
        Ok(Self {
            connection,
            prefix: prefix.unwrap_or("").to_string(),
            codec,
        })
    }

    /// Get the configured prefix
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[inline]
    fn wire_key<K: CacheKey>(&self, key: &K) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}{}", self.prefix, key)
        }
    }
}

fn transport(e: redis::RedisError) -> RemoteError {
    RemoteError::Transport(e.to_string())
}

fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

fn decode_with<K, V, C>(codec: &C, key: &K, raw: &str) -> Result<V, RemoteError>
where
    K: CacheKey,
    C: ValueCodec<V>,
{
    codec.decode(raw).map_err(|e| RemoteError::Codec {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

/// Pair an `MGET` reply with its keys. A value that fails to decode is
/// logged and left out, so the caller treats that key as a miss.
fn decode_batch<K, V, C>(codec: &C, keys: &[K], raw: Vec<Option<String>>) -> HashMap<K, V>
where
    K: CacheKey,
    C: ValueCodec<V>,
{
    let mut values = HashMap::with_capacity(keys.len());
    for (key, raw) in keys.iter().zip(raw) {
        let Some(raw) = raw else {
            continue;
        };
        match decode_with(codec, key, &raw) {
            Ok(value) => {
                values.insert(key.clone(), value);
            }
            Err(e) => warn!("Skipping undecodable redis value: {}", e),
        }
    }
    values
}

impl<C> RedisRemote<C> {
    fn decode<K, V>(&self, key: &K, raw: &str) -> Result<V, RemoteError>
    where
        K: CacheKey,
        C: ValueCodec<V>,
    {
        decode_with(&self.codec, key, raw)
    }

    fn encode<K, V>(&self, key: &K, value: &V) -> Result<String, RemoteError>
    where
        K: CacheKey,
        C: ValueCodec<V>,
    {
        self.codec.encode(value).map_err(|e| RemoteError::Codec {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl<K, V, C> RemoteTier<K, V> for RedisRemote<C>
where
    K: CacheKey,
    V: CacheValue,
    C: ValueCodec<V> + 'static,
{
    async fn get(&self, key: &K) -> Result<Option<V>, RemoteError> {
        let mut conn = self.connection.clone();
        let raw: Option<String> = conn.get(self.wire_key(key)).await.map_err(transport)?;

        raw.map(|raw| self.decode(key, &raw)).transpose()
    }

    async fn set(&self, key: &K, value: &V, ttl: Duration) -> Result<(), RemoteError> {
        let payload = self.encode(key, value)?;
        let mut conn = self.connection.clone();

        let mut cmd = redis::cmd("SET");
        cmd.arg(self.wire_key(key)).arg(payload);
        if !ttl.is_zero() {
            cmd.arg("PX").arg(ttl_millis(ttl));
        }
        let _: () = cmd.query_async(&mut conn).await.map_err(transport)?;
        Ok(())
    }

    async fn multi_get(&self, keys: &[K]) -> Result<HashMap<K, V>, RemoteError> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }

        let wire_keys: Vec<String> = keys.iter().map(|k| self.wire_key(k)).collect();
        let mut conn = self.connection.clone();
        let raw: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&wire_keys)
            .query_async(&mut conn)
            .await
            .map_err(transport)?;

        Ok(decode_batch(&self.codec, keys, raw))
    }

    async fn multi_set(&self, entries: &HashMap<K, V>, ttl: Duration) -> Result<(), RemoteError> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut pipe = redis::pipe();
        for (key, value) in entries {
            let payload = self.encode(key, value)?;
            if ttl.is_zero() {
                pipe.cmd("SET").arg(self.wire_key(key)).arg(payload).ignore();
            } else {
                pipe.cmd("SET")
                    .arg(self.wire_key(key))
                    .arg(payload)
                    .arg("PX")
                    .arg(ttl_millis(ttl))
                    .ignore();
            }
        }

        let mut conn = self.connection.clone();
        let _: () = pipe.query_async(&mut conn).await.map_err(transport)?;
        Ok(())
    }

    fn name(&self) -> &str {
        "redis"
    }
}
