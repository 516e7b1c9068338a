//! Remote (shared) cache tier
//!
//! The layered cache talks to the shared tier only through [`RemoteTier`].
//! A missing key is `Ok(None)` or an absent map entry; errors are reserved
//! for transport and marshalling failures, which the layered cache logs and
//! treats as misses.

pub mod codec;
pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

use crate::types::{CacheKey, CacheValue};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

pub use codec::{JsonCodec, StringCodec, ValueCodec};
pub use memory::MemoryRemote;
#[cfg(feature = "redis")]
pub use self::redis::RedisRemote;

/// Failure talking to the remote tier
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Backend unreachable or protocol failure
    #[error("transport failure: {0}")]
    Transport(String),

    /// A stored value could not be encoded or decoded
    #[error("codec failure for '{key}': {reason}")]
    Codec { key: String, reason: String },
}

impl RemoteError {
    pub fn is_transport(&self) -> bool {
        matches!(self, RemoteError::Transport(_))
    }
}

/// Shared cache tier sitting between the local engine and the loader.
///
/// Keys travel as their `Display` form. Implementations must accept empty
/// key sets and empty maps as no-ops.
#[async_trait]
pub trait RemoteTier<K: CacheKey, V: CacheValue>: Send + Sync {
    /// Fetch one value
    async fn get(&self, key: &K) -> Result<Option<V>, RemoteError>;

    /// Store one value; a zero `ttl` stores without expiry
    async fn set(&self, key: &K, value: &V, ttl: Duration) -> Result<(), RemoteError>;

    /// Fetch several values; keys without a value are omitted
    async fn multi_get(&self, keys: &[K]) -> Result<HashMap<K, V>, RemoteError>;

    /// Store several values with one ttl
    async fn multi_set(&self, entries: &HashMap<K, V>, ttl: Duration) -> Result<(), RemoteError>;

    /// Short name used in logs
    fn name(&self) -> &str {
        "remote"
    }
}
