//! # Layered Cache
//!
//! Read-through orchestration over three tiers:
//!
//! - **Local**: the in-process [`LfuCache`](crate::lfu::LfuCache)
//! - **Remote**: a shared store behind [`RemoteTier`](crate::remote::RemoteTier)
//! - **Loader**: the source of truth, supplied by the caller as a [`Loader`]
//!
//! A miss at one tier falls through to the next, and whatever a lower tier
//! finds is written back into the tiers above it. Remote failures degrade to
//! misses. [`LayeredCache::get_with_dedup`] additionally collapses concurrent
//! misses for the same key into a single load.
//!
//! ## Example
//!
//! ```rust
//! use onion_cache::layered::{loader_fn, LayeredCache, LayeredConfig};
//! use onion_cache::remote::MemoryRemote;
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! # async fn example() -> onion_cache::Result<()> {
//! let loader = loader_fn(|keys: Vec<String>| async move {
//!     keys.into_iter()
//!         .map(|k| {
//!             let v = format!("loaded:{}", k);
//!             (k, v)
//!         })
//!         .collect::<HashMap<_, _>>()
//! });
//!
//! let cache = LayeredCache::<String, String>::new(
//!     LayeredConfig::default(),
//!     Arc::new(MemoryRemote::<String>::new()),
//!     Arc::new(loader),
//! )?;
//!
//! let value = cache.get_with_dedup(&"video_1".to_string()).await;
//! assert_eq!(value.as_deref(), Some("loaded:video_1"));
//!
//! cache.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod loader;
pub mod singleflight;
pub mod stats;

pub use cache::LayeredCache;
pub use config::{LayeredConfig, LayeredConfigBuilder};
pub use loader::{loader_fn, FnLoader, Loader};
pub use singleflight::SingleFlight;
pub use stats::{TierStats, TierStatsSnapshot};
