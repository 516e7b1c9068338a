//! # Onion Cache (onion-cache)
//!
//! A layered read-through cache for Rust services.
//!
//! ## Features
//!
//! - In-process LFU tier with O(1) frequency promotion
//! - Bulk eviction with 2x capacity hysteresis
//! - Lazy expiration plus a background sweep with explicit shutdown
//! - Shared remote tier (in-memory, or Redis behind the `redis` feature)
//! - Caller-supplied loader for the source of truth
//! - Per-key request deduplication to stop cache stampedes
//! - Fail-open handling of remote tier outages
//!
//! ## Local Tier
//! The [`LfuCache`] engine can be used on its own.
//!
//! ```no_run
//! use onion_cache::{LfuCache, LfuConfig};
//! use std::time::{Duration, Instant};
//!
//! #[tokio::main]
//! async fn main() {
//!     let cache = LfuCache::new(LfuConfig::default());
//!
//!     let expiry = Instant::now() + Duration::from_millis(10);
//!     cache.set("a".to_string(), "b".to_string(), Some(expiry)).await;
//!     assert_eq!(cache.get(&"a".to_string()).await, Some("b".to_string()));
//!
//!     tokio::time::sleep(Duration::from_millis(20)).await;
//!     assert_eq!(cache.get(&"a".to_string()).await, None);
//!
//!     cache.shutdown().await;
//! }
//! ```
//!
//! ## Layered Lookups
//! [`LayeredCache`] cascades local → remote → loader and backfills on the
//! way out.
//!
//! ```no_run
//! use onion_cache::{loader_fn, LayeredCache, LayeredConfig, MemoryRemote};
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = HashMap::from([
//!         ("video_1".to_string(), "t1".to_string()),
//!         ("pic_2".to_string(), "t2".to_string()),
//!     ]);
//!     let loader = loader_fn(move |keys: Vec<String>| {
//!         let found: HashMap<String, String> = keys
//!             .into_iter()
//!             .filter_map(|k| db.get(&k).map(|v| (k, v.clone())))
//!             .collect();
//!         async move { found }
//!     });
//!
//!     let cache = LayeredCache::<String, String>::new(
//!         LayeredConfig::default(),
//!         Arc::new(MemoryRemote::<String>::new()),
//!         Arc::new(loader),
//!     )?;
//!
//!     let values = cache
//!         .multi_get(&["video_1".to_string(), "pic_2".to_string()])
//!         .await;
//!     println!("Loaded {} values, stats: {}", values.len(), cache.stats());
//!
//!     cache.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod layered;
pub mod lfu;
pub mod remote;
pub mod types;

// Re-export main types for convenience
pub use error::{CacheError, Result};
pub use layered::{
    loader_fn, FnLoader, LayeredCache, LayeredConfig, LayeredConfigBuilder, Loader, SingleFlight,
    TierStats, TierStatsSnapshot,
};
pub use lfu::{Eviction, LfuCache, LfuConfig, LfuConfigBuilder, LfuStats, SweepReport};
pub use remote::{JsonCodec, MemoryRemote, RemoteError, RemoteTier, StringCodec, ValueCodec};
pub use types::{CacheKey, CacheValue};
