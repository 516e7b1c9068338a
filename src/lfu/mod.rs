//! # LFU Engine
//!
//! The in-process tier: an approximate least-frequently-used cache.
//!
//! ## Features
//!
//! - **Frequency Buckets**: entries are grouped by access count in an
//!   ascending bucket list; a hit moves an entry one bucket up in O(1)
//! - **Hysteresis Eviction**: nothing is evicted until the size passes twice
//!   the capacity, then the lowest-frequency entries go in one batch until
//!   the size is back at the capacity
//! - **Lazy Expiration**: expired entries are dropped when read
//! - **Background Sweep**: a periodic task drops expired entries and entries
//!   nobody touched for a full sweep interval
//! - **Eviction Notifications**: evicted pairs can be streamed to a channel
//!
//! ## Example
//!
//! ```rust
//! use onion_cache::lfu::{LfuCache, LfuConfig};
//! use std::time::Duration;
//!
//! # async fn example() {
//! let config = LfuConfig::builder()
//!     .capacity(10_000)
//!     .default_ttl(Duration::from_secs(60))
//!     .cleanup_interval(Duration::from_secs(60))
//!     .build();
//!
//! let cache = LfuCache::new(config);
//! cache.insert("query:123".to_string(), "cached response".to_string()).await;
//!
//! if let Some(value) = cache.get(&"query:123".to_string()).await {
//!     println!("Cache hit: {}", value);
//! }
//!
//! cache.shutdown().await;
//! # }
//! ```

pub mod buckets;
pub mod config;
pub mod entry;
pub mod frequency;
pub mod store;
pub mod types;

pub use config::{LfuConfig, LfuConfigBuilder};
pub use entry::LfuEntry;
pub use frequency::{FrequencyStore, Lookup};
pub use store::LfuCache;
pub use types::{Eviction, LfuStats, SweepReport};
