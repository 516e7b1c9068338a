//! Key and value bounds shared by every tier

use std::fmt::Display;
use std::hash::Hash;

/// A cache key.
///
/// The `Display` form is the key's externalized identity: it is used as the
/// remote tier's wire key and as the single-flight deduplication key, so it
/// must be deterministic and agree with `Eq`/`Hash`.
pub trait CacheKey: Eq + Hash + Clone + Display + Send + Sync + 'static {}

impl<T> CacheKey for T where T: Eq + Hash + Clone + Display + Send + Sync + 'static {}

/// A cached payload. The cache never inspects it; values are cloned out of
/// the local tier, so wrap large payloads in `Arc`.
pub trait CacheValue: Clone + Send + Sync + 'static {}

impl<T> CacheValue for T where T: Clone + Send + Sync + 'static {}
