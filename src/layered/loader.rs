//! Authoritative-source loader

use crate::types::{CacheKey, CacheValue};
use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;

/// Fetches values from the source of truth on a full cache miss.
///
/// The returned map may omit keys the source cannot resolve; those keys are
/// reported as not found for that request. Loader failures are the loader's
/// business: return what was resolved and log the rest.
#[async_trait]
pub trait Loader<K: CacheKey, V: CacheValue>: Send + Sync {
    async fn load(&self, keys: &[K]) -> HashMap<K, V>;
}

/// Loader backed by an async closure taking the missing keys
pub struct FnLoader<F> {
    f: F,
}

/// Wrap an async closure as a [`Loader`]
///
/// ```rust
/// use onion_cache::layered::loader_fn;
/// use std::collections::HashMap;
///
/// let loader = loader_fn(|keys: Vec<String>| async move {
///     keys.into_iter()
///         .map(|k| {
///             let v = k.to_uppercase();
///             (k, v)
///         })
///         .collect::<HashMap<_, _>>()
/// });
/// # let _ = loader;
/// ```
pub fn loader_fn<F>(f: F) -> FnLoader<F> {
    FnLoader { f }
}

#[async_trait]
impl<K, V, F, Fut> Loader<K, V> for FnLoader<F>
where
    K: CacheKey,
    V: CacheValue,
    F: Fn(Vec<K>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HashMap<K, V>> + Send + 'static,
{
    async fn load(&self, keys: &[K]) -> HashMap<K, V> {
        (self.f)(keys.to_vec()).await
    }
}
