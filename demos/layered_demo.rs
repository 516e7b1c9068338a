//! Layered Cache Demo Application
//!
//! Walks a lookup through all three tiers, shows stampede protection and
//! degrades gracefully while the remote tier is down.
//!
//! Usage:
//!   cargo run --example layered_demo
//!   cargo run --example layered_demo --features redis
//!
//! Environment variables:
//!   RUST_LOG  - log filter (default: info,onion_cache=debug)
//!   REDIS_URL - Redis URL for the remote tier, with the `redis` feature
//!               (default: in-process remote tier)

use onion_cache::{loader_fn, LayeredCache, LayeredConfig, MemoryRemote, RemoteTier};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,onion_cache=debug")),
        )
        .init();

    info!("=== Layered Cache Demo ===");

    // Simulated database
    let db = Arc::new(HashMap::from([
        ("video_1".to_string(), "t1".to_string()),
        ("pic_2".to_string(), "t2".to_string()),
    ]));
    let db_reads = Arc::new(AtomicUsize::new(0));

    let loader = {
        let db = Arc::clone(&db);
        let db_reads = Arc::clone(&db_reads);
        loader_fn(move |keys: Vec<String>| {
            db_reads.fetch_add(1, Ordering::SeqCst);
            let db = Arc::clone(&db);
            async move {
                // pretend the database is slow
                tokio::time::sleep(Duration::from_millis(100)).await;
                keys.into_iter()
                    .filter_map(|k| db.get(&k).map(|v| (k, v.clone())))
                    .collect::<HashMap<_, _>>()
            }
        })
    };

    let memory = Arc::new(MemoryRemote::<String>::new());
    let remote = remote_tier(Arc::clone(&memory)).await;

    let config = LayeredConfig::builder()
        .local_capacity(10_000)
        .local_ttl(Duration::from_secs(60))
        .sweep_interval(Duration::from_secs(30))
        .remote_ttl(Duration::from_secs(300))
        .build();
    let cache = LayeredCache::<String, String>::new(config, remote, Arc::new(loader))?;

    info!("\n--- Cold lookup (falls through to the database) ---");
    let value = cache.get(&"video_1".to_string()).await;
    info!("video_1 = {:?} (database reads: {})", value, db_reads.load(Ordering::SeqCst));

    info!("\n--- Warm lookup (served by the local tier) ---");
    let value = cache.get(&"video_1".to_string()).await;
    info!("video_1 = {:?} (database reads: {})", value, db_reads.load(Ordering::SeqCst));

    info!("\n--- Stampede: 50 concurrent lookups of a cold key ---");
    let mut handles = Vec::new();
    for _ in 0..50 {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move {
            cache.get_with_dedup(&"pic_2".to_string()).await
        }));
    }
    for handle in handles {
        handle.await?;
    }
    info!("database reads after stampede: {}", db_reads.load(Ordering::SeqCst));

    info!("\n--- Batch lookup with an unknown key ---");
    let values = cache
        .multi_get(&[
            "video_1".to_string(),
            "pic_2".to_string(),
            "missing".to_string(),
        ])
        .await;
    info!("resolved {} of 3 keys", values.len());

    info!("\n--- Remote tier outage ---");
    memory.set_unavailable(true);
    cache.set("video_9".to_string(), "t9".to_string()).await;
    let value = cache.get(&"video_9".to_string()).await;
    info!("video_9 = {:?} while the remote tier is down", value);
    memory.set_unavailable(false);

    info!("\n--- Statistics ---");
    info!("{}", cache.stats());
    info!("{}", cache.local().stats().await);

    cache.shutdown().await;
    info!("\n=== Demo Complete ===");

    Ok(())
}

#[cfg(feature = "redis")]
async fn remote_tier(memory: Arc<MemoryRemote<String>>) -> Arc<dyn RemoteTier<String, String>> {
    use onion_cache::remote::RedisRemote;
    use onion_cache::StringCodec;

    let Ok(url) = std::env::var("REDIS_URL") else {
        info!("REDIS_URL not set, using the in-process remote tier");
        return memory;
    };

    match RedisRemote::with_prefix(&url, Some("onion-demo:"), StringCodec).await {
        Ok(redis) => Arc::new(redis),
        Err(e) => {
            info!("Redis unavailable ({}), using the in-process remote tier", e);
            memory
        }
    }
}

#[cfg(not(feature = "redis"))]
async fn remote_tier(memory: Arc<MemoryRemote<String>>) -> Arc<dyn RemoteTier<String, String>> {
    memory
}
