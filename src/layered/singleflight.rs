//! Per-key request coalescing
//!
//! The first caller for a key registers a shared future and drives it; any
//! caller arriving for the same key while it is registered awaits the same
//! future instead of running its own. The registration is removed as soon as
//! the work finishes (or unwinds), so the next caller starts a fresh flight.
//! Different keys never wait on each other.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError, Weak};

type Flight<V> = Shared<BoxFuture<'static, Option<V>>>;
type Registry<V> = Mutex<HashMap<String, Flight<V>>>;

/// Coalesces concurrent loads that share a key
pub struct SingleFlight<V> {
    flights: Arc<Registry<V>>,
}

/// Unregisters a flight when its work completes or is torn down
struct FlightGuard<V> {
    registry: Weak<Registry<V>>,
    key: String,
}

impl<V> Drop for FlightGuard<V> {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let removed = registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
        drop(removed);
    }
}

impl<V> SingleFlight<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            flights: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Run `work` for `key` unless a flight for `key` is already running, in
    /// which case wait for that one.
    ///
    /// Returns the flight's result and whether this caller joined someone
    /// else's flight. `work` is only invoked when this caller starts the
    /// flight.
    pub async fn run<F, Fut>(&self, key: &str, work: F) -> (Option<V>, bool)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<V>> + Send + 'static,
    {
        let (flight, joined) = {
            let mut flights = self.flights.lock().unwrap_or_else(PoisonError::into_inner);

            match flights.get(key) {
                Some(existing) => (existing.clone(), true),
                None => {
                    let guard = FlightGuard {
                        registry: Arc::downgrade(&self.flights),
                        key: key.to_string(),
                    };
                    let pending = work();
                    let flight = async move {
                        let _guard = guard;
                        pending.await
                    }
                    .boxed()
                    .shared();

                    flights.insert(key.to_string(), flight.clone());
                    (flight, false)
                }
            }
        };

        (flight.await, joined)
    }

    /// Number of keys with a flight in progress
    pub fn in_flight(&self) -> usize {
        self.flights
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl<V> Default for SingleFlight<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;
    use tokio_test::{assert_pending, assert_ready, task};

    #[test]
    fn test_follower_joins_leader_flight() {
        let group: SingleFlight<String> = SingleFlight::new();
        let calls = AtomicUsize::new(0);
        let (tx, rx) = oneshot::channel::<()>();

        let mut leader = task::spawn(group.run("video_1", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                let _ = rx.await;
                Some("t1".to_string())
            }
        }));
        assert_pending!(leader.poll());
        assert_eq!(group.in_flight(), 1);

        let mut follower = task::spawn(group.run("video_1", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Some("other".to_string()) }
        }));
        assert_pending!(follower.poll());

        tx.send(()).unwrap();
        assert_eq!(assert_ready!(leader.poll()), (Some("t1".to_string()), false));
        assert_eq!(assert_ready!(follower.poll()), (Some("t1".to_string()), true));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(group.in_flight(), 0);
    }

    #[test]
    fn test_distinct_keys_do_not_wait_on_each_other() {
        let group: SingleFlight<u32> = SingleFlight::new();
        let (_tx, rx) = oneshot::channel::<()>();

        let mut blocked = task::spawn(group.run("a", || async move {
            let _ = rx.await;
            Some(1)
        }));
        assert_pending!(blocked.poll());

        let mut other = task::spawn(group.run("b", || async { Some(2) }));
        assert_eq!(assert_ready!(other.poll()), (Some(2), false));
        assert_eq!(group.in_flight(), 1);
    }

    #[tokio::test]
    async fn test_miss_is_shared_and_flight_cleared() {
        let group: SingleFlight<String> = SingleFlight::new();

        let (value, joined) = group.run("missing", || async { None }).await;
        assert_eq!(value, None);
        assert!(!joined);
        assert_eq!(group.in_flight(), 0);

        // a later call starts a new flight
        let (value, joined) = group.run("missing", || async { Some("now".to_string()) }).await;
        assert_eq!(value, Some("now".to_string()));
        assert!(!joined);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_collapse() {
        let group = Arc::new(SingleFlight::<String>::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let group = Arc::clone(&group);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                group
                    .run("k", || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        async {
                            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
                            Some("v".to_string())
                        }
                    })
                    .await
            }));
        }

        for handle in handles {
            let (value, _) = handle.await.unwrap();
            assert_eq!(value, Some("v".to_string()));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
