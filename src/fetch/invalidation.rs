//! Process-wide registry of bindings interested in a cache key.
//!
//! Bindings register on mount and deregister on drop. Any mutation can
//! broadcast an invalidation by key name without holding a reference to the
//! bindings themselves.

use log::*;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

#[derive(Default)]
struct Registry {
    next_id: u64,
    subscribers: HashMap<String, BTreeMap<u64, Arc<Notify>>>,
}

/// Broadcast channel for cache invalidations. Cloning shares the registry.
///
#[derive(Clone, Default)]
pub struct InvalidationBus {
    registry: Arc<Mutex<Registry>>,
}

impl InvalidationBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in a cache key until the subscription is dropped.
    ///
    pub fn register(&self, key: &str) -> Subscription {
        let notify = Arc::new(Notify::new());
        let id = {
            let mut registry = self.registry();
            registry.next_id += 1;
            let id = registry.next_id;
            registry
                .subscribers
                .entry(key.to_owned())
                .or_default()
                .insert(id, Arc::clone(&notify));
            id
        };
        trace!("Registered subscriber {} for cache key '{}'", id, key);
        Subscription {
            registry: Arc::clone(&self.registry),
            key: key.to_owned(),
            id,
            notify,
        }
    }

    /// Signal every binding registered under one of the keys. Returns how
    /// many subscriptions were signalled.
    ///
    pub fn invalidate<S: AsRef<str>>(&self, keys: &[S]) -> usize {
        let registry = self.registry();
        let mut signalled = 0;
        for key in keys {
            let key = key.as_ref();
            if let Some(subscribers) = registry.subscribers.get(key) {
                for notify in subscribers.values() {
                    notify.notify_one();
                }
                signalled += subscribers.len();
            }
            debug!("Invalidated cache key '{}'", key);
        }
        signalled
    }

    /// Number of live subscriptions for a key.
    ///
    pub fn subscribers(&self, key: &str) -> usize {
        self.registry()
            .subscribers
            .get(key)
            .map_or(0, BTreeMap::len)
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Registration of one binding on the bus.
///
pub struct Subscription {
    registry: Arc<Mutex<Registry>>,
    key: String,
    id: u64,
    notify: Arc<Notify>,
}

impl Subscription {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Signal raised on invalidation. A signal sent while nobody waits is
    /// kept until the next wait.
    ///
    pub fn signal(&self) -> Arc<Notify> {
        Arc::clone(&self.notify)
    }

    /// Wait for the next invalidation of this key.
    ///
    pub async fn notified(&self) {
        self.notify.notified().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(subscribers) = registry.subscribers.get_mut(&self.key) {
            subscribers.remove(&self.id);
            if subscribers.is_empty() {
                registry.subscribers.remove(&self.key);
            }
        }
        trace!("Deregistered subscriber {} for cache key '{}'", self.id, self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn register_and_drop() {
        let bus = InvalidationBus::new();
        let a = bus.register("balances");
        let b = bus.register("balances");
        let c = bus.register("tickets");
        assert_eq!(bus.subscribers("balances"), 2);
        assert_eq!(bus.subscribers("tickets"), 1);
        assert_eq!(c.key(), "tickets");

        drop(a);
        assert_eq!(bus.subscribers("balances"), 1);
        drop(b);
        drop(c);
        assert_eq!(bus.subscribers("balances"), 0);
        assert_eq!(bus.subscribers("tickets"), 0);
    }

    #[test]
    fn invalidate_counts_matching_subscribers() {
        let bus = InvalidationBus::new();
        let _a = bus.register("balances");
        let _b = bus.register("operations");
        let _c = bus.register("operations");
        assert_eq!(bus.invalidate(&["balances", "operations"]), 3);
        assert_eq!(bus.invalidate(&["tickets"]), 0);
        assert_eq!(bus.invalidate::<&str>(&[]), 0);
    }

    #[test]
    fn clones_share_the_registry() {
        let bus = InvalidationBus::new();
        let other = bus.clone();
        let _subscription = bus.register("balances");
        assert_eq!(other.invalidate(&["balances"]), 1);
    }

    #[tokio::test]
    async fn signal_sent_before_waiting_is_kept() {
        let bus = InvalidationBus::new();
        let subscription = bus.register("balances");
        bus.invalidate(&["balances"]);
        tokio::time::timeout(Duration::from_secs(1), subscription.notified())
            .await
            .expect("invalidation should have been kept");
    }

    #[tokio::test]
    async fn other_keys_do_not_wake() {
        let bus = InvalidationBus::new();
        let subscription = bus.register("balances");
        bus.invalidate(&["tickets"]);
        let woke = tokio::time::timeout(Duration::from_millis(20), subscription.notified()).await;
        assert!(woke.is_err());
    }
}
