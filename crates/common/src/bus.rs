//! In-process reload notifications.
//!
//! Listeners are invoked synchronously on the publishing task. The listener
//! list is snapshotted before delivery so a listener may subscribe or
//! unsubscribe from inside its own callback.

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::path::ContentPath;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReloadEvent {
    pub path: ContentPath,
}

pub type Listener = Arc<dyn Fn(&ReloadEvent) -> anyhow::Result<()> + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: AtomicU64,
    entries: RwLock<BTreeMap<u64, Listener>>,
}

#[derive(Clone, Default)]
pub struct ReloadBus {
    inner: Arc<Listeners>,
}

impl std::fmt::Debug for ReloadBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReloadBus")
            .field("listeners", &self.len())
            .finish()
    }
}

/// Unsubscribes its listener when dropped.
#[must_use = "dropping a subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    bus: Weak<Listeners>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.bus.upgrade() {
            listeners.entries.write().remove(&self.id);
        }
    }
}

impl ReloadBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ReloadEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.entries.write().insert(id, Arc::new(listener));
        tracing::debug!(id, "reload listener subscribed");
        Subscription {
            id,
            bus: Arc::downgrade(&self.inner),
        }
    }

    pub fn unsubscribe(&self, id: u64) -> bool {
        self.inner.entries.write().remove(&id).is_some()
    }

    pub fn clear(&self) {
        self.inner.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `event` to every listener. Returns how many succeeded.
    pub fn publish(&self, event: &ReloadEvent) -> usize {
        let snapshot: Vec<(u64, Listener)> = self
            .inner
            .entries
            .read()
            .iter()
            .map(|(id, listener)| (*id, listener.clone()))
            .collect();

        let mut delivered = 0;
        for (id, listener) in snapshot {
            match catch_unwind(AssertUnwindSafe(|| listener(event))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => {
                    tracing::error!(id, path = %event.path, error = %e, "reload listener failed")
                }
                Err(_) => tracing::error!(id, path = %event.path, "reload listener panicked"),
            }
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    fn event() -> ReloadEvent {
        ReloadEvent {
            path: ContentPath::parse("/blog").unwrap(),
        }
    }

    #[test]
    fn test_failing_listener_does_not_block_delivery() {
        let bus = ReloadBus::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let _failing = bus.subscribe(|_| anyhow::bail!("boom"));
        let _panicking = bus.subscribe(|_| panic!("listener panic"));
        let counter = hits.clone();
        let _ok = bus.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert_eq!(bus.publish(&event()), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let bus = ReloadBus::new();
        let subscription = bus.subscribe(|_| Ok(()));
        assert_eq!(bus.len(), 1);
        drop(subscription);
        assert!(bus.is_empty());
    }

    #[test]
    fn test_unsubscribe_and_clear() {
        let bus = ReloadBus::new();
        let first = bus.subscribe(|_| Ok(()));
        let _second = bus.subscribe(|_| Ok(()));
        assert!(bus.unsubscribe(first.id()));
        assert!(!bus.unsubscribe(first.id()));
        assert_eq!(bus.len(), 1);
        bus.clear();
        assert_eq!(bus.publish(&event()), 0);
    }

    #[test]
    fn test_listener_may_subscribe_during_delivery() {
        let bus = ReloadBus::new();
        let inner = bus.clone();
        let extra = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let held = extra.clone();
        let _sub = bus.subscribe(move |_| {
            held.lock().push(inner.subscribe(|_| Ok(())));
            Ok(())
        });
        bus.publish(&event());
        assert_eq!(bus.len(), 2);
    }
}
