//! In-memory record store
//!
//! Keeps the collection in a map and fans full snapshots out to every
//! live subscriber after each committed change. Used by tests and by
//! throwaway sessions that don't need persistence.
//!
//! The store can be switched "offline" to make every write fail with a
//! connection error, which is how failure paths are exercised.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use super::{RecordStore, StoreError, StoreResult, Subscription};
use crate::models::{sort_items, Item};

/// In-memory implementation of [`RecordStore`]
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    items: HashMap<Uuid, Item>,
    subscribers: Vec<mpsc::UnboundedSender<Vec<Item>>>,
    offline: bool,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with items
    pub fn with_items(items: impl IntoIterator<Item = Item>) -> Self {
        let store = Self::new();
        {
            let mut inner = store.inner.lock().unwrap();
            for item in items {
                inner.items.insert(item.id, item);
            }
        }
        store
    }

    /// Simulate losing the connection: while offline, every write fails
    pub fn set_offline(&self, offline: bool) {
        self.inner.lock().unwrap().offline = offline;
    }

    /// Current collection, in rendered order
    pub fn snapshot(&self) -> Vec<Item> {
        let inner = self.inner.lock().unwrap();
        sorted_snapshot(&inner.items)
    }

    /// Number of items currently stored
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().items.len()
    }

    /// Whether the store holds no items
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Inner {
    fn check_online(&self) -> StoreResult<()> {
        if self.offline {
            Err(StoreError::Connection {
                details: "store is offline".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Push the current collection to every live subscriber, pruning
    /// subscribers that have cancelled.
    fn fan_out(&mut self) {
        let snapshot = sorted_snapshot(&self.items);
        self.subscribers
            .retain(|tx| tx.send(snapshot.clone()).is_ok());
        debug!(
            items = snapshot.len(),
            subscribers = self.subscribers.len(),
            "pushed snapshot"
        );
    }
}

fn sorted_snapshot(items: &HashMap<Uuid, Item>) -> Vec<Item> {
    let mut snapshot: Vec<Item> = items.values().cloned().collect();
    sort_items(&mut snapshot);
    snapshot
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn create(&self, content: &str, order: i64) -> StoreResult<Item> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_online()?;

        let item = Item::new(content, order);
        inner.items.insert(item.id, item.clone());
        inner.fan_out();
        Ok(item)
    }

    async fn update_order(&self, id: Uuid, order: i64) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_online()?;

        match inner.items.get_mut(&id) {
            Some(item) => item.set_order(order),
            None => return Err(StoreError::NotFound { id }),
        }
        inner.fan_out();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_online()?;

        if inner.items.remove(&id).is_none() {
            return Err(StoreError::NotFound { id });
        }
        inner.fan_out();
        Ok(())
    }

    async fn subscribe(&self) -> StoreResult<Subscription> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock().unwrap();

        // New subscribers get the current state right away
        let _ = tx.send(sorted_snapshot(&inner.items));
        inner.subscribers.push(tx);

        Ok(Subscription::new(rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_assigns_id_and_order() {
        let store = MemoryStore::new();
        let item = store.create("first", 1000).await.unwrap();

        assert_eq!(item.content, "first");
        assert_eq!(item.order, 1000);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_update_order() {
        let store = MemoryStore::new();
        let item = store.create("task", 1000).await.unwrap();

        store.update_order(item.id, 5000).await.unwrap();
        assert_eq!(store.snapshot()[0].order, 5000);
    }

    #[tokio::test]
    async fn test_update_unknown_id() {
        let store = MemoryStore::new();
        let err = store.update_order(Uuid::new_v4(), 1000).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryStore::new();
        let item = store.create("task", 1000).await.unwrap();

        store.delete(item.id).await.unwrap();
        assert!(store.is_empty());

        let err = store.delete(item.id).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_subscribe_receives_initial_snapshot() {
        let store = MemoryStore::new();
        store.create("existing", 1000).await.unwrap();

        let mut sub = store.subscribe().await.unwrap();
        let snapshot = sub.recv().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].content, "existing");
    }

    #[tokio::test]
    async fn test_subscribe_receives_changes_in_order() {
        let store = MemoryStore::new();
        let mut sub = store.subscribe().await.unwrap();
        assert!(sub.recv().await.unwrap().is_empty());

        store.create("b", 2000).await.unwrap();
        store.create("a", 1000).await.unwrap();

        assert_eq!(sub.recv().await.unwrap().len(), 1);
        let snapshot = sub.recv().await.unwrap();
        let contents: Vec<_> = snapshot.iter().map(|i| i.content.as_str()).collect();
        assert_eq!(contents, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_cancelled_subscription_stops_delivery() {
        let store = MemoryStore::new();
        let mut sub = store.subscribe().await.unwrap();
        sub.cancel();

        // Writes still succeed; the cancelled subscriber is pruned
        store.create("task", 1000).await.unwrap();
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_offline_writes_fail() {
        let store = MemoryStore::new();
        store.set_offline(true);

        let err = store.create("task", 1000).await.unwrap_err();
        assert!(matches!(err, StoreError::Connection { .. }));
        assert!(err.is_recoverable());

        store.set_offline(false);
        store.create("task", 1000).await.unwrap();
    }
}
