//! Record store boundary
//!
//! The list manager talks to a remote record store through the
//! [`RecordStore`] trait: create/update/delete one record, plus a live
//! subscription that pushes full snapshots of the visible collection.
//! Snapshots are authoritative and complete, never deltas.
//!
//! ## Implementations
//!
//! - [`MemoryStore`]: in-memory, for tests and throwaway sessions
//! - [`LocalStore`]: JSON file on disk with atomic writes
//! - [`RemoteStore`]: WebSocket client with automatic reconnect

pub mod error;
pub mod local;
pub mod memory;
pub mod message;
pub mod remote;

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::models::Item;

pub use error::{StoreError, StoreResult};
pub use local::LocalStore;
pub use memory::MemoryStore;
pub use remote::{ConnectionStatus, RemoteConfig, RemoteStore};

/// A live subscription to the store's snapshot feed
///
/// Each received value is the full visible collection at that moment.
/// Dropping or cancelling the subscription releases it; no further
/// snapshots are delivered afterwards.
pub struct Subscription {
    snapshots: mpsc::UnboundedReceiver<Vec<Item>>,
}

impl Subscription {
    /// Wrap a snapshot channel receiver
    pub fn new(snapshots: mpsc::UnboundedReceiver<Vec<Item>>) -> Self {
        Self { snapshots }
    }

    /// Receive the next snapshot
    ///
    /// Returns `None` once the subscription has been cancelled or the
    /// store side has gone away.
    pub async fn recv(&mut self) -> Option<Vec<Item>> {
        self.snapshots.recv().await
    }

    /// Cancel the subscription
    ///
    /// Already-buffered snapshots are discarded; subsequent `recv` calls
    /// return `None`.
    pub fn cancel(&mut self) {
        self.snapshots.close();
        while self.snapshots.try_recv().is_ok() {}
    }
}

/// Remote record store consumed by the list manager
///
/// One record type, four operations. The store assigns ids and timestamps
/// at creation; `update_order` is a partial update limited to the order
/// key, the only field the manager ever rewrites.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Create a record; the store assigns the id
    async fn create(&self, content: &str, order: i64) -> StoreResult<Item>;

    /// Update a record's order key
    async fn update_order(&self, id: Uuid, order: i64) -> StoreResult<()>;

    /// Delete a record
    async fn delete(&self, id: Uuid) -> StoreResult<()>;

    /// Open a live snapshot subscription
    ///
    /// The current collection is pushed immediately, then again after
    /// every committed change.
    async fn subscribe(&self) -> StoreResult<Subscription>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscription_recv_and_cancel() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut sub = Subscription::new(rx);

        tx.send(vec![Item::new("a", 1000)]).unwrap();
        let snapshot = sub.recv().await.unwrap();
        assert_eq!(snapshot.len(), 1);

        // Buffered snapshots are dropped on cancel
        tx.send(vec![]).unwrap();
        sub.cancel();
        assert!(sub.recv().await.is_none());

        // Sender side observes the closed channel
        assert!(tx.send(vec![]).is_err());
    }
}
