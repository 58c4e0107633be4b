//! Ordered item list manager
//!
//! Maintains the client-visible, strictly ordered collection backed by a
//! [`RecordStore`]. The manager assigns and renumbers the integer `order`
//! key on create, move, and delete so the store's unordered result set
//! always renders in a stable, user-controlled sequence.
//!
//! ## Renumbering scheme
//!
//! Keys are multiples of [`ORDER_STEP`](crate::models::ORDER_STEP). A new
//! item gets `(count + 1) * 1000`; every move or delete renumbers the
//! whole remaining collection to `(position + 1) * 1000`. That costs one
//! write per item per structural change, which is acceptable at personal
//! task list scale and keeps the scheme trivial to reason about.
//!
//! ## Snapshots are the source of truth
//!
//! Local state is only ever replaced wholesale by [`ingest_snapshot`]
//! (never merged, never patched by the write paths). A successful write
//! becomes visible when the store pushes the next snapshot. After a
//! failed write the manager refuses further structural operations until a
//! snapshot reconfirms consistent state, so local and remote state can't
//! silently diverge.
//!
//! [`ingest_snapshot`]: ListManager::ingest_snapshot

use std::sync::Arc;

use futures_util::future::join_all;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{order_for_position, sort_items, Direction, Item};
use crate::store::{RecordStore, StoreError};

/// Errors from structural list operations
#[derive(Error, Debug)]
pub enum ListError {
    /// The referenced item is not in the current snapshot
    #[error("Item not found: {id}")]
    NotFound { id: Uuid },

    /// A previous write failed; refusing further changes until the next
    /// snapshot reconfirms consistent state
    #[error("Local state may be out of sync with the store; waiting for the next snapshot")]
    OutOfSync,

    /// The store rejected or failed a write
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for list operations
pub type ListResult<T> = Result<T, ListError>;

/// Manages one user's ordered item collection
///
/// Structural operations are serialized: the API takes `&mut self`, so a
/// caller can never interleave two renumbering writes (share the manager
/// behind a `tokio::sync::Mutex` if several tasks drive it).
pub struct ListManager {
    store: Arc<dyn RecordStore>,
    /// Last observed snapshot, sorted ascending by (order, id)
    items: Vec<Item>,
    /// Whether any snapshot has arrived yet
    initialized: bool,
    /// Set after a failed write, cleared by the next snapshot
    out_of_sync: bool,
}

impl ListManager {
    /// Create a manager over the given store
    ///
    /// The list renders empty until the first snapshot is ingested.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            items: Vec::new(),
            initialized: false,
            out_of_sync: false,
        }
    }

    /// The current rendered sequence
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Find an item by id in the current snapshot
    pub fn get(&self, id: Uuid) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Whether a snapshot has been ingested yet
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether a failed write has left local state unconfirmed
    pub fn is_out_of_sync(&self) -> bool {
        self.out_of_sync
    }

    /// Replace local state with an authoritative store snapshot
    ///
    /// Snapshots are always complete, so prior state is replaced
    /// wholesale, never merged. Ingesting the same snapshot twice yields
    /// the same rendered order.
    pub fn ingest_snapshot(&mut self, mut items: Vec<Item>) {
        sort_items(&mut items);
        debug!(items = items.len(), "snapshot ingested");
        self.items = items;
        self.initialized = true;
        self.out_of_sync = false;
    }

    /// Create an item from user input
    ///
    /// Empty or whitespace-only input is silently dropped and no write is
    /// issued; returns `false` in that case. The new item appears once
    /// the store's next snapshot arrives — local state is not mutated
    /// here.
    pub async fn create(&mut self, content: &str) -> ListResult<bool> {
        let content = content.trim();
        if content.is_empty() {
            return Ok(false);
        }
        self.check_in_sync()?;

        let order = order_for_position(self.items.len());
        debug!(%order, "creating item");

        match self.store.create(content, order).await {
            Ok(_) => Ok(true),
            Err(e) => Err(self.write_failed(e)),
        }
    }

    /// Move an item one position up or down
    ///
    /// Swaps the item with its immediate neighbor, then renumbers every
    /// item in the resulting sequence to `(position + 1) * 1000`, issuing
    /// all order updates concurrently. Moving up from the top or down
    /// from the bottom is a no-op (`false`) with no writes issued.
    pub async fn move_item(&mut self, id: Uuid, direction: Direction) -> ListResult<bool> {
        self.check_in_sync()?;

        let current = self
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or(ListError::NotFound { id })?;

        let target = match direction {
            Direction::Up => current.checked_sub(1),
            Direction::Down => Some(current + 1).filter(|&i| i < self.items.len()),
        };
        let Some(target) = target else {
            // Already at the boundary
            return Ok(false);
        };

        let mut reordered: Vec<Uuid> = self.items.iter().map(|item| item.id).collect();
        reordered.swap(current, target);

        debug!(%id, %direction, "moving item");
        let store = Arc::clone(&self.store);
        let writes: Vec<_> = reordered
            .iter()
            .enumerate()
            .map(|(position, &item_id)| store.update_order(item_id, order_for_position(position)))
            .collect();
        self.await_writes(writes).await?;

        Ok(true)
    }

    /// Delete an item and renumber the remainder
    ///
    /// The renumbering uses the locally known remaining items in their
    /// existing relative order; the delete and every order update are
    /// issued in parallel and awaited together, so a delete failure does
    /// not stop the renumbering requests from being sent.
    pub async fn delete(&mut self, id: Uuid) -> ListResult<()> {
        self.check_in_sync()?;

        if !self.items.iter().any(|item| item.id == id) {
            return Err(ListError::NotFound { id });
        }

        debug!(%id, "deleting item");
        let remaining: Vec<Uuid> = self
            .items
            .iter()
            .filter(|item| item.id != id)
            .map(|item| item.id)
            .collect();

        let store = Arc::clone(&self.store);
        let mut writes = vec![store.delete(id)];
        writes.extend(
            remaining
                .iter()
                .enumerate()
                .map(|(position, &item_id)| store.update_order(item_id, order_for_position(position))),
        );
        self.await_writes(writes).await?;

        Ok(())
    }

    fn check_in_sync(&self) -> ListResult<()> {
        if self.out_of_sync {
            Err(ListError::OutOfSync)
        } else {
            Ok(())
        }
    }

    /// Await a batch of concurrent writes; the batch fails as a whole if
    /// any write fails, but every request is still sent and awaited
    /// (partial application is possible and resolved by the next
    /// snapshot).
    async fn await_writes<F>(&mut self, writes: impl IntoIterator<Item = F>) -> ListResult<()>
    where
        F: std::future::Future<Output = Result<(), StoreError>>,
    {
        let results = join_all(writes).await;
        for result in results {
            if let Err(e) = result {
                return Err(self.write_failed(e));
            }
        }
        Ok(())
    }

    fn write_failed(&mut self, error: StoreError) -> ListError {
        warn!("write failed: {}", error);
        self.out_of_sync = true;
        ListError::Store(error)
    }
}
