//! Local file record store
//!
//! Persists the collection as a JSON file under the data directory and
//! fans snapshots out to subscribers like the remote store would. Used
//! when no server is configured.
//!
//! Uses atomic writes (write to temp file, then rename) to prevent a
//! partially-written item file.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use super::{RecordStore, StoreError, StoreResult, Subscription};
use crate::models::{sort_items, Item};

/// File-backed implementation of [`RecordStore`]
#[derive(Clone, Debug)]
pub struct LocalStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug)]
struct Inner {
    path: PathBuf,
    items: HashMap<Uuid, Item>,
    subscribers: Vec<mpsc::UnboundedSender<Vec<Item>>>,
}

impl LocalStore {
    /// Open the store at the given path, loading any existing items
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let items = load_items(&path)?;
        debug!(path = %path.display(), items = items.len(), "opened local store");

        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                path,
                items,
                subscribers: Vec::new(),
            })),
        })
    }

    /// Current collection, in rendered order
    pub fn snapshot(&self) -> Vec<Item> {
        let inner = self.inner.lock().unwrap();
        sorted(&inner.items)
    }
}

impl Inner {
    /// Persist the collection, then notify subscribers.
    ///
    /// Nothing is pushed if the write fails, so subscribers only ever see
    /// committed state.
    fn commit(&mut self) -> StoreResult<()> {
        let snapshot = sorted(&self.items);
        persist_items(&self.path, &snapshot)?;
        self.subscribers
            .retain(|tx| tx.send(snapshot.clone()).is_ok());
        Ok(())
    }
}

fn sorted(items: &HashMap<Uuid, Item>) -> Vec<Item> {
    let mut snapshot: Vec<Item> = items.values().cloned().collect();
    sort_items(&mut snapshot);
    snapshot
}

fn load_items(path: &Path) -> StoreResult<HashMap<Uuid, Item>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }

    let content = fs::read_to_string(path)?;
    let items: Vec<Item> =
        serde_json::from_str(&content).map_err(|e| StoreError::InvalidData {
            path: path.display().to_string(),
            details: e.to_string(),
        })?;

    Ok(items.into_iter().map(|item| (item.id, item)).collect())
}

fn persist_items(path: &Path, items: &[Item]) -> StoreResult<()> {
    let json = serde_json::to_string_pretty(items)
        .map_err(|e| StoreError::Encoding(e.to_string()))?;
    atomic_write(path, json.as_bytes())
}

/// Write to a temporary file in the same directory, then rename over the
/// target so the file is never left half-written.
fn atomic_write(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("tmp");
    {
        let mut file = File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;

    Ok(())
}

#[async_trait]
impl RecordStore for LocalStore {
    async fn create(&self, content: &str, order: i64) -> StoreResult<Item> {
        let mut inner = self.inner.lock().unwrap();

        let item = Item::new(content, order);
        inner.items.insert(item.id, item.clone());
        inner.commit()?;
        Ok(item)
    }

    async fn update_order(&self, id: Uuid, order: i64) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();

        match inner.items.get_mut(&id) {
            Some(item) => item.set_order(order),
            None => return Err(StoreError::NotFound { id }),
        }
        inner.commit()
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();

        if inner.items.remove(&id).is_none() {
            return Err(StoreError::NotFound { id });
        }
        inner.commit()
    }

    async fn subscribe(&self) -> StoreResult<Subscription> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock().unwrap();

        let _ = tx.send(sorted(&inner.items));
        inner.subscribers.push(tx);

        Ok(Subscription::new(rx))
    }
}
