//! Ordered, observable view of the stored documents.
//!
//! The catalog publishes immutable snapshots through a `watch` channel.
//! Readers clone an `Arc` and never block writers; every mutation builds
//! the next snapshot and notifies subscribers. Storage is always changed
//! first and the catalog second, so a failed storage call leaves the
//! published list untouched.

use crate::store::DocumentStore;
use crate::types::*;
use scan_document::RawImage;
use std::sync::Arc;
use tokio::sync::watch;

pub type Snapshot = Arc<Vec<DocumentEntry>>;

pub struct Catalog {
    store: Arc<DocumentStore>,
    entries: watch::Sender<Snapshot>,
}

impl Catalog {
    /// Build a catalog from what is currently on disk
    pub async fn load(store: Arc<DocumentStore>) -> Result<Self, StorageError> {
        let entries = store.list().await?;
        log::debug!("Catalog loaded with {} documents", entries.len());
        let (sender, _) = watch::channel(Arc::new(entries));
        Ok(Self {
            store,
            entries: sender,
        })
    }

    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    /// Current list, in display order
    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(&self.entries.borrow())
    }

    /// Receive every new snapshot
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.entries.subscribe()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn get(&self, id: &DocumentHandle) -> Option<DocumentEntry> {
        self.entries.borrow().iter().find(|e| &e.id == id).cloned()
    }

    /// Add a newly stored document at the end; an existing entry with the
    /// same id is replaced instead.
    ///
    /// Cost is linear in the catalog size: the id check scans the list, and
    /// the list is copied once if a reader still holds the previous snapshot.
    pub fn append(&self, entry: DocumentEntry) {
        self.entries.send_modify(|snapshot| {
            let list = Arc::make_mut(snapshot);
            match list.iter_mut().find(|e| e.id == entry.id) {
                Some(existing) => {
                    log::debug!("Catalog already held {}; replacing it", entry.id);
                    *existing = entry;
                }
                None => list.push(entry),
            }
        });
    }

    /// Swap the entry for `old_id` in place. Returns false when absent.
    pub fn replace(&self, old_id: &DocumentHandle, entry: DocumentEntry) -> bool {
        self.entries.send_if_modified(|snapshot| {
            let Some(index) = snapshot.iter().position(|e| &e.id == old_id) else {
                return false;
            };
            Arc::make_mut(snapshot)[index] = entry;
            true
        })
    }

    pub fn remove(&self, id: &DocumentHandle) -> Option<DocumentEntry> {
        let mut removed = None;
        self.entries.send_if_modified(|snapshot| {
            let Some(index) = snapshot.iter().position(|e| &e.id == id) else {
                return false;
            };
            removed = Some(Arc::make_mut(snapshot).remove(index));
            true
        });
        removed
    }

    /// Rename in storage, then update the entry in place
    pub async fn rename(
        &self,
        id: &DocumentHandle,
        new_name: &str,
    ) -> Result<DocumentEntry, StorageError> {
        let entry = self.store.rename(id, new_name).await?;
        if &entry.id != id && !self.replace(id, entry.clone()) {
            self.append(entry.clone());
        }
        Ok(entry)
    }

    /// Delete from storage, then drop the entry.
    ///
    /// A file that is already gone is not an error: the stale entry is
    /// removed and [`DeleteOutcome::AlreadyMissing`] reported.
    pub async fn delete(&self, id: &DocumentHandle) -> Result<DeleteOutcome, StorageError> {
        let outcome = match self.store.delete(id).await {
            Ok(()) => DeleteOutcome::Removed,
            Err(StorageError::NotFound(_)) => {
                log::warn!("{} was already missing from storage", id);
                DeleteOutcome::AlreadyMissing
            }
            Err(e) => return Err(e),
        };
        self.remove(id);
        Ok(outcome)
    }

    /// Re-read the directory and publish the result.
    ///
    /// Storage writes are held off until the listing is published, so a
    /// document stored meanwhile is either in the listing or appended after it.
    pub async fn refresh(&self) -> Result<Snapshot, StorageError> {
        let _writes = self.store.lock_writes().await;
        let entries = Arc::new(self.store.list().await?);
        self.entries.send_replace(Arc::clone(&entries));
        log::debug!("Catalog refreshed with {} documents", entries.len());
        Ok(entries)
    }

    /// Raw bytes of a stored document
    pub async fn open(&self, id: &DocumentHandle) -> Result<Vec<u8>, StorageError> {
        self.store.read(id).await
    }

    pub async fn page_count(&self, id: &DocumentHandle) -> Result<usize> {
        let bytes = self.store.read(id).await?;
        let count = tokio::task::spawn_blocking(move || scan_document::page_count(&bytes)).await??;
        Ok(count)
    }

    /// First page scaled to fit `max_edge`
    pub async fn thumbnail(&self, id: &DocumentHandle, max_edge: u32) -> Result<RawImage> {
        let bytes = self.store.read(id).await?;
        Ok(scan_document::codec::thumbnail_async(bytes, max_edge).await?)
    }
}
