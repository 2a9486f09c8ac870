use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use ethrun_trie::{TrieDB, TrieError};
use tracing::debug;

use crate::{api::KvStore, error::StoreError};

type Key = Vec<u8>;
// A pending entry: Some(value) is a write, None a deletion tombstone.
type Entry = Option<Vec<u8>>;
// One undo record: the key and whatever the pending layer held for it
// before the write (None when the key had no pending entry at all).
type UndoRecord = (Key, Option<Entry>);

struct JournalInner {
    store: Arc<dyn KvStore>,
    pending: HashMap<Key, Entry>,
    frames: Vec<Vec<UndoRecord>>,
}

/// Write-through layer over a [`KvStore`] with snapshot/revert.
///
/// Writes land in a pending overlay; reads see the topmost pending value for
/// a key, falling back to the backing store. A deletion is a tombstone: reads
/// of a deleted key return `None` until the enclosing snapshot is reverted.
/// [`persist`](JournalDb::persist) promotes the overlay to the store.
#[derive(Clone)]
pub struct JournalDb {
    inner: Arc<Mutex<JournalInner>>,
}

impl JournalDb {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(JournalInner {
                store,
                pending: HashMap::new(),
                frames: Vec::new(),
            })),
        }
    }

    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let inner = self.inner.lock().map_err(|_| StoreError::LockError)?;
        match inner.pending.get(key) {
            Some(Some(value)) => Ok(Some(value.clone())),
            Some(None) => Ok(None),
            None => inner.store.get(key),
        }
    }

    pub fn put(&self, key: Vec<u8>, value: Vec<u8>) -> Result<(), StoreError> {
        self.write(key, Some(value))
    }

    pub fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        self.write(key.to_vec(), None)
    }

    pub fn exists(&self, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }

    fn write(&self, key: Key, entry: Entry) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().map_err(|_| StoreError::LockError)?;
        let previous = inner.pending.insert(key.clone(), entry);
        if let Some(frame) = inner.frames.last_mut() {
            frame.push((key, previous));
        }
        Ok(())
    }

    /// Opens a new changeset and returns its id.
    pub fn snapshot(&self) -> Result<usize, StoreError> {
        let mut inner = self.inner.lock().map_err(|_| StoreError::LockError)?;
        inner.frames.push(Vec::new());
        let id = inner.frames.len() - 1;
        debug!(id, "journal snapshot");
        Ok(id)
    }

    /// Undoes every write made since snapshot `id` was taken.
    pub fn revert(&self, id: usize) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().map_err(|_| StoreError::LockError)?;
        while inner.frames.len() > id {
            let Some(frame) = inner.frames.pop() else {
                break;
            };
            for (key, previous) in frame.into_iter().rev() {
                match previous {
                    Some(entry) => {
                        inner.pending.insert(key, entry);
                    }
                    None => {
                        inner.pending.remove(&key);
                    }
                }
            }
        }
        debug!(id, "journal revert");
        Ok(())
    }

    /// Discards the undo log back to snapshot `id`, keeping the writes.
    pub fn commit(&self, id: usize) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().map_err(|_| StoreError::LockError)?;
        let drain_from = id.min(inner.frames.len());
        let merged: Vec<UndoRecord> = inner.frames.drain(drain_from..).flatten().collect();
        if id > 0 {
            if let Some(frame) = inner.frames.last_mut() {
                frame.extend(merged);
            }
        }
        debug!(id, "journal commit");
        Ok(())
    }

    /// Promotes every pending write to the backing store.
    ///
    /// Fails while snapshots are open: the overlay would no longer be
    /// revertable once flushed.
    pub fn persist(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().map_err(|_| StoreError::LockError)?;
        if !inner.frames.is_empty() {
            return Err(StoreError::OpenSnapshots(inner.frames.len()));
        }
        let writes: Vec<(Key, Entry)> = inner.pending.drain().collect();
        debug!(count = writes.len(), "journal persist");
        for (key, entry) in writes {
            match entry {
                Some(value) => inner.store.put(key, value)?,
                None => inner.store.delete(&key)?,
            }
        }
        Ok(())
    }
}

// Trie nodes are stored through the same journaled overlay, so a frame
// revert also discards the nodes written under it.
impl TrieDB for JournalDb {
    fn get(&self, key: Vec<u8>) -> Result<Option<Vec<u8>>, TrieError> {
        JournalDb::get(self, &key).map_err(|e| TrieError::DbError(e.to_string()))
    }

    fn put(&self, key: Vec<u8>, value: Vec<u8>) -> Result<(), TrieError> {
        JournalDb::put(self, key, value).map_err(|e| TrieError::DbError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::InMemoryKv;

    fn new_journal() -> JournalDb {
        JournalDb::new(Arc::new(InMemoryKv::new()))
    }

    #[test]
    fn reads_see_topmost_pending_value() {
        let db = new_journal();
        db.put(b"k".to_vec(), b"v1".to_vec()).unwrap();
        assert_eq!(db.get(b"k").unwrap(), Some(b"v1".to_vec()));
        let snap = db.snapshot().unwrap();
        db.put(b"k".to_vec(), b"v2".to_vec()).unwrap();
        assert_eq!(db.get(b"k").unwrap(), Some(b"v2".to_vec()));
        db.revert(snap).unwrap();
        assert_eq!(db.get(b"k").unwrap(), Some(b"v1".to_vec()));
    }

    #[test]
    fn deleted_key_reads_not_found_until_revert() {
        let db = new_journal();
        db.put(b"k".to_vec(), b"v".to_vec()).unwrap();
        let snap = db.snapshot().unwrap();
        db.delete(b"k").unwrap();
        assert_eq!(db.get(b"k").unwrap(), None);
        assert!(!db.exists(b"k").unwrap());
        db.revert(snap).unwrap();
        assert_eq!(db.get(b"k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn nested_snapshots_revert_atomically() {
        let db = new_journal();
        let outer = db.snapshot().unwrap();
        db.put(b"a".to_vec(), vec![1]).unwrap();
        let inner = db.snapshot().unwrap();
        db.put(b"b".to_vec(), vec![2]).unwrap();
        db.commit(inner).unwrap();
        // Reverting the outer snapshot discards the committed inner changes.
        db.revert(outer).unwrap();
        assert_eq!(db.get(b"a").unwrap(), None);
        assert_eq!(db.get(b"b").unwrap(), None);
    }

    #[test]
    fn commit_keeps_writes() {
        let db = new_journal();
        let snap = db.snapshot().unwrap();
        db.put(b"k".to_vec(), b"v".to_vec()).unwrap();
        db.commit(snap).unwrap();
        assert_eq!(db.get(b"k").unwrap(), Some(b"v".to_vec()));
        db.persist().unwrap();
        assert_eq!(db.get(b"k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn persist_rejects_open_snapshots() {
        let db = new_journal();
        let _snap = db.snapshot().unwrap();
        db.put(b"k".to_vec(), b"v".to_vec()).unwrap();
        assert!(matches!(
            db.persist(),
            Err(StoreError::OpenSnapshots(1))
        ));
    }
}
