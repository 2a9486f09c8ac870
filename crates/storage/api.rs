use crate::error::StoreError;
use std::{
    collections::BTreeMap,
    sync::{Arc, RwLock},
};

/// Opaque byte-blob persistence.
///
/// Everything the execution core stores (trie nodes, contract code) goes
/// through this interface; backends provide no ordering or iteration.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;
    fn put(&self, key: Vec<u8>, value: Vec<u8>) -> Result<(), StoreError>;
    fn delete(&self, key: &[u8]) -> Result<(), StoreError>;

    fn exists(&self, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }
}

/// In-memory KvStore backend.
#[derive(Debug, Default)]
pub struct InMemoryKv {
    inner: Arc<RwLock<BTreeMap<Vec<u8>, Vec<u8>>>>,
}

impl InMemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for InMemoryKv {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self
            .inner
            .read()
            .map_err(|_| StoreError::LockError)?
            .get(key)
            .cloned())
    }

    fn put(&self, key: Vec<u8>, value: Vec<u8>) -> Result<(), StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::LockError)?
            .insert(key, value);
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::LockError)?
            .remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_operations() {
        let store = InMemoryKv::new();
        store.put(b"key1".to_vec(), b"value1".to_vec()).unwrap();
        assert_eq!(store.get(b"key1").unwrap(), Some(b"value1".to_vec()));
        assert!(store.exists(b"key1").unwrap());
        store.delete(b"key1").unwrap();
        assert_eq!(store.get(b"key1").unwrap(), None);
        assert!(!store.exists(b"key1").unwrap());
    }
}
