//! Key/value state backing the execution context.
//!
//! [`MemStore`] is the durable, committed state. [`CacheStore`] buffers
//! writes on top of any [`KvStore`]; its writes only leave the buffer through
//! [`CacheStore::into_changeset`], so a dropped cache leaves the inner store
//! untouched.

use std::{
    collections::BTreeMap,
    fmt,
    sync::Arc,
};

use parking_lot::RwLock;

/// Read access to key/value state.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    fn has(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }
}

/// Buffered writes. `None` marks a deletion.
pub type ChangeSet = BTreeMap<Vec<u8>, Option<Vec<u8>>>;

/// Committed in-memory state.
#[derive(Debug, Default)]
pub struct MemStore {
    entries: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a changeset. Only committed execution should call this.
    pub fn commit(&self, changes: ChangeSet) {
        let mut entries = self.entries.write();
        for (key, value) in changes {
            match value {
                Some(value) => {
                    entries.insert(key, value);
                }
                None => {
                    entries.remove(&key);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl KvStore for MemStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.read().get(key).cloned()
    }
}

/// A write buffer layered over a shared inner store.
#[derive(Clone)]
pub struct CacheStore {
    writes: ChangeSet,
    inner: Arc<dyn KvStore>,
}

impl fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("pending_writes", &self.writes.len())
            .finish_non_exhaustive()
    }
}

impl CacheStore {
    pub fn new(inner: Arc<dyn KvStore>) -> Self {
        Self {
            writes: ChangeSet::new(),
            inner,
        }
    }

    pub fn set(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.writes.insert(key.into(), Some(value.into()));
    }

    pub fn delete(&mut self, key: impl Into<Vec<u8>>) {
        self.writes.insert(key.into(), None);
    }

    /// Opens a nested scope over a snapshot of this view. The branch starts
    /// with an empty buffer and its writes are invisible here until folded
    /// back with [`CacheStore::merge`].
    pub fn branch(&self) -> Self {
        Self::new(Arc::new(self.clone()))
    }

    /// Folds the writes made on a branch into this buffer.
    pub fn merge(&mut self, branch: CacheStore) {
        self.writes.extend(branch.writes);
    }

    pub fn is_dirty(&self) -> bool {
        !self.writes.is_empty()
    }

    pub fn into_changeset(self) -> ChangeSet {
        self.writes
    }
}

impl KvStore for CacheStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.writes.get(key) {
            Some(value) => value.clone(),
            None => self.inner.get(key),
        }
    }
}
