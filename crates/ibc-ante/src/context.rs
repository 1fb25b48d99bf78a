use std::sync::Arc;

use serde::{
    Deserialize,
    Serialize,
};

use crate::store::{
    CacheStore,
    KvStore,
};

/// Why the admission pipeline is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecMode {
    /// First mempool check of a new transaction.
    CheckTx,
    /// Re-validation of a mempool transaction after a block commit.
    ReCheckTx,
    /// Gas estimation.
    Simulate,
    /// Execution against committed state.
    Deliver,
}

impl ExecMode {
    /// Returns true for the speculative mempool modes.
    pub fn is_check(&self) -> bool {
        matches!(self, ExecMode::CheckTx | ExecMode::ReCheckTx)
    }
}

/// Execution context handed down the ante chain.
///
/// State access goes through a [`CacheStore`], so handlers executed while
/// checking a transaction only ever write into the context's buffer.
#[derive(Debug, Clone)]
pub struct Context {
    mode: ExecMode,
    block_height: u64,
    store: CacheStore,
}

impl Context {
    pub fn new(mode: ExecMode, block_height: u64, state: Arc<dyn KvStore>) -> Self {
        Self {
            mode,
            block_height,
            store: CacheStore::new(state),
        }
    }

    pub fn mode(&self) -> ExecMode {
        self.mode
    }

    pub fn block_height(&self) -> u64 {
        self.block_height
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut CacheStore {
        &mut self.store
    }

    /// Returns a nested context whose writes stay local until passed to
    /// [`Context::write_back`].
    pub fn branch(&self) -> Self {
        Self {
            mode: self.mode,
            block_height: self.block_height,
            store: self.store.branch(),
        }
    }

    pub fn write_back(&mut self, branch: Context) {
        self.store.merge(branch.store);
    }

    pub fn into_store(self) -> CacheStore {
        self.store
    }
}
