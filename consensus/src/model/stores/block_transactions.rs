use std::sync::Arc;

use kestrel_consensus_core::tx::Transaction;
use kestrel_database::prelude::{MemoryDbAccess, StagingDbAccess, StoreResult};
use kestrel_hashes::Hash;

pub trait BlockTransactionsStoreReader {
    fn get(&self, hash: Hash) -> StoreResult<Arc<Vec<Transaction>>>;
    fn has(&self, hash: Hash) -> StoreResult<bool>;
}

const STORE_PREFIX: &[u8] = b"block-transactions";

/// An in-memory implementation of the block transactions store, with concurrent readers support.
#[derive(Clone)]
pub struct DbBlockTransactionsStore {
    access: MemoryDbAccess<Hash, Arc<Vec<Transaction>>>,
}

impl DbBlockTransactionsStore {
    pub fn new() -> Self {
        Self { access: MemoryDbAccess::new(STORE_PREFIX) }
    }
}

impl Default for DbBlockTransactionsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockTransactionsStoreReader for DbBlockTransactionsStore {
    fn get(&self, hash: Hash) -> StoreResult<Arc<Vec<Transaction>>> {
        self.access.read(&hash)
    }

    fn has(&self, hash: Hash) -> StoreResult<bool> {
        Ok(self.access.has(&hash))
    }
}

pub struct StagingBlockTransactionsStore<'a> {
    access: StagingDbAccess<'a, Hash, Arc<Vec<Transaction>>>,
}

impl<'a> StagingBlockTransactionsStore<'a> {
    pub fn new(store: &'a DbBlockTransactionsStore) -> Self {
        Self { access: StagingDbAccess::append_only(&store.access) }
    }

    pub fn insert(&mut self, hash: Hash, transactions: Arc<Vec<Transaction>>) -> StoreResult<()> {
        self.access.write(hash, transactions)
    }

    pub fn check_commit(&self) -> StoreResult<()> {
        self.access.check_commit()
    }

    pub fn commit(self) -> StoreResult<()> {
        self.access.commit()
    }
}

impl BlockTransactionsStoreReader for StagingBlockTransactionsStore<'_> {
    fn get(&self, hash: Hash) -> StoreResult<Arc<Vec<Transaction>>> {
        self.access.read(&hash)
    }

    fn has(&self, hash: Hash) -> StoreResult<bool> {
        Ok(self.access.has(&hash))
    }
}
