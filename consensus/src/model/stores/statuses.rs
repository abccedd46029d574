use kestrel_consensus_core::blockstatus::BlockStatus;
use kestrel_database::prelude::{MemoryDbAccess, StagingDbAccess, StoreResult};
use kestrel_hashes::Hash;

/// Reader API for `StatusesStore`. A block with no status is unknown.
pub trait StatusesStoreReader {
    fn get(&self, hash: Hash) -> StoreResult<BlockStatus>;
    fn has(&self, hash: Hash) -> StoreResult<bool>;
}

const STORE_PREFIX: &[u8] = b"block-statuses";

/// An in-memory implementation of the statuses store, with concurrent readers support.
#[derive(Clone)]
pub struct DbStatusesStore {
    access: MemoryDbAccess<Hash, BlockStatus>,
}

impl DbStatusesStore {
    pub fn new() -> Self {
        Self { access: MemoryDbAccess::new(STORE_PREFIX) }
    }
}

impl Default for DbStatusesStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusesStoreReader for DbStatusesStore {
    fn get(&self, hash: Hash) -> StoreResult<BlockStatus> {
        self.access.read(&hash)
    }

    fn has(&self, hash: Hash) -> StoreResult<bool> {
        Ok(self.access.has(&hash))
    }
}

/// Statuses are not append-only: a block moves from header-only to having a body, or to invalid
pub struct StagingStatusesStore<'a> {
    access: StagingDbAccess<'a, Hash, BlockStatus>,
}

impl<'a> StagingStatusesStore<'a> {
    pub fn new(store: &'a DbStatusesStore) -> Self {
        Self { access: StagingDbAccess::new(&store.access) }
    }

    pub fn set(&mut self, hash: Hash, status: BlockStatus) -> StoreResult<()> {
        self.access.write(hash, status)
    }

    pub fn commit(self) -> StoreResult<()> {
        self.access.commit()
    }
}

impl StatusesStoreReader for StagingStatusesStore<'_> {
    fn get(&self, hash: Hash) -> StoreResult<BlockStatus> {
        self.access.read(&hash)
    }

    fn has(&self, hash: Hash) -> StoreResult<bool> {
        Ok(self.access.has(&hash))
    }
}
