use std::{cmp::Ordering, sync::Arc};

use kestrel_consensus_core::{
    BlueWorkType,
    blockhash::BlockHashes,
    ghostdag::{CompactGhostdagData, GhostdagData, HashKTypeMap},
};
use kestrel_database::prelude::{MemoryDbAccess, StagingDbAccess, StoreResult};
use kestrel_hashes::Hash;

/// A block hash paired with its blue work, ordered by blue work and then by hash
#[derive(Eq, Clone, Copy, Debug)]
pub struct SortableBlock {
    pub hash: Hash,
    pub blue_work: BlueWorkType,
}

impl SortableBlock {
    pub fn new(hash: Hash, blue_work: BlueWorkType) -> Self {
        Self { hash, blue_work }
    }
}

impl PartialEq for SortableBlock {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.blue_work == other.blue_work
    }
}

impl PartialOrd for SortableBlock {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortableBlock {
    fn cmp(&self, other: &Self) -> Ordering {
        self.blue_work.cmp(&other.blue_work).then_with(|| self.hash.cmp(&other.hash))
    }
}

pub trait GhostdagStoreReader {
    /// Returns full block data for the requested hash
    fn get_data(&self, hash: Hash) -> StoreResult<Arc<GhostdagData>>;

    /// Check if the store contains data for the requested hash
    fn has(&self, hash: Hash) -> StoreResult<bool>;

    fn get_blue_score(&self, hash: Hash) -> StoreResult<u64> {
        Ok(self.get_data(hash)?.blue_score)
    }

    fn get_blue_work(&self, hash: Hash) -> StoreResult<BlueWorkType> {
        Ok(self.get_data(hash)?.blue_work)
    }

    fn get_selected_parent(&self, hash: Hash) -> StoreResult<Hash> {
        Ok(self.get_data(hash)?.selected_parent)
    }

    fn get_mergeset_blues(&self, hash: Hash) -> StoreResult<BlockHashes> {
        Ok(Arc::clone(&self.get_data(hash)?.mergeset_blues))
    }

    fn get_mergeset_reds(&self, hash: Hash) -> StoreResult<BlockHashes> {
        Ok(Arc::clone(&self.get_data(hash)?.mergeset_reds))
    }

    fn get_blues_anticone_sizes(&self, hash: Hash) -> StoreResult<HashKTypeMap> {
        Ok(Arc::clone(&self.get_data(hash)?.blues_anticone_sizes))
    }

    fn get_compact_data(&self, hash: Hash) -> StoreResult<CompactGhostdagData> {
        Ok(self.get_data(hash)?.to_compact())
    }
}

const STORE_PREFIX: &[u8] = b"block-ghostdag-data";

/// An in-memory implementation of the GHOSTDAG store, with concurrent readers support.
#[derive(Clone)]
pub struct DbGhostdagStore {
    access: MemoryDbAccess<Hash, Arc<GhostdagData>>,
}

impl DbGhostdagStore {
    pub fn new() -> Self {
        Self { access: MemoryDbAccess::new(STORE_PREFIX) }
    }
}

impl Default for DbGhostdagStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GhostdagStoreReader for DbGhostdagStore {
    fn get_data(&self, hash: Hash) -> StoreResult<Arc<GhostdagData>> {
        self.access.read(&hash)
    }

    fn has(&self, hash: Hash) -> StoreResult<bool> {
        Ok(self.access.has(&hash))
    }
}

/// GHOSTDAG data is added once and never modified, so the staged overlay is append-only
pub struct StagingGhostdagStore<'a> {
    access: StagingDbAccess<'a, Hash, Arc<GhostdagData>>,
}

impl<'a> StagingGhostdagStore<'a> {
    pub fn new(store: &'a DbGhostdagStore) -> Self {
        Self { access: StagingDbAccess::append_only(&store.access) }
    }

    pub fn insert(&mut self, hash: Hash, data: Arc<GhostdagData>) -> StoreResult<()> {
        self.access.write(hash, data)
    }

    pub fn check_commit(&self) -> StoreResult<()> {
        self.access.check_commit()
    }

    pub fn commit(self) -> StoreResult<()> {
        self.access.commit()
    }
}

impl GhostdagStoreReader for StagingGhostdagStore<'_> {
    fn get_data(&self, hash: Hash) -> StoreResult<Arc<GhostdagData>> {
        self.access.read(&hash)
    }

    fn has(&self, hash: Hash) -> StoreResult<bool> {
        Ok(self.access.has(&hash))
    }
}
