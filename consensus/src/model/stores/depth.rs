use kestrel_database::prelude::{MemoryDbAccess, StagingDbAccess, StoreResult};
use kestrel_hashes::Hash;

pub trait DepthStoreReader {
    fn merge_depth_root(&self, hash: Hash) -> StoreResult<Hash>;
    fn finality_point(&self, hash: Hash) -> StoreResult<Hash>;
}

const MERGE_DEPTH_ROOT_PREFIX: &[u8] = b"block-merge-depth-root";
const FINALITY_POINT_PREFIX: &[u8] = b"block-finality-point";

/// An in-memory implementation of the depth store. Both the merge depth root and the
/// finality point of a block are memoized once and never modified.
#[derive(Clone)]
pub struct DbDepthStore {
    merge_depth_root_access: MemoryDbAccess<Hash, Hash>,
    finality_point_access: MemoryDbAccess<Hash, Hash>,
}

impl DbDepthStore {
    pub fn new() -> Self {
        Self {
            merge_depth_root_access: MemoryDbAccess::new(MERGE_DEPTH_ROOT_PREFIX),
            finality_point_access: MemoryDbAccess::new(FINALITY_POINT_PREFIX),
        }
    }
}

impl Default for DbDepthStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DepthStoreReader for DbDepthStore {
    fn merge_depth_root(&self, hash: Hash) -> StoreResult<Hash> {
        self.merge_depth_root_access.read(&hash)
    }

    fn finality_point(&self, hash: Hash) -> StoreResult<Hash> {
        self.finality_point_access.read(&hash)
    }
}

pub struct StagingDepthStore<'a> {
    merge_depth_root: StagingDbAccess<'a, Hash, Hash>,
    finality_point: StagingDbAccess<'a, Hash, Hash>,
}

impl<'a> StagingDepthStore<'a> {
    pub fn new(store: &'a DbDepthStore) -> Self {
        Self {
            merge_depth_root: StagingDbAccess::append_only(&store.merge_depth_root_access),
            finality_point: StagingDbAccess::append_only(&store.finality_point_access),
        }
    }

    pub fn insert_merge_depth_root(&mut self, hash: Hash, merge_depth_root: Hash) -> StoreResult<()> {
        self.merge_depth_root.write(hash, merge_depth_root)
    }

    pub fn insert_finality_point(&mut self, hash: Hash, finality_point: Hash) -> StoreResult<()> {
        self.finality_point.write(hash, finality_point)
    }

    pub fn check_commit(&self) -> StoreResult<()> {
        self.merge_depth_root.check_commit()?;
        self.finality_point.check_commit()
    }

    pub fn commit(self) -> StoreResult<()> {
        self.merge_depth_root.commit()?;
        self.finality_point.commit()
    }
}

impl DepthStoreReader for StagingDepthStore<'_> {
    fn merge_depth_root(&self, hash: Hash) -> StoreResult<Hash> {
        self.merge_depth_root.read(&hash)
    }

    fn finality_point(&self, hash: Hash) -> StoreResult<Hash> {
        self.finality_point.read(&hash)
    }
}
