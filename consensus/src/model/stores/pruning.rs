use kestrel_database::prelude::{MemoryDbItem, StagingDbItem, StoreResult};
use kestrel_hashes::Hash;

/// Reader API for `PruningStore`.
pub trait PruningStoreReader {
    fn pruning_point(&self) -> StoreResult<Hash>;
}

const PRUNING_POINT_KEY: &[u8] = b"pruning-point";

/// An in-memory implementation of the pruning point store. Pruning point selection itself
/// happens elsewhere; this store only records the current point.
#[derive(Clone)]
pub struct DbPruningStore {
    pruning_point: MemoryDbItem<Hash>,
}

impl DbPruningStore {
    pub fn new() -> Self {
        Self { pruning_point: MemoryDbItem::new(PRUNING_POINT_KEY) }
    }

    pub fn set_pruning_point(&self, pruning_point: Hash) {
        self.pruning_point.write(pruning_point)
    }
}

impl Default for DbPruningStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PruningStoreReader for DbPruningStore {
    fn pruning_point(&self) -> StoreResult<Hash> {
        self.pruning_point.read()
    }
}

pub struct StagingPruningStore<'a> {
    pruning_point: StagingDbItem<'a, Hash>,
}

impl<'a> StagingPruningStore<'a> {
    pub fn new(store: &'a DbPruningStore) -> Self {
        Self { pruning_point: StagingDbItem::new(&store.pruning_point) }
    }

    pub fn set_pruning_point(&mut self, pruning_point: Hash) {
        self.pruning_point.write(pruning_point)
    }

    pub fn commit(self) {
        self.pruning_point.commit()
    }
}

impl PruningStoreReader for StagingPruningStore<'_> {
    fn pruning_point(&self) -> StoreResult<Hash> {
        self.pruning_point.read()
    }
}
