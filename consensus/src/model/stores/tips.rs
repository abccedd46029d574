use std::sync::Arc;

use kestrel_consensus_core::BlockHashSet;
use kestrel_database::prelude::{MemoryDbItem, StoreResult, StoreResultExt};
use kestrel_hashes::Hash;

/// Reader API for `TipsStore`.
pub trait TipsStoreReader {
    fn get(&self) -> StoreResult<Arc<BlockHashSet>>;
}

pub const STORE_NAME: &[u8] = b"body-tips";

/// An in-memory implementation of the DAG tips (blocks with a body and no child with a body)
#[derive(Clone)]
pub struct DbTipsStore {
    access: MemoryDbItem<Arc<BlockHashSet>>,
}

impl DbTipsStore {
    pub fn new() -> Self {
        Self { access: MemoryDbItem::new(STORE_NAME) }
    }

    pub fn init(&self, initial_tips: &[Hash]) {
        self.access.write(Arc::new(BlockHashSet::from_iter(initial_tips.iter().copied())))
    }
}

impl Default for DbTipsStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Updates the internal data if possible
fn update_tips(mut current_tips: Arc<BlockHashSet>, new_tip_parents: &[Hash], new_tip: Hash) -> Arc<BlockHashSet> {
    let tips = Arc::make_mut(&mut current_tips);
    for parent in new_tip_parents {
        tips.remove(parent);
    }
    tips.insert(new_tip);
    current_tips
}

impl TipsStoreReader for DbTipsStore {
    fn get(&self) -> StoreResult<Arc<BlockHashSet>> {
        self.access.read()
    }
}

/// Stages tip additions as a delta, applied against the tips current at commit time
pub struct StagingTipsStore<'a> {
    store: &'a DbTipsStore,
    added: Vec<(Hash, Vec<Hash>)>,
}

impl<'a> StagingTipsStore<'a> {
    pub fn new(store: &'a DbTipsStore) -> Self {
        Self { store, added: Vec::new() }
    }

    pub fn add_tip(&mut self, new_tip: Hash, new_tip_parents: &[Hash]) {
        self.added.push((new_tip, new_tip_parents.to_vec()));
    }

    pub fn commit(self) -> StoreResult<()> {
        if self.added.is_empty() {
            return Ok(());
        }
        let current = self.store.access.read().optional()?.unwrap_or_default();
        let tips = self.added.iter().fold(current, |tips, (tip, parents)| update_tips(tips, parents, *tip));
        self.store.access.write(tips);
        Ok(())
    }
}

impl TipsStoreReader for StagingTipsStore<'_> {
    fn get(&self) -> StoreResult<Arc<BlockHashSet>> {
        let current = self.store.access.read()?;
        Ok(self.added.iter().fold(current, |tips, (tip, parents)| update_tips(tips, parents, *tip)))
    }
}
