use itertools::Itertools;
use kestrel_consensus_core::{BlockHashMap, blockhash::BlockHashes};
use kestrel_database::prelude::{MemoryDbAccess, StagingDbAccess, StoreResult, StoreResultExt};
use kestrel_hashes::Hash;
use std::sync::Arc;

/// Reader API for `RelationsStore`.
pub trait RelationsStoreReader {
    fn get_parents(&self, hash: Hash) -> StoreResult<BlockHashes>;
    fn get_children(&self, hash: Hash) -> StoreResult<BlockHashes>;
    fn has(&self, hash: Hash) -> StoreResult<bool>;
}

const PARENTS_PREFIX: &[u8] = b"block-parents";
const CHILDREN_PREFIX: &[u8] = b"block-children";

/// An in-memory implementation of the DAG relations store, with concurrent readers support.
#[derive(Clone)]
pub struct DbRelationsStore {
    parents_access: MemoryDbAccess<Hash, BlockHashes>,
    children_access: MemoryDbAccess<Hash, BlockHashes>,
}

impl DbRelationsStore {
    pub fn new() -> Self {
        Self { parents_access: MemoryDbAccess::new(PARENTS_PREFIX), children_access: MemoryDbAccess::new(CHILDREN_PREFIX) }
    }
}

impl Default for DbRelationsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RelationsStoreReader for DbRelationsStore {
    fn get_parents(&self, hash: Hash) -> StoreResult<BlockHashes> {
        self.parents_access.read(&hash)
    }

    fn get_children(&self, hash: Hash) -> StoreResult<BlockHashes> {
        // Validates existence of the block itself
        self.parents_access.read(&hash)?;
        Ok(self.children_access.read(&hash).optional()?.unwrap_or_default())
    }

    fn has(&self, hash: Hash) -> StoreResult<bool> {
        Ok(self.parents_access.has(&hash))
    }
}

/// Relations staged during a single validation attempt. Parents are append-only, while children
/// are kept as a diff of added children which is merged into the committed lists on commit, so that
/// concurrently staged children of the same parent are never lost.
pub struct StagingRelationsStore<'a> {
    store: &'a DbRelationsStore,
    parents: StagingDbAccess<'a, Hash, BlockHashes>,
    children_insertions: BlockHashMap<Vec<Hash>>,
}

impl<'a> StagingRelationsStore<'a> {
    pub fn new(store: &'a DbRelationsStore) -> Self {
        Self { store, parents: StagingDbAccess::append_only(&store.parents_access), children_insertions: Default::default() }
    }

    pub fn insert(&mut self, hash: Hash, parents: BlockHashes) -> StoreResult<()> {
        self.parents.write(hash, parents.clone())?;
        for parent in parents.iter().copied() {
            self.children_insertions.entry(parent).or_default().push(hash);
        }
        Ok(())
    }

    pub fn check_commit(&self) -> StoreResult<()> {
        self.parents.check_commit()
    }

    pub fn commit(self) -> StoreResult<()> {
        self.parents.commit()?;
        for (parent, added) in self.children_insertions {
            self.store.children_access.update(parent, |children| {
                let children = children.unwrap_or_default();
                Arc::new(children.iter().copied().chain(added.iter().copied()).unique().collect())
            });
        }
        Ok(())
    }
}

impl RelationsStoreReader for StagingRelationsStore<'_> {
    fn get_parents(&self, hash: Hash) -> StoreResult<BlockHashes> {
        self.parents.read(&hash)
    }

    fn get_children(&self, hash: Hash) -> StoreResult<BlockHashes> {
        self.parents.read(&hash)?;
        let committed = self.store.children_access.read(&hash).optional()?.unwrap_or_default();
        match self.children_insertions.get(&hash) {
            Some(added) => Ok(Arc::new(committed.iter().copied().chain(added.iter().copied()).collect())),
            None => Ok(committed),
        }
    }

    fn has(&self, hash: Hash) -> StoreResult<bool> {
        Ok(self.parents.has(&hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_database::prelude::StoreError;

    #[test]
    fn test_staged_relations_merge_children_on_commit() {
        let store = DbRelationsStore::new();
        let mut staging = StagingRelationsStore::new(&store);
        staging.insert(1.into(), Default::default()).unwrap();
        staging.commit().unwrap();

        // Two independent staging areas add a child to the same parent
        let mut first = StagingRelationsStore::new(&store);
        let mut second = StagingRelationsStore::new(&store);
        first.insert(2.into(), Arc::new(vec![1.into()])).unwrap();
        second.insert(3.into(), Arc::new(vec![1.into()])).unwrap();
        assert_eq!(first.get_children(1.into()).unwrap().as_slice(), &[Hash::from(2)]);
        first.commit().unwrap();
        second.commit().unwrap();

        let mut children = store.get_children(1.into()).unwrap().iter().copied().collect::<Vec<_>>();
        children.sort();
        assert_eq!(children, vec![Hash::from(2), 3.into()]);
        assert!(store.get_children(2.into()).unwrap().is_empty());
        assert!(matches!(store.get_children(4.into()), Err(StoreError::KeyNotFound(_))));
    }

    #[test]
    fn test_staged_relations_discarded_on_drop() {
        let store = DbRelationsStore::new();
        {
            let mut staging = StagingRelationsStore::new(&store);
            staging.insert(1.into(), Default::default()).unwrap();
            assert!(staging.has(1.into()).unwrap());
        }
        assert!(!store.has(1.into()).unwrap());
    }
}
