use crate::{
    consensus::storage::ConsensusStorage,
    model::stores::{
        block_transactions::StagingBlockTransactionsStore, depth::StagingDepthStore, ghostdag::StagingGhostdagStore,
        headers::StagingHeadersStore, pruning::StagingPruningStore, relations::StagingRelationsStore,
        statuses::StagingStatusesStore, tips::StagingTipsStore,
    },
};
use kestrel_database::prelude::StoreResult;

/// A per-validation-attempt write overlay over all consensus stores.
///
/// Every mutation produced while validating a block (headers, relations, GHOSTDAG data, depth roots,
/// statuses and tips) is buffered here; reads see the staged writes first. Nothing reaches the stores
/// until [`StagingArea::commit`] is called by the orchestrating caller. Dropping the staging area
/// discards it.
pub struct StagingArea<'a> {
    storage: &'a ConsensusStorage,
    pub headers: StagingHeadersStore<'a>,
    pub relations: StagingRelationsStore<'a>,
    pub ghostdag: StagingGhostdagStore<'a>,
    pub statuses: StagingStatusesStore<'a>,
    pub block_transactions: StagingBlockTransactionsStore<'a>,
    pub depth: StagingDepthStore<'a>,
    pub pruning: StagingPruningStore<'a>,
    pub tips: StagingTipsStore<'a>,
}

impl<'a> StagingArea<'a> {
    pub fn new(storage: &'a ConsensusStorage) -> Self {
        Self {
            storage,
            headers: StagingHeadersStore::new(&storage.headers_store),
            relations: StagingRelationsStore::new(&storage.relations_store),
            ghostdag: StagingGhostdagStore::new(&storage.ghostdag_store),
            statuses: StagingStatusesStore::new(&storage.statuses_store),
            block_transactions: StagingBlockTransactionsStore::new(&storage.block_transactions_store),
            depth: StagingDepthStore::new(&storage.depth_store),
            pruning: StagingPruningStore::new(&storage.pruning_point_store),
            tips: StagingTipsStore::new(&storage.body_tips_store),
        }
    }

    pub fn storage(&self) -> &'a ConsensusStorage {
        self.storage
    }

    /// Applies all staged writes atomically with respect to other commits.
    ///
    /// Write-once stores are verified before anything is written, so a staging area racing
    /// another one over the same block hash fails as a whole with `HashAlreadyExists`.
    pub fn commit(self) -> StoreResult<()> {
        let _guard = self.storage.commit_lock.lock();

        self.headers.check_commit()?;
        self.relations.check_commit()?;
        self.ghostdag.check_commit()?;
        self.block_transactions.check_commit()?;
        self.depth.check_commit()?;

        self.headers.commit()?;
        self.relations.commit()?;
        self.ghostdag.commit()?;
        self.block_transactions.commit()?;
        self.depth.commit()?;
        self.statuses.commit()?;
        self.pruning.commit();
        self.tips.commit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::stores::{ghostdag::GhostdagStoreReader, headers::HeaderStoreReader, statuses::StatusesStoreReader};
    use kestrel_consensus_core::{blockstatus::BlockStatus, ghostdag::GhostdagData, header::Header};
    use kestrel_core::assert_match;
    use kestrel_database::prelude::StoreError;
    use std::sync::Arc;

    #[test]
    fn test_commit_and_discard() {
        let storage = ConsensusStorage::new();

        let mut sa = StagingArea::new(&storage);
        sa.headers.insert(Arc::new(Header::from_precomputed_hash(1.into(), vec![]))).unwrap();
        sa.statuses.set(1.into(), BlockStatus::StatusHeaderOnly).unwrap();
        assert!(sa.headers.has(1.into()).unwrap());
        drop(sa);
        assert!(!storage.headers_store.has(1.into()).unwrap());
        assert!(!storage.statuses_store.has(1.into()).unwrap());

        let mut sa = StagingArea::new(&storage);
        sa.headers.insert(Arc::new(Header::from_precomputed_hash(1.into(), vec![]))).unwrap();
        sa.statuses.set(1.into(), BlockStatus::StatusHeaderOnly).unwrap();
        sa.commit().unwrap();
        assert!(storage.headers_store.has(1.into()).unwrap());
        assert_eq!(storage.statuses_store.get(1.into()).unwrap(), BlockStatus::StatusHeaderOnly);
    }

    #[test]
    fn test_conflicting_commits_fail_as_a_whole() {
        let storage = ConsensusStorage::new();

        let mut first = StagingArea::new(&storage);
        let mut second = StagingArea::new(&storage);
        first.ghostdag.insert(7.into(), Arc::new(GhostdagData::genesis())).unwrap();
        second.headers.insert(Arc::new(Header::from_precomputed_hash(8.into(), vec![]))).unwrap();
        second.ghostdag.insert(7.into(), Arc::new(GhostdagData::genesis())).unwrap();

        first.commit().unwrap();
        assert_match!(second.commit(), Err(StoreError::HashAlreadyExists(_)));
        // Nothing from the failed staging area was written
        assert!(!storage.headers_store.has(8.into()).unwrap());
        assert!(storage.ghostdag_store.has(7.into()).unwrap());
    }
}
