use super::protocol::GhostdagManager;
use crate::model::{
    staging::StagingArea,
    stores::ghostdag::{GhostdagStoreReader, SortableBlock},
};
use kestrel_consensus_core::BlockHashSet;
use kestrel_database::prelude::StoreResult;
use kestrel_hashes::Hash;

impl GhostdagManager {
    /// Sorts the blocks ascending by blue work, breaking ties by hash
    pub fn sort_blocks(&self, sa: &StagingArea, blocks: BlockHashSet) -> StoreResult<Vec<Hash>> {
        let mut sorted_blocks = blocks
            .into_iter()
            .map(|block| Ok(SortableBlock::new(block, sa.ghostdag.get_blue_work(block)?)))
            .collect::<StoreResult<Vec<_>>>()?;
        sorted_blocks.sort();
        Ok(sorted_blocks.into_iter().map(|block| block.hash).collect())
    }
}
