use std::sync::Arc;

use crate::{
    model::{
        staging::StagingArea,
        stores::{ghostdag::GhostdagStoreReader, headers::HeaderStoreReader, relations::RelationsStoreReader},
    },
    processes::dag_topology::DagTopologyManager,
};
use kestrel_consensus_core::{
    BlockHashMap, BlueWorkType, KType,
    blockhash::{self, BlockHashExtensions},
    ghostdag::{GhostdagData, HashKTypeMap},
};
use kestrel_core::trace;
use kestrel_database::prelude::{StoreError, StoreResult, StoreResultExt};
use kestrel_hashes::Hash;
use kestrel_math::calc_work;

use crate::model::stores::ghostdag::SortableBlock;

#[derive(Clone)]
pub struct GhostdagManager {
    genesis_hash: Hash,
    pub(super) k: KType,
    pub(super) topology: DagTopologyManager,
}

impl GhostdagManager {
    pub fn new(genesis_hash: Hash, k: KType, topology: DagTopologyManager) -> Self {
        Self { genesis_hash, k, topology }
    }

    pub fn genesis_ghostdag_data(&self) -> GhostdagData {
        GhostdagData::genesis()
    }

    pub fn find_selected_parent(&self, sa: &StagingArea, parents: impl IntoIterator<Item = Hash>) -> StoreResult<Hash> {
        let mut selected: Option<SortableBlock> = None;
        for parent in parents {
            let candidate = SortableBlock::new(parent, sa.ghostdag.get_blue_work(parent)?);
            if selected.as_ref().is_none_or(|current| candidate > *current) {
                selected = Some(candidate);
            }
        }
        selected
            .map(|block| block.hash)
            .ok_or_else(|| StoreError::DataInconsistency("cannot select a parent out of an empty set".to_string()))
    }

    /// Returns the GHOSTDAG data of the block staged under `hash`, computing and staging it if missing
    pub fn ensure_ghostdag(&self, sa: &mut StagingArea, hash: Hash) -> StoreResult<Arc<GhostdagData>> {
        if let Some(data) = sa.ghostdag.get_data(hash).optional()? {
            return Ok(data);
        }

        let data = if hash == self.genesis_hash {
            Arc::new(self.genesis_ghostdag_data())
        } else {
            let parents = sa.relations.get_parents(hash)?;
            Arc::new(self.ghostdag(sa, &parents)?)
        };
        trace!("staging GHOSTDAG data of block {}: blue score {}, selected parent {}", hash, data.blue_score, data.selected_parent);
        sa.ghostdag.insert(hash, data.clone())?;
        Ok(data)
    }

    /// Runs the GHOSTDAG protocol over a block with the given parents and returns the resulting data.
    ///
    /// The selected parent is the parent with the highest blue work. The rest of the mergeset is colored
    /// in ascending blue work order: a candidate is blue if adding it keeps the blue set a k-cluster,
    /// i.e. neither its own blue anticone nor that of any blue in it would exceed `k`.
    pub fn ghostdag(&self, sa: &StagingArea, parents: &[Hash]) -> StoreResult<GhostdagData> {
        if parents.is_empty() {
            return Ok(self.genesis_ghostdag_data());
        }

        let selected_parent = self.find_selected_parent(sa, parents.iter().copied())?;
        let mut new_block_data = GhostdagData::new_with_selected_parent(selected_parent, self.k);

        let ordered_mergeset = self.ordered_mergeset_without_selected_parent(sa, selected_parent, parents)?;
        for blue_candidate in ordered_mergeset.iter().copied() {
            match self.check_blue_candidate(sa, &new_block_data, blue_candidate)? {
                ColoringOutput::Blue(blue_anticone_size, blues_anticone_sizes) => {
                    // No k-cluster violation found, we can now set the candidate block as blue
                    new_block_data.add_blue(blue_candidate, blue_anticone_size, &blues_anticone_sizes);
                }
                ColoringOutput::Red => new_block_data.add_red(blue_candidate),
            }
        }

        let blue_score = sa.ghostdag.get_blue_score(selected_parent)? + new_block_data.mergeset_blues.len() as u64;

        let mut blue_work: BlueWorkType = sa.ghostdag.get_blue_work(selected_parent)?;
        for blue in new_block_data.mergeset_blues.iter().copied() {
            blue_work = blue_work.saturating_add(calc_work(sa.headers.get_bits(blue)?));
        }

        new_block_data.finalize_score_and_work(blue_score, blue_work);
        Ok(new_block_data)
    }

    fn check_blue_candidate_with_chain_block(
        &self,
        sa: &StagingArea,
        new_block_data: &GhostdagData,
        chain_block: &ChainBlock,
        blue_candidate: Hash,
        candidate_blues_anticone_sizes: &mut BlockHashMap<KType>,
        candidate_blue_anticone_size: &mut KType,
    ) -> StoreResult<ColoringState> {
        // If blue_candidate is in the future of chain_block, it means
        // that all remaining blues are in the past of chain_block and thus
        // in the past of blue_candidate. In this case we know for sure that
        // the anticone of blue_candidate will not exceed K, and we can mark
        // it as blue.
        //
        // The new block is always in the future of blue_candidate, so there's
        // no point in checking it.

        // We check if chain_block is not the new block by checking if it has a hash.
        if let Some(hash) = chain_block.hash {
            if self.topology.is_dag_ancestor_of(sa, hash, blue_candidate)? {
                return Ok(ColoringState::Blue);
            }
        }

        for block in chain_block.data.mergeset_blues.iter().copied() {
            // Skip blocks that exist in the past of blue_candidate.
            if self.topology.is_dag_ancestor_of(sa, block, blue_candidate)? {
                continue;
            }

            let block_blue_anticone_size = self.blue_anticone_size(sa, block, new_block_data)?;
            candidate_blues_anticone_sizes.insert(block, block_blue_anticone_size);

            *candidate_blue_anticone_size += 1;
            if *candidate_blue_anticone_size > self.k {
                // k-cluster violation: The candidate's blue anticone exceeded k
                return Ok(ColoringState::Red);
            }

            if block_blue_anticone_size == self.k {
                // k-cluster violation: A block in candidate's blue anticone already
                // has k blue blocks in its own anticone
                return Ok(ColoringState::Red);
            }

            if block_blue_anticone_size > self.k {
                return Err(StoreError::DataInconsistency(format!("block {block} has a blue anticone larger than k")));
            }
        }

        Ok(ColoringState::Pending)
    }

    /// Returns the blue anticone size of `block` from the worldview of `context`.
    /// Expects `block` to be in the blue set of `context`
    fn blue_anticone_size(&self, sa: &StagingArea, block: Hash, context: &GhostdagData) -> StoreResult<KType> {
        let mut current_blues_anticone_sizes = HashKTypeMap::clone(&context.blues_anticone_sizes);
        let mut current_selected_parent = context.selected_parent;
        loop {
            if let Some(size) = current_blues_anticone_sizes.get(&block) {
                return Ok(*size);
            }

            if current_selected_parent == self.genesis_hash || current_selected_parent.is_origin() {
                return Err(StoreError::DataInconsistency(format!("block {block} is not in blue set of the given context")));
            }

            current_blues_anticone_sizes = sa.ghostdag.get_blues_anticone_sizes(current_selected_parent)?;
            current_selected_parent = sa.ghostdag.get_selected_parent(current_selected_parent)?;
        }
    }

    fn check_blue_candidate(
        &self,
        sa: &StagingArea,
        new_block_data: &GhostdagData,
        blue_candidate: Hash,
    ) -> StoreResult<ColoringOutput> {
        // The maximum length of new_block_data.mergeset_blues can be K+1 because
        // it contains the selected parent.
        if new_block_data.mergeset_blues.len() as KType == self.k + 1 {
            return Ok(ColoringOutput::Red);
        }

        let mut candidate_blues_anticone_sizes: BlockHashMap<KType> = BlockHashMap::with_capacity(self.k as usize);
        // Iterate over all blocks in the blue past of the new block that are not in the past
        // of blue_candidate, and check for each one of them if blue_candidate potentially
        // enlarges their blue anticone to be over K, or that they enlarge the blue anticone
        // of blue_candidate to be over K.
        let mut chain_block = ChainBlock { hash: None, data: Arc::new(new_block_data.clone()) };
        let mut candidate_blue_anticone_size: KType = 0;

        loop {
            let state = self.check_blue_candidate_with_chain_block(
                sa,
                new_block_data,
                &chain_block,
                blue_candidate,
                &mut candidate_blues_anticone_sizes,
                &mut candidate_blue_anticone_size,
            )?;

            match state {
                ColoringState::Blue => return Ok(ColoringOutput::Blue(candidate_blue_anticone_size, candidate_blues_anticone_sizes)),
                ColoringState::Red => return Ok(ColoringOutput::Red),
                ColoringState::Pending => (), // continue looping
            }

            let selected_parent = chain_block.data.selected_parent;
            if selected_parent == blockhash::ORIGIN {
                return Err(StoreError::DataInconsistency(format!("blue candidate {blue_candidate} is not in the future of genesis")));
            }
            chain_block = ChainBlock { hash: Some(selected_parent), data: sa.ghostdag.get_data(selected_parent)? };
        }
    }
}

/// Chain block with attached ghostdag data
struct ChainBlock {
    hash: Option<Hash>, // if set to `None`, signals being the new block
    data: Arc<GhostdagData>,
}

/// Represents the intermediate GHOSTDAG coloring state for the current candidate
enum ColoringState {
    Blue,
    Red,
    Pending,
}

enum ColoringOutput {
    Blue(KType, BlockHashMap<KType>), // (blue anticone size, map of blue anticone sizes for each affected blue)
    Red,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::storage::ConsensusStorage;
    use kestrel_consensus_core::header::Header;

    fn add_block(manager: &GhostdagManager, sa: &mut StagingArea, hash: u64, parents: &[u64]) -> Arc<GhostdagData> {
        let parents: Vec<Hash> = parents.iter().map(|&p| p.into()).collect();
        let mut header = Header::from_precomputed_hash(hash.into(), parents.clone());
        header.bits = 0x207fffff;
        sa.headers.insert(Arc::new(header)).unwrap();
        manager.topology.set_parents(sa, hash.into(), Arc::new(parents)).unwrap();
        manager.ensure_ghostdag(sa, hash.into()).unwrap()
    }

    #[test]
    fn test_ghostdag_coloring() {
        let storage = ConsensusStorage::new();
        let manager = GhostdagManager::new(1.into(), 1, DagTopologyManager::new(1.into()));
        let mut sa = StagingArea::new(&storage);

        let genesis = add_block(&manager, &mut sa, 1, &[]);
        assert_eq!(genesis.selected_parent, blockhash::ORIGIN);
        assert_eq!(genesis.blue_score, 0);

        // Three parallel blocks over genesis: with k = 1 the merging block keeps at most one of
        // the non-selected siblings blue
        add_block(&manager, &mut sa, 2, &[1]);
        add_block(&manager, &mut sa, 3, &[1]);
        add_block(&manager, &mut sa, 4, &[1]);
        let data = add_block(&manager, &mut sa, 5, &[2, 3, 4]);

        assert_eq!(data.mergeset_size(), 3);
        assert_eq!(data.mergeset_blues.len(), 2);
        assert_eq!(data.mergeset_reds.len(), 1);
        assert_eq!(data.blue_score, 1 + 2);
        // All blocks share the same bits, so blue ties are broken by the highest hash
        assert_eq!(data.selected_parent, 4.into());
        assert_eq!(data.blue_work, sa.ghostdag.get_blue_work(4.into()).unwrap() + 2 * calc_work(0x207fffff));
        // The staged data is reused rather than recomputed
        assert_eq!(manager.ensure_ghostdag(&mut sa, 5.into()).unwrap(), data);
    }

    #[test]
    fn test_chain_blue_score() {
        let storage = ConsensusStorage::new();
        let manager = GhostdagManager::new(1.into(), 18, DagTopologyManager::new(1.into()));
        let mut sa = StagingArea::new(&storage);

        add_block(&manager, &mut sa, 1, &[]);
        for i in 2..10 {
            let data = add_block(&manager, &mut sa, i, &[i - 1]);
            assert_eq!(data.blue_score, i - 1);
            assert_eq!(data.selected_parent, (i - 1).into());
            assert!(data.mergeset_reds.is_empty());
        }
    }
}
