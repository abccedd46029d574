use crate::{
    errors::BlockProcessResult,
    model::{
        staging::StagingArea,
        stores::{depth::DepthStoreReader, ghostdag::GhostdagStoreReader, pruning::PruningStoreReader},
    },
    processes::dag_topology::DagTopologyManager,
};
use kestrel_consensus_core::{
    blockhash::{BlockHashExtensions, ORIGIN},
    errors::block::RuleError,
};
use kestrel_core::trace;
use kestrel_database::prelude::{StoreResult, StoreResultExt};
use kestrel_hashes::Hash;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DepthType {
    MergeDepth,
    Finality,
}

/// Computes and memoizes the merge depth root and the finality point of blocks, and enforces
/// the bounded merge depth rule.
///
/// Both points are found by the same walk: starting from the selected parent's point, advance
/// along the selected chain of the block until reaching the first block whose blue score is at
/// least `blue_score - depth`.
#[derive(Clone)]
pub struct BlockDepthManager {
    merge_depth: u64,
    finality_depth: u64,
    genesis_hash: Hash,
    topology: DagTopologyManager,
}

impl BlockDepthManager {
    pub fn new(merge_depth: u64, finality_depth: u64, genesis_hash: Hash, topology: DagTopologyManager) -> Self {
        Self { merge_depth, finality_depth, genesis_hash, topology }
    }

    pub fn merge_depth(&self) -> u64 {
        self.merge_depth
    }

    /// Returns the merge depth root of `hash`, computing and staging it on first use
    pub fn merge_depth_root(&self, sa: &mut StagingArea, hash: Hash, is_trusted: bool) -> StoreResult<Hash> {
        if let Some(root) = sa.depth.merge_depth_root(hash).optional()? {
            return Ok(root);
        }
        let root = self.calc_depth_point(sa, hash, is_trusted, DepthType::MergeDepth)?;
        trace!("merge depth root of block {} is {}", hash, root);
        sa.depth.insert_merge_depth_root(hash, root)?;
        Ok(root)
    }

    /// Returns the finality point of `hash`, computing and staging it on first use
    pub fn finality_point(&self, sa: &mut StagingArea, hash: Hash, is_trusted: bool) -> StoreResult<Hash> {
        if let Some(point) = sa.depth.finality_point(hash).optional()? {
            return Ok(point);
        }
        let point = self.calc_depth_point(sa, hash, is_trusted, DepthType::Finality)?;
        sa.depth.insert_finality_point(hash, point)?;
        Ok(point)
    }

    fn calc_depth_point(&self, sa: &StagingArea, hash: Hash, is_trusted: bool, depth_type: DepthType) -> StoreResult<Hash> {
        // Trusted data is imported as is, there is no history below it to walk
        if is_trusted {
            return Ok(ORIGIN);
        }

        let depth = match depth_type {
            DepthType::MergeDepth => self.merge_depth,
            DepthType::Finality => self.finality_depth,
        };

        let ghostdag_data = sa.ghostdag.get_data(hash)?;
        if ghostdag_data.blue_score < depth {
            return Ok(self.genesis_hash);
        }

        let pruning_point = sa.pruning.pruning_point()?;
        let pruning_point_blue_score = sa.ghostdag.get_blue_score(pruning_point)?;
        if ghostdag_data.blue_score < pruning_point_blue_score + depth
            || !self.topology.is_chain_ancestor_of(sa, pruning_point, hash)?
        {
            return Ok(ORIGIN);
        }

        let selected_parent = ghostdag_data.selected_parent;
        if selected_parent == self.genesis_hash {
            return Ok(self.genesis_hash);
        }

        let selected_parent_point = match depth_type {
            DepthType::MergeDepth => match sa.depth.merge_depth_root(selected_parent).optional()? {
                Some(root) => Some(root),
                None => sa.depth.finality_point(selected_parent).optional()?,
            },
            DepthType::Finality => sa.depth.finality_point(selected_parent).optional()?,
        };
        let mut current = match selected_parent_point {
            Some(point) if !point.is_origin() => point,
            _ => pruning_point,
        };

        let required_blue_score = ghostdag_data.blue_score - depth;
        while current != selected_parent && sa.ghostdag.get_blue_score(current)? < required_blue_score {
            current = self.topology.child_in_selected_parent_chain_of(sa, current, hash)?;
        }
        Ok(current)
    }

    /// Verifies that every red block merged by `hash` is either in the future of its merge depth root,
    /// or in the past of a blue which has the merge depth root on its selected chain.
    /// Also stages the finality point of the block.
    pub fn check_bounded_merge_depth(&self, sa: &mut StagingArea, hash: Hash, is_trusted: bool) -> BlockProcessResult<()> {
        let ghostdag_data = sa.ghostdag.get_data(hash)?;
        if !ghostdag_data.has_selected_parent() {
            return Ok(());
        }

        let merge_depth_root = self.merge_depth_root(sa, hash, is_trusted)?;
        self.finality_point(sa, hash, is_trusted)?;

        let mut chain_compliant_blues = Vec::with_capacity(ghostdag_data.mergeset_blues.len());
        for blue in ghostdag_data.mergeset_blues.iter().copied() {
            if self.topology.is_chain_ancestor_of(sa, merge_depth_root, blue)? {
                chain_compliant_blues.push(blue);
            }
        }

        for red in ghostdag_data.mergeset_reds.iter().copied() {
            if self.topology.is_dag_ancestor_of(sa, merge_depth_root, red)? {
                continue;
            }

            if !self.topology.is_dag_ancestor_of_any(sa, red, &mut chain_compliant_blues.iter().copied())? {
                trace!("block {} merges red block {} below its merge depth root {}", hash, red, merge_depth_root);
                return Err(RuleError::ViolatingBoundedMergeDepth.into());
            }
        }

        Ok(())
    }
}
