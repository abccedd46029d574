use std::collections::VecDeque;

use crate::model::{
    staging::StagingArea,
    stores::{ghostdag::GhostdagStoreReader, relations::RelationsStoreReader},
};
use kestrel_consensus_core::{
    BlockHashSet,
    blockhash::{BlockHashExtensions, BlockHashes},
};
use kestrel_database::prelude::{StoreError, StoreResult, StoreResultExt};
use kestrel_hashes::Hash;

/// Graph queries over the block relations visible through a staging area.
///
/// Ancestry is inclusive: every block is considered an ancestor of itself. `ORIGIN` is an
/// ancestor of every block. Reachability is answered by a breadth-first walk over parents,
/// pruned by blue work which strictly increases along DAG edges.
#[derive(Clone, Copy)]
pub struct DagTopologyManager {
    genesis_hash: Hash,
}

impl DagTopologyManager {
    pub fn new(genesis_hash: Hash) -> Self {
        Self { genesis_hash }
    }

    pub fn genesis_hash(&self) -> Hash {
        self.genesis_hash
    }

    pub fn parents(&self, sa: &StagingArea, hash: Hash) -> StoreResult<BlockHashes> {
        sa.relations.get_parents(hash)
    }

    pub fn children(&self, sa: &StagingArea, hash: Hash) -> StoreResult<BlockHashes> {
        sa.relations.get_children(hash)
    }

    /// Stages the parent relation of `hash`. Parents are write-once per block.
    pub fn set_parents(&self, sa: &mut StagingArea, hash: Hash, parents: BlockHashes) -> StoreResult<()> {
        sa.relations.insert(hash, parents)
    }

    pub fn is_dag_ancestor_of(&self, sa: &StagingArea, this: Hash, queried: Hash) -> StoreResult<bool> {
        if this == queried || this.is_origin() {
            return Ok(true);
        }
        if queried.is_origin() {
            return Ok(false);
        }

        // Blocks with lower blue work than `this` cannot have it in their past
        let this_blue_work = sa.ghostdag.get_blue_work(this).optional()?;
        let mut queue = VecDeque::from([queried]);
        let mut visited = BlockHashSet::from_iter([queried]);
        while let Some(current) = queue.pop_front() {
            // Blocks without relations (e.g. pruned headers) are treated as leaves
            let Some(parents) = sa.relations.get_parents(current).optional()? else {
                continue;
            };
            for parent in parents.iter().copied() {
                if parent == this {
                    return Ok(true);
                }
                if !visited.insert(parent) {
                    continue;
                }
                let parent_blue_work = sa.ghostdag.get_blue_work(parent).optional()?;
                if let (Some(this_blue_work), Some(parent_blue_work)) = (this_blue_work, parent_blue_work) {
                    if parent_blue_work < this_blue_work {
                        continue;
                    }
                }
                queue.push_back(parent);
            }
        }
        Ok(false)
    }

    /// Returns true if `this` is an ancestor of at least one of `queried`
    pub fn is_dag_ancestor_of_any(&self, sa: &StagingArea, this: Hash, queried: &mut impl Iterator<Item = Hash>) -> StoreResult<bool> {
        for hash in queried {
            if self.is_dag_ancestor_of(sa, this, hash)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Returns true if any of `this` is an ancestor of `queried`
    pub fn is_any_dag_ancestor_of(&self, sa: &StagingArea, this: &mut impl Iterator<Item = Hash>, queried: Hash) -> StoreResult<bool> {
        for hash in this {
            if self.is_dag_ancestor_of(sa, hash, queried)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Returns true if `this` is on the selected parent chain of `queried` (inclusive)
    pub fn is_chain_ancestor_of(&self, sa: &StagingArea, this: Hash, queried: Hash) -> StoreResult<bool> {
        if this.is_origin() {
            return Ok(true);
        }
        let Some(this_blue_score) = sa.ghostdag.get_blue_score(this).optional()? else {
            return Ok(this == queried);
        };

        let mut current = queried;
        loop {
            if current == this {
                return Ok(true);
            }
            let Some(data) = sa.ghostdag.get_data(current).optional()? else {
                return Ok(false);
            };
            if data.blue_score < this_blue_score || !data.has_selected_parent() {
                return Ok(false);
            }
            current = data.selected_parent;
        }
    }

    /// Returns the block on the selected parent chain of `queried` whose selected parent is `this`
    pub fn child_in_selected_parent_chain_of(&self, sa: &StagingArea, this: Hash, queried: Hash) -> StoreResult<Hash> {
        if this == queried {
            return Err(StoreError::DataInconsistency(format!("block {this} has no child in its own selected chain")));
        }

        let this_blue_score = sa.ghostdag.get_blue_score(this)?;
        let mut current = queried;
        loop {
            let data = sa.ghostdag.get_data(current)?;
            if data.selected_parent == this {
                return Ok(current);
            }
            if data.blue_score <= this_blue_score || !data.has_selected_parent() {
                return Err(StoreError::DataInconsistency(format!("block {this} is not in the selected chain of {queried}")));
            }
            current = data.selected_parent;
        }
    }
}
