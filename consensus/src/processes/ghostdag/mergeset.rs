use super::protocol::GhostdagManager;
use crate::model::{staging::StagingArea, stores::relations::RelationsStoreReader};
use kestrel_consensus_core::BlockHashSet;
use kestrel_database::prelude::StoreResult;
use kestrel_hashes::Hash;
use std::collections::VecDeque;

impl GhostdagManager {
    pub fn ordered_mergeset_without_selected_parent(
        &self,
        sa: &StagingArea,
        selected_parent: Hash,
        parents: &[Hash],
    ) -> StoreResult<Vec<Hash>> {
        let mut queue: VecDeque<_> = parents.iter().copied().filter(|p| p != &selected_parent).collect();
        let mut mergeset: BlockHashSet = queue.iter().copied().collect();
        let mut selected_parent_past = BlockHashSet::new();

        while let Some(current) = queue.pop_front() {
            let current_parents = sa.relations.get_parents(current)?;

            // For each parent of the current block we check whether it is in the past of the selected parent. If not,
            // we add it to the resulting merge-set and queue it for further processing.
            for parent in current_parents.iter().copied() {
                if mergeset.contains(&parent) || selected_parent_past.contains(&parent) {
                    continue;
                }

                if self.topology.is_dag_ancestor_of(sa, parent, selected_parent)? {
                    selected_parent_past.insert(parent);
                    continue;
                }

                mergeset.insert(parent);
                queue.push_back(parent);
            }
        }

        self.sort_blocks(sa, mergeset)
    }
}
