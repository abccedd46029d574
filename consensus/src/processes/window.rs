use crate::{
    model::{
        staging::StagingArea,
        stores::{
            ghostdag::{GhostdagStoreReader, SortableBlock},
            headers::HeaderStoreReader,
        },
    },
    processes::{difficulty::DifficultyManager, past_median_time::PastMedianTimeManager},
};
use kestrel_consensus_core::{BlueWorkType, blockhash::BlockHashExtensions, config::params::Params, ghostdag::GhostdagData};
use kestrel_database::prelude::StoreResult;
use kestrel_hashes::Hash;
use std::{cmp::Reverse, collections::BinaryHeap};

/// A min-heap of window blocks: the top is the block with the least blue work
pub type BlockWindowHeap = BinaryHeap<Reverse<SortableBlock>>;

#[derive(Clone, Copy)]
pub enum WindowType {
    DifficultyWindow,
    MedianTimeWindow,
}

/// Builds the blue-work-ordered block windows used for difficulty and past median time, and
/// dispatches the calculations over them.
#[derive(Clone)]
pub struct WindowManager {
    genesis_hash: Hash,
    difficulty_window_size: usize,
    past_median_time_window_size: usize,
    difficulty_manager: DifficultyManager,
    past_median_time_manager: PastMedianTimeManager,
}

impl WindowManager {
    pub fn new(params: &Params, genesis_hash: Hash) -> Self {
        Self {
            genesis_hash,
            difficulty_window_size: params.difficulty_window_size,
            past_median_time_window_size: params.past_median_time_window_size,
            difficulty_manager: DifficultyManager::new(
                params.genesis.bits,
                params.min_difficulty_window_len,
                params.target_time_per_block,
                params.pow_max,
            ),
            past_median_time_manager: PastMedianTimeManager::new(params.genesis.timestamp),
        }
    }

    pub fn window_size(&self, window_type: WindowType) -> usize {
        match window_type {
            WindowType::DifficultyWindow => self.difficulty_window_size,
            WindowType::MedianTimeWindow => self.past_median_time_window_size,
        }
    }

    /// Collects the `window_size` blocks with the highest blue work in the past of the block
    /// described by `ghostdag_data`, walking down its selected chain mergeset by mergeset.
    pub fn block_window(
        &self,
        sa: &StagingArea,
        ghostdag_data: &GhostdagData,
        window_type: WindowType,
    ) -> StoreResult<BlockWindowHeap> {
        let window_size = self.window_size(window_type);
        if window_size == 0 {
            return Ok(BlockWindowHeap::new());
        }
        // Genesis does not enter windows since its timestamp is fixed
        if ghostdag_data.selected_parent == self.genesis_hash || ghostdag_data.selected_parent.is_origin() {
            return Ok(BlockWindowHeap::new());
        }

        let mut window_heap = BoundedSizeBlockHeap::new(window_size);
        self.push_mergeset(sa, &mut window_heap, ghostdag_data)?;

        let mut current_ghostdag = sa.ghostdag.get_data(ghostdag_data.selected_parent)?;
        loop {
            if current_ghostdag.selected_parent.is_origin() || current_ghostdag.selected_parent == self.genesis_hash {
                break;
            }

            // No need to further iterate since the past of the selected parent has only lower blue work
            let parent_blue_work = sa.ghostdag.get_blue_work(current_ghostdag.selected_parent)?;
            if !window_heap.can_push(current_ghostdag.selected_parent, parent_blue_work) {
                break;
            }

            self.push_mergeset(sa, &mut window_heap, &current_ghostdag)?;
            current_ghostdag = sa.ghostdag.get_data(current_ghostdag.selected_parent)?;
        }

        Ok(window_heap.binary_heap)
    }

    fn push_mergeset(&self, sa: &StagingArea, heap: &mut BoundedSizeBlockHeap, ghostdag_data: &GhostdagData) -> StoreResult<()> {
        for block in ghostdag_data.unordered_mergeset() {
            heap.try_push(block, sa.ghostdag.get_blue_work(block)?);
        }
        Ok(())
    }

    pub fn calculate_difficulty_bits(&self, sa: &StagingArea, ghostdag_data: &GhostdagData) -> StoreResult<u32> {
        let window = self.block_window(sa, ghostdag_data, WindowType::DifficultyWindow)?;
        self.difficulty_manager.calculate_difficulty_bits(sa, &window)
    }

    pub fn calc_past_median_time(&self, sa: &StagingArea, ghostdag_data: &GhostdagData) -> StoreResult<u64> {
        let window = self.block_window(sa, ghostdag_data, WindowType::MedianTimeWindow)?;
        self.past_median_time_manager.calc_past_median_time(sa, &window)
    }

    /// The DAA score of a block: its selected parent's DAA score plus its mergeset size
    pub fn calc_daa_score(&self, sa: &StagingArea, ghostdag_data: &GhostdagData) -> StoreResult<u64> {
        if !ghostdag_data.has_selected_parent() {
            return Ok(0);
        }
        Ok(sa.headers.get_daa_score(ghostdag_data.selected_parent)? + ghostdag_data.mergeset_size() as u64)
    }
}

struct BoundedSizeBlockHeap {
    binary_heap: BlockWindowHeap,
    size_bound: usize,
}

impl BoundedSizeBlockHeap {
    fn new(size_bound: usize) -> Self {
        Self { binary_heap: BlockWindowHeap::with_capacity(size_bound), size_bound }
    }

    fn reached_size_bound(&self) -> bool {
        self.binary_heap.len() == self.size_bound
    }

    fn can_push(&self, hash: Hash, blue_work: BlueWorkType) -> bool {
        let r_sortable_block = Reverse(SortableBlock::new(hash, blue_work));
        match self.binary_heap.peek() {
            // Pushing a block with less blue work than the current minimum would only evict it again
            Some(min) if self.reached_size_bound() => *min >= r_sortable_block,
            _ => true,
        }
    }

    fn try_push(&mut self, hash: Hash, blue_work: BlueWorkType) -> bool {
        if !self.can_push(hash, blue_work) {
            return false;
        }
        if self.reached_size_bound() {
            self.binary_heap.pop();
        }
        self.binary_heap.push(Reverse(SortableBlock::new(hash, blue_work)));
        true
    }
}
