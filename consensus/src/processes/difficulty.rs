use crate::{
    model::{staging::StagingArea, stores::headers::HeaderStoreReader},
    processes::window::BlockWindowHeap,
};
use itertools::Itertools;
use kestrel_database::prelude::StoreResult;
use kestrel_math::{BigInt, big_to_compact, compact_to_big};
use std::cmp::max;

struct DifficultyBlock {
    timestamp: u64,
    bits: u32,
}

/// Retargets difficulty over a full, un-sampled window: the average target of the window
/// is scaled by the ratio of the measured window duration to the expected one.
#[derive(Clone)]
pub struct DifficultyManager {
    genesis_bits: u32,
    min_difficulty_window_len: usize,
    target_time_per_block: u64,
    pow_max: u32,
}

impl DifficultyManager {
    pub fn new(genesis_bits: u32, min_difficulty_window_len: usize, target_time_per_block: u64, pow_max: u32) -> Self {
        Self { genesis_bits, min_difficulty_window_len, target_time_per_block, pow_max }
    }

    fn get_difficulty_blocks(&self, sa: &StagingArea, window: &BlockWindowHeap) -> StoreResult<Vec<DifficultyBlock>> {
        window
            .iter()
            .map(|item| {
                let header = sa.headers.get_header(item.0.hash)?;
                Ok(DifficultyBlock { timestamp: header.timestamp, bits: header.bits })
            })
            .collect()
    }

    pub fn calculate_difficulty_bits(&self, sa: &StagingArea, window: &BlockWindowHeap) -> StoreResult<u32> {
        let mut difficulty_blocks = self.get_difficulty_blocks(sa, window)?;

        // Until there are enough blocks for a valid calculation the difficulty should remain constant.
        if difficulty_blocks.len() < max(self.min_difficulty_window_len, 2) {
            return Ok(self.genesis_bits);
        }

        let (min_ts_index, max_ts_index) =
            match difficulty_blocks.iter().map(|block| block.timestamp).position_minmax().into_option() {
                Some(indices) => indices,
                None => return Ok(self.genesis_bits),
            };

        let min_ts = difficulty_blocks[min_ts_index].timestamp;
        let max_ts = difficulty_blocks[max_ts_index].timestamp;

        // We remove the minimal block because we want the average target for the internal window.
        difficulty_blocks.swap_remove(min_ts_index);

        let difficulty_blocks_len = difficulty_blocks.len() as u64;
        let targets_sum: BigInt = difficulty_blocks.iter().map(|block| compact_to_big(block.bits)).sum();
        let average_target = targets_sum / difficulty_blocks_len;
        let new_target = average_target * max(max_ts - min_ts, 1) / (self.target_time_per_block * difficulty_blocks_len);

        let max_target = compact_to_big(self.pow_max);
        Ok(big_to_compact(if new_target > max_target { &max_target } else { &new_target }))
    }
}
