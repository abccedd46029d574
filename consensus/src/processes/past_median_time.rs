use crate::{
    model::{staging::StagingArea, stores::headers::HeaderStoreReader},
    processes::window::BlockWindowHeap,
};
use kestrel_database::prelude::StoreResult;

#[derive(Clone)]
pub struct PastMedianTimeManager {
    genesis_timestamp: u64,
}

impl PastMedianTimeManager {
    pub fn new(genesis_timestamp: u64) -> Self {
        Self { genesis_timestamp }
    }

    pub fn calc_past_median_time(&self, sa: &StagingArea, window: &BlockWindowHeap) -> StoreResult<u64> {
        if window.is_empty() {
            return Ok(self.genesis_timestamp);
        }

        let mut window_timestamps =
            window.iter().map(|item| sa.headers.get_timestamp(item.0.hash)).collect::<StoreResult<Vec<u64>>>()?;
        window_timestamps.sort_unstable(); // This is deterministic because we sort u64
        Ok(window_timestamps[window_timestamps.len() / 2])
    }
}
