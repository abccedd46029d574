use super::HeaderProcessor;
use crate::{
    errors::BlockProcessResult,
    model::{staging::StagingArea, stores::headers::HeaderStoreReader},
};
use kestrel_consensus_core::{errors::block::RuleError, ghostdag::GhostdagData, header::Header};
use kestrel_core::trace;
use kestrel_hashes::Hash;

impl HeaderProcessor {
    /// Validates the header staged under `hash` against the DAG: parents antichain, difficulty,
    /// past median time, merge set size, GHOSTDAG fields and the bounded merge depth rule.
    ///
    /// Stages the block's relations, GHOSTDAG data, merge depth root and finality point.
    pub fn validate_header_in_context(&self, sa: &mut StagingArea, hash: Hash, is_trusted: bool) -> BlockProcessResult<()> {
        let header = sa.headers.get_header(hash)?;

        self.ensure_parents(sa, &header)?;
        self.check_parents_incest(sa, &header)?;

        let ghostdag_data = self.ghostdag_manager.ensure_ghostdag(sa, hash)?;
        if !is_trusted {
            self.check_difficulty(sa, &header, &ghostdag_data)?;
            self.check_median_timestamp(sa, &header, &ghostdag_data)?;
        }
        self.check_merge_size_limit(&ghostdag_data)?;
        Self::check_blue_score(&header, &ghostdag_data)?;
        Self::check_blue_work(&header, &ghostdag_data)?;
        self.check_bounded_merge_depth(sa, hash, is_trusted)
    }

    /// Enforces the bounded merge depth rule over the merge set of `hash`, staging its merge depth root
    /// and finality point on the way
    pub fn check_bounded_merge_depth(&self, sa: &mut StagingArea, hash: Hash, is_trusted: bool) -> BlockProcessResult<()> {
        self.depth_manager.check_bounded_merge_depth(sa, hash, is_trusted)
    }

    pub(super) fn check_difficulty(&self, sa: &StagingArea, header: &Header, ghostdag_data: &GhostdagData) -> BlockProcessResult<()> {
        let expected_bits = self.window_manager.calculate_difficulty_bits(sa, ghostdag_data)?;
        if header.bits != expected_bits {
            trace!("block {} declares bits {:#x} while {:#x} are required", header.hash, header.bits, expected_bits);
            return Err(RuleError::UnexpectedDifficulty(header.bits, expected_bits).into());
        }
        Ok(())
    }

    fn check_median_timestamp(&self, sa: &StagingArea, header: &Header, ghostdag_data: &GhostdagData) -> BlockProcessResult<()> {
        if header.direct_parents().is_empty() {
            return Ok(());
        }

        let past_median_time = self.window_manager.calc_past_median_time(sa, ghostdag_data)?;
        if header.timestamp < past_median_time {
            return Err(RuleError::TimeTooOld(header.timestamp, past_median_time).into());
        }
        Ok(())
    }

    fn check_merge_size_limit(&self, ghostdag_data: &GhostdagData) -> BlockProcessResult<()> {
        let mergeset_size = ghostdag_data.mergeset_size() as u64;
        if mergeset_size > self.mergeset_size_limit {
            return Err(RuleError::ViolatingMergeLimit(mergeset_size, self.mergeset_size_limit).into());
        }
        Ok(())
    }

    fn check_blue_score(header: &Header, ghostdag_data: &GhostdagData) -> BlockProcessResult<()> {
        if header.blue_score != ghostdag_data.blue_score {
            return Err(RuleError::UnexpectedHeaderBlueScore(header.blue_score, ghostdag_data.blue_score).into());
        }
        Ok(())
    }

    fn check_blue_work(header: &Header, ghostdag_data: &GhostdagData) -> BlockProcessResult<()> {
        if header.blue_work != ghostdag_data.blue_work {
            return Err(RuleError::UnexpectedHeaderBlueWork(header.blue_work, ghostdag_data.blue_work).into());
        }
        Ok(())
    }
}
