use super::HeaderProcessor;
use crate::{
    errors::BlockProcessResult,
    model::{
        staging::StagingArea,
        stores::{headers::HeaderStoreReader, pruning::PruningStoreReader, statuses::StatusesStoreReader},
    },
};
use kestrel_consensus_core::{blockstatus::BlockStatus::StatusInvalid, errors::block::RuleError, hashing, header::Header};
use kestrel_core::{debug, trace};
use kestrel_database::prelude::StoreResultExt;
use kestrel_hashes::{Hash, PowHash};
use kestrel_math::{BigInt, compact_to_big, target_from_le_bytes};

impl HeaderProcessor {
    /// Header-first admission of the block staged under `hash`: parents must be known and valid,
    /// form an antichain and have the pruning point in their past; the proof of work must match
    /// the declared bits and those bits must be the required difficulty.
    ///
    /// Registers the block's parents in the topology and stages its GHOSTDAG data.
    pub fn validate_pruning_point_violation_and_pow_and_difficulty(
        &self,
        sa: &mut StagingArea,
        hash: Hash,
        is_trusted: bool,
    ) -> BlockProcessResult<()> {
        let header = sa.headers.get_header(hash)?;

        self.check_parent_headers_exist(sa, &header)?;
        self.check_parents_incest(sa, &header)?;
        self.check_pruning_violation(sa, &header)?;
        self.check_pow(&header)?;
        self.ensure_parents(sa, &header)?;
        self.validate_difficulty(sa, &header, is_trusted)
    }

    fn check_parent_headers_exist(&self, sa: &StagingArea, header: &Header) -> BlockProcessResult<()> {
        // A parent marked invalid rejects the block whether or not the parent header is held
        for parent in header.direct_parents().iter().copied() {
            if let Some(StatusInvalid) = sa.statuses.get(parent).optional()? {
                debug!("block {} has invalid ancestor {}", header.hash, parent);
                return Err(RuleError::InvalidAncestorBlock(parent).into());
            }
        }

        let mut missing_parents = Vec::new();
        for parent in header.direct_parents().iter().copied() {
            if !sa.headers.has(parent)? {
                missing_parents.push(parent);
            }
        }

        if !missing_parents.is_empty() {
            return Err(RuleError::MissingParents(missing_parents).into());
        }
        Ok(())
    }

    /// Fails if one of the parents is an ancestor of another parent
    pub(super) fn check_parents_incest(&self, sa: &StagingArea, header: &Header) -> BlockProcessResult<()> {
        let parents = header.direct_parents();
        for parent_a in parents.iter().copied() {
            for parent_b in parents.iter().copied() {
                if parent_a == parent_b {
                    continue;
                }

                if self.topology.is_dag_ancestor_of(sa, parent_a, parent_b)? {
                    return Err(RuleError::InvalidParentsRelation(parent_a, parent_b).into());
                }
            }
        }

        Ok(())
    }

    fn check_pruning_violation(&self, sa: &StagingArea, header: &Header) -> BlockProcessResult<()> {
        let pruning_point = sa.pruning.pruning_point()?;
        if pruning_point == self.genesis_hash {
            return Ok(());
        }

        // At least one parent must be in the future of the pruning point (or the pruning point itself),
        // otherwise the block builds on history that was already pruned
        if !self.topology.is_dag_ancestor_of_any(sa, pruning_point, &mut header.direct_parents().iter().copied())? {
            return Err(RuleError::PruningViolation(pruning_point).into());
        }
        Ok(())
    }

    pub(crate) fn check_pow(&self, header: &Header) -> BlockProcessResult<()> {
        let target = compact_to_big(header.bits);
        if target <= BigInt::from(0) {
            return Err(RuleError::NegativeTarget(header.bits).into());
        }

        if target > self.pow_max {
            return Err(RuleError::TargetTooHigh(header.bits).into());
        }

        if self.skip_proof_of_work {
            return Ok(());
        }

        let pow = PowHash::new(hashing::header::pre_pow_hash(header), header.timestamp).finalize_with_nonce(header.nonce);
        if target_from_le_bytes(pow.as_slice()) > target {
            return Err(RuleError::InvalidPoW.into());
        }
        Ok(())
    }

    fn validate_difficulty(&self, sa: &mut StagingArea, header: &Header, is_trusted: bool) -> BlockProcessResult<()> {
        let ghostdag_data = self.ghostdag_manager.ensure_ghostdag(sa, header.hash)?;

        // Trusted blocks arrive without the window of their past
        if is_trusted {
            trace!("skipping difficulty validation of trusted block {}", header.hash);
            return Ok(());
        }
        self.check_difficulty(sa, header, &ghostdag_data)
    }
}
