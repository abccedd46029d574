use super::BlockBodyProcessor;
use crate::{
    errors::BlockProcessResult,
    model::{
        staging::StagingArea,
        stores::{
            block_transactions::BlockTransactionsStoreReader, ghostdag::GhostdagStoreReader, headers::HeaderStoreReader,
            pruning::PruningStoreReader, statuses::StatusesStoreReader, tips::TipsStoreReader,
        },
    },
    processes::transaction_validator::{LockTimeArg, LockTimeType, TransactionValidator},
};
use kestrel_consensus_core::{
    blockstatus::BlockStatus::StatusInvalid, errors::block::RuleError, ghostdag::GhostdagData, header::Header, tx::Transaction,
};
use kestrel_core::trace;
use kestrel_database::prelude::StoreResultExt;
use kestrel_hashes::Hash;
use once_cell::unsync::Lazy;

impl BlockBodyProcessor {
    /// Validates the body staged under `hash` against the DAG. The body of the pruning point is
    /// exempt from the pruned-block and parent-bodies checks.
    pub fn validate_body_in_context(&self, sa: &StagingArea, hash: Hash, is_pruning_point: bool) -> BlockProcessResult<()> {
        let header = sa.headers.get_header(hash)?;
        let transactions = sa.block_transactions.get(hash)?;
        let ghostdag_data = sa.ghostdag.get_data(hash)?;

        if !is_pruning_point {
            self.check_block_is_not_pruned(sa, hash)?;
            self.check_parent_bodies_exist(sa, &header)?;
        }
        self.check_coinbase_blue_score(&transactions, &ghostdag_data)?;
        self.check_block_transactions_in_context(sa, &transactions, &ghostdag_data)
    }

    fn check_block_is_not_pruned(&self, sa: &StagingArea, hash: Hash) -> BlockProcessResult<()> {
        // A block without a validated header cannot be in the past of any tip yet
        let has_validated_header = sa.statuses.get(hash).optional()?.is_some_and(|status| status.has_block_header());
        if !has_validated_header {
            return Ok(());
        }

        let tips = sa.tips.get()?;
        if self.topology.is_dag_ancestor_of_any(sa, hash, &mut tips.iter().copied().filter(|&tip| tip != hash))? {
            return Err(RuleError::PrunedBlock.into());
        }
        Ok(())
    }

    fn check_parent_bodies_exist(&self, sa: &StagingArea, header: &Header) -> BlockProcessResult<()> {
        let pruning_point = sa.pruning.pruning_point()?;
        let mut missing = Vec::new();
        for parent in header.direct_parents().iter().copied() {
            // The parent may have been invalidated after this block's header was accepted
            if let Some(StatusInvalid) = sa.statuses.get(parent).optional()? {
                return Err(RuleError::InvalidAncestorBlock(parent).into());
            }

            if sa.block_transactions.has(parent)? {
                continue;
            }

            // Bodies in the past of the pruning point are never required
            if self.topology.is_dag_ancestor_of(sa, parent, pruning_point)? {
                trace!("parent {} of block {} has no body but is in the past of the pruning point", parent, header.hash);
                continue;
            }
            missing.push(parent);
        }

        if !missing.is_empty() {
            return Err(RuleError::MissingParents(missing).into());
        }
        Ok(())
    }

    fn check_coinbase_blue_score(&self, transactions: &[Transaction], ghostdag_data: &GhostdagData) -> BlockProcessResult<()> {
        let coinbase = transactions.first().ok_or(RuleError::NoTransactions)?;
        let coinbase_data = self.coinbase_manager.deserialize_coinbase_payload(&coinbase.payload).map_err(RuleError::from)?;
        if coinbase_data.blue_score != ghostdag_data.blue_score {
            return Err(RuleError::BadCoinbasePayloadBlueScore(coinbase_data.blue_score, ghostdag_data.blue_score).into());
        }
        Ok(())
    }

    fn check_block_transactions_in_context(
        &self,
        sa: &StagingArea,
        transactions: &[Transaction],
        ghostdag_data: &GhostdagData,
    ) -> BlockProcessResult<()> {
        // Most transactions carry no time lock, so the past median time is computed only on demand
        let lazy_pmt_res = Lazy::new(|| self.window_manager.calc_past_median_time(sa, ghostdag_data));

        for tx in transactions.iter() {
            let lock_time_arg = match TransactionValidator::get_lock_time_type(tx) {
                LockTimeType::Finalized => LockTimeArg::Finalized,
                LockTimeType::BlueScore => LockTimeArg::BlueScore(ghostdag_data.blue_score),
                LockTimeType::Time => LockTimeArg::MedianTime((*lazy_pmt_res).clone()?),
            };
            if self.transaction_validator.validate_tx_in_header_context(tx, lock_time_arg).is_err() {
                return Err(RuleError::UnfinalizedTx(tx.id()).into());
            }
        }
        Ok(())
    }
}
