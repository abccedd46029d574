use crate::{
    consensus::storage::ConsensusStorage,
    errors::{BlockProcessResult, ValidationError},
    model::{
        staging::StagingArea,
        stores::{
            depth::DepthStoreReader,
            pruning::PruningStoreReader,
            virtual_state::{VirtualState, VirtualStateStoreReader},
        },
    },
    processes::{
        coinbase::CoinbaseManager, ghostdag::protocol::GhostdagManager, transaction_validator::TransactionValidator,
        window::WindowManager,
    },
};
use kestrel_consensus_core::{
    acceptance_data::{AcceptanceData, sorted_accepted_transaction_ids},
    block::Block,
    coinbase::MinerData,
    config::constants::BLOCK_VERSION,
    errors::{
        block::{InvalidTransaction, RuleError},
        coinbase::CoinbaseError,
    },
    header::Header,
    merkle::{calc_accepted_id_merkle_root, calc_hash_merkle_root},
    tx::{MutableTransaction, Transaction},
};
use kestrel_core::{
    debug,
    time::{Stopwatch, unix_now},
};
use kestrel_database::prelude::StoreResultExt;
use kestrel_hashes::Hash;
use std::{cmp::max, sync::Arc};

/// Owns the virtual block: the block merging all current DAG tips. Resolving the virtual UTXO
/// state is done by its owner, who sets the resulting state; this processor derives the
/// GHOSTDAG-level fields of the virtual and builds block templates on top of it.
pub struct VirtualStateProcessor {
    pub(super) storage: Arc<ConsensusStorage>,

    // Managers and services
    pub(super) ghostdag_manager: GhostdagManager,
    pub(super) window_manager: WindowManager,
    pub(super) coinbase_manager: CoinbaseManager,
    pub(super) transaction_validator: TransactionValidator,
}

impl VirtualStateProcessor {
    pub fn new(
        storage: Arc<ConsensusStorage>,
        ghostdag_manager: GhostdagManager,
        window_manager: WindowManager,
        coinbase_manager: CoinbaseManager,
        transaction_validator: TransactionValidator,
    ) -> Self {
        Self { storage, ghostdag_manager, window_manager, coinbase_manager, transaction_validator }
    }

    pub fn virtual_state(&self) -> BlockProcessResult<Arc<VirtualState>> {
        Ok(self.storage.virtual_state_store.get()?)
    }

    /// Derives the state of a virtual block over `parents`. GHOSTDAG data, difficulty, past median
    /// time and DAA score are computed against committed data only; the UTXO-level fields are taken
    /// as given.
    pub fn calculate_virtual_state(
        &self,
        parents: Vec<Hash>,
        mergeset_acceptance: AcceptanceData,
        multiset_hash: Hash,
    ) -> BlockProcessResult<VirtualState> {
        let mut parents = parents;
        parents.sort();

        // A throwaway staging area, nothing computed here is committed
        let sa = StagingArea::new(&self.storage);
        let ghostdag_data = self.ghostdag_manager.ghostdag(&sa, &parents)?;
        let bits = self.window_manager.calculate_difficulty_bits(&sa, &ghostdag_data)?;
        let past_median_time = self.window_manager.calc_past_median_time(&sa, &ghostdag_data)?;
        let daa_score = self.window_manager.calc_daa_score(&sa, &ghostdag_data)?;
        Ok(VirtualState::new(parents, ghostdag_data, daa_score, bits, past_median_time, mergeset_acceptance, multiset_hash))
    }

    pub fn set_virtual_state(&self, state: VirtualState) {
        self.storage.virtual_state_store.set(Arc::new(state))
    }

    /// Builds a block template on top of the current virtual state.
    ///
    /// Every transaction is validated against the virtual UTXO set; all invalid transactions are reported
    /// together. The UTXO entries held by the caller's transactions are left as they were.
    pub fn build_block(&self, miner_data: MinerData, transactions: &mut [MutableTransaction]) -> BlockProcessResult<Block> {
        let _sw = Stopwatch::<500>::with_threshold("build_block");
        let virtual_state = self.virtual_state()?;

        let mut total_fees = 0u64;
        let mut invalid_transactions = Vec::new();
        for tx in transactions.iter_mut() {
            match self.validate_block_template_transaction(tx, &virtual_state) {
                Ok(fee) => total_fees = total_fees.saturating_add(fee),
                Err(ValidationError::Rule(e)) => invalid_transactions.push(InvalidTransaction::new((*tx.tx).clone(), e)),
                Err(e) => return Err(e),
            }
        }
        if !invalid_transactions.is_empty() {
            debug!("block template rejected {} invalid transactions", invalid_transactions.len());
            return Err(RuleError::InvalidTransactionsInNewBlock(invalid_transactions).into());
        }

        let coinbase = self.build_coinbase(&virtual_state, miner_data, total_fees)?;
        let mut txs: Vec<Transaction> = Vec::with_capacity(transactions.len() + 1);
        txs.push(coinbase);
        txs.extend(transactions.iter().map(|tx| (*tx.tx).clone()));

        let header = self.build_header(&virtual_state, &txs)?;
        Ok(Block::new(header, txs))
    }

    fn build_coinbase(&self, virtual_state: &VirtualState, miner_data: MinerData, total_fees: u64) -> BlockProcessResult<Transaction> {
        self.coinbase_manager
            .expected_coinbase_transaction(virtual_state.ghostdag_data.blue_score, virtual_state.daa_score, miner_data, total_fees)
            .map_err(|e| match e {
                CoinbaseError::PayloadLenAboveMax(len, max_len) => RuleError::BadCoinbasePayloadLen(len, max_len).into(),
                e => RuleError::from(e).into(),
            })
    }

    fn build_header(&self, virtual_state: &VirtualState, txs: &[Transaction]) -> BlockProcessResult<Header> {
        let accepted_id_merkle_root =
            calc_accepted_id_merkle_root(sorted_accepted_transaction_ids(&virtual_state.mergeset_acceptance).into_iter());
        let timestamp = max(unix_now(), virtual_state.past_median_time + 1);
        let pruning_point = self.storage.pruning_point_store.pruning_point()?;
        let finality_point =
            self.storage.depth_store.finality_point(virtual_state.ghostdag_data.selected_parent).optional()?.unwrap_or_default();

        Ok(Header::new_finalized(
            BLOCK_VERSION,
            vec![virtual_state.parents.clone()],
            calc_hash_merkle_root(txs.iter()),
            accepted_id_merkle_root,
            virtual_state.multiset_hash,
            timestamp,
            virtual_state.bits,
            0,
            virtual_state.daa_score,
            virtual_state.ghostdag_data.blue_work,
            virtual_state.ghostdag_data.blue_score,
            finality_point,
            pruning_point,
        ))
    }
}
