use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use kestrel_consensus_core::{
    block::{Block, MutableBlock},
    blockstatus::BlockStatus,
    coinbase::MinerData,
    config::{Config, constants::BLOCK_VERSION},
    header::Header,
    merkle::calc_hash_merkle_root,
    tx::{ScriptPublicKey, Transaction},
};
use kestrel_database::prelude::StoreResultExt;
use kestrel_hashes::{Hash, ZERO_HASH};

use crate::{
    errors::BlockProcessResult,
    model::{
        staging::StagingArea,
        stores::{depth::DepthStoreReader, pruning::PruningStoreReader},
    },
    pipeline::{
        block_processor::BlockProcessor, body_processor::BlockBodyProcessor, header_processor::HeaderProcessor,
        virtual_processor::VirtualStateProcessor,
    },
};

use super::{Consensus, storage::ConsensusStorage};

/// A consensus instance with helpers for building valid headers and blocks over any set of known parents
pub struct TestConsensus {
    consensus: Consensus,
    // Distinguishes otherwise identical sibling headers
    nonce_counter: AtomicU64,
}

impl TestConsensus {
    /// Creates a test consensus with genesis inserted, unless the config says otherwise
    pub fn new(config: &Config) -> Self {
        let consensus = Consensus::new(Arc::new(config.clone()));
        consensus.init().unwrap();
        Self { consensus, nonce_counter: AtomicU64::new(0) }
    }

    pub fn consensus(&self) -> &Consensus {
        &self.consensus
    }

    pub fn storage(&self) -> &Arc<ConsensusStorage> {
        self.consensus.storage()
    }

    pub fn header_processor(&self) -> &HeaderProcessor {
        &self.consensus.header_processor
    }

    pub fn body_processor(&self) -> &BlockBodyProcessor {
        &self.consensus.body_processor
    }

    pub fn virtual_processor(&self) -> &VirtualStateProcessor {
        &self.consensus.virtual_processor
    }

    pub fn block_processor(&self) -> &BlockProcessor {
        &self.consensus.block_processor
    }

    /// Builds a header over `parents` whose GHOSTDAG, difficulty, DAA and timestamp fields agree with
    /// the committed DAG. The merkle root commits to the default coinbase built for the block.
    pub fn build_header_with_parents(&self, parents: Vec<Hash>) -> Header {
        self.build_block_with_parents_and_transactions(parents, vec![]).header
    }

    pub fn build_block_with_parents(&self, parents: Vec<Hash>) -> MutableBlock {
        self.build_block_with_parents_and_transactions(parents, vec![])
    }

    /// Builds a block over `parents` with a valid coinbase followed by `txs`
    pub fn build_block_with_parents_and_transactions(&self, mut parents: Vec<Hash>, txs: Vec<Transaction>) -> MutableBlock {
        parents.sort();
        let storage = self.storage();
        let sa = StagingArea::new(storage);
        let ghostdag_data = self.consensus.ghostdag_manager.ghostdag(&sa, &parents).unwrap();
        let bits = self.consensus.window_manager.calculate_difficulty_bits(&sa, &ghostdag_data).unwrap();
        let past_median_time = self.consensus.window_manager.calc_past_median_time(&sa, &ghostdag_data).unwrap();
        let daa_score = self.consensus.window_manager.calc_daa_score(&sa, &ghostdag_data).unwrap();
        let pruning_point = storage.pruning_point_store.pruning_point().unwrap();
        let finality_point = storage.depth_store.finality_point(ghostdag_data.selected_parent).optional().unwrap().unwrap_or_default();

        let coinbase = self
            .consensus
            .coinbase_manager
            .expected_coinbase_transaction(ghostdag_data.blue_score, daa_score, MinerData::new(ScriptPublicKey::default(), vec![]), 0)
            .unwrap();
        let mut transactions = Vec::with_capacity(txs.len() + 1);
        transactions.push(coinbase);
        transactions.extend(txs);

        let header = Header::new_finalized(
            BLOCK_VERSION,
            vec![parents],
            calc_hash_merkle_root(transactions.iter()),
            ZERO_HASH,
            ZERO_HASH,
            past_median_time + 1,
            bits,
            self.nonce_counter.fetch_add(1, Ordering::Relaxed),
            daa_score,
            ghostdag_data.blue_work,
            ghostdag_data.blue_score,
            finality_point,
            pruning_point,
        );
        MutableBlock::new(header, transactions)
    }

    pub fn validate_and_insert_block(&self, block: &Block) -> BlockProcessResult<BlockStatus> {
        self.consensus.validate_and_insert_block(block)
    }

    pub fn add_header_only_block_with_parents(&self, parents: Vec<Hash>) -> BlockProcessResult<Hash> {
        let header = Arc::new(self.build_header_with_parents(parents));
        self.consensus.validate_and_insert_header(&header)?;
        Ok(header.hash)
    }

    pub fn add_block_with_parents(&self, parents: Vec<Hash>) -> BlockProcessResult<Hash> {
        let block = self.build_block_with_parents(parents).to_immutable();
        self.validate_and_insert_block(&block)?;
        Ok(block.hash())
    }
}
