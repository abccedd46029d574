pub mod storage;
pub mod test_consensus;

use crate::{
    errors::BlockProcessResult,
    model::stores::virtual_state::VirtualState,
    pipeline::{
        block_processor::BlockProcessor, body_processor::BlockBodyProcessor, header_processor::HeaderProcessor,
        virtual_processor::VirtualStateProcessor,
    },
    processes::{
        block_depth::BlockDepthManager, coinbase::CoinbaseManager, dag_topology::DagTopologyManager,
        ghostdag::protocol::GhostdagManager, transaction_validator::TransactionValidator, window::WindowManager,
    },
};
use kestrel_consensus_core::{
    acceptance_data::AcceptanceData,
    block::Block,
    blockstatus::BlockStatus,
    coinbase::MinerData,
    config::Config,
    header::Header,
    tx::MutableTransaction,
};
use kestrel_core::debug;
use kestrel_hashes::Hash;
use std::sync::Arc;
use storage::ConsensusStorage;

/// The consensus instance: in-memory stores plus the validation pipeline and block template
/// builder wired over them.
pub struct Consensus {
    config: Arc<Config>,
    genesis_hash: Hash,
    storage: Arc<ConsensusStorage>,

    // Managers and services
    pub(crate) ghostdag_manager: GhostdagManager,
    pub(crate) window_manager: WindowManager,
    pub(crate) coinbase_manager: CoinbaseManager,

    // Processors
    pub(crate) header_processor: HeaderProcessor,
    pub(crate) body_processor: BlockBodyProcessor,
    pub(crate) virtual_processor: VirtualStateProcessor,
    pub(crate) block_processor: BlockProcessor,
}

impl Consensus {
    pub fn new(config: Arc<Config>) -> Self {
        let params = &config.params;
        let genesis_hash = params.genesis.hash();
        let storage = ConsensusStorage::new();

        //
        // Managers and services
        //
        let topology = DagTopologyManager::new(genesis_hash);
        let ghostdag_manager = GhostdagManager::new(genesis_hash, params.ghostdag_k, topology);
        let window_manager = WindowManager::new(params, genesis_hash);
        let depth_manager = BlockDepthManager::new(params.merge_depth, params.finality_depth, genesis_hash, topology);
        let coinbase_manager = CoinbaseManager::new(
            params.coinbase_payload_script_public_key_max_len,
            params.max_coinbase_payload_len,
            params.base_subsidy,
        );
        let transaction_validator = TransactionValidator::new(
            params.max_tx_inputs,
            params.max_tx_outputs,
            params.max_signature_script_len,
            params.max_script_public_key_len,
            params.coinbase_maturity,
        );

        //
        // Processors
        //
        let header_processor = HeaderProcessor::new(
            params,
            genesis_hash,
            topology,
            ghostdag_manager.clone(),
            window_manager.clone(),
            depth_manager,
        );
        let body_processor = BlockBodyProcessor::new(
            params,
            genesis_hash,
            topology,
            window_manager.clone(),
            coinbase_manager.clone(),
            transaction_validator.clone(),
        );
        let virtual_processor = VirtualStateProcessor::new(
            storage.clone(),
            ghostdag_manager.clone(),
            window_manager.clone(),
            coinbase_manager.clone(),
            transaction_validator,
        );
        let block_processor = BlockProcessor::new(
            storage.clone(),
            params.genesis.clone(),
            topology,
            ghostdag_manager.clone(),
            header_processor.clone(),
            body_processor.clone(),
        );

        Self {
            config,
            genesis_hash,
            storage,
            ghostdag_manager,
            window_manager,
            coinbase_manager,
            header_processor,
            body_processor,
            virtual_processor,
            block_processor,
        }
    }

    /// Inserts genesis (unless configured otherwise) and sets the virtual state on top of it
    pub fn init(&self) -> BlockProcessResult<()> {
        if !self.config.process_genesis {
            return Ok(());
        }
        self.block_processor.process_genesis()?;
        let state = self.virtual_processor.calculate_virtual_state(
            vec![self.genesis_hash],
            AcceptanceData::default(),
            self.config.genesis.utxo_commitment,
        )?;
        self.virtual_processor.set_virtual_state(state);
        debug!("consensus initialized over genesis {}", self.genesis_hash);
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn genesis_hash(&self) -> Hash {
        self.genesis_hash
    }

    pub fn storage(&self) -> &Arc<ConsensusStorage> {
        &self.storage
    }

    pub fn validate_and_insert_block(&self, block: &Block) -> BlockProcessResult<BlockStatus> {
        self.block_processor.validate_and_insert_block(block)
    }

    pub fn validate_and_insert_header(&self, header: &Arc<Header>) -> BlockProcessResult<BlockStatus> {
        self.block_processor.validate_and_insert_header(header)
    }

    pub fn build_block(&self, miner_data: MinerData, transactions: &mut [MutableTransaction]) -> BlockProcessResult<Block> {
        self.virtual_processor.build_block(miner_data, transactions)
    }

    pub fn virtual_state(&self) -> BlockProcessResult<Arc<VirtualState>> {
        self.virtual_processor.virtual_state()
    }

    /// Replaces the virtual state with one over `parents`. The UTXO-level fields are resolved by the caller.
    pub fn set_virtual_parents(
        &self,
        parents: Vec<Hash>,
        mergeset_acceptance: AcceptanceData,
        multiset_hash: Hash,
    ) -> BlockProcessResult<()> {
        let state = self.virtual_processor.calculate_virtual_state(parents, mergeset_acceptance, multiset_hash)?;
        self.virtual_processor.set_virtual_state(state);
        Ok(())
    }
}
