use crate::{
    consensus::storage::ConsensusStorage,
    errors::{BlockProcessResult, ValidationError},
    model::{
        staging::StagingArea,
        stores::{pruning::PruningStoreReader, statuses::StatusesStoreReader},
    },
    pipeline::{body_processor::BlockBodyProcessor, header_processor::HeaderProcessor},
    processes::{dag_topology::DagTopologyManager, ghostdag::protocol::GhostdagManager},
};
use kestrel_consensus_core::{
    block::Block,
    blockstatus::BlockStatus::{self, StatusHeaderOnly, StatusInvalid, StatusUTXOPendingVerification, StatusUTXOValid},
    config::genesis::GenesisBlock,
    errors::block::RuleError,
    header::Header,
};
use kestrel_core::{debug, info, time::Stopwatch, trace};
use kestrel_database::prelude::StoreResultExt;
use kestrel_hashes::Hash;
use std::sync::Arc;

/// Drives blocks through the validation stages and commits the staged results.
///
/// Every stage of a block runs over its own [`StagingArea`]: the header is committed once all
/// header stages pass and the body once all body stages pass. Callers must submit blocks in
/// topological order, i.e. a block only after its parents were processed.
pub struct BlockProcessor {
    storage: Arc<ConsensusStorage>,
    genesis: GenesisBlock,

    // Managers and services
    topology: DagTopologyManager,
    ghostdag_manager: GhostdagManager,

    // Processors
    header_processor: HeaderProcessor,
    body_processor: BlockBodyProcessor,
}

impl BlockProcessor {
    pub fn new(
        storage: Arc<ConsensusStorage>,
        genesis: GenesisBlock,
        topology: DagTopologyManager,
        ghostdag_manager: GhostdagManager,
        header_processor: HeaderProcessor,
        body_processor: BlockBodyProcessor,
    ) -> Self {
        Self { storage, genesis, topology, ghostdag_manager, header_processor, body_processor }
    }

    /// Validates and inserts a full block. Returns the status of the block after processing.
    pub fn validate_and_insert_block(&self, block: &Block) -> BlockProcessResult<BlockStatus> {
        let _sw = Stopwatch::<500>::with_threshold("validate_and_insert_block");
        let hash = block.hash();
        match self.storage.statuses_store.get(hash).optional()? {
            Some(StatusInvalid) => return Err(RuleError::KnownInvalid.into()),
            Some(status) if status.has_block_body() => return Ok(status),
            Some(_) => {} // Header only, proceed to body processing
            None => self.process_header(&block.header, false)?,
        }
        self.process_body(block)
    }

    /// Validates and inserts a block header only. Returns the status of the block after processing.
    pub fn validate_and_insert_header(&self, header: &Arc<Header>) -> BlockProcessResult<BlockStatus> {
        match self.storage.statuses_store.get(header.hash).optional()? {
            Some(StatusInvalid) => Err(RuleError::KnownInvalid.into()),
            Some(status) => Ok(status),
            None => {
                self.process_header(header, false)?;
                Ok(StatusHeaderOnly)
            }
        }
    }

    fn process_header(&self, header: &Arc<Header>, is_trusted: bool) -> BlockProcessResult<()> {
        let hash = header.hash;
        let mut sa = StagingArea::new(&self.storage);
        if let Err(err) = self.validate_header_up_to_pow(&mut sa, header, is_trusted) {
            drop(sa);
            return Err(self.handle_pre_pow_error(header, err)?);
        }

        match self.validate_header_in_context_and_commit(sa, hash, is_trusted) {
            Ok(()) => {
                debug!("header {} accepted with {} parents", hash, header.direct_parents().len());
                Ok(())
            }
            Err(err) => Err(self.handle_validation_error(hash, err)?),
        }
    }

    /// Header isolation and the proof of work stage. The header is not yet known to carry valid
    /// work, so failures here do not mark it invalid.
    fn validate_header_up_to_pow(&self, sa: &mut StagingArea, header: &Arc<Header>, is_trusted: bool) -> BlockProcessResult<()> {
        self.header_processor.validate_header_in_isolation(header)?;
        sa.headers.insert(header.clone())?;
        self.header_processor.validate_pruning_point_violation_and_pow_and_difficulty(sa, header.hash, is_trusted)
    }

    fn validate_header_in_context_and_commit(&self, mut sa: StagingArea, hash: Hash, is_trusted: bool) -> BlockProcessResult<()> {
        self.header_processor.validate_header_in_context(&mut sa, hash, is_trusted)?;
        sa.statuses.set(hash, StatusHeaderOnly)?;
        Ok(sa.commit()?)
    }

    /// An invalid ancestor is the only early rejection which is final. It is recorded once the
    /// header's own proof of work checks out, so descendants of this block are rejected too.
    fn handle_pre_pow_error(&self, header: &Header, err: ValidationError) -> BlockProcessResult<ValidationError> {
        if matches!(err.rule_error(), Some(RuleError::InvalidAncestorBlock(_))) && self.header_processor.check_pow(header).is_ok() {
            return self.handle_validation_error(header.hash, err);
        }
        debug!("header {} rejected: {}", header.hash, err);
        Ok(err)
    }

    fn process_body(&self, block: &Block) -> BlockProcessResult<BlockStatus> {
        match self.validate_and_commit_body(block) {
            Ok(()) => {
                info!("block {} accepted with {} transactions", block.hash(), block.transactions.len());
                Ok(StatusUTXOPendingVerification)
            }
            Err(e) => Err(self.handle_validation_error(block.hash(), e)?),
        }
    }

    fn validate_and_commit_body(&self, block: &Block) -> BlockProcessResult<()> {
        let hash = block.hash();
        let is_pruning_point = self.storage.pruning_point_store.pruning_point()? == hash;

        let mut sa = StagingArea::new(&self.storage);
        sa.block_transactions.insert(hash, block.transactions.clone())?;
        self.body_processor.validate_body_in_isolation(&sa, hash)?;
        self.body_processor.validate_body_in_context(&sa, hash, is_pruning_point)?;
        sa.statuses.set(hash, StatusUTXOPendingVerification)?;
        sa.tips.add_tip(hash, block.header.direct_parents());
        Ok(sa.commit()?)
    }

    /// Marks the block invalid on rule errors, except for errors which a later submission of the
    /// same block might resolve: missing parents may still arrive, a body not matching the merkle
    /// root says nothing about the header and a timestamp ahead of the local clock becomes valid
    /// with time. Returns the error for propagation.
    fn handle_validation_error(&self, hash: Hash, err: ValidationError) -> BlockProcessResult<ValidationError> {
        match err.rule_error() {
            Some(RuleError::MissingParents(_) | RuleError::BadMerkleRoot(_, _) | RuleError::TimeTooMuchInTheFuture(_, _)) => {
                debug!("block {} rejected for now: {}", hash, err);
            }
            Some(rule_error) => {
                info!("block {} is invalid: {}", hash, rule_error);
                let mut sa = StagingArea::new(&self.storage);
                sa.statuses.set(hash, StatusInvalid)?;
                sa.commit()?;
            }
            None => {}
        }
        Ok(err)
    }

    /// Inserts the genesis block and initializes the pruning point and the tips
    pub fn process_genesis(&self) -> BlockProcessResult<()> {
        let header = Arc::new(self.genesis.header());
        let hash = header.hash;
        if self.storage.statuses_store.has(hash)? {
            trace!("genesis {} is already known", hash);
            return Ok(());
        }

        let mut sa = StagingArea::new(&self.storage);
        sa.headers.insert(header)?;
        self.topology.set_parents(&mut sa, hash, Arc::new(Vec::new()))?;
        self.ghostdag_manager.ensure_ghostdag(&mut sa, hash)?;
        sa.depth.insert_merge_depth_root(hash, hash)?;
        sa.depth.insert_finality_point(hash, hash)?;
        sa.block_transactions.insert(hash, Arc::new(self.genesis.build_genesis_transactions()))?;
        sa.statuses.set(hash, StatusUTXOValid)?;
        sa.pruning.set_pruning_point(hash);
        sa.tips.add_tip(hash, &[]);
        sa.commit()?;

        info!("genesis {} initialized", hash);
        Ok(())
    }
}
