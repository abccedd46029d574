use crate::{
    model::{staging::StagingArea, stores::relations::RelationsStoreReader},
    processes::{
        block_depth::BlockDepthManager, dag_topology::DagTopologyManager, ghostdag::protocol::GhostdagManager, window::WindowManager,
    },
};
use kestrel_consensus_core::{config::params::Params, header::Header};
use kestrel_database::prelude::StoreResult;
use kestrel_hashes::Hash;
use kestrel_math::{BigInt, compact_to_big};
use std::sync::Arc;

/// Validates block headers: in isolation, at header-first admission (parents, pruning
/// violation, proof of work and difficulty) and in the context of the DAG.
///
/// Context-dependent entry points read the header from the staging area and stage
/// everything they compute (relations, GHOSTDAG data, depth points) into it.
#[derive(Clone)]
pub struct HeaderProcessor {
    // Config
    pub(super) genesis_hash: Hash,
    pub(super) timestamp_deviation_tolerance: u64,
    pub(super) target_time_per_block: u64,
    pub(super) max_block_parents: u8,
    pub(super) mergeset_size_limit: u64,
    pub(super) skip_proof_of_work: bool,
    pub(super) pow_max: BigInt,

    // Managers and services
    pub(super) topology: DagTopologyManager,
    pub(super) ghostdag_manager: GhostdagManager,
    pub(super) window_manager: WindowManager,
    pub(super) depth_manager: BlockDepthManager,
}

impl HeaderProcessor {
    pub fn new(
        params: &Params,
        genesis_hash: Hash,
        topology: DagTopologyManager,
        ghostdag_manager: GhostdagManager,
        window_manager: WindowManager,
        depth_manager: BlockDepthManager,
    ) -> Self {
        Self {
            genesis_hash,
            timestamp_deviation_tolerance: params.timestamp_deviation_tolerance,
            target_time_per_block: params.target_time_per_block,
            max_block_parents: params.max_block_parents,
            mergeset_size_limit: params.mergeset_size_limit,
            skip_proof_of_work: params.skip_proof_of_work,
            pow_max: compact_to_big(params.pow_max),
            topology,
            ghostdag_manager,
            window_manager,
            depth_manager,
        }
    }

    pub fn genesis_hash(&self) -> Hash {
        self.genesis_hash
    }

    /// Registers the direct parents of the header in the DAG topology, unless already registered
    pub(super) fn ensure_parents(&self, sa: &mut StagingArea, header: &Header) -> StoreResult<()> {
        if sa.relations.has(header.hash)? {
            return Ok(());
        }
        self.topology.set_parents(sa, header.hash, Arc::new(header.direct_parents().to_vec()))
    }
}
