use crate::processes::{
    coinbase::CoinbaseManager, dag_topology::DagTopologyManager, transaction_validator::TransactionValidator, window::WindowManager,
};
use kestrel_consensus_core::config::params::Params;
use kestrel_hashes::Hash;

/// Validates block bodies, in isolation and against the DAG. Both entry points read the
/// header and the transactions staged under the block hash.
#[derive(Clone)]
pub struct BlockBodyProcessor {
    // Config
    pub(super) genesis_hash: Hash,
    pub(super) max_block_size: u64,
    pub(super) max_block_gas_per_subnetwork: u64,

    // Managers and services
    pub(super) topology: DagTopologyManager,
    pub(super) window_manager: WindowManager,
    pub(super) coinbase_manager: CoinbaseManager,
    pub(super) transaction_validator: TransactionValidator,
}

impl BlockBodyProcessor {
    pub fn new(
        params: &Params,
        genesis_hash: Hash,
        topology: DagTopologyManager,
        window_manager: WindowManager,
        coinbase_manager: CoinbaseManager,
        transaction_validator: TransactionValidator,
    ) -> Self {
        Self {
            genesis_hash,
            max_block_size: params.max_block_size,
            max_block_gas_per_subnetwork: params.max_block_gas_per_subnetwork,
            topology,
            window_manager,
            coinbase_manager,
            transaction_validator,
        }
    }
}
