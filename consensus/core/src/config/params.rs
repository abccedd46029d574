use super::genesis::{DEVNET_GENESIS, GENESIS, GenesisBlock, SIMNET_GENESIS, TESTNET_GENESIS};
use crate::KType;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    Mainnet,
    Testnet,
    Simnet,
    Devnet,
}

impl Display for NetworkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            NetworkType::Mainnet => "mainnet",
            NetworkType::Testnet => "testnet",
            NetworkType::Simnet => "simnet",
            NetworkType::Devnet => "devnet",
        };
        f.write_str(name)
    }
}

/// Consensus parameters. Contains settings and configurations which are consensus-sensitive.
/// Changing one of these on a network node would exclude and prevent it from reaching consensus
/// with the other unmodified nodes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Params {
    pub net: NetworkType,
    pub genesis: GenesisBlock,
    pub ghostdag_k: KType,

    /// Maximum number of direct parents a block may have
    pub max_block_parents: u8,

    /// Maximum number of blocks a single block may merge
    pub mergeset_size_limit: u64,

    /// Depth (in blue score units) below which merged blocks must be covered by a chain-compliant blue
    pub merge_depth: u64,

    /// Depth (in blue score units) of the finality point below a block
    pub finality_depth: u64,

    /// Maximum estimated serialized size of a block (header plus transactions)
    pub max_block_size: u64,

    /// Highest allowed proof of work target, as compact bits
    pub pow_max: u32,

    /// Timestamp deviation tolerance (in blocks)
    pub timestamp_deviation_tolerance: u64,

    /// Target time per block (in milliseconds)
    pub target_time_per_block: u64,

    /// Size of the block window that is used to calculate the required difficulty of each block
    pub difficulty_window_size: usize,

    /// The minimum size a difficulty window must have to trigger a DAA calculation
    pub min_difficulty_window_len: usize,

    /// Size of the block window that is used to calculate the past median time of each block
    pub past_median_time_window_size: usize,

    pub coinbase_maturity: u64,
    pub base_subsidy: u64,
    pub coinbase_payload_script_public_key_max_len: u8,
    pub max_coinbase_payload_len: usize,

    pub max_tx_inputs: usize,
    pub max_tx_outputs: usize,
    pub max_signature_script_len: usize,
    pub max_script_public_key_len: usize,

    /// Maximum total gas transactions of a single non-native subnetwork may consume in one block
    pub max_block_gas_per_subnetwork: u64,

    pub skip_proof_of_work: bool,
}

impl Params {
    /// The maximal timestamp a block may carry given the current local time
    #[inline]
    #[must_use]
    pub fn max_allowed_timestamp(&self, now: u64) -> u64 {
        now + self.timestamp_deviation_tolerance * self.target_time_per_block
    }

    pub fn network_name(&self) -> String {
        self.net.to_string()
    }
}

impl From<NetworkType> for Params {
    fn from(value: NetworkType) -> Self {
        match value {
            NetworkType::Mainnet => MAINNET_PARAMS,
            NetworkType::Testnet => TESTNET_PARAMS,
            NetworkType::Simnet => SIMNET_PARAMS,
            NetworkType::Devnet => DEVNET_PARAMS,
        }
    }
}

pub const MAINNET_PARAMS: Params = Params {
    net: NetworkType::Mainnet,
    genesis: GENESIS,
    ghostdag_k: 18,
    max_block_parents: 10,
    mergeset_size_limit: 1000,
    merge_depth: 3600,
    finality_depth: 86_400,
    max_block_size: 1_000_000,
    pow_max: 0x1e7fffff,
    timestamp_deviation_tolerance: 132,
    target_time_per_block: 1000,
    difficulty_window_size: 2641,
    min_difficulty_window_len: 2,
    past_median_time_window_size: 263,
    coinbase_maturity: 100,
    base_subsidy: 50_000_000_000,
    coinbase_payload_script_public_key_max_len: 150,
    max_coinbase_payload_len: 204,
    max_tx_inputs: 1_000_000_000,
    max_tx_outputs: 1_000_000_000,
    max_signature_script_len: 1_000_000_000,
    max_script_public_key_len: 1_000_000_000,
    max_block_gas_per_subnetwork: 1_000_000,
    skip_proof_of_work: false,
};

pub const TESTNET_PARAMS: Params = Params {
    net: NetworkType::Testnet,
    genesis: TESTNET_GENESIS,
    ..MAINNET_PARAMS
};

pub const SIMNET_PARAMS: Params = Params {
    net: NetworkType::Simnet,
    genesis: SIMNET_GENESIS,
    pow_max: 0x207fffff,
    ..MAINNET_PARAMS
};

pub const DEVNET_PARAMS: Params = Params {
    net: NetworkType::Devnet,
    genesis: DEVNET_GENESIS,
    pow_max: 0x207fffff,
    ..MAINNET_PARAMS
};

pub const ALL_PARAMS: [Params; 4] = [MAINNET_PARAMS, TESTNET_PARAMS, SIMNET_PARAMS, DEVNET_PARAMS];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_serde_roundtrip() {
        for params in ALL_PARAMS.iter() {
            let json = serde_json::to_string(params).unwrap();
            let decoded: Params = serde_json::from_str(&json).unwrap();
            assert_eq!(&decoded, params);
            assert_eq!(decoded.genesis.hash(), params.genesis.hash());
        }
    }

    #[test]
    fn test_genesis_bits_within_pow_max() {
        for params in ALL_PARAMS.iter() {
            let target = kestrel_math::compact_to_big(params.genesis.bits);
            assert!(target <= kestrel_math::compact_to_big(params.pow_max), "{}", params.net);
        }
    }
}
