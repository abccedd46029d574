use crate::{
    block::Block,
    header::Header,
    merkle::calc_hash_merkle_root,
    subnets::SUBNETWORK_ID_COINBASE,
    tx::Transaction,
};
use kestrel_hashes::{Hash, ZERO_HASH};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use super::constants::{BLOCK_VERSION, TX_VERSION};

/// The fields of a network's genesis block. The genesis hash is derived from them at runtime
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenesisBlock {
    pub version: u16,
    pub utxo_commitment: Hash,
    pub timestamp: u64,
    pub bits: u32,
    pub nonce: u64,
    pub daa_score: u64,
    pub coinbase_payload: Cow<'static, [u8]>,
}

impl GenesisBlock {
    pub fn build_genesis_transactions(&self) -> Vec<Transaction> {
        vec![Transaction::new(TX_VERSION, Vec::new(), Vec::new(), 0, SUBNETWORK_ID_COINBASE, 0, self.coinbase_payload.to_vec())]
    }

    pub fn header(&self) -> Header {
        let transactions = self.build_genesis_transactions();
        Header::new_finalized(
            self.version,
            Vec::new(),
            calc_hash_merkle_root(transactions.iter()),
            ZERO_HASH,
            self.utxo_commitment,
            self.timestamp,
            self.bits,
            self.nonce,
            self.daa_score,
            0,
            0,
            ZERO_HASH,
            ZERO_HASH,
        )
    }

    pub fn hash(&self) -> Hash {
        self.header().hash
    }

    pub fn to_block(&self) -> Block {
        Block::new(self.header(), self.build_genesis_transactions())
    }
}

/// Length of a coinbase payload prefix with zero blue score, zero subsidy and an empty script public key
const GENESIS_PAYLOAD_PREFIX_LEN: usize = 8 + 8 + 2 + 1;

/// Genesis coinbase payload: the zeroed prefix followed by the network tag as extra data
const fn genesis_payload<const N: usize>(tag: &[u8]) -> [u8; N] {
    assert!(N == GENESIS_PAYLOAD_PREFIX_LEN + tag.len());
    let mut payload = [0u8; N];
    let mut i = 0;
    while i < tag.len() {
        payload[GENESIS_PAYLOAD_PREFIX_LEN + i] = tag[i];
        i += 1;
    }
    payload
}

const MAINNET_COINBASE_PAYLOAD: [u8; 34] = genesis_payload(b"kestrel-mainnet");
const TESTNET_COINBASE_PAYLOAD: [u8; 34] = genesis_payload(b"kestrel-testnet");
const SIMNET_COINBASE_PAYLOAD: [u8; 33] = genesis_payload(b"kestrel-simnet");
const DEVNET_COINBASE_PAYLOAD: [u8; 33] = genesis_payload(b"kestrel-devnet");

pub const GENESIS: GenesisBlock = GenesisBlock {
    version: BLOCK_VERSION,
    utxo_commitment: ZERO_HASH,
    timestamp: 1_767_225_600_000,
    bits: 0x1e7fffff,
    nonce: 0x3392c,
    daa_score: 0,
    coinbase_payload: Cow::Borrowed(&MAINNET_COINBASE_PAYLOAD),
};

pub const TESTNET_GENESIS: GenesisBlock = GenesisBlock {
    version: BLOCK_VERSION,
    utxo_commitment: ZERO_HASH,
    timestamp: 1_767_225_600_000,
    bits: 0x1e7fffff,
    nonce: 0x14582,
    daa_score: 0,
    coinbase_payload: Cow::Borrowed(&TESTNET_COINBASE_PAYLOAD),
};

pub const SIMNET_GENESIS: GenesisBlock = GenesisBlock {
    version: BLOCK_VERSION,
    utxo_commitment: ZERO_HASH,
    timestamp: 1_767_225_600_000,
    bits: 0x207fffff,
    nonce: 0x2,
    daa_score: 0,
    coinbase_payload: Cow::Borrowed(&SIMNET_COINBASE_PAYLOAD),
};

pub const DEVNET_GENESIS: GenesisBlock = GenesisBlock {
    version: BLOCK_VERSION,
    utxo_commitment: ZERO_HASH,
    timestamp: 1_767_225_600_000,
    bits: 0x207fffff,
    nonce: 0,
    daa_score: 0,
    coinbase_payload: Cow::Borrowed(&DEVNET_COINBASE_PAYLOAD),
};
