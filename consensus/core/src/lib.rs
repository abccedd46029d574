//!
//! Consensus data model shared by the validation pipeline and its callers: blocks, headers,
//! transactions, GHOSTDAG data, block statuses, network parameters and the rule error taxonomy.
//!

use std::collections::{HashMap, HashSet};

use kestrel_hashes::Hash;

pub mod acceptance_data;
pub mod block;
pub mod blockhash;
pub mod blockstatus;
pub mod coinbase;
pub mod config;
pub mod errors;
pub mod ghostdag;
pub mod hashing;
pub mod header;
pub mod merkle;
pub mod size;
pub mod subnets;
pub mod tx;
pub mod utxo;

pub type BlueWorkType = u128;

pub type BlockHashSet = HashSet<Hash>;
pub type BlockHashMap<V> = HashMap<Hash, V>;

/// GHOSTDAG K parameter type. Must be increased to u16 if K ever exceeds 255
pub type KType = u8;
