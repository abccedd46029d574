//! Estimated serialized sizes for headers and transactions.
//!
//! The estimates have to be deterministic, but not necessarily accurate, since they
//! are only used for the block size limit.

use crate::{
    BlueWorkType,
    header::Header,
    subnets::SUBNETWORK_ID_SIZE,
    tx::{Transaction, TransactionInput, TransactionOutput},
};
use kestrel_hashes::HASH_SIZE;

pub fn header_estimated_serialized_size(header: &Header) -> u64 {
    let mut size: u64 = 0;
    size += 2; // Header version (u16)
    size += 8; // Number of parent levels (u64)
    for level in header.parents_by_level.iter() {
        size += 8; // Number of parents in level (u64)
        size += (level.len() * HASH_SIZE) as u64;
    }
    size += HASH_SIZE as u64; // Hash merkle root
    size += HASH_SIZE as u64; // Accepted ID merkle root
    size += HASH_SIZE as u64; // UTXO commitment
    size += 8; // Timestamp (u64)
    size += 4; // Bits (u32)
    size += 8; // Nonce (u64)
    size += 8; // DAA score (u64)
    size += 8; // Length of blue work (u64)
    size += blue_work_byte_len(header.blue_work);
    size += 8; // Blue score (u64)
    size += HASH_SIZE as u64; // Finality point
    size += HASH_SIZE as u64; // Pruning point
    size
}

fn blue_work_byte_len(work: BlueWorkType) -> u64 {
    let leading_zero_bytes = work.leading_zeros() / 8;
    (size_of::<BlueWorkType>() as u32 - leading_zero_bytes) as u64
}

pub fn transaction_estimated_serialized_size(tx: &Transaction) -> u64 {
    let mut size: u64 = 0;
    size += 2; // Tx version (u16)
    size += 8; // Number of inputs (u64)
    size += tx.inputs.iter().map(transaction_input_estimated_serialized_size).sum::<u64>();

    size += 8; // Number of outputs (u64)
    size += tx.outputs.iter().map(transaction_output_estimated_serialized_size).sum::<u64>();

    size += 8; // Lock time (u64)
    size += SUBNETWORK_ID_SIZE as u64;
    size += 8; // Gas (u64)
    size += HASH_SIZE as u64; // Payload hash

    size += 8; // Length of the payload (u64)
    size += tx.payload.len() as u64;
    size
}

fn transaction_input_estimated_serialized_size(input: &TransactionInput) -> u64 {
    let mut size: u64 = 0;
    size += HASH_SIZE as u64; // Previous tx ID
    size += 4; // Index (u32)

    size += 8; // Length of signature script (u64)
    size += input.signature_script.len() as u64;

    size += 8; // Sequence (u64)
    size += 1; // Sig op count (u8)
    size
}

fn transaction_output_estimated_serialized_size(output: &TransactionOutput) -> u64 {
    let mut size: u64 = 0;
    size += 8; // Value (u64)
    size += 2; // Script public key version (u16)
    size += 8; // Length of script public key (u64)
    size += output.script_public_key.script().len() as u64;
    size
}
