use crate::{hashing, tx::Transaction};
use kestrel_hashes::Hash;
use kestrel_merkle::calc_merkle_root;

/// Merkle root over the full transaction hashes, as committed to by `Header::hash_merkle_root`
pub fn calc_hash_merkle_root<'a>(txs: impl ExactSizeIterator<Item = &'a Transaction>) -> Hash {
    calc_merkle_root(txs.map(hashing::tx::hash))
}

/// Merkle root over accepted transaction ids. Callers must pass the ids sorted ascending.
pub fn calc_accepted_id_merkle_root(accepted_tx_ids: impl ExactSizeIterator<Item = Hash>) -> Hash {
    calc_merkle_root(accepted_tx_ids)
}
