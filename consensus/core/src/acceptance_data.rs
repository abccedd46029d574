use kestrel_hashes::Hash;
use serde::{Deserialize, Serialize};

use crate::tx::TransactionId;

/// Holds a mergeset acceptance data, a list of all its merged block with their transactions
pub type AcceptanceData = Vec<MergesetBlockAcceptanceData>;

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Holds a merged block with its transactions and whether each was accepted
pub struct MergesetBlockAcceptanceData {
    pub block_hash: Hash,
    pub accepted_transactions: Vec<TransactionAcceptanceData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionAcceptanceData {
    pub transaction_id: TransactionId,
    pub fee: u64,
    pub is_accepted: bool,
}

/// Flattens the acceptance data into the ids of all accepted transactions, sorted ascending.
/// Acceptance data iteration order is not canonical, so the sort is what makes commitments deterministic.
pub fn sorted_accepted_transaction_ids(acceptance_data: &AcceptanceData) -> Vec<TransactionId> {
    let mut ids = acceptance_data
        .iter()
        .flat_map(|block_data| block_data.accepted_transactions.iter())
        .filter(|tx_data| tx_data.is_accepted)
        .map(|tx_data| tx_data.transaction_id)
        .collect::<Vec<_>>();
    ids.sort();
    ids
}
