pub mod block_transactions;
pub mod depth;
pub mod ghostdag;
pub mod headers;
pub mod pruning;
pub mod relations;
pub mod statuses;
pub mod tips;
pub mod utxo_set;
pub mod virtual_state;
