pub mod utxo_collection;
pub mod utxo_view;
