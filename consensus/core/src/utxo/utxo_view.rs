use super::utxo_collection::UtxoCollection;
use crate::tx::*;

/// Read access to a UTXO set
pub trait UtxoView {
    fn get(&self, outpoint: &TransactionOutpoint) -> Option<UtxoEntry>;
}

impl UtxoView for UtxoCollection {
    fn get(&self, outpoint: &TransactionOutpoint) -> Option<UtxoEntry> {
        std::collections::HashMap::get(self, outpoint).cloned()
    }
}

/// Populates every input entry of `tx` from `view`, leaving entries for unknown outpoints empty
pub fn populate_from_view<V: UtxoView + ?Sized>(view: &V, tx: &mut MutableTransaction) {
    for (entry, input) in tx.entries.iter_mut().zip(tx.tx.inputs.iter()) {
        *entry = view.get(&input.previous_outpoint);
    }
}
