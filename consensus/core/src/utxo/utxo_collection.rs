use crate::tx::{TransactionOutpoint, UtxoEntry};
use std::collections::HashMap;

/// An owned set of unspent outputs keyed by outpoint, usable directly as a [`super::utxo_view::UtxoView`]
pub type UtxoCollection = HashMap<TransactionOutpoint, UtxoEntry>;
