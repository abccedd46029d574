use kestrel_consensus_core::{
    tx::{TransactionIndexType, TransactionOutpoint, UtxoEntry},
    utxo::utxo_view::UtxoView,
};
use kestrel_database::prelude::{MemoryDbAccess, StoreKey, StoreResult};
use kestrel_hashes::HASH_SIZE;

pub const UTXO_KEY_SIZE: usize = HASH_SIZE + size_of::<TransactionIndexType>();

/// The store key of an outpoint: the transaction id followed by the little-endian output index
#[derive(Eq, Hash, PartialEq, Debug, Copy, Clone)]
pub struct UtxoKey([u8; UTXO_KEY_SIZE]);

impl AsRef<[u8]> for UtxoKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl StoreKey for UtxoKey {}

impl From<TransactionOutpoint> for UtxoKey {
    fn from(outpoint: TransactionOutpoint) -> Self {
        let mut bytes = [0; UTXO_KEY_SIZE];
        bytes[..HASH_SIZE].copy_from_slice(&outpoint.transaction_id.as_bytes());
        bytes[HASH_SIZE..].copy_from_slice(&outpoint.index.to_le_bytes());
        Self(bytes)
    }
}

/// Reader API for `UtxoSetStore`.
pub trait UtxoSetStoreReader {
    fn get(&self, outpoint: &TransactionOutpoint) -> StoreResult<UtxoEntry>;
}

const STORE_PREFIX: &[u8] = b"virtual-utxo-set";

/// An in-memory implementation of the virtual UTXO set
#[derive(Clone)]
pub struct DbUtxoSetStore {
    access: MemoryDbAccess<UtxoKey, UtxoEntry>,
}

impl DbUtxoSetStore {
    pub fn new() -> Self {
        Self { access: MemoryDbAccess::new(STORE_PREFIX) }
    }

    pub fn insert(&self, outpoint: TransactionOutpoint, entry: UtxoEntry) {
        self.access.write(outpoint.into(), entry)
    }

    pub fn write_many(&self, utxos: impl IntoIterator<Item = (TransactionOutpoint, UtxoEntry)>) {
        self.access.write_many(utxos.into_iter().map(|(outpoint, entry)| (outpoint.into(), entry)))
    }

    pub fn remove_many<'a>(&self, outpoints: impl IntoIterator<Item = &'a TransactionOutpoint>) {
        self.access.delete_many(outpoints.into_iter().map(|outpoint| UtxoKey::from(*outpoint)))
    }

    pub fn len(&self) -> usize {
        self.access.len()
    }

    pub fn is_empty(&self) -> bool {
        self.access.is_empty()
    }
}

impl Default for DbUtxoSetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UtxoSetStoreReader for DbUtxoSetStore {
    fn get(&self, outpoint: &TransactionOutpoint) -> StoreResult<UtxoEntry> {
        self.access.read(&UtxoKey::from(*outpoint))
    }
}

impl UtxoView for DbUtxoSetStore {
    fn get(&self, outpoint: &TransactionOutpoint) -> Option<UtxoEntry> {
        self.access.read(&UtxoKey::from(*outpoint)).ok()
    }
}
