use std::sync::Arc;

use kestrel_consensus_core::{acceptance_data::AcceptanceData, ghostdag::GhostdagData};
use kestrel_database::prelude::{MemoryDbItem, StoreResult};
use kestrel_hashes::Hash;
use serde::{Deserialize, Serialize};

/// The state of the virtual block, i.e. the block merging all current DAG tips. Block templates are built on top of it.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VirtualState {
    pub parents: Vec<Hash>,
    pub ghostdag_data: GhostdagData,
    pub daa_score: u64,
    pub bits: u32,
    pub past_median_time: u64,
    pub mergeset_acceptance: AcceptanceData,
    /// Commitment to the UTXO set resulting from the virtual's acceptance of its mergeset
    pub multiset_hash: Hash,
}

impl VirtualState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        parents: Vec<Hash>,
        ghostdag_data: GhostdagData,
        daa_score: u64,
        bits: u32,
        past_median_time: u64,
        mergeset_acceptance: AcceptanceData,
        multiset_hash: Hash,
    ) -> Self {
        Self { parents, ghostdag_data, daa_score, bits, past_median_time, mergeset_acceptance, multiset_hash }
    }
}

/// Reader API for `VirtualStateStore`.
pub trait VirtualStateStoreReader {
    fn get(&self) -> StoreResult<Arc<VirtualState>>;
}

const STORE_PREFIX: &[u8] = b"virtual-state";

/// An in-memory implementation of the virtual state store. The state is resolved outside the
/// validation pipeline and set directly by its owner.
#[derive(Clone)]
pub struct DbVirtualStateStore {
    access: MemoryDbItem<Arc<VirtualState>>,
}

impl DbVirtualStateStore {
    pub fn new() -> Self {
        Self { access: MemoryDbItem::new(STORE_PREFIX) }
    }

    pub fn set(&self, state: Arc<VirtualState>) {
        self.access.write(state)
    }
}

impl Default for DbVirtualStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualStateStoreReader for DbVirtualStateStore {
    fn get(&self) -> StoreResult<Arc<VirtualState>> {
        self.access.read()
    }
}
