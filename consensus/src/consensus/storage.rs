use crate::model::stores::{
    block_transactions::DbBlockTransactionsStore, depth::DbDepthStore, ghostdag::DbGhostdagStore, headers::DbHeadersStore,
    pruning::DbPruningStore, relations::DbRelationsStore, statuses::DbStatusesStore, tips::DbTipsStore,
    utxo_set::DbUtxoSetStore, virtual_state::DbVirtualStateStore,
};
use parking_lot::Mutex;
use std::sync::Arc;

/// All consensus stores. Block-scoped stores are written only through a
/// [`StagingArea`](crate::model::staging::StagingArea) commit.
pub struct ConsensusStorage {
    // Append-only stores
    pub headers_store: DbHeadersStore,
    pub relations_store: DbRelationsStore,
    pub ghostdag_store: DbGhostdagStore,
    pub block_transactions_store: DbBlockTransactionsStore,
    pub depth_store: DbDepthStore,

    // Mutable stores
    pub statuses_store: DbStatusesStore,
    pub pruning_point_store: DbPruningStore,
    pub body_tips_store: DbTipsStore,

    // Virtual stores, maintained outside the validation pipeline
    pub virtual_state_store: DbVirtualStateStore,
    pub utxo_set_store: DbUtxoSetStore,

    // Serializes staging area commits
    pub(crate) commit_lock: Mutex<()>,
}

impl ConsensusStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            headers_store: DbHeadersStore::new(),
            relations_store: DbRelationsStore::new(),
            ghostdag_store: DbGhostdagStore::new(),
            block_transactions_store: DbBlockTransactionsStore::new(),
            depth_store: DbDepthStore::new(),
            statuses_store: DbStatusesStore::new(),
            pruning_point_store: DbPruningStore::new(),
            body_tips_store: DbTipsStore::new(),
            virtual_state_store: DbVirtualStateStore::new(),
            utxo_set_store: DbUtxoSetStore::new(),
            commit_lock: Mutex::new(()),
        })
    }
}
