use std::sync::Arc;

use kestrel_consensus_core::header::Header;
use kestrel_database::prelude::{MemoryDbAccess, StagingDbAccess, StoreResult};
use kestrel_hashes::Hash;

/// Reader API for `HeadersStore`.
pub trait HeaderStoreReader {
    fn get_header(&self, hash: Hash) -> StoreResult<Arc<Header>>;
    fn has(&self, hash: Hash) -> StoreResult<bool>;

    fn get_bits(&self, hash: Hash) -> StoreResult<u32> {
        Ok(self.get_header(hash)?.bits)
    }

    fn get_timestamp(&self, hash: Hash) -> StoreResult<u64> {
        Ok(self.get_header(hash)?.timestamp)
    }

    fn get_daa_score(&self, hash: Hash) -> StoreResult<u64> {
        Ok(self.get_header(hash)?.daa_score)
    }
}

const STORE_PREFIX: &[u8] = b"headers";

/// An in-memory implementation of the headers store, with concurrent readers support.
#[derive(Clone)]
pub struct DbHeadersStore {
    access: MemoryDbAccess<Hash, Arc<Header>>,
}

impl DbHeadersStore {
    pub fn new() -> Self {
        Self { access: MemoryDbAccess::new(STORE_PREFIX) }
    }
}

impl Default for DbHeadersStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaderStoreReader for DbHeadersStore {
    fn get_header(&self, hash: Hash) -> StoreResult<Arc<Header>> {
        self.access.read(&hash)
    }

    fn has(&self, hash: Hash) -> StoreResult<bool> {
        Ok(self.access.has(&hash))
    }
}

/// Headers staged during a single validation attempt. Headers are append-only.
pub struct StagingHeadersStore<'a> {
    access: StagingDbAccess<'a, Hash, Arc<Header>>,
}

impl<'a> StagingHeadersStore<'a> {
    pub fn new(store: &'a DbHeadersStore) -> Self {
        Self { access: StagingDbAccess::append_only(&store.access) }
    }

    pub fn insert(&mut self, header: Arc<Header>) -> StoreResult<()> {
        self.access.write(header.hash, header)
    }

    pub fn check_commit(&self) -> StoreResult<()> {
        self.access.check_commit()
    }

    pub fn commit(self) -> StoreResult<()> {
        self.access.commit()
    }
}

impl HeaderStoreReader for StagingHeadersStore<'_> {
    fn get_header(&self, hash: Hash) -> StoreResult<Arc<Header>> {
        self.access.read(&hash)
    }

    fn has(&self, hash: Hash) -> StoreResult<bool> {
        Ok(self.access.has(&hash))
    }
}
