use crate::{errors::StoreError, key::StoreKey};

use super::prelude::DbKey;
use parking_lot::RwLock;
use std::{collections::HashMap, sync::Arc};

/// A concurrent in-memory typed store bucket. Clones share the same underlying map.
#[derive(Clone)]
pub struct MemoryDbAccess<TKey, TData>
where
    TKey: StoreKey,
    TData: Clone + Send + Sync,
{
    map: Arc<RwLock<HashMap<TKey, TData>>>,

    // Bucket name, used for error reporting
    prefix: Vec<u8>,
}

impl<TKey, TData> MemoryDbAccess<TKey, TData>
where
    TKey: StoreKey,
    TData: Clone + Send + Sync,
{
    pub fn new(prefix: impl Into<Vec<u8>>) -> Self {
        Self { map: Default::default(), prefix: prefix.into() }
    }

    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    pub fn has(&self, key: &TKey) -> bool {
        self.map.read().contains_key(key)
    }

    pub fn read(&self, key: &TKey) -> Result<TData, StoreError> {
        self.map.read().get(key).cloned().ok_or_else(|| StoreError::KeyNotFound(DbKey::new(&self.prefix, key)))
    }

    pub fn write(&self, key: TKey, data: TData) {
        self.map.write().insert(key, data);
    }

    /// Writes `data` only if `key` is vacant, reporting the existing key otherwise
    pub fn write_new(&self, key: TKey, data: TData) -> Result<(), StoreError> {
        let mut map = self.map.write();
        if map.contains_key(&key) {
            return Err(key.already_exists(&self.prefix));
        }
        map.insert(key, data);
        Ok(())
    }

    pub fn write_many(&self, iter: impl IntoIterator<Item = (TKey, TData)>) {
        self.map.write().extend(iter);
    }

    pub fn delete(&self, key: &TKey) {
        self.map.write().remove(key);
    }

    pub fn delete_many(&self, keys: impl IntoIterator<Item = TKey>) {
        let mut map = self.map.write();
        for key in keys {
            map.remove(&key);
        }
    }

    /// Applies `op` to the current value of `key` (or `None`) under a single write lock
    pub fn update<F>(&self, key: TKey, op: F) -> TData
    where
        F: FnOnce(Option<TData>) -> TData,
    {
        let mut map = self.map.write();
        let data = op(map.get(&key).cloned());
        map.insert(key, data.clone());
        data
    }

    /// A point-in-time copy of the bucket content, in arbitrary order
    pub fn snapshot(&self) -> Vec<(TKey, TData)> {
        self.map.read().iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }
}
