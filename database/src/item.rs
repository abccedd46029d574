use crate::errors::StoreError;

use super::prelude::DbKey;
use parking_lot::RwLock;
use std::sync::Arc;

/// A single-value in-memory store entry with concurrency support
#[derive(Clone)]
pub struct MemoryDbItem<T> {
    key: Vec<u8>,
    item: Arc<RwLock<Option<T>>>,
}

impl<T: Clone> MemoryDbItem<T> {
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self { key: key.into(), item: Arc::new(RwLock::new(None)) }
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn read(&self) -> Result<T, StoreError> {
        self.item.read().clone().ok_or_else(|| StoreError::KeyNotFound(DbKey::prefix_only(&self.key)))
    }

    pub fn write(&self, item: T) {
        *self.item.write() = Some(item);
    }

    pub fn remove(&self) {
        *self.item.write() = None;
    }

    pub fn update<F>(&self, op: F) -> Result<T, StoreError>
    where
        F: FnOnce(T) -> T,
    {
        let mut guard = self.item.write();
        let Some(item) = guard.take() else {
            return Err(StoreError::KeyNotFound(DbKey::prefix_only(&self.key)));
        };
        let item = op(item);
        *guard = Some(item.clone());
        Ok(item)
    }
}
