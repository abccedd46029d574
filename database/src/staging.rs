use crate::{
    access::MemoryDbAccess,
    errors::{StoreError, StoreResult, StoreResultExt},
    item::MemoryDbItem,
    key::{DbKey, StoreKey},
};
use std::collections::{HashMap, HashSet};

/// A write overlay on top of a [`MemoryDbAccess`] bucket.
///
/// Reads see staged writes first and fall back to the committed bucket. Nothing reaches the
/// bucket until [`StagingDbAccess::commit`] is called; dropping the overlay discards it.
pub struct StagingDbAccess<'a, TKey, TData>
where
    TKey: StoreKey,
    TData: Clone + Send + Sync,
{
    store: &'a MemoryDbAccess<TKey, TData>,
    insertions: HashMap<TKey, TData>,
    deletions: HashSet<TKey>,
    append_only: bool,
}

impl<'a, TKey, TData> StagingDbAccess<'a, TKey, TData>
where
    TKey: StoreKey,
    TData: Clone + Send + Sync,
{
    pub fn new(store: &'a MemoryDbAccess<TKey, TData>) -> Self {
        Self { store, insertions: Default::default(), deletions: Default::default(), append_only: false }
    }

    /// An overlay over a write-once bucket: every key may be written at most once, ever
    pub fn append_only(store: &'a MemoryDbAccess<TKey, TData>) -> Self {
        Self { append_only: true, ..Self::new(store) }
    }

    pub fn has(&self, key: &TKey) -> bool {
        if self.deletions.contains(key) {
            return false;
        }
        self.insertions.contains_key(key) || self.store.has(key)
    }

    pub fn read(&self, key: &TKey) -> StoreResult<TData> {
        if self.deletions.contains(key) {
            return Err(StoreError::KeyNotFound(DbKey::new(self.store.prefix(), key)));
        }
        match self.insertions.get(key) {
            Some(data) => Ok(data.clone()),
            None => self.store.read(key),
        }
    }

    /// Stages a write. On an append-only overlay this fails if the key is already staged or committed.
    pub fn write(&mut self, key: TKey, data: TData) -> StoreResult<()> {
        if self.append_only && self.has(&key) {
            return Err(key.already_exists(self.store.prefix()));
        }
        self.deletions.remove(&key);
        self.insertions.insert(key, data);
        Ok(())
    }

    /// Stages a read-modify-write of `key` against the currently visible value
    pub fn update<F>(&mut self, key: TKey, op: F) -> StoreResult<TData>
    where
        F: FnOnce(Option<TData>) -> TData,
    {
        if self.append_only {
            return Err(StoreError::DataInconsistency(format!("update of write-once key {}", DbKey::new(self.store.prefix(), &key))));
        }
        let current = if self.deletions.contains(&key) {
            None
        } else {
            match self.insertions.get(&key) {
                Some(data) => Some(data.clone()),
                None => self.store.read(&key).optional()?,
            }
        };
        let data = op(current);
        self.deletions.remove(&key);
        self.insertions.insert(key, data.clone());
        Ok(data)
    }

    pub fn delete(&mut self, key: TKey) {
        self.insertions.remove(&key);
        self.deletions.insert(key);
    }

    pub fn is_empty(&self) -> bool {
        self.insertions.is_empty() && self.deletions.is_empty()
    }

    pub fn staged_keys(&self) -> impl Iterator<Item = &TKey> {
        self.insertions.keys()
    }

    /// Applies the overlay to the underlying bucket. Write-once keys are re-checked, since another
    /// overlay over the same bucket may have committed them meanwhile; in that case nothing is written.
    /// Verifies that committing would not overwrite write-once data which was committed meanwhile
    pub fn check_commit(&self) -> StoreResult<()> {
        if self.append_only {
            if let Some(key) = self.insertions.keys().find(|key| self.store.has(key)) {
                return Err(key.already_exists(self.store.prefix()));
            }
        }
        Ok(())
    }

    pub fn commit(self) -> StoreResult<()> {
        self.check_commit()?;
        self.store.write_many(self.insertions);
        self.store.delete_many(self.deletions);
        Ok(())
    }
}

/// A write overlay on top of a single-value [`MemoryDbItem`]
pub struct StagingDbItem<'a, T: Clone> {
    item: &'a MemoryDbItem<T>,
    // `Some(None)` stages a removal
    staged: Option<Option<T>>,
}

impl<'a, T: Clone> StagingDbItem<'a, T> {
    pub fn new(item: &'a MemoryDbItem<T>) -> Self {
        Self { item, staged: None }
    }

    pub fn read(&self) -> StoreResult<T> {
        match &self.staged {
            Some(Some(value)) => Ok(value.clone()),
            Some(None) => Err(StoreError::KeyNotFound(DbKey::prefix_only(self.item.key()))),
            None => self.item.read(),
        }
    }

    pub fn write(&mut self, value: T) {
        self.staged = Some(Some(value));
    }

    pub fn remove(&mut self) {
        self.staged = Some(None);
    }

    pub fn is_staged(&self) -> bool {
        self.staged.is_some()
    }

    pub fn commit(self) {
        match self.staged {
            Some(Some(value)) => self.item.write(value),
            Some(None) => self.item.remove(),
            None => {}
        }
    }
}
