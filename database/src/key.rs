use kestrel_hashes::Hash;
use std::{
    fmt::{Debug, Display},
    str,
};

use crate::errors::StoreError;

pub const SEP: u8 = b'/';
pub const SEP_SIZE: usize = 1;

/// A fully qualified store key: a human readable bucket prefix followed by the raw key bytes
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DbKey {
    path: Vec<u8>,
    prefix_len: usize,
}

impl DbKey {
    pub fn new(prefix: &[u8], key: impl AsRef<[u8]>) -> Self {
        Self {
            path: prefix.iter().chain(std::iter::once(&SEP)).chain(key.as_ref().iter()).copied().collect(),
            prefix_len: prefix.len() + SEP_SIZE, // Include `SEP` as part of the prefix
        }
    }

    pub fn prefix_only(prefix: &[u8]) -> Self {
        Self::new(prefix, [0u8; 0])
    }

    pub fn prefix_len(&self) -> usize {
        self.prefix_len
    }
}

impl AsRef<[u8]> for DbKey {
    fn as_ref(&self) -> &[u8] {
        &self.path
    }
}

impl Display for DbKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (prefix, key) = self.path.split_at(self.prefix_len);
        // We expect the prefix to be human readable
        if let Ok(s) = str::from_utf8(prefix) {
            f.write_str(s)?;
        } else {
            f.write_str(&faster_hex::hex_string(&prefix[..prefix.len() - SEP_SIZE]))?; // Drop `SEP`
            f.write_str("/")?;
        }
        // Keys are usually more readable as hex
        f.write_str(&faster_hex::hex_string(key))
    }
}

impl Debug for DbKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self, f)
    }
}

/// Bounds required from a key of a typed store
pub trait StoreKey: Clone + Eq + std::hash::Hash + AsRef<[u8]> + Send + Sync {
    /// The error reported when an append-only store is asked to overwrite this key
    fn already_exists(&self, prefix: &[u8]) -> StoreError {
        StoreError::KeyAlreadyExists(DbKey::new(prefix, self).to_string())
    }
}

impl StoreKey for Hash {
    fn already_exists(&self, _prefix: &[u8]) -> StoreError {
        StoreError::HashAlreadyExists(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_display() {
        let key = DbKey::new(b"headers", [0xabu8, 0xcd]);
        assert_eq!(key.to_string(), "headers/abcd");
        assert_eq!(key.prefix_len(), 8);

        let key = DbKey::new(&[0xffu8, 0x01], [0x02u8]);
        assert_eq!(key.to_string(), "ff01/02");
    }

    #[test]
    fn test_hash_key_already_exists() {
        let hash = Hash::from_u64_word(5);
        assert!(matches!(hash.already_exists(b"ghostdag"), StoreError::HashAlreadyExists(h) if h == hash));
    }
}
