use kestrel_hashes::{HASH_SIZE, Hash};
use std::sync::Arc;

/// Shared, immutable list of block hashes as held by the relation stores
pub type BlockHashes = Arc<Vec<Hash>>;

/// Placeholder for "no block", e.g. an unset finality point in a test header
pub const NONE: Hash = Hash::from_bytes([0u8; HASH_SIZE]);

/// The virtual genesis sentinel. Every locally known block is considered to be in its future,
/// and it stands in for history below the pruning point or imported with trusted data.
pub const ORIGIN: Hash = Hash::from_bytes([0xfe; HASH_SIZE]);

pub trait BlockHashExtensions {
    fn is_none(&self) -> bool;
    fn is_origin(&self) -> bool;

    /// Whether this hash is one of the reserved sentinels rather than a real block
    fn is_sentinel(&self) -> bool {
        self.is_none() || self.is_origin()
    }
}

impl BlockHashExtensions for Hash {
    fn is_none(&self) -> bool {
        *self == NONE
    }

    fn is_origin(&self) -> bool {
        *self == ORIGIN
    }
}
