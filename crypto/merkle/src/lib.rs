use kestrel_hashes::{Hash, Hasher, MerkleBranchHash, ZERO_HASH};

/// Computes the root of a binary merkle tree over `hashes`.
///
/// Leaves are padded with zero hashes up to the next power of two. A single leaf is its own
/// root and an empty list yields [`ZERO_HASH`].
pub fn calc_merkle_root(hashes: impl ExactSizeIterator<Item = Hash>) -> Hash {
    calc_merkle_root_with_hasher::<MerkleBranchHash>(hashes)
}

pub fn merkle_hash(left: Hash, right: Hash) -> Hash {
    merkle_hash_with_hasher(left, right, MerkleBranchHash::new())
}

pub fn merkle_hash_with_hasher(left: Hash, right: Hash, mut hasher: impl Hasher) -> Hash {
    hasher.update(left).update(right);
    hasher.finalize()
}

pub fn calc_merkle_root_with_hasher<H: Hasher>(hashes: impl ExactSizeIterator<Item = Hash>) -> Hash {
    if hashes.len() == 0 {
        return ZERO_HASH;
    }
    let next_pot = hashes.len().next_power_of_two();
    let vec_len = 2 * next_pot - 1;

    let mut merkles = vec![None; vec_len];
    for (i, hash) in hashes.enumerate() {
        merkles[i] = Some(hash);
    }
    let mut offset = next_pot;
    for i in (0..vec_len - 1).step_by(2) {
        merkles[offset] = match (merkles[i], merkles[i + 1]) {
            (None, _) => None,
            (Some(left), right) => Some(merkle_hash_with_hasher(left, right.unwrap_or(ZERO_HASH), H::default())),
        };
        offset += 1
    }
    merkles.last().copied().flatten().unwrap_or(ZERO_HASH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_hashes::{HasherBase, TransactionHash};
    use std::iter;

    fn make_hash(data: &[u8]) -> Hash {
        let mut hasher = TransactionHash::new();
        hasher.update(data);
        hasher.finalize()
    }

    #[test]
    fn test_empty_and_single() {
        assert_eq!(calc_merkle_root(iter::empty()), ZERO_HASH);
        let entry = make_hash(b"single_entry");
        assert_eq!(calc_merkle_root(iter::once(entry)), entry);
    }

    #[test]
    fn test_three_entries() {
        // Level 0: h1, h2, h3, None
        // Level 1: hash(h1,h2), hash(h3,ZERO)
        let h1 = make_hash(b"h1");
        let h2 = make_hash(b"h2");
        let h3 = make_hash(b"h3");

        let expected = merkle_hash(merkle_hash(h1, h2), merkle_hash(h3, ZERO_HASH));
        assert_eq!(calc_merkle_root([h1, h2, h3].into_iter()), expected);
    }

    #[test]
    fn test_five_entries_pad_to_eight() {
        let h: Vec<Hash> = (0..5u8).map(|i| make_hash(&[i])).collect();
        let left = merkle_hash(merkle_hash(h[0], h[1]), merkle_hash(h[2], h[3]));
        // The right subtree only holds h4, the all-empty branch collapses to zero
        let right = merkle_hash(merkle_hash(h[4], ZERO_HASH), ZERO_HASH);
        assert_eq!(calc_merkle_root(h.into_iter()), merkle_hash(left, right));
    }

    #[test]
    fn test_order_matters() {
        let h1 = make_hash(b"h1");
        let h2 = make_hash(b"h2");
        assert_ne!(calc_merkle_root([h1, h2].into_iter()), calc_merkle_root([h2, h1].into_iter()));
    }
}
