use super::HasherExtensions;
use crate::header::Header;
use kestrel_hashes::{Hash, HasherBase};

/// Returns the header hash using the provided nonce+timestamp instead of those in the header.
#[inline]
pub fn hash_override_nonce_time(header: &Header, nonce: u64, timestamp: u64) -> Hash {
    let mut hasher = kestrel_hashes::BlockHash::new();
    hasher.update(header.version.to_le_bytes()).write_len(header.parents_by_level.len()); // Write the number of parent levels

    // Write parents at each level
    header.parents_by_level.iter().for_each(|level| {
        hasher.write_var_array(level);
    });

    // Write all header fields
    hasher
        .update(header.hash_merkle_root)
        .update(header.accepted_id_merkle_root)
        .update(header.utxo_commitment)
        .update(timestamp.to_le_bytes())
        .update(header.bits.to_le_bytes())
        .update(nonce.to_le_bytes())
        .update(header.daa_score.to_le_bytes())
        .update(header.blue_score.to_le_bytes())
        .write_blue_work(header.blue_work)
        .update(header.finality_point)
        .update(header.pruning_point);

    hasher.finalize()
}

/// Returns the header hash.
pub fn hash(header: &Header) -> Hash {
    hash_override_nonce_time(header, header.nonce, header.timestamp)
}

/// The hash the proof of work is mined over: the header hash with nonce and timestamp zeroed
pub fn pre_pow_hash(header: &Header) -> Hash {
    hash_override_nonce_time(header, 0, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BlueWorkType, blockhash};
    use kestrel_hashes::Hasher;

    #[test]
    fn test_header_hashing() {
        let mut header = Header::from_precomputed_hash(blockhash::NONE, vec![1.into()]);
        header.bits = 23;
        header.finalize();
        assert_ne!(blockhash::NONE, header.hash);

        let before = header.hash;
        header.nonce = 1;
        header.finalize();
        assert_ne!(before, header.hash);
        // Pre-pow hash ignores nonce and timestamp
        assert_eq!(pre_pow_hash(&header), hash_override_nonce_time(&header, 0, 0));
        header.timestamp = 99;
        let pre = pre_pow_hash(&header);
        header.nonce = 7;
        assert_eq!(pre, pre_pow_hash(&header));
    }

    #[test]
    fn test_hash_blue_work() {
        let tests: Vec<(BlueWorkType, Vec<u8>)> =
            vec![(0, vec![0, 0, 0, 0, 0, 0, 0, 0]), (123456, vec![3, 0, 0, 0, 0, 0, 0, 0, 1, 226, 64])];

        for test in tests {
            let mut hasher = kestrel_hashes::BlockHash::new();
            hasher.write_blue_work(test.0);

            let mut hasher2 = kestrel_hashes::BlockHash::new();
            hasher2.update(test.1);
            assert_eq!(Hasher::finalize(hasher), Hasher::finalize(hasher2))
        }
    }
}
