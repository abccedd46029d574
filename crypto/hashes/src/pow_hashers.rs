use crate::{Hash, Hasher, HasherBase, ProofOfWorkHash};

/// Proof-of-work hasher pre-seeded with everything but the nonce, so that
/// scanning nonces only pays for the final update.
#[derive(Clone)]
pub struct PowHash(ProofOfWorkHash);

impl PowHash {
    #[inline]
    pub fn new(pre_pow_hash: Hash, timestamp: u64) -> Self {
        let mut hasher = ProofOfWorkHash::new();
        hasher.update(pre_pow_hash).update(timestamp.to_le_bytes()).update([0u8; 32]);
        Self(hasher)
    }

    #[inline(always)]
    pub fn finalize_with_nonce(mut self, nonce: u64) -> Hash {
        self.0.update(nonce.to_le_bytes());
        Hasher::finalize(self.0)
    }
}
