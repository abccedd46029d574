use serde::{Deserialize, Serialize};

/// Validation status of a known block. A block missing from the status store is unknown.
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Debug)]
pub enum BlockStatus {
    /// Failed a consensus rule. Descendants are rejected as having an invalid ancestor.
    StatusInvalid,

    /// Fully validated, including against the UTXO state of its past.
    StatusUTXOValid,

    /// Header and body passed all stateless and DAG-context rules; UTXO verification is
    /// pending until the block is considered for the selected chain.
    StatusUTXOPendingVerification,

    /// Valid, but not eligible to be chosen as a selected parent.
    StatusDisqualifiedFromChain,

    /// Only the header was validated; the body is missing or was pruned.
    StatusHeaderOnly,
}

impl BlockStatus {
    pub fn has_block_header(self) -> bool {
        !self.is_invalid()
    }

    pub fn has_block_body(self) -> bool {
        matches!(self, Self::StatusUTXOValid | Self::StatusUTXOPendingVerification | Self::StatusDisqualifiedFromChain)
    }

    pub fn is_invalid(self) -> bool {
        self == Self::StatusInvalid
    }
}
