use std::fmt::Display;

use crate::{
    config::constants,
    errors::{coinbase::CoinbaseError, tx::TxRuleError},
    subnets::SubnetworkId,
    tx::{Transaction, TransactionId, TransactionOutpoint},
};
use itertools::Itertools;
use kestrel_hashes::Hash;
use thiserror::Error;

/// A transaction rejected while building a block, along with the reason
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidTransaction {
    pub transaction: Transaction,
    pub error: RuleError,
}

impl InvalidTransaction {
    pub fn new(transaction: Transaction, error: RuleError) -> Self {
        Self { transaction, error }
    }
}

impl Display for InvalidTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}: {})", self.transaction.id(), self.error)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("wrong block version: got {0} but expected {expected}", expected = constants::BLOCK_VERSION)]
    WrongBlockVersion(u16),

    #[error("the block timestamp is too far into the future: block timestamp is {0} but maximum timestamp allowed is {1}")]
    TimeTooMuchInTheFuture(u64, u64),

    #[error("block has no parents")]
    NoParents,

    #[error("block has too many parents: got {0} when the limit is {1}")]
    TooManyParents(usize, usize),

    #[error("block parents are not ordered ascending by hash")]
    WrongParentsOrder,

    #[error("block has ORIGIN as one of its parents")]
    OriginParent,

    #[error("parents are missing: {0:?}")]
    MissingParents(Vec<Hash>),

    #[error("block has an invalid ancestor: {0}")]
    InvalidAncestorBlock(Hash),

    #[error("parent {0} is an ancestor of parent {1}")]
    InvalidParentsRelation(Hash, Hash),

    #[error("the pruning point is not in the past of any of the block's parents. Pruning point: {0}")]
    PruningViolation(Hash),

    #[error("block difficulty of {0} is negative or zero")]
    NegativeTarget(u32),

    #[error("block difficulty of {0} is too high")]
    TargetTooHigh(u32),

    #[error("block has invalid proof-of-work")]
    InvalidPoW,

    #[error("block difficulty of {0} is not the expected value of {1}")]
    UnexpectedDifficulty(u32, u32),

    #[error("block timestamp of {0} is not after expected {1}")]
    TimeTooOld(u64, u64),

    #[error("block merges {0} blocks > {1} merge set size limit")]
    ViolatingMergeLimit(u64, u64),

    #[error("block blue score of {0} is not the expected value of {1}")]
    UnexpectedHeaderBlueScore(u64, u64),

    #[error("block blue work of {0} is not the expected value of {1}")]
    UnexpectedHeaderBlueWork(u128, u128),

    #[error("block is known to be invalid")]
    KnownInvalid,

    #[error("block merges a block which is too deep below its merge depth root and is not in the past of a chain-compliant blue")]
    ViolatingBoundedMergeDepth,

    #[error("block estimated size {0} exceeds the maximum allowed size of {1}")]
    BlockSizeTooHigh(u64, u64),

    #[error("block has no transactions")]
    NoTransactions,

    #[error("block first transaction is not coinbase")]
    FirstTxNotCoinbase,

    #[error("block has second coinbase transaction at index {0}")]
    MultipleCoinbases(usize),

    #[error("bad coinbase payload: {0}")]
    BadCoinbasePayload(CoinbaseError),

    #[error("coinbase payload length is {0} which exceeds the maximum of {1}")]
    BadCoinbasePayloadLen(usize, usize),

    #[error("coinbase blue score of {0} is not the expected value of {1}")]
    BadCoinbasePayloadBlueScore(u64, u64),

    #[error("transaction in isolation validation failed for tx {0}: {1}")]
    TxInIsolationValidationFailed(TransactionId, TxRuleError),

    #[error("transaction in context validation failed for tx {0}: {1}")]
    TxInContextFailed(TransactionId, TxRuleError),

    #[error("block hash merkle root is invalid - block header indicates {0}, but calculated value is {1}")]
    BadMerkleRoot(Hash, Hash),

    #[error("block contains duplicate transactions: {0}")]
    DuplicateTransactions(TransactionId),

    #[error("block has a double spend of outpoint {0} by transaction {1} which was already spent by {2}")]
    DoubleSpendInSameBlock(TransactionOutpoint, TransactionId, TransactionId),

    #[error("outpoint {0} is created and spent in the same block")]
    ChainedTransaction(TransactionOutpoint),

    #[error("block transactions of subnetwork {0} consume more than the {1} gas allowed per subnetwork")]
    InvalidGas(SubnetworkId, u64),

    #[error("block is pruned: its header is in the past of a current tip")]
    PrunedBlock,

    #[error("transaction {0} is not finalized")]
    UnfinalizedTx(TransactionId),

    #[error("invalid transactions in new block template: [{}]", .0.iter().join(", "))]
    InvalidTransactionsInNewBlock(Vec<InvalidTransaction>),

    #[error("missing transaction outputs: [{}]", .0.iter().join(", "))]
    MissingTxOut(Vec<TransactionOutpoint>),
}

impl From<CoinbaseError> for RuleError {
    fn from(value: CoinbaseError) -> Self {
        RuleError::BadCoinbasePayload(value)
    }
}

pub type RuleResult<T> = std::result::Result<T, RuleError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subnets::SUBNETWORK_ID_NATIVE;

    #[test]
    fn test_structured_error_display() {
        let outpoint = TransactionOutpoint::new(Hash::from_u64_word(1), 3);
        let missing = RuleError::MissingTxOut(vec![outpoint]);
        assert!(missing.to_string().contains(&outpoint.to_string()));

        let tx = Transaction::new(0, vec![], vec![], 0, SUBNETWORK_ID_NATIVE, 0, vec![]);
        let invalid = RuleError::InvalidTransactionsInNewBlock(vec![InvalidTransaction::new(tx.clone(), missing)]);
        assert!(invalid.to_string().contains(&tx.id().to_string()));
    }

    #[test]
    fn test_wrong_version_display() {
        let err = RuleError::WrongBlockVersion(constants::BLOCK_VERSION + 1);
        assert_eq!(
            err.to_string(),
            format!("wrong block version: got {} but expected {}", constants::BLOCK_VERSION + 1, constants::BLOCK_VERSION)
        );
    }
}
