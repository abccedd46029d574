use kestrel_consensus_core::errors::block::RuleError;
use kestrel_database::prelude::StoreError;
use thiserror::Error;

/// The outcome of a failed pipeline stage. A `Rule` error means the block is invalid; the other
/// variants mean validation could not be completed and say nothing about the block.
#[derive(Error, Debug, Clone)]
pub enum ValidationError {
    #[error("{0}")]
    Rule(#[from] RuleError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("consensus data inconsistency: {0}")]
    Inconsistency(String),
}

impl ValidationError {
    pub fn is_rule_error(&self) -> bool {
        matches!(self, Self::Rule(_))
    }

    pub fn rule_error(&self) -> Option<&RuleError> {
        match self {
            Self::Rule(err) => Some(err),
            _ => None,
        }
    }
}

pub type BlockProcessResult<T> = std::result::Result<T, ValidationError>;
