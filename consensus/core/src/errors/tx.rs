use crate::tx::TransactionOutpoint;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TxRuleError {
    #[error("transaction has no inputs")]
    NoTxInputs,

    #[error("transaction has {0} inputs where the max allowed is {1}")]
    TooManyInputs(usize, usize),

    #[error("transaction has {0} outputs where the max allowed is {1}")]
    TooManyOutputs(usize, usize),

    #[error("transaction input #{0} signature script is above {1} bytes")]
    TooBigSignatureScript(usize, usize),

    #[error("transaction output #{0} script public key is above {1} bytes")]
    TooBigScriptPublicKey(usize, usize),

    #[error("transaction has duplicate inputs")]
    TxDuplicateInputs,

    #[error("transaction of a built-in or native subnetwork has gas")]
    TxHasGas,

    #[error("non-coinbase transaction has a payload")]
    NonCoinbaseTxHasPayload,

    #[error("transaction version {0} is unknown")]
    UnknownTxVersion(u16),

    #[error("coinbase transaction has {0} inputs while none are expected")]
    CoinbaseHasInputs(usize),

    #[error("transaction output {0} has zero value")]
    TxOutZero(usize),

    #[error("transaction output {0} value is higher than the max allowed amount")]
    TxOutTooHigh(usize),

    #[error("transaction outputs value overflows")]
    OutputsValueOverflow,

    #[error("transaction total output value is higher than the max allowed amount")]
    TotalTxOutTooHigh,

    #[error("unfinalized transaction with lock time {0}")]
    NotFinalized(u64),

    #[error("one of the transaction sequence locks conditions was not met")]
    SequenceLockConditionsAreNotMet,

    #[error("tried to spend coinbase outpoint {1} of input #{0} with daa score of {2} while the merging block daa score is {3} and the coinbase maturity period of {4} hasn't passed yet")]
    ImmatureCoinbaseSpend(usize, TransactionOutpoint, u64, u64, u64),

    #[error("transaction total inputs spending amount overflowed u64")]
    InputAmountOverflow,

    #[error("transaction total inputs spending amount is higher than the max allowed of sompi")]
    InputAmountTooHigh,

    #[error("transaction output value {0} is higher than its input value {1}")]
    SpendTooHigh(u64, u64),

    #[error("transaction is missing UTXO entries for {} outpoints", .0.len())]
    MissingTxOutpoints(Vec<TransactionOutpoint>),
}

pub type TxResult<T> = std::result::Result<T, TxRuleError>;
