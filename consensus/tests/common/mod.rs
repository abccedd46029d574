use kestrel_consensus::errors::ValidationError;
use kestrel_consensus_core::{
    config::{Config, ConfigBuilder, params::SIMNET_PARAMS},
    errors::block::RuleError,
    subnets::SUBNETWORK_ID_NATIVE,
    tx::{ScriptPublicKey, Transaction, TransactionInput, TransactionOutpoint, TransactionOutput},
};

/// Simnet config with proof of work skipped and difficulty fixed at the genesis bits, so blue
/// work grows linearly with blue score
#[allow(dead_code)]
pub fn test_config() -> Config {
    kestrel_core::log::init_logger(None, "info,kestrel_consensus=debug");
    ConfigBuilder::new(SIMNET_PARAMS).skip_proof_of_work().edit_consensus_params(|p| p.min_difficulty_window_len = 100_000).build()
}

#[allow(dead_code)]
pub fn spend(outpoint: TransactionOutpoint, value: u64) -> Transaction {
    spend_with_lock_time(outpoint, value, 0)
}

#[allow(dead_code)]
pub fn spend_with_lock_time(outpoint: TransactionOutpoint, value: u64, lock_time: u64) -> Transaction {
    Transaction::new(
        0,
        vec![TransactionInput::new(outpoint, vec![0xab; 4], 0, 1)],
        vec![TransactionOutput::new(value, ScriptPublicKey::from_vec(0, vec![0x51]))],
        lock_time,
        SUBNETWORK_ID_NATIVE,
        0,
        vec![],
    )
}

/// Unwraps the rule error of a failed pipeline call, panicking on success or on infrastructure errors
#[allow(dead_code)]
pub fn rule_error<T: std::fmt::Debug>(res: Result<T, ValidationError>) -> RuleError {
    match res {
        Err(ValidationError::Rule(err)) => err,
        res => panic!("expected a rule error, got {res:?}"),
    }
}
