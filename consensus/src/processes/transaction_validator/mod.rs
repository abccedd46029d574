mod tx_validation_in_header_context;
mod tx_validation_in_isolation;
mod tx_validation_in_utxo_context;

pub use tx_validation_in_header_context::{LockTimeArg, LockTimeType};

/// Single transaction rules: structure in isolation, lock time finality against a header
/// context, and amounts/maturity against populated UTXO entries. Script semantics are not validated.
#[derive(Clone)]
pub struct TransactionValidator {
    max_tx_inputs: usize,
    max_tx_outputs: usize,
    max_signature_script_len: usize,
    max_script_public_key_len: usize,
    coinbase_maturity: u64,
}

impl TransactionValidator {
    pub fn new(
        max_tx_inputs: usize,
        max_tx_outputs: usize,
        max_signature_script_len: usize,
        max_script_public_key_len: usize,
        coinbase_maturity: u64,
    ) -> Self {
        Self { max_tx_inputs, max_tx_outputs, max_signature_script_len, max_script_public_key_len, coinbase_maturity }
    }
}
