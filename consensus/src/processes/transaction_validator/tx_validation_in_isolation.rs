use kestrel_consensus_core::{
    config::constants::{MAX_SOMPI, TX_VERSION},
    errors::tx::{TxResult, TxRuleError},
    tx::Transaction,
};
use std::collections::HashSet;

use super::TransactionValidator;

impl TransactionValidator {
    pub fn validate_tx_in_isolation(&self, tx: &Transaction) -> TxResult<()> {
        self.check_transaction_inputs_in_isolation(tx)?;
        self.check_transaction_outputs_in_isolation(tx)?;
        self.check_coinbase_in_isolation(tx)?;

        check_transaction_output_value_ranges(tx)?;
        check_duplicate_transaction_inputs(tx)?;
        check_gas(tx)?;
        check_transaction_payload(tx)?;
        check_transaction_version(tx)
    }

    fn check_transaction_inputs_in_isolation(&self, tx: &Transaction) -> TxResult<()> {
        self.check_transaction_inputs_count(tx)?;
        self.check_transaction_signature_scripts(tx)
    }

    fn check_transaction_outputs_in_isolation(&self, tx: &Transaction) -> TxResult<()> {
        self.check_transaction_outputs_count(tx)?;
        self.check_transaction_script_public_keys(tx)
    }

    fn check_coinbase_in_isolation(&self, tx: &Transaction) -> TxResult<()> {
        if !tx.is_coinbase() {
            return Ok(());
        }
        if !tx.inputs.is_empty() {
            return Err(TxRuleError::CoinbaseHasInputs(tx.inputs.len()));
        }
        Ok(())
    }

    fn check_transaction_outputs_count(&self, tx: &Transaction) -> TxResult<()> {
        if tx.outputs.len() > self.max_tx_outputs {
            return Err(TxRuleError::TooManyOutputs(tx.outputs.len(), self.max_tx_outputs));
        }

        Ok(())
    }

    fn check_transaction_inputs_count(&self, tx: &Transaction) -> TxResult<()> {
        if !tx.is_coinbase() && tx.inputs.is_empty() {
            return Err(TxRuleError::NoTxInputs);
        }

        if tx.inputs.len() > self.max_tx_inputs {
            return Err(TxRuleError::TooManyInputs(tx.inputs.len(), self.max_tx_inputs));
        }

        Ok(())
    }

    fn check_transaction_signature_scripts(&self, tx: &Transaction) -> TxResult<()> {
        if let Some(i) = tx.inputs.iter().position(|input| input.signature_script.len() > self.max_signature_script_len) {
            return Err(TxRuleError::TooBigSignatureScript(i, self.max_signature_script_len));
        }

        Ok(())
    }

    fn check_transaction_script_public_keys(&self, tx: &Transaction) -> TxResult<()> {
        if let Some(i) =
            tx.outputs.iter().position(|output| output.script_public_key.script().len() > self.max_script_public_key_len)
        {
            return Err(TxRuleError::TooBigScriptPublicKey(i, self.max_script_public_key_len));
        }

        Ok(())
    }
}

fn check_transaction_output_value_ranges(tx: &Transaction) -> TxResult<()> {
    let mut total: u64 = 0;
    for (i, output) in tx.outputs.iter().enumerate() {
        if output.value == 0 {
            return Err(TxRuleError::TxOutZero(i));
        }

        if output.value > MAX_SOMPI {
            return Err(TxRuleError::TxOutTooHigh(i));
        }

        total = total.checked_add(output.value).ok_or(TxRuleError::OutputsValueOverflow)?;
        if total > MAX_SOMPI {
            return Err(TxRuleError::TotalTxOutTooHigh);
        }
    }

    Ok(())
}

fn check_duplicate_transaction_inputs(tx: &Transaction) -> TxResult<()> {
    let mut existing = HashSet::new();
    for input in &tx.inputs {
        if !existing.insert(input.previous_outpoint) {
            return Err(TxRuleError::TxDuplicateInputs);
        }
    }
    Ok(())
}

fn check_gas(tx: &Transaction) -> TxResult<()> {
    // Gas is only meaningful for transactions of non-native subnetworks
    if tx.subnetwork_id.is_builtin_or_native() && tx.gas > 0 {
        return Err(TxRuleError::TxHasGas);
    }
    Ok(())
}

fn check_transaction_payload(tx: &Transaction) -> TxResult<()> {
    if !tx.is_coinbase() && !tx.payload.is_empty() {
        return Err(TxRuleError::NonCoinbaseTxHasPayload);
    }
    Ok(())
}

fn check_transaction_version(tx: &Transaction) -> TxResult<()> {
    if tx.version != TX_VERSION {
        return Err(TxRuleError::UnknownTxVersion(tx.version));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_consensus_core::{
        config::params::MAINNET_PARAMS,
        subnets::{SUBNETWORK_ID_COINBASE, SUBNETWORK_ID_NATIVE, SubnetworkId},
        tx::{ScriptPublicKey, TransactionInput, TransactionOutpoint, TransactionOutput},
    };
    use kestrel_core::assert_match;

    fn validator() -> TransactionValidator {
        let params = &MAINNET_PARAMS;
        TransactionValidator::new(4, 4, 10, 10, params.coinbase_maturity)
    }

    fn valid_tx() -> Transaction {
        Transaction::new(
            TX_VERSION,
            vec![TransactionInput::new(TransactionOutpoint::new(1.into(), 0), vec![1, 2], 0, 1)],
            vec![TransactionOutput::new(10, ScriptPublicKey::new(0, vec![0x51]))],
            0,
            SUBNETWORK_ID_NATIVE,
            0,
            vec![],
        )
    }

    #[test]
    fn validate_tx_in_isolation_test() {
        let tv = validator();
        assert!(tv.validate_tx_in_isolation(&valid_tx()).is_ok());

        let mut tx = valid_tx();
        tx.inputs.clear();
        assert_match!(tv.validate_tx_in_isolation(&tx), Err(TxRuleError::NoTxInputs));

        let mut tx = valid_tx();
        tx.inputs = (0..5).map(|i| TransactionInput::new(TransactionOutpoint::new(1.into(), i), vec![], 0, 1)).collect();
        assert_match!(tv.validate_tx_in_isolation(&tx), Err(TxRuleError::TooManyInputs(5, 4)));

        let mut tx = valid_tx();
        tx.outputs = vec![tx.outputs[0].clone(); 5];
        assert_match!(tv.validate_tx_in_isolation(&tx), Err(TxRuleError::TooManyOutputs(5, 4)));

        let mut tx = valid_tx();
        tx.inputs[0].signature_script = vec![0; 11];
        assert_match!(tv.validate_tx_in_isolation(&tx), Err(TxRuleError::TooBigSignatureScript(0, 10)));

        let mut tx = valid_tx();
        tx.outputs[0].script_public_key = ScriptPublicKey::new(0, vec![0; 11]);
        assert_match!(tv.validate_tx_in_isolation(&tx), Err(TxRuleError::TooBigScriptPublicKey(0, 10)));

        let mut tx = valid_tx();
        tx.inputs.push(tx.inputs[0].clone());
        assert_match!(tv.validate_tx_in_isolation(&tx), Err(TxRuleError::TxDuplicateInputs));

        let mut tx = valid_tx();
        tx.outputs[0].value = 0;
        assert_match!(tv.validate_tx_in_isolation(&tx), Err(TxRuleError::TxOutZero(0)));

        let mut tx = valid_tx();
        tx.outputs[0].value = MAX_SOMPI + 1;
        assert_match!(tv.validate_tx_in_isolation(&tx), Err(TxRuleError::TxOutTooHigh(0)));

        let mut tx = valid_tx();
        tx.outputs = vec![TransactionOutput::new(MAX_SOMPI, ScriptPublicKey::default()); 2];
        assert_match!(tv.validate_tx_in_isolation(&tx), Err(TxRuleError::TotalTxOutTooHigh));

        let mut tx = valid_tx();
        tx.gas = 1;
        assert_match!(tv.validate_tx_in_isolation(&tx), Err(TxRuleError::TxHasGas));
        // Non-native subnetworks may carry gas
        tx.subnetwork_id = SubnetworkId::from_byte(7);
        assert!(tv.validate_tx_in_isolation(&tx).is_ok());

        let mut tx = valid_tx();
        tx.payload = vec![1];
        assert_match!(tv.validate_tx_in_isolation(&tx), Err(TxRuleError::NonCoinbaseTxHasPayload));

        let mut tx = valid_tx();
        tx.version = TX_VERSION + 1;
        assert_match!(tv.validate_tx_in_isolation(&tx), Err(TxRuleError::UnknownTxVersion(_)));

        let mut tx = valid_tx();
        tx.subnetwork_id = SUBNETWORK_ID_COINBASE;
        assert_match!(tv.validate_tx_in_isolation(&tx), Err(TxRuleError::CoinbaseHasInputs(1)));
        tx.inputs.clear();
        tx.payload = vec![0; 19];
        assert!(tv.validate_tx_in_isolation(&tx).is_ok());
    }
}
