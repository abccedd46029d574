use kestrel_consensus_core::{
    config::constants::{MAX_SOMPI, SEQUENCE_LOCK_TIME_DISABLED, SEQUENCE_LOCK_TIME_MASK},
    errors::tx::{TxResult, TxRuleError},
    tx::PopulatedTransaction,
};

use super::TransactionValidator;

impl TransactionValidator {
    /// Validates a transaction whose inputs are populated with the UTXO entries they spend,
    /// from the point of view of a block with the given DAA score, and returns its fee
    pub fn validate_populated_transaction_and_get_fee(&self, tx: &PopulatedTransaction, pov_daa_score: u64) -> TxResult<u64> {
        self.check_transaction_coinbase_maturity(tx, pov_daa_score)?;
        let total_in = self.check_transaction_input_amounts(tx)?;
        let total_out = Self::check_transaction_output_values(tx, total_in)?;
        Self::check_sequence_lock(tx, pov_daa_score)?;
        Ok(total_in - total_out)
    }

    fn check_transaction_coinbase_maturity(&self, tx: &PopulatedTransaction, pov_daa_score: u64) -> TxResult<()> {
        if let Some((index, (input, entry))) = tx
            .populated_inputs()
            .enumerate()
            .find(|(_, (_, entry))| entry.is_coinbase && entry.block_daa_score + self.coinbase_maturity > pov_daa_score)
        {
            return Err(TxRuleError::ImmatureCoinbaseSpend(
                index,
                input.previous_outpoint,
                entry.block_daa_score,
                pov_daa_score,
                self.coinbase_maturity,
            ));
        }

        Ok(())
    }

    fn check_transaction_input_amounts(&self, tx: &PopulatedTransaction) -> TxResult<u64> {
        let mut total: u64 = 0;
        for (_, entry) in tx.populated_inputs() {
            total = total.checked_add(entry.amount).ok_or(TxRuleError::InputAmountOverflow)?;
            if total > MAX_SOMPI {
                return Err(TxRuleError::InputAmountTooHigh);
            }
        }

        Ok(total)
    }

    fn check_transaction_output_values(tx: &PopulatedTransaction, total_in: u64) -> TxResult<u64> {
        let mut total_out: u64 = 0;
        for output in tx.outputs() {
            total_out = total_out.checked_add(output.value).ok_or(TxRuleError::OutputsValueOverflow)?;
        }
        if total_in < total_out {
            return Err(TxRuleError::SpendTooHigh(total_out, total_in));
        }

        Ok(total_out)
    }

    fn check_sequence_lock(tx: &PopulatedTransaction, pov_daa_score: u64) -> TxResult<()> {
        // Given a sequence number, we apply the relative time lock mask in order to obtain the
        // DAA score delta required before this input can be spent
        if tx
            .populated_inputs()
            .filter(|(input, _)| input.sequence & SEQUENCE_LOCK_TIME_DISABLED != SEQUENCE_LOCK_TIME_DISABLED)
            .any(|(input, entry)| entry.block_daa_score.saturating_add(input.sequence & SEQUENCE_LOCK_TIME_MASK) > pov_daa_score)
        {
            return Err(TxRuleError::SequenceLockConditionsAreNotMet);
        }
        Ok(())
    }
}
