use super::VirtualStateProcessor;
use crate::{errors::BlockProcessResult, model::stores::virtual_state::VirtualState};
use kestrel_consensus_core::{errors::block::RuleError, tx::MutableTransaction, utxo::utxo_view::populate_from_view};
use kestrel_core::trace;

impl VirtualStateProcessor {
    /// Validates a block template transaction against the virtual UTXO set and returns its fee.
    ///
    /// Entries are populated afresh from the virtual UTXO set for the duration of the validation,
    /// after which the entries the caller held are restored.
    pub(super) fn validate_block_template_transaction(
        &self,
        mutable_tx: &mut MutableTransaction,
        virtual_state: &VirtualState,
    ) -> BlockProcessResult<u64> {
        let original_entries = std::mem::replace(&mut mutable_tx.entries, vec![None; mutable_tx.tx.inputs.len()]);
        populate_from_view(&self.storage.utxo_set_store, mutable_tx);
        let res = self.validate_populated_template_transaction(mutable_tx, virtual_state);
        mutable_tx.entries = original_entries;
        res
    }

    fn validate_populated_template_transaction(
        &self,
        mutable_tx: &MutableTransaction,
        virtual_state: &VirtualState,
    ) -> BlockProcessResult<u64> {
        let tx = &mutable_tx.tx;
        let Some(populated) = mutable_tx.as_populated() else {
            let missing: Vec<_> = mutable_tx.missing_outpoints().collect();
            trace!("block template transaction {} spends {} unknown outpoints", tx.id(), missing.len());
            return Err(RuleError::MissingTxOut(missing).into());
        };

        self.transaction_validator
            .validate_tx_in_header_context_with_args(tx, virtual_state.ghostdag_data.blue_score, virtual_state.past_median_time)
            .map_err(|e| RuleError::TxInContextFailed(tx.id(), e))?;

        let fee = self
            .transaction_validator
            .validate_populated_transaction_and_get_fee(&populated, virtual_state.daa_score)
            .map_err(|e| RuleError::TxInContextFailed(tx.id(), e))?;
        Ok(fee)
    }
}
