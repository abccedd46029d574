use std::collections::{HashMap, HashSet};

use super::BlockBodyProcessor;
use crate::{
    errors::BlockProcessResult,
    model::{
        staging::StagingArea,
        stores::{block_transactions::BlockTransactionsStoreReader, headers::HeaderStoreReader},
    },
};
use kestrel_consensus_core::{
    errors::block::RuleError,
    header::Header,
    merkle::calc_hash_merkle_root,
    size::{header_estimated_serialized_size, transaction_estimated_serialized_size},
    subnets::SubnetworkId,
    tx::{Transaction, TransactionOutpoint},
};
use kestrel_hashes::Hash;

impl BlockBodyProcessor {
    /// Structural checks over the transactions staged for `hash` and the merkle commitment of its header
    pub fn validate_body_in_isolation(&self, sa: &StagingArea, hash: Hash) -> BlockProcessResult<()> {
        let header = sa.headers.get_header(hash)?;
        let transactions = sa.block_transactions.get(hash)?;

        self.check_block_size(&header, &transactions)?;
        Self::check_has_transactions(&transactions)?;
        Self::check_only_one_coinbase(&transactions)?;
        self.check_coinbase_payload(&transactions)?;
        self.check_transactions_in_isolation(&transactions)?;
        Self::check_hash_merkle_root(&header, &transactions)?;
        Self::check_duplicate_transactions(&transactions)?;
        Self::check_block_double_spends(&transactions)?;
        Self::check_no_chained_transactions(&transactions)?;
        self.check_gas_limit(&transactions)
    }

    fn check_block_size(&self, header: &Header, transactions: &[Transaction]) -> BlockProcessResult<()> {
        accumulate_block_size(
            header_estimated_serialized_size(header),
            transactions.iter().map(transaction_estimated_serialized_size),
            self.max_block_size,
        )?;
        Ok(())
    }

    fn check_has_transactions(transactions: &[Transaction]) -> BlockProcessResult<()> {
        if transactions.is_empty() {
            return Err(RuleError::NoTransactions.into());
        }
        Ok(())
    }

    fn check_only_one_coinbase(transactions: &[Transaction]) -> BlockProcessResult<()> {
        if !transactions[0].is_coinbase() {
            return Err(RuleError::FirstTxNotCoinbase.into());
        }

        if let Some(i) = transactions[1..].iter().position(|tx| tx.is_coinbase()) {
            return Err(RuleError::MultipleCoinbases(i + 1).into());
        }

        Ok(())
    }

    fn check_coinbase_payload(&self, transactions: &[Transaction]) -> BlockProcessResult<()> {
        self.coinbase_manager.deserialize_coinbase_payload(&transactions[0].payload).map_err(RuleError::from)?;
        Ok(())
    }

    fn check_transactions_in_isolation(&self, transactions: &[Transaction]) -> BlockProcessResult<()> {
        for tx in transactions.iter() {
            if let Err(e) = self.transaction_validator.validate_tx_in_isolation(tx) {
                return Err(RuleError::TxInIsolationValidationFailed(tx.id(), e).into());
            }
        }
        Ok(())
    }

    fn check_hash_merkle_root(header: &Header, transactions: &[Transaction]) -> BlockProcessResult<()> {
        let calculated = calc_hash_merkle_root(transactions.iter());
        if calculated != header.hash_merkle_root {
            return Err(RuleError::BadMerkleRoot(header.hash_merkle_root, calculated).into());
        }
        Ok(())
    }

    fn check_duplicate_transactions(transactions: &[Transaction]) -> BlockProcessResult<()> {
        let mut ids = HashSet::new();
        for tx in transactions.iter() {
            if !ids.insert(tx.id()) {
                return Err(RuleError::DuplicateTransactions(tx.id()).into());
            }
        }

        Ok(())
    }

    fn check_block_double_spends(transactions: &[Transaction]) -> BlockProcessResult<()> {
        let mut spenders = HashMap::new();
        for tx in transactions.iter() {
            for input in tx.inputs.iter() {
                if let Some(first_spender) = spenders.insert(input.previous_outpoint, tx.id()) {
                    return Err(RuleError::DoubleSpendInSameBlock(input.previous_outpoint, tx.id(), first_spender).into());
                }
            }
        }
        Ok(())
    }

    fn check_no_chained_transactions(transactions: &[Transaction]) -> BlockProcessResult<()> {
        let mut block_created_outpoints = HashSet::new();
        for tx in transactions.iter() {
            let tx_id = tx.id();
            for index in 0..tx.outputs.len() {
                block_created_outpoints.insert(TransactionOutpoint::new(tx_id, index as u32));
            }
        }

        for input in transactions.iter().flat_map(|tx| &tx.inputs) {
            if block_created_outpoints.contains(&input.previous_outpoint) {
                return Err(RuleError::ChainedTransaction(input.previous_outpoint).into());
            }
        }
        Ok(())
    }

    fn check_gas_limit(&self, transactions: &[Transaction]) -> BlockProcessResult<()> {
        let mut gas_per_subnetwork: HashMap<SubnetworkId, u64> = HashMap::new();
        for tx in transactions.iter().filter(|tx| !tx.subnetwork_id.is_builtin_or_native()) {
            let gas = gas_per_subnetwork.entry(tx.subnetwork_id).or_default();
            match gas.checked_add(tx.gas) {
                Some(total) if total <= self.max_block_gas_per_subnetwork => *gas = total,
                _ => return Err(RuleError::InvalidGas(tx.subnetwork_id, self.max_block_gas_per_subnetwork).into()),
            }
        }
        Ok(())
    }
}

/// Sums the header size and transaction sizes, failing as soon as the running total exceeds
/// `max_block_size` or wraps around
fn accumulate_block_size(header_size: u64, tx_sizes: impl Iterator<Item = u64>, max_block_size: u64) -> Result<u64, RuleError> {
    let mut size = header_size;
    if size > max_block_size {
        return Err(RuleError::BlockSizeTooHigh(size, max_block_size));
    }
    for tx_size in tx_sizes {
        size = size.checked_add(tx_size).ok_or(RuleError::BlockSizeTooHigh(u64::MAX, max_block_size))?;
        if size > max_block_size {
            return Err(RuleError::BlockSizeTooHigh(size, max_block_size));
        }
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::test_consensus::TestConsensus;
    use kestrel_consensus_core::{
        block::MutableBlock,
        config::{ConfigBuilder, params::SIMNET_PARAMS},
        subnets::{SUBNETWORK_ID_COINBASE, SUBNETWORK_ID_NATIVE},
        tx::{ScriptPublicKey, TransactionInput, TransactionOutput},
    };
    use kestrel_core::assert_match;

    fn spend(outpoint: TransactionOutpoint, value: u64) -> Transaction {
        Transaction::new(
            0,
            vec![TransactionInput::new(outpoint, vec![], 0, 1)],
            vec![TransactionOutput::new(value, ScriptPublicKey::from_vec(0, vec![0x51]))],
            0,
            SUBNETWORK_ID_NATIVE,
            0,
            vec![],
        )
    }

    /// Stages the block and runs body isolation, fixing the merkle root unless asked not to
    fn validate(consensus: &TestConsensus, mut block: MutableBlock, fix_merkle_root: bool) -> Result<(), RuleError> {
        if fix_merkle_root {
            block.header.hash_merkle_root = calc_hash_merkle_root(block.transactions.iter());
            block.header.finalize();
        }
        let block = block.to_immutable();
        let storage = consensus.storage();
        let mut sa = StagingArea::new(&storage);
        sa.headers.insert(block.header.clone()).unwrap();
        sa.block_transactions.insert(block.hash(), block.transactions.clone()).unwrap();
        match consensus.body_processor().validate_body_in_isolation(&sa, block.hash()) {
            Ok(()) => Ok(()),
            Err(e) => Err(e.rule_error().cloned().expect("expected a rule error")),
        }
    }

    #[test]
    fn validate_body_in_isolation_test() {
        let config = ConfigBuilder::new(SIMNET_PARAMS).skip_proof_of_work().build();
        let consensus = TestConsensus::new(&config);
        let genesis_hash = config.genesis.hash();

        let outpoint = TransactionOutpoint::new(100.into(), 0);
        let template = consensus.build_block_with_parents_and_transactions(vec![genesis_hash], vec![spend(outpoint, 10)]);
        assert!(validate(&consensus, template.clone(), false).is_ok());

        let mut block = template.clone();
        block.transactions.clear();
        assert_match!(validate(&consensus, block, true), Err(RuleError::NoTransactions));

        let mut block = template.clone();
        block.transactions.remove(0);
        assert_match!(validate(&consensus, block, true), Err(RuleError::FirstTxNotCoinbase));

        let mut block = template.clone();
        let mut second_coinbase = block.transactions[0].clone();
        second_coinbase.payload.push(0);
        second_coinbase.finalize();
        block.transactions.push(second_coinbase);
        assert_match!(validate(&consensus, block, true), Err(RuleError::MultipleCoinbases(2)));

        let mut block = template.clone();
        block.transactions[0].payload.truncate(5);
        block.transactions[0].finalize();
        assert_match!(validate(&consensus, block, true), Err(RuleError::BadCoinbasePayload(_)));

        let mut block = template.clone();
        block.transactions[1].inputs.clear();
        block.transactions[1].finalize();
        assert_match!(validate(&consensus, block, true), Err(RuleError::TxInIsolationValidationFailed(_, _)));

        let mut block = template.clone();
        block.transactions[1].outputs[0].value += 1;
        block.transactions[1].finalize();
        assert_match!(validate(&consensus, block, false), Err(RuleError::BadMerkleRoot(_, _)));

        let mut block = template.clone();
        block.transactions.push(block.transactions[1].clone());
        assert_match!(validate(&consensus, block, true), Err(RuleError::DuplicateTransactions(_)));

        let mut block = template.clone();
        block.transactions.push(spend(outpoint, 20));
        let (first, second) = (block.transactions[1].id(), block.transactions[2].id());
        match validate(&consensus, block, true) {
            Err(RuleError::DoubleSpendInSameBlock(spent, spender, first_spender)) => {
                assert_eq!(spent, outpoint);
                assert_eq!(spender, second);
                assert_eq!(first_spender, first);
            }
            res => panic!("unexpected result {res:?}"),
        }

        let mut block = template.clone();
        let chained = spend(TransactionOutpoint::new(block.transactions[1].id(), 0), 5);
        block.transactions.push(chained);
        assert_match!(validate(&consensus, block, true), Err(RuleError::ChainedTransaction(_)));
    }

    #[test]
    fn test_gas_limit_per_subnetwork() {
        let config = ConfigBuilder::new(SIMNET_PARAMS)
            .skip_proof_of_work()
            .edit_consensus_params(|p| p.max_block_gas_per_subnetwork = 100)
            .build();
        let consensus = TestConsensus::new(&config);
        let subnetwork = SubnetworkId::from_byte(9);

        let gas_tx = |index: u32, gas: u64| {
            let mut tx = spend(TransactionOutpoint::new(200.into(), index), 1);
            tx.subnetwork_id = subnetwork;
            tx.gas = gas;
            tx.finalize();
            tx
        };

        let block =
            consensus.build_block_with_parents_and_transactions(vec![config.genesis.hash()], vec![gas_tx(0, 60), gas_tx(1, 40)]);
        assert!(validate(&consensus, block, true).is_ok());

        let block =
            consensus.build_block_with_parents_and_transactions(vec![config.genesis.hash()], vec![gas_tx(0, 60), gas_tx(1, 41)]);
        assert_match!(validate(&consensus, block, true), Err(RuleError::InvalidGas(s, 100)) if s == subnetwork);

        let block =
            consensus.build_block_with_parents_and_transactions(vec![config.genesis.hash()], vec![gas_tx(0, u64::MAX), gas_tx(1, 1)]);
        assert_match!(validate(&consensus, block, true), Err(RuleError::InvalidGas(_, _)));
    }

    #[test]
    fn test_block_size_boundary() {
        let config = ConfigBuilder::new(SIMNET_PARAMS).skip_proof_of_work().build();
        let consensus = TestConsensus::new(&config);
        let block = consensus.build_block_with_parents_and_transactions(vec![config.genesis.hash()], vec![]);
        let exact_size = header_estimated_serialized_size(&block.header)
            + block.transactions.iter().map(transaction_estimated_serialized_size).sum::<u64>();

        let config =
            ConfigBuilder::new(SIMNET_PARAMS).skip_proof_of_work().edit_consensus_params(|p| p.max_block_size = exact_size).build();
        let consensus = TestConsensus::new(&config);
        assert!(validate(&consensus, block.clone(), false).is_ok());

        let config = ConfigBuilder::new(SIMNET_PARAMS)
            .skip_proof_of_work()
            .edit_consensus_params(|p| p.max_block_size = exact_size - 1)
            .build();
        let consensus = TestConsensus::new(&config);
        assert_match!(validate(&consensus, block, false), Err(RuleError::BlockSizeTooHigh(size, _)) if size == exact_size);
    }

    #[test]
    fn test_block_size_accumulation_never_wraps() {
        assert_eq!(accumulate_block_size(100, [10, 20].into_iter(), 130).unwrap(), 130);
        assert_match!(accumulate_block_size(100, [10, 21].into_iter(), 130), Err(RuleError::BlockSizeTooHigh(131, 130)));
        assert_match!(accumulate_block_size(200, std::iter::empty(), 130), Err(RuleError::BlockSizeTooHigh(200, 130)));
        // A wrapped sum would look small
        assert_match!(
            accumulate_block_size(100, [u64::MAX - 50, 60].into_iter(), u64::MAX),
            Err(RuleError::BlockSizeTooHigh(u64::MAX, u64::MAX))
        );
    }
}
