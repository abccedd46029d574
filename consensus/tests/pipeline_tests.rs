use kestrel_consensus::{consensus::test_consensus::TestConsensus, model::stores::statuses::StatusesStoreReader};
use kestrel_consensus_core::{
    blockstatus::BlockStatus,
    coinbase::MinerData,
    errors::{block::RuleError, tx::TxRuleError},
    merkle::calc_hash_merkle_root,
    tx::{MutableTransaction, ScriptPublicKey, TransactionOutpoint, UtxoEntry},
};
use kestrel_core::{assert_match, time::unix_now};
use kestrel_hashes::Hash;

mod common;
use common::{rule_error, spend, spend_with_lock_time, test_config};

#[test]
fn test_genesis_is_valid() {
    let config = test_config();
    let consensus = TestConsensus::new(&config);
    let genesis = config.genesis.header();

    assert!(genesis.direct_parents().is_empty());
    assert!(consensus.header_processor().validate_header_in_isolation(&genesis).is_ok());
    assert_eq!(consensus.storage().statuses_store.get(genesis.hash).unwrap(), BlockStatus::StatusUTXOValid);
    // Resubmitting genesis is a no-op
    assert_eq!(consensus.validate_and_insert_block(&config.genesis.to_block()).unwrap(), BlockStatus::StatusUTXOValid);
}

#[test]
fn test_too_many_parents() {
    let config = test_config();
    let consensus = TestConsensus::new(&config);
    let genesis_hash = config.genesis.hash();

    let parents: Vec<Hash> = (0..11).map(|_| consensus.add_block_with_parents(vec![genesis_hash]).unwrap()).collect();
    let block = consensus.build_block_with_parents(parents).to_immutable();
    assert_match!(rule_error(consensus.validate_and_insert_block(&block)), RuleError::TooManyParents(11, 10));

    // Isolation failures precede the proof of work check and are not recorded
    assert!(!consensus.storage().statuses_store.has(block.hash()).unwrap());
    assert_match!(rule_error(consensus.validate_and_insert_block(&block)), RuleError::TooManyParents(11, 10));
}

#[test]
fn test_future_timestamp_is_not_marked_invalid() {
    let config = test_config();
    let consensus = TestConsensus::new(&config);

    let mut block = consensus.build_block_with_parents(vec![config.genesis.hash()]);
    block.header.timestamp = config.max_allowed_timestamp(unix_now()) + 60_000;
    block.header.finalize();
    let block = block.to_immutable();

    assert_match!(rule_error(consensus.validate_and_insert_block(&block)), RuleError::TimeTooMuchInTheFuture(_, _));
    assert!(!consensus.storage().statuses_store.has(block.hash()).unwrap());
    // Not known invalid, the block may become acceptable once the local clock catches up
    assert_match!(rule_error(consensus.validate_and_insert_block(&block)), RuleError::TimeTooMuchInTheFuture(_, _));
}

#[test]
fn test_missing_parent_headers() {
    let config = test_config();
    let consensus = TestConsensus::new(&config);

    let unknown = Hash::from_u64_word(999);
    let mut block = consensus.build_block_with_parents(vec![config.genesis.hash()]);
    block.header.parents_by_level = vec![vec![unknown]];
    block.header.finalize();
    let block = block.to_immutable();

    assert_match!(
        rule_error(consensus.validate_and_insert_block(&block)),
        RuleError::MissingParents(missing) if missing == vec![unknown]
    );
    assert!(!consensus.storage().statuses_store.has(block.hash()).unwrap());
}

#[test]
fn test_pruning_violation() {
    let config = test_config();
    let consensus = TestConsensus::new(&config);
    let genesis_hash = config.genesis.hash();

    let a = consensus.add_block_with_parents(vec![genesis_hash]).unwrap();
    let b = consensus.add_block_with_parents(vec![a]).unwrap();
    let side = consensus.add_block_with_parents(vec![genesis_hash]).unwrap();
    consensus.storage().pruning_point_store.set_pruning_point(b);

    assert_match!(rule_error(consensus.add_block_with_parents(vec![side])), RuleError::PruningViolation(pp) if pp == b);
    assert!(consensus.add_block_with_parents(vec![b]).is_ok());
}

#[test]
fn test_unexpected_difficulty() {
    let config = test_config();
    let consensus = TestConsensus::new(&config);

    let mut block = consensus.build_block_with_parents(vec![config.genesis.hash()]);
    let expected_bits = block.header.bits;
    block.header.bits -= 1;
    block.header.finalize();
    let block = block.to_immutable();

    assert_match!(
        rule_error(consensus.validate_and_insert_block(&block)),
        RuleError::UnexpectedDifficulty(bits, expected) if bits == expected_bits - 1 && expected == expected_bits
    );
}

#[test]
fn test_time_too_old_is_marked_invalid() {
    let config = test_config();
    let consensus = TestConsensus::new(&config);

    let a = consensus.add_block_with_parents(vec![config.genesis.hash()]).unwrap();
    // Built headers carry the past median time plus one
    let mut block = consensus.build_block_with_parents(vec![a]);
    let past_median_time = block.header.timestamp - 1;
    block.header.timestamp = past_median_time - 1;
    block.header.finalize();
    let block = block.to_immutable();

    assert_match!(
        rule_error(consensus.validate_and_insert_block(&block)),
        RuleError::TimeTooOld(ts, pmt) if ts == past_median_time - 1 && pmt == past_median_time
    );
    // Context failures come after the proof of work check and are final
    assert_eq!(consensus.storage().statuses_store.get(block.hash()).unwrap(), BlockStatus::StatusInvalid);
    assert_match!(rule_error(consensus.validate_and_insert_block(&block)), RuleError::KnownInvalid);
}

#[test]
fn test_merge_set_size_limit() {
    let mut config = test_config();
    config.params.mergeset_size_limit = 3;
    let consensus = TestConsensus::new(&config);
    let genesis_hash = config.genesis.hash();

    let siblings: Vec<Hash> = (0..5).map(|_| consensus.add_block_with_parents(vec![genesis_hash]).unwrap()).collect();
    assert!(consensus.add_block_with_parents(siblings[..3].to_vec()).is_ok());
    assert_match!(rule_error(consensus.add_block_with_parents(siblings)), RuleError::ViolatingMergeLimit(5, 3));
}

#[test]
fn test_unexpected_header_blue_score_and_work() {
    let config = test_config();
    let consensus = TestConsensus::new(&config);
    let genesis_hash = config.genesis.hash();

    let mut block = consensus.build_block_with_parents(vec![genesis_hash]);
    block.header.blue_score += 1;
    block.header.finalize();
    assert_match!(rule_error(consensus.validate_and_insert_block(&block.to_immutable())), RuleError::UnexpectedHeaderBlueScore(2, 1));

    let mut block = consensus.build_block_with_parents(vec![genesis_hash]);
    let blue_work = block.header.blue_work;
    block.header.blue_work += 1;
    block.header.finalize();
    assert_match!(
        rule_error(consensus.validate_and_insert_block(&block.to_immutable())),
        RuleError::UnexpectedHeaderBlueWork(got, expected) if got == blue_work + 1 && expected == blue_work
    );
}

#[test]
fn test_coinbase_blue_score_mismatch() {
    let config = test_config();
    let consensus = TestConsensus::new(&config);

    let mut block = consensus.build_block_with_parents(vec![config.genesis.hash()]);
    assert_eq!(block.header.blue_score, 1);
    // The payload starts with the little endian blue score
    block.transactions[0].payload[..8].copy_from_slice(&5u64.to_le_bytes());
    block.transactions[0].finalize();
    block.header.hash_merkle_root = calc_hash_merkle_root(block.transactions.iter());
    block.header.finalize();
    let block = block.to_immutable();

    assert_match!(rule_error(consensus.validate_and_insert_block(&block)), RuleError::BadCoinbasePayloadBlueScore(5, 1));
    assert_eq!(consensus.storage().statuses_store.get(block.hash()).unwrap(), BlockStatus::StatusInvalid);
}

#[test]
fn test_body_of_pruned_block() {
    let config = test_config();
    let consensus = TestConsensus::new(&config);

    // Two header-only blocks, the second becoming the pruning point
    let pruned = consensus.build_block_with_parents(vec![config.genesis.hash()]).to_immutable();
    consensus.consensus().validate_and_insert_header(&pruned.header).unwrap();
    let pruning_point = consensus.add_header_only_block_with_parents(vec![pruned.hash()]).unwrap();
    consensus.storage().pruning_point_store.set_pruning_point(pruning_point);

    // A full block over the pruning point needs no bodies below it
    let tip = consensus.add_block_with_parents(vec![pruning_point]).unwrap();
    assert_eq!(consensus.storage().statuses_store.get(tip).unwrap(), BlockStatus::StatusUTXOPendingVerification);

    assert_match!(rule_error(consensus.validate_and_insert_block(&pruned)), RuleError::PrunedBlock);
}

#[test]
fn test_parents_with_ancestry_relation() {
    let config = test_config();
    let consensus = TestConsensus::new(&config);

    let a = consensus.add_block_with_parents(vec![config.genesis.hash()]).unwrap();
    let b = consensus.add_block_with_parents(vec![a]).unwrap();
    let block = consensus.build_block_with_parents(vec![a, b]).to_immutable();
    assert_match!(
        rule_error(consensus.validate_and_insert_block(&block)),
        RuleError::InvalidParentsRelation(x, y) if (x == a && y == b) || (x == b && y == a)
    );
}

#[test]
fn test_block_without_coinbase() {
    let config = test_config();
    let consensus = TestConsensus::new(&config);

    let tx = spend(TransactionOutpoint::new(7.into(), 0), 10);
    let mut block = consensus.build_block_with_parents_and_transactions(vec![config.genesis.hash()], vec![tx]);
    block.transactions.remove(0);
    block.header.hash_merkle_root = calc_hash_merkle_root(block.transactions.iter());
    block.header.finalize();
    let block = block.to_immutable();

    assert_match!(rule_error(consensus.validate_and_insert_block(&block)), RuleError::FirstTxNotCoinbase);
    assert_eq!(consensus.storage().statuses_store.get(block.hash()).unwrap(), BlockStatus::StatusInvalid);
}

#[test]
fn test_double_spend_in_same_block() {
    let config = test_config();
    let consensus = TestConsensus::new(&config);

    let outpoint = TransactionOutpoint::new(7.into(), 0);
    let block = consensus
        .build_block_with_parents_and_transactions(vec![config.genesis.hash()], vec![spend(outpoint, 10), spend(outpoint, 20)])
        .to_immutable();
    assert_match!(
        rule_error(consensus.validate_and_insert_block(&block)),
        RuleError::DoubleSpendInSameBlock(spent, _, _) if spent == outpoint
    );
}

#[test]
fn test_invalid_ancestor_propagation() {
    let config = test_config();
    let consensus = TestConsensus::new(&config);

    let outpoint = TransactionOutpoint::new(7.into(), 0);
    let invalid = consensus
        .build_block_with_parents_and_transactions(vec![config.genesis.hash()], vec![spend(outpoint, 10), spend(outpoint, 20)])
        .to_immutable();
    assert!(consensus.validate_and_insert_block(&invalid).is_err());

    // The header of the invalid block was committed before its body failed, so a child can be built over it
    let child = consensus.build_block_with_parents(vec![invalid.hash()]).to_immutable();
    assert_match!(rule_error(consensus.validate_and_insert_block(&child)), RuleError::InvalidAncestorBlock(h) if h == invalid.hash());
    assert_match!(rule_error(consensus.validate_and_insert_block(&child)), RuleError::KnownInvalid);
}

#[test]
fn test_invalid_ancestor_after_header_first_sync() {
    let config = test_config();
    let consensus = TestConsensus::new(&config);

    let outpoint = TransactionOutpoint::new(7.into(), 0);
    let parent = consensus
        .build_block_with_parents_and_transactions(vec![config.genesis.hash()], vec![spend(outpoint, 10), spend(outpoint, 20)])
        .to_immutable();
    let child = consensus.build_block_with_parents(vec![parent.hash()]).to_immutable();
    consensus.consensus().validate_and_insert_header(&parent.header).unwrap();
    consensus.consensus().validate_and_insert_header(&child.header).unwrap();

    // The parent body turns out invalid after both headers were accepted
    assert_match!(rule_error(consensus.validate_and_insert_block(&parent)), RuleError::DoubleSpendInSameBlock(_, _, _));
    assert_match!(rule_error(consensus.validate_and_insert_block(&child)), RuleError::InvalidAncestorBlock(h) if h == parent.hash());
    assert_eq!(consensus.storage().statuses_store.get(child.hash()).unwrap(), BlockStatus::StatusInvalid);
}

#[test]
fn test_bad_merkle_root_is_not_marked_invalid() {
    let config = test_config();
    let consensus = TestConsensus::new(&config);

    let tx = spend(TransactionOutpoint::new(7.into(), 0), 10);
    let block = consensus.build_block_with_parents_and_transactions(vec![config.genesis.hash()], vec![tx]);
    let mut mutated = block.clone();
    mutated.transactions[1].outputs[0].value += 1;
    mutated.transactions[1].finalize();

    let mutated = mutated.to_immutable();
    assert_match!(rule_error(consensus.validate_and_insert_block(&mutated)), RuleError::BadMerkleRoot(_, _));
    assert_eq!(consensus.storage().statuses_store.get(mutated.hash()).unwrap(), BlockStatus::StatusHeaderOnly);

    // The same header with the right transactions is accepted
    let block = block.to_immutable();
    assert_eq!(block.hash(), mutated.hash());
    assert_eq!(consensus.validate_and_insert_block(&block).unwrap(), BlockStatus::StatusUTXOPendingVerification);
}

#[test]
fn test_missing_parent_bodies() {
    let config = test_config();
    let consensus = TestConsensus::new(&config);

    let parent = consensus.build_block_with_parents(vec![config.genesis.hash()]).to_immutable();
    assert_eq!(consensus.consensus().validate_and_insert_header(&parent.header).unwrap(), BlockStatus::StatusHeaderOnly);

    let child = consensus.build_block_with_parents(vec![parent.hash()]).to_immutable();
    assert_match!(
        rule_error(consensus.validate_and_insert_block(&child)),
        RuleError::MissingParents(missing) if missing == vec![parent.hash()]
    );
    assert_eq!(consensus.storage().statuses_store.get(child.hash()).unwrap(), BlockStatus::StatusHeaderOnly);

    // Once the parent body arrives the child body is accepted
    assert_eq!(consensus.validate_and_insert_block(&parent).unwrap(), BlockStatus::StatusUTXOPendingVerification);
    assert_eq!(consensus.validate_and_insert_block(&child).unwrap(), BlockStatus::StatusUTXOPendingVerification);
}

#[test]
fn test_tips_follow_inserted_bodies() {
    let config = test_config();
    let consensus = TestConsensus::new(&config);
    let genesis_hash = config.genesis.hash();

    let a = consensus.add_block_with_parents(vec![genesis_hash]).unwrap();
    let b = consensus.add_block_with_parents(vec![genesis_hash]).unwrap();
    let tips = || {
        use kestrel_consensus::model::stores::tips::TipsStoreReader;
        let mut tips: Vec<Hash> = consensus.storage().body_tips_store.get().unwrap().iter().copied().collect();
        tips.sort();
        tips
    };
    let mut expected = vec![a, b];
    expected.sort();
    assert_eq!(tips(), expected);

    let c = consensus.add_block_with_parents(vec![a, b]).unwrap();
    assert_eq!(tips(), vec![c]);
}

#[test]
fn test_transaction_finality_in_body_context() {
    let config = test_config();
    let consensus = TestConsensus::new(&config);

    // A chain of blue score 3 so the next block has blue score 4
    let mut tip = config.genesis.hash();
    for _ in 0..3 {
        tip = consensus.add_block_with_parents(vec![tip]).unwrap();
    }
    let blue_score = 4;

    let block_with_lock_time = |lock_time: u64| {
        let tx = spend_with_lock_time(TransactionOutpoint::new(9.into(), lock_time as u32), 10, lock_time);
        consensus.build_block_with_parents_and_transactions(vec![tip], vec![tx]).to_immutable()
    };

    let block = block_with_lock_time(blue_score - 1);
    assert_eq!(block.header.blue_score, blue_score);
    assert!(consensus.validate_and_insert_block(&block).is_ok());

    let block = block_with_lock_time(blue_score);
    let id = block.transactions[1].id();
    assert_match!(rule_error(consensus.validate_and_insert_block(&block)), RuleError::UnfinalizedTx(tx) if tx == id);

    let block = block_with_lock_time(blue_score + 1);
    assert_match!(rule_error(consensus.validate_and_insert_block(&block)), RuleError::UnfinalizedTx(_));
}

#[test]
fn test_build_block_reports_missing_outpoints() {
    let config = test_config();
    let consensus = TestConsensus::new(&config);

    let outpoint = TransactionOutpoint::new(77.into(), 1);
    let mut tx = MutableTransaction::new(spend(outpoint, 10));
    // Entries held by the caller survive the call untouched
    let held_entry = UtxoEntry::new(50, ScriptPublicKey::from_vec(0, vec![0x51]), 0, false);
    tx.entries[0] = Some(held_entry.clone());
    let tx_id = tx.id();

    let mut txs = [tx];
    let miner_data = MinerData::new(ScriptPublicKey::from_vec(0, vec![0x51]), vec![]);
    match rule_error(consensus.consensus().build_block(miner_data, &mut txs)) {
        RuleError::InvalidTransactionsInNewBlock(invalid) => {
            assert_eq!(invalid.len(), 1);
            assert_eq!(invalid[0].transaction.id(), tx_id);
            assert_eq!(invalid[0].error, RuleError::MissingTxOut(vec![outpoint]));
        }
        err => panic!("unexpected error {err:?}"),
    }
    assert_eq!(txs[0].entries, vec![Some(held_entry)]);
}

#[test]
fn test_build_block_aggregates_all_invalid_transactions() {
    let config = test_config();
    let consensus = TestConsensus::new(&config);

    let spk = ScriptPublicKey::from_vec(0, vec![0x51]);
    let funded = TransactionOutpoint::new(70.into(), 0);
    consensus.storage().utxo_set_store.insert(funded, UtxoEntry::new(100, spk.clone(), 0, false));

    let mut txs = [
        MutableTransaction::new(spend(TransactionOutpoint::new(71.into(), 0), 10)),
        MutableTransaction::new(spend(funded, 10)),
        MutableTransaction::new(spend(funded, 500)),
    ];
    match rule_error(consensus.consensus().build_block(MinerData::new(spk, vec![]), &mut txs)) {
        RuleError::InvalidTransactionsInNewBlock(invalid) => {
            let ids: Vec<_> = invalid.iter().map(|i| i.transaction.id()).collect();
            assert_eq!(ids, vec![txs[0].id(), txs[2].id()]);
            assert_match!(invalid[0].error, RuleError::MissingTxOut(_));
            assert_match!(invalid[1].error, RuleError::TxInContextFailed(_, TxRuleError::SpendTooHigh(500, 100)));
        }
        err => panic!("unexpected error {err:?}"),
    }
}

#[test]
fn test_build_block_with_oversized_coinbase_payload() {
    let config = test_config();
    let consensus = TestConsensus::new(&config);

    // The fixed payload prefix and the script push the extra data over the limit
    let spk = ScriptPublicKey::from_vec(0, vec![0x51]);
    let miner_data = MinerData::new(spk, vec![0u8; config.max_coinbase_payload_len]);
    assert_match!(
        rule_error(consensus.consensus().build_block(miner_data, &mut [])),
        RuleError::BadCoinbasePayloadLen(len, max_len) if len > max_len && max_len == config.max_coinbase_payload_len
    );
}

#[test]
fn test_build_block_over_virtual() {
    let config = test_config();
    let consensus = TestConsensus::new(&config);

    let spk = ScriptPublicKey::from_vec(0, vec![0x51]);
    let funded = TransactionOutpoint::new(70.into(), 0);
    consensus.storage().utxo_set_store.insert(funded, UtxoEntry::new(100, spk.clone(), 0, false));

    let mut txs = [MutableTransaction::new(spend(funded, 90))];
    let block = consensus.consensus().build_block(MinerData::new(spk, vec![]), &mut txs).unwrap();

    let virtual_state = consensus.consensus().virtual_state().unwrap();
    assert_eq!(block.header.direct_parents(), virtual_state.parents.as_slice());
    assert_eq!(block.header.blue_score, virtual_state.ghostdag_data.blue_score);
    assert_eq!(block.header.hash_merkle_root, calc_hash_merkle_root(block.transactions.iter()));
    assert!(block.header.timestamp > virtual_state.past_median_time);
    assert_eq!(block.transactions.len(), 2);
    assert!(block.transactions[0].is_coinbase());
    assert_eq!(block.transactions[0].outputs[0].value, config.base_subsidy + 10);
    assert_eq!(block.transactions[1].id(), txs[0].id());

    // The template is a valid block
    assert_eq!(consensus.validate_and_insert_block(&block).unwrap(), BlockStatus::StatusUTXOPendingVerification);
}
