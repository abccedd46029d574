use kestrel_consensus::{consensus::test_consensus::TestConsensus, model::stores::ghostdag::GhostdagStoreReader};
use kestrel_consensus_core::{
    blockstatus::BlockStatus,
    config::Config,
    errors::block::RuleError,
    merkle::calc_hash_merkle_root,
    tx::TransactionOutpoint,
};
use kestrel_core::assert_match;
use kestrel_hashes::Hash;
use rand::{Rng, SeedableRng, rngs::SmallRng, seq::SliceRandom};
use serde::Deserialize;
use std::collections::HashMap;

mod common;
use common::{rule_error, spend, test_config};

/// Config for merge depth tests: a small k so that side branches quickly turn red
fn merge_depth_config(merge_depth: u64) -> Config {
    let mut config = test_config();
    config.params.ghostdag_k = 2;
    config.params.merge_depth = merge_depth;
    config.params.finality_depth = 2 * merge_depth;
    config
}

/// Adds a selected chain of `len` blocks on top of `from`, returning the chain in order
fn add_chain(consensus: &TestConsensus, from: Hash, len: usize) -> Vec<Hash> {
    let mut chain = Vec::with_capacity(len);
    let mut tip = from;
    for _ in 0..len {
        tip = consensus.add_block_with_parents(vec![tip]).unwrap();
        chain.push(tip);
    }
    chain
}

#[test]
fn test_parents_antichain_property() {
    let config = test_config();
    let consensus = TestConsensus::new(&config);
    let mut rng = SmallRng::seed_from_u64(42);

    // A random DAG where every block points at a random subset of the current tips, which is always an antichain
    let mut tips = vec![config.genesis.hash()];
    let mut added = Vec::new();
    let mut parents_of: HashMap<Hash, Vec<Hash>> = HashMap::new();
    for _ in 0..40 {
        let count = rng.gen_range(1..=tips.len().min(3));
        let parents: Vec<Hash> = tips.choose_multiple(&mut rng, count).copied().collect();
        let hash = consensus.add_block_with_parents(parents.clone()).unwrap();
        tips.retain(|tip| !parents.contains(tip));
        tips.push(hash);
        added.push(hash);
        parents_of.insert(hash, parents);

        // Occasionally fork from an earlier block
        if rng.gen_bool(0.3) {
            let fork_point = *added.choose(&mut rng).unwrap();
            let hash = consensus.add_block_with_parents(vec![fork_point]).unwrap();
            tips.retain(|&tip| tip != fork_point);
            tips.push(hash);
            added.push(hash);
            parents_of.insert(hash, vec![fork_point]);
        }
    }

    // Any block paired with one of its parents violates the antichain rule
    for _ in 0..20 {
        let block = *added.choose(&mut rng).unwrap();
        let parent = *parents_of[&block].choose(&mut rng).unwrap();
        let header_block = consensus.build_block_with_parents(vec![block, parent]).to_immutable();
        assert_match!(rule_error(consensus.validate_and_insert_block(&header_block)), RuleError::InvalidParentsRelation(_, _));
    }
}

#[test]
fn test_parents_order_property() {
    let config = test_config();
    let consensus = TestConsensus::new(&config);
    let mut rng = SmallRng::seed_from_u64(7);

    let genesis_hash = config.genesis.hash();
    let siblings: Vec<Hash> = (0..6).map(|_| consensus.add_block_with_parents(vec![genesis_hash]).unwrap()).collect();

    for _ in 0..30 {
        let count = rng.gen_range(2..=siblings.len());
        let mut parents: Vec<Hash> = siblings.choose_multiple(&mut rng, count).copied().collect();
        let mut header = consensus.build_header_with_parents(parents.clone());
        let sorted = header.direct_parents().to_vec();

        parents.shuffle(&mut rng);
        header.parents_by_level[0] = parents.clone();
        header.finalize();
        let res = consensus.header_processor().validate_header_in_isolation(&header);
        if parents == sorted {
            assert!(res.is_ok());
        } else {
            assert_match!(res.unwrap_err().rule_error(), Some(RuleError::WrongParentsOrder));
        }
    }
}

#[test]
fn test_merkle_mutation_property() {
    let config = test_config();
    let consensus = TestConsensus::new(&config);
    let mut rng = SmallRng::seed_from_u64(1234);

    let txs = (0..8).map(|i| spend(TransactionOutpoint::new(Hash::from_u64_word(1000 + i), 0), 10 + i)).collect();
    let block = consensus.build_block_with_parents_and_transactions(vec![config.genesis.hash()], txs);
    assert_eq!(block.header.hash_merkle_root, calc_hash_merkle_root(block.transactions.iter()));

    for _ in 0..50 {
        let mut mutated = block.clone();
        let tx = &mut mutated.transactions[rng.gen_range(1..block.transactions.len())];
        let script = &mut tx.inputs[0].signature_script;
        let index = rng.gen_range(0..script.len());
        script[index] ^= rng.gen_range(1..=u8::MAX);
        tx.finalize();

        assert_ne!(calc_hash_merkle_root(mutated.transactions.iter()), block.header.hash_merkle_root);
        // A body not matching the merkle root never invalidates the header, so resubmission is possible
        assert_match!(rule_error(consensus.validate_and_insert_block(&mutated.to_immutable())), RuleError::BadMerkleRoot(_, _));
    }
    assert_eq!(consensus.validate_and_insert_block(&block.to_immutable()).unwrap(), BlockStatus::StatusUTXOPendingVerification);
}

#[test]
fn test_bounded_merge_depth_boundary() {
    let merge_depth = 6;
    let config = merge_depth_config(merge_depth);
    let consensus = TestConsensus::new(&config);

    let chain = add_chain(&consensus, config.genesis.hash(), 12);
    let tip = *chain.last().unwrap();
    // The side block is red, so the merging block has blue score 13 and its merge depth root has blue score 7
    let root_blue_score = 12 + 1 - merge_depth;
    let root = chain[root_blue_score as usize - 1];
    assert_eq!(consensus.storage().ghostdag_store.get_blue_score(root).unwrap(), root_blue_score);

    // Forking from the merge depth root is allowed
    let side = consensus.add_block_with_parents(vec![root]).unwrap();
    let merging = consensus.add_block_with_parents(vec![tip, side]);
    assert!(merging.is_ok());
    let merging = merging.unwrap();
    assert!(consensus.storage().ghostdag_store.get_data(merging).unwrap().mergeset_reds.contains(&side));

    // Forking from one block below the root is not
    let side = consensus.add_block_with_parents(vec![chain[root_blue_score as usize - 2]]).unwrap();
    assert_match!(rule_error(consensus.add_block_with_parents(vec![tip, side])), RuleError::ViolatingBoundedMergeDepth);
}

#[test]
fn test_bounded_merge_depth_via_compliant_blue() {
    let merge_depth = 6;
    let config = merge_depth_config(merge_depth);
    let consensus = TestConsensus::new(&config);

    // Chain c1..c12 with blue scores 1..12
    let chain = add_chain(&consensus, config.genesis.hash(), 12);
    let c = |blue_score: usize| chain[blue_score - 1];

    // A side block forking from c5, merged first by a block over c10 whose merge depth root is still c5
    let side = consensus.add_block_with_parents(vec![c(5)]).unwrap();
    let blue = consensus.add_block_with_parents(vec![c(10), side]).unwrap();
    assert!(consensus.storage().ghostdag_store.get_data(blue).unwrap().mergeset_reds.contains(&side));

    // Merging the side block directly from c12 violates the merge depth
    assert_match!(rule_error(consensus.add_block_with_parents(vec![c(12), side])), RuleError::ViolatingBoundedMergeDepth);

    // Merging it through the blue block is allowed since the side block is in the past of a blue
    // whose selected chain contains the merge depth root
    let merging = consensus.add_block_with_parents(vec![c(12), blue]).unwrap();
    let ghostdag_data = consensus.storage().ghostdag_store.get_data(merging).unwrap();
    assert!(ghostdag_data.mergeset_blues.contains(&blue));
    assert!(ghostdag_data.mergeset_reds.contains(&side));
}

#[derive(Deserialize)]
struct JsonBlock {
    id: String,
    parents: Vec<String>,
}

#[test]
fn test_dag_from_json_description() {
    // Ids refer to earlier entries, "genesis" to the genesis block
    let description = r#"[
        { "id": "a", "parents": ["genesis"] },
        { "id": "b", "parents": ["genesis"] },
        { "id": "c", "parents": ["a"] },
        { "id": "d", "parents": ["a", "b"] },
        { "id": "e", "parents": ["c", "d"] },
        { "id": "f", "parents": ["b"] },
        { "id": "g", "parents": ["e", "f"] }
    ]"#;
    let blocks: Vec<JsonBlock> = serde_json::from_str(description).unwrap();

    let config = test_config();
    let consensus = TestConsensus::new(&config);
    let mut hashes = HashMap::from([("genesis".to_string(), config.genesis.hash())]);
    for block in blocks.iter() {
        let parents = block.parents.iter().map(|id| hashes[id]).collect();
        hashes.insert(block.id.clone(), consensus.add_block_with_parents(parents).unwrap());
    }

    let ghostdag_data = consensus.storage().ghostdag_store.get_data(hashes["g"]).unwrap();
    // With the default k every block of this small DAG is blue
    assert_eq!(ghostdag_data.blue_score, 7);
    assert!(ghostdag_data.mergeset_reds.is_empty());

    // Every block but the last is in the past of the last one, so none can join it as a parent
    for id in ["a", "b", "c", "d", "e", "f"] {
        let block = consensus.build_block_with_parents(vec![hashes["g"], hashes[id]]).to_immutable();
        assert_match!(rule_error(consensus.validate_and_insert_block(&block)), RuleError::InvalidParentsRelation(_, _));
    }
}
