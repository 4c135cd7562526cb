//! Ledger queries: headers, blocks, transactions and their accessors.

mod common;

use common::*;

use script_vm::crypto::address_from_code;
use script_vm::prelude::*;

fn store_with_block() -> (MemoryStore, Block, Transaction) {
    let mut store = MemoryStore::new();

    let tx = Transaction {
        hash: H256::new([0xaa; 32]),
        tx_type: TxType::Invoke,
        attributes: vec![TxAttribute {
            usage: 0x01,
            data: b"meta".to_vec(),
        }],
        signers: vec![Address::new([0x01; 20])],
    };

    let block = Block {
        header: header(5),
        transactions: vec![tx.clone()],
    };

    store.insert_block(block.clone());
    (store, block, tx)
}

#[test]
fn get_height_reflects_the_executing_block() {
    let store = MemoryStore::new();

    let mut script = ScriptBuilder::new();
    script.emit_syscall(names::BLOCKCHAIN_GET_HEIGHT);

    let cfg = ExecConfig::new(
        transaction(Vec::new()),
        &header(9),
        100_000,
        ExecutionMode::Consensus,
    );
    let execution = ScriptExecutor::new(&store, cfg)
        .execute(script.build())
        .expect("halt");

    assert_eq!(result_int(&execution), 9);
}

#[test]
fn header_lookup_by_height_and_accessors() {
    let (store, block, _) = store_with_block();

    let mut script = ScriptBuilder::new();
    script
        .push_i64(5)
        .emit_syscall(names::BLOCKCHAIN_GET_HEADER)
        .emit_syscall(names::HEADER_GET_TIMESTAMP);

    let execution = run(&store, script.build()).expect("halt");
    assert_eq!(
        result_int(&execution),
        i64::from(block.header.timestamp)
    );
}

#[test]
fn header_lookup_by_hash() {
    let (store, block, _) = store_with_block();

    let mut script = ScriptBuilder::new();
    script
        .push_bytes(block.header.hash.as_ref())
        .emit_syscall(names::BLOCKCHAIN_GET_HEADER)
        .emit_syscall(names::HEADER_GET_INDEX);

    let execution = run(&store, script.build()).expect("halt");
    assert_eq!(result_int(&execution), 5);
}

#[test]
fn missing_header_aborts() {
    let store = MemoryStore::new();

    let mut script = ScriptBuilder::new();
    script
        .push_i64(42)
        .emit_syscall(names::BLOCKCHAIN_GET_HEADER);

    assert!(run(&store, script.build()).is_err());
}

#[test]
fn block_exposes_its_transactions() {
    let (store, _, tx) = store_with_block();

    let mut script = ScriptBuilder::new();
    script
        .push_i64(5)
        .emit_syscall(names::BLOCKCHAIN_GET_BLOCK)
        .emit(OpCode::DUP)
        .emit_syscall(names::BLOCK_GET_TRANSACTION_COUNT)
        .emit(OpCode::DROP)
        .push_i64(0)
        .emit(OpCode::SWAP)
        .emit_syscall(names::BLOCK_GET_TRANSACTION)
        .emit_syscall(names::TRANSACTION_GET_HASH);

    let execution = run(&store, script.build()).expect("halt");
    assert_eq!(result_bytes(&execution), tx.hash.as_ref().to_vec());
}

#[test]
fn transaction_lookup_and_height() {
    let (store, _, tx) = store_with_block();

    let mut script = ScriptBuilder::new();
    script
        .push_bytes(tx.hash.as_ref())
        .emit_syscall(names::BLOCKCHAIN_GET_TRANSACTION)
        .emit_syscall(names::TRANSACTION_GET_TYPE);

    let execution = run(&store, script.build()).expect("halt");
    assert_eq!(result_int(&execution), i64::from(TxType::Invoke as u8));

    let mut script = ScriptBuilder::new();
    script
        .push_bytes(tx.hash.as_ref())
        .emit_syscall(names::BLOCKCHAIN_GET_TRANSACTION_HEIGHT);

    let execution = run(&store, script.build()).expect("halt");
    assert_eq!(result_int(&execution), 5);
}

#[test]
fn attributes_are_reachable_from_a_transaction() {
    let (store, _, tx) = store_with_block();

    let mut script = ScriptBuilder::new();
    script
        .push_bytes(tx.hash.as_ref())
        .emit_syscall(names::BLOCKCHAIN_GET_TRANSACTION)
        .emit_syscall(names::TRANSACTION_GET_ATTRIBUTES)
        .push_i64(0)
        .emit(OpCode::PICKITEM)
        .emit_syscall(names::ATTRIBUTE_GET_DATA);

    let execution = run(&store, script.build()).expect("halt");
    assert_eq!(result_bytes(&execution), b"meta".to_vec());
}

#[test]
fn deployed_code_is_reachable_through_get_contract() {
    let mut store = MemoryStore::new();

    let mut deployed = ScriptBuilder::new();
    deployed.push_i64(3);
    let deployed_code = deployed.build();
    let address = deploy(&mut store, &deployed_code);

    let mut script = ScriptBuilder::new();
    script
        .push_bytes(address.as_ref())
        .emit_syscall(names::BLOCKCHAIN_GET_CONTRACT)
        .emit_syscall(names::CONTRACT_GET_SCRIPT);

    let execution = run(&store, script.build()).expect("halt");
    assert_eq!(result_bytes(&execution), deployed_code);
}

#[test]
fn storage_context_for_a_foreign_contract_is_denied() {
    let mut store = MemoryStore::new();

    let mut other = ScriptBuilder::new();
    other.push_i64(1);
    let other_addr = deploy(&mut store, other.as_bytes());

    let mut script = ScriptBuilder::new();
    script
        .push_bytes(other_addr.as_ref())
        .emit_syscall(names::BLOCKCHAIN_GET_CONTRACT)
        .emit_syscall(names::CONTRACT_GET_STORAGE_CONTEXT);

    let err = run(&store, script.build()).unwrap_err();
    assert_eq!(err, ExecError::PermissionDenied);
}

#[test]
fn own_storage_context_is_granted() {
    let mut store = MemoryStore::new();

    // a deployed contract asks for its own context through the record
    let mut script = ScriptBuilder::new();
    script
        .emit_syscall(names::ENGINE_GET_EXECUTING_ADDRESS)
        .emit_syscall(names::BLOCKCHAIN_GET_CONTRACT)
        .emit_syscall(names::CONTRACT_GET_STORAGE_CONTEXT)
        .push_bytes(b"k")
        .push_bytes(b"v")
        .emit_syscall(names::STORAGE_PUT);
    let code = script.build();
    let contract = deploy(&mut store, &code);

    let execution = run(&store, code).expect("halt");
    assert!(execution
        .state_delta
        .contains_key(&script_vm::storage::storage_key(&contract, b"k")));
}

#[test]
fn current_block_hash_matches_the_config() {
    let store = MemoryStore::new();

    let mut script = ScriptBuilder::new();
    script.emit_syscall(names::RUNTIME_GET_CURRENT_BLOCK_HASH);

    let head = header(4);
    let cfg = ExecConfig::new(
        transaction(Vec::new()),
        &head,
        100_000,
        ExecutionMode::Consensus,
    );
    let execution = ScriptExecutor::new(&store, cfg)
        .execute(script.build())
        .expect("halt");

    assert_eq!(result_bytes(&execution), head.hash.as_ref().to_vec());
}

#[test]
fn deploy_address_is_the_code_hash() {
    let code = vec![0x51, 0x52, 0x93];
    let mut store = MemoryStore::new();

    assert_eq!(deploy(&mut store, &code), address_from_code(&code));
}
