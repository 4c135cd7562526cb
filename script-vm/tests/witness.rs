//! Authorization: witness checks, signature opcodes and runtime services.

mod common;

use common::*;

use rand::rngs::StdRng;
use rand::SeedableRng;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};

use script_vm::crypto;
use script_vm::prelude::*;

fn keypair(seed: u64) -> (SecretKey, PublicKey) {
    let rng = &mut StdRng::seed_from_u64(seed);
    Secp256k1::new().generate_keypair(rng)
}

fn sign(key: &SecretKey, data: &[u8]) -> Vec<u8> {
    let message = Message::from_digest(crypto::sha256(data));
    Secp256k1::new()
        .sign_ecdsa(&message, key)
        .serialize_compact()
        .to_vec()
}

fn check_witness_script(operand: &[u8]) -> Vec<u8> {
    let mut script = ScriptBuilder::new();
    script
        .push_bytes(operand)
        .emit_syscall(names::RUNTIME_CHECK_WITNESS);
    script.build()
}

#[test]
fn transaction_signer_is_a_witness() {
    let store = MemoryStore::new();
    let signer = Address::new([0x11; 20]);

    let cfg = config(transaction(vec![signer]), 100_000);
    let execution = ScriptExecutor::new(&store, cfg)
        .execute(check_witness_script(signer.as_ref()))
        .expect("halt");

    assert!(result_bool(&execution));
}

#[test]
fn stranger_is_not_a_witness() {
    let store = MemoryStore::new();

    let cfg = config(transaction(vec![Address::new([0x11; 20])]), 100_000);
    let execution = ScriptExecutor::new(&store, cfg)
        .execute(check_witness_script(&[0x22; 20]))
        .expect("halt");

    assert!(!result_bool(&execution));
}

#[test]
fn witness_operand_may_be_a_public_key() {
    let store = MemoryStore::new();
    let (_, pubkey) = keypair(3);

    let signer = crypto::address_from_pubkey(&pubkey.serialize()).unwrap();
    let cfg = config(transaction(vec![signer]), 100_000);

    let execution = ScriptExecutor::new(&store, cfg)
        .execute(check_witness_script(&pubkey.serialize()))
        .expect("halt");

    assert!(result_bool(&execution));
}

#[test]
fn calling_contract_is_a_witness_in_the_callee() {
    let mut store = MemoryStore::new();

    // the callee asks whether its immediate caller authorized the action
    let mut callee = ScriptBuilder::new();
    callee
        .emit_syscall(names::ENGINE_GET_CALLING_ADDRESS)
        .emit_syscall(names::RUNTIME_CHECK_WITNESS);
    let callee_addr = deploy(&mut store, callee.as_bytes());

    let mut caller = ScriptBuilder::new();
    caller.emit_appcall(Some(&callee_addr));

    let execution = run(&store, caller.build()).expect("halt");
    assert!(result_bool(&execution));
}

#[test]
fn current_contract_is_not_its_own_witness() {
    let mut store = MemoryStore::new();

    let mut callee = ScriptBuilder::new();
    callee
        .emit_syscall(names::ENGINE_GET_EXECUTING_ADDRESS)
        .emit_syscall(names::RUNTIME_CHECK_WITNESS);
    let callee_addr = deploy(&mut store, callee.as_bytes());

    let mut caller = ScriptBuilder::new();
    caller.emit_appcall(Some(&callee_addr));

    let execution = run(&store, caller.build()).expect("halt");
    assert!(!result_bool(&execution));
}

#[test]
fn verify_accepts_a_valid_signature() {
    let store = MemoryStore::new();
    let (secret, pubkey) = keypair(9);

    let data = b"authorize";
    let signature = sign(&secret, data);

    let mut script = ScriptBuilder::new();
    script
        .push_bytes(data)
        .push_bytes(&signature)
        .push_bytes(&pubkey.serialize())
        .emit(OpCode::VERIFY);

    let execution = run(&store, script.build()).expect("halt");
    assert!(result_bool(&execution));
}

#[test]
fn verify_pushes_false_on_a_wrong_signature() {
    let store = MemoryStore::new();
    let (secret, pubkey) = keypair(9);

    let signature = sign(&secret, b"authorize");

    let mut script = ScriptBuilder::new();
    script
        .push_bytes(b"tampered")
        .push_bytes(&signature)
        .push_bytes(&pubkey.serialize())
        .emit(OpCode::VERIFY);

    let execution = run(&store, script.build()).expect("halt");
    assert!(!result_bool(&execution));
}

#[test]
fn verify_aborts_on_a_malformed_public_key() {
    let store = MemoryStore::new();

    let mut script = ScriptBuilder::new();
    script
        .push_bytes(b"data")
        .push_bytes(&[0u8; 64])
        .push_bytes(&[0u8; 33])
        .emit(OpCode::VERIFY);

    let err = run(&store, script.build()).unwrap_err();
    assert_eq!(err, ExecError::Fault(FaultReason::InvalidPublicKey));
}

#[test]
fn checksig_signs_the_transaction_hash() {
    let store = MemoryStore::new();
    let (secret, pubkey) = keypair(21);

    let tx = transaction(Vec::new());
    let signature = sign(&secret, tx.hash.as_ref());

    let mut script = ScriptBuilder::new();
    script
        .push_bytes(&signature)
        .push_bytes(&pubkey.serialize())
        .emit(OpCode::CHECKSIG);

    let cfg = config(tx, 100_000);
    let execution = ScriptExecutor::new(&store, cfg)
        .execute(script.build())
        .expect("halt");

    assert!(result_bool(&execution));
}

#[test]
fn checksig_is_false_for_a_foreign_message() {
    let store = MemoryStore::new();
    let (secret, pubkey) = keypair(21);

    let signature = sign(&secret, b"something else");

    let mut script = ScriptBuilder::new();
    script
        .push_bytes(&signature)
        .push_bytes(&pubkey.serialize())
        .emit(OpCode::CHECKSIG);

    let execution = run(&store, script.build()).expect("halt");
    assert!(!result_bool(&execution));
}

#[test]
fn checkmultisig_two_of_three() {
    let store = MemoryStore::new();

    let tx = transaction(Vec::new());
    let keys: Vec<_> = (0..3).map(keypair).collect();

    // signatures in key order: holders 0 and 2
    let sig0 = sign(&keys[0].0, tx.hash.as_ref());
    let sig2 = sign(&keys[2].0, tx.hash.as_ref());

    let mut script = ScriptBuilder::new();
    script
        .push_bytes(&sig2)
        .push_bytes(&sig0)
        .push_i64(2)
        .push_bytes(&keys[2].1.serialize())
        .push_bytes(&keys[1].1.serialize())
        .push_bytes(&keys[0].1.serialize())
        .push_i64(3)
        .emit(OpCode::CHECKMULTISIG);

    let cfg = config(tx, 100_000);
    let execution = ScriptExecutor::new(&store, cfg)
        .execute(script.build())
        .expect("halt");

    assert!(result_bool(&execution));
}

#[test]
fn serialize_round_trips_through_the_vm() {
    let store = MemoryStore::new();

    let mut script = ScriptBuilder::new();
    script
        .push_i64(42)
        .emit_syscall(names::RUNTIME_SERIALIZE)
        .emit_syscall(names::RUNTIME_DESERIALIZE)
        .push_i64(42)
        .emit(OpCode::NUMEQUAL);

    let execution = run(&store, script.build()).expect("halt");
    assert!(result_bool(&execution));
}

#[test]
fn base58_round_trips_through_the_vm() {
    let store = MemoryStore::new();
    let address = Address::new([0x5c; 20]);

    let mut script = ScriptBuilder::new();
    script
        .push_bytes(address.as_ref())
        .emit_syscall(names::RUNTIME_ADDRESS_TO_BASE58)
        .emit_syscall(names::RUNTIME_BASE58_TO_ADDRESS);

    let execution = run(&store, script.build()).expect("halt");
    assert_eq!(result_bytes(&execution), address.as_ref().to_vec());
}

#[test]
fn runtime_exposes_the_block_environment() {
    let store = MemoryStore::new();

    let mut script = ScriptBuilder::new();
    script.emit_syscall(names::RUNTIME_GET_TIME);

    let tx = transaction(Vec::new());
    let cfg = ExecConfig::new(tx, &header(7), 100_000, ExecutionMode::Consensus);
    let expected_time = cfg.time;

    let execution = ScriptExecutor::new(&store, cfg)
        .execute(script.build())
        .expect("halt");

    assert_eq!(result_int(&execution), i64::from(expected_time));
}

#[test]
fn code_container_exposes_the_transaction() {
    let store = MemoryStore::new();

    let mut script = ScriptBuilder::new();
    script
        .emit_syscall(names::ENGINE_GET_CODE_CONTAINER)
        .emit_syscall(names::TRANSACTION_GET_HASH);

    let tx = transaction(Vec::new());
    let expected = tx.hash;

    let cfg = config(tx, 100_000);
    let execution = ScriptExecutor::new(&store, cfg)
        .execute(script.build())
        .expect("halt");

    assert_eq!(result_bytes(&execution), expected.as_ref().to_vec());
}
