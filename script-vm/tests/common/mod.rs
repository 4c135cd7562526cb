//! Shared fixtures for the integration tests.

// each test binary uses its own subset of the helpers
#![allow(dead_code)]

use script_vm::crypto;
use script_vm::prelude::*;

/// Header for a block at `height`.
pub fn header(height: u32) -> Header {
    Header {
        version: 0,
        prev_hash: H256::new([height.wrapping_sub(1) as u8; 32]),
        tx_root: H256::zeroed(),
        timestamp: 1_600_000_000 + height,
        height,
        consensus_data: u64::from(height),
        next_bookkeeper: Address::zeroed(),
        hash: H256::new([height as u8; 32]),
    }
}

/// Invoke transaction signed by `signers`.
pub fn transaction(signers: Vec<Address>) -> Transaction {
    Transaction {
        hash: H256::new([0x7a; 32]),
        tx_type: TxType::Invoke,
        attributes: Vec::new(),
        signers,
    }
}

/// Consensus-mode config with the given gas budget.
pub fn config(tx: Transaction, gas: u64) -> ExecConfig {
    ExecConfig::new(tx, &header(1), gas, ExecutionMode::Consensus)
}

/// Register `code` as a deployed contract and return its address.
pub fn deploy(store: &mut MemoryStore, code: &[u8]) -> Address {
    let record = DeployCode {
        code: code.to_vec(),
        need_storage: true,
        name: "fixture".into(),
        version: "1.0".into(),
        author: String::new(),
        email: String::new(),
        description: String::new(),
    };

    let address = crypto::address_from_code(code);
    store.deploy_contract(&address, &record);
    address
}

/// Run `code` against `store` with default config and plenty of gas.
pub fn run(store: &MemoryStore, code: Vec<u8>) -> Result<Execution, ExecError> {
    run_with_gas(store, code, 10_000_000)
}

/// Run `code` against `store` with an explicit gas budget.
pub fn run_with_gas(
    store: &MemoryStore,
    code: Vec<u8>,
    gas: u64,
) -> Result<Execution, ExecError> {
    let cfg = config(transaction(Vec::new()), gas);
    ScriptExecutor::new(store, cfg).execute(code)
}

/// Integer value of the execution result.
pub fn result_int(execution: &Execution) -> i64 {
    let item = execution.result.as_ref().expect("result expected");
    i64::try_from(item.as_integer().expect("integer result")).expect("fits i64")
}

/// Byte value of the execution result.
pub fn result_bytes(execution: &Execution) -> Vec<u8> {
    let item = execution.result.as_ref().expect("result expected");
    item.as_bytes().expect("byte result")
}

/// Boolean value of the execution result.
pub fn result_bool(execution: &Execution) -> bool {
    let item = execution.result.as_ref().expect("result expected");
    item.as_bool()
}
