//! Dispatch seam to the native precompiled contract registry.
//!
//! The registry internals live outside the core; the VM only defines how a
//! script reaches a native method and what state view the handler receives.

use tracing::debug;

use script_asm::FaultReason;
use script_types::{Address, H256};

use crate::engine::ExecutionEngine;
use crate::error::ExecError;
use crate::executor::ScriptExecutor;
use crate::item::StackItem;
use crate::storage::{CacheDB, LedgerStore};

/// Mutable key-value view natives write through; backed by the transaction's
/// state overlay, so native effects commit and roll back with the script.
pub trait StateAccess {
    /// Read a raw state entry.
    fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>, ExecError>;

    /// Write a raw state entry.
    fn put(&mut self, key: Vec<u8>, value: Vec<u8>);

    /// Delete a raw state entry.
    fn delete(&mut self, key: Vec<u8>);
}

impl<S: LedgerStore> StateAccess for CacheDB<'_, S> {
    fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>, ExecError> {
        CacheDB::get(self, key)
    }

    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        CacheDB::put(self, key, value)
    }

    fn delete(&mut self, key: Vec<u8>) {
        CacheDB::delete(self, key)
    }
}

/// Execution context handed to a native handler.
pub struct NativeEnv<'a> {
    /// Transaction state overlay.
    pub state: &'a mut dyn StateAccess,
    /// Hash of the transaction being executed.
    pub tx_hash: H256,
    /// Current block timestamp.
    pub time: u32,
    /// Current block height.
    pub height: u32,
    /// Addresses considered witnessed for this dispatch: the transaction
    /// signers plus the contract that invoked the native.
    pub witnesses: Vec<Address>,
}

impl NativeEnv<'_> {
    /// Authorization check mirroring `Runtime.CheckWitness`.
    pub fn check_witness(&self, address: &Address) -> bool {
        self.witnesses.contains(address)
    }
}

/// Registry of native contracts, keyed by contract address and method name.
pub trait NativeRegistry {
    /// Invoke `method` of the native contract at `contract`.
    fn invoke(
        &self,
        env: &mut NativeEnv<'_>,
        contract: &Address,
        method: &str,
        args: &[StackItem],
    ) -> Result<StackItem, ExecError>;
}

pub(super) fn invoke<S: LedgerStore>(
    host: &mut ScriptExecutor<'_, S>,
    engine: &mut ExecutionEngine,
) -> Result<(), ExecError> {
    let _version = engine.pop_integer()?;
    let contract = engine.pop_address()?;

    let method = engine.pop_bytes()?;
    let method =
        String::from_utf8(method).map_err(|_| FaultReason::InvalidOperand)?;

    let args = match engine.pop()? {
        StackItem::Array(items) => items.borrow().clone(),
        single => vec![single],
    };

    debug!(
        contract = %format_args!("{contract:x}"),
        method = %method,
        "native dispatch"
    );

    let result = host.dispatch_native(&contract, &method, &args)?;
    engine.push(result);

    Ok(())
}
