//! Interop service registry.
//!
//! Each service pairs an optional pre-execution validator with an effect.
//! For a `SYSCALL` the host looks the name up, runs the validator, charges
//! the priced gas and only then runs the effect, so a failed charge never
//! has side effects. The name strings are wire protocol.

use std::collections::BTreeMap;

use crate::engine::ExecutionEngine;
use crate::error::ExecError;
use crate::executor::ScriptExecutor;
use crate::item::{InteropValue, StackItem};
use crate::storage::LedgerStore;

mod accessors;
mod blockchain;
mod contract;
mod native;
mod runtime;
mod storage;

pub use native::{NativeEnv, NativeRegistry, StateAccess};

/// Wire names of the interop services.
pub mod names {
    #![allow(missing_docs)]

    pub const RUNTIME_GET_TIME: &str = "System.Runtime.GetTime";
    pub const RUNTIME_CHECK_WITNESS: &str = "System.Runtime.CheckWitness";
    pub const RUNTIME_NOTIFY: &str = "System.Runtime.Notify";
    pub const RUNTIME_LOG: &str = "System.Runtime.Log";
    pub const RUNTIME_GET_TRIGGER: &str = "System.Runtime.GetTrigger";
    pub const RUNTIME_SERIALIZE: &str = "System.Runtime.Serialize";
    pub const RUNTIME_DESERIALIZE: &str = "System.Runtime.Deserialize";
    pub const RUNTIME_BASE58_TO_ADDRESS: &str = "System.Runtime.Base58ToAddress";
    pub const RUNTIME_ADDRESS_TO_BASE58: &str = "System.Runtime.AddressToBase58";
    pub const RUNTIME_GET_CURRENT_BLOCK_HASH: &str = "System.Runtime.GetCurrentBlockHash";

    pub const BLOCKCHAIN_GET_HEIGHT: &str = "System.Blockchain.GetHeight";
    pub const BLOCKCHAIN_GET_HEADER: &str = "System.Blockchain.GetHeader";
    pub const BLOCKCHAIN_GET_BLOCK: &str = "System.Blockchain.GetBlock";
    pub const BLOCKCHAIN_GET_TRANSACTION: &str = "System.Blockchain.GetTransaction";
    pub const BLOCKCHAIN_GET_TRANSACTION_HEIGHT: &str =
        "System.Blockchain.GetTransactionHeight";
    pub const BLOCKCHAIN_GET_CONTRACT: &str = "System.Blockchain.GetContract";

    pub const HEADER_GET_INDEX: &str = "System.Header.GetIndex";
    pub const HEADER_GET_HASH: &str = "System.Header.GetHash";
    pub const HEADER_GET_VERSION: &str = "System.Header.GetVersion";
    pub const HEADER_GET_PREV_HASH: &str = "System.Header.GetPrevHash";
    pub const HEADER_GET_TIMESTAMP: &str = "System.Header.GetTimestamp";
    pub const HEADER_GET_CONSENSUS_DATA: &str = "System.Header.GetConsensusData";
    pub const HEADER_GET_NEXT_CONSENSUS: &str = "System.Header.GetNextConsensus";
    pub const HEADER_GET_MERKLE_ROOT: &str = "System.Header.GetMerkleRoot";

    pub const BLOCK_GET_TRANSACTION_COUNT: &str = "System.Block.GetTransactionCount";
    pub const BLOCK_GET_TRANSACTIONS: &str = "System.Block.GetTransactions";
    pub const BLOCK_GET_TRANSACTION: &str = "System.Block.GetTransaction";

    pub const TRANSACTION_GET_HASH: &str = "System.Transaction.GetHash";
    pub const TRANSACTION_GET_TYPE: &str = "System.Transaction.GetType";
    pub const TRANSACTION_GET_ATTRIBUTES: &str = "System.Transaction.GetAttributes";

    pub const ATTRIBUTE_GET_USAGE: &str = "System.Attribute.GetUsage";
    pub const ATTRIBUTE_GET_DATA: &str = "System.Attribute.GetData";

    pub const CONTRACT_CREATE: &str = "System.Contract.Create";
    pub const CONTRACT_MIGRATE: &str = "System.Contract.Migrate";
    pub const CONTRACT_DESTROY: &str = "System.Contract.Destroy";
    pub const CONTRACT_GET_STORAGE_CONTEXT: &str = "System.Contract.GetStorageContext";
    pub const CONTRACT_GET_SCRIPT: &str = "System.Contract.GetScript";

    pub const STORAGE_GET: &str = "System.Storage.Get";
    pub const STORAGE_PUT: &str = "System.Storage.Put";
    pub const STORAGE_DELETE: &str = "System.Storage.Delete";
    pub const STORAGE_GET_CONTEXT: &str = "System.Storage.GetContext";
    pub const STORAGE_GET_READ_ONLY_CONTEXT: &str = "System.Storage.GetReadOnlyContext";
    pub const STORAGE_CONTEXT_AS_READ_ONLY: &str = "System.StorageContext.AsReadOnly";

    pub const ENGINE_GET_CODE_CONTAINER: &str =
        "System.ExecutionEngine.GetCodeContainer";
    pub const ENGINE_GET_EXECUTING_ADDRESS: &str =
        "System.ExecutionEngine.GetExecutingAddress";
    pub const ENGINE_GET_CALLING_ADDRESS: &str =
        "System.ExecutionEngine.GetCallingAddress";
    pub const ENGINE_GET_ENTRY_ADDRESS: &str = "System.ExecutionEngine.GetEntryAddress";

    pub const NATIVE_INVOKE: &str = "System.Native.Invoke";
}

/// Effect of a service: runs after validation and gas charging.
pub type ServiceFn<S> =
    fn(&mut ScriptExecutor<'_, S>, &mut ExecutionEngine) -> Result<(), ExecError>;

/// Stack-shape check run before a service is priced; never mutates state.
pub type ValidatorFn = fn(&ExecutionEngine) -> Result<(), ExecError>;

/// One registered interop service.
pub struct Service<S: LedgerStore> {
    /// The effect.
    pub execute: ServiceFn<S>,
    /// Optional pre-execution validator.
    pub validator: Option<ValidatorFn>,
}

impl<S: LedgerStore> Clone for Service<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: LedgerStore> Copy for Service<S> {}

/// Immutable name-to-service table, built once per executor type.
pub struct ServiceRegistry<S: LedgerStore> {
    services: BTreeMap<&'static str, Service<S>>,
}

impl<S: LedgerStore> Default for ServiceRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: LedgerStore> ServiceRegistry<S> {
    /// The full protocol service table.
    pub fn new() -> Self {
        let mut services: BTreeMap<&'static str, Service<S>> = BTreeMap::new();

        let mut register = |name, execute: ServiceFn<S>, validator: Option<ValidatorFn>| {
            services.insert(name, Service { execute, validator });
        };

        register(names::RUNTIME_GET_TIME, runtime::get_time, None);
        register(
            names::RUNTIME_CHECK_WITNESS,
            runtime::check_witness,
            Some(validator_witness_operand),
        );
        register(
            names::RUNTIME_NOTIFY,
            runtime::notify,
            Some(validator_min_args::<1>),
        );
        register(
            names::RUNTIME_LOG,
            runtime::log,
            Some(validator_primitive_arg),
        );
        register(names::RUNTIME_GET_TRIGGER, runtime::get_trigger, None);
        register(
            names::RUNTIME_SERIALIZE,
            runtime::serialize,
            Some(validator_min_args::<1>),
        );
        register(
            names::RUNTIME_DESERIALIZE,
            runtime::deserialize,
            Some(validator_primitive_arg),
        );
        register(
            names::RUNTIME_BASE58_TO_ADDRESS,
            runtime::base58_to_address,
            Some(validator_primitive_arg),
        );
        register(
            names::RUNTIME_ADDRESS_TO_BASE58,
            runtime::address_to_base58,
            Some(validator_primitive_arg),
        );
        register(
            names::RUNTIME_GET_CURRENT_BLOCK_HASH,
            runtime::get_current_block_hash,
            None,
        );

        register(names::BLOCKCHAIN_GET_HEIGHT, blockchain::get_height, None);
        register(
            names::BLOCKCHAIN_GET_HEADER,
            blockchain::get_header,
            Some(validator_primitive_arg),
        );
        register(
            names::BLOCKCHAIN_GET_BLOCK,
            blockchain::get_block,
            Some(validator_primitive_arg),
        );
        register(
            names::BLOCKCHAIN_GET_TRANSACTION,
            blockchain::get_transaction,
            Some(validator_primitive_arg),
        );
        register(
            names::BLOCKCHAIN_GET_TRANSACTION_HEIGHT,
            blockchain::get_transaction_height,
            Some(validator_primitive_arg),
        );
        register(
            names::BLOCKCHAIN_GET_CONTRACT,
            blockchain::get_contract,
            Some(validator_primitive_arg),
        );

        register(
            names::HEADER_GET_INDEX,
            accessors::header_get_index,
            Some(validator_header),
        );
        register(
            names::HEADER_GET_HASH,
            accessors::header_get_hash,
            Some(validator_header),
        );
        register(
            names::HEADER_GET_VERSION,
            accessors::header_get_version,
            Some(validator_header),
        );
        register(
            names::HEADER_GET_PREV_HASH,
            accessors::header_get_prev_hash,
            Some(validator_header),
        );
        register(
            names::HEADER_GET_TIMESTAMP,
            accessors::header_get_timestamp,
            Some(validator_header),
        );
        register(
            names::HEADER_GET_CONSENSUS_DATA,
            accessors::header_get_consensus_data,
            Some(validator_header),
        );
        register(
            names::HEADER_GET_NEXT_CONSENSUS,
            accessors::header_get_next_consensus,
            Some(validator_header),
        );
        register(
            names::HEADER_GET_MERKLE_ROOT,
            accessors::header_get_merkle_root,
            Some(validator_header),
        );

        register(
            names::BLOCK_GET_TRANSACTION_COUNT,
            accessors::block_get_transaction_count,
            Some(validator_block),
        );
        register(
            names::BLOCK_GET_TRANSACTIONS,
            accessors::block_get_transactions,
            Some(validator_block),
        );
        register(
            names::BLOCK_GET_TRANSACTION,
            accessors::block_get_transaction,
            Some(validator_block_transaction),
        );

        register(
            names::TRANSACTION_GET_HASH,
            accessors::transaction_get_hash,
            Some(validator_transaction),
        );
        register(
            names::TRANSACTION_GET_TYPE,
            accessors::transaction_get_type,
            Some(validator_transaction),
        );
        register(
            names::TRANSACTION_GET_ATTRIBUTES,
            accessors::transaction_get_attributes,
            Some(validator_transaction),
        );

        register(
            names::ATTRIBUTE_GET_USAGE,
            accessors::attribute_get_usage,
            Some(validator_attribute),
        );
        register(
            names::ATTRIBUTE_GET_DATA,
            accessors::attribute_get_data,
            Some(validator_attribute),
        );

        register(names::CONTRACT_CREATE, contract::create, None);
        register(names::CONTRACT_MIGRATE, contract::migrate, None);
        register(names::CONTRACT_DESTROY, contract::destroy, None);
        register(
            names::CONTRACT_GET_STORAGE_CONTEXT,
            contract::get_storage_context,
            Some(validator_contract),
        );
        register(
            names::CONTRACT_GET_SCRIPT,
            contract::get_script,
            Some(validator_contract),
        );

        register(names::STORAGE_GET, storage::get, None);
        register(names::STORAGE_PUT, storage::put, None);
        register(names::STORAGE_DELETE, storage::delete, None);
        register(names::STORAGE_GET_CONTEXT, storage::get_context, None);
        register(
            names::STORAGE_GET_READ_ONLY_CONTEXT,
            storage::get_read_only_context,
            None,
        );
        register(
            names::STORAGE_CONTEXT_AS_READ_ONLY,
            storage::context_as_read_only,
            Some(validator_storage_context),
        );

        register(
            names::ENGINE_GET_CODE_CONTAINER,
            runtime::get_code_container,
            None,
        );
        register(
            names::ENGINE_GET_EXECUTING_ADDRESS,
            runtime::get_executing_address,
            None,
        );
        register(
            names::ENGINE_GET_CALLING_ADDRESS,
            runtime::get_calling_address,
            None,
        );
        register(
            names::ENGINE_GET_ENTRY_ADDRESS,
            runtime::get_entry_address,
            None,
        );

        register(names::NATIVE_INVOKE, native::invoke, None);

        Self { services }
    }

    /// Look a service up by wire name.
    pub fn get(&self, name: &str) -> Option<Service<S>> {
        self.services.get(name).copied()
    }

    /// Registered wire names, in order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.services.keys().copied()
    }
}

fn validator_min_args<const N: usize>(engine: &ExecutionEngine) -> Result<(), ExecError> {
    if engine.eval_count() < N {
        return Err(script_asm::FaultReason::StackUnderflow.into());
    }

    Ok(())
}

fn validator_primitive_arg(engine: &ExecutionEngine) -> Result<(), ExecError> {
    engine.peek(0)?.as_bytes()?;
    Ok(())
}

fn validator_witness_operand(engine: &ExecutionEngine) -> Result<(), ExecError> {
    let operand = engine.peek(0)?.as_bytes()?;

    // a 20-byte address or a serialized public key
    match operand.len() {
        20 | 33 | 65 => Ok(()),
        _ => Err(script_asm::FaultReason::InvalidAddress.into()),
    }
}

fn expect_interop(
    engine: &ExecutionEngine,
    n: usize,
    check: fn(&InteropValue) -> bool,
) -> Result<(), ExecError> {
    let item = engine.peek(n)?;

    match item {
        StackItem::Interop(handle) if check(handle.value()) => Ok(()),
        _ => Err(script_asm::FaultReason::TypeMismatch.into()),
    }
}

fn validator_header(engine: &ExecutionEngine) -> Result<(), ExecError> {
    expect_interop(engine, 0, |v| {
        matches!(v, InteropValue::Header(_) | InteropValue::Block(_))
    })
}

fn validator_block(engine: &ExecutionEngine) -> Result<(), ExecError> {
    expect_interop(engine, 0, |v| matches!(v, InteropValue::Block(_)))
}

fn validator_block_transaction(engine: &ExecutionEngine) -> Result<(), ExecError> {
    validator_block(engine)?;
    engine.peek(1)?.as_integer()?;
    Ok(())
}

fn validator_transaction(engine: &ExecutionEngine) -> Result<(), ExecError> {
    expect_interop(engine, 0, |v| matches!(v, InteropValue::Transaction(_)))
}

fn validator_attribute(engine: &ExecutionEngine) -> Result<(), ExecError> {
    expect_interop(engine, 0, |v| matches!(v, InteropValue::Attribute(_)))
}

fn validator_contract(engine: &ExecutionEngine) -> Result<(), ExecError> {
    expect_interop(engine, 0, |v| matches!(v, InteropValue::Contract(_)))
}

fn validator_storage_context(engine: &ExecutionEngine) -> Result<(), ExecError> {
    expect_interop(engine, 0, |v| matches!(v, InteropValue::StorageContext(_)))
}
