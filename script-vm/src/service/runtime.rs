use num_bigint::BigInt;
use tracing::{debug, info};

use script_asm::FaultReason;
use script_types::Address;

use crate::crypto;
use crate::engine::ExecutionEngine;
use crate::error::ExecError;
use crate::event::NotifyEvent;
use crate::executor::ScriptExecutor;
use crate::item::{InteropValue, StackItem};
use crate::serializer;
use crate::storage::LedgerStore;

pub(super) fn get_time<S: LedgerStore>(
    host: &mut ScriptExecutor<'_, S>,
    engine: &mut ExecutionEngine,
) -> Result<(), ExecError> {
    engine.push(StackItem::from(host.config().time));
    Ok(())
}

pub(super) fn check_witness<S: LedgerStore>(
    host: &mut ScriptExecutor<'_, S>,
    engine: &mut ExecutionEngine,
) -> Result<(), ExecError> {
    let operand = engine.pop_bytes()?;

    let address = if operand.len() == Address::LEN {
        Address::try_from(operand.as_slice()).map_err(|_| FaultReason::InvalidAddress)?
    } else {
        crypto::address_from_pubkey(&operand)?
    };

    engine.push(StackItem::Boolean(host.check_witness(&address)));
    Ok(())
}

pub(super) fn notify<S: LedgerStore>(
    host: &mut ScriptExecutor<'_, S>,
    engine: &mut ExecutionEngine,
) -> Result<(), ExecError> {
    let states = engine.pop()?.deep_copy()?;
    let contract = host.current_context()?.contract_address;

    debug!(contract = %format_args!("{contract:x}"), "contract notification");

    host.push_notification(NotifyEvent { contract, states });
    Ok(())
}

pub(super) fn log<S: LedgerStore>(
    host: &mut ScriptExecutor<'_, S>,
    engine: &mut ExecutionEngine,
) -> Result<(), ExecError> {
    let message = engine.pop_bytes()?;
    let contract = host.current_context()?.contract_address;

    info!(
        contract = %format_args!("{contract:x}"),
        message = %String::from_utf8_lossy(&message),
        "contract log"
    );

    Ok(())
}

pub(super) fn get_trigger<S: LedgerStore>(
    _host: &mut ScriptExecutor<'_, S>,
    engine: &mut ExecutionEngine,
) -> Result<(), ExecError> {
    engine.push(StackItem::Integer(BigInt::from(0)));
    Ok(())
}

pub(super) fn serialize<S: LedgerStore>(
    _host: &mut ScriptExecutor<'_, S>,
    engine: &mut ExecutionEngine,
) -> Result<(), ExecError> {
    let item = engine.pop()?;
    let bytes = serializer::serialize_item(&item)?;

    engine.push(StackItem::ByteString(bytes));
    Ok(())
}

pub(super) fn deserialize<S: LedgerStore>(
    _host: &mut ScriptExecutor<'_, S>,
    engine: &mut ExecutionEngine,
) -> Result<(), ExecError> {
    let bytes = engine.pop_bytes()?;
    let item = serializer::deserialize_item(&bytes)?;

    engine.push(item);
    Ok(())
}

pub(super) fn base58_to_address<S: LedgerStore>(
    _host: &mut ScriptExecutor<'_, S>,
    engine: &mut ExecutionEngine,
) -> Result<(), ExecError> {
    let text = engine.pop_bytes()?;
    let text = core::str::from_utf8(&text).map_err(|_| FaultReason::InvalidAddress)?;

    let address =
        Address::from_base58(text).map_err(|_| FaultReason::InvalidAddress)?;

    engine.push(StackItem::from(address));
    Ok(())
}

pub(super) fn address_to_base58<S: LedgerStore>(
    _host: &mut ScriptExecutor<'_, S>,
    engine: &mut ExecutionEngine,
) -> Result<(), ExecError> {
    let address = engine.pop_address()?;

    engine.push(StackItem::ByteString(address.to_base58().into_bytes()));
    Ok(())
}

pub(super) fn get_current_block_hash<S: LedgerStore>(
    host: &mut ScriptExecutor<'_, S>,
    engine: &mut ExecutionEngine,
) -> Result<(), ExecError> {
    engine.push(StackItem::from(host.config().block_hash));
    Ok(())
}

pub(super) fn get_code_container<S: LedgerStore>(
    host: &mut ScriptExecutor<'_, S>,
    engine: &mut ExecutionEngine,
) -> Result<(), ExecError> {
    let tx = host.config().tx.clone();
    engine.push(StackItem::interop(InteropValue::Transaction(tx)));
    Ok(())
}

pub(super) fn get_executing_address<S: LedgerStore>(
    host: &mut ScriptExecutor<'_, S>,
    engine: &mut ExecutionEngine,
) -> Result<(), ExecError> {
    let address = host.current_context()?.contract_address;
    engine.push(StackItem::from(address));
    Ok(())
}

pub(super) fn get_calling_address<S: LedgerStore>(
    host: &mut ScriptExecutor<'_, S>,
    engine: &mut ExecutionEngine,
) -> Result<(), ExecError> {
    let address = host
        .calling_context()
        .map(|ctx| ctx.contract_address.as_ref().to_vec())
        .unwrap_or_default();

    engine.push(StackItem::ByteString(address));
    Ok(())
}

pub(super) fn get_entry_address<S: LedgerStore>(
    host: &mut ScriptExecutor<'_, S>,
    engine: &mut ExecutionEngine,
) -> Result<(), ExecError> {
    let address = host.entry_context()?.contract_address;
    engine.push(StackItem::from(address));
    Ok(())
}
