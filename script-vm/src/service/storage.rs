use script_asm::FaultReason;

use crate::consts::MAX_STORAGE_KEY_SIZE;
use crate::engine::ExecutionEngine;
use crate::error::ExecError;
use crate::executor::ScriptExecutor;
use crate::item::{InteropValue, StackItem};
use crate::storage::{storage_key, LedgerStore, StorageContext, StorageItem};

fn pop_context(engine: &mut ExecutionEngine) -> Result<StorageContext, ExecError> {
    let item = engine.pop()?;
    let handle = item.as_interop()?;

    match handle.value() {
        InteropValue::StorageContext(ctx) => Ok(*ctx),
        _ => Err(FaultReason::TypeMismatch.into()),
    }
}

fn pop_key(engine: &mut ExecutionEngine) -> Result<Vec<u8>, ExecError> {
    let key = engine.pop_bytes()?;

    if key.len() > MAX_STORAGE_KEY_SIZE {
        return Err(FaultReason::ByteStringTooLarge.into());
    }

    Ok(key)
}

pub(super) fn get<S: LedgerStore>(
    host: &mut ScriptExecutor<'_, S>,
    engine: &mut ExecutionEngine,
) -> Result<(), ExecError> {
    // the context is pushed before the key, so it pops last
    let key = pop_key(engine)?;
    let ctx = pop_context(engine)?;

    let value = host
        .cache()
        .get(&storage_key(&ctx.contract, &key))?
        .map(|raw| StorageItem::from_bytes(&raw))
        .transpose()?
        .map(|item| item.value)
        .unwrap_or_default();

    engine.push(StackItem::ByteString(value));
    Ok(())
}

pub(super) fn put<S: LedgerStore>(
    host: &mut ScriptExecutor<'_, S>,
    engine: &mut ExecutionEngine,
) -> Result<(), ExecError> {
    let value = engine.pop_bytes()?;
    let key = pop_key(engine)?;
    let ctx = pop_context(engine)?;

    host.require_writable(&ctx)?;
    host.cache_mut().put(
        storage_key(&ctx.contract, &key),
        StorageItem::new(value).to_bytes(),
    );

    Ok(())
}

pub(super) fn delete<S: LedgerStore>(
    host: &mut ScriptExecutor<'_, S>,
    engine: &mut ExecutionEngine,
) -> Result<(), ExecError> {
    let key = pop_key(engine)?;
    let ctx = pop_context(engine)?;

    host.require_writable(&ctx)?;
    host.cache_mut().delete(storage_key(&ctx.contract, &key));

    Ok(())
}

pub(super) fn get_context<S: LedgerStore>(
    host: &mut ScriptExecutor<'_, S>,
    engine: &mut ExecutionEngine,
) -> Result<(), ExecError> {
    let contract = host.current_context()?.contract_address;

    engine.push(StackItem::interop(InteropValue::StorageContext(
        StorageContext::new(contract),
    )));
    Ok(())
}

pub(super) fn get_read_only_context<S: LedgerStore>(
    host: &mut ScriptExecutor<'_, S>,
    engine: &mut ExecutionEngine,
) -> Result<(), ExecError> {
    let contract = host.current_context()?.contract_address;

    engine.push(StackItem::interop(InteropValue::StorageContext(
        StorageContext::read_only(contract),
    )));
    Ok(())
}

pub(super) fn context_as_read_only<S: LedgerStore>(
    _host: &mut ScriptExecutor<'_, S>,
    engine: &mut ExecutionEngine,
) -> Result<(), ExecError> {
    let ctx = pop_context(engine)?;

    engine.push(StackItem::interop(InteropValue::StorageContext(
        ctx.as_read_only(),
    )));
    Ok(())
}
