use script_asm::FaultReason;
use script_types::H256;

use crate::engine::ExecutionEngine;
use crate::error::ExecError;
use crate::executor::ScriptExecutor;
use crate::item::{InteropValue, StackItem};
use crate::storage::LedgerStore;

/// Lookup argument: a little-endian `u32` height or a 32-byte hash.
enum BlockRef {
    Height(u32),
    Hash(H256),
}

fn block_ref(engine: &mut ExecutionEngine) -> Result<BlockRef, ExecError> {
    let data = engine.pop_bytes()?;

    match data.len() {
        0..=4 => {
            let mut raw = [0u8; 4];
            raw[..data.len()].copy_from_slice(&data);
            Ok(BlockRef::Height(u32::from_le_bytes(raw)))
        }
        32 => Ok(BlockRef::Hash(
            H256::try_from(data.as_slice()).expect("length checked"),
        )),
        _ => Err(FaultReason::InvalidOperand.into()),
    }
}

fn pop_hash(engine: &mut ExecutionEngine) -> Result<H256, ExecError> {
    let data = engine.pop_bytes()?;
    H256::try_from(data.as_slice())
        .map_err(|_| FaultReason::InvalidOperand.into())
}

pub(super) fn get_height<S: LedgerStore>(
    host: &mut ScriptExecutor<'_, S>,
    engine: &mut ExecutionEngine,
) -> Result<(), ExecError> {
    engine.push(StackItem::from(host.config().height));
    Ok(())
}

pub(super) fn get_header<S: LedgerStore>(
    host: &mut ScriptExecutor<'_, S>,
    engine: &mut ExecutionEngine,
) -> Result<(), ExecError> {
    let header = match block_ref(engine)? {
        BlockRef::Height(height) => host.store().header_by_height(height),
        BlockRef::Hash(hash) => host.store().header_by_hash(&hash),
    }
    .map_err(Into::into)?
    .ok_or_else(|| ExecError::Store("header not found".into()))?;

    engine.push(StackItem::interop(InteropValue::Header(header)));
    Ok(())
}

pub(super) fn get_block<S: LedgerStore>(
    host: &mut ScriptExecutor<'_, S>,
    engine: &mut ExecutionEngine,
) -> Result<(), ExecError> {
    let block = match block_ref(engine)? {
        BlockRef::Height(height) => host.store().block_by_height(height),
        BlockRef::Hash(hash) => host.store().block_by_hash(&hash),
    }
    .map_err(Into::into)?
    .ok_or_else(|| ExecError::Store("block not found".into()))?;

    engine.push(StackItem::interop(InteropValue::Block(block)));
    Ok(())
}

pub(super) fn get_transaction<S: LedgerStore>(
    host: &mut ScriptExecutor<'_, S>,
    engine: &mut ExecutionEngine,
) -> Result<(), ExecError> {
    let hash = pop_hash(engine)?;

    let (tx, _) = host
        .store()
        .transaction(&hash)
        .map_err(Into::into)?
        .ok_or_else(|| ExecError::Store("transaction not found".into()))?;

    engine.push(StackItem::interop(InteropValue::Transaction(tx)));
    Ok(())
}

pub(super) fn get_transaction_height<S: LedgerStore>(
    host: &mut ScriptExecutor<'_, S>,
    engine: &mut ExecutionEngine,
) -> Result<(), ExecError> {
    let hash = pop_hash(engine)?;

    let (_, height) = host
        .store()
        .transaction(&hash)
        .map_err(Into::into)?
        .ok_or_else(|| ExecError::Store("transaction not found".into()))?;

    engine.push(StackItem::from(height));
    Ok(())
}

pub(super) fn get_contract<S: LedgerStore>(
    host: &mut ScriptExecutor<'_, S>,
    engine: &mut ExecutionEngine,
) -> Result<(), ExecError> {
    let address = engine.pop_address()?;

    let deploy = host
        .cache()
        .get_contract(&address)?
        .ok_or(ExecError::ContractNotFound(address))?;

    engine.push(StackItem::interop(InteropValue::Contract(deploy)));
    Ok(())
}
