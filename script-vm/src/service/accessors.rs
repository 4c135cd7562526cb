//! Pure field getters over interop handles.

use num_bigint::BigInt;

use script_asm::FaultReason;

use crate::chain::{Block, Header, Transaction, TxAttribute};
use crate::engine::ExecutionEngine;
use crate::error::ExecError;
use crate::executor::ScriptExecutor;
use crate::item::{InteropValue, StackItem};
use crate::storage::LedgerStore;

fn pop_header(engine: &mut ExecutionEngine) -> Result<Header, ExecError> {
    let item = engine.pop()?;
    let handle = item.as_interop()?;

    // block handles answer header queries too
    match handle.value() {
        InteropValue::Header(header) => Ok(header.clone()),
        InteropValue::Block(block) => Ok(block.header.clone()),
        _ => Err(FaultReason::TypeMismatch.into()),
    }
}

fn pop_block(engine: &mut ExecutionEngine) -> Result<Block, ExecError> {
    let item = engine.pop()?;
    let handle = item.as_interop()?;

    match handle.value() {
        InteropValue::Block(block) => Ok(block.clone()),
        _ => Err(FaultReason::TypeMismatch.into()),
    }
}

fn pop_transaction(engine: &mut ExecutionEngine) -> Result<Transaction, ExecError> {
    let item = engine.pop()?;
    let handle = item.as_interop()?;

    match handle.value() {
        InteropValue::Transaction(tx) => Ok(tx.clone()),
        _ => Err(FaultReason::TypeMismatch.into()),
    }
}

fn pop_attribute(engine: &mut ExecutionEngine) -> Result<TxAttribute, ExecError> {
    let item = engine.pop()?;
    let handle = item.as_interop()?;

    match handle.value() {
        InteropValue::Attribute(attr) => Ok(attr.clone()),
        _ => Err(FaultReason::TypeMismatch.into()),
    }
}

macro_rules! header_getter {
    ($name:ident, $header:ident => $value:expr) => {
        pub(super) fn $name<S: LedgerStore>(
            _host: &mut ScriptExecutor<'_, S>,
            engine: &mut ExecutionEngine,
        ) -> Result<(), ExecError> {
            let $header = pop_header(engine)?;
            engine.push($value);
            Ok(())
        }
    };
}

header_getter!(header_get_index, h => StackItem::from(h.height));
header_getter!(header_get_hash, h => StackItem::from(h.hash));
header_getter!(header_get_version, h => StackItem::from(h.version));
header_getter!(header_get_prev_hash, h => StackItem::from(h.prev_hash));
header_getter!(header_get_timestamp, h => StackItem::from(h.timestamp));
header_getter!(header_get_consensus_data, h => StackItem::from(h.consensus_data));
header_getter!(header_get_next_consensus, h => StackItem::from(h.next_bookkeeper));
header_getter!(header_get_merkle_root, h => StackItem::from(h.tx_root));

pub(super) fn block_get_transaction_count<S: LedgerStore>(
    _host: &mut ScriptExecutor<'_, S>,
    engine: &mut ExecutionEngine,
) -> Result<(), ExecError> {
    let block = pop_block(engine)?;
    engine.push(StackItem::Integer(BigInt::from(block.transactions.len())));
    Ok(())
}

pub(super) fn block_get_transactions<S: LedgerStore>(
    _host: &mut ScriptExecutor<'_, S>,
    engine: &mut ExecutionEngine,
) -> Result<(), ExecError> {
    let block = pop_block(engine)?;

    let items = block
        .transactions
        .into_iter()
        .map(|tx| StackItem::interop(InteropValue::Transaction(tx)))
        .collect();

    engine.push(StackItem::array(items));
    Ok(())
}

pub(super) fn block_get_transaction<S: LedgerStore>(
    _host: &mut ScriptExecutor<'_, S>,
    engine: &mut ExecutionEngine,
) -> Result<(), ExecError> {
    let block = pop_block(engine)?;
    let index = engine.pop_index()?;

    let tx = block
        .transactions
        .get(index)
        .cloned()
        .ok_or(FaultReason::IndexOutOfRange)?;

    engine.push(StackItem::interop(InteropValue::Transaction(tx)));
    Ok(())
}

pub(super) fn transaction_get_hash<S: LedgerStore>(
    _host: &mut ScriptExecutor<'_, S>,
    engine: &mut ExecutionEngine,
) -> Result<(), ExecError> {
    let tx = pop_transaction(engine)?;
    engine.push(StackItem::from(tx.hash));
    Ok(())
}

pub(super) fn transaction_get_type<S: LedgerStore>(
    _host: &mut ScriptExecutor<'_, S>,
    engine: &mut ExecutionEngine,
) -> Result<(), ExecError> {
    let tx = pop_transaction(engine)?;
    engine.push(StackItem::Integer(BigInt::from(tx.tx_type as u8)));
    Ok(())
}

pub(super) fn transaction_get_attributes<S: LedgerStore>(
    _host: &mut ScriptExecutor<'_, S>,
    engine: &mut ExecutionEngine,
) -> Result<(), ExecError> {
    let tx = pop_transaction(engine)?;

    let items = tx
        .attributes
        .into_iter()
        .map(|attr| StackItem::interop(InteropValue::Attribute(attr)))
        .collect();

    engine.push(StackItem::array(items));
    Ok(())
}

pub(super) fn attribute_get_usage<S: LedgerStore>(
    _host: &mut ScriptExecutor<'_, S>,
    engine: &mut ExecutionEngine,
) -> Result<(), ExecError> {
    let attr = pop_attribute(engine)?;
    engine.push(StackItem::Integer(BigInt::from(attr.usage)));
    Ok(())
}

pub(super) fn attribute_get_data<S: LedgerStore>(
    _host: &mut ScriptExecutor<'_, S>,
    engine: &mut ExecutionEngine,
) -> Result<(), ExecError> {
    let attr = pop_attribute(engine)?;
    engine.push(StackItem::ByteString(attr.data));
    Ok(())
}
