use tracing::debug;

use script_asm::FaultReason;

use crate::chain::DeployCode;
use crate::consts::MAX_BYTEARRAY_SIZE;
use crate::crypto;
use crate::engine::ExecutionEngine;
use crate::error::ExecError;
use crate::executor::ScriptExecutor;
use crate::item::{InteropValue, StackItem};
use crate::storage::{storage_key, storage_prefix, LedgerStore, StorageContext};

fn pop_deploy_args(engine: &mut ExecutionEngine) -> Result<DeployCode, ExecError> {
    let code = engine.pop_bytes()?;

    if code.is_empty() || code.len() > MAX_BYTEARRAY_SIZE {
        return Err(FaultReason::ByteStringTooLarge.into());
    }

    let need_storage = engine.pop_bool()?;
    let name = pop_string(engine)?;
    let version = pop_string(engine)?;
    let author = pop_string(engine)?;
    let email = pop_string(engine)?;
    let description = pop_string(engine)?;

    Ok(DeployCode {
        code,
        need_storage,
        name,
        version,
        author,
        email,
        description,
    })
}

fn pop_string(engine: &mut ExecutionEngine) -> Result<String, ExecError> {
    let bytes = engine.pop_bytes()?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub(super) fn create<S: LedgerStore>(
    host: &mut ScriptExecutor<'_, S>,
    engine: &mut ExecutionEngine,
) -> Result<(), ExecError> {
    let deploy = pop_deploy_args(engine)?;
    let address = crypto::address_from_code(&deploy.code);

    // re-deploying an existing contract returns the stored record
    let deploy = match host.cache().get_contract(&address)? {
        Some(existing) => existing,
        None => {
            debug!(contract = %format_args!("{address:x}"), "deploying contract");
            host.cache_mut().put_contract(&address, &deploy);
            deploy
        }
    };

    engine.push(StackItem::interop(InteropValue::Contract(deploy)));
    Ok(())
}

pub(super) fn migrate<S: LedgerStore>(
    host: &mut ScriptExecutor<'_, S>,
    engine: &mut ExecutionEngine,
) -> Result<(), ExecError> {
    let deploy = pop_deploy_args(engine)?;
    let new_address = crypto::address_from_code(&deploy.code);
    let old_address = host.current_context()?.contract_address;

    host.cache_mut().put_contract(&new_address, &deploy);

    // move every storage entry of the old contract under the new address
    let entries = host.cache().scan_prefix(&storage_prefix(&old_address))?;
    let prefix_len = storage_prefix(&old_address).len();

    for (key, value) in entries {
        let suffix = key[prefix_len..].to_vec();
        host.cache_mut().put(storage_key(&new_address, &suffix), value);
        host.cache_mut().delete(key);
    }

    host.cache_mut().delete_contract(&old_address);

    debug!(
        from = %format_args!("{old_address:x}"),
        to = %format_args!("{new_address:x}"),
        "migrated contract"
    );

    engine.push(StackItem::interop(InteropValue::Contract(deploy)));
    Ok(())
}

pub(super) fn destroy<S: LedgerStore>(
    host: &mut ScriptExecutor<'_, S>,
    _engine: &mut ExecutionEngine,
) -> Result<(), ExecError> {
    let address = host.current_context()?.contract_address;

    if host.cache().get_contract(&address)?.is_none() {
        return Err(ExecError::ContractNotFound(address));
    }

    let entries = host.cache().scan_prefix(&storage_prefix(&address))?;
    for (key, _) in entries {
        host.cache_mut().delete(key);
    }

    host.cache_mut().delete_contract(&address);

    debug!(contract = %format_args!("{address:x}"), "destroyed contract");
    Ok(())
}

pub(super) fn get_storage_context<S: LedgerStore>(
    host: &mut ScriptExecutor<'_, S>,
    engine: &mut ExecutionEngine,
) -> Result<(), ExecError> {
    let item = engine.pop()?;
    let handle = item.as_interop()?;

    let InteropValue::Contract(deploy) = handle.value() else {
        return Err(FaultReason::TypeMismatch.into());
    };

    // only the executing contract may obtain its own writable context
    let address = crypto::address_from_code(&deploy.code);
    if address != host.current_context()?.contract_address {
        return Err(ExecError::PermissionDenied);
    }

    engine.push(StackItem::interop(InteropValue::StorageContext(
        StorageContext::new(address),
    )));
    Ok(())
}

pub(super) fn get_script<S: LedgerStore>(
    _host: &mut ScriptExecutor<'_, S>,
    engine: &mut ExecutionEngine,
) -> Result<(), ExecError> {
    let item = engine.pop()?;
    let handle = item.as_interop()?;

    let InteropValue::Contract(deploy) = handle.value() else {
        return Err(FaultReason::TypeMismatch.into());
    };

    engine.push(StackItem::ByteString(deploy.code.clone()));
    Ok(())
}
