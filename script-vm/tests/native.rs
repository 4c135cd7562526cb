//! The dispatch seam to native precompiled contracts.

mod common;

use common::*;

use script_vm::prelude::*;

const COUNTER_ADDRESS: Address = Address::new([
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x07,
]);

/// Toy native contract: a persistent counter plus a witness probe.
struct CounterNative;

impl NativeRegistry for CounterNative {
    fn invoke(
        &self,
        env: &mut NativeEnv<'_>,
        contract: &Address,
        method: &str,
        args: &[StackItem],
    ) -> Result<StackItem, ExecError> {
        if *contract != COUNTER_ADDRESS {
            return Err(ExecError::ContractNotFound(*contract));
        }

        match method {
            "increment" => {
                let key = b"counter".to_vec();

                let current = env
                    .state
                    .get(&key)?
                    .map(|raw| raw.first().copied().unwrap_or(0))
                    .unwrap_or(0);

                env.state.put(key, vec![current + 1]);
                Ok(StackItem::from(i64::from(current + 1)))
            }
            "witnessed" => {
                let operand = args
                    .first()
                    .ok_or(ExecError::Fault(FaultReason::StackUnderflow))?
                    .as_bytes()?;

                let address = Address::try_from(operand.as_slice())
                    .map_err(|_| FaultReason::InvalidAddress)?;

                Ok(StackItem::Boolean(env.check_witness(&address)))
            }
            _ => Err(ExecError::UnsupportedService(method.into())),
        }
    }
}

fn native_call(method: &[u8], args_push: impl FnOnce(&mut ScriptBuilder)) -> Vec<u8> {
    let mut script = ScriptBuilder::new();
    args_push(&mut script);
    script
        .push_bytes(method)
        .push_bytes(COUNTER_ADDRESS.as_ref())
        .push_i64(0)
        .emit_syscall(names::NATIVE_INVOKE);
    script.build()
}

#[test]
fn native_state_joins_the_transaction_delta() {
    let store = MemoryStore::new();
    let natives = CounterNative;

    let code = native_call(b"increment", |script| {
        script.push_i64(0);
    });

    let cfg = config(transaction(Vec::new()), 100_000);
    let execution = ScriptExecutor::new(&store, cfg)
        .with_natives(&natives)
        .execute(code)
        .expect("halt");

    assert_eq!(result_int(&execution), 1);
    assert_eq!(
        execution.state_delta[b"counter".as_slice()],
        Some(vec![1u8])
    );
}

#[test]
fn invoking_contract_is_witnessed_inside_the_native() {
    let store = MemoryStore::new();
    let natives = CounterNative;

    // the contract probes its own address through the native; from the
    // native's side the invoking contract counts as the calling context
    let code = native_call(b"witnessed", |script| {
        script.emit_syscall(names::ENGINE_GET_EXECUTING_ADDRESS);
    });

    let cfg = config(transaction(Vec::new()), 100_000);
    let execution = ScriptExecutor::new(&store, cfg)
        .with_natives(&natives)
        .execute(code)
        .expect("halt");

    assert!(result_bool(&execution));
}

#[test]
fn transaction_signer_is_witnessed_inside_the_native() {
    let store = MemoryStore::new();
    let natives = CounterNative;

    let signer = Address::new([0x31; 20]);
    let code = native_call(b"witnessed", |script| {
        script.push_bytes(signer.as_ref());
    });

    let cfg = config(transaction(vec![signer]), 100_000);
    let execution = ScriptExecutor::new(&store, cfg)
        .with_natives(&natives)
        .execute(code)
        .expect("halt");

    assert!(result_bool(&execution));
}

#[test]
fn missing_registry_reports_contract_not_found() {
    let store = MemoryStore::new();

    let code = native_call(b"increment", |script| {
        script.push_i64(0);
    });

    let err = run(&store, code).unwrap_err();
    assert_eq!(err, ExecError::ContractNotFound(COUNTER_ADDRESS));
}

#[test]
fn array_argument_spreads_into_the_handler() {
    let store = MemoryStore::new();
    let natives = CounterNative;

    let signer = Address::new([0x44; 20]);

    // a single-element array carries the probe address
    let code = native_call(b"witnessed", |script| {
        script
            .push_bytes(signer.as_ref())
            .push_i64(1)
            .emit(OpCode::PACK);
    });

    let cfg = config(transaction(vec![signer]), 100_000);
    let execution = ScriptExecutor::new(&store, cfg)
        .with_natives(&natives)
        .execute(code)
        .expect("halt");

    assert!(result_bool(&execution));
}
