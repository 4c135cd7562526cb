//! Execution driver: owns the state overlay, the contract context stack,
//! the notification buffer and the resource counters for one transaction.
//!
//! The loop per step: enforce the step ceiling (preview mode), fetch one
//! instruction, enforce the predicted stack bound, charge gas, then dispatch.
//! Host-mediated opcodes (`VERIFY`, `SYSCALL`, `APPCALL`, `TAILCALL`) run
//! here; everything else is a plain interpreter step. Any error unwinds to
//! the caller of [`ScriptExecutor::execute`] with the overlay and the
//! notifications discarded.

use tracing::debug;

use script_asm::{FaultReason, OpCode};
use script_types::{Address, H256};

use crate::chain::{Header, Transaction};
use crate::consts::{MAX_INVOCATION_DEPTH, MAX_STACK_SIZE, OPCODE_GAS, VM_STEP_LIMIT};
use crate::context::CallContext;
use crate::crypto;
use crate::engine::{ExecutionEngine, Operand};
use crate::error::ExecError;
use crate::event::NotifyEvent;
use crate::gas::GasSchedule;
use crate::item::StackItem;
use crate::service::{NativeEnv, NativeRegistry, ServiceRegistry};
use crate::storage::{CacheDB, LedgerStore, StorageContext, WriteSet};

/// Consensus execution has no step ceiling; preview execution is
/// step-limited so RPC queries terminate even with pathological gas prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExecutionMode {
    /// Block execution; gas is the only ceiling.
    Consensus,
    /// Pre-execution and RPC preview; additionally step-limited.
    PreExec,
}

/// Per-invocation parameters fixed at creation.
#[derive(Debug, Clone)]
pub struct ExecConfig {
    /// Timestamp of the executing block.
    pub time: u32,
    /// Height of the executing block.
    pub height: u32,
    /// Hash of the executing block.
    pub block_hash: H256,
    /// The transaction being executed.
    pub tx: Transaction,
    /// Gas available to the transaction.
    pub gas: u64,
    /// Execution mode.
    pub mode: ExecutionMode,
}

impl ExecConfig {
    /// Configuration for executing `tx` inside the block of `header`.
    pub fn new(tx: Transaction, header: &Header, gas: u64, mode: ExecutionMode) -> Self {
        Self {
            time: header.timestamp,
            height: header.height,
            block_hash: header.hash,
            tx,
            gas,
            mode,
        }
    }
}

/// Result of a halted execution.
#[derive(Debug)]
pub struct Execution {
    /// Top of the evaluation stack when the outer engine halted.
    pub result: Option<StackItem>,
    /// Gas actually consumed.
    pub gas_consumed: u64,
    /// Notifications in emission order across all nested frames.
    pub notifications: Vec<NotifyEvent>,
    /// Committed state writes, ready to apply to the ledger store.
    pub state_delta: WriteSet,
}

/// Driver for one transaction execution.
pub struct ScriptExecutor<'a, S: LedgerStore> {
    store: &'a S,
    cache: CacheDB<'a, S>,
    natives: Option<&'a dyn NativeRegistry>,
    registry: ServiceRegistry<S>,
    schedule: GasSchedule,
    contexts: Vec<CallContext>,
    notifications: Vec<NotifyEvent>,
    config: ExecConfig,
    gas_left: u64,
    exec_step: u32,
}

impl<'a, S: LedgerStore> ScriptExecutor<'a, S> {
    /// Executor over a snapshot of `store`.
    pub fn new(store: &'a S, config: ExecConfig) -> Self {
        Self {
            store,
            cache: CacheDB::new(store),
            natives: None,
            registry: ServiceRegistry::new(),
            schedule: GasSchedule::default(),
            contexts: Vec::new(),
            notifications: Vec::new(),
            gas_left: config.gas,
            exec_step: 0,
            config,
        }
    }

    /// Attach the native contract registry.
    pub fn with_natives(mut self, natives: &'a dyn NativeRegistry) -> Self {
        self.natives = Some(natives);
        self
    }

    /// Run `code` as the entry contract of the transaction.
    ///
    /// On success the state delta and the notifications are returned for the
    /// caller to commit; on failure both are discarded and only the error
    /// survives. Gas charged before the failure stays charged.
    pub fn execute(mut self, code: Vec<u8>) -> Result<Execution, ExecError> {
        let result = self.invoke(code, Vec::new())?;

        Ok(Execution {
            result,
            gas_consumed: self.config.gas - self.gas_left,
            notifications: self.notifications,
            state_delta: self.cache.into_write_set(),
        })
    }

    /// Invocation parameters.
    pub fn config(&self) -> &ExecConfig {
        &self.config
    }

    /// The underlying ledger snapshot.
    pub fn store(&self) -> &'a S {
        self.store
    }

    /// Read access to the transaction state overlay.
    pub fn cache(&self) -> &CacheDB<'a, S> {
        &self.cache
    }

    /// Write access to the transaction state overlay.
    pub fn cache_mut(&mut self) -> &mut CacheDB<'a, S> {
        &mut self.cache
    }

    /// Gas still available.
    pub fn gas_left(&self) -> u64 {
        self.gas_left
    }

    /// The executing contract's context.
    pub fn current_context(&self) -> Result<&CallContext, ExecError> {
        self.contexts.last().ok_or_else(no_context)
    }

    /// The context of the contract that invoked the current one.
    pub fn calling_context(&self) -> Option<&CallContext> {
        self.contexts.len().checked_sub(2).map(|i| &self.contexts[i])
    }

    /// The first context of the transaction; never popped.
    pub fn entry_context(&self) -> Result<&CallContext, ExecError> {
        self.contexts.first().ok_or_else(no_context)
    }

    /// `true` iff `address` signed the transaction or is the immediately
    /// calling contract. The current contract does not witness itself.
    pub fn check_witness(&self, address: &Address) -> bool {
        if self.config.tx.signers.contains(address) {
            return true;
        }

        self.calling_context()
            .map(|ctx| ctx.contract_address == *address)
            .unwrap_or(false)
    }

    /// Reject writes through read-only or foreign storage contexts.
    pub fn require_writable(&self, ctx: &StorageContext) -> Result<(), ExecError> {
        if ctx.read_only {
            return Err(ExecError::PermissionDenied);
        }

        if ctx.contract != self.current_context()?.contract_address {
            return Err(ExecError::PermissionDenied);
        }

        Ok(())
    }

    /// Append a notification to the transaction buffer.
    pub fn push_notification(&mut self, event: NotifyEvent) {
        self.notifications.push(event);
    }

    /// Route a call to the native contract registry.
    pub(crate) fn dispatch_native(
        &mut self,
        contract: &Address,
        method: &str,
        args: &[StackItem],
    ) -> Result<StackItem, ExecError> {
        let natives = self
            .natives
            .ok_or(ExecError::ContractNotFound(*contract))?;

        let mut witnesses = self.config.tx.signers.clone();
        if let Some(current) = self.contexts.last() {
            witnesses.push(current.contract_address);
        }

        let mut env = NativeEnv {
            state: &mut self.cache,
            tx_hash: self.config.tx.hash,
            time: self.config.time,
            height: self.config.height,
            witnesses,
        };

        natives.invoke(&mut env, contract, method, args)
    }

    /// Execute one contract: push its context, run its engine to completion
    /// and return the top of its evaluation stack.
    pub(crate) fn invoke(
        &mut self,
        code: Vec<u8>,
        initial_stack: Vec<StackItem>,
    ) -> Result<Option<StackItem>, ExecError> {
        if code.is_empty() {
            return Err(FaultReason::EmptyCode.into());
        }

        let address = crypto::address_from_code(&code);
        let offset = self.notifications.len();

        self.push_context(CallContext::new(address, code.clone(), offset))?;

        debug!(
            contract = %format_args!("{address:x}"),
            depth = self.contexts.len(),
            "invoking contract"
        );

        let message = self.config.tx.hash.as_ref().to_vec();
        let mut engine = ExecutionEngine::new(code, message).with_initial_stack(initial_stack);

        match self.run(&mut engine) {
            Ok(()) => {
                self.pop_context();
                Ok(engine.result())
            }
            Err(e) => {
                // a failed scope contributes no notifications
                self.notifications.truncate(offset);
                Err(e)
            }
        }
    }

    fn run(&mut self, engine: &mut ExecutionEngine) -> Result<(), ExecError> {
        loop {
            if self.config.mode == ExecutionMode::PreExec && !self.step_allowed() {
                return Err(ExecError::StepLimitExceeded);
            }

            if engine.done() {
                break;
            }

            let op = engine.fetch()?;

            // the check is skipped while the frame is unwinding off the end
            if !engine.done() {
                self.check_stack_size(engine)?;
            }

            if op.is_push_bytes() {
                self.charge_gas(OPCODE_GAS)?;
            } else {
                if !op.is_defined() {
                    return Err(FaultReason::UnknownOpCode.into());
                }

                let price = self.schedule.price(engine, op.name())?;
                self.charge_gas(price)?;
            }

            match op {
                OpCode::VERIFY => self.op_verify(engine)?,
                OpCode::SYSCALL => self.system_call(engine)?,
                OpCode::APPCALL => self.app_call(engine, false)?,
                OpCode::TAILCALL => self.app_call(engine, true)?,
                _ => engine.step_into()?,
            }
        }

        Ok(())
    }

    /// Predicted post-opcode stack size; everything at or under `PUSH16`
    /// grows by one, `UNPACK` by the element count of the top collection.
    fn check_stack_size(&self, engine: &ExecutionEngine) -> Result<(), ExecError> {
        let op = engine.current_opcode();
        let mut size = 0usize;

        if op < OpCode::PUSH16 {
            size = 1;
        } else {
            match op {
                OpCode::DEPTH | OpCode::DUP | OpCode::OVER | OpCode::TUCK => size = 1,
                OpCode::UNPACK => {
                    let item = engine.peek(0).map_err(|_| ExecError::StackOverflow)?;

                    if let StackItem::Array(a) | StackItem::Struct(a) = item {
                        size = a.len();
                    }
                }
                _ => {}
            }
        }

        size += engine.eval_count() + engine.alt_count();

        if size > MAX_STACK_SIZE {
            return Err(ExecError::StackOverflow);
        }

        Ok(())
    }

    fn charge_gas(&mut self, amount: u64) -> Result<(), ExecError> {
        if self.gas_left < amount {
            return Err(ExecError::InsufficientGas);
        }

        self.gas_left -= amount;
        Ok(())
    }

    fn step_allowed(&mut self) -> bool {
        if self.exec_step >= VM_STEP_LIMIT {
            return false;
        }

        self.exec_step += 1;
        true
    }

    fn push_context(&mut self, context: CallContext) -> Result<(), ExecError> {
        if self.contexts.len() >= MAX_INVOCATION_DEPTH {
            return Err(ExecError::ContextOverflow);
        }

        self.contexts.push(context);
        Ok(())
    }

    /// Pop the current context; the entry context always stays.
    fn pop_context(&mut self) {
        if self.contexts.len() > 1 {
            self.contexts.pop();
        }
    }

    /// `VERIFY` is host-mediated: a malformed public key aborts, a bad
    /// signature only pushes `false`.
    fn op_verify(&mut self, engine: &mut ExecutionEngine) -> Result<(), ExecError> {
        engine.take_instruction()?;

        if engine.eval_count() < 3 {
            return Err(FaultReason::StackUnderflow.into());
        }

        let pubkey = engine.pop_bytes()?;
        let signature = engine.pop_bytes()?;
        let data = engine.pop_bytes()?;

        let valid = crypto::verify_signature(&pubkey, &signature, &data)?;
        engine.push(StackItem::Boolean(valid));

        Ok(())
    }

    fn system_call(&mut self, engine: &mut ExecutionEngine) -> Result<(), ExecError> {
        let instr = engine.take_instruction()?;

        let Operand::Name(name) = instr.operand else {
            return Err(FaultReason::InvalidOperand.into());
        };

        let service = self
            .registry
            .get(&name)
            .ok_or_else(|| ExecError::UnsupportedService(name.clone()))?;

        if let Some(validator) = service.validator {
            validator(engine)?;
        }

        let price = self.schedule.price(engine, &name)?;
        self.charge_gas(price)?;

        (service.execute)(self, engine)
    }

    /// Nested contract invocation. The callee engine starts from a copy of
    /// the caller's evaluation stack and its single result, if any, lands
    /// back on the caller's stack. A tail call unwinds the caller frame
    /// before the callee runs.
    fn app_call(&mut self, engine: &mut ExecutionEngine, tail: bool) -> Result<(), ExecError> {
        let instr = engine.take_instruction()?;

        let Operand::Target(target) = instr.operand else {
            return Err(FaultReason::InvalidOperand.into());
        };

        let address = if target == Address::zeroed() {
            engine.pop_address()?
        } else {
            target
        };

        let code = self
            .cache
            .get_contract(&address)?
            .map(|deploy| deploy.code)
            .ok_or(ExecError::ContractNotFound(address))?;

        let initial_stack = engine.snapshot_stack();

        if tail {
            engine.pop_frame()?;
        }

        let result = self.invoke(code, initial_stack)?;

        if let Some(item) = result {
            engine.push(item);
        }

        Ok(())
    }
}

fn no_context() -> ExecError {
    ExecError::Store("no active invocation context".into())
}
