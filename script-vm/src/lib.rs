//! Deterministic, gas-metered contract execution core.
//!
//! One [`executor::ScriptExecutor`] owns everything a transaction touches:
//! the interpreter engines, the contract context stack, the state overlay
//! and the notification buffer. Execution either halts with a result, a
//! state delta and ordered notifications, or fails with a typed error and
//! no observable effect.

#![warn(missing_docs)]

pub mod chain;
pub mod consts;
pub mod context;
pub mod crypto;
pub mod engine;
pub mod error;
pub mod event;
pub mod executor;
pub mod gas;
pub mod ident;
pub mod item;
pub mod serializer;
pub mod service;
pub mod stack;
pub mod storage;

pub mod prelude {
    //! Re-exports for typical embedders.

    pub use script_asm::{FaultReason, OpCode, ScriptBuilder};
    pub use script_types::{Address, H256};

    pub use crate::chain::{Block, DeployCode, Header, Transaction, TxAttribute, TxType};
    pub use crate::context::CallContext;
    pub use crate::engine::ExecutionEngine;
    pub use crate::error::ExecError;
    pub use crate::event::NotifyEvent;
    pub use crate::executor::{ExecConfig, Execution, ExecutionMode, ScriptExecutor};
    pub use crate::gas::GasSchedule;
    pub use crate::item::{InteropValue, StackItem};
    pub use crate::serializer::{deserialize_item, serialize_item, SerializeError};
    pub use crate::service::{
        names, NativeEnv, NativeRegistry, ServiceRegistry, StateAccess,
    };
    pub use crate::storage::{
        CacheDB, LedgerStore, MemoryStore, StorageContext, StorageItem, WriteSet,
    };
}
