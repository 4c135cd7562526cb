//! Runtime execution error taxonomy.
//!
//! Every variant aborts the transaction: the driver discards the state
//! overlay and the notification buffer, and gas already charged is not
//! refunded. A failed signature check is not an error; the opcode pushes
//! `false` instead.

use script_asm::FaultReason;
use script_types::Address;
use thiserror::Error;

use crate::serializer::SerializeError;

/// Failure of a contract execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExecError {
    /// A gas charge exceeded the remaining balance.
    #[error("insufficient gas for transaction")]
    InsufficientGas,

    /// The preview-mode step ceiling was reached.
    #[error("execution exceeded the step limit")]
    StepLimitExceeded,

    /// The predicted post-opcode stack size exceeded the limit.
    #[error("execution exceeded the max stack size")]
    StackOverflow,

    /// A nested invocation exceeded the context depth limit.
    #[error("invocation exceeded the max context depth")]
    ContextOverflow,

    /// The interpreter faulted; see [`FaultReason`].
    #[error("execution fault: {0}")]
    Fault(#[from] FaultReason),

    /// A `SYSCALL` named a service outside the registry.
    #[error("the requested service is not supported: {0}")]
    UnsupportedService(String),

    /// A writable storage operation ran on a read-only or foreign context.
    #[error("storage operation permission denied")]
    PermissionDenied,

    /// An `APPCALL` or lookup targeted an unknown contract.
    #[error("the contract does not exist: {0:x}")]
    ContractNotFound(Address),

    /// Item serialization failed; see [`SerializeError`].
    #[error("serialization failed: {0}")]
    Serialization(#[from] SerializeError),

    /// The ledger store reported a failure.
    #[error("ledger store failure: {0}")]
    Store(String),
}

impl From<core::convert::Infallible> for ExecError {
    fn from(_: core::convert::Infallible) -> Self {
        unreachable!()
    }
}

impl From<script_types::bytes::BytesError> for ExecError {
    fn from(e: script_types::bytes::BytesError) -> Self {
        match e {
            script_types::bytes::BytesError::UnexpectedEof => {
                Self::Fault(FaultReason::CodeOverflow)
            }
            script_types::bytes::BytesError::LengthOutOfBounds => {
                Self::Fault(FaultReason::InvalidOperand)
            }
        }
    }
}
