//! Contract invocation contexts.
//!
//! One context per nested contract call. The first pushed context is the
//! entry context and survives until the transaction ends; it is visible
//! through `GetEntryAddress` even while the last frame unwinds.

use script_types::Address;

/// One entry of the contract call stack.
#[derive(Debug, Clone)]
pub struct CallContext {
    /// Address of the executing contract: the hash of its code.
    pub contract_address: Address,
    /// The contract bytecode.
    pub code: Vec<u8>,
    /// Length of the notification buffer when this context was entered;
    /// a failing invocation truncates back to it.
    pub notifications_offset: usize,
}

impl CallContext {
    /// Context for `code` executing at `contract_address`.
    pub fn new(contract_address: Address, code: Vec<u8>, notifications_offset: usize) -> Self {
        Self {
            contract_address,
            code,
            notifications_offset,
        }
    }
}
