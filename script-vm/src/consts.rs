//! Consensus constants of the execution core.

/// Combined evaluation + alt stack item limit per engine.
pub const MAX_STACK_SIZE: usize = 2048;

/// Nested contract invocation limit.
pub const MAX_INVOCATION_DEPTH: usize = 1024;

/// Opcode budget for preview-mode execution.
pub const VM_STEP_LIMIT: u32 = 8_000_000;

/// Largest encoded integer, in bytes.
pub const MAX_INT_SIZE: usize = 32;

/// Largest byte-string operand or result.
pub const MAX_BYTEARRAY_SIZE: usize = 1024 * 1024;

/// Largest array, struct or map element count.
pub const MAX_ARRAY_SIZE: usize = 1024;

/// Largest contract storage key.
pub const MAX_STORAGE_KEY_SIZE: usize = 1024;

/// Largest shift amount accepted by `SHL`/`SHR`.
pub const MAX_SHIFT: u32 = 256;

/// Flat gas charged for any opcode without a schedule entry.
pub const OPCODE_GAS: u64 = 1;

/// Version byte of a stored [`crate::storage::StorageItem`] record.
pub const STORAGE_ITEM_VERSION: u8 = 0x01;
