//! Deterministic gas schedule.
//!
//! Costs are keyed by opcode and service name in one namespace; the numeric
//! values are consensus constants. Anything without an entry costs the flat
//! [`OPCODE_GAS`].

use std::collections::BTreeMap;

use crate::consts::OPCODE_GAS;
use crate::engine::ExecutionEngine;
use crate::error::ExecError;
use crate::service::names;

/// Gas added to a contract deploy per started KiB of code.
pub const DEPLOY_CODE_KIB_GAS: u64 = 200_000;

/// Name-keyed cost table.
#[derive(Debug, Clone)]
pub struct GasSchedule {
    table: BTreeMap<&'static str, u64>,
}

impl Default for GasSchedule {
    fn default() -> Self {
        let table = BTreeMap::from([
            ("APPCALL", 10),
            ("TAILCALL", 10),
            ("SHA1", 10),
            ("SHA256", 10),
            ("HASH160", 20),
            ("HASH256", 20),
            ("CHECKSIG", 100),
            ("CHECKMULTISIG", 100),
            (names::BLOCKCHAIN_GET_HEADER, 100),
            (names::BLOCKCHAIN_GET_BLOCK, 200),
            (names::BLOCKCHAIN_GET_TRANSACTION, 100),
            (names::BLOCKCHAIN_GET_CONTRACT, 100),
            (names::CONTRACT_CREATE, 20_000_000),
            (names::CONTRACT_MIGRATE, 20_000_000),
            (names::NATIVE_INVOKE, 1_000),
            (names::STORAGE_GET, 200),
            (names::STORAGE_PUT, 4_000),
            (names::STORAGE_DELETE, 100),
            (names::RUNTIME_CHECK_WITNESS, 200),
        ]);

        Self { table }
    }
}

impl GasSchedule {
    /// Price of one opcode or service by name.
    ///
    /// `Storage.Put` scales with the started KiB of key plus value, and
    /// contract deployment with the started KiB of code; both inspect the
    /// operands already on the stack.
    pub fn price(&self, engine: &ExecutionEngine, name: &str) -> Result<u64, ExecError> {
        match name {
            names::STORAGE_PUT => {
                let value = engine.peek(0)?.as_bytes()?;
                let key = engine.peek(1)?.as_bytes()?;

                Ok(self.flat(name) * kib_units(key.len() + value.len()))
            }
            names::CONTRACT_CREATE | names::CONTRACT_MIGRATE => {
                let code = engine.peek(0)?.as_bytes()?;

                Ok(self.flat(name) + DEPLOY_CODE_KIB_GAS * kib_units(code.len()))
            }
            _ => Ok(self.flat(name)),
        }
    }

    fn flat(&self, name: &str) -> u64 {
        self.table.get(name).copied().unwrap_or(OPCODE_GAS)
    }
}

/// Started-KiB count, at least one.
fn kib_units(len: usize) -> u64 {
    (len.saturating_sub(1) / 1024 + 1) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::item::StackItem;

    #[test]
    fn default_is_flat_opcode_gas() {
        let schedule = GasSchedule::default();
        let engine = ExecutionEngine::new(vec![0x61], Vec::new());

        assert_eq!(schedule.price(&engine, "NOP").unwrap(), OPCODE_GAS);
        assert_eq!(schedule.price(&engine, "APPCALL").unwrap(), 10);
    }

    #[test]
    fn storage_put_scales_with_payload() {
        let schedule = GasSchedule::default();

        let mut engine = ExecutionEngine::new(vec![0x61], Vec::new());
        engine.push(StackItem::from(0i64)); // context placeholder
        engine.push(StackItem::from(vec![0u8; 100])); // key
        engine.push(StackItem::from(vec![0u8; 2000])); // value

        assert_eq!(
            schedule.price(&engine, names::STORAGE_PUT).unwrap(),
            4_000 * 3
        );
    }

    #[test]
    fn deploy_price_includes_code_size() {
        let schedule = GasSchedule::default();

        let mut engine = ExecutionEngine::new(vec![0x61], Vec::new());
        engine.push(StackItem::from(vec![0u8; 1025]));

        assert_eq!(
            schedule.price(&engine, names::CONTRACT_CREATE).unwrap(),
            20_000_000 + 2 * DEPLOY_CODE_KIB_GAS
        );
    }
}
