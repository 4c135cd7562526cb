use script_asm::{FaultReason, OpCode};

use super::ExecutionEngine;
use crate::crypto;
use crate::error::ExecError;
use crate::item::StackItem;

impl ExecutionEngine {
    pub(super) fn execute_crypto(&mut self, op: OpCode) -> Result<(), ExecError> {
        match op {
            OpCode::SHA1 => {
                let data = self.pop_bytes()?;
                self.push(StackItem::ByteString(crypto::sha1(&data).to_vec()));
            }
            OpCode::SHA256 => {
                let data = self.pop_bytes()?;
                self.push(StackItem::ByteString(crypto::sha256(&data).to_vec()));
            }
            OpCode::HASH160 => {
                let data = self.pop_bytes()?;
                self.push(StackItem::ByteString(crypto::hash160(&data).to_vec()));
            }
            OpCode::HASH256 => {
                let data = self.pop_bytes()?;
                self.push(StackItem::ByteString(crypto::hash256(&data).to_vec()));
            }
            OpCode::CHECKSIG => {
                let pubkey = self.pop_bytes()?;
                let signature = self.pop_bytes()?;

                // contracts branch on the outcome, so parse failures are
                // `false` here rather than faults
                let valid = crypto::verify_signature(&pubkey, &signature, self.message())
                    .unwrap_or(false);

                self.push(StackItem::Boolean(valid));
            }
            OpCode::CHECKMULTISIG => {
                let valid = self.check_multisig()?;
                self.push(StackItem::Boolean(valid));
            }
            _ => return Err(FaultReason::UnknownOpCode.into()),
        }

        Ok(())
    }

    /// `m`-of-`n` check: signatures must match public keys in key order.
    fn check_multisig(&mut self) -> Result<bool, ExecError> {
        let n = self.pop_index()?;
        if n == 0 || n > self.eval_count() {
            return Err(FaultReason::StackUnderflow.into());
        }

        let mut pubkeys = Vec::with_capacity(n);
        for _ in 0..n {
            pubkeys.push(self.pop_bytes()?);
        }

        let m = self.pop_index()?;
        if m == 0 || m > n {
            return Err(FaultReason::InvalidOperand.into());
        }

        let mut signatures = Vec::with_capacity(m);
        for _ in 0..m {
            signatures.push(self.pop_bytes()?);
        }

        let message = self.message().to_vec();
        let mut key_index = 0;

        for signature in &signatures {
            let mut matched = false;

            while key_index < pubkeys.len() {
                let candidate = &pubkeys[key_index];
                key_index += 1;

                match crypto::verify_signature(candidate, signature, &message) {
                    Ok(true) => {
                        matched = true;
                        break;
                    }
                    Ok(false) | Err(_) => continue,
                }
            }

            if !matched {
                return Ok(false);
            }
        }

        Ok(true)
    }
}
