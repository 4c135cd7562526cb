use num_bigint::BigInt;

use script_asm::{FaultReason, OpCode};

use super::ExecutionEngine;
use crate::error::ExecError;
use crate::item::StackItem;

impl ExecutionEngine {
    pub(super) fn execute_stack_op(&mut self, op: OpCode) -> Result<(), ExecError> {
        match op {
            OpCode::DUPFROMALTSTACK => {
                let item = self.alt.peek(0)?.clone();
                self.eval.push(item);
            }
            OpCode::TOALTSTACK => {
                let item = self.eval.pop()?;
                self.alt.push(item);
            }
            OpCode::FROMALTSTACK => {
                let item = self.alt.pop()?;
                self.eval.push(item);
            }
            OpCode::XDROP => {
                let n = self.pop_index()?;
                self.eval.remove(n)?;
            }
            OpCode::XSWAP => {
                let n = self.pop_index()?;
                self.eval.swap_with_top(n)?;
            }
            OpCode::XTUCK => {
                let n = self.pop_index()?;
                let top = self.eval.peek(0)?.clone();
                self.eval.insert(n, top)?;
            }
            OpCode::DEPTH => {
                let depth = self.eval.count();
                self.eval.push(StackItem::Integer(BigInt::from(depth)));
            }
            OpCode::DROP => {
                self.eval.pop()?;
            }
            OpCode::DUP => {
                let top = self.eval.peek(0)?.clone();
                self.eval.push(top);
            }
            OpCode::NIP => {
                self.eval.remove(1)?;
            }
            OpCode::OVER => {
                let item = self.eval.peek(1)?.clone();
                self.eval.push(item);
            }
            OpCode::PICK => {
                let n = self.pop_index()?;
                let item = self.eval.peek(n)?.clone();
                self.eval.push(item);
            }
            OpCode::ROLL => {
                let n = self.pop_index()?;
                if n > 0 {
                    let item = self.eval.remove(n)?;
                    self.eval.push(item);
                }
            }
            OpCode::ROT => {
                let item = self.eval.remove(2)?;
                self.eval.push(item);
            }
            OpCode::SWAP => {
                self.eval.swap_with_top(1)?;
            }
            OpCode::TUCK => {
                let top = self.eval.peek(0)?.clone();
                self.eval.insert(2, top)?;
            }
            _ => return Err(FaultReason::UnknownOpCode.into()),
        }

        Ok(())
    }
}
