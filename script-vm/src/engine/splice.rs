use num_bigint::BigInt;

use script_asm::{FaultReason, OpCode};

use super::ExecutionEngine;
use crate::consts::MAX_BYTEARRAY_SIZE;
use crate::error::ExecError;
use crate::item::{check_integer, StackItem};

impl ExecutionEngine {
    pub(super) fn execute_splice(&mut self, op: OpCode) -> Result<(), ExecError> {
        match op {
            OpCode::CAT => {
                let tail = self.pop_bytes()?;
                let mut head = self.pop_bytes()?;

                if head.len() + tail.len() > MAX_BYTEARRAY_SIZE {
                    return Err(FaultReason::ByteStringTooLarge.into());
                }

                head.extend_from_slice(&tail);
                self.push(StackItem::ByteString(head));
            }
            OpCode::SUBSTR => {
                let count = self.pop_index()?;
                let index = self.pop_index()?;
                let data = self.pop_bytes()?;

                let end = index
                    .checked_add(count)
                    .filter(|end| *end <= data.len())
                    .ok_or(FaultReason::IndexOutOfRange)?;

                self.push(StackItem::ByteString(data[index..end].to_vec()));
            }
            OpCode::LEFT => {
                let count = self.pop_index()?;
                let data = self.pop_bytes()?;

                if count > data.len() {
                    return Err(FaultReason::IndexOutOfRange.into());
                }

                self.push(StackItem::ByteString(data[..count].to_vec()));
            }
            OpCode::RIGHT => {
                let count = self.pop_index()?;
                let data = self.pop_bytes()?;

                if count > data.len() {
                    return Err(FaultReason::IndexOutOfRange.into());
                }

                self.push(StackItem::ByteString(data[data.len() - count..].to_vec()));
            }
            OpCode::SIZE => {
                let item = self.pop()?;

                let size = match &item {
                    StackItem::Array(a) | StackItem::Struct(a) => a.len(),
                    StackItem::Map(m) => m.len(),
                    _ => item.as_bytes()?.len(),
                };

                self.push(StackItem::Integer(BigInt::from(size)));
            }
            OpCode::INVERT => {
                let value = self.pop_integer()?;
                let result = -value - 1;
                check_integer(&result)?;
                self.push(StackItem::Integer(result));
            }
            OpCode::AND | OpCode::OR | OpCode::XOR => {
                let b = self.pop_integer()?;
                let a = self.pop_integer()?;

                let result = match op {
                    OpCode::AND => a & b,
                    OpCode::OR => a | b,
                    _ => a ^ b,
                };

                check_integer(&result)?;
                self.push(StackItem::Integer(result));
            }
            OpCode::EQUAL => {
                let b = self.pop()?;
                let a = self.pop()?;
                let equal = a.equals(&b)?;
                self.push(StackItem::Boolean(equal));
            }
            _ => return Err(FaultReason::UnknownOpCode.into()),
        }

        Ok(())
    }
}
