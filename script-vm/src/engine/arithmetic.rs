use num_traits::{Signed, ToPrimitive, Zero};

use script_asm::{FaultReason, OpCode};

use super::ExecutionEngine;
use crate::consts::MAX_SHIFT;
use crate::error::ExecError;
use crate::item::{check_integer, StackItem};

impl ExecutionEngine {
    pub(super) fn execute_arithmetic(&mut self, op: OpCode) -> Result<(), ExecError> {
        match op {
            OpCode::INC | OpCode::DEC | OpCode::NEGATE | OpCode::ABS => {
                let value = self.pop_integer()?;

                let result = match op {
                    OpCode::INC => value + 1,
                    OpCode::DEC => value - 1,
                    OpCode::NEGATE => -value,
                    _ => value.abs(),
                };

                check_integer(&result)?;
                self.push(StackItem::Integer(result));
            }
            OpCode::SIGN => {
                let value = self.pop_integer()?;
                self.push(StackItem::Integer(value.signum()));
            }
            OpCode::NOT => {
                let value = self.pop_bool()?;
                self.push(StackItem::Boolean(!value));
            }
            OpCode::NZ => {
                let value = self.pop_integer()?;
                self.push(StackItem::Boolean(!value.is_zero()));
            }
            OpCode::ADD | OpCode::SUB | OpCode::MUL => {
                let b = self.pop_integer()?;
                let a = self.pop_integer()?;

                let result = match op {
                    OpCode::ADD => a + b,
                    OpCode::SUB => a - b,
                    _ => a * b,
                };

                check_integer(&result)?;
                self.push(StackItem::Integer(result));
            }
            OpCode::DIV | OpCode::MOD => {
                let b = self.pop_integer()?;
                let a = self.pop_integer()?;

                if b.is_zero() {
                    return Err(FaultReason::DivisionByZero.into());
                }

                // truncated division, remainder keeps the dividend's sign
                let result = if op == OpCode::DIV { a / b } else { a % b };
                check_integer(&result)?;
                self.push(StackItem::Integer(result));
            }
            OpCode::SHL | OpCode::SHR => {
                let shift = self.pop_integer()?;
                let value = self.pop_integer()?;

                let shift = shift
                    .to_u32()
                    .filter(|s| *s <= MAX_SHIFT)
                    .ok_or(FaultReason::ShiftOutOfRange)?;

                let result = if op == OpCode::SHL {
                    value << shift
                } else {
                    value >> shift
                };

                check_integer(&result)?;
                self.push(StackItem::Integer(result));
            }
            OpCode::BOOLAND | OpCode::BOOLOR => {
                let b = self.pop_bool()?;
                let a = self.pop_bool()?;

                let result = if op == OpCode::BOOLAND { a && b } else { a || b };
                self.push(StackItem::Boolean(result));
            }
            OpCode::NUMEQUAL
            | OpCode::NUMNOTEQUAL
            | OpCode::LT
            | OpCode::GT
            | OpCode::LTE
            | OpCode::GTE => {
                let b = self.pop_integer()?;
                let a = self.pop_integer()?;

                let result = match op {
                    OpCode::NUMEQUAL => a == b,
                    OpCode::NUMNOTEQUAL => a != b,
                    OpCode::LT => a < b,
                    OpCode::GT => a > b,
                    OpCode::LTE => a <= b,
                    _ => a >= b,
                };

                self.push(StackItem::Boolean(result));
            }
            OpCode::MIN | OpCode::MAX => {
                let b = self.pop_integer()?;
                let a = self.pop_integer()?;

                let result = if op == OpCode::MIN { a.min(b) } else { a.max(b) };
                self.push(StackItem::Integer(result));
            }
            OpCode::WITHIN => {
                let b = self.pop_integer()?;
                let a = self.pop_integer()?;
                let x = self.pop_integer()?;

                self.push(StackItem::Boolean(a <= x && x < b));
            }
            _ => return Err(FaultReason::UnknownOpCode.into()),
        }

        Ok(())
    }
}
