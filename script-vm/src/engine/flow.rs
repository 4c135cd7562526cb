use std::rc::Rc;

use script_asm::{FaultReason, OpCode};

use super::{ExecutionEngine, Frame, Instruction, Operand};
use crate::error::ExecError;

impl ExecutionEngine {
    pub(super) fn execute_flow(&mut self, instr: Instruction) -> Result<(), ExecError> {
        match instr.opcode {
            OpCode::NOP => Ok(()),
            OpCode::JMP => self.jump(&instr),
            OpCode::JMPIF => {
                if self.pop_bool()? {
                    self.jump(&instr)
                } else {
                    Ok(())
                }
            }
            OpCode::JMPIFNOT => {
                if self.pop_bool()? {
                    Ok(())
                } else {
                    self.jump(&instr)
                }
            }
            OpCode::CALL => {
                let target = self.jump_target(&instr)?;
                let code = Rc::clone(&self.active_frame_mut()?.code);

                self.push_frame(Frame { code, ip: target });
                Ok(())
            }
            OpCode::RET => self.pop_frame(),
            OpCode::THROW => Err(FaultReason::Throw.into()),
            OpCode::THROWIFNOT => {
                if self.pop_bool()? {
                    Ok(())
                } else {
                    Err(FaultReason::Throw.into())
                }
            }
            _ => Err(FaultReason::UnknownOpCode.into()),
        }
    }

    fn jump(&mut self, instr: &Instruction) -> Result<(), ExecError> {
        let target = self.jump_target(instr)?;
        self.active_frame_mut()?.ip = target;
        Ok(())
    }

    /// Absolute target of a relative jump; landing exactly on the code end
    /// is a halt, anything past it is a fault.
    fn jump_target(&mut self, instr: &Instruction) -> Result<usize, ExecError> {
        let Operand::Offset(offset) = instr.operand else {
            return Err(FaultReason::InvalidOperand.into());
        };

        let len = self.active_frame_mut()?.code.len();
        let target = instr.start as i64 + offset as i64;

        if target < 0 || target > len as i64 {
            return Err(FaultReason::BadJumpOffset.into());
        }

        Ok(target as usize)
    }
}
