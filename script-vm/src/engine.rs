//! Bytecode interpreter: one engine per contract invocation.
//!
//! Fetch and execute are separate steps because the driver meters gas and
//! enforces the stack bound between them, and intercepts the opcodes that
//! need host access (`VERIFY`, `SYSCALL`, `APPCALL`, `TAILCALL`).

use std::rc::Rc;

use num_bigint::BigInt;

use script_asm::{FaultReason, OpCode};
use script_types::bytes::Reader;
use script_types::Address;

use crate::consts::MAX_BYTEARRAY_SIZE;
use crate::error::ExecError;
use crate::item::StackItem;
use crate::stack::EvaluationStack;

mod arithmetic;
mod collection;
mod crypto_ops;
mod flow;
mod splice;
mod stack_ops;

/// One frame of the engine's bytecode call stack.
///
/// `CALL` pushes a frame over the same code buffer; the evaluation and alt
/// stacks stay engine-level and are shared by every frame.
#[derive(Debug, Clone)]
pub struct Frame {
    code: Rc<Vec<u8>>,
    ip: usize,
}

impl Frame {
    /// Instruction pointer; advances past every consumed operand byte.
    pub fn ip(&self) -> usize {
        self.ip
    }

    /// The code buffer this frame executes.
    pub fn code(&self) -> &[u8] {
        &self.code
    }
}

/// Inline operand decoded during fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// No inline operand.
    None,
    /// Push literal payload.
    Data(Vec<u8>),
    /// Signed jump offset relative to the instruction start.
    Offset(i16),
    /// Contract call target; all-zero means stack-supplied.
    Target(Address),
    /// Interop service name.
    Name(String),
}

/// One fetched instruction.
#[derive(Debug, Clone)]
pub struct Instruction {
    /// The opcode.
    pub opcode: OpCode,
    /// Offset of the opcode byte, the base for relative jumps.
    pub start: usize,
    /// Decoded inline operand.
    pub operand: Operand,
}

/// Interpreter state for one contract invocation.
#[derive(Debug)]
pub struct ExecutionEngine {
    pub(crate) eval: EvaluationStack,
    pub(crate) alt: EvaluationStack,
    frames: Vec<Frame>,
    current: Option<Instruction>,
    message: Vec<u8>,
}

impl ExecutionEngine {
    /// Engine over `code`; `message` is what `CHECKSIG` verifies against.
    pub fn new(code: Vec<u8>, message: Vec<u8>) -> Self {
        Self {
            eval: EvaluationStack::new(),
            alt: EvaluationStack::new(),
            frames: vec![Frame {
                code: Rc::new(code),
                ip: 0,
            }],
            current: None,
            message,
        }
    }

    /// Seed the evaluation stack; the last item becomes the top.
    pub fn with_initial_stack(mut self, items: Vec<StackItem>) -> Self {
        self.eval = EvaluationStack::with_items(items);
        self
    }

    /// `true` when there is nothing left to run: no frame, or the active
    /// frame's instruction pointer is at or past the end of its code.
    pub fn done(&self) -> bool {
        match self.frames.last() {
            Some(frame) => frame.ip >= frame.code.len(),
            None => true,
        }
    }

    /// Decode the instruction at the active frame's pointer and advance past
    /// it. The driver charges gas before the instruction is executed.
    pub fn fetch(&mut self) -> Result<OpCode, ExecError> {
        let frame = self
            .frames
            .last_mut()
            .ok_or(FaultReason::StackUnderflow)?;

        let start = frame.ip;
        let code = Rc::clone(&frame.code);
        let mut reader = Reader::new(&code[start..]);

        let opcode = OpCode::from_u8(reader.read_u8()?);

        let operand = if opcode.is_push_bytes() {
            Operand::Data(reader.read_bytes(opcode.to_u8() as usize)?.to_vec())
        } else {
            match opcode {
                OpCode::PUSHDATA1 => {
                    let len = reader.read_u8()? as usize;
                    Operand::Data(reader.read_bytes(len)?.to_vec())
                }
                OpCode::PUSHDATA2 => {
                    let len = reader.read_u16()? as usize;
                    Operand::Data(read_checked(&mut reader, len)?)
                }
                OpCode::PUSHDATA4 => {
                    let len = reader.read_u32()? as usize;
                    Operand::Data(read_checked(&mut reader, len)?)
                }
                OpCode::JMP | OpCode::JMPIF | OpCode::JMPIFNOT | OpCode::CALL => {
                    Operand::Offset(reader.read_u16()? as i16)
                }
                OpCode::SYSCALL => {
                    Operand::Name(reader.read_var_string(MAX_BYTEARRAY_SIZE)?)
                }
                OpCode::APPCALL | OpCode::TAILCALL => {
                    let target = reader.read_bytes(Address::LEN)?;
                    Operand::Target(
                        Address::try_from(target)
                            .map_err(|_| FaultReason::InvalidOperand)?,
                    )
                }
                _ => Operand::None,
            }
        };

        frame.ip = start + reader.position();
        self.current = Some(Instruction {
            opcode,
            start,
            operand,
        });

        Ok(opcode)
    }

    /// Opcode of the fetched instruction.
    pub fn current_opcode(&self) -> OpCode {
        self.current
            .as_ref()
            .map(|i| i.opcode)
            .unwrap_or(OpCode::NOP)
    }

    /// Consume the fetched instruction; fetch must have run first.
    pub fn take_instruction(&mut self) -> Result<Instruction, ExecError> {
        self.current
            .take()
            .ok_or_else(|| FaultReason::InvalidOperand.into())
    }

    /// Execute the fetched instruction.
    ///
    /// The host-mediated opcodes are dispatched by the driver and fall to
    /// the undefined-opcode fault here.
    pub fn step_into(&mut self) -> Result<(), ExecError> {
        let instr = self.take_instruction()?;
        let op = instr.opcode;

        if op.is_push_bytes() {
            return self.execute_push(instr);
        }

        match op {
            OpCode::PUSH0
            | OpCode::PUSHDATA1
            | OpCode::PUSHDATA2
            | OpCode::PUSHDATA4
            | OpCode::PUSHM1
            | OpCode::PUSH1
            | OpCode::PUSH2
            | OpCode::PUSH3
            | OpCode::PUSH4
            | OpCode::PUSH5
            | OpCode::PUSH6
            | OpCode::PUSH7
            | OpCode::PUSH8
            | OpCode::PUSH9
            | OpCode::PUSH10
            | OpCode::PUSH11
            | OpCode::PUSH12
            | OpCode::PUSH13
            | OpCode::PUSH14
            | OpCode::PUSH15
            | OpCode::PUSH16 => self.execute_push(instr),

            OpCode::NOP
            | OpCode::JMP
            | OpCode::JMPIF
            | OpCode::JMPIFNOT
            | OpCode::CALL
            | OpCode::RET
            | OpCode::THROW
            | OpCode::THROWIFNOT => self.execute_flow(instr),

            OpCode::DUPFROMALTSTACK
            | OpCode::TOALTSTACK
            | OpCode::FROMALTSTACK
            | OpCode::XDROP
            | OpCode::XSWAP
            | OpCode::XTUCK
            | OpCode::DEPTH
            | OpCode::DROP
            | OpCode::DUP
            | OpCode::NIP
            | OpCode::OVER
            | OpCode::PICK
            | OpCode::ROLL
            | OpCode::ROT
            | OpCode::SWAP
            | OpCode::TUCK => self.execute_stack_op(op),

            OpCode::CAT
            | OpCode::SUBSTR
            | OpCode::LEFT
            | OpCode::RIGHT
            | OpCode::SIZE
            | OpCode::INVERT
            | OpCode::AND
            | OpCode::OR
            | OpCode::XOR
            | OpCode::EQUAL => self.execute_splice(op),

            OpCode::INC
            | OpCode::DEC
            | OpCode::SIGN
            | OpCode::NEGATE
            | OpCode::ABS
            | OpCode::NOT
            | OpCode::NZ
            | OpCode::ADD
            | OpCode::SUB
            | OpCode::MUL
            | OpCode::DIV
            | OpCode::MOD
            | OpCode::SHL
            | OpCode::SHR
            | OpCode::BOOLAND
            | OpCode::BOOLOR
            | OpCode::NUMEQUAL
            | OpCode::NUMNOTEQUAL
            | OpCode::LT
            | OpCode::GT
            | OpCode::LTE
            | OpCode::GTE
            | OpCode::MIN
            | OpCode::MAX
            | OpCode::WITHIN => self.execute_arithmetic(op),

            OpCode::SHA1
            | OpCode::SHA256
            | OpCode::HASH160
            | OpCode::HASH256
            | OpCode::CHECKSIG
            | OpCode::CHECKMULTISIG => self.execute_crypto(op),

            OpCode::ARRAYSIZE
            | OpCode::PACK
            | OpCode::UNPACK
            | OpCode::PICKITEM
            | OpCode::SETITEM
            | OpCode::NEWARRAY
            | OpCode::NEWSTRUCT
            | OpCode::NEWMAP
            | OpCode::APPEND
            | OpCode::REVERSE
            | OpCode::REMOVE
            | OpCode::HASKEY
            | OpCode::KEYS
            | OpCode::VALUES => self.execute_collection(op),

            _ => Err(FaultReason::UnknownOpCode.into()),
        }
    }

    fn execute_push(&mut self, instr: Instruction) -> Result<(), ExecError> {
        let op = instr.opcode;

        if let Operand::Data(data) = instr.operand {
            self.eval.push(StackItem::ByteString(data));
            return Ok(());
        }

        match op {
            OpCode::PUSH0 => self.eval.push(StackItem::ByteString(Vec::new())),
            OpCode::PUSHM1 => self.eval.push(StackItem::Integer(BigInt::from(-1))),
            _ => {
                let value = op.to_u8() - OpCode::PUSH1.to_u8() + 1;
                self.eval.push(StackItem::Integer(BigInt::from(value)));
            }
        }

        Ok(())
    }

    /// Pop the current frame; `RET` and tail-call replacement use this.
    pub fn pop_frame(&mut self) -> Result<(), ExecError> {
        self.frames
            .pop()
            .map(|_| ())
            .ok_or_else(|| FaultReason::StackUnderflow.into())
    }

    /// Final value: the top of the evaluation stack, if any.
    pub fn result(&self) -> Option<StackItem> {
        self.eval.peek(0).ok().cloned()
    }

    /// Message signed by `CHECKSIG`/`CHECKMULTISIG` signatures.
    pub fn message(&self) -> &[u8] {
        &self.message
    }

    /// Evaluation stack depth.
    pub fn eval_count(&self) -> usize {
        self.eval.count()
    }

    /// Alt stack depth.
    pub fn alt_count(&self) -> usize {
        self.alt.count()
    }

    /// Reference to the item `n` back from the top of the evaluation stack.
    pub fn peek(&self, n: usize) -> Result<&StackItem, FaultReason> {
        self.eval.peek(n)
    }

    /// Push onto the evaluation stack.
    pub fn push(&mut self, item: StackItem) {
        self.eval.push(item);
    }

    /// Pop from the evaluation stack.
    pub fn pop(&mut self) -> Result<StackItem, FaultReason> {
        self.eval.pop()
    }

    /// Pop and convert to canonical bytes.
    pub fn pop_bytes(&mut self) -> Result<Vec<u8>, FaultReason> {
        self.eval.pop()?.as_bytes()
    }

    /// Pop and convert to an integer.
    pub fn pop_integer(&mut self) -> Result<BigInt, FaultReason> {
        self.eval.pop()?.as_integer()
    }

    /// Pop and convert to a boolean.
    pub fn pop_bool(&mut self) -> Result<bool, FaultReason> {
        Ok(self.eval.pop()?.as_bool())
    }

    /// Pop a non-negative index bounded by `usize`.
    pub fn pop_index(&mut self) -> Result<usize, FaultReason> {
        use num_traits::ToPrimitive;

        self.pop_integer()?
            .to_usize()
            .ok_or(FaultReason::IndexOutOfRange)
    }

    /// Pop a 20-byte address.
    pub fn pop_address(&mut self) -> Result<Address, FaultReason> {
        let bytes = self.pop_bytes()?;
        Address::try_from(bytes.as_slice()).map_err(|_| FaultReason::InvalidAddress)
    }

    /// Shared-handle copy of the evaluation stack, bottom first.
    pub fn snapshot_stack(&self) -> Vec<StackItem> {
        self.eval.clone_items()
    }

    pub(crate) fn active_frame_mut(&mut self) -> Result<&mut Frame, FaultReason> {
        self.frames.last_mut().ok_or(FaultReason::StackUnderflow)
    }

    pub(crate) fn push_frame(&mut self, frame: Frame) {
        self.frames.push(frame);
    }
}

fn read_checked(reader: &mut Reader<'_>, len: usize) -> Result<Vec<u8>, ExecError> {
    if len > MAX_BYTEARRAY_SIZE {
        return Err(FaultReason::ByteStringTooLarge.into());
    }

    Ok(reader.read_bytes(len)?.to_vec())
}
