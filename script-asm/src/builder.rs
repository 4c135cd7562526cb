use num_bigint::BigInt;
use num_traits::ToPrimitive;

use script_types::Address;

use crate::{encode_integer, OpCode};

/// Incremental assembler for ScriptVM bytecode.
///
/// Integers and byte strings are emitted with their shortest push encoding,
/// matching what on-chain compilers produce.
#[derive(Debug, Default, Clone)]
pub struct ScriptBuilder {
    code: Vec<u8>,
}

impl ScriptBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a bare opcode.
    pub fn emit(&mut self, op: OpCode) -> &mut Self {
        self.code.push(op.to_u8());
        self
    }

    /// Append an integer with its shortest push encoding.
    pub fn push_integer(&mut self, value: &BigInt) -> &mut Self {
        if let Some(small) = value.to_i64() {
            if small == -1 {
                return self.emit(OpCode::PUSHM1);
            }

            if small == 0 {
                return self.emit(OpCode::PUSH0);
            }

            if (1..=16).contains(&small) {
                self.code.push(OpCode::PUSH1.to_u8() + (small - 1) as u8);
                return self;
            }
        }

        self.push_bytes(&encode_integer(value))
    }

    /// Append a small integer; see [`ScriptBuilder::push_integer`].
    pub fn push_i64(&mut self, value: i64) -> &mut Self {
        self.push_integer(&BigInt::from(value))
    }

    /// Append a boolean literal.
    pub fn push_bool(&mut self, value: bool) -> &mut Self {
        if value {
            self.emit(OpCode::PUSH1)
        } else {
            self.emit(OpCode::PUSH0)
        }
    }

    /// Append a byte-string literal with its shortest push encoding.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        let len = bytes.len();

        if len == 0 {
            return self.emit(OpCode::PUSH0);
        }

        if len <= OpCode::PUSHBYTES75.to_u8() as usize {
            self.code.push(len as u8);
        } else if len <= u8::MAX as usize {
            self.emit(OpCode::PUSHDATA1);
            self.code.push(len as u8);
        } else if len <= u16::MAX as usize {
            self.emit(OpCode::PUSHDATA2);
            self.code.extend_from_slice(&(len as u16).to_le_bytes());
        } else {
            self.emit(OpCode::PUSHDATA4);
            self.code.extend_from_slice(&(len as u32).to_le_bytes());
        }

        self.code.extend_from_slice(bytes);
        self
    }

    /// Append a jump-family opcode with its relative 2-byte offset.
    ///
    /// The offset is relative to the first byte of the jump instruction.
    pub fn emit_jump(&mut self, op: OpCode, offset: i16) -> &mut Self {
        debug_assert!(matches!(
            op,
            OpCode::JMP | OpCode::JMPIF | OpCode::JMPIFNOT | OpCode::CALL
        ));

        self.emit(op);
        self.code.extend_from_slice(&offset.to_le_bytes());
        self
    }

    /// Append a `SYSCALL` with its length-prefixed service name.
    pub fn emit_syscall(&mut self, name: &str) -> &mut Self {
        self.emit(OpCode::SYSCALL);
        script_types::bytes::write_var_string(&mut self.code, name);
        self
    }

    /// Append an `APPCALL`; `None` makes the target come from the stack.
    pub fn emit_appcall(&mut self, target: Option<&Address>) -> &mut Self {
        self.emit_call_target(OpCode::APPCALL, target)
    }

    /// Append a `TAILCALL`; `None` makes the target come from the stack.
    pub fn emit_tailcall(&mut self, target: Option<&Address>) -> &mut Self {
        self.emit_call_target(OpCode::TAILCALL, target)
    }

    fn emit_call_target(&mut self, op: OpCode, target: Option<&Address>) -> &mut Self {
        self.emit(op);

        match target {
            Some(addr) => self.code.extend_from_slice(addr.as_ref()),
            None => self.code.extend_from_slice(&[0u8; Address::LEN]),
        }

        self
    }

    /// Bytes assembled so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.code
    }

    /// Finish the script.
    pub fn build(self) -> Vec<u8> {
        self.code
    }
}
