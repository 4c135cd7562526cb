use core::fmt;

macro_rules! opcodes {
    ($($name:ident = $value:expr, $doc:expr;)*) => {
        #[allow(missing_docs)]
        impl OpCode {
            $(
                #[doc = $doc]
                pub const $name: OpCode = OpCode($value);
            )*
        }

        impl OpCode {
            /// Protocol name of the opcode; push-literal bytes share `"PUSHBYTES"`.
            pub const fn name(self) -> &'static str {
                if self.is_push_bytes() {
                    return "PUSHBYTES";
                }

                match self {
                    $(Self::$name => stringify!($name),)*
                    _ => "UNKNOWN",
                }
            }

            /// `true` if the byte value maps to a defined opcode.
            pub const fn is_defined(self) -> bool {
                if self.is_push_bytes() {
                    return true;
                }

                match self {
                    $(Self::$name => true,)*
                    _ => false,
                }
            }
        }
    };
}

/// One opcode of the ScriptVM instruction set.
///
/// The instruction stream is byte-coded with inline operands, so the type is
/// a transparent wrapper over the raw byte rather than a closed enum; the
/// whole `0x01..=0x4b` range pushes its value as a literal length.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OpCode(u8);

opcodes! {
    // constants
    PUSH0 = 0x00, "Push an empty byte string (integer zero).";
    PUSHDATA1 = 0x4c, "Push bytes with a 1-byte length prefix.";
    PUSHDATA2 = 0x4d, "Push bytes with a 2-byte length prefix.";
    PUSHDATA4 = 0x4e, "Push bytes with a 4-byte length prefix.";
    PUSHM1 = 0x4f, "Push the integer -1.";
    PUSH1 = 0x51, "Push the integer 1.";
    PUSH2 = 0x52, "Push the integer 2.";
    PUSH3 = 0x53, "Push the integer 3.";
    PUSH4 = 0x54, "Push the integer 4.";
    PUSH5 = 0x55, "Push the integer 5.";
    PUSH6 = 0x56, "Push the integer 6.";
    PUSH7 = 0x57, "Push the integer 7.";
    PUSH8 = 0x58, "Push the integer 8.";
    PUSH9 = 0x59, "Push the integer 9.";
    PUSH10 = 0x5a, "Push the integer 10.";
    PUSH11 = 0x5b, "Push the integer 11.";
    PUSH12 = 0x5c, "Push the integer 12.";
    PUSH13 = 0x5d, "Push the integer 13.";
    PUSH14 = 0x5e, "Push the integer 14.";
    PUSH15 = 0x5f, "Push the integer 15.";
    PUSH16 = 0x60, "Push the integer 16.";

    // flow control
    NOP = 0x61, "No operation.";
    JMP = 0x62, "Unconditional relative jump, 2-byte signed offset.";
    JMPIF = 0x63, "Jump when the popped condition is true.";
    JMPIFNOT = 0x64, "Jump when the popped condition is false.";
    CALL = 0x65, "Push a new frame over the same code and jump.";
    RET = 0x66, "Pop the current frame.";
    APPCALL = 0x67, "Invoke another contract, 20-byte immediate target.";
    SYSCALL = 0x68, "Invoke a named interop service.";
    TAILCALL = 0x69, "Invoke another contract, replacing the current frame.";

    // stack
    DUPFROMALTSTACK = 0x6a, "Duplicate the top of the alt stack onto the evaluation stack.";
    TOALTSTACK = 0x6b, "Move the top item to the alt stack.";
    FROMALTSTACK = 0x6c, "Move the top of the alt stack back.";
    XDROP = 0x6d, "Remove the item n back.";
    XSWAP = 0x72, "Swap the top item with the item n back.";
    XTUCK = 0x73, "Copy the top item to the position n back.";
    DEPTH = 0x74, "Push the evaluation stack depth.";
    DROP = 0x75, "Remove the top item.";
    DUP = 0x76, "Duplicate the top item.";
    NIP = 0x77, "Remove the second item.";
    OVER = 0x78, "Copy the second item to the top.";
    PICK = 0x79, "Copy the item n back to the top.";
    ROLL = 0x7a, "Move the item n back to the top.";
    ROT = 0x7b, "Rotate the top three items.";
    SWAP = 0x7c, "Swap the top two items.";
    TUCK = 0x7d, "Copy the top item below the second.";

    // splice
    CAT = 0x7e, "Concatenate two byte strings.";
    SUBSTR = 0x7f, "Extract a substring by offset and length.";
    LEFT = 0x80, "Keep the leftmost n bytes.";
    RIGHT = 0x81, "Keep the rightmost n bytes.";
    SIZE = 0x82, "Byte length of the top item.";

    // bitwise
    INVERT = 0x83, "Bitwise complement of an integer.";
    AND = 0x84, "Bitwise and.";
    OR = 0x85, "Bitwise or.";
    XOR = 0x86, "Bitwise exclusive or.";
    EQUAL = 0x87, "Item equality.";

    // arithmetic
    INC = 0x8b, "Increment by one.";
    DEC = 0x8c, "Decrement by one.";
    SIGN = 0x8d, "Sign of an integer as -1, 0 or 1.";
    NEGATE = 0x8f, "Arithmetic negation.";
    ABS = 0x90, "Absolute value.";
    NOT = 0x91, "Boolean negation.";
    NZ = 0x92, "True when the integer is non-zero.";
    ADD = 0x93, "Addition.";
    SUB = 0x94, "Subtraction.";
    MUL = 0x95, "Multiplication.";
    DIV = 0x96, "Truncated division.";
    MOD = 0x97, "Truncated remainder.";
    SHL = 0x98, "Left shift.";
    SHR = 0x99, "Right shift.";
    BOOLAND = 0x9a, "Boolean conjunction.";
    BOOLOR = 0x9b, "Boolean disjunction.";
    NUMEQUAL = 0x9c, "Numeric equality.";
    NUMNOTEQUAL = 0x9e, "Numeric inequality.";
    LT = 0x9f, "Less than.";
    GT = 0xa0, "Greater than.";
    LTE = 0xa1, "Less than or equal.";
    GTE = 0xa2, "Greater than or equal.";
    MIN = 0xa3, "Minimum of two integers.";
    MAX = 0xa4, "Maximum of two integers.";
    WITHIN = 0xa5, "True when a <= x < b.";

    // crypto
    SHA1 = 0xa7, "SHA-1 digest.";
    SHA256 = 0xa8, "SHA-256 digest.";
    HASH160 = 0xa9, "RIPEMD-160 over SHA-256.";
    HASH256 = 0xaa, "Double SHA-256.";
    CHECKSIG = 0xac, "Verify a signature over the code container.";
    VERIFY = 0xad, "Verify a signature over explicit data.";
    CHECKMULTISIG = 0xae, "Verify m-of-n signatures over the code container.";

    // collections
    ARRAYSIZE = 0xc0, "Element count or byte length of the top item.";
    PACK = 0xc1, "Collect n items into an array.";
    UNPACK = 0xc2, "Spread an array onto the stack, count on top.";
    PICKITEM = 0xc3, "Read a collection element.";
    SETITEM = 0xc4, "Write a collection element.";
    NEWARRAY = 0xc5, "New array of n false items.";
    NEWSTRUCT = 0xc6, "New struct of n false items.";
    NEWMAP = 0xc7, "New empty map.";
    APPEND = 0xc8, "Append an item to an array or struct.";
    REVERSE = 0xc9, "Reverse an array in place.";
    REMOVE = 0xca, "Remove a collection element.";
    HASKEY = 0xcb, "True when the collection contains the key.";
    KEYS = 0xcc, "Array of the map keys.";
    VALUES = 0xcd, "Array of the collection values.";

    // exceptions
    THROW = 0xf0, "Abort execution.";
    THROWIFNOT = 0xf1, "Abort execution when the popped condition is false.";
}

impl OpCode {
    /// First byte of the literal push range.
    pub const PUSHBYTES1: OpCode = OpCode(0x01);

    /// Last byte of the literal push range; the opcode value is the length.
    pub const PUSHBYTES75: OpCode = OpCode(0x4b);

    /// `true` for the `PUSHBYTES1..=PUSHBYTES75` literal range.
    pub const fn is_push_bytes(self) -> bool {
        self.0 >= Self::PUSHBYTES1.0 && self.0 <= Self::PUSHBYTES75.0
    }

    /// `true` for every opcode up to `PUSH16`, all of which only push.
    pub const fn is_push(self) -> bool {
        self.0 <= Self::PUSH16.0
    }

    /// Raw byte value.
    pub const fn to_u8(self) -> u8 {
        self.0
    }

    /// Wrap a raw byte value; undefined values fault at execution time.
    pub const fn from_u8(value: u8) -> Self {
        Self(value)
    }
}

impl From<u8> for OpCode {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl From<OpCode> for u8 {
    fn from(op: OpCode) -> u8 {
        op.0
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_push_bytes() {
            write!(f, "PUSHBYTES{}", self.0)
        } else {
            write!(f, "{}", self.name())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_case::test_case;

    #[test_case(0x00 => true; "push0")]
    #[test_case(0x4b => true; "pushbytes75")]
    #[test_case(0x50 => false; "hole below push1")]
    #[test_case(0x93 => true; "add")]
    #[test_case(0xf1 => true; "throwifnot")]
    #[test_case(0xff => false; "undefined")]
    fn defined(value: u8) -> bool {
        OpCode::from_u8(value).is_defined()
    }

    #[test]
    fn names() {
        assert_eq!(OpCode::ADD.name(), "ADD");
        assert_eq!(OpCode::from_u8(0x20).name(), "PUSHBYTES");
        assert_eq!(OpCode::from_u8(0x20).to_string(), "PUSHBYTES32");
    }

    #[test]
    fn push_classification() {
        assert!(OpCode::PUSH16.is_push());
        assert!(OpCode::PUSHDATA4.is_push());
        assert!(!OpCode::NOP.is_push());
        assert!(!OpCode::PUSH0.is_push_bytes());
    }
}
