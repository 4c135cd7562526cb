use core::{convert, fmt};

/// Protocol-level fault reason raised by the interpreter.
///
/// Any of these aborts the executing transaction; the numeric values are
/// stable identifiers shared with execution receipts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum FaultReason {
    /// The opcode byte is not part of the instruction set.
    UnknownOpCode = 0x01,
    /// An inline operand extends past the end of the code.
    CodeOverflow = 0x02,
    /// A jump target lies outside the code.
    BadJumpOffset = 0x03,
    /// An operation required more stack items than present.
    StackUnderflow = 0x04,
    /// An operand had an unexpected item type.
    TypeMismatch = 0x05,
    /// Division or remainder by zero.
    DivisionByZero = 0x06,
    /// An integer result exceeds the 32-byte encoding limit.
    IntegerOverflow = 0x07,
    /// A shift amount lies outside `0..=256`.
    ShiftOutOfRange = 0x08,
    /// A collection index lies outside the collection.
    IndexOutOfRange = 0x09,
    /// A map key is not an integer, byte string or boolean.
    InvalidMapKey = 0x0a,
    /// An array or struct exceeds the element-count limit.
    ArrayTooLarge = 0x0b,
    /// A byte string exceeds the operand size limit.
    ByteStringTooLarge = 0x0c,
    /// A container traversal revisited a node.
    CyclicReference = 0x0d,
    /// A value failed to parse as a 20-byte address.
    InvalidAddress = 0x0e,
    /// A value failed to parse as a public key.
    InvalidPublicKey = 0x0f,
    /// An invocation was attempted with empty code.
    EmptyCode = 0x10,
    /// An inline operand is malformed.
    InvalidOperand = 0x11,
    /// A `THROW` or failed `THROWIFNOT` was executed.
    Throw = 0x12,
}

impl fmt::Display for FaultReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for FaultReason {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

impl From<convert::Infallible> for FaultReason {
    fn from(_i: convert::Infallible) -> Self {
        unreachable!()
    }
}
