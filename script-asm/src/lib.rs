//! Instruction set definition for the ScriptVM.
//!
//! The opcode byte values, the fault reasons and the canonical integer
//! encoding defined here are consensus-visible protocol surface.

#![warn(missing_docs)]

mod builder;
mod fault;
mod number;
mod opcode;

pub use builder::ScriptBuilder;
pub use fault::FaultReason;
pub use number::{decode_integer, encode_integer};
pub use opcode::OpCode;
