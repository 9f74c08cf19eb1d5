//! Bytecode types for the Ember compiler.
//!
//! - [`OpCode`] - the instruction set
//! - [`BytecodeChunk`] - compiled code of one function
//! - [`Constant`] and [`ConstantPool`] - unit-level constant storage

mod chunk;
mod constant;
mod opcode;

pub use chunk::BytecodeChunk;
pub use constant::{Constant, ConstantPool};
pub use opcode::OpCode;
