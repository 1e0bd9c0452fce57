//! Contains datastructures and utility functions
//! common to both the `compiler` and a bytecode executor.
//!
//! - Source code representation and span annotations.
//! - Opcodes, instructions, chunks and modules.

pub mod chunk;
pub mod opcode;
pub mod source;
pub mod span;
