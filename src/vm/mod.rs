// src/vm/mod.rs

pub mod chunk;
pub mod debug;
pub mod opcode;
pub mod vm;
#[cfg(test)]
mod vm_test;

// Re-export the key structures.
pub use chunk::Chunk;
pub use debug::{disassemble_chunk, disassemble_instruction};
pub use opcode::OpCode;
pub use vm::Vm;
