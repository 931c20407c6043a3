// src/vm/chunk.rs

use crate::error::{ChunkError, MemoryError};
use crate::memory::grow_array;
use crate::value::Value;
use crate::vm::opcode::OpCode;

/// Largest pool index `OP_CONSTANT_LONG` can address, plus one.
pub const MAX_CONSTANTS: usize = 1 << 24;

// A chunk of bytecode: the instruction bytes, the constant pool they index
// into, and one source line per byte.
#[derive(Debug, Default, Clone)]
pub struct Chunk {
    pub code: Vec<u8>,
    pub constants: Vec<Value>,
    pub lines: Vec<usize>,
}

impl Chunk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one byte, an opcode or an operand, tagged with its line.
    pub fn write(&mut self, byte: u8, line: usize) -> Result<(), MemoryError> {
        grow_array(&mut self.code)?;
        grow_array(&mut self.lines)?;
        self.code.push(byte);
        self.lines.push(line);
        Ok(())
    }

    pub fn write_op(&mut self, op: OpCode, line: usize) -> Result<(), MemoryError> {
        self.write(op.into(), line)
    }

    /// Adds a value to the pool and returns its index.
    pub fn add_constant(&mut self, value: Value) -> Result<usize, MemoryError> {
        grow_array(&mut self.constants)?;
        self.constants.push(value);
        Ok(self.constants.len() - 1)
    }

    /// Adds `value` to the pool and emits the instruction that loads it,
    /// choosing the short or long form by index.
    pub fn write_constant(&mut self, value: Value, line: usize) -> Result<usize, ChunkError> {
        if self.constants.len() >= MAX_CONSTANTS {
            return Err(ChunkError::TooManyConstants);
        }
        let index = self.add_constant(value)?;
        match u8::try_from(index) {
            Ok(byte) => {
                self.write_op(OpCode::Constant, line)?;
                self.write(byte, line)?;
            }
            Err(_) => {
                self.write_op(OpCode::ConstantLong, line)?;
                for byte in &index.to_le_bytes()[..3] {
                    self.write(*byte, line)?;
                }
            }
        }
        Ok(index)
    }

    /// Emits an instruction with a one-byte pool index, such as a global
    /// access. Only the first 256 constants can be named this way.
    pub fn write_op_with_index(
        &mut self,
        op: OpCode,
        index: usize,
        line: usize,
    ) -> Result<(), ChunkError> {
        let byte = u8::try_from(index).map_err(|_| ChunkError::ConstantOutOfRange {
            index,
            offset: self.code.len(),
            count: self.constants.len(),
        })?;
        self.write_op(op, line)?;
        self.write(byte, line)?;
        Ok(())
    }

    /// Little-endian operand of `width` bytes starting at `offset`.
    pub fn read_operand(&self, offset: usize, width: usize) -> usize {
        self.code[offset..offset + width]
            .iter()
            .rev()
            .fold(0, |acc, &byte| (acc << 8) | byte as usize)
    }

    /// Source line of the byte at `offset`.
    pub fn line(&self, offset: usize) -> usize {
        self.lines.get(offset).copied().unwrap_or(0)
    }

    /// Checks everything the dispatch loop relies on: the line table
    /// matches the code, every opcode is known, every operand is complete
    /// and in range, and execution reaches a return.
    pub fn verify(&self) -> Result<(), ChunkError> {
        if self.code.len() != self.lines.len() {
            return Err(ChunkError::LineTableMismatch {
                code: self.code.len(),
                lines: self.lines.len(),
            });
        }

        let mut offset = 0;
        while offset < self.code.len() {
            let byte = self.code[offset];
            let op = OpCode::try_from(byte)
                .map_err(|byte| ChunkError::UnknownOpcode { byte, offset })?;

            let width = op.operand_width();
            if offset + 1 + width > self.code.len() {
                return Err(ChunkError::TruncatedOperand { offset });
            }

            if op.takes_constant() {
                let index = self.read_operand(offset + 1, width);
                let constant = self.constants.get(index).ok_or(ChunkError::ConstantOutOfRange {
                    index,
                    offset,
                    count: self.constants.len(),
                })?;
                if op.takes_name() && !constant.is_obj() {
                    return Err(ChunkError::NameNotString { offset });
                }
            }

            // Code is straight-line, so nothing after the first return runs.
            if op == OpCode::Return {
                return Ok(());
            }
            offset += 1 + width;
        }

        Err(ChunkError::MissingReturn)
    }
}
