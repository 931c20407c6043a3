// src/error.rs

use thiserror::Error;

/// The host refused to hand out the memory a buffer asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("out of memory: could not reserve {requested} bytes")]
    OutOfMemory { requested: usize },
}

/// A chunk that cannot be executed as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkError {
    #[error("unknown opcode {byte} at offset {offset}")]
    UnknownOpcode { byte: u8, offset: usize },
    #[error("instruction at offset {offset} is missing its operand")]
    TruncatedOperand { offset: usize },
    #[error("constant {index} at offset {offset} is out of range (pool holds {count})")]
    ConstantOutOfRange {
        index: usize,
        offset: usize,
        count: usize,
    },
    #[error("global name at offset {offset} is not a string constant")]
    NameNotString { offset: usize },
    #[error("line table has {lines} entries for {code} bytes of code")]
    LineTableMismatch { code: usize, lines: usize },
    #[error("chunk never reaches a return instruction")]
    MissingReturn,
    #[error("too many constants in one chunk")]
    TooManyConstants,
    #[error(transparent)]
    Memory(#[from] MemoryError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterpretError {
    #[error("compile error: {0}")]
    Compile(#[from] ChunkError),
    #[error("{message}\n[line {line}] in script")]
    Runtime { message: String, line: usize },
    #[error(transparent)]
    Memory(#[from] MemoryError),
}

impl InterpretError {
    /// Conventional process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        InterpretResult::from(self).exit_code()
    }
}

/// The status an `interpret` call ends with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpretResult {
    Ok,
    CompileError,
    RuntimeError,
}

impl InterpretResult {
    pub fn exit_code(self) -> i32 {
        match self {
            InterpretResult::Ok => 0,
            InterpretResult::CompileError => 65,
            InterpretResult::RuntimeError => 70,
        }
    }
}

impl From<&InterpretError> for InterpretResult {
    fn from(error: &InterpretError) -> Self {
        match error {
            InterpretError::Compile(_) => InterpretResult::CompileError,
            InterpretError::Runtime { .. } | InterpretError::Memory(_) => {
                InterpretResult::RuntimeError
            }
        }
    }
}

impl<T> From<&Result<T, InterpretError>> for InterpretResult {
    fn from(result: &Result<T, InterpretError>) -> Self {
        match result {
            Ok(_) => InterpretResult::Ok,
            Err(e) => InterpretResult::from(e),
        }
    }
}
