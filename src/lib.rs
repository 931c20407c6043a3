// src/lib.rs

// --- Module Declarations ---
pub mod config;
pub mod demo;
pub mod error;
pub mod memory;
pub mod object;
pub mod table;
pub mod value;
pub mod vm;

// --- Public API Re-exports ---
pub use config::{VmConfig, STACK_MAX};
pub use error::{ChunkError, InterpretError, InterpretResult, MemoryError};
pub use memory::{Heap, HeapStats};
pub use object::{ObjRef, ObjString};
pub use table::Table;
pub use value::{values_equal, Value, ValueKind};
pub use vm::{Chunk, OpCode, Vm};
