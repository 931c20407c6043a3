// src/demo.rs

//! Hand-assembled programs for the driver. There is no front end in this
//! crate, so these stand in for compiled scripts.

use phf::phf_map;

use crate::error::ChunkError;
use crate::memory::Heap;
use crate::value::Value;
use crate::vm::{Chunk, OpCode};

pub type BuildFn = fn(&mut Heap) -> Result<Chunk, ChunkError>;

pub struct Demo {
    pub about: &'static str,
    pub build: BuildFn,
}

pub static DEMOS: phf::Map<&'static str, Demo> = phf_map! {
    "arithmetic" => Demo {
        about: "-((1.2 + 3.4) / 5.6)",
        build: arithmetic,
    },
    "strings" => Demo {
        about: "concatenation and interned equality",
        build: strings,
    },
    "globals" => Demo {
        about: "define, read and reassign a global",
        build: globals,
    },
    "type-error" => Demo {
        about: "negating a string (runtime error)",
        build: type_error,
    },
    "undefined" => Demo {
        about: "reading an undefined global (runtime error)",
        build: undefined,
    },
    "malformed" => Demo {
        about: "a chunk with no return (rejected before running)",
        build: malformed,
    },
};

/// Demo names in a stable order.
pub fn names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = DEMOS.keys().copied().collect();
    names.sort_unstable();
    names
}

fn arithmetic(_heap: &mut Heap) -> Result<Chunk, ChunkError> {
    let mut chunk = Chunk::new();
    chunk.write_constant(Value::number(1.2), 123)?;
    chunk.write_constant(Value::number(3.4), 123)?;
    chunk.write_op(OpCode::Add, 123)?;
    chunk.write_constant(Value::number(5.6), 123)?;
    chunk.write_op(OpCode::Divide, 123)?;
    chunk.write_op(OpCode::Negate, 123)?;
    chunk.write_op(OpCode::Return, 123)?;
    Ok(chunk)
}

fn strings(heap: &mut Heap) -> Result<Chunk, ChunkError> {
    let mut chunk = Chunk::new();
    for (i, part) in ["st", "ri", "ng"].into_iter().enumerate() {
        let part = heap.copy_string(part)?;
        chunk.write_constant(Value::object(part), 1)?;
        if i > 0 {
            chunk.write_op(OpCode::Add, 1)?;
        }
    }
    chunk.write_op(OpCode::Print, 1)?;

    let whole = heap.copy_string("string")?;
    let again = heap.take_string(["st", "ring"].concat())?;
    chunk.write_constant(Value::object(whole), 2)?;
    chunk.write_constant(Value::object(again), 2)?;
    chunk.write_op(OpCode::Equal, 2)?;
    chunk.write_op(OpCode::Return, 2)?;
    Ok(chunk)
}

fn globals(heap: &mut Heap) -> Result<Chunk, ChunkError> {
    let mut chunk = Chunk::new();
    let name = heap.copy_string("breakfast")?;
    let name = chunk.add_constant(Value::object(name))?;

    let first = heap.copy_string("beignets")?;
    chunk.write_constant(Value::object(first), 1)?;
    chunk.write_op_with_index(OpCode::DefineGlobal, name, 1)?;

    let second = heap.copy_string("beignets with cafe au lait")?;
    chunk.write_constant(Value::object(second), 2)?;
    chunk.write_op_with_index(OpCode::SetGlobal, name, 2)?;
    chunk.write_op(OpCode::Pop, 2)?;

    chunk.write_op_with_index(OpCode::GetGlobal, name, 3)?;
    chunk.write_op(OpCode::Print, 3)?;
    chunk.write_op(OpCode::Return, 4)?;
    Ok(chunk)
}

fn type_error(heap: &mut Heap) -> Result<Chunk, ChunkError> {
    let mut chunk = Chunk::new();
    let text = heap.copy_string("text")?;
    chunk.write_constant(Value::object(text), 1)?;
    chunk.write_op(OpCode::Negate, 1)?;
    chunk.write_op(OpCode::Return, 1)?;
    Ok(chunk)
}

fn undefined(heap: &mut Heap) -> Result<Chunk, ChunkError> {
    let mut chunk = Chunk::new();
    let name = heap.copy_string("lunch")?;
    let name = chunk.add_constant(Value::object(name))?;
    chunk.write_op_with_index(OpCode::GetGlobal, name, 1)?;
    chunk.write_op(OpCode::Print, 1)?;
    chunk.write_op(OpCode::Return, 2)?;
    Ok(chunk)
}

fn malformed(_heap: &mut Heap) -> Result<Chunk, ChunkError> {
    let mut chunk = Chunk::new();
    chunk.write_constant(Value::number(1.0), 1)?;
    chunk.write_op(OpCode::Print, 1)?;
    Ok(chunk)
}
