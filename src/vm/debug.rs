// src/vm/debug.rs

//! Disassembler. Reads a chunk, never changes it, and is not on the
//! execution path except for instruction tracing.

use crate::memory::Heap;
use crate::vm::chunk::Chunk;
use crate::vm::opcode::OpCode;

/// One line per instruction, under a `== name ==` header.
pub fn disassemble_chunk(chunk: &Chunk, heap: &Heap, name: &str) -> String {
    let mut out = format!("== {} ==\n", name);
    let mut offset = 0;
    while offset < chunk.code.len() {
        let (line, next) = disassemble_instruction(chunk, heap, offset);
        out.push_str(&line);
        out.push('\n');
        offset = next;
    }
    out
}

/// Renders the instruction at `offset` and returns the offset of the next
/// one. Malformed bytes are rendered rather than rejected.
pub fn disassemble_instruction(chunk: &Chunk, heap: &Heap, offset: usize) -> (String, usize) {
    let mut text = format!("{:04} ", offset);

    if offset > 0 && chunk.lines.get(offset) == chunk.lines.get(offset - 1) {
        text.push_str("   | ");
    } else {
        text.push_str(&format!("{:>4} ", chunk.line(offset)));
    }

    let byte = chunk.code[offset];
    match OpCode::try_from(byte) {
        Ok(op) if op.takes_constant() => {
            let width = op.operand_width();
            if offset + 1 + width > chunk.code.len() {
                text.push_str(&format!("{:<16} <truncated>", op.name()));
                return (text, chunk.code.len());
            }
            let index = chunk.read_operand(offset + 1, width);
            let constant = match chunk.constants.get(index) {
                Some(value) => value.display(heap).to_string(),
                None => "<out of range>".to_string(),
            };
            text.push_str(&format!("{:<16} {:4} '{}'", op.name(), index, constant));
            (text, offset + 1 + width)
        }
        Ok(op) => {
            text.push_str(op.name());
            (text, offset + 1 + op.operand_width())
        }
        Err(byte) => {
            text.push_str(&format!("Unknown opcode {}", byte));
            (text, offset + 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_disassemble_chunk() {
        let mut heap = Heap::new();
        let mut chunk = Chunk::new();
        chunk.write_constant(Value::number(1.2), 123).unwrap();
        let name = heap.copy_string("breakfast").unwrap();
        let index = chunk.add_constant(Value::object(name)).unwrap();
        chunk.write_op_with_index(OpCode::GetGlobal, index, 123).unwrap();
        chunk.write_op(OpCode::Return, 124).unwrap();

        let listing = disassemble_chunk(&chunk, &heap, "test chunk");
        let expected = "\
== test chunk ==
0000  123 OP_CONSTANT         0 '1.2'
0002    | OP_GET_GLOBAL       1 'breakfast'
0004  124 OP_RETURN
";
        assert_eq!(listing, expected);
    }

    #[test]
    fn test_malformed_bytes_are_rendered() {
        let heap = Heap::new();
        let mut chunk = Chunk::new();
        chunk.write(0xfe, 1).unwrap();
        chunk.write_op(OpCode::Constant, 1).unwrap();

        let (first, next) = disassemble_instruction(&chunk, &heap, 0);
        assert_eq!(first, "0000    1 Unknown opcode 254");
        assert_eq!(next, 1);

        let (second, next) = disassemble_instruction(&chunk, &heap, 1);
        assert!(second.ends_with("<truncated>"));
        assert_eq!(next, 2);
    }

    #[test]
    fn test_disassembly_does_not_touch_the_chunk() {
        let heap = Heap::new();
        let mut chunk = Chunk::new();
        chunk.write_op(OpCode::Nil, 1).unwrap();
        chunk.write_op(OpCode::Return, 1).unwrap();
        let before = chunk.clone();

        disassemble_chunk(&chunk, &heap, "noop");
        assert_eq!(chunk.code, before.code);
        assert_eq!(chunk.lines, before.lines);
    }
}
