// src/vm/vm_test.rs

use crate::config::VmConfig;
use crate::error::{ChunkError, InterpretError};
use crate::value::Value;
use crate::vm::{Chunk, OpCode, Vm};

/// Pushes `numbers`, applies `ops`, and returns the top of the stack.
fn numeric_chunk(numbers: &[f64], ops: &[OpCode]) -> Chunk {
    let mut chunk = Chunk::new();
    for &n in numbers {
        chunk.write_constant(Value::number(n), 1).unwrap();
    }
    for &op in ops {
        chunk.write_op(op, 2).unwrap();
    }
    chunk.write_op(OpCode::Return, 3).unwrap();
    chunk
}

fn eval(numbers: &[f64], ops: &[OpCode]) -> Result<Option<Value>, InterpretError> {
    let mut vm = Vm::with_output(Vec::new());
    vm.interpret(&numeric_chunk(numbers, ops))?;
    Ok(vm.last_value())
}

#[test]
fn test_vm_simple_expressions() {
    use OpCode::*;

    assert_eq!(eval(&[1.0], &[]), Ok(Some(Value::number(1.0))));
    assert_eq!(
        eval(&[4.0, 1.0, 2.0], &[Add, Subtract]),
        Ok(Some(Value::number(1.0)))
    );
    assert_eq!(
        eval(&[10.0, 2.0, 2.5], &[Multiply, Divide]),
        Ok(Some(Value::number(2.0)))
    );
}

#[test]
fn test_vm_division_follows_ieee() {
    use OpCode::*;

    assert_eq!(
        eval(&[1.0, 0.0], &[Divide]),
        Ok(Some(Value::number(f64::INFINITY)))
    );
    let nan = eval(&[0.0, 0.0], &[Divide]).unwrap().unwrap();
    assert!(nan.as_number().is_nan());
}

#[test]
fn test_vm_stack_discipline() {
    // Three pushes, one pop: the return pops one more.
    let mut vm = Vm::with_output(Vec::new());
    vm.interpret(&numeric_chunk(&[1.0, 2.0, 3.0], &[OpCode::Pop]))
        .unwrap();
    assert_eq!(vm.last_value(), Some(Value::number(2.0)));
    assert_eq!(vm.stack(), &[Value::number(1.0)]);
}

#[test]
fn test_vm_underflow_is_an_error() {
    assert_eq!(
        eval(&[], &[OpCode::Pop]),
        Err(InterpretError::Runtime {
            message: "Stack underflow.".to_string(),
            line: 2,
        })
    );
    assert!(eval(&[1.0], &[OpCode::Add]).is_err());
}

#[test]
fn test_vm_stack_overflow_is_an_error() {
    let mut vm = Vm::with_config(VmConfig::new().with_stack_max(4), Vec::new());
    let mut chunk = Chunk::new();
    for _ in 0..5 {
        chunk.write_op(OpCode::Nil, 9).unwrap();
    }
    chunk.write_op(OpCode::Return, 9).unwrap();

    let result = vm.interpret(&chunk);
    assert_eq!(
        result,
        Err(InterpretError::Runtime {
            message: "Stack overflow.".to_string(),
            line: 9,
        })
    );
    assert!(vm.stack().is_empty());
}

#[test]
fn test_vm_rejects_malformed_chunk() {
    let mut vm = Vm::with_output(Vec::new());
    let mut chunk = Chunk::new();
    chunk.write_op(OpCode::Nil, 1).unwrap();

    assert_eq!(
        vm.interpret(&chunk),
        Err(InterpretError::Compile(ChunkError::MissingReturn))
    );
}

#[test]
fn test_vm_compile_error_clears_previous_run() {
    let mut vm = Vm::with_output(Vec::new());
    vm.interpret(&numeric_chunk(&[7.0, 42.0], &[])).unwrap();
    assert_eq!(vm.last_value(), Some(Value::number(42.0)));
    assert_eq!(vm.stack().len(), 1);

    let mut malformed = Chunk::new();
    malformed.write_constant(Value::number(1.0), 1).unwrap();
    malformed.write_op(OpCode::Print, 1).unwrap();

    assert_eq!(
        vm.interpret(&malformed),
        Err(InterpretError::Compile(ChunkError::MissingReturn))
    );
    assert_eq!(vm.last_value(), None);
    assert!(vm.stack().is_empty());
}
