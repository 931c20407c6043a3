// src/vm/vm.rs

use std::io::{self, Write};

use log::{debug, log_enabled, trace, Level};

use crate::config::VmConfig;
use crate::error::{InterpretError, MemoryError};
use crate::memory::Heap;
use crate::object::{hash_string, ObjRef};
use crate::table::Table;
use crate::value::{values_equal, Value};
use crate::vm::chunk::Chunk;
use crate::vm::debug::disassemble_instruction;
use crate::vm::opcode::OpCode;

/// Why a single instruction stopped the run. The line is attached by the
/// dispatch loop, which knows where the instruction started.
#[derive(Debug)]
enum Fault {
    Runtime(String),
    Memory(MemoryError),
}

impl From<MemoryError> for Fault {
    fn from(e: MemoryError) -> Self {
        Fault::Memory(e)
    }
}

enum Flow {
    Continue,
    Return,
}

/// The virtual machine. One instance is one independent interpreter: it
/// owns its operand stack, globals, and the heap with the string intern
/// table and object registry. Tearing down the heap frees everything any
/// run allocated.
pub struct Vm<W: Write = io::Stdout> {
    ip: usize,
    stack: Vec<Value>,
    config: VmConfig,
    globals: Table,
    heap: Heap,
    last_value: Option<Value>,
    out: W,
}

impl Vm<io::Stdout> {
    pub fn new() -> Self {
        Vm::with_config(VmConfig::default(), io::stdout())
    }
}

impl Default for Vm<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Vm<W> {
    /// A VM with default limits that prints to `out`.
    pub fn with_output(out: W) -> Self {
        Vm::with_config(VmConfig::default(), out)
    }

    pub fn with_config(config: VmConfig, out: W) -> Self {
        Vm {
            ip: 0,
            stack: Vec::with_capacity(config.stack_max),
            config,
            globals: Table::new(),
            heap: Heap::new(),
            last_value: None,
            out,
        }
    }

    /// Runs `chunk` from its first byte until `OP_RETURN` or an error.
    /// Objects the chunk's constants refer to must live in this VM's heap.
    pub fn interpret(&mut self, chunk: &Chunk) -> Result<(), InterpretError> {
        self.ip = 0;
        self.reset_stack();
        self.last_value = None;

        chunk.verify()?;
        let result = self.run(chunk);
        debug!(
            "run finished: {:?}, {} objects live",
            result.as_ref().map(|_| ()),
            self.heap.stats().live_objects()
        );
        result
    }

    /// Releases the globals and every object allocated so far. The VM can
    /// be used again afterwards; earlier handles are dead.
    pub fn free(&mut self) {
        self.reset_stack();
        self.last_value = None;
        self.globals.free();
        self.heap.free_objects();
        debug!("vm freed: {:?}", self.heap.stats());
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    pub fn config(&self) -> VmConfig {
        self.config
    }

    /// The live portion of the operand stack, bottom first.
    pub fn stack(&self) -> &[Value] {
        &self.stack
    }

    /// Value popped by the last `OP_RETURN`, if the stack held one.
    pub fn last_value(&self) -> Option<Value> {
        self.last_value
    }

    /// Looks up a global by name without running any code.
    pub fn global(&self, name: &str) -> Option<Value> {
        let hash = hash_string(name.as_bytes());
        let key = self.heap.find_interned(name, hash)?;
        self.globals.get(key, hash)
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    fn reset_stack(&mut self) {
        self.stack.clear();
    }

    fn run(&mut self, chunk: &Chunk) -> Result<(), InterpretError> {
        loop {
            if log_enabled!(Level::Trace) {
                let (instruction, _) = disassemble_instruction(chunk, &self.heap, self.ip);
                let stack: Vec<String> = self
                    .stack
                    .iter()
                    .map(|v| format!("[ {} ]", v.display(&self.heap)))
                    .collect();
                trace!("{:<40} {}", instruction, stack.concat());
            }

            let start = self.ip;
            match self.step(chunk) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Return) => return Ok(()),
                Err(Fault::Runtime(message)) => {
                    return Err(self.runtime_error(message, chunk.line(start)));
                }
                Err(Fault::Memory(e)) => {
                    self.reset_stack();
                    return Err(e.into());
                }
            }
        }
    }

    /// Fetches, decodes and executes one instruction.
    fn step(&mut self, chunk: &Chunk) -> Result<Flow, Fault> {
        let byte = self.read_byte(chunk);
        let op = OpCode::try_from(byte)
            .map_err(|byte| Fault::Runtime(format!("Unknown opcode {}.", byte)))?;

        match op {
            OpCode::Constant => {
                let constant = self.read_constant(chunk, 1);
                self.push(constant)?;
            }
            OpCode::ConstantLong => {
                let constant = self.read_constant(chunk, 3);
                self.push(constant)?;
            }
            OpCode::Nil => self.push(Value::NIL)?,
            OpCode::True => self.push(Value::TRUE)?,
            OpCode::False => self.push(Value::FALSE)?,
            OpCode::Pop => {
                self.pop()?;
            }
            OpCode::GetGlobal => {
                let (name, hash) = self.read_name(chunk)?;
                match self.globals.get(name, hash) {
                    Some(value) => self.push(value)?,
                    None => return Err(self.undefined_variable(name)),
                }
            }
            OpCode::DefineGlobal => {
                let (name, hash) = self.read_name(chunk)?;
                let value = self.peek(0)?;
                self.globals.set(name, hash, value)?;
                self.pop()?;
            }
            OpCode::SetGlobal => {
                let (name, hash) = self.read_name(chunk)?;
                let value = self.peek(0)?;
                if self.globals.set(name, hash, value)? {
                    self.globals.delete(name, hash);
                    return Err(self.undefined_variable(name));
                }
            }
            OpCode::Equal => {
                let b = self.pop()?;
                let a = self.pop()?;
                self.push(Value::boolean(values_equal(a, b)))?;
            }
            OpCode::Greater => self.binary_op(|a, b| Value::boolean(a > b))?,
            OpCode::Less => self.binary_op(|a, b| Value::boolean(a < b))?,
            OpCode::Add => self.add()?,
            OpCode::Subtract => self.binary_op(|a, b| Value::number(a - b))?,
            OpCode::Multiply => self.binary_op(|a, b| Value::number(a * b))?,
            OpCode::Divide => self.binary_op(|a, b| Value::number(a / b))?,
            OpCode::Not => {
                let value = self.pop()?;
                self.push(Value::boolean(value.is_falsey()))?;
            }
            OpCode::Negate => {
                if !self.peek(0)?.is_number() {
                    return Err(Fault::Runtime("Operand must be a number.".to_string()));
                }
                let value = self.pop()?.as_number();
                self.push(Value::number(-value))?;
            }
            OpCode::Print => {
                let value = self.pop()?;
                writeln!(self.out, "{}", value.display(&self.heap))
                    .map_err(|e| Fault::Runtime(format!("Could not write output: {}.", e)))?;
            }
            OpCode::Return => {
                self.last_value = self.stack.pop();
                return Ok(Flow::Return);
            }
        }

        Ok(Flow::Continue)
    }

    fn push(&mut self, value: Value) -> Result<(), Fault> {
        if self.stack.len() >= self.config.stack_max {
            return Err(Fault::Runtime("Stack overflow.".to_string()));
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self) -> Result<Value, Fault> {
        self.stack
            .pop()
            .ok_or_else(|| Fault::Runtime("Stack underflow.".to_string()))
    }

    fn peek(&self, distance: usize) -> Result<Value, Fault> {
        self.stack
            .len()
            .checked_sub(1 + distance)
            .map(|index| self.stack[index])
            .ok_or_else(|| Fault::Runtime("Stack underflow.".to_string()))
    }

    fn read_byte(&mut self, chunk: &Chunk) -> u8 {
        let byte = chunk.code[self.ip];
        self.ip += 1;
        byte
    }

    fn read_constant(&mut self, chunk: &Chunk, width: usize) -> Value {
        let index = chunk.read_operand(self.ip, width);
        self.ip += width;
        chunk.constants[index]
    }

    /// Reads a global's name operand and resolves its hash.
    fn read_name(&mut self, chunk: &Chunk) -> Result<(ObjRef, u32), Fault> {
        let constant = self.read_constant(chunk, 1);
        let name = self
            .heap
            .as_string(constant)
            .ok_or_else(|| Fault::Runtime("Global name must be a string.".to_string()))?;
        Ok((constant.as_obj(), name.hash()))
    }

    /// Numeric binary operators. `a` was pushed before `b`.
    fn binary_op(&mut self, op: impl FnOnce(f64, f64) -> Value) -> Result<(), Fault> {
        let b = self.peek(0)?;
        let a = self.peek(1)?;
        if !a.is_number() || !b.is_number() {
            return Err(Fault::Runtime("Operands must be numbers.".to_string()));
        }
        self.pop()?;
        self.pop()?;
        self.push(op(a.as_number(), b.as_number()))
    }

    fn add(&mut self) -> Result<(), Fault> {
        let b = self.peek(0)?;
        let a = self.peek(1)?;
        if a.is_number() && b.is_number() {
            return self.binary_op(|a, b| Value::number(a + b));
        }

        let joined = match (self.heap.as_string(a), self.heap.as_string(b)) {
            (Some(a), Some(b)) => [a.as_str(), b.as_str()].concat(),
            _ => {
                return Err(Fault::Runtime(
                    "Operands must be two numbers or two strings.".to_string(),
                ))
            }
        };
        let result = self.heap.take_string(joined)?;
        self.pop()?;
        self.pop()?;
        self.push(Value::object(result))
    }

    fn undefined_variable(&self, name: ObjRef) -> Fault {
        let name = self.heap.string(name).map(|s| s.as_str()).unwrap_or("?");
        Fault::Runtime(format!("Undefined variable '{}'.", name))
    }

    /// Prints the diagnostic, resets the stack and builds the error.
    fn runtime_error(&mut self, message: String, line: usize) -> InterpretError {
        eprintln!("{}", message);
        eprintln!("[line {}] in script", line);
        self.reset_stack();
        InterpretError::Runtime { message, line }
    }
}
