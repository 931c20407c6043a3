// src/main.rs

// loxvm: runs hand-assembled bytecode on the lox virtual machine.

use std::io;
use std::process::exit;

use clap::{Parser as ClapParser, Subcommand};
use log::LevelFilter;

use lox_vm::{
    demo::{self, DEMOS},
    vm::disassemble_chunk,
    Heap, InterpretError, InterpretResult, Vm, VmConfig, STACK_MAX,
};

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log allocations, frees and table resizes.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log every instruction as it is dispatched, with the stack.
    #[arg(long, global = true)]
    trace: bool,

    /// Operand stack capacity.
    #[arg(long, global = true, default_value_t = STACK_MAX)]
    stack_max: usize,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a built-in program.
    Run { demo: String },
    /// Print the bytecode of a built-in program.
    Disasm { demo: String },
    /// List the built-in programs.
    List,
}

fn init_logging(cli: &Cli) {
    let level = if cli.trace {
        LevelFilter::Trace
    } else if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    let config = VmConfig::new().with_stack_max(cli.stack_max);
    let code = match &cli.command {
        Command::Run { demo } => run_demo(demo, config),
        Command::Disasm { demo } => disasm_demo(demo),
        Command::List => {
            for name in demo::names() {
                println!("{:<12} {}", name, DEMOS[name].about);
            }
            0
        }
    };
    exit(code);
}

fn unknown_demo(name: &str) -> i32 {
    eprintln!("Unknown program '{}'. Try `loxvm list`.", name);
    64
}

/// Builds and runs one demo, then tears the VM down whatever the outcome.
fn run_demo(name: &str, config: VmConfig) -> i32 {
    let Some(demo) = DEMOS.get(name) else {
        return unknown_demo(name);
    };

    let mut vm = Vm::with_config(config, io::stdout());
    let result = (demo.build)(vm.heap_mut())
        .map_err(InterpretError::from)
        .and_then(|chunk| vm.interpret(&chunk));

    match &result {
        Ok(()) => {
            if let Some(value) = vm.last_value() {
                println!("{}", value.display(vm.heap()));
            }
        }
        // The VM already reported runtime errors with their line.
        Err(InterpretError::Runtime { .. }) => {}
        Err(e) => eprintln!("{}", e),
    }

    vm.free();
    InterpretResult::from(&result).exit_code()
}

fn disasm_demo(name: &str) -> i32 {
    let Some(demo) = DEMOS.get(name) else {
        return unknown_demo(name);
    };

    let mut heap = Heap::new();
    match (demo.build)(&mut heap) {
        Ok(chunk) => {
            print!("{}", disassemble_chunk(&chunk, &heap, name));
            0
        }
        Err(e) => {
            eprintln!("{}", e);
            InterpretError::from(e).exit_code()
        }
    }
}
