//! SimpleLang: a small statically typed imperative language, compiled to a
//! three-address IR, lowered to stack bytecode and run on a VM.
//!
//! ```text
//! source -> tokenize -> parse -> check -> lower -> compile -> Vm::run -> i64
//! ```
//!
//! Each stage is exposed on its own; [`compile_and_run`] strings them together.

pub mod bytecode;
pub mod error;
pub mod frontend;
pub mod ir;
pub mod lang;
pub mod runtime;
pub mod sema;

pub use bytecode::BytecodeProgram;
pub use error::Error;
pub use runtime::VmConfig;

use crate::bytecode::CodeGenerator;
use crate::frontend::{Lexer, Parser, Spanned};
use crate::ir::{Instr, IrGenerator};
use crate::lang::Program;
use crate::runtime::Vm;
use crate::sema::TypeChecker;

pub fn tokenize(source: &str) -> Result<Vec<Spanned>, Error> {
    Ok(Lexer::new(source).tokenize()?)
}

pub fn parse(source: &str) -> Result<Program, Error> {
    let tokens = tokenize(source)?;
    Ok(Parser::new(tokens).parse()?)
}

/// Parses and type checks `source`.
pub fn check(source: &str) -> Result<Program, Error> {
    let program = parse(source)?;
    TypeChecker::new().check_program(&program)?;
    Ok(program)
}

/// Front end plus IR generation.
pub fn lower(source: &str) -> Result<Vec<Instr>, Error> {
    let program = check(source)?;
    Ok(IrGenerator::new().generate(&program))
}

/// Compiles `source` to a resolved bytecode program.
pub fn compile(source: &str) -> Result<BytecodeProgram, Error> {
    let instrs = lower(source)?;
    Ok(CodeGenerator::new().generate(&instrs)?)
}

/// Runs an already compiled program.
pub fn run(program: &BytecodeProgram, config: VmConfig) -> Result<i64, Error> {
    Ok(Vm::with_config(config).run(program)?)
}

pub fn compile_and_run(source: &str) -> Result<i64, Error> {
    compile_and_run_with(source, VmConfig::default())
}

pub fn compile_and_run_with(source: &str, config: VmConfig) -> Result<i64, Error> {
    let program = compile(source)?;
    run(&program, config)
}
