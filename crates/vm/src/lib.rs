//! bitlang virtual machine: evaluates checked programs.
//!
//! The VM walks the syntax tree directly, with:
//! - A call stack of frames, each holding a stack of lexical scopes
//! - A static environment shared by every frame: global statics, consts,
//!   and per-function statics that all activations of a function share
//! - A configurable call-depth limit, with the host stack grown on demand
//!
//! # Usage
//!
//! ```
//! use bitlang_vm::{run_source, VmConfig};
//!
//! let src = "static RESULT:u8\nfn double(x:u8):u8 { return (* x 2) }\n(= RESULT (double 21))";
//! let memory = run_source(src, &VmConfig::default()).unwrap();
//! assert_eq!(memory.read("RESULT", None), Some(42));
//! ```

pub mod config;
pub mod error;
pub mod eval;
pub mod execute;
pub mod machine;
pub mod memory;
pub mod ops;

pub use config::{OverflowPolicy, VmConfig};
pub use error::{Error, ErrorKind, RuntimeError};
pub use machine::VM;
pub use memory::Memory;

use bitlang_common::Program;

/// Check and execute a parsed program.
///
/// This is the primary entry point for the VM. It:
/// 1. Builds the function table and static environment (all declaration
///    errors are reported together)
/// 2. Executes the top-level statements in order
/// 3. Returns every static and const as they stand at the end of the run
///
/// # Errors
///
/// Returns [`Error::Declaration`] if the checker rejects the program, or
/// [`Error::Runtime`] if execution fails (explicit panic, type mismatch,
/// index out of bounds, etc.).
pub fn run(program: &Program, config: &VmConfig) -> Result<Memory, Error> {
    let declarations = bitlang_checker::check(program)?;
    let mut vm = VM::new(program, declarations, config.clone());
    vm.execute()?;
    Ok(vm.memory())
}

/// Parse, check and execute source text.
pub fn run_source(source: &str, config: &VmConfig) -> Result<Memory, Error> {
    let program = bitlang_syntax::parse(source)?;
    run(&program, config)
}
