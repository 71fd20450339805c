//! The token-streaming compiler/VM pair.
//!
//! [`StreamCompiler`] emits packed [`Instruction`]s in one pass over the
//! tokens and [`StreamVm`] runs them. Lowering and map semantics are shared
//! with the stack pair, so both produce the same results for the same source.

mod compiler;
mod instruction;
mod vm;

pub use compiler::{StreamCompiler, compile_stream, compile_stream_with};
pub use instruction::{Instruction, Op, StreamProgram};
pub use vm::StreamVm;

use mapexpr_foundation::{Result, Value};

use crate::vm::Globals;

/// Compiles and runs source on the streaming pair.
///
/// # Errors
/// Returns any compile or runtime error.
pub fn eval_stream(source: &str, globals: &mut Globals) -> Result<Value> {
    let program = compile_stream(source)?;
    StreamVm::new().execute(&program, globals)
}
