//! Lexer, parsers, compilers, and bytecode VMs for mapexpr.
//!
//! This crate provides two compiler/VM pairs with identical semantics:
//! - [`Parser`] + [`Compiler`] + [`Vm`] - builds an [`Expr`] tree, then lowers
//!   it to [`Opcode`]s
//! - [`StreamCompiler`] + [`StreamVm`] - lowers tokens straight to packed
//!   [`Instruction`]s in one pass
//!
//! Both pairs share the lowering policy in [`emit`] and [`member`], and the
//! runtime handlers in [`ops`] and [`vm::maps`]. [`Engine`] picks a pair from
//! [`EngineOptions`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ast;
pub mod compiler;
pub mod config;
pub mod cursor;
pub mod emit;
pub mod engine;
pub mod lexer;
pub mod member;
pub mod opcode;
pub mod ops;
pub mod parser;
pub mod precedence;
pub mod span;
pub mod stream;
pub mod token;
pub mod vm;

pub use ast::Expr;
pub use compiler::{Compiler, compile, compile_with};
pub use config::{Backend, CompilerOptions, EngineOptions, OptimizationLevel, VmConfig};
pub use emit::{Chunk, CompilationValue, ConstantPool, Emitter, InstructionSet};
pub use engine::{Engine, Program};
pub use lexer::Lexer;
pub use member::{Arg, ArgList, MapMethod, MapOp, MemberCall};
pub use opcode::{CompiledProgram, Opcode};
pub use ops::{BinaryOp, LogicalOp, UnaryOp};
pub use parser::{Parser, parse};
pub use precedence::Precedence;
pub use span::Span;
pub use stream::{
    Instruction, Op, StreamCompiler, StreamProgram, StreamVm, compile_stream, compile_stream_with,
    eval_stream,
};
pub use token::{Token, TokenKind};
pub use vm::{
    ExecutionObserver, Globals, NoObserver, StepCounter, StepEvent, Vm, VmContext, eval, eval_with,
};
