//! Compiler for transforming an [`Expr`] tree into [`Opcode`] bytecode.
//!
//! The tree is walked in evaluation order and every node is handed to the
//! shared [`Emitter`], so the output matches what the streaming compiler
//! would emit for the same source.

use mapexpr_foundation::Result;

use crate::ast::Expr;
use crate::config::CompilerOptions;
use crate::emit::{CompilationValue, Emitter};
use crate::member::MemberCall;
use crate::opcode::{CompiledProgram, Opcode};
use crate::parser::Parser;

/// Compiler state for transforming an expression tree to bytecode.
pub struct Compiler {
    emitter: Emitter<Opcode>,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(CompilerOptions::default())
    }
}

impl Compiler {
    /// Creates a new compiler.
    #[must_use]
    pub fn new(options: CompilerOptions) -> Self {
        Self {
            emitter: Emitter::new(options),
        }
    }

    /// Compiles a whole program.
    ///
    /// # Errors
    /// Returns the first semantic error.
    pub fn compile(mut self, expr: &Expr) -> Result<CompiledProgram> {
        let value = self.expr(expr)?;
        self.emitter.finish(value)
    }

    fn expr(&mut self, expr: &Expr) -> Result<CompilationValue> {
        match expr {
            Expr::Literal(value, _) => Ok(CompilationValue::Const(value.clone())),
            Expr::Ident(name, _) => self.emitter.load(name),
            Expr::Unary { op, operand, .. } => {
                let operand = self.expr(operand)?;
                self.emitter.unary(*op, operand)
            }
            Expr::Binary {
                op, left, right, ..
            } => {
                let left = self.expr(left)?;
                let mark = self.emitter.mark();
                let right = self.expr(right)?;
                self.emitter.binary(*op, left, mark, right)
            }
            Expr::Logical {
                op, left, right, ..
            } => {
                let left = self.expr(left)?;
                let pending = self.emitter.logical_begin(*op, left)?;
                let right = self.expr(right)?;
                self.emitter.logical_end(pending, right)
            }
            Expr::Assign { name, value, .. } => {
                let slot = self.emitter.name_constant(name)?;
                let value = self.expr(value)?;
                self.emitter.assign(slot, value)
            }
            Expr::Sequence { first, second, .. } => {
                let first = self.expr(first)?;
                self.emitter.discard(&first);
                self.expr(second)
            }
            Expr::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                let cond = self.expr(cond)?;
                let pending = self.emitter.if_begin(cond)?;
                let then_value = self.expr(then_branch)?;
                let pending = self.emitter.if_else(pending, then_value)?;
                let else_value = match else_branch {
                    Some(branch) => Some(self.expr(branch)?),
                    None => None,
                };
                self.emitter.if_end(pending, else_value)
            }
            Expr::MemberCall {
                subject,
                method,
                method_span,
                args,
                span,
            } => {
                let subject = self.expr(subject)?;
                let mut call = MemberCall::begin(&self.emitter, &subject, *span)?;
                for arg in args {
                    call.before_argument(&mut self.emitter)?;
                    let value = self.expr(arg)?;
                    call.push_argument(&mut self.emitter, value)?;
                }
                call.finish(&mut self.emitter, method, *method_span)
            }
        }
    }
}

/// Parses and compiles source with default options.
///
/// # Errors
/// Returns the first syntax or semantic error.
pub fn compile(source: &str) -> Result<CompiledProgram> {
    compile_with(source, CompilerOptions::default())
}

/// Parses and compiles source with the given options.
///
/// # Errors
/// Returns the first syntax or semantic error.
pub fn compile_with(source: &str, options: CompilerOptions) -> Result<CompiledProgram> {
    let expr = Parser::new(source).parse()?;
    Compiler::new(options).compile(&expr)
}
