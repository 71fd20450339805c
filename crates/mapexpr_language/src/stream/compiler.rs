//! Single-pass compiler from tokens to [`Instruction`]s.
//!
//! Precedence climbing drives the shared [`Emitter`] directly as tokens are
//! recognized; no tree is built. The program ends with an explicit `RET`.
//!
//! Semantic errors found mid-stream are held while parsing continues, so a
//! syntax error anywhere in the source is reported in preference, exactly as
//! when the whole tree is parsed before lowering.

use mapexpr_foundation::{Error, ErrorCategory, Result, Value};

use crate::config::CompilerOptions;
use crate::cursor::TokenCursor;
use crate::emit::{CompilationValue, Emitter};
use crate::member::{EXPECTED_ARGUMENTS, EXPECTED_CLOSE, EXPECTED_METHOD_NAME, MemberCall};
use crate::ops::{BinaryOp, LogicalOp, UnaryOp};
use crate::precedence::Precedence;
use crate::span::Span;
use crate::token::TokenKind;

use super::instruction::{Instruction, StreamProgram};

/// Compiles source with default options.
///
/// # Errors
/// Returns the first syntax or semantic error.
pub fn compile_stream(source: &str) -> Result<StreamProgram> {
    compile_stream_with(source, CompilerOptions::default())
}

/// Compiles source with the given options.
///
/// # Errors
/// Returns the first syntax or semantic error.
pub fn compile_stream_with(source: &str, options: CompilerOptions) -> Result<StreamProgram> {
    StreamCompiler::new(source, options).compile()
}

/// Where the left operand of an infix operator began.
#[derive(Clone, Copy)]
struct Start {
    mark: usize,
    span: Span,
}

/// Token-driven compiler.
pub struct StreamCompiler<'src> {
    cursor: TokenCursor<'src>,
    emitter: Emitter<Instruction>,
    deferred: Option<Error>,
}

impl<'src> StreamCompiler<'src> {
    /// Creates a compiler positioned at the start of `source`.
    #[must_use]
    pub fn new(source: &'src str, options: CompilerOptions) -> Self {
        Self {
            cursor: TokenCursor::new(source),
            emitter: Emitter::new(options),
            deferred: None,
        }
    }

    /// Compiles the whole input as one expression.
    ///
    /// # Errors
    /// Returns the first syntax or semantic error.
    pub fn compile(mut self) -> Result<StreamProgram> {
        let value = self.expression(Precedence::Lowest)?;
        self.cursor.expect_eof()?;
        if let Some(err) = self.deferred {
            return Err(err);
        }
        let mut program = self.emitter.finish(value)?;
        program.emit(Instruction::ret());
        Ok(program)
    }

    /// Records the first semantic error and substitutes `fallback` so that
    /// parsing can go on. Other errors pass through.
    fn hold<T>(&mut self, result: Result<T>, fallback: impl FnOnce() -> T) -> Result<T> {
        match result {
            Err(err) if err.category() == ErrorCategory::Semantic => {
                self.deferred.get_or_insert(err);
                Ok(fallback())
            }
            other => other,
        }
    }

    fn expression(&mut self, min: Precedence) -> Result<CompilationValue> {
        let start = Start {
            mark: self.emitter.mark(),
            span: self.cursor.span(),
        };
        let mut left = self.prefix()?;
        while min < Precedence::of(&self.cursor.current().kind) {
            left = self.infix(left, start)?;
        }
        Ok(left)
    }

    // =========================================================================
    // Prefix
    // =========================================================================

    fn prefix(&mut self) -> Result<CompilationValue> {
        let token = self.cursor.advance();
        match token.kind {
            TokenKind::Int(n) => Ok(CompilationValue::Const(Value::Int(n))),
            TokenKind::Float(n) => Ok(CompilationValue::Const(Value::Float(n))),
            TokenKind::String(s) => Ok(CompilationValue::Const(Value::from(s))),
            TokenKind::True => Ok(CompilationValue::Const(Value::Bool(true))),
            TokenKind::False => Ok(CompilationValue::Const(Value::Bool(false))),
            TokenKind::Nil => Ok(CompilationValue::Const(Value::Nil)),
            TokenKind::Ident(name) => self.emitter.load(&name),
            TokenKind::LParen => {
                let inner = self.expression(Precedence::Lowest)?;
                self.cursor
                    .expect(&TokenKind::RParen, "expected ')' after expression")?;
                Ok(inner)
            }
            TokenKind::Minus => self.unary(UnaryOp::Neg),
            TokenKind::Bang => self.unary(UnaryOp::Not),
            TokenKind::If => self.conditional(),
            TokenKind::Error(message) => Err(token.span.error(message)),
            other => Err(token
                .span
                .error(format!("expected expression, got {}", other.name()))),
        }
    }

    fn unary(&mut self, op: UnaryOp) -> Result<CompilationValue> {
        let operand = self.expression(Precedence::Prefix)?;
        self.emitter.unary(op, operand)
    }

    fn conditional(&mut self) -> Result<CompilationValue> {
        let cond = self.expression(Precedence::Lowest)?;
        self.cursor
            .expect(&TokenKind::Then, "expected 'then' after if condition")?;
        let pending = self.emitter.if_begin(cond)?;
        let then_value = self.expression(Precedence::Lowest)?;
        let pending = self.emitter.if_else(pending, then_value)?;
        let else_value = if self.cursor.eat(&TokenKind::Else) {
            Some(self.expression(Precedence::Lowest)?)
        } else {
            None
        };
        self.emitter.if_end(pending, else_value)
    }

    // =========================================================================
    // Infix
    // =========================================================================

    fn infix(&mut self, left: CompilationValue, start: Start) -> Result<CompilationValue> {
        let token = self.cursor.advance();
        let prec = Precedence::of(&token.kind);

        if let Some(op) = BinaryOp::from_token(&token.kind) {
            let mark = self.emitter.mark();
            let right = self.expression(prec)?;
            return self.emitter.binary(op, left, mark, right);
        }
        if let Some(op) = LogicalOp::from_token(&token.kind) {
            let pending = self.emitter.logical_begin(op, left)?;
            let right = self.expression(prec)?;
            return self.emitter.logical_end(pending, right);
        }

        match token.kind {
            TokenKind::Dot => self.member_call(&left, start),
            TokenKind::Assign => {
                let target = self
                    .emitter
                    .assign_target(&left, start.mark)
                    .map_err(|err| err.with_context(start.span.context()));
                let name = self.hold(target, || 0)?;
                let value = self.expression(prec.right_operand())?;
                self.emitter.assign(name, value)
            }
            TokenKind::FatArrow => {
                self.emitter.discard(&left);
                self.expression(prec)
            }
            other => Err(token
                .span
                .error(format!("unexpected {} in expression", other.name()))),
        }
    }

    fn member_call(&mut self, subject: &CompilationValue, start: Start) -> Result<CompilationValue> {
        let begun = MemberCall::begin(&self.emitter, subject, start.span);
        let mut call = self.hold(begun, || MemberCall::unchecked(start.span))?;
        let (method, method_span) = self.cursor.expect_ident(EXPECTED_METHOD_NAME)?;
        self.cursor.expect(&TokenKind::LParen, EXPECTED_ARGUMENTS)?;

        if !self.cursor.eat(&TokenKind::RParen) {
            loop {
                call.before_argument(&mut self.emitter)?;
                let arg = self.expression(Precedence::Lowest)?;
                call.push_argument(&mut self.emitter, arg)?;
                if self.cursor.eat(&TokenKind::Comma) {
                    continue;
                }
                if self.cursor.eat(&TokenKind::RParen) {
                    break;
                }
                return Err(self.cursor.unexpected(EXPECTED_CLOSE));
            }
        }

        let finished = call.finish(&mut self.emitter, &method, method_span);
        self.hold(finished, || CompilationValue::OnStack)
    }
}
