//! Pratt parser producing an [`Expr`] tree.
//!
//! Grammar and error messages match the streaming compiler; the difference is
//! that this parser builds a tree for [`crate::compiler::Compiler`] to walk.

use mapexpr_foundation::{Error, ErrorKind, Result, Value};

use crate::ast::Expr;
use crate::cursor::TokenCursor;
use crate::member::{EXPECTED_ARGUMENTS, EXPECTED_CLOSE, EXPECTED_METHOD_NAME};
use crate::ops::{BinaryOp, LogicalOp, UnaryOp};
use crate::precedence::Precedence;
use crate::span::Span;
use crate::token::TokenKind;

/// Parses source into an expression tree.
///
/// An invalid assignment target does not stop parsing: the error is held
/// until the end of input so that a later syntax error is reported first.
pub struct Parser<'src> {
    cursor: TokenCursor<'src>,
    deferred: Option<Error>,
}

impl<'src> Parser<'src> {
    /// Creates a parser for the given source.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: TokenCursor::new(source),
            deferred: None,
        }
    }

    /// Parses the whole input as one expression.
    ///
    /// # Errors
    /// Returns the first syntax error, or [`ErrorKind::InvalidAssignTarget`]
    /// if the input is otherwise well formed.
    pub fn parse(mut self) -> Result<Expr> {
        let expr = self.expression(Precedence::Lowest)?;
        self.cursor.expect_eof()?;
        match self.deferred {
            Some(err) => Err(err),
            None => Ok(expr),
        }
    }

    fn expression(&mut self, min: Precedence) -> Result<Expr> {
        let mut left = self.prefix()?;
        while min < Precedence::of(&self.cursor.current().kind) {
            left = self.infix(left)?;
        }
        Ok(left)
    }

    fn prefix(&mut self) -> Result<Expr> {
        let token = self.cursor.advance();
        let span = token.span;
        let literal = |v: Value| -> Result<Expr> { Ok(Expr::Literal(v, span)) };
        match token.kind {
            TokenKind::Int(n) => literal(Value::Int(n)),
            TokenKind::Float(n) => literal(Value::Float(n)),
            TokenKind::String(s) => literal(Value::from(s)),
            TokenKind::True => literal(Value::Bool(true)),
            TokenKind::False => literal(Value::Bool(false)),
            TokenKind::Nil => literal(Value::Nil),
            TokenKind::Ident(name) => Ok(Expr::Ident(name, span)),
            TokenKind::LParen => {
                let inner = self.expression(Precedence::Lowest)?;
                self.cursor
                    .expect(&TokenKind::RParen, "expected ')' after expression")?;
                Ok(inner)
            }
            TokenKind::Minus => self.unary(UnaryOp::Neg, span),
            TokenKind::Bang => self.unary(UnaryOp::Not, span),
            TokenKind::If => self.conditional(span),
            TokenKind::Error(message) => Err(span.error(message)),
            other => Err(span.error(format!("expected expression, got {}", other.name()))),
        }
    }

    fn unary(&mut self, op: UnaryOp, span: Span) -> Result<Expr> {
        let operand = self.expression(Precedence::Prefix)?;
        Ok(Expr::Unary {
            op,
            span: span.to(operand.span()),
            operand: Box::new(operand),
        })
    }

    fn conditional(&mut self, span: Span) -> Result<Expr> {
        let cond = self.expression(Precedence::Lowest)?;
        self.cursor
            .expect(&TokenKind::Then, "expected 'then' after if condition")?;
        let then_branch = self.expression(Precedence::Lowest)?;
        let else_branch = if self.cursor.eat(&TokenKind::Else) {
            Some(Box::new(self.expression(Precedence::Lowest)?))
        } else {
            None
        };
        let end = else_branch
            .as_deref()
            .map_or_else(|| then_branch.span(), Expr::span);
        Ok(Expr::If {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch,
            span: span.to(end),
        })
    }

    fn infix(&mut self, left: Expr) -> Result<Expr> {
        let token = self.cursor.advance();
        let prec = Precedence::of(&token.kind);

        if let Some(op) = BinaryOp::from_token(&token.kind) {
            let right = self.expression(prec)?;
            return Ok(Expr::Binary {
                op,
                span: left.span().to(right.span()),
                left: Box::new(left),
                right: Box::new(right),
            });
        }
        if let Some(op) = LogicalOp::from_token(&token.kind) {
            let right = self.expression(prec)?;
            return Ok(Expr::Logical {
                op,
                span: left.span().to(right.span()),
                left: Box::new(left),
                right: Box::new(right),
            });
        }

        match token.kind {
            TokenKind::Dot => self.member_call(left),
            TokenKind::Assign => {
                let target = left.span();
                let Expr::Ident(name, _) = left else {
                    self.deferred.get_or_insert_with(|| {
                        Error::new(ErrorKind::InvalidAssignTarget).with_context(target.context())
                    });
                    return self.expression(prec.right_operand());
                };
                let value = self.expression(prec.right_operand())?;
                Ok(Expr::Assign {
                    name,
                    span: target.to(value.span()),
                    value: Box::new(value),
                })
            }
            TokenKind::FatArrow => {
                let second = self.expression(prec)?;
                Ok(Expr::Sequence {
                    span: left.span().to(second.span()),
                    first: Box::new(left),
                    second: Box::new(second),
                })
            }
            other => Err(token
                .span
                .error(format!("unexpected {} in expression", other.name()))),
        }
    }

    fn member_call(&mut self, subject: Expr) -> Result<Expr> {
        let (method, method_span) = self.cursor.expect_ident(EXPECTED_METHOD_NAME)?;
        self.cursor.expect(&TokenKind::LParen, EXPECTED_ARGUMENTS)?;

        let mut args = Vec::new();
        let close = loop {
            if args.is_empty() && self.cursor.check(&TokenKind::RParen) {
                break self.cursor.advance().span;
            }
            args.push(self.expression(Precedence::Lowest)?);
            if self.cursor.eat(&TokenKind::Comma) {
                continue;
            }
            if self.cursor.check(&TokenKind::RParen) {
                break self.cursor.advance().span;
            }
            return Err(self.cursor.unexpected(EXPECTED_CLOSE));
        };

        Ok(Expr::MemberCall {
            span: subject.span().to(close),
            subject: Box::new(subject),
            method,
            method_span,
            args,
        })
    }
}

/// Parses source into an expression tree.
///
/// # Errors
/// Returns the first syntax error, then any invalid assignment target.
pub fn parse(source: &str) -> Result<Expr> {
    Parser::new(source).parse()
}
