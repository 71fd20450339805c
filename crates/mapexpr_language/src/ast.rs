//! Expression tree produced by [`crate::parser::Parser`].

use mapexpr_foundation::Value;

use crate::ops::{BinaryOp, LogicalOp, UnaryOp};
use crate::span::Span;

/// A parsed expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Literal value: number, string, bool, or nil.
    Literal(Value, Span),
    /// Variable reference.
    Ident(String, Span),
    /// Prefix operator.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<Expr>,
        /// Source span.
        span: Span,
    },
    /// Eager binary operator.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
        /// Source span.
        span: Span,
    },
    /// Short-circuiting `&&` / `||`.
    Logical {
        /// The operator.
        op: LogicalOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
        /// Source span.
        span: Span,
    },
    /// `name = value`
    Assign {
        /// Variable being assigned.
        name: String,
        /// Assigned expression.
        value: Box<Expr>,
        /// Source span.
        span: Span,
    },
    /// `first => second`
    Sequence {
        /// Evaluated and discarded.
        first: Box<Expr>,
        /// Result of the sequence.
        second: Box<Expr>,
        /// Source span.
        span: Span,
    },
    /// `if cond then a [else b]`
    If {
        /// Condition.
        cond: Box<Expr>,
        /// Taken when the condition is truthy.
        then_branch: Box<Expr>,
        /// Taken otherwise; a missing branch yields nil.
        else_branch: Option<Box<Expr>>,
        /// Source span.
        span: Span,
    },
    /// `subject.method(args...)`
    MemberCall {
        /// The receiver expression.
        subject: Box<Expr>,
        /// Method name as written.
        method: String,
        /// Span of the method name.
        method_span: Span,
        /// Arguments in source order.
        args: Vec<Expr>,
        /// Span from the subject through `)`.
        span: Span,
    },
}

impl Expr {
    /// Returns the source span of this expression.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Literal(_, span) | Self::Ident(_, span) => *span,
            Self::Unary { span, .. }
            | Self::Binary { span, .. }
            | Self::Logical { span, .. }
            | Self::Assign { span, .. }
            | Self::Sequence { span, .. }
            | Self::If { span, .. }
            | Self::MemberCall { span, .. } => *span,
        }
    }
}
