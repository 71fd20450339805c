//! Operator precedence for Pratt parsing.

use crate::token::TokenKind;

/// Operator precedence levels (higher = tighter binding).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    /// Not an infix operator.
    Lowest,
    /// `=>`
    Sequence,
    /// `=` (right associative)
    Assign,
    /// `||`
    Or,
    /// `&&`
    And,
    /// `==` `!=`
    Equality,
    /// `<` `<=` `>` `>=`
    Comparison,
    /// `+` `-`
    Term,
    /// `*` `/` `%`
    Factor,
    /// Unary `-` `!`
    Prefix,
    /// `.` member call
    Call,
}

impl Precedence {
    /// Returns the binding power of a token in infix position.
    #[must_use]
    pub fn of(kind: &TokenKind) -> Self {
        match kind {
            TokenKind::FatArrow => Self::Sequence,
            TokenKind::Assign => Self::Assign,
            TokenKind::OrOr => Self::Or,
            TokenKind::AndAnd => Self::And,
            TokenKind::EqEq | TokenKind::BangEq => Self::Equality,
            TokenKind::Lt | TokenKind::Le | TokenKind::Gt | TokenKind::Ge => Self::Comparison,
            TokenKind::Plus | TokenKind::Minus => Self::Term,
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Self::Factor,
            TokenKind::Dot => Self::Call,
            _ => Self::Lowest,
        }
    }

    /// Returns the minimum precedence for the right operand of an infix
    /// operator at this level.
    ///
    /// Right-associative levels parse their operand one level lower so an
    /// operator of the same level is absorbed into the right side.
    #[must_use]
    pub fn right_operand(self) -> Self {
        match self {
            Self::Assign => Self::Sequence,
            other => other,
        }
    }
}
