//! Operators shared by constant folding and both VMs.
//!
//! Folding a constant expression and executing it at runtime go through the
//! same functions, so a folded program always agrees with its unfolded form.

use std::cmp::Ordering;
use std::fmt;

use mapexpr_foundation::{Error, ErrorKind, Result, Type, Value};

use crate::token::TokenKind;

// =============================================================================
// Operator Kinds
// =============================================================================

/// Binary operators with eager operands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

/// Short-circuiting operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    /// `&&`
    And,
    /// `||`
    Or,
}

/// Prefix operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `-`
    Neg,
    /// `!`
    Not,
}

impl BinaryOp {
    /// Maps an infix token to its operator.
    #[must_use]
    pub fn from_token(kind: &TokenKind) -> Option<Self> {
        Some(match kind {
            TokenKind::Plus => Self::Add,
            TokenKind::Minus => Self::Sub,
            TokenKind::Star => Self::Mul,
            TokenKind::Slash => Self::Div,
            TokenKind::Percent => Self::Mod,
            TokenKind::EqEq => Self::Eq,
            TokenKind::BangEq => Self::Ne,
            TokenKind::Lt => Self::Lt,
            TokenKind::Le => Self::Le,
            TokenKind::Gt => Self::Gt,
            TokenKind::Ge => Self::Ge,
            _ => return None,
        })
    }

    /// Returns the instruction mnemonic.
    #[must_use]
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::Mul => "MUL",
            Self::Div => "DIV",
            Self::Mod => "MOD",
            Self::Eq => "EQ",
            Self::Ne => "NE",
            Self::Lt => "LT",
            Self::Le => "LE",
            Self::Gt => "GT",
            Self::Ge => "GE",
        }
    }

    /// Applies the operator.
    ///
    /// # Errors
    /// Returns an error for operand type mismatches and division by zero.
    pub fn apply(self, a: &Value, b: &Value) -> Result<Value> {
        match self {
            Self::Add => add_values(a, b),
            Self::Sub => arith(a, b, i64::wrapping_sub, |x, y| x - y),
            Self::Mul => arith(a, b, i64::wrapping_mul, |x, y| x * y),
            Self::Div => div_values(a, b),
            Self::Mod => mod_values(a, b),
            Self::Eq => Ok(Value::Bool(values_equal(a, b))),
            Self::Ne => Ok(Value::Bool(!values_equal(a, b))),
            Self::Lt => compare_values(a, b, Ordering::is_lt),
            Self::Le => compare_values(a, b, Ordering::is_le),
            Self::Gt => compare_values(a, b, Ordering::is_gt),
            Self::Ge => compare_values(a, b, Ordering::is_ge),
        }
    }
}

impl LogicalOp {
    /// Maps an infix token to its operator.
    #[must_use]
    pub fn from_token(kind: &TokenKind) -> Option<Self> {
        match kind {
            TokenKind::AndAnd => Some(Self::And),
            TokenKind::OrOr => Some(Self::Or),
            _ => None,
        }
    }

    /// Returns true if a left operand with this truthiness decides the result.
    #[must_use]
    pub fn short_circuits(self, left_truthy: bool) -> bool {
        match self {
            Self::And => !left_truthy,
            Self::Or => left_truthy,
        }
    }
}

impl UnaryOp {
    /// Maps a prefix token to its operator.
    #[must_use]
    pub fn from_token(kind: &TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Minus => Some(Self::Neg),
            TokenKind::Bang => Some(Self::Not),
            _ => None,
        }
    }

    /// Returns the instruction mnemonic.
    #[must_use]
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Neg => "NEG",
            Self::Not => "NOT",
        }
    }

    /// Applies the operator.
    ///
    /// # Errors
    /// Returns an error when negating a non-number.
    pub fn apply(self, v: &Value) -> Result<Value> {
        match self {
            Self::Neg => match v {
                Value::Int(x) => Ok(Value::Int(x.wrapping_neg())),
                Value::Float(x) => Ok(Value::Float(-x)),
                _ => Err(Error::type_mismatch(Type::Number, v.value_type())),
            },
            Self::Not => Ok(Value::Bool(!v.is_truthy())),
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

// =============================================================================
// Arithmetic
// =============================================================================

/// Reports the operand that broke a numeric operation.
fn number_mismatch(a: &Value, b: &Value) -> Error {
    let culprit = if a.as_number().is_some() { b } else { a };
    Error::type_mismatch(Type::Number, culprit.value_type())
}

#[allow(clippy::cast_precision_loss)]
fn arith(
    a: &Value,
    b: &Value,
    int_op: fn(i64, i64) -> i64,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(Value::Int(int_op(*x, *y))),
        (Value::Float(x), Value::Float(y)) => Ok(Value::Float(float_op(*x, *y))),
        (Value::Int(x), Value::Float(y)) => Ok(Value::Float(float_op(*x as f64, *y))),
        (Value::Float(x), Value::Int(y)) => Ok(Value::Float(float_op(*x, *y as f64))),
        _ => Err(number_mismatch(a, b)),
    }
}

/// Adds two values. Strings concatenate.
fn add_values(a: &Value, b: &Value) -> Result<Value> {
    match (a, b) {
        (Value::String(x), Value::String(y)) => Ok(Value::from(format!("{x}{y}"))),
        (Value::String(_), other) => Err(Error::type_mismatch(Type::String, other.value_type())),
        _ => arith(a, b, i64::wrapping_add, |x, y| x + y),
    }
}

/// Divides two values.
fn div_values(a: &Value, b: &Value) -> Result<Value> {
    if is_zero(b) && a.as_number().is_some() {
        return Err(Error::new(ErrorKind::DivisionByZero));
    }
    arith(a, b, i64::wrapping_div, |x, y| x / y)
}

/// Remainder of two values.
fn mod_values(a: &Value, b: &Value) -> Result<Value> {
    if is_zero(b) && a.as_number().is_some() {
        return Err(Error::new(ErrorKind::DivisionByZero));
    }
    arith(a, b, i64::wrapping_rem, |x, y| x % y)
}

fn is_zero(v: &Value) -> bool {
    match v {
        Value::Int(n) => *n == 0,
        Value::Float(n) => *n == 0.0,
        _ => false,
    }
}

/// Equality as scripts see it: numbers compare across int and float, and
/// maps compare entry by entry with the same rule.
#[must_use]
pub fn values_equal(a: &Value, b: &Value) -> bool {
    a.loose_eq(b)
}

/// Orders two numbers or two strings with the given predicate.
fn compare_values(a: &Value, b: &Value, pred: fn(Ordering) -> bool) -> Result<Value> {
    match (a, b) {
        (Value::String(_), Value::String(_)) => {}
        (Value::String(_), other) => {
            return Err(Error::type_mismatch(Type::String, other.value_type()));
        }
        _ if a.as_number().is_some() && b.as_number().is_some() => {}
        _ => return Err(number_mismatch(a, b)),
    }
    // NaN orders with nothing
    Ok(Value::Bool(a.partial_cmp(b).is_some_and(pred)))
}
