//! Error types for mapexpr.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.
//! Every error aborts the compile or execute call that raised it.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Type;

/// The main error type for mapexpr operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Returns the taxonomy bucket of this error.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    /// Creates a parse error at a source position.
    #[must_use]
    pub fn parse(message: impl Into<String>, line: u32, column: u32) -> Self {
        Self::new(ErrorKind::ParseError {
            message: message.into(),
            line,
            column,
        })
    }

    /// Creates a type mismatch error.
    #[must_use]
    pub fn type_mismatch(expected: Type, actual: Type) -> Self {
        Self::new(ErrorKind::TypeMismatch { expected, actual })
    }

    /// Creates a "not a map" error for the given opcode mnemonic.
    #[must_use]
    pub fn not_a_map(op: &'static str, actual: Type) -> Self {
        Self::new(ErrorKind::NotAMap { op, actual })
    }

    /// Creates a method arity mismatch error.
    #[must_use]
    pub fn arity_mismatch(method: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::new(ErrorKind::ArityMismatch {
            method: method.into(),
            expected,
            actual,
        })
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }
}

/// Coarse classification of errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ErrorCategory {
    /// Malformed token sequence.
    Syntax,
    /// Well-formed but meaningless program.
    Semantic,
    /// Failure while executing bytecode.
    Runtime,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax => write!(f, "syntax error"),
            Self::Semantic => write!(f, "semantic error"),
            Self::Runtime => write!(f, "runtime error"),
        }
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Parse error in source text.
    #[error("parse error at {line}:{column}: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Line number (1-indexed).
        line: u32,
        /// Column number (1-indexed).
        column: u32,
    },

    /// Member call on something other than a named variable.
    #[error("member call subject must be an identifier")]
    InvalidMemberSubject,

    /// Wrong number of arguments to a map method.
    #[error("{method} expects {expected} argument{}, got {actual}", plural(.expected))]
    ArityMismatch {
        /// The method that was called.
        method: String,
        /// Required argument count.
        expected: usize,
        /// Actual number of arguments.
        actual: usize,
    },

    /// Method name is not a known map method.
    #[error("unknown map method: {0}")]
    UnknownMethod(String),

    /// Left side of `=` is not a variable.
    #[error("invalid assignment target")]
    InvalidAssignTarget,

    /// More constants than an instruction operand can address.
    #[error("too many constants in one program (limit {limit})")]
    ConstantPoolOverflow {
        /// Maximum number of pool slots.
        limit: usize,
    },

    /// A forward jump does not fit its operand.
    #[error("jump distance {distance} exceeds operand range")]
    JumpTooFar {
        /// Number of instructions jumped over.
        distance: usize,
    },

    /// Map opcode applied to a non-map value.
    #[error("{op}: not a map (got {actual})")]
    NotAMap {
        /// Opcode mnemonic.
        op: &'static str,
        /// The type that was found instead.
        actual: Type,
    },

    /// Type mismatch during runtime type checking.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The expected type.
        expected: Type,
        /// The actual type encountered.
        actual: Type,
    },

    /// Division by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// Operand stack exceeded its configured limit.
    #[error("stack overflow (limit {limit})")]
    StackOverflow {
        /// The configured depth limit.
        limit: usize,
    },

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

impl ErrorKind {
    /// Returns the taxonomy bucket of this kind.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ParseError { .. } => ErrorCategory::Syntax,
            Self::InvalidMemberSubject
            | Self::ArityMismatch { .. }
            | Self::UnknownMethod(_)
            | Self::InvalidAssignTarget
            | Self::ConstantPoolOverflow { .. }
            | Self::JumpTooFar { .. } => ErrorCategory::Semantic,
            Self::NotAMap { .. }
            | Self::TypeMismatch { .. }
            | Self::DivisionByZero
            | Self::StackOverflow { .. }
            | Self::Internal(_) => ErrorCategory::Runtime,
        }
    }
}

fn plural(n: &usize) -> &'static str {
    if *n == 1 { "" } else { "s" }
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Source name (file, script id).
    pub source: Option<String>,
    /// Line number in source.
    pub line: Option<usize>,
    /// Column number in source.
    pub column: Option<usize>,
    /// Instruction pointer at the failing instruction.
    pub ip: Option<usize>,
    /// Extra frames, innermost first.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source name.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the line and column.
    #[must_use]
    pub fn with_position(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    /// Sets the instruction pointer.
    #[must_use]
    pub fn with_ip(mut self, ip: usize) -> Self {
        self.ip = Some(ip);
        self
    }

    /// Adds a frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            write!(f, "at {source}")?;
            if let (Some(line), Some(col)) = (self.line, self.column) {
                write!(f, ":{line}:{col}")?;
            }
        }
        if let Some(ip) = self.ip {
            write!(f, " (ip {ip})")?;
        }
        if !self.stack.is_empty() {
            writeln!(f)?;
            for frame in &self.stack {
                writeln!(f, "  in {frame}")?;
            }
        }
        Ok(())
    }
}

/// Result type alias for mapexpr operations.
pub type Result<T> = std::result::Result<T, Error>;
