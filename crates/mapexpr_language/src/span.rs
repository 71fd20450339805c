//! Source positions for diagnostics.

use std::fmt;

use mapexpr_foundation::{Error, ErrorContext};

/// A span of source text.
///
/// Byte offsets index the source; line and column are 1-based and point at
/// the first character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Span {
    /// Byte offset where this span starts.
    pub start: usize,
    /// Byte offset where this span ends (exclusive).
    pub end: usize,
    /// 1-based line number where this span starts.
    pub line: u32,
    /// 1-based column number where this span starts.
    pub column: u32,
}

impl Span {
    /// Creates a new span.
    #[must_use]
    pub const fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// Creates a span covering the range from this span to another.
    #[must_use]
    pub fn to(self, other: Self) -> Self {
        Self {
            end: other.end,
            ..self
        }
    }

    /// Returns the text this span covers in the given source.
    #[must_use]
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.start..self.end).unwrap_or("")
    }

    /// Builds a syntax error located at this span.
    #[must_use]
    pub fn error(&self, message: impl Into<String>) -> Error {
        Error::parse(message, self.line, self.column)
    }

    /// Returns an error context pointing at this span.
    #[must_use]
    pub fn context(&self) -> ErrorContext {
        ErrorContext::new().with_position(self.line as usize, self.column as usize)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
