//! One-token lookahead over the lexer, shared by both front ends.

use mapexpr_foundation::{Error, Result};

use crate::lexer::Lexer;
use crate::span::Span;
use crate::token::{Token, TokenKind};

/// A lexer with the current token buffered.
pub struct TokenCursor<'src> {
    lexer: Lexer<'src>,
    current: Token,
}

impl<'src> TokenCursor<'src> {
    /// Creates a cursor positioned on the first token.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        Self { lexer, current }
    }

    /// Returns the current token.
    #[must_use]
    pub fn current(&self) -> &Token {
        &self.current
    }

    /// Returns the current token's span.
    #[must_use]
    pub fn span(&self) -> Span {
        self.current.span
    }

    /// Returns true if the current token has the given kind.
    #[must_use]
    pub fn check(&self, kind: &TokenKind) -> bool {
        self.current.kind == *kind
    }

    /// Consumes the current token and returns it.
    pub fn advance(&mut self) -> Token {
        let next = self.lexer.next_token();
        std::mem::replace(&mut self.current, next)
    }

    /// Consumes the current token if it has the given kind.
    pub fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes a token of the given kind or fails with `message`.
    ///
    /// # Errors
    /// Returns a syntax error at the current token.
    pub fn expect(&mut self, kind: &TokenKind, message: &str) -> Result<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(message))
        }
    }

    /// Consumes an identifier or fails with `message`.
    ///
    /// # Errors
    /// Returns a syntax error at the current token.
    pub fn expect_ident(&mut self, message: &str) -> Result<(String, Span)> {
        if let TokenKind::Ident(name) = &self.current.kind {
            let name = name.clone();
            let span = self.advance().span;
            Ok((name, span))
        } else {
            Err(self.error(message))
        }
    }

    /// Builds a syntax error at the current token.
    ///
    /// A lexer error token reports its own message instead.
    #[must_use]
    pub fn error(&self, message: &str) -> Error {
        match &self.current.kind {
            TokenKind::Error(lex) => self.current.span.error(lex.clone()),
            _ => self.current.span.error(message),
        }
    }

    /// Builds an "expected X, got Y" syntax error at the current token.
    #[must_use]
    pub fn unexpected(&self, expected: &str) -> Error {
        self.error(&format!("{expected}, got {}", self.current.kind.name()))
    }

    /// Fails unless all input has been consumed.
    ///
    /// # Errors
    /// Returns a syntax error naming the trailing token.
    pub fn expect_eof(&self) -> Result<()> {
        if self.check(&TokenKind::Eof) {
            Ok(())
        } else {
            Err(self.error(&format!(
                "unexpected {} after expression",
                self.current.kind.name()
            )))
        }
    }
}
