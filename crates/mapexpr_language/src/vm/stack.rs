//! Bounded operand stack shared by both VMs.

use mapexpr_foundation::{Error, ErrorKind, Result, Value};

/// Operand stack with a depth limit.
#[derive(Debug)]
pub struct OperandStack {
    values: Vec<Value>,
    limit: usize,
}

impl OperandStack {
    /// Creates an empty stack that holds at most `limit` values.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            values: Vec::with_capacity(limit.min(256)),
            limit,
        }
    }

    /// Pushes a value.
    ///
    /// # Errors
    /// Returns [`ErrorKind::StackOverflow`] at the depth limit.
    pub fn push(&mut self, value: Value) -> Result<()> {
        if self.values.len() >= self.limit {
            return Err(Error::new(ErrorKind::StackOverflow { limit: self.limit }));
        }
        self.values.push(value);
        Ok(())
    }

    /// Pops the top value.
    ///
    /// # Errors
    /// Returns an internal error when empty.
    pub fn pop(&mut self) -> Result<Value> {
        self.values.pop().ok_or_else(underflow)
    }

    /// Returns the top value.
    ///
    /// # Errors
    /// Returns an internal error when empty.
    pub fn peek(&self) -> Result<&Value> {
        self.values.last().ok_or_else(underflow)
    }

    /// Returns the top value mutably.
    ///
    /// # Errors
    /// Returns an internal error when empty.
    pub fn peek_mut(&mut self) -> Result<&mut Value> {
        self.values.last_mut().ok_or_else(underflow)
    }

    /// Returns the current depth.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the stack is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Drops every value.
    pub fn clear(&mut self) {
        self.values.clear();
    }
}

fn underflow() -> Error {
    Error::internal("stack underflow")
}
