//! Member-call compilation for map methods.
//!
//! `subject.method(args...)` is only valid when `subject` compiled to a
//! single variable load. Arguments are tracked in an [`ArgList`] so that at
//! most one literal is ever waiting to be pushed: the first argument may stay
//! deferred, and every later argument forces the pending literal out first.
//! A `get` whose only argument is still a deferred string literal never
//! pushes it at all and becomes one constant-key lookup instead.
//!
//! Both front ends call [`MemberCall::begin`], then [`MemberCall::before_argument`]
//! and [`MemberCall::push_argument`] per argument, then [`MemberCall::finish`].

use std::fmt;

use mapexpr_foundation::{Error, ErrorKind, Result, Value};

use crate::emit::{Chunk, CompilationValue, Emitter, InstructionSet};
use crate::span::Span;

/// Message when `.` is not followed by a method name.
pub const EXPECTED_METHOD_NAME: &str = "expected method name after '.'";
/// Message when the method name is not followed by `(`.
pub const EXPECTED_ARGUMENTS: &str = "expected '(' after method name";
/// Prefix of the message when an argument is not followed by `,` or `)`.
pub const EXPECTED_CLOSE: &str = "expected ')'";

// =============================================================================
// Methods and Opcodes
// =============================================================================

/// The methods a map value understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MapMethod {
    /// `m.get(key)`
    Get,
    /// `m.set(key, value)`
    Set,
    /// `m.has(key)`
    Has,
    /// `m.del(key)`
    Del,
}

impl MapMethod {
    /// Resolves a method name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "get" => Some(Self::Get),
            "set" => Some(Self::Set),
            "has" => Some(Self::Has),
            "del" => Some(Self::Del),
            _ => None,
        }
    }

    /// Returns the method name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Set => "set",
            Self::Has => "has",
            Self::Del => "del",
        }
    }

    /// Returns the exact number of arguments.
    #[must_use]
    pub fn arity(self) -> usize {
        match self {
            Self::Set => 2,
            Self::Get | Self::Has | Self::Del => 1,
        }
    }

    /// Returns the opcode that takes every operand from the stack.
    #[must_use]
    pub fn stack_op(self) -> MapOp {
        match self {
            Self::Get => MapOp::Get,
            Self::Set => MapOp::Set,
            Self::Has => MapOp::Has,
            Self::Del => MapOp::Del,
        }
    }
}

/// Map opcodes, independent of instruction encoding.
///
/// Every map opcode leaves exactly one value on the stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MapOp {
    /// Replace the map on top of the stack with `map[constants[index]]`.
    GetConst(u16),
    /// Pop key and map, push the entry or nil.
    Get,
    /// Pop value, key, and map, store the entry, push nil.
    Set,
    /// Pop key and map, push whether the key is present.
    Has,
    /// Pop key and map, remove the entry, push nil.
    Del,
}

impl MapOp {
    /// Returns the instruction mnemonic.
    #[must_use]
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::GetConst(_) => "MGETC",
            Self::Get => "MGET",
            Self::Set => "MSET",
            Self::Has => "MHAS",
            Self::Del => "MDEL",
        }
    }
}

impl fmt::Display for MapOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GetConst(index) => write!(f, "{} {index}", self.mnemonic()),
            other => f.write_str(other.mnemonic()),
        }
    }
}

// =============================================================================
// Argument List
// =============================================================================

/// One call argument.
#[derive(Clone, Debug, PartialEq)]
pub enum Arg {
    /// A literal whose push has not been emitted yet.
    Deferred(Value),
    /// Already on the stack, or its push is already emitted.
    Materialized,
}

/// Append-only record of a call's arguments.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArgList {
    entries: Vec<Arg>,
}

impl ArgList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no arguments have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entries in source order.
    #[must_use]
    pub fn entries(&self) -> &[Arg] {
        &self.entries
    }

    /// Returns how many entries are still deferred.
    #[must_use]
    pub fn deferred(&self) -> usize {
        self.entries
            .iter()
            .filter(|a| matches!(a, Arg::Deferred(_)))
            .count()
    }

    /// Emits pushes for every deferred entry, in order.
    ///
    /// # Errors
    /// Returns an error when the pool is full.
    pub fn flush<I: InstructionSet>(&mut self, chunk: &mut Chunk<I>) -> Result<()> {
        for arg in &mut self.entries {
            if let Arg::Deferred(v) = std::mem::replace(arg, Arg::Materialized) {
                chunk.emit_push(v)?;
            }
        }
        Ok(())
    }

    fn push(&mut self, arg: Arg) {
        self.entries.push(arg);
    }
}

// =============================================================================
// Member Call
// =============================================================================

/// A member call whose arguments are being compiled.
#[derive(Debug)]
#[must_use]
pub struct MemberCall {
    span: Span,
    args: ArgList,
}

impl MemberCall {
    /// Validates the subject of a member call.
    ///
    /// `subject` must be a runtime value produced by a variable load that is
    /// the most recently emitted instruction.
    ///
    /// # Errors
    /// Returns [`ErrorKind::InvalidMemberSubject`] otherwise.
    pub fn begin<I: InstructionSet>(
        emitter: &Emitter<I>,
        subject: &CompilationValue,
        span: Span,
    ) -> Result<Self> {
        let loaded = emitter
            .chunk()
            .last()
            .and_then(I::as_load_global)
            .is_some();
        if subject.is_const() || !loaded {
            return Err(Error::new(ErrorKind::InvalidMemberSubject).with_context(span.context()));
        }
        Ok(Self::unchecked(span))
    }

    /// Starts a call without validating the subject.
    ///
    /// Used to keep parsing the call after its subject has been rejected.
    pub(crate) fn unchecked(span: Span) -> Self {
        Self {
            span,
            args: ArgList::new(),
        }
    }

    /// Returns the arguments recorded so far.
    #[must_use]
    pub fn args(&self) -> &ArgList {
        &self.args
    }

    /// Must be called before compiling each argument.
    ///
    /// Flushes the pending literal before a second argument can emit code.
    ///
    /// # Errors
    /// Returns an error when the pool is full.
    pub fn before_argument<I: InstructionSet>(&mut self, emitter: &mut Emitter<I>) -> Result<()> {
        if self.args.is_empty() {
            Ok(())
        } else {
            self.args.flush(emitter.chunk_mut())
        }
    }

    /// Records a compiled argument.
    ///
    /// # Errors
    /// Returns an error when the pool is full.
    pub fn push_argument<I: InstructionSet>(
        &mut self,
        emitter: &mut Emitter<I>,
        value: CompilationValue,
    ) -> Result<()> {
        let arg = match value {
            CompilationValue::Const(v) if self.args.is_empty() => Arg::Deferred(v),
            other => {
                emitter.materialize(other)?;
                Arg::Materialized
            }
        };
        self.args.push(arg);
        Ok(())
    }

    /// Resolves the method, checks arity, and emits the map opcode.
    ///
    /// # Errors
    /// Returns [`ErrorKind::UnknownMethod`] or [`ErrorKind::ArityMismatch`].
    pub fn finish<I: InstructionSet>(
        mut self,
        emitter: &mut Emitter<I>,
        method: &str,
        method_span: Span,
    ) -> Result<CompilationValue> {
        let Some(resolved) = MapMethod::from_name(method) else {
            return Err(Error::new(ErrorKind::UnknownMethod(method.to_string()))
                .with_context(method_span.context()));
        };
        if self.args.len() != resolved.arity() {
            return Err(
                Error::arity_mismatch(resolved.name(), resolved.arity(), self.args.len())
                    .with_context(self.span.context()),
            );
        }

        if resolved == MapMethod::Get && emitter.options().const_key_lookup {
            if let [Arg::Deferred(key @ Value::String(_))] = self.args.entries() {
                let key = key.clone();
                let chunk = emitter.chunk_mut();
                let index = chunk.add_constant(key)?;
                chunk.emit(I::map(MapOp::GetConst(index)));
                return Ok(CompilationValue::OnStack);
            }
        }

        let chunk = emitter.chunk_mut();
        self.args.flush(chunk)?;
        chunk.emit(I::map(resolved.stack_op()));
        Ok(CompilationValue::OnStack)
    }
}
