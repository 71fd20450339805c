//! Bytecode emission shared by both compilers.
//!
//! A front end drives an [`Emitter`] as it recognizes expressions. The
//! emitter owns the instruction buffer and constant pool, tracks which
//! subexpressions are still compile-time constants, and decides what to emit
//! for every operator. The instruction set is a type parameter, so the stack
//! compiler and the streaming compiler share one lowering policy.
//!
//! Invariant: a [`CompilationValue::Const`] has emitted no instructions. The
//! lowering code relies on this to insert a deferred left operand at a
//! recorded mark, and to drop dead code by truncating to a mark.

#![allow(clippy::module_name_repetitions)]

use std::fmt;

use mapexpr_foundation::{Error, ErrorKind, Result, Value};

use crate::config::CompilerOptions;
use crate::member::MapOp;
use crate::ops::{BinaryOp, LogicalOp, UnaryOp};

/// Number of slots a constant pool can address.
pub const MAX_CONSTANTS: usize = u16::MAX as usize + 1;

// =============================================================================
// Instruction Set
// =============================================================================

/// The instruction constructors and queries the shared lowering needs.
pub trait InstructionSet: Clone + fmt::Debug + fmt::Display + PartialEq {
    /// Push `constants[index]`.
    fn push_const(index: u16) -> Self;
    /// Discard the top of stack.
    fn pop() -> Self;
    /// Duplicate the top of stack.
    fn dup() -> Self;
    /// Push the variable named by `constants[name]`.
    fn load_global(name: u16) -> Self;
    /// Pop into the variable named by `constants[name]`.
    fn store_global(name: u16) -> Self;
    /// Pop two operands, push the result.
    fn binary(op: BinaryOp) -> Self;
    /// Pop one operand, push the result.
    fn unary(op: UnaryOp) -> Self;
    /// Unconditional forward jump with an unpatched offset.
    fn jump() -> Self;
    /// Pop a condition and jump forward when it is falsy; offset unpatched.
    fn jump_if_not() -> Self;
    /// A map opcode.
    fn map(op: MapOp) -> Self;

    /// Returns the name operand if this is a variable load.
    fn as_load_global(&self) -> Option<u16>;
    /// Returns the constant operand if this is a literal push.
    fn as_push_const(&self) -> Option<u16>;
    /// Returns any operand that indexes the constant pool.
    fn constant_operand(&self) -> Option<u16>;
    /// Sets the offset of a jump. Returns false for non-jumps.
    fn set_jump_offset(&mut self, offset: u16) -> bool;
    /// Returns the forward offset of a jump.
    fn jump_offset(&self) -> Option<u16>;
    /// Returns true for an explicit end-of-program instruction.
    fn is_return(&self) -> bool {
        false
    }
}

// =============================================================================
// Constant Pool
// =============================================================================

/// Append-only literal pool.
///
/// Every addition gets a fresh slot; equal literals are not merged and
/// indices are never renumbered.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConstantPool {
    values: Vec<Value>,
}

impl ConstantPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value and returns its index.
    ///
    /// # Errors
    /// Returns an error once the pool holds [`MAX_CONSTANTS`] values.
    pub fn add(&mut self, value: Value) -> Result<u16> {
        let index = u16::try_from(self.values.len()).map_err(|_| {
            Error::new(ErrorKind::ConstantPoolOverflow {
                limit: MAX_CONSTANTS,
            })
        })?;
        self.values.push(value);
        Ok(index)
    }

    /// Returns the value at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Returns the number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the pool is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the slots in index order.
    #[must_use]
    pub fn as_slice(&self) -> &[Value] {
        &self.values
    }
}

// =============================================================================
// Chunk
// =============================================================================

/// An instruction buffer with its constant pool.
///
/// This is also the compiled program handed to a VM.
#[derive(Clone, Debug, PartialEq)]
pub struct Chunk<I> {
    /// Instructions in execution order.
    pub code: Vec<I>,
    /// Literals referenced by the instructions.
    pub constants: ConstantPool,
}

impl<I> Default for Chunk<I> {
    fn default() -> Self {
        Self {
            code: Vec::new(),
            constants: ConstantPool::new(),
        }
    }
}

impl<I: InstructionSet> Chunk<I> {
    /// Creates an empty chunk.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an instruction and returns its index.
    pub fn emit(&mut self, instr: I) -> usize {
        self.code.push(instr);
        self.code.len() - 1
    }

    /// Appends a constant and returns its pool index.
    ///
    /// # Errors
    /// Returns an error when the pool is full.
    pub fn add_constant(&mut self, value: Value) -> Result<u16> {
        self.constants.add(value)
    }

    /// Emits a push of a fresh constant slot holding `value`.
    ///
    /// # Errors
    /// Returns an error when the pool is full.
    pub fn emit_push(&mut self, value: Value) -> Result<usize> {
        let index = self.add_constant(value)?;
        Ok(self.emit(I::push_const(index)))
    }

    /// Returns the position the next instruction will occupy.
    #[must_use]
    pub fn mark(&self) -> usize {
        self.code.len()
    }

    /// Inserts a push of `value` at an earlier position.
    ///
    /// Jumps are relative and forward, so instructions already emitted after
    /// `mark` keep their meaning.
    ///
    /// # Errors
    /// Returns an error when the pool is full.
    pub fn push_at(&mut self, mark: usize, value: Value) -> Result<()> {
        let index = self.add_constant(value)?;
        self.code.insert(mark.min(self.code.len()), I::push_const(index));
        Ok(())
    }

    /// Discards every instruction emitted after `mark`.
    ///
    /// Constants those instructions added stay in the pool.
    pub fn truncate(&mut self, mark: usize) {
        self.code.truncate(mark);
    }

    /// Returns the most recently emitted instruction.
    #[must_use]
    pub fn last(&self) -> Option<&I> {
        self.code.last()
    }

    /// Removes and returns the most recently emitted instruction.
    pub fn pop_last(&mut self) -> Option<I> {
        self.code.pop()
    }

    /// Emits a jump to be patched later and returns its index.
    pub fn emit_jump(&mut self, jump: I) -> usize {
        self.emit(jump)
    }

    /// Points the jump at `at` to the next instruction to be emitted.
    ///
    /// # Errors
    /// Returns an error if `at` is not a jump or the distance does not fit.
    pub fn patch_jump(&mut self, at: usize) -> Result<()> {
        let distance = self.code.len().saturating_sub(at + 1);
        let offset =
            u16::try_from(distance).map_err(|_| Error::new(ErrorKind::JumpTooFar { distance }))?;
        if self
            .code
            .get_mut(at)
            .is_some_and(|instr| instr.set_jump_offset(offset))
        {
            Ok(())
        } else {
            Err(Error::internal(format!("no jump to patch at {at}")))
        }
    }

    /// Returns the value of a program that is nothing but one literal push.
    #[must_use]
    pub fn constant_result(&self) -> Option<&Value> {
        let mut body = self.code.iter().filter(|i| !i.is_return());
        match (body.next(), body.next()) {
            (Some(only), None) => only
                .as_push_const()
                .and_then(|i| self.constants.get(usize::from(i))),
            _ => None,
        }
    }
}

// =============================================================================
// Compilation Values
// =============================================================================

/// What the compiler knows about a compiled subexpression.
#[derive(Clone, Debug, PartialEq)]
pub enum CompilationValue {
    /// A literal known at compile time. Nothing has been emitted for it yet.
    Const(Value),
    /// The value will be on top of the runtime stack.
    OnStack,
}

impl CompilationValue {
    /// Returns true for [`CompilationValue::Const`].
    #[must_use]
    pub fn is_const(&self) -> bool {
        matches!(self, Self::Const(_))
    }

    /// Returns the literal if known.
    #[must_use]
    pub fn as_const(&self) -> Option<&Value> {
        match self {
            Self::Const(v) => Some(v),
            Self::OnStack => None,
        }
    }
}

// =============================================================================
// Pending Control Flow
// =============================================================================

/// A `&&` / `||` whose right operand is being compiled.
#[derive(Debug)]
#[must_use]
pub struct PendingLogical(LogicalState);

#[derive(Debug)]
enum LogicalState {
    /// Constant left decided the result; right is compiled then dropped.
    Decided { result: bool, mark: usize },
    /// Constant left did not decide; the result is the right's truthiness.
    RightDecides,
    /// `&&` with the left on the stack; jumps to `false` when falsy.
    And { skip: usize },
    /// `||` with `true` already handled; right runs when left was falsy.
    Or { end: usize },
}

/// An `if` whose then-branch is being compiled.
#[derive(Debug)]
#[must_use]
pub struct PendingThen(ThenState);

#[derive(Debug)]
enum ThenState {
    Static { taken: bool, mark: usize },
    Dynamic { skip: usize },
}

/// An `if` whose else-branch is being compiled.
#[derive(Debug)]
#[must_use]
pub struct PendingElse(ElseState);

#[derive(Debug)]
enum ElseState {
    /// Condition was truthy; the else-branch is dead code.
    KeepThen { value: CompilationValue, mark: usize },
    /// Condition was falsy; the then-branch was already dropped.
    TakeElse,
    Dynamic { end: usize },
}

// =============================================================================
// Emitter
// =============================================================================

/// Lowers expressions into a [`Chunk`].
#[derive(Debug)]
pub struct Emitter<I> {
    chunk: Chunk<I>,
    options: CompilerOptions,
}

impl<I: InstructionSet> Emitter<I> {
    /// Creates an emitter with an empty chunk.
    #[must_use]
    pub fn new(options: CompilerOptions) -> Self {
        Self {
            chunk: Chunk::new(),
            options,
        }
    }

    /// Returns the compiler options.
    #[must_use]
    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Returns the chunk built so far.
    #[must_use]
    pub fn chunk(&self) -> &Chunk<I> {
        &self.chunk
    }

    pub(crate) fn chunk_mut(&mut self) -> &mut Chunk<I> {
        &mut self.chunk
    }

    /// Returns the position the next instruction will occupy.
    #[must_use]
    pub fn mark(&self) -> usize {
        self.chunk.mark()
    }

    /// Emits the push for a deferred literal. No-op for stack values.
    ///
    /// # Errors
    /// Returns an error when the pool is full.
    pub fn materialize(&mut self, value: CompilationValue) -> Result<()> {
        if let CompilationValue::Const(v) = value {
            self.chunk.emit_push(v)?;
        }
        Ok(())
    }

    /// Stores a variable name in the pool.
    ///
    /// # Errors
    /// Returns an error when the pool is full.
    pub fn name_constant(&mut self, name: &str) -> Result<u16> {
        self.chunk.add_constant(Value::from(name))
    }

    /// Emits a variable load.
    ///
    /// # Errors
    /// Returns an error when the pool is full.
    pub fn load(&mut self, name: &str) -> Result<CompilationValue> {
        let index = self.name_constant(name)?;
        self.chunk.emit(I::load_global(index));
        Ok(CompilationValue::OnStack)
    }

    /// Turns an already-compiled left operand into an assignment target.
    ///
    /// The left operand must be exactly one variable load emitted from
    /// `left_start`; the load is removed and its name index returned.
    ///
    /// # Errors
    /// Returns [`ErrorKind::InvalidAssignTarget`] for anything else.
    pub fn assign_target(&mut self, left: &CompilationValue, left_start: usize) -> Result<u16> {
        let bare_load = !left.is_const() && self.chunk.mark() == left_start + 1;
        match self.chunk.last().and_then(I::as_load_global) {
            Some(name) if bare_load => {
                self.chunk.pop_last();
                Ok(name)
            }
            _ => Err(Error::new(ErrorKind::InvalidAssignTarget)),
        }
    }

    /// Stores `value` into a variable; the assignment evaluates to `value`.
    ///
    /// # Errors
    /// Returns an error when the pool is full.
    pub fn assign(&mut self, name: u16, value: CompilationValue) -> Result<CompilationValue> {
        self.materialize(value)?;
        self.chunk.emit(I::dup());
        self.chunk.emit(I::store_global(name));
        Ok(CompilationValue::OnStack)
    }

    /// Lowers a prefix operator.
    ///
    /// # Errors
    /// Returns an error when the pool is full.
    pub fn unary(&mut self, op: UnaryOp, operand: CompilationValue) -> Result<CompilationValue> {
        if let CompilationValue::Const(v) = &operand {
            if self.options.fold_constants {
                if let Ok(folded) = op.apply(v) {
                    return Ok(CompilationValue::Const(folded));
                }
            }
        }
        self.materialize(operand)?;
        self.chunk.emit(I::unary(op));
        Ok(CompilationValue::OnStack)
    }

    /// Lowers an eager binary operator.
    ///
    /// `mark` is the position recorded after the left operand and before the
    /// right one. A constant left operand is materialized there so it lands
    /// below the right operand on the stack. Folds that would fail are left
    /// for the VM to report.
    ///
    /// # Errors
    /// Returns an error when the pool is full.
    pub fn binary(
        &mut self,
        op: BinaryOp,
        left: CompilationValue,
        mark: usize,
        right: CompilationValue,
    ) -> Result<CompilationValue> {
        if let (CompilationValue::Const(a), CompilationValue::Const(b)) = (&left, &right) {
            if self.options.fold_constants {
                if let Ok(folded) = op.apply(a, b) {
                    return Ok(CompilationValue::Const(folded));
                }
            }
        }
        if let CompilationValue::Const(a) = left {
            self.chunk.push_at(mark, a)?;
        }
        self.materialize(right)?;
        self.chunk.emit(I::binary(op));
        Ok(CompilationValue::OnStack)
    }

    /// Starts a short-circuiting operator once its left operand is compiled.
    ///
    /// # Errors
    /// Returns an error when the pool is full.
    pub fn logical_begin(
        &mut self,
        op: LogicalOp,
        left: CompilationValue,
    ) -> Result<PendingLogical> {
        if let CompilationValue::Const(v) = &left {
            if self.options.fold_constants {
                let truthy = v.is_truthy();
                let state = if op.short_circuits(truthy) {
                    LogicalState::Decided {
                        result: truthy,
                        mark: self.chunk.mark(),
                    }
                } else {
                    LogicalState::RightDecides
                };
                return Ok(PendingLogical(state));
            }
        }

        self.materialize(left)?;
        let state = match op {
            LogicalOp::And => LogicalState::And {
                skip: self.chunk.emit_jump(I::jump_if_not()),
            },
            LogicalOp::Or => {
                let to_right = self.chunk.emit_jump(I::jump_if_not());
                self.chunk.emit_push(Value::Bool(true))?;
                let end = self.chunk.emit_jump(I::jump());
                self.chunk.patch_jump(to_right)?;
                LogicalState::Or { end }
            }
        };
        Ok(PendingLogical(state))
    }

    /// Finishes a short-circuiting operator. The result is always a bool.
    ///
    /// # Errors
    /// Returns an error when the pool is full or a jump cannot be patched.
    pub fn logical_end(
        &mut self,
        pending: PendingLogical,
        right: CompilationValue,
    ) -> Result<CompilationValue> {
        match pending.0 {
            LogicalState::Decided { result, mark } => {
                self.chunk.truncate(mark);
                Ok(CompilationValue::Const(Value::Bool(result)))
            }
            LogicalState::RightDecides => match right {
                CompilationValue::Const(v) => Ok(CompilationValue::Const(Value::Bool(v.is_truthy()))),
                CompilationValue::OnStack => {
                    self.emit_truthiness();
                    Ok(CompilationValue::OnStack)
                }
            },
            LogicalState::And { skip } => {
                self.materialize(right)?;
                self.emit_truthiness();
                let end = self.chunk.emit_jump(I::jump());
                self.chunk.patch_jump(skip)?;
                self.chunk.emit_push(Value::Bool(false))?;
                self.chunk.patch_jump(end)?;
                Ok(CompilationValue::OnStack)
            }
            LogicalState::Or { end } => {
                self.materialize(right)?;
                self.emit_truthiness();
                self.chunk.patch_jump(end)?;
                Ok(CompilationValue::OnStack)
            }
        }
    }

    /// Replaces the top of stack with its truthiness.
    fn emit_truthiness(&mut self) {
        self.chunk.emit(I::unary(UnaryOp::Not));
        self.chunk.emit(I::unary(UnaryOp::Not));
    }

    /// Discards the value of the left side of `=>`.
    pub fn discard(&mut self, value: &CompilationValue) {
        if !value.is_const() {
            self.chunk.emit(I::pop());
        }
    }

    /// Starts an `if` once its condition is compiled.
    ///
    /// # Errors
    /// Returns an error when the pool is full.
    pub fn if_begin(&mut self, cond: CompilationValue) -> Result<PendingThen> {
        if let CompilationValue::Const(v) = &cond {
            if self.options.fold_constants {
                return Ok(PendingThen(ThenState::Static {
                    taken: v.is_truthy(),
                    mark: self.chunk.mark(),
                }));
            }
        }
        self.materialize(cond)?;
        let skip = self.chunk.emit_jump(I::jump_if_not());
        Ok(PendingThen(ThenState::Dynamic { skip }))
    }

    /// Moves from the then-branch to the else-branch.
    ///
    /// # Errors
    /// Returns an error when the pool is full or a jump cannot be patched.
    pub fn if_else(
        &mut self,
        pending: PendingThen,
        then_value: CompilationValue,
    ) -> Result<PendingElse> {
        let state = match pending.0 {
            ThenState::Static { taken: true, .. } => ElseState::KeepThen {
                value: then_value,
                mark: self.chunk.mark(),
            },
            ThenState::Static { taken: false, mark } => {
                self.chunk.truncate(mark);
                ElseState::TakeElse
            }
            ThenState::Dynamic { skip } => {
                self.materialize(then_value)?;
                let end = self.chunk.emit_jump(I::jump());
                self.chunk.patch_jump(skip)?;
                ElseState::Dynamic { end }
            }
        };
        Ok(PendingElse(state))
    }

    /// Finishes an `if`. A missing else-branch yields nil.
    ///
    /// # Errors
    /// Returns an error when the pool is full or a jump cannot be patched.
    pub fn if_end(
        &mut self,
        pending: PendingElse,
        else_value: Option<CompilationValue>,
    ) -> Result<CompilationValue> {
        let else_value = else_value.unwrap_or(CompilationValue::Const(Value::Nil));
        match pending.0 {
            ElseState::KeepThen { value, mark } => {
                self.chunk.truncate(mark);
                Ok(value)
            }
            ElseState::TakeElse => Ok(else_value),
            ElseState::Dynamic { end } => {
                self.materialize(else_value)?;
                self.chunk.patch_jump(end)?;
                Ok(CompilationValue::OnStack)
            }
        }
    }

    /// Materializes the final result and returns the finished chunk.
    ///
    /// # Errors
    /// Returns an error when the pool is full.
    pub fn finish(mut self, result: CompilationValue) -> Result<Chunk<I>> {
        self.materialize(result)?;
        Ok(self.chunk)
    }
}
