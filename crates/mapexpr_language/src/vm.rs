//! Stack-based virtual machine for [`Opcode`] programs.
//!
//! The VM executes compiled bytecode and produces results. Variables are read
//! and written through the [`VmContext`] trait; an unbound name loads as nil.
//! Map opcodes are handled by [`maps`], which the streaming VM shares.
//!
//! The operand stack is cleared at the start of every run and discarded
//! when a run fails. Errors carry the index of the failing instruction.

mod context;
pub mod maps;
pub mod observe;
mod stack;

pub use context::{Globals, VmContext};
pub use observe::{ExecutionObserver, NoObserver, StepCounter, StepEvent};
pub use stack::OperandStack;

use mapexpr_foundation::{Error, Result, Value};

use crate::config::VmConfig;
use crate::emit::ConstantPool;
use crate::opcode::{CompiledProgram, Opcode};
use crate::ops::{BinaryOp, UnaryOp};

/// Stack-based virtual machine.
#[derive(Debug)]
pub struct Vm {
    /// Operand stack.
    stack: OperandStack,
    /// Instruction pointer.
    ip: usize,
    config: VmConfig,
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl Vm {
    /// Creates a new VM with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(VmConfig::default())
    }

    /// Creates a new VM with the given limits.
    #[must_use]
    pub fn with_config(config: VmConfig) -> Self {
        Self {
            stack: OperandStack::new(config.max_stack_depth),
            ip: 0,
            config,
        }
    }

    /// Returns the VM limits.
    #[must_use]
    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    /// Executes a compiled program and returns the result.
    ///
    /// # Errors
    /// Returns the first runtime error.
    pub fn execute<C: VmContext>(&mut self, program: &CompiledProgram, ctx: &mut C) -> Result<Value> {
        self.execute_observed(program, ctx, &mut NoObserver)
    }

    /// Executes a compiled program, reporting every step to `observer`.
    ///
    /// # Errors
    /// Returns the first runtime error.
    pub fn execute_observed<C: VmContext, O: ExecutionObserver>(
        &mut self,
        program: &CompiledProgram,
        ctx: &mut C,
        observer: &mut O,
    ) -> Result<Value> {
        self.stack.clear();
        self.ip = 0;
        observer.on_start(program.code.len());
        let result = self.run(program, ctx, observer);
        match &result {
            Ok(value) => observer.on_finish(value),
            Err(err) => observer.on_error(err),
        }
        result
    }

    fn run<C: VmContext, O: ExecutionObserver>(
        &mut self,
        program: &CompiledProgram,
        ctx: &mut C,
        observer: &mut O,
    ) -> Result<Value> {
        while let Some(&op) = program.code.get(self.ip) {
            observer.on_step(&StepEvent {
                ip: self.ip,
                instruction: &op,
                stack_depth: self.stack.len(),
            });
            let at = self.ip;
            self.ip += 1;
            self.step(op, &program.constants, ctx)
                .map_err(|err| at_instruction(err, at))?;
        }
        finish(&mut self.stack)
    }

    fn step<C: VmContext>(&mut self, op: Opcode, constants: &ConstantPool, ctx: &mut C) -> Result<()> {
        if let Some(bin) = op.binary_op() {
            return binary(&mut self.stack, bin);
        }
        if let Some(map) = op.map_op() {
            return maps::execute(map, &mut self.stack, constants);
        }

        match op {
            Opcode::Const(idx) => {
                let value = constant(constants, idx)?;
                self.stack.push(value)
            }
            Opcode::Pop => self.stack.pop().map(drop),
            Opcode::Dup => {
                let value = self.stack.peek()?.clone();
                self.stack.push(value)
            }
            Opcode::LoadGlobal(name) => load_global(&mut self.stack, constants, name, ctx),
            Opcode::StoreGlobal(name) => store_global(&mut self.stack, constants, name, ctx),
            Opcode::Neg => unary(&mut self.stack, UnaryOp::Neg),
            Opcode::Not => unary(&mut self.stack, UnaryOp::Not),
            Opcode::Jump(offset) => {
                self.ip += usize::from(offset);
                Ok(())
            }
            Opcode::JumpIfNot(offset) => {
                if !self.stack.pop()?.is_truthy() {
                    self.ip += usize::from(offset);
                }
                Ok(())
            }
            other => Err(Error::internal(format!("unhandled instruction {other}"))),
        }
    }
}

// =============================================================================
// Shared Handlers
// =============================================================================

/// Reads a constant for a literal push.
pub(crate) fn constant(constants: &ConstantPool, index: u16) -> Result<Value> {
    constants
        .get(usize::from(index))
        .cloned()
        .ok_or_else(|| Error::internal(format!("constant {index} out of range")))
}

fn global_name(constants: &ConstantPool, index: u16) -> Result<&str> {
    constants
        .get(usize::from(index))
        .and_then(Value::as_str)
        .ok_or_else(|| Error::internal(format!("constant {index} is not a variable name")))
}

pub(crate) fn load_global<C: VmContext>(
    stack: &mut OperandStack,
    constants: &ConstantPool,
    name: u16,
    ctx: &C,
) -> Result<()> {
    let name = global_name(constants, name)?;
    stack.push(ctx.get_global(name).unwrap_or(Value::Nil))
}

pub(crate) fn store_global<C: VmContext>(
    stack: &mut OperandStack,
    constants: &ConstantPool,
    name: u16,
    ctx: &mut C,
) -> Result<()> {
    let name = global_name(constants, name)?;
    let value = stack.pop()?;
    ctx.set_global(name, value);
    Ok(())
}

pub(crate) fn binary(stack: &mut OperandStack, op: BinaryOp) -> Result<()> {
    let b = stack.pop()?;
    let a = stack.pop()?;
    stack.push(op.apply(&a, &b)?)
}

pub(crate) fn unary(stack: &mut OperandStack, op: UnaryOp) -> Result<()> {
    let a = stack.pop()?;
    stack.push(op.apply(&a)?)
}

/// Pops the program result.
pub(crate) fn finish(stack: &mut OperandStack) -> Result<Value> {
    stack
        .pop()
        .map_err(|_| Error::internal("stack underflow at end of execution"))
}

/// Records the failing instruction on an error.
pub(crate) fn at_instruction(mut err: Error, ip: usize) -> Error {
    let context = err.context.take().unwrap_or_default().with_ip(ip);
    err.with_context(context)
}

// =============================================================================
// Convenience
// =============================================================================

/// Compiles and runs source with an empty environment.
///
/// # Errors
/// Returns any compile or runtime error.
pub fn eval(source: &str) -> Result<Value> {
    eval_with(source, &mut Globals::new())
}

/// Compiles and runs source against `globals`.
///
/// # Errors
/// Returns any compile or runtime error.
pub fn eval_with(source: &str, globals: &mut Globals) -> Result<Value> {
    let program = crate::compiler::compile(source)?;
    Vm::new().execute(&program, globals)
}
