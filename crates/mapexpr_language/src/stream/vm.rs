//! Virtual machine for [`StreamProgram`]s.
//!
//! Dispatches on the opcode byte and shares every operator and map handler
//! with [`crate::vm::Vm`], so both VMs agree on results and errors.

use mapexpr_foundation::{Error, Result, Value};

use crate::config::VmConfig;
use crate::emit::ConstantPool;
use crate::ops::UnaryOp;
use crate::vm::{self, ExecutionObserver, NoObserver, OperandStack, StepEvent, VmContext, maps};

use super::instruction::{Instruction, Op, StreamProgram};

/// Virtual machine for the packed instruction format.
#[derive(Debug)]
pub struct StreamVm {
    stack: OperandStack,
    ip: usize,
    config: VmConfig,
}

impl Default for StreamVm {
    fn default() -> Self {
        Self::new()
    }
}

/// What the dispatch loop does after an instruction.
enum Flow {
    Next,
    Return,
}

impl StreamVm {
    /// Creates a VM with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(VmConfig::default())
    }

    /// Creates a VM with the given limits.
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

    /// Runs a program to its `RET` (or its last instruction).
    ///
    /// # Errors
    /// Returns the first runtime error.
    pub fn execute<C: VmContext>(&mut self, program: &StreamProgram, ctx: &mut C) -> Result<Value> {
        self.execute_observed(program, ctx, &mut NoObserver)
    }

    /// Runs a program, reporting every step to `observer`.
    ///
    /// # Errors
    /// Returns the first runtime error.
    pub fn execute_observed<C: VmContext, O: ExecutionObserver>(
        &mut self,
        program: &StreamProgram,
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
        program: &StreamProgram,
        ctx: &mut C,
        observer: &mut O,
    ) -> Result<Value> {
        while let Some(&instr) = program.code.get(self.ip) {
            observer.on_step(&StepEvent {
                ip: self.ip,
                instruction: &instr,
                stack_depth: self.stack.len(),
            });
            let at = self.ip;
            self.ip += 1;
            match self.step(instr, &program.constants, ctx) {
                Ok(Flow::Next) => {}
                Ok(Flow::Return) => break,
                Err(err) => return Err(vm::at_instruction(err, at)),
            }
        }
        vm::finish(&mut self.stack)
    }

    fn step<C: VmContext>(
        &mut self,
        instr: Instruction,
        constants: &ConstantPool,
        ctx: &mut C,
    ) -> Result<Flow> {
        let stack = &mut self.stack;
        if let Some(op) = instr.op.binary_op() {
            vm::binary(stack, op)?;
            return Ok(Flow::Next);
        }
        if let Some(op) = instr.op.map_op(operand(instr)?) {
            maps::execute(op, stack, constants)?;
            return Ok(Flow::Next);
        }

        match instr.op {
            Op::Push => stack.push(vm::constant(constants, operand(instr)?)?)?,
            Op::Pop => {
                stack.pop()?;
            }
            Op::Dup => {
                let top = stack.peek()?.clone();
                stack.push(top)?;
            }
            Op::GetGlobal => vm::load_global(stack, constants, operand(instr)?, ctx)?,
            Op::SetGlobal => vm::store_global(stack, constants, operand(instr)?, ctx)?,
            Op::Neg => vm::unary(stack, UnaryOp::Neg)?,
            Op::Not => vm::unary(stack, UnaryOp::Not)?,
            Op::Jump => self.ip += jump_distance(instr)?,
            Op::JumpIfFalse => {
                if !stack.pop()?.is_truthy() {
                    self.ip += jump_distance(instr)?;
                }
            }
            Op::Return => return Ok(Flow::Return),
            other => return Err(Error::internal(format!("unhandled opcode {other:?}"))),
        }
        Ok(Flow::Next)
    }
}

fn operand(instr: Instruction) -> Result<u16> {
    if instr.op.has_operand() {
        instr
            .operand()
            .ok_or_else(|| Error::internal(format!("operand out of range in {instr}")))
    } else {
        Ok(0)
    }
}

fn jump_distance(instr: Instruction) -> Result<usize> {
    operand(instr).map(usize::from)
}
