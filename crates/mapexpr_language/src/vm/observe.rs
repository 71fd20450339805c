//! Execution hooks for tracing and debugging.

use std::fmt;

use mapexpr_foundation::{Error, Value};

/// One instruction about to execute.
#[derive(Clone, Copy)]
pub struct StepEvent<'a> {
    /// Index of the instruction.
    pub ip: usize,
    /// The instruction, rendered on demand.
    pub instruction: &'a dyn fmt::Display,
    /// Operand stack depth before the instruction runs.
    pub stack_depth: usize,
}

impl fmt::Debug for StepEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepEvent")
            .field("ip", &self.ip)
            .field("instruction", &self.instruction.to_string())
            .field("stack_depth", &self.stack_depth)
            .finish()
    }
}

/// Receives execution events from either VM.
pub trait ExecutionObserver {
    /// Called once before the first instruction.
    fn on_start(&mut self, _instructions: usize) {}

    /// Called before each instruction.
    fn on_step(&mut self, event: &StepEvent<'_>);

    /// Called when execution fails.
    fn on_error(&mut self, _error: &Error) {}

    /// Called with the result of a successful run.
    fn on_finish(&mut self, _result: &Value) {}
}

/// An observer that records nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoObserver;

impl ExecutionObserver for NoObserver {
    #[inline]
    fn on_step(&mut self, _event: &StepEvent<'_>) {}
}

/// Counts executed instructions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepCounter {
    /// Instructions executed so far.
    pub steps: usize,
    /// Deepest stack seen before an instruction.
    pub max_depth: usize,
}

impl ExecutionObserver for StepCounter {
    fn on_step(&mut self, event: &StepEvent<'_>) {
        self.steps += 1;
        self.max_depth = self.max_depth.max(event.stack_depth);
    }
}
