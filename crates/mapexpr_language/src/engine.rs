//! Compile-once, run-many facade over both compiler/VM pairs.

use mapexpr_foundation::{Result, Value};

use crate::compiler::compile_with;
use crate::config::{Backend, EngineOptions};
use crate::opcode::CompiledProgram;
use crate::stream::{StreamProgram, StreamVm, compile_stream_with};
use crate::vm::{ExecutionObserver, NoObserver, Vm, VmContext};

/// A program compiled for one backend.
#[derive(Clone, Debug, PartialEq)]
pub enum Program {
    /// Stack pair output.
    Stack(CompiledProgram),
    /// Streaming pair output.
    Streaming(StreamProgram),
}

impl Program {
    /// Returns the number of instructions.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Stack(p) => p.code.len(),
            Self::Streaming(p) => p.code.len(),
        }
    }

    /// Returns true if the program has no instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the value of a program that folded to one literal.
    #[must_use]
    pub fn constant_result(&self) -> Option<&Value> {
        match self {
            Self::Stack(p) => p.constant_result(),
            Self::Streaming(p) => p.constant_result(),
        }
    }
}

/// A compiled expression ready to run against any environment.
#[derive(Clone, Debug)]
pub struct Engine {
    program: Program,
    options: EngineOptions,
}

impl Engine {
    /// Compiles `source` for the configured backend.
    ///
    /// # Errors
    /// Returns the first syntax or semantic error.
    pub fn new(source: &str, options: EngineOptions) -> Result<Self> {
        let program = match options.backend {
            Backend::Stack => Program::Stack(compile_with(source, options.compiler.clone())?),
            Backend::Streaming => {
                Program::Streaming(compile_stream_with(source, options.compiler.clone())?)
            }
        };
        Ok(Self { program, options })
    }

    /// Returns the backend this engine compiled for.
    #[must_use]
    pub fn backend(&self) -> Backend {
        self.options.backend
    }

    /// Returns the options this engine was built with.
    #[must_use]
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Returns the compiled program.
    #[must_use]
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Returns the result without running anything if the program folded to
    /// a single literal.
    #[must_use]
    pub fn constant_result(&self) -> Option<&Value> {
        self.program.constant_result()
    }

    /// Runs the program against `ctx`.
    ///
    /// # Errors
    /// Returns the first runtime error.
    pub fn execute<C: VmContext>(&self, ctx: &mut C) -> Result<Value> {
        self.execute_observed(ctx, &mut NoObserver)
    }

    /// Runs the program, reporting every step to `observer`.
    ///
    /// # Errors
    /// Returns the first runtime error.
    pub fn execute_observed<C: VmContext, O: ExecutionObserver>(
        &self,
        ctx: &mut C,
        observer: &mut O,
    ) -> Result<Value> {
        if let Some(value) = self.constant_result() {
            observer.on_start(0);
            observer.on_finish(value);
            return Ok(value.clone());
        }
        let vm_config = self.options.vm.clone();
        match &self.program {
            Program::Stack(p) => Vm::with_config(vm_config).execute_observed(p, ctx, observer),
            Program::Streaming(p) => {
                StreamVm::with_config(vm_config).execute_observed(p, ctx, observer)
            }
        }
    }
}
