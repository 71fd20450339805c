//! Compiler, VM, and engine configuration.

/// Optimization presets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OptimizationLevel {
    /// Emit every operation as written.
    None,
    /// Fold constants and use constant-key map lookups.
    #[default]
    Basic,
}

/// Options that change what the compilers emit, never what programs compute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Evaluate operators over literals at compile time.
    pub fold_constants: bool,
    /// Compile `m.get("literal")` to a single constant-key lookup.
    pub const_key_lookup: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self::for_level(OptimizationLevel::default())
    }
}

impl CompilerOptions {
    /// Creates the default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options for a preset.
    #[must_use]
    pub fn for_level(level: OptimizationLevel) -> Self {
        let on = level == OptimizationLevel::Basic;
        Self {
            fold_constants: on,
            const_key_lookup: on,
        }
    }

    /// Builder method to toggle constant folding.
    #[must_use]
    pub fn with_constant_folding(mut self, enabled: bool) -> Self {
        self.fold_constants = enabled;
        self
    }

    /// Builder method to toggle constant-key map lookups.
    #[must_use]
    pub fn with_const_key_lookup(mut self, enabled: bool) -> Self {
        self.const_key_lookup = enabled;
        self
    }
}

/// VM limits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VmConfig {
    /// Maximum operand stack depth.
    pub max_stack_depth: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            max_stack_depth: 1024,
        }
    }
}

impl VmConfig {
    /// Builder method to set the stack limit.
    #[must_use]
    pub fn with_max_stack_depth(mut self, depth: usize) -> Self {
        self.max_stack_depth = depth;
        self
    }
}

/// Which compiler/VM pair runs a program.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Backend {
    /// Parse to an expression tree, compile to [`crate::opcode::Opcode`].
    #[default]
    Stack,
    /// Compile tokens directly to [`crate::stream::Instruction`].
    Streaming,
}

/// Everything an [`crate::engine::Engine`] needs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EngineOptions {
    /// Compiler/VM pair.
    pub backend: Backend,
    /// Compiler options.
    pub compiler: CompilerOptions,
    /// VM limits.
    pub vm: VmConfig,
}

impl EngineOptions {
    /// Creates the default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to choose the backend.
    #[must_use]
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Builder method to set an optimization preset.
    #[must_use]
    pub fn with_optimization(mut self, level: OptimizationLevel) -> Self {
        self.compiler = CompilerOptions::for_level(level);
        self
    }

    /// Builder method to replace the compiler options.
    #[must_use]
    pub fn with_compiler(mut self, compiler: CompilerOptions) -> Self {
        self.compiler = compiler;
        self
    }

    /// Builder method to replace the VM limits.
    #[must_use]
    pub fn with_vm(mut self, vm: VmConfig) -> Self {
        self.vm = vm;
        self
    }
}
