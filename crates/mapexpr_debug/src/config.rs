//! Configuration for the observability system.

use crate::trace::{Tracer, TracerConfig};

/// How much of a run the tracer records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TraceVerbosity {
    /// Run boundaries and errors only.
    #[default]
    Minimal,
    /// Every executed instruction as well.
    Standard,
}

impl TraceVerbosity {
    /// Returns true if individual steps are recorded.
    #[must_use]
    pub fn records_steps(self) -> bool {
        matches!(self, Self::Standard)
    }
}

/// Configuration for the observability system.
///
/// Controls whether runs are traced, how much is kept, and where the
/// trace is echoed.
#[derive(Clone, Debug)]
pub struct ObservabilityConfig {
    /// Whether observability is enabled (false = zero overhead).
    pub enabled: bool,

    /// What the tracer records.
    pub verbosity: TraceVerbosity,

    /// Trace ring buffer size (number of records to retain).
    pub buffer_size: usize,

    /// Output trace to stderr.
    pub trace_to_stderr: bool,

    /// Output format: true for JSON, false for human-readable.
    pub json_output: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            verbosity: TraceVerbosity::Minimal,
            buffer_size: 1000,
            trace_to_stderr: true,
            json_output: false,
        }
    }
}

impl ObservabilityConfig {
    /// Creates a new configuration with observability enabled.
    #[must_use]
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    /// Creates a configuration for development: steps recorded, nothing echoed.
    #[must_use]
    pub fn development() -> Self {
        Self {
            enabled: true,
            verbosity: TraceVerbosity::Standard,
            buffer_size: 1000,
            trace_to_stderr: false,
            json_output: false,
        }
    }

    /// Creates a configuration for debugging: steps recorded and echoed.
    #[must_use]
    pub fn debug() -> Self {
        Self {
            enabled: true,
            verbosity: TraceVerbosity::Standard,
            buffer_size: 10_000,
            trace_to_stderr: true,
            json_output: false,
        }
    }

    /// Builder method to set enabled state.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Builder method to set verbosity.
    #[must_use]
    pub fn with_verbosity(mut self, verbosity: TraceVerbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Builder method to set buffer size.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Builder method to set stderr output.
    #[must_use]
    pub fn with_trace_to_stderr(mut self, enabled: bool) -> Self {
        self.trace_to_stderr = enabled;
        self
    }

    /// Builder method to set JSON output.
    #[must_use]
    pub fn with_json_output(mut self, enabled: bool) -> Self {
        self.json_output = enabled;
        self
    }

    /// Builds the tracer this configuration describes.
    #[must_use]
    pub fn tracer(&self) -> Tracer {
        let mut config = TracerConfig::new()
            .with_buffer_size(self.buffer_size)
            .with_steps(self.verbosity.records_steps());
        config.enabled = self.enabled;
        if self.trace_to_stderr {
            config = config.to_stderr();
        }
        if self.json_output {
            config = config.json();
        }
        Tracer::new(config)
    }
}
