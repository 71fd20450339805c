//! Trace event and record types.
//!
//! This module defines the events a tracer captures while a VM runs.

use mapexpr_foundation::ErrorCategory;

// =============================================================================
// Trace Event
// =============================================================================

/// Events that can be traced during execution.
#[derive(Clone, Debug, PartialEq)]
pub enum TraceEvent {
    /// A run has started.
    RunStart {
        /// Number of instructions in the program.
        instructions: usize,
    },

    /// An instruction is about to execute.
    Step {
        /// Instruction index.
        ip: usize,
        /// The rendered instruction.
        instruction: String,
        /// Operand stack depth before the instruction.
        stack_depth: usize,
    },

    /// A run finished with a result.
    RunEnd {
        /// The rendered result.
        result: String,
    },

    /// A run failed.
    Error {
        /// The rendered error.
        message: String,
        /// Error category.
        category: ErrorCategory,
    },
}

impl TraceEvent {
    /// Returns a short name for the event type.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::RunStart { .. } => "run-start",
            Self::Step { .. } => "step",
            Self::RunEnd { .. } => "run-end",
            Self::Error { .. } => "error",
        }
    }

    /// Returns true if this event opens or closes a run.
    #[must_use]
    pub fn is_run_boundary(&self) -> bool {
        matches!(
            self,
            Self::RunStart { .. } | Self::RunEnd { .. } | Self::Error { .. }
        )
    }
}

// =============================================================================
// Trace Record
// =============================================================================

/// A timestamped trace record.
#[derive(Clone, Debug, PartialEq)]
pub struct TraceRecord {
    /// Unique record ID within the session.
    pub id: u64,
    /// The run this event belongs to.
    pub run: u64,
    /// Timestamp in nanoseconds since session start.
    pub timestamp_ns: u64,
    /// The trace event.
    pub event: TraceEvent,
}

impl TraceRecord {
    /// Creates a new trace record.
    #[must_use]
    pub fn new(id: u64, run: u64, timestamp_ns: u64, event: TraceEvent) -> Self {
        Self {
            id,
            run,
            timestamp_ns,
            event,
        }
    }

    /// Returns the event type name.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        self.event.event_type()
    }
}
