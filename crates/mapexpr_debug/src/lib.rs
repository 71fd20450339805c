//! Tracing and disassembly for mapexpr.
//!
//! This crate provides:
//! - [`Tracer`] - an [`ExecutionObserver`](mapexpr_language::ExecutionObserver)
//!   that records every VM step into a bounded [`TraceBuffer`]
//! - [`disasm`] - instruction listings for both compiler outputs
//! - [`ObservabilityConfig`] - one switchboard for the above

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod disasm;
pub mod trace;

pub use config::{ObservabilityConfig, TraceVerbosity};
pub use disasm::{disassemble, disassemble_program};
pub use trace::{
    HumanFormatter, JsonFormatter, RunOutcome, RunSummary, TraceBuffer, TraceBufferStats,
    TraceEvent, TraceFormatter, TraceOutput, TraceRecord, Tracer, TracerConfig,
};
