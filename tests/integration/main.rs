//! Cross-layer integration tests for mapexpr
//!
//! Tests that verify both compiler/VM pairs agree end to end, and that the
//! debug layer observes them correctly.

mod equivalence;
mod scenarios;
mod tracing;
