//! Integration tests for Layer 0: Foundation
//!
//! Tests for core types: Value, MapRef, Type, and Error.

mod errors;
mod maps;
mod values;
