//! mapexpr - expression compiler and bytecode VMs with map member calls
//!
//! This crate re-exports all layers of the mapexpr system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 2: mapexpr_debug       — Tracing, disassembly
//! Layer 1: mapexpr_language    — Lexer, parser, compilers, bytecode VMs
//! Layer 0: mapexpr_foundation  — Core types (Value, MapRef, Error)
//! ```

pub use mapexpr_debug as debug;
pub use mapexpr_foundation as foundation;
pub use mapexpr_language as language;
