//! Integration tests for Layer 1: Language
//!
//! Tests for the lexer, parser, both compilers, and both VMs.

mod compiler;
mod parser;
mod stream;
mod vm;
