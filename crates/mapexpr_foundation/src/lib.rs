//! Core values, shared maps, and error types for mapexpr.
//!
//! This crate provides:
//! - [`Value`] - The tagged runtime value shared by every compiler and VM
//! - [`MapRef`] - A shared, mutable handle to a string-keyed map
//! - [`Type`] - Type descriptors used in diagnostics
//! - [`Error`] - Rich error types with context and a coarse [`ErrorCategory`]
//! - A persistent map ([`LtMap`]) backing map values

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod collections;
pub mod error;
pub mod types;
pub mod value;

pub use collections::{LtMap, MapRef};
pub use error::{Error, ErrorCategory, ErrorContext, ErrorKind, Result};
pub use types::Type;
pub use value::{Foreign, Value};
