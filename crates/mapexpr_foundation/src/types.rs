//! Type descriptors for diagnostics.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Type descriptor for runtime values.
///
/// Used by type errors to report what an operation expected and what it got.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Type {
    /// The nil type (only value: nil).
    Nil,
    /// Boolean type.
    Bool,
    /// 64-bit signed integer.
    Int,
    /// 64-bit floating point.
    Float,
    /// Either numeric type.
    Number,
    /// String type.
    String,
    /// String-keyed map.
    Map,
    /// An opaque host value.
    Foreign,
    /// Any type (accepts any value).
    Any,
}

impl Type {
    /// Returns true if a value of type `other` is accepted where `self` is expected.
    #[must_use]
    pub fn accepts(self, other: Type) -> bool {
        match self {
            Self::Any => true,
            Self::Number => matches!(other, Self::Int | Self::Float | Self::Number),
            _ => self == other,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Nil => "nil",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Number => "number",
            Self::String => "string",
            Self::Map => "map",
            Self::Foreign => "foreign",
            Self::Any => "any",
        };
        f.write_str(name)
    }
}
