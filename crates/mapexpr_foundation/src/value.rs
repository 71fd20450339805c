//! Core tagged value type shared by the compilers and VMs.

use std::any::Any;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use crate::collections::{InProgress, MapRef};
use crate::types::Type;

/// Nesting depth after which map display elides contents.
///
/// Maps can contain themselves, so printing must terminate.
const MAX_DISPLAY_DEPTH: usize = 8;

/// Core value type for all mapexpr data.
///
/// Scalars are immutable and cheap to clone. A [`Value::Map`] is a shared
/// handle: cloning the value aliases the same map.
#[derive(Clone)]
pub enum Value {
    /// The nil value (represents absence).
    Nil,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
    /// String value.
    String(Arc<str>),
    /// Shared, mutable string-keyed map.
    Map(MapRef),
    /// Opaque host value, passed through untouched.
    Foreign(Foreign),
}

impl Value {
    /// Wraps a host value as an opaque [`Value::Foreign`].
    #[must_use]
    pub fn foreign<T: Any>(value: T) -> Self {
        Self::Foreign(Foreign::new(value))
    }

    /// Returns the type of this value.
    #[must_use]
    pub fn value_type(&self) -> Type {
        match self {
            Self::Nil => Type::Nil,
            Self::Bool(_) => Type::Bool,
            Self::Int(_) => Type::Int,
            Self::Float(_) => Type::Float,
            Self::String(_) => Type::String,
            Self::Map(_) => Type::Map,
            Self::Foreign(_) => Type::Foreign,
        }
    }

    /// Returns true if this value is nil.
    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Returns true if this value is truthy.
    ///
    /// Only `nil` and `false` are falsy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Self::Nil | Self::Bool(false))
    }

    /// Attempts to extract a boolean value.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to extract an integer value.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a float value.
    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a number as f64 (converts int to float).
    ///
    /// Note: Converting large i64 values to f64 may lose precision.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(*n as f64),
            Self::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a string reference.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to extract a map handle.
    #[must_use]
    pub const fn as_map(&self) -> Option<&MapRef> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Attempts to extract a foreign payload of type `T`.
    #[must_use]
    pub fn as_foreign<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Foreign(f) => f.downcast_ref(),
            _ => None,
        }
    }

    /// Equality as scripts see it.
    ///
    /// Like `==` on [`Value`], except that an int and a float holding the
    /// same number are equal, at any nesting depth.
    #[must_use]
    pub fn loose_eq(&self, other: &Self) -> bool {
        self.eq_with(other, &mut InProgress::new(), true)
    }

    #[allow(clippy::cast_precision_loss, clippy::float_cmp)]
    pub(crate) fn eq_with(&self, other: &Self, seen: &mut InProgress, numeric: bool) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) if numeric => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Int(a), Self::Float(b)) | (Self::Float(b), Self::Int(a)) if numeric => {
                *a as f64 == *b
            }
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a.eq_with(b, seen, numeric),
            (Self::Foreign(a), Self::Foreign(b)) => a == b,
            _ => false,
        }
    }

    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>, depth: usize, quoted: bool) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::String(s) if quoted => write!(f, "{s:?}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Map(_) if depth >= MAX_DISPLAY_DEPTH => write!(f, "{{...}}"),
            Self::Map(m) => {
                write!(f, "{{")?;
                for (i, (k, v)) in m.sorted_entries().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k:?}: ")?;
                    v.fmt_nested(f, depth + 1, true)?;
                }
                write!(f, "}}")
            }
            Self::Foreign(x) => write!(f, "{x}"),
        }
    }
}

// Floats compare by bit pattern so equality stays reflexive
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.eq_with(other, &mut InProgress::new(), false)
    }
}

impl PartialOrd for Value {
    #[allow(clippy::cast_precision_loss)]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Nil, Self::Nil) => Some(Ordering::Equal),
            (Self::Bool(a), Self::Bool(b)) => a.partial_cmp(b),
            (Self::Int(a), Self::Int(b)) => a.partial_cmp(b),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            // Cross-type numeric comparison intentionally loses precision for large i64
            (Self::Int(a), Self::Float(b)) => (*a as f64).partial_cmp(b),
            (Self::Float(a), Self::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Self::String(a), Self::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_nested(f, 0, true)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_nested(f, 0, false)
    }
}

// =============================================================================
// Foreign
// =============================================================================

/// An opaque host payload carried through scripts unchanged.
///
/// Equality is identity: two `Foreign` values are equal only when they share
/// the same allocation.
#[derive(Clone)]
pub struct Foreign {
    type_name: &'static str,
    payload: Rc<dyn Any>,
}

impl Foreign {
    /// Wraps a host value.
    #[must_use]
    pub fn new<T: Any>(value: T) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            payload: Rc::new(value),
        }
    }

    /// Returns the Rust type name of the payload.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Attempts to view the payload as `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }
}

impl PartialEq for Foreign {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.payload, &other.payload)
    }
}

impl fmt::Debug for Foreign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Foreign({})", self.type_name)
    }
}

impl fmt::Display for Foreign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.type_name)
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

macro_rules! from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Self::Int(i64::from(n))
                }
            }
        )*
    };
}

from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Self::Float(f64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(Arc::from(s))
    }
}

impl From<Arc<str>> for Value {
    fn from(s: Arc<str>) -> Self {
        Self::String(s)
    }
}

impl From<MapRef> for Value {
    fn from(m: MapRef) -> Self {
        Self::Map(m)
    }
}

impl From<Foreign> for Value {
    fn from(f: Foreign) -> Self {
        Self::Foreign(f)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Nil, Into::into)
    }
}
