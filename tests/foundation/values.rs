//! Integration tests for Value types
//!
//! Tests construction, truthiness, equality, conversions, and display.

use mapexpr_foundation::{MapRef, Type, Value};
use proptest::prelude::*;
use std::sync::Arc;

// =============================================================================
// Value Construction
// =============================================================================

#[test]
fn value_nil() {
    let v = Value::Nil;
    assert!(v.is_nil());
    assert!(!v.is_truthy());
    assert_eq!(v.value_type(), Type::Nil);
}

#[test]
fn value_bools() {
    assert!(Value::Bool(true).is_truthy());
    assert!(!Value::Bool(false).is_truthy());
    assert_eq!(Value::Bool(true).as_bool(), Some(true));
}

#[test]
fn value_numbers() {
    let v = Value::Int(42);
    assert_eq!(v.as_int(), Some(42));
    assert_eq!(v.as_float(), None);
    assert_eq!(v.as_number(), Some(42.0));

    let v = Value::Float(1.5);
    assert_eq!(v.as_float(), Some(1.5));
    assert_eq!(v.as_int(), None);
}

#[test]
fn zero_and_empty_string_are_truthy() {
    // Only nil and false are falsy
    assert!(Value::Int(0).is_truthy());
    assert!(Value::from("").is_truthy());
    assert!(Value::Map(MapRef::new()).is_truthy());
}

#[test]
fn value_string() {
    let v = Value::String(Arc::from("hello"));
    assert_eq!(v.as_str(), Some("hello"));
    assert_eq!(v.value_type(), Type::String);
}

// =============================================================================
// Host Conversions
// =============================================================================

#[test]
fn from_host_scalars() {
    assert_eq!(Value::from(7i8), Value::Int(7));
    assert_eq!(Value::from(7u32), Value::Int(7));
    assert_eq!(Value::from(7i64), Value::Int(7));
    assert_eq!(Value::from(true), Value::Bool(true));
    assert_eq!(Value::from(2.5f64), Value::Float(2.5));
    assert_eq!(Value::from(String::from("s")), Value::from("s"));
    assert_eq!(Value::from(Arc::<str>::from("s")), Value::from("s"));
}

#[test]
fn from_option() {
    assert_eq!(Value::from(None::<i64>), Value::Nil);
    assert_eq!(Value::from(Some(3)), Value::Int(3));
}

#[test]
fn foreign_values_keep_identity() {
    #[derive(Debug, PartialEq)]
    struct Handle(u32);

    let a = Value::foreign(Handle(1));
    let b = Value::foreign(Handle(1));
    assert_eq!(a.value_type(), Type::Foreign);
    assert_eq!(a.as_foreign::<Handle>(), Some(&Handle(1)));
    assert_eq!(a.as_foreign::<u32>(), None);
    assert_eq!(a, a.clone());
    assert_ne!(a, b);
}

// =============================================================================
// Equality and Display
// =============================================================================

#[test]
fn cross_type_values_are_unequal() {
    assert_ne!(Value::Int(1), Value::Bool(true));
    assert_ne!(Value::Nil, Value::Bool(false));
    assert_ne!(Value::from("1"), Value::Int(1));
}

#[test]
fn display_and_debug() {
    assert_eq!(Value::Nil.to_string(), "nil");
    assert_eq!(Value::from("hi").to_string(), "hi");
    assert_eq!(format!("{:?}", Value::from("hi")), "\"hi\"");

    let map = MapRef::from_iter([("b", 2), ("a", 1)]);
    assert_eq!(Value::Map(map).to_string(), r#"{"a": 1, "b": 2}"#);
}

#[test]
fn self_containing_map_displays() {
    let map = MapRef::new();
    map.insert("me", map.clone());
    let shown = Value::Map(map.clone()).to_string();
    assert!(shown.contains("..."));
    assert_eq!(Value::Map(map.clone()), Value::Map(map));
}

// =============================================================================
// Properties
// =============================================================================

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Nil),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        any::<f64>().prop_map(Value::Float),
        "[a-z]{0,8}".prop_map(|s| Value::from(s.as_str())),
    ]
}

proptest! {
    #[test]
    fn equality_is_reflexive(v in scalar()) {
        prop_assert_eq!(&v, &v.clone());
    }

    #[test]
    fn equality_is_symmetric(a in scalar(), b in scalar()) {
        prop_assert_eq!(a == b, b == a);
    }

    #[test]
    fn only_nil_and_false_are_falsy(v in scalar()) {
        let falsy = matches!(v, Value::Nil | Value::Bool(false));
        prop_assert_eq!(v.is_truthy(), !falsy);
    }
}
