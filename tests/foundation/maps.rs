//! Integration tests for MapRef
//!
//! Tests shared-handle semantics and the persistent map underneath.

use mapexpr_foundation::{LtMap, MapRef, Value};
use std::sync::Arc;

#[test]
fn clones_alias_one_map() {
    let a = MapRef::new();
    let b = a.clone();
    b.insert("k", 1);
    assert_eq!(a.get("k"), Some(Value::Int(1)));
    assert!(a.ptr_eq(&b));
}

#[test]
fn insert_returns_previous() {
    let map = MapRef::new();
    assert_eq!(map.insert("k", 1), None);
    assert_eq!(map.insert("k", 2), Some(Value::Int(1)));
    assert_eq!(map.len(), 1);
}

#[test]
fn remove_missing_is_none() {
    let map = MapRef::from_iter([("a", 1)]);
    assert_eq!(map.remove("b"), None);
    assert_eq!(map.remove("a"), Some(Value::Int(1)));
    assert!(map.is_empty());
}

#[test]
fn empty_key_is_a_key() {
    let map = MapRef::new();
    map.insert("", "empty");
    assert!(map.contains_key(""));
    assert_eq!(map.get(""), Some(Value::from("empty")));
}

#[test]
fn snapshot_is_isolated() {
    let map = MapRef::from_iter([("a", 1)]);
    let snap = map.snapshot();
    map.insert("b", 2);
    assert_eq!(snap.len(), 1);
    assert_eq!(map.len(), 2);
}

#[test]
fn sorted_entries_order_by_key() {
    let map = MapRef::from_iter([("c", 3), ("a", 1), ("b", 2)]);
    let keys: Vec<Arc<str>> = map.sorted_entries().into_iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec![Arc::from("a"), Arc::from("b"), Arc::from("c")]);
}

#[test]
fn structural_equality_between_handles() {
    let a = MapRef::from_iter([("k", 1)]);
    let b = MapRef::from_iter([("k", 1)]);
    assert_eq!(a, b);
    assert!(!a.ptr_eq(&b));
    b.insert("k", 2);
    assert_ne!(a, b);
}

#[test]
fn nested_maps_stay_shared() {
    let inner = MapRef::new();
    let outer = MapRef::from_iter([("inner", inner.clone())]);
    inner.insert("x", 1);
    let Some(Value::Map(loaded)) = outer.get("inner") else {
        panic!("expected a map");
    };
    assert!(loaded.ptr_eq(&inner));
    assert_eq!(loaded.get("x"), Some(Value::Int(1)));
}

#[test]
fn ltmap_is_persistent() {
    let m1: LtMap<&str, i32> = LtMap::new().update("a", 1);
    let m2 = m1.update("b", 2).without("a");
    assert_eq!(m1.len(), 1);
    assert_eq!(m2.len(), 1);
    assert_eq!(m2.get("b"), Some(&2));
    assert!(m1.contains_key("a"));
}
