//! End-to-end map scenarios, run through both backends.

use mapexpr::foundation::{ErrorCategory, MapRef, Value};
use mapexpr::language::{Backend, Engine, EngineOptions, Globals};

/// Compiles and runs `source` on both backends, asserting they agree.
fn run_both(source: &str, globals: impl Fn() -> Globals) -> Result<Value, ErrorCategory> {
    let mut results = Vec::new();
    for backend in [Backend::Stack, Backend::Streaming] {
        let options = EngineOptions::new().with_backend(backend);
        let result = Engine::new(source, options)
            .and_then(|engine| engine.execute(&mut globals()))
            .map_err(|e| e.category());
        results.push(result);
    }
    assert_eq!(results[0], results[1], "{source}");
    results.remove(0)
}

fn empty_map() -> Globals {
    Globals::new().with("m", MapRef::new())
}

#[test]
fn get_missing_key_is_nil() {
    assert_eq!(run_both(r#"m.get("none")"#, empty_map), Ok(Value::Nil));
}

#[test]
fn has_missing_key_is_false() {
    assert_eq!(run_both(r#"m.has("none")"#, empty_map), Ok(Value::Bool(false)));
}

#[test]
fn delete_missing_key_then_has() {
    assert_eq!(
        run_both(r#"m.del("none") => m.has("none")"#, empty_map),
        Ok(Value::Bool(false))
    );
}

#[test]
fn overwrite_then_get() {
    assert_eq!(
        run_both(r#"m.set("a", 1) => m.set("a", 2) => m.get("a")"#, empty_map),
        Ok(Value::Int(2))
    );
}

#[test]
fn variables_flow_through_map() {
    assert_eq!(
        run_both(
            r#"count = 10 => m.set("val", count * 2) => m.get("val") + count"#,
            empty_map
        ),
        Ok(Value::Int(30))
    );
}

#[test]
fn conditional_sequence() {
    assert_eq!(
        run_both(
            r#"if true then m.set("status", "ok") => m.set("code", 200) => m.get("code")"#,
            empty_map
        ),
        Ok(Value::Int(200))
    );
}

#[test]
fn non_map_variable_fails_at_runtime() {
    assert_eq!(
        run_both(r#"a.get("key")"#, || Globals::new().with("a", 123)),
        Err(ErrorCategory::Runtime)
    );
}

#[test]
fn literal_subject_fails_at_compile_time() {
    assert_eq!(
        run_both(r#""hello".get("key")"#, Globals::new),
        Err(ErrorCategory::Semantic)
    );
}

#[test]
fn empty_string_key() {
    assert_eq!(
        run_both(r#"m.set("", "empty") => m.get("")"#, empty_map),
        Ok(Value::from("empty"))
    );
}

#[test]
fn unbound_map_is_nil_and_fails() {
    assert_eq!(
        run_both(r#"missing.get("k")"#, Globals::new),
        Err(ErrorCategory::Runtime)
    );
}

#[test]
fn mutations_are_visible_to_the_host() {
    for backend in [Backend::Stack, Backend::Streaming] {
        let map = MapRef::from_iter([("old", 1)]);
        let mut globals = Globals::new().with("m", map.clone());
        let engine = Engine::new(
            r#"m.set("new", m.get("old") + 1) => m.del("old")"#,
            EngineOptions::new().with_backend(backend),
        )
        .unwrap();
        assert_eq!(engine.execute(&mut globals).unwrap(), Value::Nil);
        assert_eq!(map.get("new"), Some(Value::Int(2)));
        assert!(!map.contains_key("old"));
    }
}

fn two_maps() -> Globals {
    Globals::new().with("a", MapRef::new()).with("b", MapRef::new())
}

#[test]
fn self_containing_maps_compare_equal() {
    assert_eq!(
        run_both(r#"a.set("me", a) => b.set("me", b) => a == b"#, two_maps),
        Ok(Value::Bool(true))
    );
    assert_eq!(
        run_both(
            r#"a.set("me", a) => b.set("me", b) => b.set("x", 1) => a != b"#,
            two_maps
        ),
        Ok(Value::Bool(true))
    );
}

#[test]
fn mutually_referencing_maps_compare_equal() {
    assert_eq!(
        run_both(r#"a.set("next", b) => b.set("next", a) => a == b"#, two_maps),
        Ok(Value::Bool(true))
    );
}

#[test]
fn nested_numbers_compare_across_int_and_float() {
    assert_eq!(
        run_both(r#"a.set("n", 1) => b.set("n", 1.0) => a == b"#, two_maps),
        Ok(Value::Bool(true))
    );
}
