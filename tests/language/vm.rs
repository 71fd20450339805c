//! Integration tests for the stack VM
//!
//! Tests evaluation of compiled mapexpr programs.

use mapexpr_foundation::{ErrorCategory, ErrorKind, MapRef, Type, Value};
use mapexpr_language::{
    CompiledProgram, Globals, Opcode, StepCounter, Vm, VmConfig, VmContext, compile, eval,
    eval_with,
};

fn with_map(source: &str, map: &MapRef) -> Result<Value, mapexpr_foundation::Error> {
    eval_with(source, &mut Globals::new().with("m", map.clone()))
}

// =============================================================================
// Expressions
// =============================================================================

#[test]
fn eval_arithmetic() {
    assert_eq!(eval("2 + 3 * 4").unwrap(), Value::Int(14));
    assert_eq!(eval("-(2 + 3)").unwrap(), Value::Int(-5));
    assert_eq!(eval("7 / 2").unwrap(), Value::Int(3));
    assert_eq!(eval("7.0 / 2").unwrap(), Value::Float(3.5));
    assert_eq!(eval("-7 % 3").unwrap(), Value::Int(-1));
}

#[test]
fn eval_comparisons() {
    assert_eq!(eval("1 < 2 == true").unwrap(), Value::Bool(true));
    assert_eq!(eval(r#""a" < "b""#).unwrap(), Value::Bool(true));
    assert_eq!(eval("nil == nil").unwrap(), Value::Bool(true));
    assert_eq!(eval(r#"1 != "1""#).unwrap(), Value::Bool(true));
}

#[test]
fn short_circuit_skips_side_effects() {
    let map = MapRef::new();
    with_map(r#"false && m.set("hit", 1)"#, &map).unwrap();
    with_map(r#"true || m.set("hit", 1)"#, &map).unwrap();
    assert!(map.is_empty());

    with_map(r#"x && m.set("hit", 1)"#, &map).unwrap();
    assert!(map.is_empty());
}

#[test]
fn if_without_else_yields_nil() {
    let mut globals = Globals::new().with("c", false);
    assert_eq!(eval_with("if c then 1", &mut globals).unwrap(), Value::Nil);
}

#[test]
fn assignment_yields_value() {
    let mut globals = Globals::new();
    assert_eq!(eval_with("x = 5", &mut globals).unwrap(), Value::Int(5));
    assert_eq!(eval_with("x = y = x + 1 => x * y", &mut globals).unwrap(), Value::Int(36));
    assert_eq!(globals.get("y"), Some(&Value::Int(6)));
}

// =============================================================================
// Map Operations
// =============================================================================

#[test]
fn every_map_op_leaves_one_value() {
    let map = MapRef::from_iter([("k", 1)]);
    assert_eq!(with_map(r#"m.get("k")"#, &map).unwrap(), Value::Int(1));
    assert_eq!(with_map(r#"m.has("k")"#, &map).unwrap(), Value::Bool(true));
    assert_eq!(with_map(r#"m.set("k", 2)"#, &map).unwrap(), Value::Nil);
    assert_eq!(with_map(r#"m.del("k")"#, &map).unwrap(), Value::Nil);
    assert_eq!(with_map(r#"m.get("k")"#, &map).unwrap(), Value::Nil);
}

#[test]
fn map_results_compose() {
    let map = MapRef::from_iter([("a", 2), ("b", 3)]);
    assert_eq!(
        with_map(r#"m.get("a") * m.get("b") + 1"#, &map).unwrap(),
        Value::Int(7)
    );
    assert_eq!(
        with_map(r#"m.has("a") && !m.has("c")"#, &map).unwrap(),
        Value::Bool(true)
    );
}

#[test]
fn stored_maps_load_with_identity() {
    let inner = MapRef::new();
    let outer = MapRef::from_iter([("inner", inner.clone())]);
    let mut globals = Globals::new().with("m", outer);
    let result = eval_with(r#"n = m.get("inner") => n.set("x", 1) => n"#, &mut globals).unwrap();
    assert_eq!(inner.get("x"), Some(Value::Int(1)));
    let Value::Map(loaded) = result else {
        panic!("expected map");
    };
    assert!(loaded.ptr_eq(&inner));
}

#[test]
fn foreign_values_pass_through() {
    let token = Value::foreign(17u64);
    let map = MapRef::new();
    let mut globals = Globals::new().with("m", map.clone()).with("t", token.clone());
    eval_with(r#"m.set("t", t)"#, &mut globals).unwrap();
    assert_eq!(eval_with(r#"m.get("t")"#, &mut globals).unwrap(), token);
}

#[test]
fn runtime_errors_carry_instruction_pointer() {
    let mut globals = Globals::new().with("n", 5).with("m", MapRef::new());
    let err = eval_with(r#"m.get("a") => n.has("k")"#, &mut globals).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Runtime);
    assert!(matches!(
        err.kind,
        ErrorKind::NotAMap {
            op: "MHAS",
            actual: Type::Int
        }
    ));
    let program = compile(r#"m.get("a") => n.has("k")"#).unwrap();
    let ip = err.context.and_then(|c| c.ip).unwrap();
    assert_eq!(program.code[ip], Opcode::MapHas);
}

#[test]
fn key_type_is_checked_after_subject() {
    let mut globals = Globals::new().with("n", 5);
    let err = eval_with("n.get(1)", &mut globals).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::NotAMap { .. }));

    let err = eval_with("m.set(nil, 1)", &mut Globals::new().with("m", MapRef::new())).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::TypeMismatch {
            expected: Type::String,
            actual: Type::Nil
        }
    ));
}

// =============================================================================
// VM Configuration
// =============================================================================

#[test]
fn stack_depth_is_configurable() {
    let program = compile("a + (b + (c + d))").unwrap();
    let mut globals = Globals::new().with("a", 1).with("b", 1).with("c", 1).with("d", 1);
    assert_eq!(Vm::new().execute(&program, &mut globals).unwrap(), Value::Int(4));

    let mut vm = Vm::with_config(VmConfig::default().with_max_stack_depth(3));
    let err = vm.execute(&program, &mut globals).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::StackOverflow { limit: 3 }));
}

#[test]
fn empty_program_is_an_internal_error() {
    let err = Vm::new()
        .execute(&CompiledProgram::new(), &mut Globals::new())
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Internal(_)));
}

#[test]
fn observer_counts_steps() {
    let program = compile(r#"m.set("k", 1) => m.get("k")"#).unwrap();
    let mut counter = StepCounter::default();
    Vm::new()
        .execute_observed(
            &program,
            &mut Globals::new().with("m", MapRef::new()),
            &mut counter,
        )
        .unwrap();
    assert_eq!(counter.steps, program.code.len());
    assert_eq!(counter.max_depth, 3);
}

// =============================================================================
// Host Contexts
// =============================================================================

/// A context that resolves every name to the same map.
struct OneMap(MapRef);

impl VmContext for OneMap {
    fn get_global(&self, _name: &str) -> Option<Value> {
        Some(Value::Map(self.0.clone()))
    }

    fn set_global(&mut self, _name: &str, _value: Value) {}
}

#[test]
fn custom_context() {
    let map = MapRef::from_iter([("k", "v")]);
    let program = compile(r#"a.get("k") + b.get("k")"#).unwrap();
    let result = Vm::new().execute(&program, &mut OneMap(map)).unwrap();
    assert_eq!(result, Value::from("vv"));
}
