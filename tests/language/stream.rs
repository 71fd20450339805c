//! Integration tests for the streaming compiler and VM
//!
//! Tests the single-pass pair on its own terms: packed instructions, the
//! explicit return, and execution.

use mapexpr_foundation::{ErrorCategory, ErrorKind, MapRef, Value};
use mapexpr_language::{
    Globals, Instruction, Op, StepCounter, StreamProgram, StreamVm, VmConfig, compile_stream,
    eval_stream,
};

fn ops(source: &str) -> Vec<Op> {
    compile_stream(source)
        .unwrap()
        .code
        .iter()
        .map(|i| i.op)
        .collect()
}

#[test]
fn literal_key_get() {
    let program = compile_stream(r#"m.get("K")"#).unwrap();
    assert_eq!(
        program.code,
        vec![
            Instruction::new(Op::GetGlobal, 0),
            Instruction::new(Op::MapGetConst, 1),
            Instruction::ret(),
        ]
    );
}

#[test]
fn dynamic_key_and_operand_order() {
    assert_eq!(
        ops(r#"m.set(k, "v")"#),
        vec![
            Op::GetGlobal,
            Op::GetGlobal,
            Op::Push,
            Op::MapSet,
            Op::Return
        ]
    );
    assert_eq!(
        ops(r#"m.del("k")"#),
        vec![Op::GetGlobal, Op::Push, Op::MapDel, Op::Return]
    );
}

#[test]
fn deferred_left_literal_lands_below_right() {
    let program = compile_stream(r#""n=" + x"#).unwrap();
    assert_eq!(
        program.code.iter().map(|i| i.op).collect::<Vec<_>>(),
        vec![Op::Push, Op::GetGlobal, Op::Add, Op::Return]
    );
    let mut globals = Globals::new().with("x", "1");
    assert_eq!(
        StreamVm::new().execute(&program, &mut globals).unwrap(),
        Value::from("n=1")
    );
}

#[test]
fn packed_form_survives() {
    let program = compile_stream(r#"m.get("K") + 1"#).unwrap();
    for instr in &program.code {
        assert_eq!(Instruction::unpack(instr.pack()), Some(*instr));
    }
}

#[test]
fn eval_map_scenarios() {
    let map = MapRef::new();
    let mut globals = Globals::new().with("m", map.clone());
    assert_eq!(
        eval_stream(r#"m.set("a", 1) => m.set("a", 2) => m.get("a")"#, &mut globals).unwrap(),
        Value::Int(2)
    );
    assert_eq!(
        eval_stream(r#"m.del("a") => m.has("a")"#, &mut globals).unwrap(),
        Value::Bool(false)
    );
    assert!(map.is_empty());
}

#[test]
fn runtime_errors_match_stack_vm() {
    let mut globals = Globals::new().with("a", 123);
    let err = eval_stream(r#"a.get("key")"#, &mut globals).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Runtime);
    assert!(matches!(err.kind, ErrorKind::NotAMap { op: "MGETC", .. }));
    assert_eq!(err.context.and_then(|c| c.ip), Some(1));
}

#[test]
fn running_off_the_end_yields_top_of_stack() {
    let mut program = compile_stream("1 + x").unwrap();
    program.code.pop();
    let mut vm = StreamVm::new();
    let result = vm
        .execute(&program, &mut Globals::new().with("x", 1))
        .unwrap();
    assert_eq!(result, Value::Int(2));
}

#[test]
fn empty_program_is_an_error() {
    let err = StreamVm::new()
        .execute(&StreamProgram::new(), &mut Globals::new())
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Internal(_)));
}

#[test]
fn stack_limit_applies() {
    let program = compile_stream("a + (b + c)").unwrap();
    let mut vm = StreamVm::with_config(VmConfig::default().with_max_stack_depth(2));
    let err = vm.execute(&program, &mut Globals::new()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::StackOverflow { limit: 2 }));
}

#[test]
fn observer_sees_return() {
    let program = compile_stream("x").unwrap();
    let mut counter = StepCounter::default();
    StreamVm::new()
        .execute_observed(&program, &mut Globals::new(), &mut counter)
        .unwrap();
    assert_eq!(counter.steps, program.code.len());
}
