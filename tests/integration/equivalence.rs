//! Property tests: the two compiler/VM pairs are interchangeable.

use std::mem::discriminant;
use std::sync::Arc;

use mapexpr::foundation::{Error, ErrorCategory, MapRef, Value};
use mapexpr::language::{
    CompilerOptions, Globals, StreamVm, Vm, compile, compile_stream, compile_stream_with,
    compile_with,
};
use proptest::prelude::*;

// =============================================================================
// Program Generator
// =============================================================================

fn key() -> impl Strategy<Value = String> {
    (0..4u8).prop_map(|k| format!(r#""k{k}""#))
}

fn leaf() -> impl Strategy<Value = String> {
    prop_oneof![
        (0..100i64).prop_map(|n| n.to_string()),
        prop_oneof![Just("x"), Just("y"), Just("unbound")].prop_map(String::from),
        key(),
        Just("nil".to_string()),
        Just("true".to_string()),
        key().prop_map(|k| format!("m.get({k})")),
        key().prop_map(|k| format!("m.has({k})")),
    ]
}

fn program() -> impl Strategy<Value = String> {
    leaf().prop_recursive(4, 48, 3, |inner| {
        let op = prop_oneof![
            Just("+"),
            Just("-"),
            Just("*"),
            Just("/"),
            Just("%"),
            Just("=="),
            Just("<"),
            Just("&&"),
            Just("||"),
        ];
        prop_oneof![
            (inner.clone(), op, inner.clone()).prop_map(|(a, op, b)| format!("({a} {op} {b})")),
            inner.clone().prop_map(|a| format!("(-{a})")),
            inner.clone().prop_map(|a| format!("(!{a})")),
            (key(), inner.clone()).prop_map(|(k, v)| format!("m.set({k}, {v})")),
            inner.clone().prop_map(|k| format!("m.get({k})")),
            key().prop_map(|k| format!("m.del({k})")),
            (inner.clone(), inner.clone(), inner.clone())
                .prop_map(|(c, a, b)| format!("(if {c} then {a} else {b})")),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("({a} => {b})")),
            inner.prop_map(|v| format!("(x = {v})")),
        ]
    })
}

/// Programs with a broken member call or assignment spliced in. Depending on
/// the closing fragment the result is valid, semantically invalid, or
/// syntactically invalid.
fn malformed() -> impl Strategy<Value = String> {
    let opening = prop_oneof![
        Just(r#""s".get("#),
        Just("(1 + x).get("),
        Just(r#"m.get("a").get("#),
        Just("m.foo("),
        Just("m.get("),
        Just("m.set("),
        Just("m."),
        Just("1 = "),
    ];
    let closing = prop_oneof![Just(""), Just(")"), Just(", 1)"), Just("))"), Just(" 2")];
    (program(), opening, program(), closing)
        .prop_map(|(a, open, b, close)| format!("{a} => {open}{b}{close}"))
}

fn compile_category(result: Result<(), Error>) -> Result<(), ErrorCategory> {
    result.map_err(|e| e.category())
}

// =============================================================================
// Outcomes
// =============================================================================

/// Everything observable about one run.
#[derive(Debug)]
struct Outcome {
    result: Result<Value, Error>,
    map: Vec<(Arc<str>, Value)>,
    x: Option<Value>,
}

fn globals() -> (Globals, MapRef) {
    let map = MapRef::from_iter([("k0", Value::Int(1)), ("k1", Value::from("k2"))]);
    let globals = Globals::new()
        .with("m", map.clone())
        .with("x", 3)
        .with("y", 0);
    (globals, map)
}

fn run_stack(source: &str, options: CompilerOptions) -> Outcome {
    let (mut globals, map) = globals();
    let result = compile_with(source, options).and_then(|p| Vm::new().execute(&p, &mut globals));
    Outcome {
        result,
        map: map.sorted_entries(),
        x: globals.get("x").cloned(),
    }
}

fn run_stream(source: &str, options: CompilerOptions) -> Outcome {
    let (mut globals, map) = globals();
    let result = compile_stream_with(source, options)
        .and_then(|p| StreamVm::new().execute(&p, &mut globals));
    Outcome {
        result,
        map: map.sorted_entries(),
        x: globals.get("x").cloned(),
    }
}

fn assert_same(a: &Outcome, b: &Outcome, source: &str) -> Result<(), TestCaseError> {
    match (&a.result, &b.result) {
        (Ok(x), Ok(y)) => {
            prop_assert_eq!(x, y, "{}", source);
        }
        (Err(x), Err(y)) => {
            prop_assert_eq!(discriminant(&x.kind), discriminant(&y.kind), "{}", source);
            prop_assert_eq!(x.category(), y.category(), "{}", source);
        }
        _ => {
            prop_assert!(false, "{}: {:?} vs {:?}", source, a.result, b.result);
        }
    }
    prop_assert_eq!(&a.map, &b.map, "{}", source);
    prop_assert_eq!(&a.x, &b.x, "{}", source);
    Ok(())
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn pairs_agree(source in program()) {
        let options = CompilerOptions::default();
        let stack = run_stack(&source, options.clone());
        let stream = run_stream(&source, options);
        assert_same(&stack, &stream, &source)?;
    }

    #[test]
    fn optimizations_do_not_change_results(source in program()) {
        let optimized = run_stack(&source, CompilerOptions::default());
        let plain = CompilerOptions::default()
            .with_constant_folding(false)
            .with_const_key_lookup(false);
        assert_same(&optimized, &run_stack(&source, plain.clone()), &source)?;
        assert_same(&optimized, &run_stream(&source, plain), &source)?;
    }

    #[test]
    fn pairs_agree_on_malformed_source(source in malformed()) {
        let stack = compile_category(compile(&source).map(drop));
        let stream = compile_category(compile_stream(&source).map(drop));
        prop_assert_eq!(stack, stream, "{}", source);
    }

    #[test]
    fn compilation_is_deterministic(source in program()) {
        prop_assert_eq!(compile(&source).unwrap(), compile(&source).unwrap());
        prop_assert_eq!(compile_stream(&source).unwrap(), compile_stream(&source).unwrap());
    }
}

#[test]
fn syntax_errors_outrank_semantic_errors_in_both_pairs() {
    for source in [
        r#""s".get("#,
        "(1 + x).get",
        r#""s"."#,
        "m.foo(1) + )",
        "1 = 2 )",
        r#"m.get("a").get("b""#,
    ] {
        assert_eq!(
            compile_category(compile(source).map(drop)),
            Err(ErrorCategory::Syntax),
            "{source}"
        );
        assert_eq!(
            compile_category(compile_stream(source).map(drop)),
            Err(ErrorCategory::Syntax),
            "{source}"
        );
    }
}
