//! Integration tests for the compilers
//!
//! Tests the bytecode both front ends emit for the same source.

use mapexpr_foundation::{ErrorCategory, ErrorKind, Value};
use mapexpr_language::{
    CompilerOptions, Op, Opcode, compile, compile_stream, compile_stream_with, compile_with,
};

/// Renders the stack program and the streaming program minus its `RET`.
fn listings(source: &str) -> (Vec<String>, Vec<String>) {
    let stack = compile(source).unwrap();
    let stream = compile_stream(source).unwrap();
    assert_eq!(stack.constants, stream.constants, "{source}");
    assert_eq!(stream.code.last().map(|i| i.op), Some(Op::Return), "{source}");
    let stream_code = &stream.code[..stream.code.len() - 1];
    (
        stack.code.iter().map(ToString::to_string).collect(),
        stream_code.iter().map(ToString::to_string).collect(),
    )
}

// =============================================================================
// Pair Equivalence
// =============================================================================

#[test]
fn both_compilers_emit_the_same_listing() {
    for source in [
        r#"m.get("K")"#,
        r#"m.get(k)"#,
        r#"m.set("a", 1) => m.set("a", 2) => m.get("a")"#,
        r#"count = 10 => m.set("val", count * 2) => m.get("val") + count"#,
        r#"if m.has("k") then m.get("k") else m.del("k")"#,
        r#"1 + m.get("a") * 2"#,
        "a && b || !c",
        "x = y = 3",
        r#"m.set("", "empty") => m.get("")"#,
    ] {
        let (stack, stream) = listings(source);
        assert_eq!(stack, stream, "{source}");
    }
}

#[test]
fn both_compilers_fold_the_same_way() {
    for source in ["1 + 2 * 3", r#""a" + "b""#, "if true then 1 else x", "!nil"] {
        let stack = compile(source).unwrap();
        let stream = compile_stream(source).unwrap();
        assert_eq!(stack.constant_result(), stream.constant_result(), "{source}");
        assert!(stack.constant_result().is_some(), "{source}");
    }
}

// =============================================================================
// GET-BY-CONST
// =============================================================================

#[test]
fn only_string_literal_keys_take_the_fast_path() {
    let fused = |source: &str| {
        compile(source)
            .unwrap()
            .code
            .iter()
            .any(|op| matches!(op, Opcode::MapGetConst(_)))
    };
    assert!(fused(r#"m.get("k")"#));
    assert!(fused(r#"m.get("a" + "b")"#));
    assert!(!fused("m.get(k)"));
    assert!(!fused("m.get(1)"));
    assert!(!fused("m.get(nil)"));
    assert!(!fused(r#"m.has("k")"#));
}

#[test]
fn folded_key_is_appended_to_the_pool() {
    let program = compile(r#"m.get("a" + "b")"#).unwrap();
    let Some(Opcode::MapGetConst(index)) = program.code.last().copied() else {
        panic!("expected MGETC");
    };
    assert_eq!(
        program.constants.get(usize::from(index)),
        Some(&Value::from("ab"))
    );
}

#[test]
fn disabling_the_fast_path_applies_to_both_compilers() {
    let options = CompilerOptions::default().with_const_key_lookup(false);
    let stack = compile_with(r#"m.get("k")"#, options.clone()).unwrap();
    let stream = compile_stream_with(r#"m.get("k")"#, options).unwrap();
    assert!(stack.code.iter().all(|op| !matches!(op, Opcode::MapGetConst(_))));
    assert!(stream.code.iter().all(|i| i.op != Op::MapGetConst));
}

// =============================================================================
// Semantic Errors
// =============================================================================

#[test]
fn semantic_errors_agree() {
    for source in [
        r#""hello".get("key")"#,
        r#"m.get("a").get("b")"#,
        "m.frob(1)",
        "m.get()",
        r#"m.set("a")"#,
        r#"m.del("a", "b")"#,
        "1 = 2",
    ] {
        let stack = compile(source).unwrap_err();
        let stream = compile_stream(source).unwrap_err();
        assert_eq!(stack.category(), ErrorCategory::Semantic, "{source}");
        assert_eq!(stream.category(), ErrorCategory::Semantic, "{source}");
        assert_eq!(
            std::mem::discriminant(&stack.kind),
            std::mem::discriminant(&stream.kind),
            "{source}"
        );
    }
}

#[test]
fn arity_mismatch_reports_counts() {
    let err = compile(r#"m.set("a")"#).unwrap_err();
    let ErrorKind::ArityMismatch {
        method,
        expected,
        actual,
    } = err.kind
    else {
        panic!("expected arity mismatch");
    };
    assert_eq!((method.as_str(), expected, actual), ("set", 2, 1));
}

#[test]
fn syntax_errors_agree() {
    for source in [
        "m.",
        "m.get",
        "m.get(1",
        "(1",
        "1 +",
        "1 )",
        "if a b",
        r#""s".get("#,
        "(1 + x).get",
        "m.foo(1) + )",
        "1 = 2 )",
    ] {
        let stack = compile(source).unwrap_err();
        let stream = compile_stream(source).unwrap_err();
        assert_eq!(stack.category(), ErrorCategory::Syntax, "{source}");
        assert_eq!(stack.to_string(), stream.to_string(), "{source}");
    }
}
