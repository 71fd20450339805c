//! Integration tests for the parser
//!
//! Tests the expression trees built from mapexpr source.

use mapexpr_foundation::{ErrorCategory, ErrorKind, Value};
use mapexpr_language::{BinaryOp, Expr, LogicalOp, UnaryOp, parse};

fn parse_ok(source: &str) -> Expr {
    parse(source).unwrap_or_else(|e| panic!("{source}: {e}"))
}

#[test]
fn literals() {
    assert!(matches!(parse_ok("nil"), Expr::Literal(Value::Nil, _)));
    assert!(matches!(parse_ok("42"), Expr::Literal(Value::Int(42), _)));
    assert!(matches!(parse_ok(r#""s""#), Expr::Literal(Value::String(_), _)));
}

#[test]
fn negative_literal_is_unary() {
    let Expr::Unary { op, operand, .. } = parse_ok("-17") else {
        panic!("expected unary");
    };
    assert_eq!(op, UnaryOp::Neg);
    assert!(matches!(*operand, Expr::Literal(Value::Int(17), _)));
}

#[test]
fn comparison_binds_looser_than_arithmetic() {
    let Expr::Binary { op, left, .. } = parse_ok("1 + 2 < 4") else {
        panic!("expected binary");
    };
    assert_eq!(op, BinaryOp::Lt);
    assert!(matches!(*left, Expr::Binary { op: BinaryOp::Add, .. }));
}

#[test]
fn and_binds_tighter_than_or() {
    let Expr::Logical { op, right, .. } = parse_ok("a || b && c") else {
        panic!("expected logical");
    };
    assert_eq!(op, LogicalOp::Or);
    assert!(matches!(*right, Expr::Logical { op: LogicalOp::And, .. }));
}

#[test]
fn sequence_is_left_associative() {
    let Expr::Sequence { first, .. } = parse_ok("a => b => c") else {
        panic!("expected sequence");
    };
    assert!(matches!(*first, Expr::Sequence { .. }));
}

#[test]
fn assignment_value_stops_at_sequence() {
    let Expr::Sequence { first, second, .. } = parse_ok("x = 1 + 2 => x") else {
        panic!("expected sequence");
    };
    let Expr::Assign { name, value, .. } = *first else {
        panic!("expected assignment");
    };
    assert_eq!(name, "x");
    assert!(matches!(*value, Expr::Binary { .. }));
    assert!(matches!(*second, Expr::Ident(ref n, _) if n == "x"));
}

#[test]
fn if_branches_absorb_sequences() {
    let Expr::If { then_branch, .. } = parse_ok("if c then a => b") else {
        panic!("expected if");
    };
    assert!(matches!(*then_branch, Expr::Sequence { .. }));
}

#[test]
fn member_call_arguments() {
    let Expr::MemberCall {
        method, args, span, ..
    } = parse_ok(r#"m.set(k + "x", (1))"#)
    else {
        panic!("expected member call");
    };
    assert_eq!(method, "set");
    assert_eq!(args.len(), 2);
    assert!(matches!(args[0], Expr::Binary { .. }));
    assert_eq!(span.end, 19);
}

#[test]
fn member_call_on_call_parses() {
    // Rejected later by the compiler, not the parser
    let Expr::MemberCall { subject, .. } = parse_ok(r#"m.get("a").get("b")"#) else {
        panic!("expected member call");
    };
    assert!(matches!(*subject, Expr::MemberCall { .. }));
}

#[test]
fn empty_argument_list() {
    let Expr::MemberCall { args, .. } = parse_ok("m.get()") else {
        panic!("expected member call");
    };
    assert!(args.is_empty());
}

#[test]
fn syntax_errors_report_position() {
    let err = parse("1 +\n  )").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Syntax);
    let ErrorKind::ParseError { line, column, .. } = err.kind else {
        panic!("expected parse error");
    };
    assert_eq!((line, column), (2, 3));
}

#[test]
fn trailing_comma_is_rejected() {
    assert!(parse("m.set(1,)").is_err());
    assert!(parse("m.get(,)").is_err());
}

#[test]
fn lexer_errors_surface_as_syntax_errors() {
    let err = parse(r#"m.get("open"#).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Syntax);
    assert!(err.to_string().contains("unterminated string"));
}
