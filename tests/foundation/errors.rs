//! Integration tests for errors
//!
//! Tests error categories, messages, and context.

use mapexpr_foundation::{Error, ErrorCategory, ErrorContext, ErrorKind, Type};

#[test]
fn categories() {
    assert_eq!(Error::parse("x", 1, 1).category(), ErrorCategory::Syntax);
    assert_eq!(
        Error::new(ErrorKind::InvalidMemberSubject).category(),
        ErrorCategory::Semantic
    );
    assert_eq!(
        Error::arity_mismatch("get", 1, 2).category(),
        ErrorCategory::Semantic
    );
    assert_eq!(
        Error::not_a_map("MGET", Type::Int).category(),
        ErrorCategory::Runtime
    );
    assert_eq!(
        Error::new(ErrorKind::DivisionByZero).category(),
        ErrorCategory::Runtime
    );
}

#[test]
fn messages() {
    assert_eq!(
        Error::parse("expected expression", 2, 5).to_string(),
        "parse error at 2:5: expected expression"
    );
    assert_eq!(
        Error::arity_mismatch("get", 1, 0).to_string(),
        "get expects 1 argument, got 0"
    );
    assert_eq!(
        Error::arity_mismatch("set", 2, 1).to_string(),
        "set expects 2 arguments, got 1"
    );
    assert_eq!(
        Error::not_a_map("MGETC", Type::Int).to_string(),
        "MGETC: not a map (got int)"
    );
    assert_eq!(
        Error::type_mismatch(Type::String, Type::Int).to_string(),
        "type mismatch: expected string, got int"
    );
    assert_eq!(ErrorCategory::Runtime.to_string(), "runtime error");
}

#[test]
fn context_is_attached() {
    let err = Error::new(ErrorKind::DivisionByZero).with_context(
        ErrorContext::new()
            .with_source("script")
            .with_position(1, 3)
            .with_ip(4),
    );
    let context = err.context.as_ref().unwrap();
    assert_eq!(context.ip, Some(4));
    assert_eq!(context.to_string(), "at script:1:3 (ip 4)");
}

#[test]
fn frames_render_innermost_first() {
    let context = ErrorContext::new().with_frame("m.get").with_frame("outer");
    let shown = context.to_string();
    let inner = shown.find("in m.get").unwrap();
    let outer = shown.find("in outer").unwrap();
    assert!(inner < outer);
}
