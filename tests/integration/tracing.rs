//! The debug layer observing both backends.

use mapexpr::debug::{ObservabilityConfig, TraceEvent, disassemble_program};
use mapexpr::foundation::{ErrorCategory, MapRef};
use mapexpr::language::{Backend, Engine, EngineOptions, Globals};

const SOURCE: &str = r#"count = 10 => m.set("val", count * 2) => m.get("val") + count"#;

fn engine(backend: Backend) -> Engine {
    Engine::new(SOURCE, EngineOptions::new().with_backend(backend)).unwrap()
}

#[test]
fn tracer_sees_every_instruction_on_both_backends() {
    for backend in [Backend::Stack, Backend::Streaming] {
        let engine = engine(backend);
        let mut tracer = ObservabilityConfig::development().tracer();
        let mut globals = Globals::new().with("m", MapRef::new());
        engine.execute_observed(&mut globals, &mut tracer).unwrap();

        let steps = tracer.buffer().by_event_type("step").len();
        assert_eq!(steps, engine.program().len(), "{backend:?}");
        assert_eq!(
            tracer.buffer().recent(1)[0].event,
            TraceEvent::RunEnd {
                result: "30".into()
            }
        );
    }
}

#[test]
fn stack_trace_is_the_stream_trace_without_ret() {
    let trace = |backend| {
        let mut tracer = ObservabilityConfig::development().tracer();
        let mut globals = Globals::new().with("m", MapRef::new());
        engine(backend)
            .execute_observed(&mut globals, &mut tracer)
            .unwrap();
        tracer
            .buffer()
            .iter()
            .filter_map(|r| match &r.event {
                TraceEvent::Step {
                    instruction,
                    stack_depth,
                    ..
                } => Some((instruction.clone(), *stack_depth)),
                _ => None,
            })
            .collect::<Vec<_>>()
    };
    let stack = trace(Backend::Stack);
    let mut stream = trace(Backend::Streaming);
    assert_eq!(stream.pop().map(|(i, _)| i), Some("RET".to_string()));
    assert_eq!(stack, stream);
}

#[test]
fn runtime_failure_is_traced() {
    let engine = Engine::new(r#"a.get("key")"#, EngineOptions::new()).unwrap();
    let mut tracer = ObservabilityConfig::enabled()
        .with_trace_to_stderr(false)
        .tracer();
    let mut globals = Globals::new().with("a", 123);
    assert!(engine.execute_observed(&mut globals, &mut tracer).is_err());

    let types: Vec<_> = tracer.buffer().iter().map(|r| r.event_type()).collect();
    assert_eq!(types, vec!["run-start", "error"]);
    assert!(matches!(
        tracer.buffer().recent(1)[0].event,
        TraceEvent::Error {
            category: ErrorCategory::Runtime,
            ..
        }
    ));
}

#[test]
fn disabled_config_records_nothing() {
    let mut tracer = ObservabilityConfig::default().tracer();
    let mut globals = Globals::new().with("m", MapRef::new());
    engine(Backend::Stack)
        .execute_observed(&mut globals, &mut tracer)
        .unwrap();
    assert!(tracer.buffer().is_empty());
}

#[test]
fn listings_match_across_backends() {
    let stack = disassemble_program(engine(Backend::Stack).program());
    let stream = disassemble_program(engine(Backend::Streaming).program());
    assert!(stack.contains("MGETC"));
    let stream_body: Vec<_> = stream.lines().filter(|l| !l.contains("RET")).collect();
    let stack_body: Vec<_> = stack.lines().collect();
    assert_eq!(stack_body, stream_body);
}
