//! Code generation tests

use crate::error::Error;
use crate::frontend::analyze::SemanticError;
use crate::frontend::Compiler;
use crate::middle::resolve::{CompileResolvers, ResolutionError, ResolverKind, ResolverSet};

fn compile(source: &str) -> Result<Vec<u8>, Error> {
    Compiler::new().compile(source).map(|script| script.bytes)
}

fn compile_with(
    source: &str,
    symbols: &ResolverSet,
) -> Result<Vec<u8>, Error> {
    Compiler::with_resolvers(symbols.compile_resolvers())
        .compile(source)
        .map(|script| script.bytes)
}

fn out_of_range(err: Error) -> (i64, i64, i64) {
    match err {
        Error::Semantic(SemanticError::OutOfRange { value, min, max, .. }) => (value, min, max),
        other => panic!("expected OutOfRange, got {:?}", other),
    }
}

fn bodies(n: usize) -> String {
    format!("behaviour Busy {{ state S() {{ {} }} }}", "do { } ".repeat(n))
}

#[test]
fn test_minimal_behaviour_layout() {
    let bytes = compile("behaviour Idle { state Wait() { do { Wait(30); } } }").unwrap();
    assert_eq!(
        bytes,
        vec![
            0x00, 0x00, 0x00, 0x00, // graph header
            0x01, 0x00, 0xFF, 0xFF, // state: one body, no target
            0x02, 0x00, 0xFF, 0xFF, // body: commands, stay
            0x00, 0x00, 0x01, 0x00, // Wait, one arg
            0x1E, 0x00, 0x00, 0x00,
        ]
    );
}

#[test]
fn test_full_behaviour_layout() {
    let source = "
        [Priority(3)]
        [StartFrom(B)]
        behaviour Guard {
            const base = 10;
            starter { assign 400(type = 1, status = 2); }
            state A(5) { if not PlayerNear(base + 2) { goto B; } }
            [ControlPacket(motion = 4, space = 1, 7)]
            [NonBlocking]
            state B() { do { } }
        }
    ";
    let bytes = compile(source).unwrap();
    assert_eq!(
        bytes,
        vec![
            0x01, 0x03, 0x01, 0x00, // start 1, priority 3, starter
            0x01, 0x00, // one assigner
            0x90, 0x01, 0x01, 0x02, // object 400, type 1, status 2
            0x01, 0x02, 0x05, 0x00, // state A: one body, has next, target 5
            0x01, 0x00, 0x01, 0x00, // condition, goto B
            0x03, 0x00, 0x01, 0x00, // PlayerNear, negated
            0x0C, 0x00, 0x00, 0x00,
            0x41, 0x01, 0xFF, 0xFF, // state B: non-blocking, control packet
            0x03, 0x00, 0x01, 0x00, // space + motion, one data word
            0x01, 0x04, // settings in bit order
            0x07, 0x00, 0x00, 0x00,
            0x00, 0x00, 0xFF, 0xFF, // empty body
        ]
    );
}

#[test]
fn test_command_chain_has_next() {
    let bytes = compile("behaviour B { state S() { do { Wait(1); Jump(); } } }").unwrap();
    assert_eq!(
        &bytes[12..],
        &[0x00, 0x00, 0x01, 0x80, 0x01, 0x00, 0x00, 0x00, 0x0A, 0x00, 0x00, 0x00]
    );

    // 单元素链不设置 has-next
    let bytes = compile("behaviour B { state S() { do { Jump(); } } }").unwrap();
    assert_eq!(&bytes[12..], &[0x0A, 0x00, 0x00, 0x00]);
}

#[test]
fn test_state_chain_has_next() {
    let bytes = compile("behaviour B { state A() { } state C() { } }").unwrap();
    assert_eq!(
        bytes,
        vec![0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0xFF, 0xFF, 0x00, 0x00, 0xFF, 0xFF]
    );
}

#[test]
fn test_body_count_limit() {
    let bytes = compile(&bodies(31)).unwrap();
    assert_eq!(&bytes[4..6], &[0x1F, 0x00]);
    assert_eq!(bytes.len(), 8 + 31 * 4);

    let err = compile(&bodies(32)).unwrap_err();
    assert_eq!(out_of_range(err), (32, 0, 31));
}

#[test]
fn test_argument_count_limit() {
    let args = vec!["0"; 16].join(", ");
    let err = compile(&format!("behaviour B {{ state S() {{ do {{ Wait({}); }} }} }}", args)).unwrap_err();
    assert_eq!(out_of_range(err), (16, 0, 15));
}

#[test]
fn test_field_ranges() {
    let err = compile("[Priority(256)] behaviour B { state S() { } }").unwrap_err();
    assert_eq!(out_of_range(err), (256, 0, 255));

    let err = compile("behaviour B { state S() { do { Wait(2147483648); } } }").unwrap_err();
    assert_eq!(out_of_range(err), (2147483648, i64::from(i32::MIN), i64::from(i32::MAX)));

    let err = compile("behaviour B { [UseObjectSlot(-1)] state S() { } }").unwrap_err();
    assert_eq!(out_of_range(err), (-1, 0, i64::from(i16::MAX)));

    let err = compile("behaviour B { starter { assign 1(locality = 16); } state S() { } }").unwrap_err();
    assert_eq!(out_of_range(err), (16, 0, 15));

    let err = compile("behaviour B { starter { assign 65536; } state S() { } }").unwrap_err();
    assert_eq!(out_of_range(err), (65536, 0, i64::from(u16::MAX)));

    let err = compile("behaviour B { [ControlPacket(gravity = 300)] state S() { } }").unwrap_err();
    assert_eq!(out_of_range(err), (300, 0, 255));
}

#[test]
fn test_unresolved_object_symbol() {
    let source = "behaviour B { starter { assign Crate; } state S() { } }";
    let err = compile(source).unwrap_err();
    assert_eq!(
        err,
        Error::Resolution(ResolutionError::Unresolved {
            kind: ResolverKind::GlobalObject,
            name: "Crate".to_string(),
        })
    );
    assert!(err.to_string().contains("Crate"));

    let symbols = ResolverSet::from_toml_str("[objects]\nCrate = 400\n").unwrap();
    let bytes = compile_with(source, &symbols).unwrap();
    assert_eq!(&bytes[4..10], &[0x01, 0x00, 0x90, 0x01, 0x00, 0x00]);
}

#[test]
fn test_symbolic_state_target() {
    let symbols = ResolverSet::from_toml_str("[state_graphs]\nWalk = 3\n").unwrap();
    let bytes = compile_with("behaviour B { state S(Walk) { } }", &symbols).unwrap();
    assert_eq!(&bytes[4..], &[0x00, 0x00, 0x03, 0x00]);

    let bytes = compile("behaviour B { [UseObjectSlot(2)] state S() { } }").unwrap();
    assert_eq!(&bytes[4..], &[0x80, 0x00, 0x02, 0x00]);
}

#[test]
fn test_library_length_patch() {
    let bytes = compile("library Lib { [GlobalIndex(12)] behaviour Idle { state S() { } } }").unwrap();
    assert_eq!(
        bytes,
        vec![
            0x01, 0x00, 0x00, 0x00, // one behaviour, unknown 0
            0x0C, 0x00, 0x00, 0x00, // graph id
            0x08, 0x00, 0x00, 0x00, // byte length
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF,
        ]
    );
}

#[test]
fn test_library_graph_id_from_resolver() {
    let source = "library Lib { behaviour Idle { state S() { } } behaviour Run { state S() { do { Jump(); } } } }";
    let err = compile(source).unwrap_err();
    assert!(matches!(
        err,
        Error::Resolution(ResolutionError::Unresolved {
            kind: ResolverKind::Graph,
            ..
        })
    ));

    let symbols = ResolverSet::from_toml_str("[graphs]\nIdle = 7\nRun = 8\n").unwrap();
    let bytes = compile_with(source, &symbols).unwrap();
    assert_eq!(&bytes[..4], &[0x02, 0x00, 0x00, 0x00]);
    assert_eq!(&bytes[4..12], &[0x07, 0x00, 0x00, 0x00, 0x08, 0x00, 0x00, 0x00]);
    assert_eq!(&bytes[20..28], &[0x08, 0x00, 0x00, 0x00, 0x10, 0x00, 0x00, 0x00]);
    assert_eq!(bytes.len(), 28 + 16);
}

#[test]
fn test_library_duplicate_graph_id() {
    let source = "library L { [GlobalIndex(5)] behaviour A { state S() { } } [GlobalIndex(5)] behaviour B { state S() { } } }";
    let err = compile(source).unwrap_err();
    match err {
        Error::Semantic(SemanticError::DuplicateGraphId { id, name, first, .. }) => {
            assert_eq!(id, 5);
            assert_eq!(name, "B");
            assert_eq!(first, "A");
        }
        other => panic!("expected DuplicateGraphId, got {:?}", other),
    }

    // 名字解析出的 id 与显式 GlobalIndex 冲突
    let symbols = ResolverSet::from_toml_str("[graphs]\nB = 5\n").unwrap();
    let source = "library L { [GlobalIndex(5)] behaviour A { state S() { } } behaviour B { state S() { } } }";
    let err = compile_with(source, &symbols).unwrap_err();
    assert!(matches!(err, Error::Semantic(SemanticError::DuplicateGraphId { id: 5, .. })));
}

#[test]
fn test_sequence_layout() {
    let source = "
        [GlobalIndex(2)]
        [InstanceType(1)]
        sequence Intro {
            pack(12) { Wait(5); }
            Jump();
        }
    ";
    let bytes = compile(source).unwrap();
    assert_eq!(
        bytes,
        vec![
            0x01, 0x02, 0x01, 0x00, // instance 1, index 2, one pack
            0x01, 0x00, 0x00, 0x00, 0x01, 0x00, 0x05, 0x00, 0x00, 0x00, // pack commands
            0x0C, 0x00, // script id
            0x01, 0x00, 0x0A, 0x00, 0x00, 0x00, // own commands
        ]
    );
}

#[test]
fn test_empty_sequence() {
    let bytes = compile("sequence Nothing { }").unwrap();
    assert_eq!(bytes, vec![0, 0, 0, 0, 0, 0]);
}

#[test]
fn test_resolvers_none_is_default() {
    let compiler = Compiler::with_resolvers(CompileResolvers::none());
    assert!(compiler.compile("behaviour B { state S() { } }").is_ok());
}

#[test]
fn test_unvalidated_jump_reports_body_position() {
    use crate::frontend::analyze::{Scope, SymbolTable};
    use crate::frontend::lexer::tokenize;
    use crate::frontend::parser::parse;
    use crate::middle::codegen::emit;

    // 跳过 analyze，直接生成
    let source = "behaviour B {\n  state S() {\n    do { goto Missing; }\n  }\n}";
    let root = parse(&tokenize(source).unwrap()).unwrap();
    let symbols = SymbolTable::new(Scope::new());
    let err = emit(&root, &symbols, &CompileResolvers::none()).unwrap_err();
    match err {
        Error::Semantic(SemanticError::UndefinedState { name, position }) => {
            assert_eq!(name, "Missing");
            assert_eq!(position.line, 3);
            assert_eq!(position.column, 5);
        }
        other => panic!("expected UndefinedState, got {:?}", other),
    }
}
