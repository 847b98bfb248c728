//! Error reporting for every pipeline stage

use agentlab::frontend::analyze::SemanticError;
use agentlab::frontend::lexer::LexError;
use agentlab::frontend::parser::ParseError;
use agentlab::{compile_source, decompile, format_source, CompileResolvers, DecompileResolvers, Error, FormatError,
    ItemKind, PrintOptions};

fn compile(source: &str) -> Result<Vec<u8>, Error> {
    compile_source(source, &CompileResolvers::none())
}

#[test]
fn test_lex_errors() {
    let err = compile("behaviour B { state S() { do { Wait(1 # 2); } } }").unwrap_err();
    assert!(matches!(err, Error::Lex(LexError::UnexpectedChar { ch: '#', .. })));
    assert_eq!(err.stage(), "lex");

    let err = compile("behaviour B { state S() { do { Wait(12ab); } } }").unwrap_err();
    assert!(matches!(err, Error::Lex(LexError::MalformedNumber { .. })));

    let err = compile("/* never closed").unwrap_err();
    assert!(matches!(err, Error::Lex(LexError::UnterminatedComment { .. })));
}

#[test]
fn test_parse_errors() {
    let err = compile("behaviour B { state S() { do { Wait(1) } } }").unwrap_err();
    assert!(matches!(err, Error::Parse(ParseError::Expected { .. })));
    assert_eq!(err.stage(), "parse");
    assert!(err.to_string().starts_with("1:"));

    let err = compile("[Turbo] behaviour B { state S() { } }").unwrap_err();
    assert!(matches!(err, Error::Parse(ParseError::UnknownAttribute { .. })));
}

#[test]
fn test_deep_nesting_is_an_error() {
    let source = format!("sequence S {{ const A = {}1; }}", "-".repeat(200_000));
    let err = compile(&source).unwrap_err();
    assert!(matches!(err, Error::Parse(ParseError::NestingTooDeep { .. })));
    assert!(format_source(&source, &PrintOptions::default()).is_err());

    let source = "library L { [GlobalIndex(5)] behaviour A { state S() { } } [GlobalIndex(5)] behaviour B { state S() { } } }";
    let err = compile(source).unwrap_err();
    assert!(matches!(err, Error::Semantic(SemanticError::DuplicateGraphId { id: 5, .. })));
}

#[test]
fn test_semantic_errors() {
    let cases: [(&str, fn(&SemanticError) -> bool); 8] = [
        ("sequence S { const a = b; const b = a; }", |e| {
            matches!(e, SemanticError::CyclicConst { names } if names == &["a", "b"])
        }),
        ("sequence S { const a = 1; const a = 2; }", |e| {
            matches!(e, SemanticError::DuplicateConst { .. })
        }),
        ("sequence S { Wait(missing); }", |e| matches!(e, SemanticError::UndefinedConst { .. })),
        ("behaviour B { state S() { do { goto T; } } }", |e| {
            matches!(e, SemanticError::UndefinedState { .. })
        }),
        ("behaviour B { state S() { } state S() { } }", |e| {
            matches!(e, SemanticError::DuplicateState { .. })
        }),
        ("[InstanceType(1)] behaviour B { state S() { } }", |e| {
            matches!(e, SemanticError::MisplacedAttribute { .. })
        }),
        ("behaviour B { [UseObjectSlot(1)] state S(4) { } }", |e| {
            matches!(e, SemanticError::ConflictingStateTarget { .. })
        }),
        ("sequence S { const a = 9223372036854775807 + 1; }", |e| {
            matches!(e, SemanticError::ArithmeticOverflow { .. })
        }),
    ];
    for (source, check) in cases {
        match compile(source) {
            Err(Error::Semantic(err)) => assert!(check(&err), "{}: {:?}", source, err),
            other => panic!("{}: expected semantic error, got {:?}", source, other),
        }
    }
}

#[test]
fn test_out_of_range_message() {
    let source = format!("behaviour B {{ state S() {{ {} }} }}", "do { } ".repeat(32));
    let err = compile(&source).unwrap_err();
    assert_eq!(err.stage(), "semantic");
    assert_eq!(err.to_string(), "body count of state `S` is 32, outside 0..=31");
}

#[test]
fn test_format_errors() {
    let err = decompile(ItemKind::Behaviour, &[0, 0], "B", &DecompileResolvers::none()).unwrap_err();
    assert_eq!(err, Error::Format(FormatError::UnexpectedEof { offset: 0, needed: 2 }));
    assert_eq!(err.stage(), "format");
    assert_eq!(err.to_string(), "unexpected end of data at offset 0 (2 more bytes needed)");
}

#[test]
fn test_format_source_keeps_consts_unfolded() {
    let formatted = format_source(
        "sequence S{const B=2;const A=B+1;// note\nWait(A);}",
        &PrintOptions::default(),
    )
    .unwrap();
    assert_eq!(formatted, "sequence S {\n\tconst B = 2;\n\tconst A = B + 1;\n\tWait(A);\n}\n");

    // 格式化不做语义检查
    assert!(format_source("sequence S { Wait(missing); }", &PrintOptions::default()).is_ok());
    assert!(format_source("sequence S { Wait( }", &PrintOptions::default()).is_err());
}
