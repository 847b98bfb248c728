//! Parser tests module


use crate::frontend::lexer::tokenize;
use crate::frontend::parser::ast::*;
use crate::frontend::parser::{parse, ParseError};

fn parse_src(source: &str) -> Result<Root, ParseError> {
    let tokens = tokenize(source).unwrap();
    parse(&tokens)
}

fn parse_behaviour(source: &str) -> Behaviour {
    match parse_src(source).unwrap() {
        Root::Behaviour(behaviour) => behaviour,
        other => panic!("expected behaviour, got {:?}", other),
    }
}
