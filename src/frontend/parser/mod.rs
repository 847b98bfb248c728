//! Parser module
//!
//! Recursive-descent parser turning the lexer's token stream into an AST.
//! Parsing stops at the first error.

pub mod ast;
mod decl;
mod expr;
mod state;

#[cfg(test)]
mod tests;

pub use state::{ParserState, MAX_EXPR_DEPTH};

use crate::frontend::lexer::tokens::*;
use crate::util::span::Position;
use ast::*;

/// Parse error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Found a token the grammar does not allow here
    #[error("{position}: expected {expected}, found {}", .found.describe())]
    Expected {
        expected: String,
        found: TokenKind,
        position: Position,
    },
    #[error("{position}: unknown attribute `{name}`")]
    UnknownAttribute { name: String, position: Position },
    #[error("{position}: unknown command `{name}`")]
    UnknownCommand { name: String, position: Position },
    #[error("{position}: unknown condition `{name}`")]
    UnknownCondition { name: String, position: Position },
    /// Expression nests deeper than the parser allows
    #[error("{position}: expression nests deeper than {limit} levels")]
    NestingTooDeep { limit: usize, position: Position },
    /// Attribute name is known but its argument list has the wrong shape
    #[error("{position}: attribute `{name}` {problem}")]
    BadAttributeArgs {
        name: String,
        problem: String,
        position: Position,
    },
}

impl ParseError {
    /// Position the error was reported at
    pub fn position(&self) -> Position {
        match self {
            ParseError::Expected { position, .. }
            | ParseError::UnknownAttribute { position, .. }
            | ParseError::UnknownCommand { position, .. }
            | ParseError::UnknownCondition { position, .. }
            | ParseError::NestingTooDeep { position, .. }
            | ParseError::BadAttributeArgs { position, .. } => *position,
        }
    }
}

/// Parse tokens into an AST root
///
/// # Arguments
/// * `tokens` - Token stream from the lexer, terminated by `Eof`
///
/// # Returns
/// The library, behaviour or sequence, or the first parse error
pub fn parse(tokens: &[Token]) -> Result<Root, ParseError> {
    let mut state = ParserState::new(tokens);
    let root = state.parse_root()?;
    tracing::trace!("parsed `{}` with {} tokens", root.name(), tokens.len());
    Ok(root)
}
