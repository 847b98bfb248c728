//! Crate error type
//!
//! Each stage has its own error enum; [`Error`] wraps whichever one stopped
//! the pipeline.

use crate::frontend::analyze::SemanticError;
use crate::frontend::lexer::LexError;
use crate::frontend::parser::ParseError;
use crate::middle::decompile::FormatError;
use crate::middle::resolve::ResolutionError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Semantic(#[from] SemanticError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Format(#[from] FormatError),
}

impl Error {
    /// Short name of the failing stage
    pub fn stage(&self) -> &'static str {
        match self {
            Error::Lex(_) => "lex",
            Error::Parse(_) => "parse",
            Error::Semantic(_) => "semantic",
            Error::Resolution(_) => "resolution",
            Error::Format(_) => "format",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
