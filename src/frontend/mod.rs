//! Frontend compilation pipeline
//!
//! This module contains the lexer, parser, semantic analysis and the source
//! printer. [`Compiler`] drives source text through every stage down to
//! the emitted binary.

use crate::error::Result;
use crate::middle;
use crate::middle::decompile::ItemKind;
use crate::middle::resolve::CompileResolvers;
use tracing::debug;

pub mod analyze;
pub mod lexer;
pub mod parser;
pub mod printer;

/// Output of a successful compile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledScript {
    pub kind: ItemKind,
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Compiler context
#[derive(Debug, Default, Clone, Copy)]
pub struct Compiler<'r> {
    /// Resolvers for symbolic references
    resolvers: CompileResolvers<'r>,
}

impl<'r> Compiler<'r> {
    /// Create a compiler with no resolvers
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a compiler that resolves names through `resolvers`
    #[inline]
    pub fn with_resolvers(resolvers: CompileResolvers<'r>) -> Self {
        Self { resolvers }
    }

    /// Lex, parse and analyze without emitting
    pub fn check(
        &self,
        source: &str,
    ) -> Result<(parser::ast::Root, analyze::SymbolTable)> {
        debug!("Checking source code ({} bytes)", source.len());
        // Lexical analysis
        let tokens = lexer::tokenize(source)?;
        debug!("Tokenized into {} tokens", tokens.len());

        // Parsing
        let mut root = parser::parse(&tokens)?;
        debug!("Parsed {} `{}`", ItemKind::of(&root), root.name());

        // Const ordering and validation
        let symbols = analyze::analyze(&mut root)?;
        Ok((root, symbols))
    }

    /// Compile source code to binary
    pub fn compile(
        &self,
        source: &str,
    ) -> Result<CompiledScript> {
        let (root, symbols) = self.check(source)?;

        debug!("Starting emission...");
        let bytes = middle::codegen::emit(&root, &symbols, &self.resolvers)?;
        debug!("Compilation successful, {} bytes", bytes.len());

        Ok(CompiledScript {
            kind: ItemKind::of(&root),
            name: root.name().to_string(),
            bytes,
        })
    }
}
