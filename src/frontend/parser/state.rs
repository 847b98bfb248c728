//! Parser state and token stream management

use super::super::lexer::tokens::*;
use super::ParseError;
use crate::util::span::{Position, Span};

static EOF: TokenKind = TokenKind::Eof;

/// Deepest expression tree the parser builds
pub const MAX_EXPR_DEPTH: usize = 256;

/// Cursor over the token stream
#[derive(Debug)]
pub struct ParserState<'a> {
    /// Token stream
    tokens: &'a [Token],
    /// Current position in token stream
    pos: usize,
    /// Depth of the expression tree being built
    depth: usize,
}

impl<'a> ParserState<'a> {
    /// Create a new parser state
    #[inline]
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0, depth: 0 }
    }

    /// Check if at end of token stream
    #[inline]
    pub fn at_end(&self) -> bool {
        matches!(self.kind(), TokenKind::Eof)
    }

    /// Get current token
    #[inline]
    pub fn current(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    /// Get current token kind
    #[inline]
    pub fn kind(&self) -> &'a TokenKind {
        self.current().map(|t| &t.kind).unwrap_or(&EOF)
    }

    /// Check current token kind
    #[inline]
    pub fn at(
        &self,
        kind: &TokenKind,
    ) -> bool {
        self.kind() == kind
    }

    /// Peek at the kind of the token after the current one
    #[inline]
    pub fn peek_kind(&self) -> &'a TokenKind {
        self.tokens.get(self.pos + 1).map(|t| &t.kind).unwrap_or(&EOF)
    }

    /// Advance to next token
    #[inline]
    pub fn bump(&mut self) {
        if !self.at_end() {
            self.pos += 1;
        }
    }

    /// Skip a specific token
    #[inline]
    pub fn eat(
        &mut self,
        kind: &TokenKind,
    ) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Expect a specific token
    pub fn expect(
        &mut self,
        kind: &TokenKind,
    ) -> Result<Span, ParseError> {
        if self.at(kind) {
            let span = self.span();
            self.bump();
            Ok(span)
        } else {
            Err(self.expected(format!("`{}`", kind)))
        }
    }

    /// Expect an identifier and return its text
    pub fn expect_ident(
        &mut self,
        what: &str,
    ) -> Result<(String, Span), ParseError> {
        match self.kind() {
            TokenKind::Identifier(name) => {
                let span = self.span();
                self.bump();
                Ok((name.clone(), span))
            }
            _ => Err(self.expected(what)),
        }
    }

    /// Span of the current token
    #[inline]
    pub fn span(&self) -> Span {
        self.current()
            .or_else(|| self.tokens.last())
            .map(|t| t.span)
            .unwrap_or_else(Span::dummy)
    }

    /// Span of the most recently consumed token
    #[inline]
    pub fn prev_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.span)
            .unwrap_or_else(|| self.span())
    }

    /// Span from `start` through the last consumed token
    #[inline]
    pub fn span_from(
        &self,
        start: Span,
    ) -> Span {
        start.to(self.prev_span())
    }

    /// Position of the current token
    #[inline]
    pub fn position(&self) -> Position {
        self.span().start
    }

    /// Enter one more level of expression nesting
    pub fn enter_expr(&mut self) -> Result<(), ParseError> {
        if self.depth >= MAX_EXPR_DEPTH {
            return Err(ParseError::NestingTooDeep {
                limit: MAX_EXPR_DEPTH,
                position: self.position(),
            });
        }
        self.depth += 1;
        Ok(())
    }

    #[inline]
    pub fn leave_expr(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Current expression depth, restored with `reset_expr_depth`
    #[inline]
    pub fn expr_depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn reset_expr_depth(
        &mut self,
        depth: usize,
    ) {
        self.depth = depth;
    }

    /// Build an "expected X, found <current>" error
    pub fn expected(
        &self,
        expected: impl Into<String>,
    ) -> ParseError {
        ParseError::Expected {
            expected: expected.into(),
            found: self.kind().clone(),
            position: self.position(),
        }
    }
}
