//! Token types

use crate::util::span::Span;
use serde::Serialize;
use std::fmt;

/// Token kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    // Keywords
    KwLibrary,
    KwBehaviour,
    KwSequence,
    KwState,
    KwConst,
    KwStarter,
    KwAssign,
    KwPack,
    KwIf,
    KwDo,
    KwNot,
    KwGoto,

    // Identifiers
    Identifier(String),

    // Literals
    IntLiteral(i64),

    // Operators
    Plus,
    Minus,
    Eq,

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Semicolon,

    // Special
    Eof,
}

impl TokenKind {
    /// Human readable description used in parse errors
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Identifier(name) => format!("identifier `{}`", name),
            TokenKind::IntLiteral(value) => format!("number `{}`", value),
            TokenKind::Eof => "end of input".to_string(),
            other => format!("`{}`", other),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let text = match self {
            TokenKind::KwLibrary => "library",
            TokenKind::KwBehaviour => "behaviour",
            TokenKind::KwSequence => "sequence",
            TokenKind::KwState => "state",
            TokenKind::KwConst => "const",
            TokenKind::KwStarter => "starter",
            TokenKind::KwAssign => "assign",
            TokenKind::KwPack => "pack",
            TokenKind::KwIf => "if",
            TokenKind::KwDo => "do",
            TokenKind::KwNot => "not",
            TokenKind::KwGoto => "goto",
            TokenKind::Identifier(name) => return write!(f, "{}", name),
            TokenKind::IntLiteral(value) => return write!(f, "{}", value),
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Eq => "=",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::Eof => "<eof>",
        };
        f.write_str(text)
    }
}

/// Token
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text the token was scanned from
    pub lexeme: String,
    pub literal: Option<Literal>,
    pub span: Span,
}

/// Typed literal value carried by a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Literal {
    Int(i64),
    Ident(String),
}

/// Keyword lookup
pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
    match s {
        "library" => Some(TokenKind::KwLibrary),
        "behaviour" => Some(TokenKind::KwBehaviour),
        "sequence" => Some(TokenKind::KwSequence),
        "state" => Some(TokenKind::KwState),
        "const" => Some(TokenKind::KwConst),
        "starter" => Some(TokenKind::KwStarter),
        "assign" => Some(TokenKind::KwAssign),
        "pack" => Some(TokenKind::KwPack),
        "if" => Some(TokenKind::KwIf),
        "do" => Some(TokenKind::KwDo),
        "not" => Some(TokenKind::KwNot),
        "goto" => Some(TokenKind::KwGoto),
        _ => None,
    }
}

/// Check whether `s` would lex as a single identifier token
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_') && keyword_from_str(s).is_none()
}
