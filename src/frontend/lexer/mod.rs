//! Lexer module
//!
//! Turns AgentLab source text into a flat token vector. The whole input is
//! scanned eagerly; the first bad character aborts tokenization.

pub mod tokens;

pub use tokenizer::tokenize;
pub use tokens::{Literal, Token, TokenKind};

use crate::util::span::Position;

/// Lexer error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    #[error("{position}: unexpected character '{ch}'")]
    UnexpectedChar { ch: char, position: Position },
    #[error("{position}: malformed number literal `{text}`")]
    MalformedNumber { text: String, position: Position },
    #[error("{position}: unterminated block comment")]
    UnterminatedComment { position: Position },
}

impl LexError {
    /// Position the error was reported at
    pub fn position(&self) -> Position {
        match self {
            LexError::UnexpectedChar { position, .. }
            | LexError::MalformedNumber { position, .. }
            | LexError::UnterminatedComment { position } => *position,
        }
    }
}

/// Tokenize source code
mod tokenizer {
    use super::tokens::{keyword_from_str, Literal, Token, TokenKind};
    use super::LexError;
    use crate::util::span::{Position, Span};
    use std::iter::Peekable;
    use std::str::Chars;

    pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();

        while let Some(token) = lexer.next_token()? {
            tokens.push(token);
        }

        tokens.push(Token {
            kind: TokenKind::Eof,
            lexeme: String::new(),
            literal: None,
            span: Span::new(lexer.position(), lexer.position()),
        });
        tracing::trace!("tokenized {} tokens", tokens.len());
        Ok(tokens)
    }

    struct Lexer<'a> {
        source: &'a str,
        chars: Peekable<Chars<'a>>,
        offset: usize,
        line: usize,
        column: usize,
        start: Position,
    }

    impl<'a> Lexer<'a> {
        fn new(source: &'a str) -> Self {
            Self {
                source,
                chars: source.chars().peekable(),
                offset: 0,
                line: 1,
                column: 1,
                start: Position::with_offset(1, 1, 0),
            }
        }

        fn position(&self) -> Position {
            Position::with_offset(self.line, self.column, self.offset)
        }

        fn span(&self) -> Span {
            Span::new(self.start, self.position())
        }

        fn lexeme(&self) -> &'a str {
            &self.source[self.start.offset..self.offset]
        }

        fn advance(&mut self) -> Option<char> {
            let c = self.chars.next()?;
            self.offset += c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            Some(c)
        }

        fn peek(&mut self) -> Option<char> {
            self.chars.peek().copied()
        }

        fn peek_next(&self) -> Option<char> {
            self.chars.clone().nth(1)
        }

        fn skip_whitespace_and_comments(&mut self) -> Result<(), LexError> {
            loop {
                match self.peek() {
                    Some(' ' | '\t' | '\r' | '\n') => {
                        self.advance();
                    }
                    Some('/') if self.peek_next() == Some('/') => {
                        while let Some(c) = self.peek() {
                            if c == '\n' {
                                break;
                            }
                            self.advance();
                        }
                    }
                    Some('/') if self.peek_next() == Some('*') => {
                        let position = self.position();
                        self.advance();
                        self.advance();
                        loop {
                            match self.advance() {
                                Some('*') if self.peek() == Some('/') => {
                                    self.advance();
                                    break;
                                }
                                Some(_) => {}
                                None => return Err(LexError::UnterminatedComment { position }),
                            }
                        }
                    }
                    _ => return Ok(()),
                }
            }
        }

        fn next_token(&mut self) -> Result<Option<Token>, LexError> {
            self.skip_whitespace_and_comments()?;
            self.start = self.position();

            let c = match self.advance() {
                Some(c) => c,
                None => return Ok(None),
            };

            let kind = match c {
                c if is_identifier_start(c) => return Ok(Some(self.scan_identifier())),
                c if c.is_ascii_digit() => return self.scan_number(c).map(Some),
                '+' => TokenKind::Plus,
                '-' => TokenKind::Minus,
                '=' => TokenKind::Eq,
                '(' => TokenKind::LParen,
                ')' => TokenKind::RParen,
                '[' => TokenKind::LBracket,
                ']' => TokenKind::RBracket,
                '{' => TokenKind::LBrace,
                '}' => TokenKind::RBrace,
                ',' => TokenKind::Comma,
                ';' => TokenKind::Semicolon,
                ch => {
                    return Err(LexError::UnexpectedChar {
                        ch,
                        position: self.start,
                    })
                }
            };
            Ok(Some(self.make_token(kind, None)))
        }

        fn scan_identifier(&mut self) -> Token {
            while let Some(c) = self.peek() {
                if !is_identifier_char(c) {
                    break;
                }
                self.advance();
            }

            let text = self.lexeme();
            match keyword_from_str(text) {
                Some(kind) => self.make_token(kind, None),
                None => self.make_token(
                    TokenKind::Identifier(text.to_string()),
                    Some(Literal::Ident(text.to_string())),
                ),
            }
        }

        fn scan_number(
            &mut self,
            first: char,
        ) -> Result<Token, LexError> {
            let hex = first == '0' && matches!(self.peek(), Some('x' | 'X'));
            if hex {
                self.advance();
            }
            while let Some(c) = self.peek() {
                if is_identifier_char(c) {
                    self.advance();
                } else {
                    break;
                }
            }

            let text = self.lexeme();
            let parsed = if hex {
                let digits = &text[2..];
                if digits.is_empty() {
                    None
                } else {
                    i64::from_str_radix(digits, 16).ok()
                }
            } else {
                text.parse::<i64>().ok()
            };

            match parsed {
                Some(value) => Ok(self.make_token(TokenKind::IntLiteral(value), Some(Literal::Int(value)))),
                None => Err(LexError::MalformedNumber {
                    text: text.to_string(),
                    position: self.start,
                }),
            }
        }

        fn make_token(
            &self,
            kind: TokenKind,
            literal: Option<Literal>,
        ) -> Token {
            Token {
                kind,
                lexeme: self.lexeme().to_string(),
                literal,
                span: self.span(),
            }
        }
    }

    fn is_identifier_start(c: char) -> bool {
        c.is_ascii_alphabetic() || c == '_'
    }

    fn is_identifier_char(c: char) -> bool {
        c.is_ascii_alphanumeric() || c == '_'
    }
}

#[cfg(test)]
mod tests;
