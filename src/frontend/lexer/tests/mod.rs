//! Lexer 单元测试
//!
//! 测试词法分析器的分词功能
use crate::frontend::lexer::{tokenize, LexError, Literal, TokenKind};

#[cfg(test)]
mod lexer_basic_tests {
    use super::*;

    #[test]
    fn test_empty_source() {
        let tokens = tokenize("").unwrap();
        assert_eq!(tokens.len(), 1);
        assert!(matches!(tokens[0].kind, TokenKind::Eof));
    }

    #[test]
    fn test_whitespace_and_comments() {
        let tokens = tokenize("  \t\n// line comment\n/* block\n comment */  ").unwrap();
        assert_eq!(tokens.len(), 1);
    }

    #[test]
    fn test_identifier_literal() {
        let tokens = tokenize("Crash_01").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Identifier("Crash_01".to_string()));
        assert_eq!(tokens[0].literal, Some(Literal::Ident("Crash_01".to_string())));
        assert_eq!(tokens[0].lexeme, "Crash_01");
    }

    #[test]
    fn test_keywords() {
        let tokens = tokenize("library behaviour sequence state const starter assign pack if do not goto").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::KwLibrary,
                TokenKind::KwBehaviour,
                TokenKind::KwSequence,
                TokenKind::KwState,
                TokenKind::KwConst,
                TokenKind::KwStarter,
                TokenKind::KwAssign,
                TokenKind::KwPack,
                TokenKind::KwIf,
                TokenKind::KwDo,
                TokenKind::KwNot,
                TokenKind::KwGoto,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_punctuation() {
        let tokens = tokenize("[](){},;=+-").unwrap();
        assert_eq!(tokens.len(), 12);
        assert_eq!(tokens[0].kind, TokenKind::LBracket);
        assert_eq!(tokens[10].kind, TokenKind::Minus);
    }
}

#[cfg(test)]
mod lexer_number_tests {
    use super::*;

    #[test]
    fn test_decimal() {
        let tokens = tokenize("1234").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::IntLiteral(1234));
        assert_eq!(tokens[0].literal, Some(Literal::Int(1234)));
    }

    #[test]
    fn test_hexadecimal() {
        let tokens = tokenize("0x1F 0XfF").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::IntLiteral(0x1F));
        assert_eq!(tokens[1].kind, TokenKind::IntLiteral(0xFF));
        assert_eq!(tokens[0].lexeme, "0x1F");
    }

    #[test]
    fn test_negative_is_two_tokens() {
        let tokens = tokenize("-5").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Minus);
        assert_eq!(tokens[1].kind, TokenKind::IntLiteral(5));
    }

    #[test]
    fn test_bare_hex_prefix_rejected() {
        let err = tokenize("0x").unwrap_err();
        assert!(matches!(err, LexError::MalformedNumber { .. }));
    }

    #[test]
    fn test_digit_followed_by_letters_rejected() {
        let err = tokenize("12ab").unwrap_err();
        match err {
            LexError::MalformedNumber { text, position } => {
                assert_eq!(text, "12ab");
                assert_eq!(position.column, 1);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_overflow_rejected() {
        assert!(tokenize("99999999999999999999").is_err());
    }
}

#[cfg(test)]
mod lexer_error_tests {
    use super::*;

    #[test]
    fn test_unexpected_char_position() {
        let err = tokenize("state A\n  @").unwrap_err();
        match err {
            LexError::UnexpectedChar { ch, position } => {
                assert_eq!(ch, '@');
                assert_eq!(position.line, 2);
                assert_eq!(position.column, 3);
                assert_eq!(position.offset, 10);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_quoted_strings_are_not_tokens() {
        assert!(matches!(
            tokenize("\"Crash\"").unwrap_err(),
            LexError::UnexpectedChar { ch: '"', .. }
        ));
    }

    #[test]
    fn test_unterminated_block_comment() {
        let err = tokenize("const A = 1; /* never closed").unwrap_err();
        assert!(matches!(err, LexError::UnterminatedComment { .. }));
        assert_eq!(err.position().column, 14);
    }
}

#[cfg(test)]
mod lexer_span_tests {
    use super::*;

    #[test]
    fn test_spans_track_lines() {
        let tokens = tokenize("const\n  SPEED").unwrap();
        assert_eq!(tokens[0].span.start.line, 1);
        assert_eq!(tokens[1].span.start.line, 2);
        assert_eq!(tokens[1].span.start.column, 3);
        assert_eq!(tokens[1].span.len(), 5);
    }
}

#[cfg(test)]
mod lexer_property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn tokenize_never_panics(source in "\\PC{0,64}") {
            let _ = tokenize(&source);
        }

        #[test]
        fn decimal_literals_roundtrip(value in 0i64..i64::MAX) {
            let tokens = tokenize(&value.to_string()).unwrap();
            prop_assert_eq!(&tokens[0].kind, &TokenKind::IntLiteral(value));
        }
    }
}
