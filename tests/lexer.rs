//! Tests for the lexer
//!
//! These tests drive the scanner directly, plus the token list produced by
//! `jsparse::tokenize`, which needs the parser to tell `/` from a regexp.

use jsparse::context::Context;
use jsparse::error::ErrorKind;
use jsparse::lexer::{Lexer, Token, TokenKind};
use jsparse::string_dict::StringDict;
use jsparse::{Options, TokenRecord};

fn ctx() -> Context {
    Context::from_options(&Options::default())
}

#[allow(clippy::unwrap_used)]
fn lex_with(source: &str, ctx: Context) -> Vec<Token> {
    let mut dict = StringDict::new();
    let mut lexer = Lexer::new(source, ctx, &mut dict);
    let mut tokens = vec![];
    loop {
        let token = lexer.next_token().unwrap();
        if token.kind == TokenKind::Eof {
            break;
        }
        tokens.push(token);
    }
    tokens
}

fn lex(source: &str) -> Vec<TokenKind> {
    lex_with(source, ctx()).into_iter().map(|t| t.kind).collect()
}

#[allow(clippy::unwrap_used)]
fn tokens(source: &str) -> Vec<TokenRecord> {
    jsparse::tokenize(source, &Options::default()).unwrap()
}

fn lex_err(source: &str, ctx: Context) -> Option<ErrorKind> {
    let mut dict = StringDict::new();
    let mut lexer = Lexer::new(source, ctx, &mut dict);
    loop {
        match lexer.next_token() {
            Ok(token) if token.kind == TokenKind::Eof => return None,
            Ok(_) => {}
            Err(e) => return Some(e.kind),
        }
    }
}

#[test]
fn test_numbers() {
    assert_eq!(lex("42"), vec![TokenKind::Number(42.0)]);
    assert_eq!(lex("3.25"), vec![TokenKind::Number(3.25)]);
    assert_eq!(lex(".5"), vec![TokenKind::Number(0.5)]);
    assert_eq!(lex("1e3"), vec![TokenKind::Number(1000.0)]);
    assert_eq!(lex("0x1F"), vec![TokenKind::Number(31.0)]);
    assert_eq!(lex("0o17"), vec![TokenKind::Number(15.0)]);
    assert_eq!(lex("0b101"), vec![TokenKind::Number(5.0)]);
}

#[test]
fn test_legacy_octal_is_flagged() {
    let tokens = lex_with("017 08", ctx());
    assert_eq!(tokens.len(), 2);
    assert!(tokens.iter().all(|t| t.octal));
    assert_eq!(tokens.first().map(|t| t.kind.clone()), Some(TokenKind::Number(15.0)));
    assert_eq!(tokens.get(1).map(|t| t.kind.clone()), Some(TokenKind::Number(8.0)));
}

#[test]
fn test_identifier_directly_after_number() {
    assert_eq!(lex_err("3in x", ctx()), Some(ErrorKind::IdentifierAfterNumber));
}

#[test]
fn test_separators_and_bigint_need_next() {
    let next = Context::from_options(&Options::new().next());
    assert_eq!(lex_with("1_000", next).first().map(|t| t.kind.clone()), Some(TokenKind::Number(1000.0)));
    assert!(lex_err("1_000", ctx()).is_some());
    assert!(matches!(lex_with("10n", next).first().map(|t| &t.kind), Some(TokenKind::BigInt(_))));
    assert_eq!(lex_err("10n", ctx()), Some(ErrorKind::BigIntRequiresNext));
}

#[test]
fn test_strings() {
    let kinds = lex(r#"'a\nb' "\x41B\u{43}""#);
    let values: Vec<String> = kinds
        .iter()
        .filter_map(|k| match k {
            TokenKind::String(s) => Some(s.to_string()),
            _ => None,
        })
        .collect();
    assert_eq!(values, vec!["a\nb".to_string(), "ABC".to_string()]);
}

#[test]
fn test_raw_newline_in_string_fails() {
    assert_eq!(lex_err("'abc\ndef'", ctx()), Some(ErrorKind::UnterminatedString));
}

#[test]
fn test_line_continuation_in_string() {
    let kinds = lex("'ab\\\ncd'");
    assert!(matches!(kinds.first(), Some(TokenKind::String(s)) if s.as_str() == "abcd"));
}

#[test]
fn test_operator_columns() {
    let tokens = lex_with("a >>>= b", ctx());
    let columns: Vec<u32> = tokens.iter().map(|t| t.span.column).collect();
    assert_eq!(columns, vec![0, 2, 7]);
    assert_eq!(tokens.get(1).map(|t| t.kind.clone()), Some(TokenKind::GtGtGtEq));
    assert_eq!(tokens.get(1).map(|t| t.span.end - t.span.start), Some(4));
}

#[test]
fn test_lines_are_counted() {
    let tokens = lex_with("a\n  b\r\n c", ctx());
    let positions: Vec<(u32, u32)> = tokens.iter().map(|t| (t.span.line, t.span.column)).collect();
    assert_eq!(positions, vec![(1, 0), (2, 2), (3, 1)]);
}

#[test]
fn test_has_next() {
    let mut dict = StringDict::new();
    let mut lexer = Lexer::new("x", ctx(), &mut dict);
    assert!(lexer.has_next());
    assert!(matches!(lexer.next_token().map(|t| t.kind), Ok(TokenKind::Identifier(_))));
    assert!(!lexer.has_next());
}

#[test]
fn test_punctuators() {
    assert_eq!(
        lex("?. ?? ??= ** **= => ..."),
        vec![
            TokenKind::QuestionDot,
            TokenKind::QuestionQuestion,
            TokenKind::QuestionQuestionEq,
            TokenKind::StarStar,
            TokenKind::StarStarEq,
            TokenKind::Arrow,
            TokenKind::DotDotDot,
        ]
    );
}

#[test]
fn test_unicode_identifiers() {
    let kinds = lex("café ünïcödé $_");
    assert_eq!(kinds.len(), 3);
    assert!(kinds.iter().all(|k| matches!(k, TokenKind::Identifier(_))));
}

#[test]
fn test_tokenize_distinguishes_regexp_from_division() {
    let tokens = tokens("a = b / c; d = /re/g;");
    let categories: Vec<&str> = tokens.iter().map(|t| t.category).collect();
    assert_eq!(
        categories,
        vec![
            "Identifier",
            "Punctuator",
            "Identifier",
            "Punctuator",
            "Identifier",
            "Punctuator",
            "Identifier",
            "Punctuator",
            "RegularExpression",
            "Punctuator",
        ]
    );
    assert_eq!(tokens.get(8).map(|t| t.value.as_str()), Some("/re/g"));
}

#[test]
fn test_tokenize_template_parts() {
    let tokens = tokens("`a${b}c`");
    let values: Vec<&str> = tokens.iter().map(|t| t.value.as_str()).collect();
    assert_eq!(values, vec!["`a${", "b", "}c`"]);
}
