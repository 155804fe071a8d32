//! Unit tests for the lexer module.
//!
//! This module contains tests for tokenization including:
//! - Keywords and identifiers
//! - Numeric literals (integers and doubles)
//! - String literals with escape sequences
//! - Operators and punctuation
//! - Comments
//! - Error cases

use super::{lexer::tokenize, tokens::TokenKind};

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source.to_string(), Some("test.sw".to_string()))
        .unwrap()
        .iter()
        .map(|token| token.kind)
        .collect()
}

#[test]
fn test_tokenize_keywords() {
    let source = "let fn return if else while sweep to downto step next stop print println read alloc export extern";

    assert_eq!(
        kinds(source),
        vec![
            TokenKind::Let,
            TokenKind::Fn,
            TokenKind::Return,
            TokenKind::If,
            TokenKind::Else,
            TokenKind::While,
            TokenKind::Sweep,
            TokenKind::To,
            TokenKind::Downto,
            TokenKind::Step,
            TokenKind::Next,
            TokenKind::Stop,
            TokenKind::Print,
            TokenKind::Println,
            TokenKind::Read,
            TokenKind::Alloc,
            TokenKind::Export,
            TokenKind::Extern,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_tokenize_identifiers() {
    let source = "foo bar_1 _main toString nexts".to_string();
    let tokens = tokenize(source, Some("test.sw".to_string())).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Identifier);
    assert_eq!(tokens[0].value, "foo");
    assert_eq!(tokens[1].value, "bar_1");
    assert_eq!(tokens[2].value, "_main");
    assert_eq!(tokens[3].value, "toString");
    // Keywords only match whole words
    assert_eq!(tokens[4].kind, TokenKind::Identifier);
    assert_eq!(tokens[4].value, "nexts");
    assert_eq!(tokens[5].kind, TokenKind::EOF);
}

#[test]
fn test_tokenize_numbers() {
    let source = "42 3.14 0 100.5".to_string();
    let tokens = tokenize(source, Some("test.sw".to_string())).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Number);
    assert_eq!(tokens[0].value, "42");
    assert_eq!(tokens[1].value, "3.14");
    assert_eq!(tokens[2].value, "0");
    assert_eq!(tokens[3].value, "100.5");
    assert_eq!(tokens[4].kind, TokenKind::EOF);
}

#[test]
fn test_tokenize_strings() {
    let source = r#""hello" "two words" """#.to_string();
    let tokens = tokenize(source, Some("test.sw".to_string())).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[0].value, "hello");
    assert_eq!(tokens[1].value, "two words");
    assert_eq!(tokens[2].value, "");
    assert_eq!(tokens[3].kind, TokenKind::EOF);
}

#[test]
fn test_tokenize_string_escapes() {
    let source = r#""a\nb\t\"q\"\\\x41""#.to_string();
    let tokens = tokenize(source, Some("test.sw".to_string())).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[0].value, "a\nb\t\"q\"\\A");
    assert_eq!(tokens[1].kind, TokenKind::EOF);
}

#[test]
fn test_tokenize_operators() {
    assert_eq!(
        kinds("== != ! = <= < >= > || && & ; : , -> + - / * %"),
        vec![
            TokenKind::Equals,
            TokenKind::NotEquals,
            TokenKind::Not,
            TokenKind::Assignment,
            TokenKind::LessEquals,
            TokenKind::Less,
            TokenKind::GreaterEquals,
            TokenKind::Greater,
            TokenKind::Or,
            TokenKind::And,
            TokenKind::Ampersand,
            TokenKind::Semicolon,
            TokenKind::Colon,
            TokenKind::Comma,
            TokenKind::Arrow,
            TokenKind::Plus,
            TokenKind::Dash,
            TokenKind::Slash,
            TokenKind::Star,
            TokenKind::Percent,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_tokenize_brackets() {
    assert_eq!(
        kinds("( ) { } [ ]"),
        vec![
            TokenKind::OpenParen,
            TokenKind::CloseParen,
            TokenKind::OpenCurly,
            TokenKind::CloseCurly,
            TokenKind::OpenBracket,
            TokenKind::CloseBracket,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_tokenize_comments() {
    let source = "let x: int; // trailing comment\n// full line\nprint x;";

    assert_eq!(
        kinds(source),
        vec![
            TokenKind::Let,
            TokenKind::Identifier,
            TokenKind::Colon,
            TokenKind::Identifier,
            TokenKind::Semicolon,
            TokenKind::Print,
            TokenKind::Identifier,
            TokenKind::Semicolon,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_tokenize_pointer_type() {
    assert_eq!(
        kinds("p: int[][]"),
        vec![
            TokenKind::Identifier,
            TokenKind::Colon,
            TokenKind::Identifier,
            TokenKind::OpenBracket,
            TokenKind::CloseBracket,
            TokenKind::OpenBracket,
            TokenKind::CloseBracket,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_token_spans() {
    let source = "let value: int = 12;".to_string();
    let tokens = tokenize(source, Some("test.sw".to_string())).unwrap();

    assert_eq!(tokens[1].value, "value");
    assert_eq!(tokens[1].span.start.0, 4);
    assert_eq!(tokens[1].span.end.0, 9);
    assert_eq!(tokens[5].value, "12");
    assert_eq!(tokens[5].span.start.0, 17);
    assert_eq!(*tokens[5].span.start.1, "test.sw");
}

#[test]
fn test_tokenize_unrecognised_character() {
    let source = "let x: int = 1 @ 2;".to_string();
    let error = tokenize(source, Some("test.sw".to_string())).unwrap_err();

    assert_eq!(error.get_error_name(), "UnrecognisedToken");
    assert_eq!(error.get_position().0, 15);
}

#[test]
fn test_tokenize_default_file_name() {
    let tokens = tokenize("x".to_string(), None).unwrap();
    assert_eq!(*tokens[0].span.start.1, "shell");
}

#[test]
fn test_tokenize_empty_source() {
    assert_eq!(kinds(""), vec![TokenKind::EOF]);
}
