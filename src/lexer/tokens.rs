use lazy_static::lazy_static;
use std::{collections::HashMap, fmt::Display};

use crate::Span;

lazy_static! {
    pub static ref RESERVED_LOOKUP: HashMap<&'static str, TokenKind> = {
        let mut map = HashMap::new();
        map.insert("let", TokenKind::Let);
        map.insert("fn", TokenKind::Fn);
        map.insert("return", TokenKind::Return);
        map.insert("if", TokenKind::If);
        map.insert("else", TokenKind::Else);
        map.insert("while", TokenKind::While);
        map.insert("sweep", TokenKind::Sweep);
        map.insert("to", TokenKind::To);
        map.insert("downto", TokenKind::Downto);
        map.insert("step", TokenKind::Step);
        map.insert("next", TokenKind::Next);
        map.insert("stop", TokenKind::Stop);
        map.insert("print", TokenKind::Print);
        map.insert("println", TokenKind::Println);
        map.insert("read", TokenKind::Read);
        map.insert("alloc", TokenKind::Alloc);
        map.insert("export", TokenKind::Export);
        map.insert("extern", TokenKind::Extern);
        map
    };
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    EOF,
    Number,
    String,
    Identifier,

    OpenBracket,
    CloseBracket,
    OpenCurly,
    CloseCurly,
    OpenParen,
    CloseParen,

    Assignment, // =
    Equals,     // ==
    Not,        // !
    NotEquals,  // !=

    Less,
    LessEquals,
    Greater,
    GreaterEquals,

    Or,
    And,
    Ampersand,

    Semicolon,
    Colon,
    Comma,
    Arrow,

    Plus,
    Dash,
    Slash,
    Star,
    Percent,

    // Reserved
    Let,
    Fn,
    Return,
    If,
    Else,
    While,
    Sweep,
    To,
    Downto,
    Step,
    Next,
    Stop,
    Print,
    Println,
    Read,
    Alloc,
    Export,
    Extern,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub span: Span,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Token {{\nkind: {},\nvalue: {}}}", self.kind, self.value)
    }
}

impl Token {
    pub fn is_one_of_many(&self, tokens: &[TokenKind]) -> bool {
        tokens.contains(&self.kind)
    }

    pub fn debug(&self) {
        if self.is_one_of_many(&[TokenKind::String, TokenKind::Identifier, TokenKind::Number]) {
            log::trace!("{} ({})", self.kind, self.value);
        } else {
            log::trace!("{} ()", self.kind);
        }
    }
}
