//! Token cursor and grammar tables.
//!
//! Expressions and types are parsed Pratt style: every token kind may have a
//! prefix (NUD) handler, an infix (LED) handler and a binding power. The
//! tables live in a `Grammar` that is filled once by `create_token_lookups`
//! and `create_token_type_lookups`; statements are dispatched on their
//! leading keyword through the same structure.

use std::rc::Rc;

use crate::{
    ast::ast::Block,
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::{Token, TokenKind},
    Position, Span,
};

use super::{
    lookups::{
        create_token_lookups, BPLookup, BindingPower, LEDHandler, LEDLookup, NUDHandler, NUDLookup,
        StmtHandler, StmtLookup,
    },
    stmt::parse_stmt,
    types::{
        create_token_type_lookups, TypeBPLookup, TypeLEDHandler, TypeLEDLookup, TypeNUDHandler,
        TypeNUDLookup,
    },
};

#[derive(Default)]
struct Grammar {
    statements: StmtLookup,
    nud: NUDLookup,
    led: LEDLookup,
    binding_powers: BPLookup,
    type_nud: TypeNUDLookup,
    type_led: TypeLEDLookup,
    type_binding_powers: TypeBPLookup,
}

pub struct Parser {
    /// Never empty: the last token is always EOF.
    tokens: Vec<Token>,
    pos: usize,
    grammar: Grammar,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>, file: Rc<String>) -> Self {
        if tokens.last().map(|token| token.kind) != Some(TokenKind::EOF) {
            let end = match tokens.last() {
                Some(token) => token.span.end.clone(),
                None => Position(0, Rc::clone(&file)),
            };
            tokens.push(Token {
                kind: TokenKind::EOF,
                value: String::from("EOF"),
                span: Span {
                    start: end.clone(),
                    end,
                },
            });
        }

        Parser {
            tokens,
            pos: 0,
            grammar: Grammar::default(),
        }
    }

    pub fn current_token(&self) -> &Token {
        &self.tokens[self.pos]
    }

    pub fn current_token_kind(&self) -> TokenKind {
        self.current_token().kind
    }

    /// Consumes the current token and returns it. EOF is never consumed.
    pub fn advance(&mut self) -> &Token {
        let consumed = self.pos;
        if consumed + 1 < self.tokens.len() {
            self.pos += 1;
        }
        &self.tokens[consumed]
    }

    /// Consumes a token of the given kind, or fails with `error` (a plain
    /// `UnexpectedToken` when none is given).
    pub fn expect_error(
        &mut self,
        expected_kind: TokenKind,
        error: Option<Error>,
    ) -> Result<Token, Error> {
        if self.current_token_kind() == expected_kind {
            return Ok(self.advance().clone());
        }

        Err(error.unwrap_or_else(|| self.unexpected_token()))
    }

    pub fn expect(&mut self, expected_kind: TokenKind) -> Result<Token, Error> {
        self.expect_error(expected_kind, None)
    }

    pub fn unexpected_token(&self) -> Error {
        Error::new(
            ErrorImpl::UnexpectedToken {
                token: self.current_token().value.clone(),
            },
            self.get_position(),
        )
    }

    /// Like `unexpected_token`, with a note on what was expected instead.
    pub fn unexpected(&self, message: &str) -> Error {
        Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: self.current_token().value.clone(),
                message: String::from(message),
            },
            self.get_position(),
        )
    }

    pub fn has_tokens(&self) -> bool {
        self.current_token_kind() != TokenKind::EOF
    }

    pub fn stmt_handler(&self, kind: TokenKind) -> Option<StmtHandler> {
        self.grammar.statements.get(&kind).copied()
    }

    pub fn nud_handler(&self, kind: TokenKind) -> Option<NUDHandler> {
        self.grammar.nud.get(&kind).copied()
    }

    pub fn led_handler(&self, kind: TokenKind) -> Option<LEDHandler> {
        self.grammar.led.get(&kind).copied()
    }

    /// Binding power of a token in infix position; tokens without one end
    /// the expression.
    pub fn binding_power(&self, kind: TokenKind) -> BindingPower {
        self.grammar
            .binding_powers
            .get(&kind)
            .copied()
            .unwrap_or(BindingPower::Default)
    }

    pub fn type_nud_handler(&self, kind: TokenKind) -> Option<TypeNUDHandler> {
        self.grammar.type_nud.get(&kind).copied()
    }

    pub fn type_led_handler(&self, kind: TokenKind) -> Option<TypeLEDHandler> {
        self.grammar.type_led.get(&kind).copied()
    }

    pub fn type_binding_power(&self, kind: TokenKind) -> BindingPower {
        self.grammar
            .type_binding_powers
            .get(&kind)
            .copied()
            .unwrap_or(BindingPower::Default)
    }

    pub fn led(&mut self, kind: TokenKind, binding_power: BindingPower, led_fn: LEDHandler) {
        self.grammar.binding_powers.insert(kind, binding_power);
        self.grammar.led.insert(kind, led_fn);
    }

    /// Prefix handlers leave the binding power table alone, so `-` and `(`
    /// keep the precedence of their infix meaning.
    pub fn nud(&mut self, kind: TokenKind, nud_fn: NUDHandler) {
        self.grammar.nud.insert(kind, nud_fn);
    }

    pub fn stmt(&mut self, kind: TokenKind, stmt_fn: StmtHandler) {
        self.grammar.binding_powers.insert(kind, BindingPower::Default);
        self.grammar.statements.insert(kind, stmt_fn);
    }

    pub fn type_led(
        &mut self,
        kind: TokenKind,
        binding_power: BindingPower,
        led_fn: TypeLEDHandler,
    ) {
        self.grammar.type_binding_powers.insert(kind, binding_power);
        self.grammar.type_led.insert(kind, led_fn);
    }

    pub fn type_nud(&mut self, kind: TokenKind, nud_fn: TypeNUDHandler) {
        self.grammar
            .type_binding_powers
            .insert(kind, BindingPower::Primary);
        self.grammar.type_nud.insert(kind, nud_fn);
    }

    pub fn get_position(&self) -> Position {
        self.current_token().span.start.clone()
    }

    /// Span from `start` to the end of the last consumed token.
    pub fn span_from(&self, start: Position) -> Span {
        let end = match self.pos.checked_sub(1) {
            Some(last) => self.tokens[last].span.end.clone(),
            None => start.clone(),
        };

        Span { start, end }
    }
}

/// Parses a whole file into its top-level block.
///
/// Parsing stops at the first syntax error. The parser is handed back
/// either way so callers can inspect where it stopped.
pub fn parse(tokens: Vec<Token>, file: Rc<String>) -> (Parser, Result<Block, Error>) {
    let mut parser = Parser::new(tokens, Rc::clone(&file));
    create_token_lookups(&mut parser);
    create_token_type_lookups(&mut parser);

    let mut body = vec![];

    while parser.has_tokens() {
        match parse_stmt(&mut parser) {
            Ok(stmt) => body.push(stmt),
            Err(error) => return (parser, Err(error)),
        }
    }

    let span = parser.span_from(Position(0, file));
    (parser, Ok(Block { body, span }))
}
