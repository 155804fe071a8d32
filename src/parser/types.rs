//! Type annotations: `int`, `double`, `string`, `void`, and pointers written
//! as a `[]` suffix that may repeat (`int[][]`).

use std::collections::HashMap;

use crate::{
    ast::types::Type,
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
};

use super::{lookups::BindingPower, parser::Parser};

pub type TypeNUDHandler = fn(&mut Parser) -> Result<Type, Error>;
pub type TypeLEDHandler = fn(&mut Parser, Type, BindingPower) -> Result<Type, Error>;

pub type TypeNUDLookup = HashMap<TokenKind, TypeNUDHandler>;
pub type TypeLEDLookup = HashMap<TokenKind, TypeLEDHandler>;
pub type TypeBPLookup = HashMap<TokenKind, BindingPower>;

pub fn create_token_type_lookups(parser: &mut Parser) {
    parser.type_nud(TokenKind::Identifier, parse_symbol_type);
    parser.type_led(TokenKind::OpenBracket, BindingPower::Call, parse_pointer_type);
}

pub fn parse_symbol_type(parser: &mut Parser) -> Result<Type, Error> {
    let token = parser.expect(TokenKind::Identifier)?;

    match token.value.as_str() {
        "int" => Ok(Type::Int),
        "double" => Ok(Type::Double),
        "string" => Ok(Type::String),
        "void" => Ok(Type::Void),
        _ => Err(Error::new(
            ErrorImpl::UnknownType {
                type_: token.value.clone(),
            },
            token.span.start,
        )),
    }
}

pub fn parse_pointer_type(
    parser: &mut Parser,
    left: Type,
    _bp: BindingPower,
) -> Result<Type, Error> {
    parser.expect(TokenKind::OpenBracket)?;
    parser.expect(TokenKind::CloseBracket)?;

    Ok(Type::pointer_to(left))
}

pub fn parse_type(parser: &mut Parser, bp: BindingPower) -> Result<Type, Error> {
    let Some(nud) = parser.type_nud_handler(parser.current_token_kind()) else {
        return Err(parser.unexpected_token());
    };

    let mut ty = nud(parser)?;

    while parser.type_binding_power(parser.current_token_kind()) > bp {
        let token_kind = parser.current_token_kind();
        let Some(led) = parser.type_led_handler(token_kind) else {
            return Err(parser.unexpected_token());
        };

        ty = led(parser, ty, parser.type_binding_power(token_kind))?;
    }

    Ok(ty)
}
