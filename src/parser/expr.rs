use crate::{
    ast::{
        ast::{Expr, ExprKind},
        expressions::{BinaryOperator, LValue, LValueKind, UnaryOperator},
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
    Span,
};

use super::{lookups::BindingPower, parser::Parser};

pub fn parse_expr(parser: &mut Parser, bp: BindingPower) -> Result<Expr, Error> {
    let Some(nud) = parser.nud_handler(parser.current_token_kind()) else {
        return Err(parser.unexpected_token());
    };

    let mut left = nud(parser)?;

    // Keep folding infix operators while they bind tighter than `bp`.
    loop {
        let token_kind = parser.current_token_kind();
        let token_bp = parser.binding_power(token_kind);

        if token_bp <= bp {
            break;
        }

        let Some(led) = parser.led_handler(token_kind) else {
            return Err(parser.unexpected_token());
        };

        left = led(parser, left, token_bp)?;
    }

    Ok(left)
}

pub fn parse_primary_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let token = parser.advance().clone();

    let kind = match token.kind {
        TokenKind::Number if token.value.contains('.') => {
            ExprKind::Double(token.value.parse().map_err(|_| {
                Error::new(
                    ErrorImpl::NumberParseError {
                        token: token.value.clone(),
                    },
                    token.span.start.clone(),
                )
            })?)
        }
        TokenKind::Number => ExprKind::Integer(token.value.parse().map_err(|_| {
            Error::new(
                ErrorImpl::NumberParseError {
                    token: token.value.clone(),
                },
                token.span.start.clone(),
            )
        })?),
        TokenKind::Identifier => ExprKind::Rvalue(LValue::new(
            LValueKind::Variable(token.value.clone()),
            token.span.clone(),
        )),
        TokenKind::String => ExprKind::Str(token.value.clone()),
        _ => {
            return Err(Error::new(
                ErrorImpl::UnexpectedToken {
                    token: token.value.clone(),
                },
                token.span.start.clone(),
            ))
        }
    };

    Ok(Expr::new(kind, token.span))
}

pub fn parse_binary_expr(parser: &mut Parser, left: Expr, bp: BindingPower) -> Result<Expr, Error> {
    let operator_token = parser.advance().clone();
    let operator = BinaryOperator::from_token(operator_token.kind).ok_or_else(|| {
        Error::new(
            ErrorImpl::UnexpectedToken {
                token: operator_token.value.clone(),
            },
            operator_token.span.start.clone(),
        )
    })?;

    let right = parse_expr(parser, bp)?;

    let span = Span {
        start: left.span.start.clone(),
        end: right.span.end.clone(),
    };

    Ok(Expr::new(
        ExprKind::Binary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    ))
}

pub fn parse_prefix_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let operator_token = parser.advance().clone();
    let operator = UnaryOperator::from_token(operator_token.kind).ok_or_else(|| {
        Error::new(
            ErrorImpl::UnexpectedToken {
                token: operator_token.value.clone(),
            },
            operator_token.span.start.clone(),
        )
    })?;

    let operand = parse_expr(parser, BindingPower::Unary)?;
    let span = Span {
        start: operator_token.span.start,
        end: operand.span.end.clone(),
    };

    Ok(Expr::new(
        ExprKind::Unary {
            operator,
            operand: Box::new(operand),
        },
        span,
    ))
}

pub fn parse_address_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let start = parser.advance().span.start.clone();
    let operand = parse_expr(parser, BindingPower::Unary)?;

    Ok(Expr::new(
        ExprKind::Address(Box::new(operand)),
        parser.span_from(start),
    ))
}

pub fn parse_read_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let span = parser.advance().span.clone();
    Ok(Expr::new(ExprKind::Read, span))
}

pub fn parse_alloc_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let start = parser.advance().span.start.clone();

    parser.expect(TokenKind::OpenParen)?;
    let count = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseParen)?;

    Ok(Expr::new(
        ExprKind::Alloc(Box::new(count)),
        parser.span_from(start),
    ))
}

/// Turns a parsed expression back into the location it names.
fn into_lvalue(expr: Expr) -> Result<LValue, Error> {
    match expr.kind {
        ExprKind::Rvalue(lvalue) => Ok(lvalue),
        _ => Err(Error::new(ErrorImpl::NotAnLvalue, expr.span.start)),
    }
}

pub fn parse_assignment_expr(
    parser: &mut Parser,
    left: Expr,
    _bp: BindingPower,
) -> Result<Expr, Error> {
    parser.advance();

    let target = into_lvalue(left)?;
    // One step below assignment so `a = b = c` groups to the right.
    let value = parse_expr(parser, BindingPower::Comma)?;

    let span = Span {
        start: target.span.start.clone(),
        end: value.span.end.clone(),
    };

    Ok(Expr::new(
        ExprKind::Assignment {
            target,
            value: Box::new(value),
        },
        span,
    ))
}

pub fn parse_grouping_expr(parser: &mut Parser) -> Result<Expr, Error> {
    parser.advance();
    let expr = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseParen)?;

    Ok(expr)
}

pub fn parse_call_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    let name = match &left.kind {
        ExprKind::Rvalue(LValue {
            kind: LValueKind::Variable(name),
            ..
        }) => name.clone(),
        _ => {
            return Err(Error::new(
                ErrorImpl::UnexpectedTokenDetailed {
                    token: parser.current_token().value.clone(),
                    message: String::from("only named functions can be called"),
                },
                parser.get_position(),
            ))
        }
    };

    parser.advance();

    let mut arguments = vec![];

    while parser.current_token_kind() != TokenKind::CloseParen {
        arguments.push(parse_expr(parser, BindingPower::Comma)?);

        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
        } else if parser.current_token_kind() != TokenKind::CloseParen {
            return Err(parser.unexpected("expected `,` or `)` in argument list"));
        }
    }

    parser.expect(TokenKind::CloseParen)?;

    Ok(Expr::new(
        ExprKind::Call { name, arguments },
        parser.span_from(left.span.start.clone()),
    ))
}

pub fn parse_index_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    parser.advance();

    let shift = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseBracket)?;

    let span = parser.span_from(left.span.start.clone());
    let lvalue = LValue::new(
        LValueKind::Index {
            base: Box::new(left),
            shift: Box::new(shift),
        },
        span.clone(),
    );

    Ok(Expr::new(ExprKind::Rvalue(lvalue), span))
}
