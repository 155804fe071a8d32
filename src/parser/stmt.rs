use crate::{
    ast::{
        ast::{Block, Expr, ExprKind, Stmt, StmtKind},
        expressions::LValue,
        statements::{FnDecl, FnDef, Parameter, Qualifier, VarDecl},
        types::Type,
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
    parser::{expr::parse_expr, lookups::BindingPower},
};

use super::{parser::Parser, types::parse_type};

pub fn parse_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    if let Some(handler) = parser.stmt_handler(parser.current_token_kind()) {
        return handler(parser);
    }

    let expr = parse_expr(parser, BindingPower::Default)?;

    parser.expect(TokenKind::Semicolon)?;

    Ok(Stmt {
        span: parser.span_from(expr.span.start.clone()),
        kind: StmtKind::Eval(expr),
    })
}

pub fn parse_var_decl_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    parse_var_decl(parser, Qualifier::None)
}

pub fn parse_fn_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    parse_fn(parser, Qualifier::None)
}

/// `export` or `extern` followed by a variable or function declaration.
pub fn parse_qualified_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let qualifier = match parser.advance().kind {
        TokenKind::Extern => Qualifier::Import,
        _ => Qualifier::Export,
    };

    match parser.current_token_kind() {
        TokenKind::Let => parse_var_decl(parser, qualifier),
        TokenKind::Fn => parse_fn(parser, qualifier),
        _ => Err(parser.unexpected("expected `let` or `fn` after a linkage qualifier")),
    }
}

fn parse_var_decl(parser: &mut Parser, qualifier: Qualifier) -> Result<Stmt, Error> {
    let start = parser.advance().span.start.clone();

    let error = parser.unexpected("expected identifier during variable declaration");
    let name = parser.expect_error(TokenKind::Identifier, Some(error))?.value;

    parser.expect(TokenKind::Colon)?;
    let ty = parse_type(parser, BindingPower::Default)?;

    let initializer = if parser.current_token_kind() == TokenKind::Assignment {
        if qualifier == Qualifier::Import {
            return Err(parser.unexpected("extern variables cannot be initialized"));
        }
        parser.advance();
        Some(parse_expr(parser, BindingPower::Default)?)
    } else {
        None
    };

    parser.expect(TokenKind::Semicolon)?;

    let span = parser.span_from(start);
    Ok(Stmt {
        kind: StmtKind::VarDecl(VarDecl {
            qualifier,
            ty,
            name,
            initializer,
            span: span.clone(),
        }),
        span,
    })
}

fn parse_parameters(parser: &mut Parser) -> Result<Vec<Parameter>, Error> {
    parser.expect(TokenKind::OpenParen)?;

    let mut parameters = Vec::new();
    while parser.current_token_kind() != TokenKind::CloseParen {
        let start = parser.get_position();
        let name = parser.expect(TokenKind::Identifier)?.value;
        parser.expect(TokenKind::Colon)?;
        let ty = parse_type(parser, BindingPower::Default)?;

        parameters.push(Parameter {
            name,
            ty,
            span: parser.span_from(start),
        });

        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
        } else if parser.current_token_kind() != TokenKind::CloseParen {
            return Err(parser.unexpected("expected `,` or `)` in parameter list"));
        }
    }

    parser.expect(TokenKind::CloseParen)?;

    Ok(parameters)
}

fn parse_fn(parser: &mut Parser, qualifier: Qualifier) -> Result<Stmt, Error> {
    let start = parser.advance().span.start.clone();

    let name = parser.expect(TokenKind::Identifier)?.value;
    let parameters = parse_parameters(parser)?;

    let return_type = if parser.current_token_kind() == TokenKind::Arrow {
        parser.advance();
        parse_type(parser, BindingPower::Default)?
    } else {
        Type::Void
    };

    if parser.current_token_kind() == TokenKind::Semicolon {
        parser.advance();

        let span = parser.span_from(start);
        return Ok(Stmt {
            kind: StmtKind::FnDecl(FnDecl {
                qualifier,
                return_type,
                name,
                parameters,
                span: span.clone(),
            }),
            span,
        });
    }

    if qualifier == Qualifier::Import {
        return Err(parser.unexpected("extern functions cannot have a body"));
    }

    let literal = if parser.current_token_kind() == TokenKind::Assignment {
        parser.advance();
        let literal = parse_expr(parser, BindingPower::Default)?;
        if literal.as_literal().is_none() {
            return Err(Error::new(
                ErrorImpl::UnexpectedTokenDetailed {
                    token: String::from("="),
                    message: String::from("a function's default value must be a literal"),
                },
                literal.span.start,
            ));
        }
        Some(literal)
    } else {
        None
    };

    let body = parse_block(parser)?;

    let span = parser.span_from(start);
    Ok(Stmt {
        kind: StmtKind::FnDef(FnDef {
            qualifier,
            return_type,
            name,
            parameters,
            literal,
            body,
            span: span.clone(),
        }),
        span,
    })
}

pub fn parse_block(parser: &mut Parser) -> Result<Block, Error> {
    let start = parser.expect(TokenKind::OpenCurly)?.span.start;

    let mut body = Vec::new();
    while parser.current_token_kind() != TokenKind::CloseCurly {
        if !parser.has_tokens() {
            return Err(parser.unexpected("expected `}` before the end of the file"));
        }
        body.push(parse_stmt(parser)?);
    }

    parser.expect(TokenKind::CloseCurly)?;

    Ok(Block {
        body,
        span: parser.span_from(start),
    })
}

pub fn parse_block_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let block = parse_block(parser)?;

    Ok(Stmt {
        span: block.span.clone(),
        kind: StmtKind::Block(block),
    })
}

pub fn parse_if_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start.clone();

    let condition = parse_expr(parser, BindingPower::Default)?;
    let then_branch = parse_stmt(parser)?;

    let else_branch = if parser.current_token_kind() == TokenKind::Else {
        parser.advance();
        Some(Box::new(parse_stmt(parser)?))
    } else {
        None
    };

    Ok(Stmt {
        kind: StmtKind::If {
            condition,
            then_branch: Box::new(then_branch),
            else_branch,
        },
        span: parser.span_from(start),
    })
}

pub fn parse_while_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start.clone();

    let condition = parse_expr(parser, BindingPower::Default)?;
    let body = parse_stmt(parser)?;

    Ok(Stmt {
        kind: StmtKind::While {
            condition,
            body: Box::new(body),
        },
        span: parser.span_from(start),
    })
}

/// `sweep lv = init to|downto limit [step s] body`
pub fn parse_sweep_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let keyword = parser.advance().clone();

    // Stop before `=` so the control variable is not parsed as an assignment.
    let target = parse_expr(parser, BindingPower::Assignment)?;
    let target: LValue = match target.kind {
        ExprKind::Rvalue(lvalue) => lvalue,
        _ => return Err(Error::new(ErrorImpl::NotAnLvalue, target.span.start)),
    };

    parser.expect(TokenKind::Assignment)?;
    let init = parse_expr(parser, BindingPower::Default)?;

    let ascending = match parser.current_token_kind() {
        TokenKind::To => true,
        TokenKind::Downto => false,
        _ => return Err(parser.unexpected("expected `to` or `downto` in sweep")),
    };
    parser.advance();

    let limit = parse_expr(parser, BindingPower::Default)?;

    let step = if parser.current_token_kind() == TokenKind::Step {
        parser.advance();
        parse_expr(parser, BindingPower::Default)?
    } else {
        Expr::new(ExprKind::Integer(1), keyword.span.clone())
    };

    let body = parse_stmt(parser)?;

    Ok(Stmt {
        kind: StmtKind::Sweep {
            ascending,
            target,
            init,
            limit,
            step,
            body: Box::new(body),
        },
        span: parser.span_from(keyword.span.start),
    })
}

pub fn parse_return_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start.clone();

    let value = if parser.current_token_kind() != TokenKind::Semicolon {
        Some(parse_expr(parser, BindingPower::Default)?)
    } else {
        None
    };

    parser.expect(TokenKind::Semicolon)?;

    Ok(Stmt {
        kind: StmtKind::Return(value),
        span: parser.span_from(start),
    })
}

pub fn parse_next_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start.clone();
    parser.expect(TokenKind::Semicolon)?;

    Ok(Stmt {
        kind: StmtKind::Next,
        span: parser.span_from(start),
    })
}

pub fn parse_stop_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start.clone();
    parser.expect(TokenKind::Semicolon)?;

    Ok(Stmt {
        kind: StmtKind::Stop,
        span: parser.span_from(start),
    })
}

pub fn parse_print_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let keyword = parser.advance().clone();
    let newline = keyword.kind == TokenKind::Println;

    let argument = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::Semicolon)?;

    Ok(Stmt {
        kind: StmtKind::Print { argument, newline },
        span: parser.span_from(keyword.span.start),
    })
}
