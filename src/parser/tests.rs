//! Unit tests for the parser module.
//!
//! This module contains tests for parsing various language constructs including:
//! - Variable and function declarations
//! - Expressions and operator precedence
//! - Control flow statements and loops
//! - Syntax errors

use std::rc::Rc;

use super::parser::parse;
use crate::{
    ast::{
        ast::{Block, ExprKind, StmtKind},
        expressions::{BinaryOperator, LValueKind, UnaryOperator},
        statements::Qualifier,
        types::Type,
    },
    errors::errors::Error,
    lexer::lexer::tokenize,
};

fn parse_source(source: &str) -> Result<Block, Error> {
    let tokens = tokenize(source.to_string(), Some("test.sw".to_string())).unwrap();
    let (_, result) = parse(tokens, Rc::new("test.sw".to_string()));
    result
}

/// Parses `source` as the body of a function and returns its statements.
fn parse_body(source: &str) -> Block {
    let program = parse_source(&format!("fn main() {{ {} }}", source)).unwrap();
    match program.body.into_iter().next().map(|stmt| stmt.kind) {
        Some(StmtKind::FnDef(def)) => def.body,
        other => panic!("expected a function definition, found {:?}", other),
    }
}

#[test]
fn test_parse_variable_declaration() {
    let program = parse_source("let x: int = 42;").unwrap();

    match &program.body[0].kind {
        StmtKind::VarDecl(decl) => {
            assert_eq!(decl.name, "x");
            assert_eq!(decl.ty, Type::Int);
            assert_eq!(decl.qualifier, Qualifier::None);
            assert!(matches!(
                decl.initializer.as_ref().unwrap().kind,
                ExprKind::Integer(42)
            ));
        }
        other => panic!("unexpected statement {:?}", other),
    }
}

#[test]
fn test_parse_pointer_types() {
    let program = parse_source("let p: double[][];").unwrap();

    match &program.body[0].kind {
        StmtKind::VarDecl(decl) => {
            assert_eq!(decl.ty, Type::pointer_to(Type::pointer_to(Type::Double)));
            assert!(decl.initializer.is_none());
        }
        other => panic!("unexpected statement {:?}", other),
    }
}

#[test]
fn test_parse_qualifiers() {
    let program = parse_source("export let a: int = 1; extern let b: double; extern fn f(x: int) -> int;").unwrap();

    assert!(matches!(&program.body[0].kind, StmtKind::VarDecl(decl) if decl.qualifier == Qualifier::Export));
    assert!(matches!(&program.body[1].kind, StmtKind::VarDecl(decl) if decl.qualifier == Qualifier::Import));
    assert!(matches!(&program.body[2].kind, StmtKind::FnDecl(decl) if decl.qualifier == Qualifier::Import));
}

#[test]
fn test_parse_function_definition() {
    let program = parse_source("fn add(a: int, b: double) -> double = 0 { return a + b; }").unwrap();

    match &program.body[0].kind {
        StmtKind::FnDef(def) => {
            assert_eq!(def.name, "add");
            assert_eq!(def.return_type, Type::Double);
            assert_eq!(def.parameter_types(), vec![Type::Int, Type::Double]);
            assert!(def.literal.is_some());
            assert_eq!(def.body.body.len(), 1);
        }
        other => panic!("unexpected statement {:?}", other),
    }
}

#[test]
fn test_parse_function_declaration() {
    let program = parse_source("fn later(s: string);").unwrap();

    match &program.body[0].kind {
        StmtKind::FnDecl(decl) => {
            assert_eq!(decl.name, "later");
            assert_eq!(decl.return_type, Type::Void);
            assert_eq!(decl.parameter_types(), vec![Type::String]);
        }
        other => panic!("unexpected statement {:?}", other),
    }
}

#[test]
fn test_parse_precedence() {
    let body = parse_body("x = 1 + 2 * 3 - 4;");

    let StmtKind::Eval(expr) = &body.body[0].kind else {
        panic!("expected an expression statement");
    };
    let ExprKind::Assignment { value, .. } = &expr.kind else {
        panic!("expected an assignment");
    };
    // (1 + (2 * 3)) - 4
    let ExprKind::Binary { operator, left, .. } = &value.kind else {
        panic!("expected a binary expression");
    };
    assert_eq!(*operator, BinaryOperator::Subtract);
    let ExprKind::Binary { operator, right, .. } = &left.kind else {
        panic!("expected a binary expression");
    };
    assert_eq!(*operator, BinaryOperator::Add);
    assert!(matches!(
        right.kind,
        ExprKind::Binary {
            operator: BinaryOperator::Multiply,
            ..
        }
    ));
}

#[test]
fn test_parse_unary_binds_tighter_than_binary() {
    let body = parse_body("print -a + b;");

    let StmtKind::Print { argument, newline } = &body.body[0].kind else {
        panic!("expected a print statement");
    };
    assert!(!newline);
    let ExprKind::Binary { operator, left, .. } = &argument.kind else {
        panic!("expected a binary expression");
    };
    assert_eq!(*operator, BinaryOperator::Add);
    assert!(matches!(
        left.kind,
        ExprKind::Unary {
            operator: UnaryOperator::Negate,
            ..
        }
    ));
}

#[test]
fn test_parse_assignment_is_right_associative() {
    let body = parse_body("a = b = 3;");

    let StmtKind::Eval(expr) = &body.body[0].kind else {
        panic!("expected an expression statement");
    };
    let ExprKind::Assignment { target, value } = &expr.kind else {
        panic!("expected an assignment");
    };
    assert!(matches!(&target.kind, LValueKind::Variable(name) if name == "a"));
    assert!(matches!(value.kind, ExprKind::Assignment { .. }));
}

#[test]
fn test_parse_index_call_and_address() {
    let body = parse_body("p[i + 1] = f(1, 2.5, \"s\"); q = &p[0];");

    let StmtKind::Eval(expr) = &body.body[0].kind else {
        panic!("expected an expression statement");
    };
    let ExprKind::Assignment { target, value } = &expr.kind else {
        panic!("expected an assignment");
    };
    assert!(matches!(target.kind, LValueKind::Index { .. }));
    let ExprKind::Call { name, arguments } = &value.kind else {
        panic!("expected a call");
    };
    assert_eq!(name, "f");
    assert_eq!(arguments.len(), 3);

    let StmtKind::Eval(expr) = &body.body[1].kind else {
        panic!("expected an expression statement");
    };
    let ExprKind::Assignment { value, .. } = &expr.kind else {
        panic!("expected an assignment");
    };
    assert!(matches!(value.kind, ExprKind::Address(_)));
}

#[test]
fn test_parse_read_and_alloc() {
    let body = parse_body("x = read; p = alloc(4);");

    let StmtKind::Eval(expr) = &body.body[0].kind else {
        panic!("expected an expression statement");
    };
    assert!(matches!(&expr.kind, ExprKind::Assignment { value, .. } if value.kind == ExprKind::Read));

    let StmtKind::Eval(expr) = &body.body[1].kind else {
        panic!("expected an expression statement");
    };
    assert!(matches!(&expr.kind, ExprKind::Assignment { value, .. } if matches!(value.kind, ExprKind::Alloc(_))));
}

#[test]
fn test_parse_if_else_chain() {
    let body = parse_body("if x > 0 { print 1; } else if x < 0 { print 2; } else { print 3; }");

    let StmtKind::If { else_branch, .. } = &body.body[0].kind else {
        panic!("expected an if statement");
    };
    let nested = else_branch.as_ref().unwrap();
    assert!(matches!(
        &nested.kind,
        StmtKind::If {
            else_branch: Some(_),
            ..
        }
    ));
}

#[test]
fn test_parse_while_with_loop_control() {
    let body = parse_body("while 1 { next; stop; }");

    let StmtKind::While { body, .. } = &body.body[0].kind else {
        panic!("expected a while statement");
    };
    let StmtKind::Block(block) = &body.kind else {
        panic!("expected a block");
    };
    assert_eq!(block.body[0].kind, StmtKind::Next);
    assert_eq!(block.body[1].kind, StmtKind::Stop);
}

#[test]
fn test_parse_sweep() {
    let body = parse_body("sweep i = 0 to 9 { println i; } sweep d = 10.0 downto 0 step 2.5 { }");

    let StmtKind::Sweep {
        ascending,
        target,
        step,
        ..
    } = &body.body[0].kind
    else {
        panic!("expected a sweep statement");
    };
    assert!(*ascending);
    assert!(matches!(&target.kind, LValueKind::Variable(name) if name == "i"));
    assert_eq!(step.kind, ExprKind::Integer(1));

    let StmtKind::Sweep { ascending, step, .. } = &body.body[1].kind else {
        panic!("expected a sweep statement");
    };
    assert!(!*ascending);
    assert_eq!(step.kind, ExprKind::Double(2.5));
}

#[test]
fn test_parse_return_forms() {
    let body = parse_body("return; return 1 + 2;");

    assert_eq!(body.body[0].kind, StmtKind::Return(None));
    assert!(matches!(&body.body[1].kind, StmtKind::Return(Some(_))));
}

#[test]
fn test_parse_missing_semicolon() {
    let error = parse_source("let x: int = 5").unwrap_err();
    assert_eq!(error.get_error_name(), "UnexpectedToken");
}

#[test]
fn test_parse_unknown_type() {
    let error = parse_source("let x: float = 5;").unwrap_err();
    assert_eq!(error.get_error_name(), "UnknownType");
    assert_eq!(error.get_position().0, 7);
}

#[test]
fn test_parse_assignment_to_non_lvalue() {
    let error = parse_source("fn main() { 1 = 2; }").unwrap_err();
    assert_eq!(error.get_error_name(), "NotAnLvalue");
}

#[test]
fn test_parse_non_literal_function_default() {
    let error = parse_source("fn f() -> int = x { }").unwrap_err();
    assert_eq!(error.get_error_name(), "UnexpectedTokenDetailed");
}

#[test]
fn test_parse_extern_with_body() {
    let error = parse_source("extern fn f() { }").unwrap_err();
    assert_eq!(error.get_error_name(), "UnexpectedTokenDetailed");
}

#[test]
fn test_parse_unterminated_block() {
    let error = parse_source("fn main() { print 1;").unwrap_err();
    assert_eq!(error.get_error_name(), "UnexpectedTokenDetailed");
}

#[test]
fn test_parse_integer_overflow() {
    let error = parse_source("let x: int = 99999999999;").unwrap_err();
    assert_eq!(error.get_error_name(), "NumberParseError");
}
