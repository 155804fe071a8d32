use crate::Span;

use super::{
    expressions::{BinaryOperator, LValue, Literal, UnaryOperator},
    statements::{FnDecl, FnDef, VarDecl},
    types::Type,
};

/// An expression node.
///
/// `ty` starts out empty and is written by the type resolver. Once it holds
/// a concrete type, resolving the node again is a no-op.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    pub ty: Option<Type>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Integer(i32),
    Double(f64),
    Str(String),
    Unary {
        operator: UnaryOperator,
        operand: Box<Expr>,
    },
    Binary {
        operator: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Rvalue(LValue),
    Assignment {
        target: LValue,
        value: Box<Expr>,
    },
    Call {
        name: String,
        arguments: Vec<Expr>,
    },
    Read,
    Alloc(Box<Expr>),
    Address(Box<Expr>),
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr {
            kind,
            span,
            ty: None,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Integer(_) | ExprKind::Double(_) | ExprKind::Str(_)
        )
    }

    /// The compile-time value of a literal or a negated numeric literal.
    pub fn as_literal(&self) -> Option<Literal> {
        match &self.kind {
            ExprKind::Integer(value) => Some(Literal::Int(*value)),
            ExprKind::Double(value) => Some(Literal::Double(*value)),
            ExprKind::Str(value) => Some(Literal::Str(value.clone())),
            ExprKind::Unary {
                operator: UnaryOperator::Negate,
                operand,
            } => match operand.as_literal()? {
                Literal::Int(value) => Some(Literal::Int(value.wrapping_neg())),
                Literal::Double(value) => Some(Literal::Double(-value)),
                Literal::Str(_) => None,
            },
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    VarDecl(VarDecl),
    FnDecl(FnDecl),
    FnDef(FnDef),
    Block(Block),
    Eval(Expr),
    Print {
        argument: Expr,
        newline: bool,
    },
    Return(Option<Expr>),
    Next,
    Stop,
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    /// A bounded counting loop. Descending sweeps subtract the step.
    Sweep {
        ascending: bool,
        target: LValue,
        init: Expr,
        limit: Expr,
        step: Expr,
        body: Box<Stmt>,
    },
}

/// A brace-delimited sequence of statements, also used for the whole unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub body: Vec<Stmt>,
    pub span: Span,
}
