use crate::Span;

use super::{
    ast::{Block, Expr},
    types::Type,
};

/// Linkage of a top-level declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qualifier {
    None,
    /// `export`: visible to other units.
    Export,
    /// `extern`: defined in another unit.
    Import,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub qualifier: Qualifier,
    pub ty: Type,
    pub name: String,
    pub initializer: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub ty: Type,
    pub span: Span,
}

/// A function signature without a body.
#[derive(Debug, Clone, PartialEq)]
pub struct FnDecl {
    pub qualifier: Qualifier,
    pub return_type: Type,
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FnDef {
    pub qualifier: Qualifier,
    pub return_type: Type,
    pub name: String,
    pub parameters: Vec<Parameter>,
    /// Initial value of the return slot.
    pub literal: Option<Expr>,
    pub body: Block,
    pub span: Span,
}

impl FnDef {
    pub fn parameter_types(&self) -> Vec<Type> {
        self.parameters.iter().map(|p| p.ty.clone()).collect()
    }
}

impl FnDecl {
    pub fn parameter_types(&self) -> Vec<Type> {
        self.parameters.iter().map(|p| p.ty.clone()).collect()
    }
}
