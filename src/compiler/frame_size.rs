//! Frame sizing.
//!
//! Every function gets one flat frame, allocated by its `ENTER`. Before any
//! code for the function is emitted its body is walked once to add up the
//! bytes the frame must hold: the return slot, every local declaration in
//! every nested block and branch, and the literals that appear as whole
//! statements. The walk reads declared types and literal shapes only, it
//! never calls the resolver.

use crate::ast::{
    ast::{Block, Expr, ExprKind, Stmt, StmtKind},
    statements::FnDef,
};

/// Upper bound, in bytes, of the frame needed by `function`.
pub fn frame_size(function: &FnDef) -> u32 {
    function.return_type.size() + block_size(&function.body)
}

fn block_size(block: &Block) -> u32 {
    block.body.iter().map(stmt_size).sum()
}

fn literal_size(expr: &Expr) -> u32 {
    match expr.kind {
        ExprKind::Integer(_) | ExprKind::Str(_) => 4,
        ExprKind::Double(_) => 8,
        _ => 0,
    }
}

fn stmt_size(stmt: &Stmt) -> u32 {
    match &stmt.kind {
        StmtKind::VarDecl(decl) => decl.ty.size(),
        StmtKind::Block(block) => block_size(block),
        StmtKind::Eval(expr) => literal_size(expr),
        StmtKind::If {
            then_branch,
            else_branch,
            ..
        } => stmt_size(then_branch) + else_branch.as_deref().map(stmt_size).unwrap_or(0),
        StmtKind::While { body, .. } | StmtKind::Sweep { body, .. } => stmt_size(body),
        StmtKind::FnDecl(_)
        | StmtKind::FnDef(_)
        | StmtKind::Print { .. }
        | StmtKind::Return(_)
        | StmtKind::Next
        | StmtKind::Stop => 0,
    }
}
