//! Code generation module for the compiler.
//!
//! Turns a parsed unit into a stream of stack-machine instructions. It
//! handles:
//!
//! - Frame sizing of every function before its code is emitted
//! - Expressions, with short-circuit logic and pointer arithmetic
//! - Statements, loops and the shared function epilogue
//! - Global data and the reconciliation of external names

pub mod compiler;
pub mod expr;
pub mod frame_size;
pub mod postfix;
pub mod stmt;
