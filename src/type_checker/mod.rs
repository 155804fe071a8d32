//! Semantic analysis.
//!
//! The resolver assigns a type to every expression node on demand. The code
//! generator calls into it one statement at a time, so resolution and
//! emission interleave instead of running as separate phases. It enforces:
//!
//! - Implicit int to double widening
//! - Deferred types for `read` and `alloc`, fixed by their consumer
//! - Pointer arithmetic and comparison rules
//! - Declaration and definition consistency of functions
//!
//! The scoped symbol table used by both passes lives in `symbol_table`.

pub mod symbol_table;
pub mod type_checker;
