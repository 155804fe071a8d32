//! Error types and error handling for the compiler.
//!
//! This module defines the error type shared by every compilation phase:
//!
//! - Error structures with source position information
//! - Specific error variants for lexing, parsing, type resolution and code generation
//! - The fatal/recoverable split used for statement-level recovery
//! - Helpful error messages and suggestions

pub mod errors;

#[cfg(test)]
mod tests;
