/// AST (Abstract Syntax Tree) module
/// Contains all definitions related to the AST structure
///
/// Submodules:
/// - ast: Expression and statement nodes
/// - expressions: Operators, lvalues and literal values
/// - statements: Declarations and function definitions
/// - types: The type model shared by every pass
pub mod ast;
pub mod expressions;
pub mod statements;
pub mod types;
