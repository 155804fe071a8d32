use std::fmt::Display;

use thiserror::Error;

use crate::Position;

#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
        }
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_error(&self) -> &ErrorImpl {
        &self.internal_error
    }

    /// Fatal errors end compilation immediately; everything else is
    /// reported and compilation moves on to the next statement.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.internal_error,
            ErrorImpl::NextOutsideLoop
                | ErrorImpl::StopOutsideLoop
                | ErrorImpl::UnprintableType { .. }
                | ErrorImpl::GlobalInitializerNotLiteral { .. }
                | ErrorImpl::StatementOutsideFunction
        )
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => "UnrecognisedToken",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnexpectedTokenDetailed { .. } => "UnexpectedTokenDetailed",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
            ErrorImpl::UnknownType { .. } => "UnknownType",
            ErrorImpl::UndeclaredIdentifier { .. } => "UndeclaredIdentifier",
            ErrorImpl::Redeclaration { .. } => "Redeclaration",
            ErrorImpl::NotAFunction { .. } => "NotAFunction",
            ErrorImpl::FunctionUsedAsValue { .. } => "FunctionUsedAsValue",
            ErrorImpl::RedefinedAsFunction { .. } => "RedefinedAsFunction",
            ErrorImpl::FunctionAlreadyDefined { .. } => "FunctionAlreadyDefined",
            ErrorImpl::ArgumentCountMismatch { .. } => "ArgumentCountMismatch",
            ErrorImpl::ArgumentTypeMismatch { .. } => "ArgumentTypeMismatch",
            ErrorImpl::ParameterCountMismatch { .. } => "ParameterCountMismatch",
            ErrorImpl::ParameterTypeMismatch { .. } => "ParameterTypeMismatch",
            ErrorImpl::ReturnTypeMismatch { .. } => "ReturnTypeMismatch",
            ErrorImpl::TypeMatchError { .. } => "TypeMatchError",
            ErrorImpl::OperandTypeError { .. } => "OperandTypeError",
            ErrorImpl::InvalidReadContext { .. } => "InvalidReadContext",
            ErrorImpl::NotAnLvalue => "NotAnLvalue",
            ErrorImpl::AllocInBinaryExpression => "AllocInBinaryExpression",
            ErrorImpl::UnresolvedType => "UnresolvedType",
            ErrorImpl::NestedFunction { .. } => "NestedFunction",
            ErrorImpl::NextOutsideLoop => "NextOutsideLoop",
            ErrorImpl::StopOutsideLoop => "StopOutsideLoop",
            ErrorImpl::UnprintableType { .. } => "UnprintableType",
            ErrorImpl::GlobalInitializerNotLiteral { .. } => "GlobalInitializerNotLiteral",
            ErrorImpl::StatementOutsideFunction => "StatementOutsideFunction",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => ErrorTip::None,
            ErrorImpl::UnexpectedToken { token } => ErrorTip::Suggestion(format!(
                "Unexpected token: `{}`, did you miss a semicolon?",
                token
            )),
            ErrorImpl::UnexpectedTokenDetailed { token, message } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`, {}", token, message))
            }
            ErrorImpl::NumberParseError { token } => ErrorTip::Suggestion(format!(
                "Invalid number: `{}`, is it above the integer limit?",
                token
            )),
            ErrorImpl::UnknownType { type_ } => ErrorTip::Suggestion(format!(
                "Unknown type `{}`, expected int, double, string or void",
                type_
            )),
            ErrorImpl::UndeclaredIdentifier { name } => {
                ErrorTip::Suggestion(format!("`{}` is not declared in this scope", name))
            }
            ErrorImpl::Redeclaration { name } => {
                ErrorTip::Suggestion(format!("`{}` is already declared in this scope", name))
            }
            ErrorImpl::NotAFunction { name } => {
                ErrorTip::Suggestion(format!("`{}` is a variable and cannot be called", name))
            }
            ErrorImpl::FunctionUsedAsValue { name } => ErrorTip::Suggestion(format!(
                "`{}` is a function, call it with `{}(...)`",
                name, name
            )),
            ErrorImpl::RedefinedAsFunction { name } => ErrorTip::Suggestion(format!(
                "`{}` is already a variable and cannot become a function",
                name
            )),
            ErrorImpl::FunctionAlreadyDefined { name } => {
                ErrorTip::Suggestion(format!("Function `{}` already has a body", name))
            }
            ErrorImpl::ArgumentCountMismatch { expected, received, .. } => ErrorTip::Suggestion(
                format!("Expected {} arguments, received {}", expected, received),
            ),
            ErrorImpl::ArgumentTypeMismatch { expected, received, .. } => {
                ErrorTip::Suggestion(format!(
                    "Expected argument type `{}`, received `{}`",
                    expected, received
                ))
            }
            ErrorImpl::ParameterCountMismatch { expected, received, .. } => {
                ErrorTip::Suggestion(format!(
                    "The declaration has {} parameters but this has {}",
                    expected, received
                ))
            }
            ErrorImpl::ParameterTypeMismatch { expected, received, .. } => {
                ErrorTip::Suggestion(format!(
                    "The declaration expects `{}` but this parameter is `{}`",
                    expected, received
                ))
            }
            ErrorImpl::ReturnTypeMismatch { expected, received, .. } => {
                ErrorTip::Suggestion(format!(
                    "The declaration returns `{}` but this returns `{}`",
                    expected, received
                ))
            }
            ErrorImpl::TypeMatchError { expected, received } => ErrorTip::Suggestion(format!(
                "Expected type `{}`, received `{}`",
                expected, received
            )),
            ErrorImpl::OperandTypeError { operator, received } => ErrorTip::Suggestion(format!(
                "Operator `{}` cannot be applied to `{}`",
                operator, received
            )),
            ErrorImpl::InvalidReadContext { expected } => ErrorTip::Suggestion(format!(
                "`read` produces int or double, not `{}`",
                expected
            )),
            ErrorImpl::NotAnLvalue => {
                ErrorTip::Suggestion(String::from("Only variables and indexed pointers have addresses"))
            }
            ErrorImpl::AllocInBinaryExpression => ErrorTip::Suggestion(String::from(
                "Assign the allocation to a pointer before using it",
            )),
            ErrorImpl::UnresolvedType => ErrorTip::Suggestion(String::from(
                "The type of this expression cannot be inferred from its context",
            )),
            ErrorImpl::NestedFunction { name } => ErrorTip::Suggestion(format!(
                "Move the definition of `{}` to the top level",
                name
            )),
            ErrorImpl::NextOutsideLoop | ErrorImpl::StopOutsideLoop => {
                ErrorTip::Suggestion(String::from("Only valid inside `while` or `sweep`"))
            }
            ErrorImpl::UnprintableType { type_ } => {
                ErrorTip::Suggestion(format!("Values of type `{}` cannot be printed", type_))
            }
            ErrorImpl::GlobalInitializerNotLiteral { name } => ErrorTip::Suggestion(format!(
                "Global `{}` can only be initialized with a literal",
                name
            )),
            ErrorImpl::StatementOutsideFunction => ErrorTip::Suggestion(String::from(
                "Only declarations are allowed outside of functions",
            )),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.position.1, self.internal_error)
    }
}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("unrecognised token: {token:?}")]
    UnrecognisedToken { token: String },
    #[error("unexpected token: {token:?}")]
    UnexpectedToken { token: String },
    #[error("unexpected token ({message:?}): {token:?}")]
    UnexpectedTokenDetailed { token: String, message: String },
    #[error("error parsing number: {token:?}")]
    NumberParseError { token: String },
    #[error("unknown type {type_} found")]
    UnknownType { type_: String },

    #[error("{name:?} undeclared")]
    UndeclaredIdentifier { name: String },
    #[error("{name:?} redeclared")]
    Redeclaration { name: String },
    #[error("{name:?} is not a function")]
    NotAFunction { name: String },
    #[error("function {name:?} used as a value")]
    FunctionUsedAsValue { name: String },
    #[error("{name:?} redeclared as a function")]
    RedefinedAsFunction { name: String },
    #[error("function {name:?} already defined")]
    FunctionAlreadyDefined { name: String },
    #[error("call to {name:?}: expected {expected} arguments, received {received}")]
    ArgumentCountMismatch {
        name: String,
        expected: usize,
        received: usize,
    },
    #[error("call to {name:?}: argument types do not match: expected {expected}, received {received}")]
    ArgumentTypeMismatch {
        name: String,
        expected: String,
        received: String,
    },
    #[error("function {name:?}: expected {expected} parameters, received {received}")]
    ParameterCountMismatch {
        name: String,
        expected: usize,
        received: usize,
    },
    #[error("function {name:?}: parameter types do not match: expected {expected}, received {received}")]
    ParameterTypeMismatch {
        name: String,
        expected: String,
        received: String,
    },
    #[error("function {name:?}: return types do not match: expected {expected}, received {received}")]
    ReturnTypeMismatch {
        name: String,
        expected: String,
        received: String,
    },
    #[error("types do not match: expected {expected}, received {received}")]
    TypeMatchError { expected: String, received: String },
    #[error("wrong type in argument of {operator}: {received}")]
    OperandTypeError { operator: String, received: String },
    #[error("read cannot produce a value of type {expected}")]
    InvalidReadContext { expected: String },
    #[error("expression is not addressable")]
    NotAnLvalue,
    #[error("allocation used inside a binary expression")]
    AllocInBinaryExpression,
    #[error("unable to resolve the type of an expression")]
    UnresolvedType,
    #[error("function {name:?} defined inside another function")]
    NestedFunction { name: String },

    #[error("'next' outside 'while' or 'sweep'")]
    NextOutsideLoop,
    #[error("'stop' outside 'while' or 'sweep'")]
    StopOutsideLoop,
    #[error("cannot print expressions of type {type_}")]
    UnprintableType { type_: String },
    #[error("global {name:?} initialized with a non-literal")]
    GlobalInitializerNotLiteral { name: String },
    #[error("statement outside of a function")]
    StatementOutsideFunction,
}
