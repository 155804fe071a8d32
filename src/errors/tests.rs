//! Unit tests for error handling.
//!
//! This module contains tests for error types and error reporting.

use crate::errors::errors::{Error, ErrorImpl, ErrorTip};
use crate::Position;
use std::rc::Rc;

fn at_origin(error: ErrorImpl) -> Error {
    Error::new(error, Position(0, Rc::new("test.sw".to_string())))
}

#[test]
fn test_error_creation() {
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "@".to_string(),
        },
        Position(10, Rc::new("test.sw".to_string())),
    );

    assert_eq!(error.get_error_name(), "UnrecognisedToken");
}

#[test]
fn test_error_position() {
    let pos = Position(42, Rc::new("test.sw".to_string()));
    let error = Error::new(
        ErrorImpl::UnexpectedToken {
            token: "identifier".to_string(),
        },
        pos.clone(),
    );

    assert_eq!(error.get_position().0, 42);
    assert_eq!(*error.get_position(), pos);
}

#[test]
fn test_type_mismatch_error() {
    let error = at_origin(ErrorImpl::TypeMatchError {
        expected: "int".to_string(),
        received: "string".to_string(),
    });

    assert_eq!(error.get_error_name(), "TypeMatchError");
    assert_eq!(
        error.get_error().to_string(),
        "types do not match: expected int, received string"
    );
}

#[test]
fn test_undeclared_identifier_error() {
    let error = at_origin(ErrorImpl::UndeclaredIdentifier {
        name: "foo".to_string(),
    });

    assert_eq!(error.get_error_name(), "UndeclaredIdentifier");
    assert_eq!(error.to_string(), "test.sw: \"foo\" undeclared");
}

#[test]
fn test_redeclaration_error() {
    let error = at_origin(ErrorImpl::Redeclaration {
        name: "x".to_string(),
    });

    assert_eq!(error.get_error_name(), "Redeclaration");
}

#[test]
fn test_function_already_defined_error() {
    let error = at_origin(ErrorImpl::FunctionAlreadyDefined {
        name: "main".to_string(),
    });

    assert_eq!(error.get_error_name(), "FunctionAlreadyDefined");
}

#[test]
fn test_argument_count_error() {
    let error = at_origin(ErrorImpl::ArgumentCountMismatch {
        name: "f".to_string(),
        expected: 2,
        received: 3,
    });

    assert_eq!(error.get_error_name(), "ArgumentCountMismatch");
    assert_eq!(error.get_tip().to_string(), "Expected 2 arguments, received 3");
}

#[test]
fn test_unknown_type_error() {
    let error = at_origin(ErrorImpl::UnknownType {
        type_: "float".to_string(),
    });

    assert_eq!(error.get_error_name(), "UnknownType");
}

#[test]
fn test_fatal_errors() {
    assert!(at_origin(ErrorImpl::NextOutsideLoop).is_fatal());
    assert!(at_origin(ErrorImpl::StopOutsideLoop).is_fatal());
    assert!(at_origin(ErrorImpl::StatementOutsideFunction).is_fatal());
    assert!(at_origin(ErrorImpl::UnprintableType {
        type_: "int[]".to_string()
    })
    .is_fatal());
    assert!(at_origin(ErrorImpl::GlobalInitializerNotLiteral {
        name: "g".to_string()
    })
    .is_fatal());
}

#[test]
fn test_recoverable_errors() {
    assert!(!at_origin(ErrorImpl::UnresolvedType).is_fatal());
    assert!(!at_origin(ErrorImpl::NotAnLvalue).is_fatal());
    assert!(!at_origin(ErrorImpl::OperandTypeError {
        operator: "%".to_string(),
        received: "double".to_string(),
    })
    .is_fatal());
    assert!(!at_origin(ErrorImpl::UndeclaredIdentifier {
        name: "x".to_string()
    })
    .is_fatal());
}

#[test]
fn test_error_tip_none() {
    let error = at_origin(ErrorImpl::UnrecognisedToken {
        token: "@".to_string(),
    });

    assert!(matches!(error.get_tip(), ErrorTip::None));
}

#[test]
fn test_error_tip_suggestion() {
    let error = at_origin(ErrorImpl::UnexpectedToken {
        token: "}".to_string(),
    });

    match error.get_tip() {
        ErrorTip::Suggestion(_) => (),
        _ => panic!("Expected suggestion tip"),
    }
}

#[test]
fn test_error_tip_display() {
    let tip = ErrorTip::Suggestion("Try this instead".to_string());
    assert_eq!(tip.to_string(), "Try this instead");

    let tip = ErrorTip::None;
    assert_eq!(tip.to_string(), "");
}

#[test]
fn test_loop_control_messages() {
    assert_eq!(
        ErrorImpl::NextOutsideLoop.to_string(),
        "'next' outside 'while' or 'sweep'"
    );
    assert_eq!(
        ErrorImpl::StopOutsideLoop.to_string(),
        "'stop' outside 'while' or 'sweep'"
    );
}
