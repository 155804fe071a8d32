use crate::{
    ast::{
        ast::{Expr, ExprKind},
        expressions::{BinaryOperator, LValue, LValueKind, UnaryOperator},
        statements::{FnDecl, FnDef, Parameter, Qualifier, VarDecl},
        types::{DeferredKind, Type},
    },
    errors::errors::{Error, ErrorImpl},
    Span,
};

use super::symbol_table::{Storage, Symbol, SymbolKind, SymbolTable};

/// Resolver state for one statement.
///
/// The symbol table belongs to the code generator; the checker borrows it
/// together with the return type of the function being compiled, if any.
pub struct TypeChecker<'a> {
    pub symbols: &'a mut SymbolTable<Symbol>,
    pub return_type: Option<&'a Type>,
}

impl<'a> TypeChecker<'a> {
    pub fn new(symbols: &'a mut SymbolTable<Symbol>, return_type: Option<&'a Type>) -> Self {
        TypeChecker {
            symbols,
            return_type,
        }
    }
}

fn error_at(error: ErrorImpl, span: &Span) -> Error {
    Error::new(error, span.start.clone())
}

fn type_match_error(expected: &Type, received: &Type) -> ErrorImpl {
    ErrorImpl::TypeMatchError {
        expected: expected.to_string(),
        received: received.to_string(),
    }
}

/// `received` can be stored where `expected` is wanted: exact match, int
/// widened to double, or pointers whose subtypes agree (a double subtype
/// also accepts an int subtype).
pub fn is_assignable(expected: &Type, received: &Type) -> bool {
    match (expected, received) {
        (Type::Double, Type::Int) => true,
        (Type::Pointer(expected), Type::Pointer(received)) => {
            expected == received || (**expected == Type::Double && **received == Type::Int)
        }
        _ => expected == received,
    }
}

/// Widening rule for arithmetic: double if either side is double.
fn widened(left: &Type, right: &Type) -> Type {
    if *left == Type::Double || *right == Type::Double {
        Type::Double
    } else {
        Type::Int
    }
}

/// Checks `value` against a destination of type `expected`, fixing a
/// deferred `read` or `alloc` to the destination's type.
///
/// `mismatch` builds the error reported for an ordinary type mismatch, so
/// assignments and call arguments can report differently.
pub fn coerce(
    type_checker: &mut TypeChecker,
    expected: &Type,
    value: &mut Expr,
    mismatch: impl Fn(&Type, &Type) -> ErrorImpl,
) -> Result<(), Error> {
    let received = resolve_expr(type_checker, value)?;

    if received.is_read() {
        if !expected.is_numeric() {
            return Err(error_at(
                ErrorImpl::InvalidReadContext {
                    expected: expected.to_string(),
                },
                &value.span,
            ));
        }
        value.ty = Some(expected.clone());
        return Ok(());
    }

    if received.is_alloc() {
        if !expected.is_pointer() {
            return Err(error_at(mismatch(expected, &received), &value.span));
        }
        value.ty = Some(expected.clone());
        return Ok(());
    }

    if is_assignable(expected, &received) {
        Ok(())
    } else {
        Err(error_at(mismatch(expected, &received), &value.span))
    }
}

/// Resolves an operand that must be an int. A `read` becomes an int read.
fn require_int(type_checker: &mut TypeChecker, expr: &mut Expr, operator: &str) -> Result<(), Error> {
    let ty = resolve_expr(type_checker, expr)?;

    if ty.is_read() {
        expr.ty = Some(Type::Int);
        return Ok(());
    }

    if ty == Type::Int {
        Ok(())
    } else {
        Err(error_at(
            ErrorImpl::OperandTypeError {
                operator: operator.to_string(),
                received: ty.to_string(),
            },
            &expr.span,
        ))
    }
}

/// Assigns a type to an expression node and everything below it.
///
/// Nodes that already carry a concrete type are returned as they are. `read`
/// and `alloc` come back deferred; the caller that consumes them decides
/// their final type.
pub fn resolve_expr(type_checker: &mut TypeChecker, expr: &mut Expr) -> Result<Type, Error> {
    if let Some(ty) = &expr.ty {
        if !ty.is_deferred() {
            return Ok(ty.clone());
        }
    }

    let ty = match &mut expr.kind {
        ExprKind::Integer(_) => Type::Int,
        ExprKind::Double(_) => Type::Double,
        ExprKind::Str(_) => Type::String,
        ExprKind::Read => Type::Deferred(DeferredKind::Read),
        ExprKind::Alloc(count) => {
            require_int(type_checker, count, "alloc")?;
            Type::Deferred(DeferredKind::Alloc)
        }
        ExprKind::Unary { operator, operand } => match operator {
            UnaryOperator::Not => {
                require_int(type_checker, operand, "!")?;
                Type::Int
            }
            UnaryOperator::Negate | UnaryOperator::Identity => {
                let ty = resolve_expr(type_checker, operand)?;
                if ty.is_read() {
                    operand.ty = Some(Type::Int);
                    Type::Int
                } else if ty.is_numeric() {
                    ty
                } else {
                    return Err(error_at(
                        ErrorImpl::OperandTypeError {
                            operator: operator.to_string(),
                            received: ty.to_string(),
                        },
                        &operand.span,
                    ));
                }
            }
        },
        ExprKind::Address(operand) => {
            let ExprKind::Rvalue(lvalue) = &mut operand.kind else {
                return Err(error_at(ErrorImpl::NotAnLvalue, &operand.span));
            };
            let ty = resolve_lvalue(type_checker, lvalue)?;
            operand.ty = Some(ty);
            Type::Int
        }
        ExprKind::Rvalue(lvalue) => resolve_lvalue(type_checker, lvalue)?,
        ExprKind::Assignment { target, value } => {
            let ty = resolve_lvalue(type_checker, target)?;
            coerce(type_checker, &ty, value, type_match_error)?;
            ty
        }
        ExprKind::Call { name, arguments } => resolve_call(type_checker, name, arguments, &expr.span)?,
        ExprKind::Binary {
            operator,
            left,
            right,
        } => resolve_binary(type_checker, *operator, left, right)?,
    };

    expr.ty = Some(ty.clone());
    Ok(ty)
}

pub fn resolve_lvalue(type_checker: &mut TypeChecker, lvalue: &mut LValue) -> Result<Type, Error> {
    if let Some(ty) = &lvalue.ty {
        return Ok(ty.clone());
    }

    let ty = match &mut lvalue.kind {
        LValueKind::Variable(name) => match type_checker.symbols.find(name) {
            None => {
                return Err(error_at(
                    ErrorImpl::UndeclaredIdentifier { name: name.clone() },
                    &lvalue.span,
                ))
            }
            Some(symbol) if symbol.is_function() => {
                return Err(error_at(
                    ErrorImpl::FunctionUsedAsValue { name: name.clone() },
                    &lvalue.span,
                ))
            }
            Some(symbol) => symbol.ty.clone(),
        },
        LValueKind::Index { base, shift } => {
            let base_type = resolve_expr(type_checker, base)?;
            let Type::Pointer(subtype) = base_type else {
                return Err(error_at(
                    ErrorImpl::OperandTypeError {
                        operator: String::from("[]"),
                        received: base_type.to_string(),
                    },
                    &base.span,
                ));
            };
            require_int(type_checker, shift, "[]")?;
            *subtype
        }
    };

    lvalue.ty = Some(ty.clone());
    Ok(ty)
}

fn resolve_call(
    type_checker: &mut TypeChecker,
    name: &str,
    arguments: &mut [Expr],
    span: &Span,
) -> Result<Type, Error> {
    let (parameters, return_type) = match type_checker.symbols.find(name) {
        None => {
            return Err(error_at(
                ErrorImpl::UndeclaredIdentifier {
                    name: name.to_string(),
                },
                span,
            ))
        }
        Some(Symbol {
            kind: SymbolKind::Function { parameters, .. },
            ty,
            ..
        }) => (parameters.clone(), ty.clone()),
        Some(_) => {
            return Err(error_at(
                ErrorImpl::NotAFunction {
                    name: name.to_string(),
                },
                span,
            ))
        }
    };

    if arguments.len() != parameters.len() {
        return Err(error_at(
            ErrorImpl::ArgumentCountMismatch {
                name: name.to_string(),
                expected: parameters.len(),
                received: arguments.len(),
            },
            span,
        ));
    }

    for (argument, parameter) in arguments.iter_mut().zip(parameters.iter()) {
        coerce(type_checker, parameter, argument, |expected, received| {
            ErrorImpl::ArgumentTypeMismatch {
                name: name.to_string(),
                expected: expected.to_string(),
                received: received.to_string(),
            }
        })?;
    }

    Ok(return_type)
}

/// Gives a `read` operand a type from its sibling: the sibling's numeric
/// type, int next to a pointer in `+`/`-`, or int when both sides are reads.
fn settle_reads(
    operator: BinaryOperator,
    left: &mut Expr,
    left_type: Type,
    right: &mut Expr,
    right_type: Type,
) -> Result<(Type, Type), Error> {
    let settle = |other: &Type, expr: &Expr| -> Result<Type, Error> {
        if other.is_read() || other.is_numeric() {
            Ok(if other.is_read() { Type::Int } else { other.clone() })
        } else if other.is_pointer()
            && matches!(operator, BinaryOperator::Add | BinaryOperator::Subtract)
        {
            Ok(Type::Int)
        } else {
            Err(error_at(
                ErrorImpl::InvalidReadContext {
                    expected: other.to_string(),
                },
                &expr.span,
            ))
        }
    };

    let new_left = if left_type.is_read() {
        settle(&right_type, left)?
    } else {
        left_type
    };
    let new_right = if right_type.is_read() {
        settle(&new_left, right)?
    } else {
        right_type
    };

    left.ty = Some(new_left.clone());
    right.ty = Some(new_right.clone());

    Ok((new_left, new_right))
}

fn resolve_binary(
    type_checker: &mut TypeChecker,
    operator: BinaryOperator,
    left: &mut Expr,
    right: &mut Expr,
) -> Result<Type, Error> {
    if matches!(
        operator,
        BinaryOperator::Modulo | BinaryOperator::And | BinaryOperator::Or
    ) {
        require_int(type_checker, left, &operator.to_string())?;
        require_int(type_checker, right, &operator.to_string())?;
        return Ok(Type::Int);
    }

    let left_type = resolve_expr(type_checker, left)?;
    let right_type = resolve_expr(type_checker, right)?;

    for (ty, side) in [(&left_type, &*left), (&right_type, &*right)] {
        if ty.is_alloc() {
            return Err(error_at(ErrorImpl::AllocInBinaryExpression, &side.span));
        }
    }

    let (left_type, right_type) = settle_reads(operator, left, left_type, right, right_type)?;

    let result = match operator {
        _ if left_type.is_numeric() && right_type.is_numeric() => {
            if operator.is_relational() || operator.is_equality() {
                Some(Type::Int)
            } else {
                Some(widened(&left_type, &right_type))
            }
        }
        BinaryOperator::Add => match (&left_type, &right_type) {
            (Type::Pointer(_), Type::Int) => Some(left_type.clone()),
            (Type::Int, Type::Pointer(_)) => Some(right_type.clone()),
            _ => None,
        },
        BinaryOperator::Subtract => match (&left_type, &right_type) {
            (Type::Pointer(_), Type::Int) => Some(left_type.clone()),
            (Type::Pointer(a), Type::Pointer(b)) if a == b => Some(Type::Int),
            _ => None,
        },
        BinaryOperator::Equals | BinaryOperator::NotEquals => match (&left_type, &right_type) {
            (Type::String, Type::String) | (Type::Pointer(_), Type::Pointer(_)) => Some(Type::Int),
            _ => None,
        },
        _ => None,
    };

    result.ok_or_else(|| {
        error_at(
            ErrorImpl::OperandTypeError {
                operator: operator.to_string(),
                received: format!("{} and {}", left_type, right_type),
            },
            &left.span,
        )
    })
}

/// Rejects pointers whose innermost subtype is `void`: nothing can be stored
/// behind them, so they have no element size to index or allocate with.
fn check_pointer_base(ty: &Type, span: &Span) -> Result<(), Error> {
    if ty.is_pointer() && *ty.base() == Type::Void {
        return Err(error_at(
            ErrorImpl::TypeMatchError {
                expected: String::from("a pointer to a value type"),
                received: ty.to_string(),
            },
            span,
        ));
    }
    Ok(())
}

/// Parameters need a value type; the return type may also be plain `void`.
fn check_signature_types(
    return_type: &Type,
    parameters: &[Parameter],
    span: &Span,
) -> Result<(), Error> {
    check_pointer_base(return_type, span)?;

    for parameter in parameters {
        check_parameter_type(&parameter.ty, &parameter.span)?;
    }
    Ok(())
}

fn check_parameter_type(ty: &Type, span: &Span) -> Result<(), Error> {
    if *ty == Type::Void {
        return Err(error_at(
            ErrorImpl::TypeMatchError {
                expected: String::from("a value type"),
                received: ty.to_string(),
            },
            span,
        ));
    }
    check_pointer_base(ty, span)
}

pub fn declare_variable(
    type_checker: &mut TypeChecker,
    decl: &mut VarDecl,
    storage: Storage,
) -> Result<(), Error> {
    if decl.ty.size() == 0 {
        return Err(error_at(
            ErrorImpl::TypeMatchError {
                expected: String::from("a value type"),
                received: decl.ty.to_string(),
            },
            &decl.span,
        ));
    }
    check_pointer_base(&decl.ty, &decl.span)?;

    if type_checker.symbols.find_local(&decl.name).is_some() {
        return Err(error_at(
            ErrorImpl::Redeclaration {
                name: decl.name.clone(),
            },
            &decl.span,
        ));
    }

    if let Some(initializer) = &mut decl.initializer {
        coerce(type_checker, &decl.ty, initializer, type_match_error)?;
    }

    type_checker.symbols.insert(
        &decl.name,
        Symbol::variable(&decl.name, decl.ty.clone(), storage, decl.qualifier),
    );

    Ok(())
}

pub fn declare_parameter(
    type_checker: &mut TypeChecker,
    parameter: &Parameter,
    ty: Type,
    offset: i32,
) -> Result<(), Error> {
    check_parameter_type(&ty, &parameter.span)?;
    let symbol = Symbol::variable(&parameter.name, ty, Storage::Local(offset), Qualifier::None);

    if type_checker.symbols.insert(&parameter.name, symbol) {
        Ok(())
    } else {
        Err(error_at(
            ErrorImpl::Redeclaration {
                name: parameter.name.clone(),
            },
            &parameter.span,
        ))
    }
}

/// Compares a signature against an earlier declaration of the same function.
fn check_signature(
    declared: &Symbol,
    return_type: &Type,
    parameters: &[Parameter],
    span: &Span,
) -> Result<Vec<Type>, Error> {
    let SymbolKind::Function {
        parameters: declared_parameters,
        ..
    } = &declared.kind
    else {
        return Err(error_at(
            ErrorImpl::RedefinedAsFunction {
                name: declared.name.clone(),
            },
            span,
        ));
    };

    if declared_parameters.len() != parameters.len() {
        return Err(error_at(
            ErrorImpl::ParameterCountMismatch {
                name: declared.name.clone(),
                expected: declared_parameters.len(),
                received: parameters.len(),
            },
            span,
        ));
    }

    for (expected, parameter) in declared_parameters.iter().zip(parameters) {
        if !is_assignable(expected, &parameter.ty) {
            return Err(error_at(
                ErrorImpl::ParameterTypeMismatch {
                    name: declared.name.clone(),
                    expected: expected.to_string(),
                    received: parameter.ty.to_string(),
                },
                &parameter.span,
            ));
        }
    }

    if declared.ty != *return_type {
        return Err(error_at(
            ErrorImpl::ReturnTypeMismatch {
                name: declared.name.clone(),
                expected: declared.ty.to_string(),
                received: return_type.to_string(),
            },
            span,
        ));
    }

    Ok(declared_parameters.clone())
}

pub fn declare_function(type_checker: &mut TypeChecker, decl: &FnDecl) -> Result<(), Error> {
    check_signature_types(&decl.return_type, &decl.parameters, &decl.span)?;

    if let Some(existing) = type_checker.symbols.find_local(&decl.name) {
        check_signature(existing, &decl.return_type, &decl.parameters, &decl.span)?;
        return Ok(());
    }

    type_checker.symbols.insert(
        &decl.name,
        Symbol::function(
            &decl.name,
            decl.return_type.clone(),
            decl.parameter_types(),
            false,
            decl.qualifier,
        ),
    );

    Ok(())
}

/// Registers a function body.
///
/// # Returns
///
/// The parameter types the body must use. When the function was declared
/// first these are the declared types, so callers and callee agree on the
/// frame layout.
pub fn define_function(type_checker: &mut TypeChecker, def: &mut FnDef) -> Result<Vec<Type>, Error> {
    check_signature_types(&def.return_type, &def.parameters, &def.span)?;

    let parameters = match type_checker.symbols.find_local(&def.name) {
        Some(existing) => {
            if let SymbolKind::Function { defined: true, .. } = existing.kind {
                return Err(error_at(
                    ErrorImpl::FunctionAlreadyDefined {
                        name: def.name.clone(),
                    },
                    &def.span,
                ));
            }

            let parameters = check_signature(existing, &def.return_type, &def.parameters, &def.span)?;

            if let Some(symbol) = type_checker.symbols.find_mut(&def.name) {
                symbol.kind = SymbolKind::Function {
                    parameters: parameters.clone(),
                    defined: true,
                };
                if symbol.qualifier != Qualifier::Export {
                    symbol.qualifier = def.qualifier;
                }
            }

            parameters
        }
        None => {
            let parameters = def.parameter_types();
            type_checker.symbols.insert(
                &def.name,
                Symbol::function(
                    &def.name,
                    def.return_type.clone(),
                    parameters.clone(),
                    true,
                    def.qualifier,
                ),
            );
            parameters
        }
    };

    if let Some(literal) = &mut def.literal {
        coerce(type_checker, &def.return_type, literal, type_match_error)?;
    }

    Ok(parameters)
}

/// Conditions of `if` and `while` must be int; a `read` is read as an int.
pub fn resolve_condition(type_checker: &mut TypeChecker, condition: &mut Expr) -> Result<(), Error> {
    let ty = resolve_expr(type_checker, condition)?;

    if ty.is_read() {
        condition.ty = Some(Type::Int);
        return Ok(());
    }

    if ty == Type::Int {
        Ok(())
    } else {
        Err(error_at(type_match_error(&Type::Int, &ty), &condition.span))
    }
}

/// Resolves the argument of `print`. A `read` is echoed as an int.
pub fn resolve_print(type_checker: &mut TypeChecker, argument: &mut Expr) -> Result<Type, Error> {
    let ty = resolve_expr(type_checker, argument)?;

    if ty.is_read() {
        argument.ty = Some(Type::Int);
        return Ok(Type::Int);
    }

    Ok(ty)
}

/// Resolves an expression whose value is discarded.
pub fn resolve_eval(type_checker: &mut TypeChecker, expr: &mut Expr) -> Result<Type, Error> {
    let ty = resolve_expr(type_checker, expr)?;

    if ty.is_read() {
        expr.ty = Some(Type::Int);
        return Ok(Type::Int);
    }

    if ty.is_alloc() {
        return Err(error_at(ErrorImpl::UnresolvedType, &expr.span));
    }

    Ok(ty)
}

pub fn resolve_return(
    type_checker: &mut TypeChecker,
    value: Option<&mut Expr>,
    span: &Span,
) -> Result<(), Error> {
    let expected = type_checker.return_type.cloned().unwrap_or(Type::Void);

    match value {
        None => Ok(()),
        Some(value) if expected == Type::Void => {
            let received = resolve_expr(type_checker, value)?;
            Err(error_at(type_match_error(&Type::Void, &received), span))
        }
        Some(value) => coerce(type_checker, &expected, value, type_match_error),
    }
}

/// The control variable, initializer and step of a sweep share one numeric
/// type (with int widening); the limit only has to be numeric.
pub fn resolve_sweep(
    type_checker: &mut TypeChecker,
    target: &mut LValue,
    init: &mut Expr,
    limit: &mut Expr,
    step: &mut Expr,
) -> Result<Type, Error> {
    let ty = resolve_lvalue(type_checker, target)?;

    if !ty.is_numeric() {
        return Err(error_at(
            ErrorImpl::OperandTypeError {
                operator: String::from("sweep"),
                received: ty.to_string(),
            },
            &target.span,
        ));
    }

    coerce(type_checker, &ty, init, type_match_error)?;
    coerce(type_checker, &ty, step, type_match_error)?;

    let limit_type = resolve_expr(type_checker, limit)?;
    if limit_type.is_read() {
        limit.ty = Some(ty.clone());
    } else if !limit_type.is_numeric() {
        return Err(error_at(type_match_error(&ty, &limit_type), &limit.span));
    }

    Ok(ty)
}
