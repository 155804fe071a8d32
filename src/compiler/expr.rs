use crate::{
    ast::{
        ast::{Expr, ExprKind},
        expressions::{BinaryOperator, LValue, LValueKind, UnaryOperator},
        types::{Type, Width},
    },
    errors::errors::{Error, ErrorImpl},
    type_checker::{
        symbol_table::{Storage, SymbolKind},
        type_checker::{resolve_expr, resolve_lvalue},
    },
    Span,
};

use super::{compiler::Compiler, postfix::Instruction};

/// Converts the value on top of the stack from `from` to `to` when an int
/// meets a double destination.
pub fn widen(compiler: &mut Compiler, from: Option<&Type>, to: &Type) {
    if from == Some(&Type::Int) && *to == Type::Double {
        compiler.emit(Instruction::I2D);
    }
}

fn unresolved(expr: &Expr) -> Error {
    Error::new(ErrorImpl::UnresolvedType, expr.span.start.clone())
}

/// Pushes the value of an expression.
///
/// The node is resolved first; after that every node below it carries a
/// concrete type, which picks the instruction flavour.
pub fn gen_expression(compiler: &mut Compiler, expr: &mut Expr) -> Result<(), Error> {
    let ty = resolve_expr(&mut compiler.checker(), expr)?;
    if ty.is_deferred() {
        return Err(unresolved(expr));
    }

    match &mut expr.kind {
        ExprKind::Integer(value) => compiler.emit(Instruction::Int(*value)),
        ExprKind::Double(value) => {
            let label = compiler.new_label();
            compiler.emit(Instruction::Rodata);
            compiler.emit(Instruction::Align);
            compiler.emit(Instruction::Label(label.clone()));
            compiler.emit(Instruction::SDouble(*value));
            compiler.emit(Instruction::Text);
            compiler.emit(Instruction::Addr(label));
            compiler.emit(Instruction::DLoad);
        }
        ExprKind::Str(value) => {
            let label = compiler.new_label();
            compiler.emit(Instruction::Rodata);
            compiler.emit(Instruction::Align);
            compiler.emit(Instruction::Label(label.clone()));
            compiler.emit(Instruction::SString(value.clone()));
            compiler.emit(Instruction::Text);
            compiler.emit(Instruction::Addr(label));
        }
        ExprKind::Unary { operator, operand } => {
            gen_expression(compiler, operand)?;
            match operator {
                UnaryOperator::Negate => compiler.postfix.negate(ty.width()),
                UnaryOperator::Identity => {}
                UnaryOperator::Not => {
                    compiler.emit(Instruction::Int(0));
                    compiler.emit(Instruction::Eq);
                }
            }
        }
        ExprKind::Binary {
            operator,
            left,
            right,
        } => gen_binary(compiler, *operator, left, right)?,
        ExprKind::Rvalue(lvalue) => gen_lvalue_value(compiler, lvalue)?,
        ExprKind::Assignment { target, value } => {
            gen_expression(compiler, value)?;
            widen(compiler, value.ty.as_ref(), &ty);
            compiler.postfix.dup(ty.width());
            gen_lvalue_address(compiler, target)?;
            compiler.postfix.store(ty.width());
        }
        ExprKind::Call { name, arguments } => {
            gen_call(compiler, name, arguments, &ty, &expr.span)?
        }
        ExprKind::Read => {
            let (routine, width) = match ty {
                Type::Double => ("readd", Width::Double),
                _ => ("readi", Width::Word),
            };
            compiler.emit(Instruction::Call(routine.to_string()));
            compiler.postfix.push_result(width);
        }
        ExprKind::Alloc(count) => {
            compiler.emit(Instruction::Int(ty.element_size() as i32));
            gen_expression(compiler, count)?;
            compiler.emit(Instruction::Mul);
            compiler.emit(Instruction::Alloc);
            compiler.emit(Instruction::Sp);
        }
        ExprKind::Address(operand) => {
            let ExprKind::Rvalue(lvalue) = &mut operand.kind else {
                return Err(Error::new(ErrorImpl::NotAnLvalue, operand.span.start.clone()));
            };
            gen_lvalue_address(compiler, lvalue)?;
        }
    }

    Ok(())
}

fn operand_type(expr: &Expr) -> Result<Type, Error> {
    match &expr.ty {
        Some(ty) if !ty.is_deferred() => Ok(ty.clone()),
        _ => Err(unresolved(expr)),
    }
}

/// `&&` and `||` never evaluate their right operand when the left one
/// decides the result.
///
/// ```text
///     left, JZ false, right, JZ false, INT 1, JMP end
/// false:
///     INT 0
/// end:
/// ```
///
/// `||` is the mirror image, with `JNZ` and the constants swapped.
fn gen_logical(
    compiler: &mut Compiler,
    operator: BinaryOperator,
    left: &mut Expr,
    right: &mut Expr,
) -> Result<(), Error> {
    let short = compiler.new_label();
    let end = compiler.new_label();

    let is_and = operator == BinaryOperator::And;
    let jump = |label: String| {
        if is_and {
            Instruction::Jz(label)
        } else {
            Instruction::Jnz(label)
        }
    };
    let (decided, otherwise) = if is_and { (0, 1) } else { (1, 0) };

    gen_expression(compiler, left)?;
    compiler.emit(jump(short.clone()));
    gen_expression(compiler, right)?;
    compiler.emit(jump(short.clone()));
    compiler.emit(Instruction::Int(otherwise));
    compiler.emit(Instruction::Jmp(end.clone()));
    compiler.emit(Instruction::Label(short));
    compiler.emit(Instruction::Int(decided));
    compiler.emit(Instruction::Label(end));

    Ok(())
}

fn gen_binary(
    compiler: &mut Compiler,
    operator: BinaryOperator,
    left: &mut Expr,
    right: &mut Expr,
) -> Result<(), Error> {
    if matches!(operator, BinaryOperator::And | BinaryOperator::Or) {
        return gen_logical(compiler, operator, left, right);
    }

    let left_type = operand_type(left)?;
    let right_type = operand_type(right)?;

    match (&left_type, &right_type) {
        // Pointer plus or minus an int: the int counts elements.
        (Type::Pointer(_), Type::Int) => {
            gen_expression(compiler, left)?;
            gen_expression(compiler, right)?;
            compiler.emit(Instruction::Int(left_type.element_size() as i32));
            compiler.emit(Instruction::Mul);
            compiler.postfix.arithmetic(operator, Width::Word);
        }
        (Type::Int, Type::Pointer(_)) => {
            gen_expression(compiler, left)?;
            compiler.emit(Instruction::Int(right_type.element_size() as i32));
            compiler.emit(Instruction::Mul);
            gen_expression(compiler, right)?;
            compiler.postfix.arithmetic(operator, Width::Word);
        }
        (Type::Pointer(_), Type::Pointer(_)) if operator == BinaryOperator::Subtract => {
            gen_expression(compiler, left)?;
            gen_expression(compiler, right)?;
            compiler.emit(Instruction::Sub);
            compiler.emit(Instruction::Int(left_type.element_size() as i32));
            compiler.emit(Instruction::Div);
        }
        _ => {
            let operands = if left_type == Type::Double || right_type == Type::Double {
                Type::Double
            } else {
                Type::Int
            };

            gen_expression(compiler, left)?;
            widen(compiler, Some(&left_type), &operands);
            gen_expression(compiler, right)?;
            widen(compiler, Some(&right_type), &operands);

            if operator.is_relational() || operator.is_equality() {
                compiler.postfix.compare(operator, operands.width());
            } else {
                compiler.postfix.arithmetic(operator, operands.width());
            }
        }
    }

    Ok(())
}

/// Arguments are pushed right to left, each converted to its parameter
/// type, and removed by the caller once the callee returns.
fn gen_call(
    compiler: &mut Compiler,
    name: &str,
    arguments: &mut [Expr],
    return_type: &Type,
    span: &Span,
) -> Result<(), Error> {
    let parameters = match compiler.symbols.find(name).map(|symbol| &symbol.kind) {
        Some(SymbolKind::Function { parameters, .. }) => parameters.clone(),
        _ => {
            return Err(Error::new(
                ErrorImpl::NotAFunction {
                    name: name.to_string(),
                },
                span.start.clone(),
            ))
        }
    };

    if parameters.len() != arguments.len() {
        return Err(Error::new(
            ErrorImpl::ArgumentCountMismatch {
                name: name.to_string(),
                expected: parameters.len(),
                received: arguments.len(),
            },
            span.start.clone(),
        ));
    }

    for (argument, parameter) in arguments.iter_mut().zip(parameters.iter()).rev() {
        gen_expression(compiler, argument)?;
        widen(compiler, argument.ty.as_ref(), parameter);
    }

    let link_name = compiler.link_name(name);
    compiler.referenced.insert(link_name.clone());
    compiler.emit(Instruction::Call(link_name));

    let bytes: u32 = parameters.iter().map(Type::size).sum();
    if bytes > 0 {
        compiler.emit(Instruction::Trash(bytes));
    }

    if *return_type != Type::Void {
        compiler.postfix.push_result(return_type.width());
    }

    Ok(())
}

/// Pushes the address of an lvalue.
pub fn gen_lvalue_address(compiler: &mut Compiler, lvalue: &mut LValue) -> Result<(), Error> {
    let ty = resolve_lvalue(&mut compiler.checker(), lvalue)?;

    match &mut lvalue.kind {
        LValueKind::Variable(name) => {
            let Some(symbol) = compiler.symbols.find(name) else {
                return Err(Error::new(
                    ErrorImpl::UndeclaredIdentifier { name: name.clone() },
                    lvalue.span.start.clone(),
                ));
            };

            let (storage, imported) = (symbol.storage, symbol.is_imported());

            match storage {
                Storage::Local(offset) => compiler.emit(Instruction::Local(offset)),
                Storage::Global => {
                    if imported {
                        compiler.referenced.insert(name.clone());
                    }
                    compiler.emit(Instruction::Addr(name.clone()));
                }
            }
        }
        LValueKind::Index { base, shift } => {
            gen_expression(compiler, base)?;
            gen_expression(compiler, shift)?;
            compiler.emit(Instruction::Int(ty.size() as i32));
            compiler.emit(Instruction::Mul);
            compiler.emit(Instruction::Add);
        }
    }

    Ok(())
}

/// Pushes the value stored in an lvalue.
pub fn gen_lvalue_value(compiler: &mut Compiler, lvalue: &mut LValue) -> Result<(), Error> {
    let ty = resolve_lvalue(&mut compiler.checker(), lvalue)?;
    gen_lvalue_address(compiler, lvalue)?;
    compiler.postfix.load(ty.width());
    Ok(())
}
