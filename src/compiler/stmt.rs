use log::{debug, trace};

use crate::{
    ast::{
        ast::{Block, Expr, Stmt, StmtKind},
        expressions::{BinaryOperator, LValue, Literal},
        statements::{FnDef, Qualifier, VarDecl},
        types::{Type, Width},
    },
    errors::errors::{Error, ErrorImpl},
    type_checker::{
        symbol_table::Storage,
        type_checker::{
            declare_function, declare_parameter, declare_variable, define_function,
            resolve_condition, resolve_eval, resolve_print, resolve_return, resolve_sweep,
        },
    },
    Span,
};

use super::{
    compiler::{Compiler, Function, ENTRY_LABEL},
    expr::{gen_expression, gen_lvalue_address, gen_lvalue_value, widen},
    frame_size::frame_size,
    postfix::{Instruction, SymbolKind},
};

fn fatal(error: ErrorImpl, span: &Span) -> Error {
    Error::new(error, span.start.clone())
}

/// Generates a statement that appears outside of any function.
///
/// Only declarations and function definitions are allowed here.
pub fn gen_top_level(compiler: &mut Compiler, stmt: &mut Stmt) -> Result<(), Error> {
    match &mut stmt.kind {
        StmtKind::VarDecl(decl) => gen_global(compiler, decl),
        StmtKind::FnDecl(decl) => declare_function(&mut compiler.checker(), decl),
        StmtKind::FnDef(def) => gen_function(compiler, def),
        _ => Err(fatal(ErrorImpl::StatementOutsideFunction, &stmt.span)),
    }
}

/// Generates a statement inside a function, recovering from errors that
/// are not fatal.
///
/// A rejected statement leaves no code behind and does not disturb the
/// scopes or loop labels of the statements around it.
pub fn gen_statement(compiler: &mut Compiler, stmt: &mut Stmt) -> Result<(), Error> {
    let mark = compiler.postfix.len();
    let depth = compiler.symbols.depth();
    let loops = (compiler.next_labels.len(), compiler.stop_labels.len());

    let result = gen_stmt(compiler, stmt);

    if result.is_err() {
        compiler.postfix.truncate(mark);
        while compiler.symbols.depth() > depth {
            compiler.symbols.pop();
        }
        compiler.next_labels.truncate(loops.0);
        compiler.stop_labels.truncate(loops.1);
    }

    compiler.recover(result)
}

fn gen_block(compiler: &mut Compiler, block: &mut Block) -> Result<(), Error> {
    compiler.symbols.push();

    let result = block
        .body
        .iter_mut()
        .try_for_each(|stmt| gen_statement(compiler, stmt));

    compiler.symbols.pop();
    result
}

fn gen_stmt(compiler: &mut Compiler, stmt: &mut Stmt) -> Result<(), Error> {
    trace!("statement at {}", stmt.span.start.0);

    match &mut stmt.kind {
        StmtKind::VarDecl(decl) => gen_local(compiler, decl),
        StmtKind::FnDecl(decl) => declare_function(&mut compiler.checker(), decl),
        StmtKind::FnDef(def) => Err(Error::new(
            ErrorImpl::NestedFunction {
                name: def.name.clone(),
            },
            def.span.start.clone(),
        )),
        StmtKind::Block(block) => gen_block(compiler, block),
        StmtKind::Eval(expr) => {
            let ty = resolve_eval(&mut compiler.checker(), expr)?;
            gen_expression(compiler, expr)?;
            if ty.size() > 0 {
                compiler.emit(Instruction::Trash(ty.size()));
            }
            Ok(())
        }
        StmtKind::Print { argument, newline } => {
            let newline = *newline;
            gen_print(compiler, argument, newline)
        }
        StmtKind::Return(value) => gen_return(compiler, value.as_mut(), stmt.span.clone()),
        StmtKind::Next => match compiler.next_labels.last().cloned() {
            Some(label) => {
                compiler.emit(Instruction::Jmp(label));
                Ok(())
            }
            None => Err(fatal(ErrorImpl::NextOutsideLoop, &stmt.span)),
        },
        StmtKind::Stop => match compiler.stop_labels.last().cloned() {
            Some(label) => {
                compiler.emit(Instruction::Jmp(label));
                Ok(())
            }
            None => Err(fatal(ErrorImpl::StopOutsideLoop, &stmt.span)),
        },
        StmtKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            resolve_condition(&mut compiler.checker(), condition)?;
            gen_expression(compiler, condition)?;

            let end = compiler.new_label();
            match else_branch {
                None => {
                    compiler.emit(Instruction::Jz(end.clone()));
                    gen_statement(compiler, then_branch)?;
                }
                Some(else_branch) => {
                    let otherwise = compiler.new_label();
                    compiler.emit(Instruction::Jz(otherwise.clone()));
                    gen_statement(compiler, then_branch)?;
                    compiler.emit(Instruction::Jmp(end.clone()));
                    compiler.emit(Instruction::Label(otherwise));
                    gen_statement(compiler, else_branch)?;
                }
            }
            compiler.emit(Instruction::Label(end));
            Ok(())
        }
        StmtKind::While { condition, body } => {
            resolve_condition(&mut compiler.checker(), condition)?;

            let test = compiler.new_label();
            let end = compiler.new_label();

            compiler.emit(Instruction::Label(test.clone()));
            gen_expression(compiler, condition)?;
            compiler.emit(Instruction::Jz(end.clone()));

            gen_loop_body(compiler, body, test.clone(), end.clone())?;

            compiler.emit(Instruction::Jmp(test));
            compiler.emit(Instruction::Label(end));
            Ok(())
        }
        StmtKind::Sweep {
            ascending,
            target,
            init,
            limit,
            step,
            body,
        } => {
            let ascending = *ascending;
            gen_sweep(compiler, ascending, target, init, limit, step, body)
        }
    }
}

fn gen_loop_body(
    compiler: &mut Compiler,
    body: &mut Stmt,
    next: String,
    stop: String,
) -> Result<(), Error> {
    compiler.next_labels.push(next);
    compiler.stop_labels.push(stop);

    let result = gen_statement(compiler, body);

    compiler.next_labels.pop();
    compiler.stop_labels.pop();
    result
}

/// `sweep lv = init to|downto limit step s body`
///
/// ```text
///     init, lv := init
/// test:
///     lv <= limit (>= when descending), JZ end
///     body
/// next:
///     lv := lv + s (- when descending)
///     JMP test
/// end:
/// ```
fn gen_sweep(
    compiler: &mut Compiler,
    ascending: bool,
    target: &mut LValue,
    init: &mut Expr,
    limit: &mut Expr,
    step: &mut Expr,
    body: &mut Stmt,
) -> Result<(), Error> {
    let ty = resolve_sweep(&mut compiler.checker(), target, init, limit, step)?;
    let width = ty.width();

    let limit_type = limit.ty.clone().unwrap_or(Type::Int);
    let compared = if ty == Type::Double || limit_type == Type::Double {
        Type::Double
    } else {
        Type::Int
    };

    let test = compiler.new_label();
    let next = compiler.new_label();
    let end = compiler.new_label();

    gen_expression(compiler, init)?;
    widen(compiler, init.ty.as_ref(), &ty);
    gen_lvalue_address(compiler, target)?;
    compiler.postfix.store(width);

    compiler.emit(Instruction::Label(test.clone()));
    gen_lvalue_value(compiler, target)?;
    widen(compiler, Some(&ty), &compared);
    gen_expression(compiler, limit)?;
    widen(compiler, Some(&limit_type), &compared);
    let operator = if ascending {
        BinaryOperator::LessEquals
    } else {
        BinaryOperator::GreaterEquals
    };
    compiler.postfix.compare(operator, compared.width());
    compiler.emit(Instruction::Jz(end.clone()));

    gen_loop_body(compiler, body, next.clone(), end.clone())?;

    compiler.emit(Instruction::Label(next));
    gen_lvalue_value(compiler, target)?;
    gen_expression(compiler, step)?;
    widen(compiler, step.ty.as_ref(), &ty);
    let operator = if ascending {
        BinaryOperator::Add
    } else {
        BinaryOperator::Subtract
    };
    compiler.postfix.arithmetic(operator, width);
    gen_lvalue_address(compiler, target)?;
    compiler.postfix.store(width);

    compiler.emit(Instruction::Jmp(test));
    compiler.emit(Instruction::Label(end));
    Ok(())
}

fn gen_print(compiler: &mut Compiler, argument: &mut Expr, newline: bool) -> Result<(), Error> {
    let ty = resolve_print(&mut compiler.checker(), argument)?;

    let routine = match ty {
        Type::Int => "printi",
        Type::Double => "printd",
        Type::String => "prints",
        _ => {
            return Err(Error::new(
                ErrorImpl::UnprintableType {
                    type_: ty.to_string(),
                },
                argument.span.start.clone(),
            ))
        }
    };

    gen_expression(compiler, argument)?;
    compiler.emit(Instruction::Call(routine.to_string()));
    compiler.emit(Instruction::Trash(ty.size()));

    if newline {
        compiler.emit(Instruction::Call(String::from("println")));
    }

    Ok(())
}

fn gen_return(
    compiler: &mut Compiler,
    value: Option<&mut Expr>,
    span: Span,
) -> Result<(), Error> {
    let Some(function) = compiler.function.clone() else {
        return Err(Error::new(ErrorImpl::StatementOutsideFunction, span.start));
    };

    match value {
        Some(value) => {
            resolve_return(&mut compiler.checker(), Some(&mut *value), &span)?;
            gen_expression(compiler, value)?;
            widen(compiler, value.ty.as_ref(), &function.return_type);
            compiler.emit(Instruction::Local(-(function.return_type.size() as i32)));
            compiler.postfix.store(function.return_type.width());
        }
        None => resolve_return(&mut compiler.checker(), None, &span)?,
    }

    compiler.emit(Instruction::Jmp(function.end_label));
    Ok(())
}

fn gen_local(compiler: &mut Compiler, decl: &mut VarDecl) -> Result<(), Error> {
    let offset = compiler.offset - decl.ty.size() as i32;
    declare_variable(&mut compiler.checker(), decl, Storage::Local(offset))?;
    compiler.offset = offset;

    if let Some(initializer) = &mut decl.initializer {
        gen_expression(compiler, initializer)?;
        widen(compiler, initializer.ty.as_ref(), &decl.ty);
        compiler.emit(Instruction::Local(offset));
        compiler.postfix.store(decl.ty.width());
    }

    Ok(())
}

/// Emits a global into DATA when it has a literal initializer, or BSS
/// otherwise. Imported globals only enter the symbol table.
fn gen_global(compiler: &mut Compiler, decl: &mut VarDecl) -> Result<(), Error> {
    declare_variable(&mut compiler.checker(), decl, Storage::Global)?;

    if decl.qualifier == Qualifier::Import {
        return Ok(());
    }

    let literal = match &decl.initializer {
        None => None,
        Some(initializer) => match initializer.as_literal() {
            Some(literal) => Some(literal),
            None => {
                return Err(Error::new(
                    ErrorImpl::GlobalInitializerNotLiteral {
                        name: decl.name.clone(),
                    },
                    initializer.span.start.clone(),
                ))
            }
        },
    };

    let item = match literal {
        None => None,
        Some(Literal::Int(value)) if decl.ty == Type::Double => {
            Some(Instruction::SDouble(value as f64))
        }
        Some(Literal::Int(value)) => Some(Instruction::SInt(value)),
        Some(Literal::Double(value)) => Some(Instruction::SDouble(value)),
        Some(Literal::Str(value)) => {
            let label = compiler.new_label();
            compiler.emit(Instruction::Rodata);
            compiler.emit(Instruction::Align);
            compiler.emit(Instruction::Label(label.clone()));
            compiler.emit(Instruction::SString(value));
            Some(Instruction::SId(label))
        }
    };

    compiler.emit(if item.is_some() {
        Instruction::Data
    } else {
        Instruction::Bss
    });
    compiler.emit(Instruction::Align);
    if decl.qualifier == Qualifier::Export {
        compiler.emit(Instruction::Global(decl.name.clone(), SymbolKind::Object));
    }
    compiler.emit(Instruction::Label(decl.name.clone()));
    compiler.emit(item.unwrap_or(Instruction::SAlloc(decl.ty.size())));

    compiler.defined.insert(decl.name.clone());
    Ok(())
}

/// Generates a function definition.
///
/// ```text
///     TEXT ALIGN [GLOBAL name] LABEL name ENTER frame
///     return slot := literal or zero
///     body
/// end:
///     return slot -> result register
///     LEAVE RET
/// ```
fn gen_function(compiler: &mut Compiler, def: &mut FnDef) -> Result<(), Error> {
    let parameters = define_function(&mut compiler.checker(), def)?;

    let link_name = compiler.link_name(&def.name);
    let frame = frame_size(def);
    let end_label = compiler.new_label();

    debug!(
        "function {} as {}: {} bytes of frame",
        def.name, link_name, frame
    );

    compiler.emit(Instruction::Text);
    compiler.emit(Instruction::Align);
    if def.qualifier == Qualifier::Export || link_name == ENTRY_LABEL {
        compiler.emit(Instruction::Global(link_name.clone(), SymbolKind::Function));
    }
    compiler.emit(Instruction::Label(link_name.clone()));
    compiler.emit(Instruction::Enter(frame));

    compiler.function = Some(Function {
        name: def.name.clone(),
        return_type: def.return_type.clone(),
        end_label,
    });
    compiler.offset = -(def.return_type.size() as i32);
    compiler.symbols.push();

    let result = gen_function_body(compiler, def, parameters, link_name == ENTRY_LABEL);

    compiler.symbols.pop();
    compiler.function = None;
    compiler.offset = 0;

    // A rejected body is truncated away, so callers must see it as external.
    if result.is_ok() {
        compiler.defined.insert(link_name);
    }
    result
}

fn gen_function_body(
    compiler: &mut Compiler,
    def: &mut FnDef,
    parameters: Vec<Type>,
    is_entry: bool,
) -> Result<(), Error> {
    let mut offset = 8;
    for (parameter, ty) in def.parameters.iter().zip(parameters) {
        let size = ty.size() as i32;
        declare_parameter(&mut compiler.checker(), parameter, ty, offset)?;
        offset += size;
    }

    let return_type = def.return_type.clone();
    let slot = -(return_type.size() as i32);

    if return_type != Type::Void {
        match &mut def.literal {
            Some(literal) => {
                gen_expression(compiler, literal)?;
                widen(compiler, literal.ty.as_ref(), &return_type);
            }
            None => {
                compiler.emit(Instruction::Int(0));
                widen(compiler, Some(&Type::Int), &return_type);
            }
        }
        compiler.emit(Instruction::Local(slot));
        compiler.postfix.store(return_type.width());
    }

    for stmt in def.body.body.iter_mut() {
        gen_statement(compiler, stmt)?;
    }

    let end_label = compiler
        .function
        .as_ref()
        .map(|function| function.end_label.clone())
        .unwrap_or_default();
    compiler.emit(Instruction::Label(end_label));

    if return_type != Type::Void {
        compiler.emit(Instruction::Local(slot));
        compiler.postfix.load(return_type.width());
        compiler.postfix.pop_result(return_type.width());
    }

    // The entry point always leaves an int exit status behind.
    if is_entry && (return_type.width() == Width::Double || return_type == Type::Void) {
        compiler.emit(Instruction::Int(0));
        compiler.postfix.pop_result(Width::Word);
    }

    compiler.emit(Instruction::Leave);
    compiler.emit(Instruction::Ret);
    Ok(())
}
