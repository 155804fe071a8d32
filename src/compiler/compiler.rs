//! Main compiler module.
//!
//! This module holds the generator context threaded through code generation
//! and the entry point that turns a parsed unit into a `Postfix` stream. It
//! owns label allocation, the frame offset cursor, the loop label stacks and
//! the sets of defined and referenced names used to emit `EXTERN`s.

use std::collections::BTreeSet;

use log::{debug, warn};

use crate::{
    ast::{ast::Block, types::Type},
    errors::errors::Error,
    type_checker::{
        symbol_table::{Symbol, SymbolTable},
        type_checker::TypeChecker,
    },
};

use super::{
    postfix::{Instruction, Postfix},
    stmt::gen_top_level,
};

/// Routines provided by the runtime, always declared external.
pub const RUNTIME_ROUTINES: [&str; 8] = [
    "readi", "readd", "printi", "printd", "prints", "println", "argv", "envp",
];

/// Link name of the entry point.
pub const ENTRY_LABEL: &str = "_main";

#[derive(Debug, Clone, PartialEq)]
pub struct CompileOptions {
    /// Source name of the function emitted as the entry point.
    pub entry_point: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            entry_point: String::from("main"),
        }
    }
}

/// The output of a compilation that did not hit a fatal error.
///
/// A non-empty `diagnostics` means some statements were rejected and left
/// out of `postfix`; such a stream should not be run.
#[derive(Debug)]
pub struct Compilation {
    pub postfix: Postfix,
    pub diagnostics: Vec<Error>,
}

/// The function whose body is being generated.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub return_type: Type,
    /// Label of the shared epilogue every `return` jumps to.
    pub end_label: String,
}

pub struct Compiler<'a> {
    pub options: &'a CompileOptions,
    pub postfix: Postfix,
    pub symbols: SymbolTable<Symbol>,
    pub diagnostics: Vec<Error>,

    label_count: usize,
    /// Set while inside a function body.
    pub function: Option<Function>,
    /// Offset of the lowest allocated local, relative to the frame pointer.
    pub offset: i32,

    pub next_labels: Vec<String>,
    pub stop_labels: Vec<String>,

    /// Link names of functions and globals emitted by this unit.
    pub defined: BTreeSet<String>,
    /// Link names used by this unit that may live elsewhere.
    pub referenced: BTreeSet<String>,
}

impl<'a> Compiler<'a> {
    pub fn new(options: &'a CompileOptions) -> Self {
        Compiler {
            options,
            postfix: Postfix::new(),
            symbols: SymbolTable::new(),
            diagnostics: Vec::new(),
            label_count: 0,
            function: None,
            offset: 0,
            next_labels: Vec::new(),
            stop_labels: Vec::new(),
            defined: BTreeSet::new(),
            referenced: BTreeSet::new(),
        }
    }

    /// A resolver view over the current scopes and return type.
    pub fn checker(&mut self) -> TypeChecker<'_> {
        TypeChecker::new(
            &mut self.symbols,
            self.function.as_ref().map(|function| &function.return_type),
        )
    }

    pub fn new_label(&mut self) -> String {
        self.label_count += 1;
        format!("_L{}", self.label_count)
    }

    pub fn in_function(&self) -> bool {
        self.function.is_some()
    }

    /// The name a function is emitted under. The entry point becomes
    /// `_main`, so a user function literally named `_main` is moved aside.
    pub fn link_name(&self, name: &str) -> String {
        if name == self.options.entry_point {
            String::from(ENTRY_LABEL)
        } else if name == ENTRY_LABEL {
            format!(".{}", ENTRY_LABEL)
        } else {
            name.to_string()
        }
    }

    pub fn emit(&mut self, instruction: Instruction) {
        self.postfix.emit(instruction);
    }

    /// Sorts out the result of one statement.
    ///
    /// Fatal errors are passed up. Anything else is recorded as a diagnostic
    /// and generation carries on with the next statement.
    pub fn recover(&mut self, result: Result<(), Error>) -> Result<(), Error> {
        match result {
            Ok(()) => Ok(()),
            Err(error) if error.is_fatal() => Err(error),
            Err(error) => {
                warn!("{}", error);
                self.diagnostics.push(error);
                Ok(())
            }
        }
    }

    fn gen_externs(&mut self) {
        let mut externs: Vec<String> = self
            .referenced
            .difference(&self.defined)
            .cloned()
            .collect();

        for routine in RUNTIME_ROUTINES {
            if !externs.iter().any(|name| name == routine) {
                externs.push(routine.to_string());
            }
        }

        for name in externs {
            self.emit(Instruction::Extern(name));
        }
    }
}

/// Generates code for a whole unit.
///
/// # Arguments
///
/// * `program` - The parsed unit. The resolver writes types into it.
/// * `options` - Compilation settings.
///
/// # Returns
///
/// The instruction stream with its diagnostics, or the first fatal error.
pub fn compile(program: &mut Block, options: &CompileOptions) -> Result<Compilation, Error> {
    let mut compiler = Compiler::new(options);

    debug!("generating code for {} top-level statements", program.body.len());

    for stmt in program.body.iter_mut() {
        let mark = compiler.postfix.len();
        let result = gen_top_level(&mut compiler, stmt);
        if result.is_err() {
            compiler.postfix.truncate(mark);
        }
        compiler.recover(result)?;
    }

    compiler.gen_externs();

    debug!(
        "generated {} instructions, {} diagnostics",
        compiler.postfix.len(),
        compiler.diagnostics.len()
    );

    Ok(Compilation {
        postfix: compiler.postfix,
        diagnostics: compiler.diagnostics,
    })
}
