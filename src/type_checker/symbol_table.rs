use std::collections::HashMap;

use crate::ast::{statements::Qualifier, types::Type};

/// Where a variable lives at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    /// Offset from the frame pointer: positive for parameters, negative for locals.
    Local(i32),
    /// Addressed through a label named after the symbol.
    Global,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SymbolKind {
    Variable,
    Function { parameters: Vec<Type>, defined: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    /// The variable's type, or the function's return type.
    pub ty: Type,
    pub kind: SymbolKind,
    pub storage: Storage,
    pub qualifier: Qualifier,
}

impl Symbol {
    pub fn variable(name: &str, ty: Type, storage: Storage, qualifier: Qualifier) -> Self {
        Symbol {
            name: name.to_string(),
            ty,
            kind: SymbolKind::Variable,
            storage,
            qualifier,
        }
    }

    pub fn function(
        name: &str,
        return_type: Type,
        parameters: Vec<Type>,
        defined: bool,
        qualifier: Qualifier,
    ) -> Self {
        Symbol {
            name: name.to_string(),
            ty: return_type,
            kind: SymbolKind::Function {
                parameters,
                defined,
            },
            storage: Storage::Global,
            qualifier,
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, SymbolKind::Function { .. })
    }

    pub fn is_imported(&self) -> bool {
        self.qualifier == Qualifier::Import
    }
}

/// A stack of lexical scopes.
///
/// The outermost scope holds globals and is never popped. Lookups walk from
/// the innermost scope outwards; `find_local` only looks at the innermost one.
#[derive(Debug)]
pub struct SymbolTable<T> {
    scopes: Vec<HashMap<String, T>>,
}

impl<T> Default for SymbolTable<T> {
    fn default() -> Self {
        SymbolTable::new()
    }
}

impl<T> SymbolTable<T> {
    pub fn new() -> Self {
        SymbolTable {
            scopes: vec![HashMap::new()],
        }
    }

    pub fn push(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Number of active scopes, 1 when only the global scope is open.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Adds a symbol to the innermost scope.
    ///
    /// # Returns
    ///
    /// `false` (leaving the table untouched) if the name is already bound in
    /// that scope.
    pub fn insert(&mut self, name: &str, symbol: T) -> bool {
        let Some(scope) = self.scopes.last_mut() else {
            return false;
        };

        if scope.contains_key(name) {
            return false;
        }

        scope.insert(name.to_string(), symbol);
        true
    }

    pub fn find(&self, name: &str) -> Option<&T> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    pub fn find_local(&self, name: &str) -> Option<&T> {
        self.scopes.last().and_then(|scope| scope.get(name))
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut T> {
        self.scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.get_mut(name))
    }
}
