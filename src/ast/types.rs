//! Type model shared by the parser, the resolver and the code generator.
//!
//! Every type has a byte size: 4 for `int`, `string` (an address) and
//! pointers, 8 for `double`, and 0 for `void` and the deferred types.
//! Deferred types are placeholders carried by `read` and `alloc`
//! expressions until the expression that consumes them fixes a concrete type.

use std::fmt::Display;

/// The expression kinds whose type is decided by their consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredKind {
    Read,
    Alloc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Int,
    Double,
    String,
    Pointer(Box<Type>),
    Void,
    Deferred(DeferredKind),
}

/// The two stack shapes a value can take.
///
/// Every value-producing instruction comes in a single-word and a
/// double-word flavour; `Width` is how the generator picks between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    Word,
    Double,
}

impl Type {
    pub fn pointer_to(subtype: Type) -> Type {
        Type::Pointer(Box::new(subtype))
    }

    pub fn size(&self) -> u32 {
        match self {
            Type::Int | Type::String | Type::Pointer(_) => 4,
            Type::Double => 8,
            Type::Void | Type::Deferred(_) => 0,
        }
    }

    pub fn width(&self) -> Width {
        match self {
            Type::Double => Width::Double,
            _ => Width::Word,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int | Type::Double)
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Pointer(_))
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Type::Deferred(_))
    }

    pub fn is_read(&self) -> bool {
        matches!(self, Type::Deferred(DeferredKind::Read))
    }

    pub fn is_alloc(&self) -> bool {
        matches!(self, Type::Deferred(DeferredKind::Alloc))
    }

    pub fn subtype(&self) -> Option<&Type> {
        match self {
            Type::Pointer(subtype) => Some(subtype),
            _ => None,
        }
    }

    /// The innermost non-pointer type: `int` for `int[][]`.
    pub fn base(&self) -> &Type {
        match self {
            Type::Pointer(subtype) => subtype.base(),
            other => other,
        }
    }

    /// Size of the element a pointer points to, used to scale offsets.
    pub fn element_size(&self) -> u32 {
        self.subtype().map(Type::size).unwrap_or(1)
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Double => write!(f, "double"),
            Type::String => write!(f, "string"),
            Type::Pointer(subtype) => write!(f, "{}[]", subtype),
            Type::Void => write!(f, "void"),
            Type::Deferred(DeferredKind::Read) => write!(f, "<read>"),
            Type::Deferred(DeferredKind::Alloc) => write!(f, "<alloc>"),
        }
    }
}
