//! The stack-machine instruction stream.
//!
//! `Instruction` is the closed set of operations the generator can emit and
//! the virtual machine can execute. `Postfix` is the buffer the generator
//! appends to; it also owns the choice between the single-word and
//! double-word flavour of every value-moving operation, so callers only pass
//! a `Width`.

use std::fmt::Display;

use crate::ast::{expressions::BinaryOperator, types::Width};

/// What a `GLOBAL` directive announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Function,
    Object,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    // Sections and symbols
    Text,
    Data,
    Rodata,
    Bss,
    Align,
    Label(String),
    Global(String, SymbolKind),
    Extern(String),

    // Data items
    SInt(i32),
    SDouble(f64),
    SString(String),
    SId(String),
    SAlloc(u32),

    // Values and memory
    Int(i32),
    Addr(String),
    Local(i32),
    Load,
    DLoad,
    Store,
    DStore,
    Dup,
    DDup,
    Trash(u32),
    Alloc,
    Sp,

    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Neg,
    DAdd,
    DSub,
    DMul,
    DDiv,
    DNeg,
    I2D,
    D2I,

    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// Pops two doubles and pushes -1, 0 or 1.
    DCmp,

    // Control
    Jmp(String),
    Jz(String),
    Jnz(String),
    Call(String),
    Enter(u32),
    Leave,
    Ret,

    // Result registers
    Push,
    DPush,
    Pop,
    DPop,
}

impl Instruction {
    pub fn is_directive(&self) -> bool {
        matches!(
            self,
            Instruction::Text
                | Instruction::Data
                | Instruction::Rodata
                | Instruction::Bss
                | Instruction::Align
                | Instruction::Global(..)
                | Instruction::Extern(_)
        )
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Instruction::Text => write!(f, "TEXT"),
            Instruction::Data => write!(f, "DATA"),
            Instruction::Rodata => write!(f, "RODATA"),
            Instruction::Bss => write!(f, "BSS"),
            Instruction::Align => write!(f, "ALIGN"),
            Instruction::Label(label) => write!(f, "LABEL {}", label),
            Instruction::Global(name, SymbolKind::Function) => write!(f, "GLOBAL {}, FUNC", name),
            Instruction::Global(name, SymbolKind::Object) => write!(f, "GLOBAL {}, OBJ", name),
            Instruction::Extern(name) => write!(f, "EXTERN {}", name),
            Instruction::SInt(value) => write!(f, "SINT {}", value),
            Instruction::SDouble(value) => write!(f, "SDOUBLE {:?}", value),
            Instruction::SString(value) => write!(f, "SSTRING {:?}", value),
            Instruction::SId(label) => write!(f, "SID {}", label),
            Instruction::SAlloc(size) => write!(f, "SALLOC {}", size),
            Instruction::Int(value) => write!(f, "INT {}", value),
            Instruction::Addr(label) => write!(f, "ADDR {}", label),
            Instruction::Local(offset) => write!(f, "LOCAL {}", offset),
            Instruction::Load => write!(f, "LOAD"),
            Instruction::DLoad => write!(f, "DLOAD"),
            Instruction::Store => write!(f, "STORE"),
            Instruction::DStore => write!(f, "DSTORE"),
            Instruction::Dup => write!(f, "DUP"),
            Instruction::DDup => write!(f, "DDUP"),
            Instruction::Trash(bytes) => write!(f, "TRASH {}", bytes),
            Instruction::Alloc => write!(f, "ALLOC"),
            Instruction::Sp => write!(f, "SP"),
            Instruction::Add => write!(f, "ADD"),
            Instruction::Sub => write!(f, "SUB"),
            Instruction::Mul => write!(f, "MUL"),
            Instruction::Div => write!(f, "DIV"),
            Instruction::Mod => write!(f, "MOD"),
            Instruction::Neg => write!(f, "NEG"),
            Instruction::DAdd => write!(f, "DADD"),
            Instruction::DSub => write!(f, "DSUB"),
            Instruction::DMul => write!(f, "DMUL"),
            Instruction::DDiv => write!(f, "DDIV"),
            Instruction::DNeg => write!(f, "DNEG"),
            Instruction::I2D => write!(f, "I2D"),
            Instruction::D2I => write!(f, "D2I"),
            Instruction::Eq => write!(f, "EQ"),
            Instruction::Ne => write!(f, "NE"),
            Instruction::Lt => write!(f, "LT"),
            Instruction::Le => write!(f, "LE"),
            Instruction::Gt => write!(f, "GT"),
            Instruction::Ge => write!(f, "GE"),
            Instruction::DCmp => write!(f, "DCMP"),
            Instruction::Jmp(label) => write!(f, "JMP {}", label),
            Instruction::Jz(label) => write!(f, "JZ {}", label),
            Instruction::Jnz(label) => write!(f, "JNZ {}", label),
            Instruction::Call(name) => write!(f, "CALL {}", name),
            Instruction::Enter(bytes) => write!(f, "ENTER {}", bytes),
            Instruction::Leave => write!(f, "LEAVE"),
            Instruction::Ret => write!(f, "RET"),
            Instruction::Push => write!(f, "PUSH"),
            Instruction::DPush => write!(f, "DPUSH"),
            Instruction::Pop => write!(f, "POP"),
            Instruction::DPop => write!(f, "DPOP"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Postfix {
    instructions: Vec<Instruction>,
}

impl Postfix {
    pub fn new() -> Self {
        Postfix::default()
    }

    pub fn emit(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Drops everything emitted after `len`, used to discard a statement
    /// that failed half way through.
    pub fn truncate(&mut self, len: usize) {
        self.instructions.truncate(len);
    }

    pub fn load(&mut self, width: Width) {
        self.emit(match width {
            Width::Word => Instruction::Load,
            Width::Double => Instruction::DLoad,
        });
    }

    pub fn store(&mut self, width: Width) {
        self.emit(match width {
            Width::Word => Instruction::Store,
            Width::Double => Instruction::DStore,
        });
    }

    pub fn dup(&mut self, width: Width) {
        self.emit(match width {
            Width::Word => Instruction::Dup,
            Width::Double => Instruction::DDup,
        });
    }

    /// Pushes a function result from its register onto the stack.
    pub fn push_result(&mut self, width: Width) {
        self.emit(match width {
            Width::Word => Instruction::Push,
            Width::Double => Instruction::DPush,
        });
    }

    /// Moves the top of the stack into the result register.
    pub fn pop_result(&mut self, width: Width) {
        self.emit(match width {
            Width::Word => Instruction::Pop,
            Width::Double => Instruction::DPop,
        });
    }

    pub fn negate(&mut self, width: Width) {
        self.emit(match width {
            Width::Word => Instruction::Neg,
            Width::Double => Instruction::DNeg,
        });
    }

    /// Emits an arithmetic operator on two operands of the same width.
    ///
    /// Modulo only exists for words and the logical operators are emitted
    /// as jumps by the generator, so those map to nothing here.
    pub fn arithmetic(&mut self, operator: BinaryOperator, width: Width) {
        let instruction = match (operator, width) {
            (BinaryOperator::Add, Width::Word) => Instruction::Add,
            (BinaryOperator::Subtract, Width::Word) => Instruction::Sub,
            (BinaryOperator::Multiply, Width::Word) => Instruction::Mul,
            (BinaryOperator::Divide, Width::Word) => Instruction::Div,
            (BinaryOperator::Modulo, _) => Instruction::Mod,
            (BinaryOperator::Add, Width::Double) => Instruction::DAdd,
            (BinaryOperator::Subtract, Width::Double) => Instruction::DSub,
            (BinaryOperator::Multiply, Width::Double) => Instruction::DMul,
            (BinaryOperator::Divide, Width::Double) => Instruction::DDiv,
            _ => return,
        };

        self.emit(instruction);
    }

    /// Emits a comparison. Doubles are first reduced to an int with `DCMP`
    /// and then compared against zero.
    pub fn compare(&mut self, operator: BinaryOperator, width: Width) {
        if width == Width::Double {
            self.emit(Instruction::DCmp);
            self.emit(Instruction::Int(0));
        }

        let instruction = match operator {
            BinaryOperator::Equals => Instruction::Eq,
            BinaryOperator::NotEquals => Instruction::Ne,
            BinaryOperator::Less => Instruction::Lt,
            BinaryOperator::LessEquals => Instruction::Le,
            BinaryOperator::Greater => Instruction::Gt,
            BinaryOperator::GreaterEquals => Instruction::Ge,
            _ => return,
        };

        self.emit(instruction);
    }
}

impl Display for Postfix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for instruction in &self.instructions {
            match instruction {
                Instruction::Label(label) => writeln!(f, "{}:", label)?,
                other if other.is_directive() => writeln!(f, "\t{}", other)?,
                other => writeln!(f, "\t\t{}", other)?,
            }
        }

        Ok(())
    }
}
