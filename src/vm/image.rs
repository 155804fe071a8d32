//! Assembler and linker.
//!
//! Splits an instruction stream into executable code and static data. Data
//! sections are laid out one after the other above a reserved null page, in
//! the order DATA, RODATA, BSS, each 8-byte aligned. Every symbolic
//! reference is checked here, so a program that assembles never jumps to or
//! loads from an unknown label.

use std::collections::HashMap;

use log::debug;

use crate::compiler::{
    compiler::RUNTIME_ROUTINES,
    postfix::{Instruction, Postfix},
};

use super::errors::VmError;

/// Addresses below this are never valid.
pub const NULL_PAGE: u32 = 16;

const ALIGNMENT: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Section {
    Text,
    Data,
    Rodata,
    Bss,
}

#[derive(Debug)]
enum Item {
    Label(String),
    Align,
    Bytes(Vec<u8>),
    Id(String),
    Zero(u32),
}

#[derive(Debug)]
pub struct Image {
    /// Executable instructions only, indexed by program counter.
    pub code: Vec<Instruction>,
    pub code_labels: HashMap<String, usize>,
    pub data_labels: HashMap<String, u32>,
    /// Initial contents of memory from address 0 to the end of BSS.
    pub memory: Vec<u8>,
}

fn align(address: u32) -> u32 {
    address.div_ceil(ALIGNMENT) * ALIGNMENT
}

pub fn is_runtime_routine(name: &str) -> bool {
    RUNTIME_ROUTINES.contains(&name)
}

impl Image {
    /// Builds an image from a stream.
    ///
    /// # Errors
    ///
    /// `DuplicateSymbol` when a label is placed twice, `UndefinedSymbol`
    /// when a jump, call, `ADDR` or `SID` names nothing.
    pub fn assemble(postfix: &Postfix) -> Result<Image, VmError> {
        let mut section = Section::Text;
        let mut code = Vec::new();
        let mut code_labels = HashMap::new();
        let mut sections: HashMap<Section, Vec<Item>> = HashMap::new();

        for instruction in postfix.instructions() {
            match instruction {
                Instruction::Text => section = Section::Text,
                Instruction::Data => section = Section::Data,
                Instruction::Rodata => section = Section::Rodata,
                Instruction::Bss => section = Section::Bss,
                Instruction::Global(..) | Instruction::Extern(_) => {}
                Instruction::Align if section == Section::Text => {}
                Instruction::Label(label) if section == Section::Text => {
                    if code_labels.insert(label.clone(), code.len()).is_some() {
                        return Err(VmError::DuplicateSymbol {
                            name: label.clone(),
                        });
                    }
                }
                Instruction::Align => sections.entry(section).or_default().push(Item::Align),
                Instruction::Label(label) => sections
                    .entry(section)
                    .or_default()
                    .push(Item::Label(label.clone())),
                Instruction::SInt(value) => sections
                    .entry(section)
                    .or_default()
                    .push(Item::Bytes(value.to_le_bytes().to_vec())),
                Instruction::SDouble(value) => sections
                    .entry(section)
                    .or_default()
                    .push(Item::Bytes(value.to_le_bytes().to_vec())),
                Instruction::SString(value) => {
                    let mut bytes = value.as_bytes().to_vec();
                    bytes.push(0);
                    sections.entry(section).or_default().push(Item::Bytes(bytes));
                }
                Instruction::SId(label) => sections
                    .entry(section)
                    .or_default()
                    .push(Item::Id(label.clone())),
                Instruction::SAlloc(size) => {
                    sections.entry(section).or_default().push(Item::Zero(*size))
                }
                other => code.push(other.clone()),
            }
        }

        let mut address = NULL_PAGE;
        let mut data_labels = HashMap::new();
        let mut memory = vec![0; NULL_PAGE as usize];
        let mut relocations = Vec::new();

        for section in [Section::Data, Section::Rodata, Section::Bss] {
            address = align(address);
            memory.resize(address as usize, 0);

            for item in sections.remove(&section).unwrap_or_default() {
                match item {
                    Item::Label(label) => {
                        if data_labels.insert(label.clone(), address).is_some() {
                            return Err(VmError::DuplicateSymbol { name: label });
                        }
                    }
                    Item::Align => {
                        address = align(address);
                        memory.resize(address as usize, 0);
                    }
                    Item::Bytes(bytes) => {
                        address += bytes.len() as u32;
                        memory.extend(bytes);
                    }
                    Item::Id(label) => {
                        relocations.push((address, label));
                        address += 4;
                        memory.extend([0; 4]);
                    }
                    Item::Zero(size) => {
                        address += size;
                        memory.resize(address as usize, 0);
                    }
                }
            }
        }

        for (at, label) in relocations {
            let Some(target) = data_labels.get(&label) else {
                return Err(VmError::UndefinedSymbol { name: label });
            };
            let at = at as usize;
            memory[at..at + 4].copy_from_slice(&target.to_le_bytes());
        }

        let image = Image {
            code,
            code_labels,
            data_labels,
            memory,
        };
        image.check_references()?;

        debug!(
            "assembled {} instructions and {} bytes of static data",
            image.code.len(),
            image.memory.len()
        );

        Ok(image)
    }

    fn check_references(&self) -> Result<(), VmError> {
        for instruction in &self.code {
            let (name, known) = match instruction {
                Instruction::Jmp(label) | Instruction::Jz(label) | Instruction::Jnz(label) => {
                    (label, self.code_labels.contains_key(label))
                }
                Instruction::Call(name) => (
                    name,
                    self.code_labels.contains_key(name) || is_runtime_routine(name),
                ),
                Instruction::Addr(label) => (label, self.data_labels.contains_key(label)),
                _ => continue,
            };

            if !known {
                return Err(VmError::UndefinedSymbol { name: name.clone() });
            }
        }

        Ok(())
    }

    /// End of static data, where the machine may place strings of its own.
    pub fn static_end(&self) -> u32 {
        self.memory.len() as u32
    }
}
