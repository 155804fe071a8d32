//! A byte-addressed stack machine that runs generated code.
//!
//! `run` assembles a `Postfix` stream into an `Image` and executes it from
//! the entry point, collecting everything the program prints.

pub mod builtins;
pub mod errors;
pub mod image;
pub mod machine;

#[cfg(test)]
mod tests;

use crate::compiler::postfix::Postfix;

use self::{
    errors::VmError,
    image::Image,
    machine::{Execution, Machine, MachineOptions},
};

pub fn run(postfix: &Postfix, options: &MachineOptions) -> Result<Execution, VmError> {
    let image = Image::assemble(postfix)?;
    let mut machine = Machine::new(&image, options)?;
    machine.run()
}
