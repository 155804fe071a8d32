//! The stack machine.
//!
//! Memory is one byte array. Static data sits at the bottom, followed by
//! copies of the process arguments and environment; the stack grows down
//! from the top. Words are 4-byte little-endian ints, doubles take 8 bytes.
//!
//! Frame layout after `CALL f` and `ENTER n`:
//!
//! ```text
//! fp + 8 ..   arguments, first one lowest
//! fp + 4      return address
//! fp + 0      caller's frame pointer
//! fp - n ..   locals
//! ```

use log::{debug, trace};

use crate::compiler::{compiler::ENTRY_LABEL, postfix::Instruction};

use super::{errors::VmError, image::Image, image::NULL_PAGE};

/// Return address that ends the program when popped.
const HALT: u32 = u32::MAX;

#[derive(Debug, Clone, PartialEq)]
pub struct MachineOptions {
    /// Total memory in bytes.
    pub memory_size: u32,
    /// Strings returned by `argv`.
    pub args: Vec<String>,
    /// Strings returned by `envp`.
    pub env: Vec<String>,
    /// Text consumed by `readi` and `readd`, one whitespace-separated token
    /// per read.
    pub input: String,
    pub max_steps: Option<u64>,
}

impl Default for MachineOptions {
    fn default() -> Self {
        MachineOptions {
            memory_size: 1 << 20,
            args: Vec::new(),
            env: Vec::new(),
            input: String::new(),
            max_steps: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    /// The int left in the result register by the entry point.
    pub exit_code: i32,
    pub output: String,
}

pub struct Machine<'a> {
    image: &'a Image,
    pub(super) memory: Vec<u8>,
    pub(super) sp: u32,
    fp: u32,
    pc: usize,
    /// Lowest address the stack may reach.
    limit: u32,
    pub(super) int_result: i32,
    pub(super) double_result: f64,
    pub(super) input: Vec<String>,
    pub(super) input_position: usize,
    pub(super) args: Vec<u32>,
    pub(super) env: Vec<u32>,
    pub(super) output: String,
    steps: u64,
    max_steps: Option<u64>,
}

impl<'a> Machine<'a> {
    pub fn new(image: &'a Image, options: &MachineOptions) -> Result<Self, VmError> {
        let mut memory = image.memory.clone();

        let mut place = |strings: &[String]| {
            strings
                .iter()
                .map(|string| {
                    let address = memory.len() as u32;
                    memory.extend(string.as_bytes());
                    memory.push(0);
                    address
                })
                .collect::<Vec<u32>>()
        };
        let args = place(&options.args);
        let env = place(&options.env);

        let limit = memory.len() as u32;
        if limit >= options.memory_size {
            return Err(VmError::StackOverflow);
        }
        memory.resize(options.memory_size as usize, 0);

        Ok(Machine {
            image,
            memory,
            sp: options.memory_size,
            fp: options.memory_size,
            pc: 0,
            limit,
            int_result: 0,
            double_result: 0.0,
            input: options
                .input
                .split_whitespace()
                .map(str::to_string)
                .collect(),
            input_position: 0,
            args,
            env,
            output: String::new(),
            steps: 0,
            max_steps: options.max_steps,
        })
    }

    fn check(&self, address: u32, size: u32) -> Result<usize, VmError> {
        let end = address as u64 + size as u64;
        if address < NULL_PAGE || end > self.memory.len() as u64 {
            return Err(VmError::InvalidAddress {
                address: address as i64,
            });
        }
        Ok(address as usize)
    }

    pub(super) fn read_word(&self, address: u32) -> Result<i32, VmError> {
        let at = self.check(address, 4)?;
        let mut bytes = [0; 4];
        bytes.copy_from_slice(&self.memory[at..at + 4]);
        Ok(i32::from_le_bytes(bytes))
    }

    fn write_word(&mut self, address: u32, value: i32) -> Result<(), VmError> {
        let at = self.check(address, 4)?;
        self.memory[at..at + 4].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    pub(super) fn read_double(&self, address: u32) -> Result<f64, VmError> {
        let at = self.check(address, 8)?;
        let mut bytes = [0; 8];
        bytes.copy_from_slice(&self.memory[at..at + 8]);
        Ok(f64::from_le_bytes(bytes))
    }

    fn write_double(&mut self, address: u32, value: f64) -> Result<(), VmError> {
        let at = self.check(address, 8)?;
        self.memory[at..at + 8].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// Moves the stack pointer down by `bytes`.
    fn grow(&mut self, bytes: u32) -> Result<(), VmError> {
        match self.sp.checked_sub(bytes) {
            Some(sp) if sp >= self.limit => {
                self.sp = sp;
                Ok(())
            }
            _ => Err(VmError::StackOverflow),
        }
    }

    fn shrink(&mut self, bytes: u32) -> Result<(), VmError> {
        match self.sp.checked_add(bytes) {
            Some(sp) if sp as usize <= self.memory.len() => {
                self.sp = sp;
                Ok(())
            }
            _ => Err(VmError::InvalidAddress {
                address: self.sp as i64 + bytes as i64,
            }),
        }
    }

    fn push(&mut self, value: i32) -> Result<(), VmError> {
        self.grow(4)?;
        self.write_word(self.sp, value)
    }

    fn pop(&mut self) -> Result<i32, VmError> {
        let value = self.read_word(self.sp)?;
        self.shrink(4)?;
        Ok(value)
    }

    fn push_double(&mut self, value: f64) -> Result<(), VmError> {
        self.grow(8)?;
        self.write_double(self.sp, value)
    }

    fn pop_double(&mut self) -> Result<f64, VmError> {
        let value = self.read_double(self.sp)?;
        self.shrink(8)?;
        Ok(value)
    }

    fn jump(&mut self, label: &str) -> Result<(), VmError> {
        match self.image.code_labels.get(label) {
            Some(target) => {
                self.pc = *target;
                Ok(())
            }
            None => Err(VmError::UndefinedSymbol {
                name: label.to_string(),
            }),
        }
    }

    fn int_operation(&mut self, operation: impl Fn(i32, i32) -> i32) -> Result<(), VmError> {
        let right = self.pop()?;
        let left = self.pop()?;
        self.push(operation(left, right))
    }

    fn double_operation(&mut self, operation: impl Fn(f64, f64) -> f64) -> Result<(), VmError> {
        let right = self.pop_double()?;
        let left = self.pop_double()?;
        self.push_double(operation(left, right))
    }

    fn divide(&mut self, remainder: bool) -> Result<(), VmError> {
        let right = self.pop()?;
        let left = self.pop()?;
        if right == 0 {
            return Err(VmError::DivisionByZero { pc: self.pc - 1 });
        }
        self.push(if remainder {
            left.wrapping_rem(right)
        } else {
            left.wrapping_div(right)
        })
    }

    fn compare(&mut self, test: impl Fn(i32, i32) -> bool) -> Result<(), VmError> {
        let right = self.pop()?;
        let left = self.pop()?;
        self.push(test(left, right) as i32)
    }

    /// Runs from the entry point until it returns.
    pub fn run(&mut self) -> Result<Execution, VmError> {
        let image = self.image;

        self.push(HALT as i32)?;
        self.jump(ENTRY_LABEL)?;

        loop {
            self.steps += 1;
            if let Some(max_steps) = self.max_steps {
                if self.steps > max_steps {
                    return Err(VmError::StepLimitExceeded { steps: max_steps });
                }
            }

            let Some(instruction) = image.code.get(self.pc) else {
                return Err(VmError::InvalidAddress {
                    address: self.pc as i64,
                });
            };
            self.pc += 1;

            trace!("{:>6} sp={} {}", self.pc - 1, self.sp, instruction);

            match instruction {
                Instruction::Int(value) => self.push(*value)?,
                Instruction::Addr(label) => {
                    let Some(address) = image.data_labels.get(label) else {
                        return Err(VmError::UndefinedSymbol {
                            name: label.clone(),
                        });
                    };
                    self.push(*address as i32)?;
                }
                Instruction::Local(offset) => self.push(self.fp.wrapping_add_signed(*offset) as i32)?,
                Instruction::Load => {
                    let address = self.pop()? as u32;
                    let value = self.read_word(address)?;
                    self.push(value)?;
                }
                Instruction::DLoad => {
                    let address = self.pop()? as u32;
                    let value = self.read_double(address)?;
                    self.push_double(value)?;
                }
                Instruction::Store => {
                    let address = self.pop()? as u32;
                    let value = self.pop()?;
                    self.write_word(address, value)?;
                }
                Instruction::DStore => {
                    let address = self.pop()? as u32;
                    let value = self.pop_double()?;
                    self.write_double(address, value)?;
                }
                Instruction::Dup => {
                    let value = self.read_word(self.sp)?;
                    self.push(value)?;
                }
                Instruction::DDup => {
                    let value = self.read_double(self.sp)?;
                    self.push_double(value)?;
                }
                Instruction::Trash(bytes) => self.shrink(*bytes)?,
                Instruction::Alloc => {
                    let bytes = self.pop()?;
                    if bytes < 0 {
                        return Err(VmError::InvalidAddress {
                            address: bytes as i64,
                        });
                    }
                    self.grow(bytes as u32)?;
                }
                Instruction::Sp => self.push(self.sp as i32)?,

                Instruction::Add => self.int_operation(i32::wrapping_add)?,
                Instruction::Sub => self.int_operation(i32::wrapping_sub)?,
                Instruction::Mul => self.int_operation(i32::wrapping_mul)?,
                Instruction::Div => self.divide(false)?,
                Instruction::Mod => self.divide(true)?,
                Instruction::Neg => {
                    let value = self.pop()?;
                    self.push(value.wrapping_neg())?;
                }
                Instruction::DAdd => self.double_operation(|a, b| a + b)?,
                Instruction::DSub => self.double_operation(|a, b| a - b)?,
                Instruction::DMul => self.double_operation(|a, b| a * b)?,
                Instruction::DDiv => self.double_operation(|a, b| a / b)?,
                Instruction::DNeg => {
                    let value = self.pop_double()?;
                    self.push_double(-value)?;
                }
                Instruction::I2D => {
                    let value = self.pop()?;
                    self.push_double(value as f64)?;
                }
                Instruction::D2I => {
                    let value = self.pop_double()?;
                    self.push(value as i32)?;
                }

                Instruction::Eq => self.compare(|a, b| a == b)?,
                Instruction::Ne => self.compare(|a, b| a != b)?,
                Instruction::Lt => self.compare(|a, b| a < b)?,
                Instruction::Le => self.compare(|a, b| a <= b)?,
                Instruction::Gt => self.compare(|a, b| a > b)?,
                Instruction::Ge => self.compare(|a, b| a >= b)?,
                Instruction::DCmp => {
                    let right = self.pop_double()?;
                    let left = self.pop_double()?;
                    let order = match left.partial_cmp(&right) {
                        Some(std::cmp::Ordering::Less) => -1,
                        Some(std::cmp::Ordering::Greater) => 1,
                        _ => 0,
                    };
                    self.push(order)?;
                }

                Instruction::Jmp(label) => self.jump(label)?,
                Instruction::Jz(label) => {
                    if self.pop()? == 0 {
                        self.jump(label)?;
                    }
                }
                Instruction::Jnz(label) => {
                    if self.pop()? != 0 {
                        self.jump(label)?;
                    }
                }
                Instruction::Call(name) => {
                    if image.code_labels.contains_key(name) {
                        self.push(self.pc as i32)?;
                        self.jump(name)?;
                    } else {
                        self.call_routine(name)?;
                    }
                }
                Instruction::Enter(bytes) => {
                    self.push(self.fp as i32)?;
                    self.fp = self.sp;
                    self.grow(*bytes)?;
                }
                Instruction::Leave => {
                    self.sp = self.fp;
                    self.fp = self.pop()? as u32;
                }
                Instruction::Ret => {
                    let address = self.pop()? as u32;
                    if address == HALT {
                        break;
                    }
                    self.pc = address as usize;
                }

                Instruction::Push => self.push(self.int_result)?,
                Instruction::DPush => self.push_double(self.double_result)?,
                Instruction::Pop => self.int_result = self.pop()?,
                Instruction::DPop => self.double_result = self.pop_double()?,

                // Directives and data never reach the code array.
                _ => {}
            }
        }

        debug!("program finished after {} steps", self.steps);

        Ok(Execution {
            exit_code: self.int_result,
            output: std::mem::take(&mut self.output),
        })
    }
}
