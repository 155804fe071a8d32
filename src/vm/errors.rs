use thiserror::Error;

/// Failures while assembling or running a program.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VmError {
    #[error("undefined symbol {name:?}")]
    UndefinedSymbol { name: String },
    #[error("symbol {name:?} defined more than once")]
    DuplicateSymbol { name: String },
    #[error("division by zero at instruction {pc}")]
    DivisionByZero { pc: usize },
    #[error("invalid memory access at address {address}")]
    InvalidAddress { address: i64 },
    #[error("stack overflow")]
    StackOverflow,
    #[error("end of input reached while reading")]
    InputExhausted,
    #[error("cannot read {token:?} as a number")]
    InvalidInput { token: String },
    #[error("step limit of {steps} exceeded")]
    StepLimitExceeded { steps: u64 },
}

impl VmError {
    pub fn get_error_name(&self) -> &str {
        match self {
            VmError::UndefinedSymbol { .. } => "UndefinedSymbol",
            VmError::DuplicateSymbol { .. } => "DuplicateSymbol",
            VmError::DivisionByZero { .. } => "DivisionByZero",
            VmError::InvalidAddress { .. } => "InvalidAddress",
            VmError::StackOverflow => "StackOverflow",
            VmError::InputExhausted => "InputExhausted",
            VmError::InvalidInput { .. } => "InvalidInput",
            VmError::StepLimitExceeded { .. } => "StepLimitExceeded",
        }
    }
}
