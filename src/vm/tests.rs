//! Unit tests for the assembler and the machine, on hand-written streams.

use super::{
    errors::VmError,
    image::{Image, NULL_PAGE},
    machine::MachineOptions,
    run,
};
use crate::compiler::postfix::{Instruction, Postfix};

fn stream(instructions: Vec<Instruction>) -> Postfix {
    let mut postfix = Postfix::new();
    for instruction in instructions {
        postfix.emit(instruction);
    }
    postfix
}

/// Wraps a body in an entry point that returns the top of the stack.
fn entry(body: Vec<Instruction>) -> Postfix {
    let mut instructions = vec![
        Instruction::Text,
        Instruction::Label("_main".to_string()),
        Instruction::Enter(0),
    ];
    instructions.extend(body);
    instructions.extend([Instruction::Pop, Instruction::Leave, Instruction::Ret]);
    stream(instructions)
}

fn exit_code(body: Vec<Instruction>) -> Result<i32, VmError> {
    run(&entry(body), &MachineOptions::default()).map(|execution| execution.exit_code)
}

#[test]
fn test_data_layout() {
    let postfix = stream(vec![
        Instruction::Bss,
        Instruction::Align,
        Instruction::Label("z".to_string()),
        Instruction::SAlloc(8),
        Instruction::Data,
        Instruction::Align,
        Instruction::Label("a".to_string()),
        Instruction::SInt(7),
        Instruction::Rodata,
        Instruction::Align,
        Instruction::Label("s".to_string()),
        Instruction::SString("hey".to_string()),
        Instruction::Data,
        Instruction::Align,
        Instruction::Label("p".to_string()),
        Instruction::SId("s".to_string()),
    ]);

    let image = Image::assemble(&postfix).unwrap();

    // DATA first, then RODATA, then BSS.
    assert_eq!(image.data_labels["a"], NULL_PAGE);
    assert_eq!(image.data_labels["p"], NULL_PAGE + 8);
    assert_eq!(image.data_labels["s"], NULL_PAGE + 16);
    assert_eq!(image.data_labels["z"], NULL_PAGE + 24);
    assert_eq!(image.memory.len() as u32, NULL_PAGE + 32);

    let p = image.data_labels["p"] as usize;
    let relocated = u32::from_le_bytes(image.memory[p..p + 4].try_into().unwrap());
    assert_eq!(relocated, image.data_labels["s"]);
}

#[test]
fn test_undefined_symbols() {
    let error = Image::assemble(&entry(vec![Instruction::Jmp("nowhere".to_string())])).unwrap_err();
    assert_eq!(
        error,
        VmError::UndefinedSymbol {
            name: "nowhere".to_string()
        }
    );

    let error = Image::assemble(&entry(vec![Instruction::Call("missing".to_string())])).unwrap_err();
    assert_eq!(error.get_error_name(), "UndefinedSymbol");

    // Runtime routines need no definition.
    assert!(Image::assemble(&entry(vec![Instruction::Call("println".to_string())])).is_ok());
}

#[test]
fn test_duplicate_labels() {
    let postfix = stream(vec![
        Instruction::Text,
        Instruction::Label("f".to_string()),
        Instruction::Label("f".to_string()),
    ]);
    let error = Image::assemble(&postfix).unwrap_err();
    assert_eq!(error.get_error_name(), "DuplicateSymbol");
}

#[test]
fn test_integer_arithmetic() {
    let result = exit_code(vec![
        Instruction::Int(7),
        Instruction::Int(3),
        Instruction::Sub,
        Instruction::Int(5),
        Instruction::Mul,
        Instruction::Int(6),
        Instruction::Mod,
    ]);
    assert_eq!(result, Ok(2));

    let result = exit_code(vec![
        Instruction::Int(i32::MAX),
        Instruction::Int(1),
        Instruction::Add,
    ]);
    assert_eq!(result, Ok(i32::MIN));
}

#[test]
fn test_division_by_zero() {
    let result = exit_code(vec![Instruction::Int(1), Instruction::Int(0), Instruction::Div]);
    assert!(matches!(result, Err(VmError::DivisionByZero { .. })));
}

#[test]
fn test_double_arithmetic_and_comparison() {
    let result = exit_code(vec![
        Instruction::Int(1),
        Instruction::I2D,
        Instruction::Int(2),
        Instruction::I2D,
        Instruction::DDiv,
        Instruction::Int(1),
        Instruction::I2D,
        Instruction::DCmp,
    ]);
    assert_eq!(result, Ok(-1));

    let result = exit_code(vec![
        Instruction::Int(7),
        Instruction::I2D,
        Instruction::DNeg,
        Instruction::D2I,
    ]);
    assert_eq!(result, Ok(-7));
}

#[test]
fn test_comparisons_and_jumps() {
    let result = exit_code(vec![
        Instruction::Int(2),
        Instruction::Int(3),
        Instruction::Lt,
        Instruction::Jz("skip".to_string()),
        Instruction::Int(10),
        Instruction::Jmp("done".to_string()),
        Instruction::Label("skip".to_string()),
        Instruction::Int(20),
        Instruction::Label("done".to_string()),
    ]);
    assert_eq!(result, Ok(10));
}

#[test]
fn test_call_and_frame() {
    // square(6) with the argument at fp + 8.
    let postfix = stream(vec![
        Instruction::Text,
        Instruction::Label("square".to_string()),
        Instruction::Enter(0),
        Instruction::Local(8),
        Instruction::Load,
        Instruction::Local(8),
        Instruction::Load,
        Instruction::Mul,
        Instruction::Pop,
        Instruction::Leave,
        Instruction::Ret,
        Instruction::Label("_main".to_string()),
        Instruction::Enter(4),
        Instruction::Int(6),
        Instruction::Call("square".to_string()),
        Instruction::Trash(4),
        Instruction::Push,
        Instruction::Local(-4),
        Instruction::Store,
        Instruction::Local(-4),
        Instruction::Load,
        Instruction::Pop,
        Instruction::Leave,
        Instruction::Ret,
    ]);

    let execution = run(&postfix, &MachineOptions::default()).unwrap();
    assert_eq!(execution.exit_code, 36);
}

#[test]
fn test_alloc_returns_the_block() {
    let result = exit_code(vec![
        Instruction::Int(16),
        Instruction::Alloc,
        Instruction::Sp,
        Instruction::Sp,
        Instruction::Sub,
    ]);
    // The block pointer is pushed right above where the next push lands.
    assert_eq!(result, Ok(4));
}

#[test]
fn test_print_routines() {
    let postfix = stream(vec![
        Instruction::Rodata,
        Instruction::Align,
        Instruction::Label("greeting".to_string()),
        Instruction::SString("hi ".to_string()),
        Instruction::Text,
        Instruction::Label("_main".to_string()),
        Instruction::Enter(0),
        Instruction::Addr("greeting".to_string()),
        Instruction::Call("prints".to_string()),
        Instruction::Trash(4),
        Instruction::Int(42),
        Instruction::Call("printi".to_string()),
        Instruction::Trash(4),
        Instruction::Int(5),
        Instruction::I2D,
        Instruction::Call("printd".to_string()),
        Instruction::Trash(8),
        Instruction::Call("println".to_string()),
        Instruction::Leave,
        Instruction::Ret,
    ]);

    let execution = run(&postfix, &MachineOptions::default()).unwrap();
    assert_eq!(execution.output, "hi 425\n");
}

#[test]
fn test_read_routines() {
    let body = vec![
        Instruction::Call("readi".to_string()),
        Instruction::Push,
        Instruction::Call("readd".to_string()),
        Instruction::DPush,
        Instruction::D2I,
        Instruction::Add,
    ];
    let options = MachineOptions {
        input: "40\n2.9".to_string(),
        ..MachineOptions::default()
    };

    let execution = run(&entry(body.clone()), &options).unwrap();
    assert_eq!(execution.exit_code, 42);

    let options = MachineOptions {
        input: "40".to_string(),
        ..MachineOptions::default()
    };
    assert_eq!(run(&entry(body.clone()), &options), Err(VmError::InputExhausted));

    let options = MachineOptions {
        input: "forty".to_string(),
        ..MachineOptions::default()
    };
    assert_eq!(
        run(&entry(body), &options),
        Err(VmError::InvalidInput {
            token: "forty".to_string()
        })
    );
}

#[test]
fn test_argv() {
    let postfix = stream(vec![
        Instruction::Text,
        Instruction::Label("_main".to_string()),
        Instruction::Enter(0),
        Instruction::Int(1),
        Instruction::Call("argv".to_string()),
        Instruction::Trash(4),
        Instruction::Push,
        Instruction::Call("prints".to_string()),
        Instruction::Trash(4),
        Instruction::Int(5),
        Instruction::Call("argv".to_string()),
        Instruction::Trash(4),
        Instruction::Leave,
        Instruction::Ret,
    ]);
    let options = MachineOptions {
        args: vec!["prog".to_string(), "first".to_string()],
        ..MachineOptions::default()
    };

    let execution = run(&postfix, &options).unwrap();
    assert_eq!(execution.output, "first");
    // Out of range indices give a null string.
    assert_eq!(execution.exit_code, 0);
}

#[test]
fn test_null_page_is_protected() {
    let result = exit_code(vec![Instruction::Int(0), Instruction::Load]);
    assert_eq!(result, Err(VmError::InvalidAddress { address: 0 }));
}

#[test]
fn test_step_limit() {
    let postfix = stream(vec![
        Instruction::Text,
        Instruction::Label("_main".to_string()),
        Instruction::Jmp("_main".to_string()),
    ]);
    let options = MachineOptions {
        max_steps: Some(100),
        ..MachineOptions::default()
    };

    assert_eq!(
        run(&postfix, &options),
        Err(VmError::StepLimitExceeded { steps: 100 })
    );
}

#[test]
fn test_stack_overflow() {
    let postfix = stream(vec![
        Instruction::Text,
        Instruction::Label("_main".to_string()),
        Instruction::Int(1),
        Instruction::Jmp("_main".to_string()),
    ]);
    let options = MachineOptions {
        memory_size: 256,
        ..MachineOptions::default()
    };

    assert_eq!(run(&postfix, &options), Err(VmError::StackOverflow));
}
