use std::{
    fs::{read_to_string, write},
    io::{self, Read},
    path::PathBuf,
    process::ExitCode,
    rc::Rc,
    time::Instant,
};

use clap::Parser;
use log::{error, info};
use sweepc::{
    compiler::compiler::{compile, CompileOptions},
    display_error,
    lexer::lexer::tokenize,
    parser::parser::parse,
    vm::{self, machine::MachineOptions},
};

/// Compile a sweep program to stack-machine code, and optionally run it
#[derive(Parser)]
#[command(name = "sweepc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Source file to compile
    file: PathBuf,

    /// Write the instruction listing to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Run the program on the stack machine after compiling it
    #[arg(long)]
    run: bool,

    /// Name of the function used as the program entry point
    #[arg(long, default_value = "main")]
    entry: String,

    /// Machine memory in bytes
    #[arg(long, default_value_t = 1 << 20)]
    memory: u32,

    /// Stop the machine after this many instructions
    #[arg(long)]
    max_steps: Option<u64>,

    /// Arguments passed to the program, readable through `argv`
    #[arg(last = true)]
    args: Vec<String>,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let file_name = cli
        .file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| cli.file.to_string_lossy().into_owned());

    let file_contents = match read_to_string(&cli.file) {
        Ok(contents) => contents,
        Err(err) => {
            error!("failed to read {}: {err}", cli.file.display());
            return ExitCode::from(2);
        }
    };

    let start = Instant::now();

    let tokens = match tokenize(file_contents.clone(), Some(file_name.clone())) {
        Ok(tokens) => tokens,
        Err(err) => {
            display_error(&err, &file_contents);
            return ExitCode::from(2);
        }
    };

    info!("Tokenized in {:?}", start.elapsed());

    let parse_start = Instant::now();
    let (_, program) = parse(tokens, Rc::new(file_name));
    let mut program = match program {
        Ok(program) => program,
        Err(err) => {
            display_error(&err, &file_contents);
            return ExitCode::from(2);
        }
    };

    info!("Parsed in {:?}", parse_start.elapsed());

    let compile_start = Instant::now();
    let options = CompileOptions {
        entry_point: cli.entry.clone(),
    };
    let compilation = match compile(&mut program, &options) {
        Ok(compilation) => compilation,
        Err(err) => {
            display_error(&err, &file_contents);
            return ExitCode::from(2);
        }
    };

    info!("Compiled in {:?}", compile_start.elapsed());
    info!("Total time for code generation: {:?}", start.elapsed());

    for diagnostic in &compilation.diagnostics {
        display_error(diagnostic, &file_contents);
    }

    let listing = compilation.postfix.to_string();
    match &cli.output {
        Some(path) => {
            if let Err(err) = write(path, &listing) {
                error!("failed to write {}: {err}", path.display());
                return ExitCode::from(2);
            }
        }
        None if !cli.run => print!("{listing}"),
        None => {}
    }

    if !compilation.diagnostics.is_empty() {
        return ExitCode::from(1);
    }

    if !cli.run {
        return ExitCode::SUCCESS;
    }

    let mut input = String::new();
    if let Err(err) = io::stdin().read_to_string(&mut input) {
        error!("failed to read standard input: {err}");
        return ExitCode::from(2);
    }

    let mut args = vec![cli.file.to_string_lossy().into_owned()];
    args.extend(cli.args);

    let machine_options = MachineOptions {
        memory_size: cli.memory,
        args,
        env: std::env::vars()
            .map(|(key, value)| format!("{key}={value}"))
            .collect(),
        input,
        max_steps: cli.max_steps,
    };

    let run_start = Instant::now();
    match vm::run(&compilation.postfix, &machine_options) {
        Ok(execution) => {
            info!("Ran in {:?}", run_start.elapsed());
            print!("{}", execution.output);
            ExitCode::from(execution.exit_code as u8)
        }
        Err(err) => {
            eprintln!("Error: {} ({err})", err.get_error_name());
            ExitCode::from(2)
        }
    }
}
