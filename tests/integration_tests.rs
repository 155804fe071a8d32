//! End-to-end tests: source text is tokenized, parsed, compiled and run on
//! the stack machine, and the tests look at what the program printed and
//! the status it exited with.

use sweepc::{
    compile_source,
    compiler::compiler::{Compilation, CompileOptions},
    vm::{
        self,
        errors::VmError,
        machine::{Execution, MachineOptions},
    },
};

fn compile(source: &str) -> Compilation {
    let compilation = compile_source(source, "test.sw", &CompileOptions::default()).unwrap();
    assert!(
        compilation.diagnostics.is_empty(),
        "unexpected diagnostics: {:?}",
        compilation.diagnostics
    );
    compilation
}

fn run_with(source: &str, options: &MachineOptions) -> Execution {
    let compilation = compile(source);
    vm::run(&compilation.postfix, options).unwrap()
}

fn run(source: &str) -> Execution {
    run_with(source, &MachineOptions::default())
}

#[test]
fn test_print_local() {
    let execution = run("fn main() -> int { let x: int = 2 + 3; print x; return 0; }");
    assert_eq!(execution.output, "5");
    assert_eq!(execution.exit_code, 0);
}

#[test]
fn test_sweep_sum() {
    let execution = run(
        "fn main() -> int {
            let i: int;
            let sum: int = 0;
            sweep i = 0 to 9 {
                sum = sum + i;
            }
            println sum;
            return sum;
        }",
    );
    assert_eq!(execution.output, "45\n");
    assert_eq!(execution.exit_code, 45);
}

#[test]
fn test_sweep_downto_with_step() {
    let execution = run(
        "fn main() {
            let i: int;
            sweep i = 10 downto 1 step 3 {
                print i;
                print \" \";
            }
        }",
    );
    assert_eq!(execution.output, "10 7 4 1 ");
}

#[test]
fn test_int_argument_widened_to_double() {
    let execution = run(
        "fn half(x: double) -> double { return x / 2; }
        fn main() -> int { print half(5); return 0; }",
    );
    assert_eq!(execution.output, "2.5");
}

#[test]
fn test_recursion() {
    let execution = run(
        "fn fact(n: int) -> int {
            if n <= 1 { return 1; }
            return n * fact(n - 1);
        }
        fn main() -> int { return fact(5); }",
    );
    assert_eq!(execution.exit_code, 120);
}

#[test]
fn test_mutual_recursion_through_declaration() {
    let execution = run(
        "fn is_even(n: int) -> int;
        fn is_odd(n: int) -> int {
            if n == 0 { return 0; }
            return is_even(n - 1);
        }
        fn is_even(n: int) -> int {
            if n == 0 { return 1; }
            return is_odd(n - 1);
        }
        fn main() -> int { return is_even(10) * 10 + is_odd(7); }",
    );
    assert_eq!(execution.exit_code, 11);
}

#[test]
fn test_next_and_stop() {
    let execution = run(
        "fn main() -> int {
            let i: int = 0;
            let odd: int = 0;
            while 1 {
                i = i + 1;
                if i > 10 { stop; }
                if i % 2 == 0 { next; }
                odd = odd + i;
            }
            return odd;
        }",
    );
    assert_eq!(execution.exit_code, 25);
}

#[test]
fn test_next_in_sweep_still_steps() {
    let execution = run(
        "fn main() -> int {
            let i: int;
            let count: int = 0;
            sweep i = 1 to 6 {
                if i % 3 { next; }
                count = count + 1;
            }
            return count;
        }",
    );
    assert_eq!(execution.exit_code, 2);
}

#[test]
fn test_short_circuit() {
    let execution = run(
        "fn boom() -> int { print \"boom\"; return 1; }
        fn main() -> int {
            if 0 && boom() { print \"and\"; }
            if 1 || boom() { print \"or\"; }
            return !0 + (2 && 3);
        }",
    );
    assert_eq!(execution.output, "or");
    assert_eq!(execution.exit_code, 2);
}

#[test]
fn test_reads_follow_their_context() {
    let options = MachineOptions {
        input: "2 0.5".to_string(),
        ..MachineOptions::default()
    };
    let execution = run_with(
        "fn main() -> int {
            let a: int = read;
            let d: double = read;
            print a + d;
            return 0;
        }",
        &options,
    );
    assert_eq!(execution.output, "2.5");
}

#[test]
fn test_print_read_echoes_an_int() {
    let options = MachineOptions {
        input: "17".to_string(),
        ..MachineOptions::default()
    };
    let execution = run_with("fn main() { print read; }", &options);
    assert_eq!(execution.output, "17");
}

#[test]
fn test_globals() {
    let execution = run(
        "let counter: int = 10;
        let scale: double = 2;
        let name: string = \"sweep\";
        let zero: int;
        fn bump() { counter = counter + 1; }
        fn main() -> int {
            bump();
            bump();
            print name;
            println counter;
            print scale * 1.25;
            return zero;
        }",
    );
    assert_eq!(execution.output, "sweep12\n2.5");
    assert_eq!(execution.exit_code, 0);
}

#[test]
fn test_pointers() {
    let execution = run(
        "fn main() -> int {
            let p: int[] = alloc(10);
            let i: int;
            sweep i = 0 to 9 {
                p[i] = i * i;
            }
            let q: int[] = p + 3;
            println q[1];
            println q - p;
            return p[9];
        }",
    );
    assert_eq!(execution.output, "16\n3\n");
    assert_eq!(execution.exit_code, 81);
}

#[test]
fn test_indexing_past_an_allocation_is_not_checked() {
    let execution = run(
        "fn main() -> int {
            let p: int[] = alloc(4);
            print &p[10] - &p[0];
            return 0;
        }",
    );
    assert_eq!(execution.output, "40");
}

#[test]
fn test_pointers_to_void_are_reported() {
    let compilation = compile_source(
        "fn main() -> int {
            let p: void[] = alloc(4);
            print 1;
            return 0;
        }",
        "test.sw",
        &CompileOptions::default(),
    )
    .unwrap();

    let names: Vec<&str> = compilation
        .diagnostics
        .iter()
        .map(|error| error.get_error_name())
        .collect();
    assert_eq!(names, vec!["TypeMatchError"]);

    let execution = vm::run(&compilation.postfix, &MachineOptions::default()).unwrap();
    assert_eq!(execution.output, "1");
}

#[test]
fn test_double_arrays_and_comparison() {
    let execution = run(
        "fn main() -> int {
            let d: double[] = alloc(2);
            d[0] = 1.5;
            d[1] = -d[0] * 2;
            if d[1] < -2.5 { print \"lt \"; }
            print d[1];
            return 0;
        }",
    );
    assert_eq!(execution.output, "lt -3");
}

#[test]
fn test_function_literal_is_the_default_result() {
    let execution = run(
        "fn seven() -> int = 7 { }
        fn main() -> int { return seven(); }",
    );
    assert_eq!(execution.exit_code, 7);
}

#[test]
fn test_entry_point_without_int_result_exits_cleanly() {
    assert_eq!(run("fn main() { print 1; }").exit_code, 0);
    assert_eq!(run("fn main() -> double { return 1.5; }").exit_code, 0);
}

#[test]
fn test_user_function_named_like_the_entry_label() {
    let execution = run(
        "fn _main() -> int { return 3; }
        fn main() -> int { return _main() + 1; }",
    );
    assert_eq!(execution.exit_code, 4);
}

#[test]
fn test_custom_entry_point() {
    let options = CompileOptions {
        entry_point: "start".to_string(),
    };
    let compilation =
        compile_source("fn start() -> int { return 9; }", "test.sw", &options).unwrap();

    let execution = vm::run(&compilation.postfix, &MachineOptions::default()).unwrap();
    assert_eq!(execution.exit_code, 9);
}

#[test]
fn test_argv_through_extern_declaration() {
    let options = MachineOptions {
        args: vec!["prog".to_string(), "hello".to_string()],
        ..MachineOptions::default()
    };
    let execution = run_with(
        "extern fn argv(i: int) -> string;
        fn main() -> int { print argv(1); return 0; }",
        &options,
    );
    assert_eq!(execution.output, "hello");
}

#[test]
fn test_missing_definition_fails_to_link() {
    let compilation = compile("extern fn helper() -> int; fn main() -> int { return helper(); }");

    let error = vm::run(&compilation.postfix, &MachineOptions::default()).unwrap_err();
    assert_eq!(
        error,
        VmError::UndefinedSymbol {
            name: "helper".to_string()
        }
    );
}

#[test]
fn test_runtime_division_by_zero() {
    let compilation = compile("fn main() -> int { let z: int = 0; return 1 / z; }");

    let error = vm::run(&compilation.postfix, &MachineOptions::default()).unwrap_err();
    assert_eq!(error.get_error_name(), "DivisionByZero");
}

#[test]
fn test_fatal_errors_stop_compilation() {
    let options = CompileOptions::default();

    let error = compile_source("fn main() -> int { next; }", "test.sw", &options).unwrap_err();
    assert_eq!(error.get_error_name(), "NextOutsideLoop");

    let error =
        compile_source("fn show(p: int[]) { print p; }", "test.sw", &options).unwrap_err();
    assert_eq!(error.get_error_name(), "UnprintableType");
    assert!(error.is_fatal());
}

#[test]
fn test_recoverable_errors_keep_the_rest_of_the_program() {
    let compilation = compile_source(
        "fn main() -> int {
            let s: string = 1;
            print 7;
            print missing;
            println 8;
            return 0;
        }",
        "test.sw",
        &CompileOptions::default(),
    )
    .unwrap();

    let names: Vec<&str> = compilation
        .diagnostics
        .iter()
        .map(|error| error.get_error_name())
        .collect();
    assert_eq!(names, vec!["TypeMatchError", "UndeclaredIdentifier"]);

    let execution = vm::run(&compilation.postfix, &MachineOptions::default()).unwrap();
    assert_eq!(execution.output, "78\n");
}

#[test]
fn test_lexer_and_parser_errors_are_reported() {
    let options = CompileOptions::default();

    assert!(compile_source("fn main() { let x: int = #; }", "test.sw", &options).is_err());
    assert!(compile_source("fn main() { print 1 }", "test.sw", &options).is_err());
}
