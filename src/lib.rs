#![allow(clippy::module_inception)]

use std::rc::Rc;

use crate::{
    compiler::compiler::{compile, Compilation, CompileOptions},
    errors::errors::{Error, ErrorTip},
    lexer::lexer::tokenize,
    parser::parser::parse,
};

pub mod ast;
pub mod compiler;
pub mod errors;
pub mod lexer;
pub mod macros;
pub mod parser;
pub mod type_checker;
pub mod vm;

extern crate regex;

/// A byte offset into a named source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position(pub u32, pub Rc<String>);

impl Position {
    pub fn null() -> Self {
        Position(0, Rc::new(String::from("<null>")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

/// Runs the whole front and back end over a source string.
///
/// Lexer and parser errors are returned as `Err`, as are fatal errors raised
/// while generating code. Recoverable type errors end up in
/// `Compilation::diagnostics`.
pub fn compile_source(
    source: &str,
    file: &str,
    options: &CompileOptions,
) -> Result<Compilation, Error> {
    let tokens = tokenize(source.to_string(), Some(file.to_string()))?;
    let (_, program) = parse(tokens, Rc::new(file.to_string()));
    let mut program = program?;

    compile(&mut program, options)
}

/// Finds the line containing a byte offset.
///
/// # Returns
///
/// The 1-based line number, the text of the line and the offset of the
/// position inside that line, or `None` when the offset is past the end.
pub fn get_line_at_position(content: &str, position: u32) -> Option<(usize, String, usize)> {
    let pos = position as usize;

    let mut start = 0;
    let mut line_number = 1;

    for line in content.split_inclusive('\n') {
        let end = start + line.len();

        if (start..end).contains(&pos) {
            let line_pos = pos - start;
            return Some((line_number, line.to_string(), line_pos));
        }

        start = end;
        line_number += 1;
    }

    // Errors at EOF point one past the last character.
    if pos == content.len() {
        let last = content.lines().last().unwrap_or("").to_string();
        let line_number = content.lines().count().max(1);
        return Some((line_number, last.clone(), last.len()));
    }

    None
}

pub fn display_error(error: &Error, content: &str) {
    /*
        error: message
        -> final.sw
           |
        20 | let a: int = #;
           | -------------^
    */

    let position = error.get_position();

    if let ErrorTip::None = error.get_tip() {
        eprintln!("Error: {}", error.get_error_name());
    } else {
        eprintln!("Error: {} ({})", error.get_error_name(), error.get_tip());
    }

    let Some((line, line_text, line_pos)) = get_line_at_position(content, position.0) else {
        eprintln!("-> {}", position.1);
        return;
    };

    let line_string = line.to_string();
    let padding = line_string.len() + 2;

    eprintln!("-> {}:{}", position.1, line);
    eprintln!("{:>padding$}", "|");

    let (line_text_removed, removed_whitespace) = remove_starting_whitespace(&line_text);
    eprintln!("{} | {}", line_string, line_text_removed.trim_end());

    let arrows = line_pos.saturating_sub(removed_whitespace) + 1;

    eprintln!("{:>padding$} {:->arrows$}", "|", "^");
}

fn remove_starting_whitespace(string: &str) -> (String, usize) {
    let mut start = 0;
    for c in string.chars() {
        if c == ' ' || c == '\t' {
            start += 1;
        } else {
            break;
        }
    }

    (String::from(&string[start..]), start)
}

#[cfg(test)]
mod tests {
    const SOURCE: &str = "let x: int = 1;\nfn main() -> int {\n    print x;\n}\n";

    #[test]
    fn test_get_line_at_position() {
        let (line_number, line, line_pos) = super::get_line_at_position(SOURCE, 4).unwrap();
        assert_eq!(line_number, 1);
        assert_eq!(line, "let x: int = 1;\n");
        assert_eq!(line_pos, 4);

        let (line_number, line, line_pos) = super::get_line_at_position(SOURCE, 45).unwrap();
        assert_eq!(line_number, 3);
        assert_eq!(line, "    print x;\n");
        assert_eq!(line_pos, 10);
    }

    #[test]
    fn test_position_past_end() {
        assert!(super::get_line_at_position(SOURCE, 500).is_none());
    }

    #[test]
    fn test_remove_starting_whitespace() {
        let (text, removed) = super::remove_starting_whitespace("    print x;");
        assert_eq!(text, "print x;");
        assert_eq!(removed, 4);
    }
}
