//! Utility macros for the front end.
//!
//! - `MK_TOKEN!` - Creates a Token instance
//! - `MK_DEFAULT_HANDLER!` - Creates a lexer handler for fixed-text tokens
//! - `MK_SPAN!` - Creates a Span from two byte offsets in the lexer's file

/// Creates a Token instance.
///
/// # Arguments
///
/// * `$kind` - The TokenKind
/// * `$value` - The token's string value
/// * `$span` - The source span
///
/// # Example
///
/// ```ignore
/// let token = MK_TOKEN!(TokenKind::Number, "42".to_string(), span);
/// ```
#[macro_export]
macro_rules! MK_TOKEN {
    ($kind:expr, $value:expr, $span:expr) => {
        Token {
            kind: $kind,
            value: $value,
            span: $span,
        }
    };
}

/// Creates a Span covering `$start..$end` in the file currently being lexed.
#[macro_export]
macro_rules! MK_SPAN {
    ($lexer:expr, $start:expr, $end:expr) => {
        Span {
            start: Position($start as u32, Rc::clone(&$lexer.file)),
            end: Position($end as u32, Rc::clone(&$lexer.file)),
        }
    };
}

/// Creates a lexer handler for a token whose text never varies.
///
/// The handler pushes a token of the given kind and advances the lexer by
/// the length of the literal.
///
/// # Example
///
/// ```ignore
/// RegexPattern {
///     regex: Regex::new("^\\+").unwrap(),
///     handler: MK_DEFAULT_HANDLER!(TokenKind::Plus, "+"),
/// }
/// ```
#[macro_export]
macro_rules! MK_DEFAULT_HANDLER {
    ($kind:expr, $value:literal) => {
        |lexer: &mut Lexer, _regex: &Regex| {
            let span = MK_SPAN!(lexer, lexer.pos, lexer.pos + $value.len());
            lexer.push(MK_TOKEN!($kind, String::from($value), span));
            lexer.advance_n($value.len());
        }
    };
}
