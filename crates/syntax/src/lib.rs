//! bitlang syntax: source text ↔ syntax tree.
//!
//! Parsing is two-staged: [`lexer::tokenize`] splits the text into
//! positioned tokens line by line, then a recursive-descent parser builds
//! a [`Program`]. Every compound expression is written operator-first in
//! parentheses, so there is no precedence to resolve.
//!
//! # Usage
//!
//! ```
//! use bitlang_syntax::{parse, print};
//!
//! let src = "static RESULT:u8\n(= RESULT (+ 1 2))\n";
//! let program = parse(src).unwrap();
//! assert_eq!(program.len(), 2);
//! assert_eq!(print(&program), src);
//! ```
//!
//! # Canonical Text
//!
//! [`print`] emits canonical text. `parse(print(p))` yields `p` again up to
//! source positions, and printing is idempotent.

pub mod error;
pub mod lexer;

mod parser;
mod printer;

pub use error::{LexError, ParseError, SyntaxError};

use bitlang_common::Program;

/// Parse source text into a program.
///
/// Returns the first error encountered.
pub fn parse(source: &str) -> Result<Program, SyntaxError> {
    let tokens = lexer::tokenize(source)?;
    Ok(parser::parse_tokens(tokens)?)
}

/// Render a program as canonical source text.
pub fn print(program: &Program) -> String {
    printer::print_program(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitlang_common::Position;

    #[test]
    fn lex_error_surfaces_through_parse() {
        let err = parse("let x:u8 = #").unwrap_err();
        assert!(matches!(err, SyntaxError::Lex(_)));
        assert_eq!(err.position(), Position::new(1, 12));
    }

    #[test]
    fn parse_error_surfaces_through_parse() {
        let err = parse("fn {").unwrap_err();
        assert!(matches!(err, SyntaxError::Parse(_)));
        assert_eq!(err.position(), Position::new(1, 4));
    }
}
