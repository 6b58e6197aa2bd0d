//! Runtime errors for the bitlang VM, and the error type at the crate
//! boundary.
//!
//! Runtime errors are conditions the checker cannot rule out statically.
//! Every variant carries the source position (`at`) of the expression or
//! statement that failed.

use std::fmt;

use bitlang_checker::CheckError;
use bitlang_common::{Position, Type, Width};
use bitlang_syntax::SyntaxError;
use thiserror::Error;

/// Errors that occur during evaluation. All of them end the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// The program executed `!!`.
    #[error("{at}: explicit panic{}", in_function(.function))]
    ExplicitPanic {
        at: Position,
        function: Option<String>,
    },

    /// Operand, argument, return value or assigned value of the wrong type.
    #[error("{at}: type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        at: Position,
        expected: Type,
        found: Type,
    },

    /// An array used where a scalar is required.
    #[error("{at}: expected a scalar, found {found}")]
    ScalarExpected { at: Position, found: Type },

    /// Indexing into a name that holds a scalar.
    #[error("{at}: '{name}' is not an array")]
    NotAnArray { at: Position, name: String },

    /// Call with the wrong number of arguments.
    #[error("{at}: function '{function}' takes {expected} arguments, found {found}")]
    ArityMismatch {
        at: Position,
        function: String,
        expected: usize,
        found: usize,
    },

    /// Array index at or beyond the array's length.
    #[error("{at}: index {index} out of bounds for '{array}' (length {len})")]
    IndexOutOfBounds {
        at: Position,
        array: String,
        index: u64,
        len: usize,
    },

    /// A literal that does not fit the width its context gives it.
    #[error("{at}: literal {value} does not fit in {width}")]
    LiteralOutOfRange {
        at: Position,
        value: u64,
        width: Width,
    },

    /// Division or remainder by zero.
    #[error("{at}: division by zero")]
    DivisionByZero { at: Position },

    /// Arithmetic result outside the width, under the trapping policy.
    #[error("{at}: arithmetic overflow in '{op}' at {width}")]
    ArithmeticOverflow {
        at: Position,
        op: &'static str,
        width: Width,
    },

    /// Call depth exceeded the configured limit.
    #[error("{at}: call depth exceeded limit {limit}")]
    StackExhausted { at: Position, limit: usize },

    /// A function with a return type finished without `return value`.
    #[error("{at}: function '{function}' ended without returning a value")]
    MissingReturn { at: Position, function: String },

    /// A call to a function without a return type used as a value.
    #[error("{at}: function '{function}' does not return a value")]
    NoValue { at: Position, function: String },

    /// Assignment to a const.
    #[error("{at}: cannot assign to const '{name}'")]
    ConstAssignment { at: Position, name: String },

    /// A name that resolves to nothing. Checked programs never hit this.
    #[error("{at}: unresolved name '{name}'")]
    Unresolved { at: Position, name: String },
}

fn in_function(function: &Option<String>) -> String {
    match function {
        Some(name) => format!(" in function '{name}'"),
        None => String::new(),
    }
}

impl RuntimeError {
    /// Source position of the error.
    pub fn position(&self) -> Position {
        match self {
            RuntimeError::ExplicitPanic { at, .. }
            | RuntimeError::TypeMismatch { at, .. }
            | RuntimeError::ScalarExpected { at, .. }
            | RuntimeError::NotAnArray { at, .. }
            | RuntimeError::ArityMismatch { at, .. }
            | RuntimeError::IndexOutOfBounds { at, .. }
            | RuntimeError::LiteralOutOfRange { at, .. }
            | RuntimeError::DivisionByZero { at }
            | RuntimeError::ArithmeticOverflow { at, .. }
            | RuntimeError::StackExhausted { at, .. }
            | RuntimeError::MissingReturn { at, .. }
            | RuntimeError::NoValue { at, .. }
            | RuntimeError::ConstAssignment { at, .. }
            | RuntimeError::Unresolved { at, .. } => *at,
        }
    }
}

/// Which stage rejected the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Lex,
    Parse,
    Declaration,
    Runtime,
    ExplicitPanic,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Lex => "lex error",
            ErrorKind::Parse => "parse error",
            ErrorKind::Declaration => "declaration error",
            ErrorKind::Runtime => "runtime error",
            ErrorKind::ExplicitPanic => "explicit panic",
        };
        f.write_str(name)
    }
}

/// Any error from source text to final memory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("{}", declaration_messages(.0))]
    Declaration(Vec<CheckError>),

    #[error("{}{0}", runtime_prefix(.0))]
    Runtime(#[from] RuntimeError),
}

fn runtime_prefix(error: &RuntimeError) -> &'static str {
    match error {
        RuntimeError::ExplicitPanic { .. } => "",
        _ => "runtime error: ",
    }
}

fn declaration_messages(errors: &[CheckError]) -> String {
    let lines: Vec<String> = errors
        .iter()
        .map(|e| format!("declaration error: {e}"))
        .collect();
    lines.join("\n")
}

impl From<Vec<CheckError>> for Error {
    fn from(errors: Vec<CheckError>) -> Self {
        Error::Declaration(errors)
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Syntax(SyntaxError::Lex(_)) => ErrorKind::Lex,
            Error::Syntax(SyntaxError::Parse(_)) => ErrorKind::Parse,
            Error::Declaration(_) => ErrorKind::Declaration,
            Error::Runtime(RuntimeError::ExplicitPanic { .. }) => ErrorKind::ExplicitPanic,
            Error::Runtime(_) => ErrorKind::Runtime,
        }
    }

    /// Position of the (first) offending construct.
    pub fn position(&self) -> Option<Position> {
        match self {
            Error::Syntax(e) => Some(e.position()),
            Error::Declaration(errors) => errors.first().map(CheckError::position),
            Error::Runtime(e) => Some(e.position()),
        }
    }
}
