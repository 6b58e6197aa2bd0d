//! Error types for lexing and parsing bitlang source.
//!
//! Both kinds are fatal: a program that fails to lex or parse never
//! starts evaluating.

use bitlang_common::Position;
use thiserror::Error;

/// Errors produced while tokenizing source text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    /// A character that starts no token.
    #[error("{at}: unrecognized character '{ch}'")]
    UnrecognizedChar { at: Position, ch: char },

    /// A numeric literal that is malformed or does not fit in 64 bits.
    #[error("{at}: malformed integer literal '{text}'")]
    InvalidNumber { at: Position, text: String },
}

impl LexError {
    pub fn position(&self) -> Position {
        match self {
            LexError::UnrecognizedChar { at, .. } | LexError::InvalidNumber { at, .. } => *at,
        }
    }
}

/// Errors produced while building the syntax tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A token appeared where it was not expected.
    #[error("{at}: expected {expected}, found {found}")]
    UnexpectedToken {
        at: Position,
        expected: &'static str,
        found: String,
    },

    /// A `u<N>` type name with `N` outside `1..=64`.
    #[error("{at}: unknown type '{name}'")]
    UnknownType { at: Position, name: String },

    /// An operator applied to the wrong number of operands.
    #[error("{at}: operator '{op}' takes 2 operands, found {found}")]
    InvalidArity {
        at: Position,
        op: &'static str,
        found: usize,
    },

    /// `(= ..)`, `(+= ..)` or `(-= ..)` used as a value.
    #[error("{at}: assignment '{op}' cannot be used as an expression")]
    AssignmentInExpression { at: Position, op: &'static str },

    /// `return` without a value in a function that declares a return type.
    #[error("{at}: return without a value in a function returning {ty}")]
    MissingReturnValue { at: Position, ty: String },

    /// `return value` outside a function that declares a return type.
    #[error("{at}: unexpected return value")]
    UnexpectedReturnValue { at: Position },

    /// `break` or `continue` outside `loop`/`for`.
    #[error("{at}: '{keyword}' outside of a loop")]
    OutsideLoop {
        at: Position,
        keyword: &'static str,
    },

    /// `static` inside a nested top-level block.
    #[error("{at}: 'static' must be declared at top level or inside a function")]
    MisplacedStatic { at: Position },
}

impl ParseError {
    pub fn position(&self) -> Position {
        match self {
            ParseError::UnexpectedToken { at, .. }
            | ParseError::UnknownType { at, .. }
            | ParseError::InvalidArity { at, .. }
            | ParseError::AssignmentInExpression { at, .. }
            | ParseError::MissingReturnValue { at, .. }
            | ParseError::UnexpectedReturnValue { at }
            | ParseError::OutsideLoop { at, .. }
            | ParseError::MisplacedStatic { at } => *at,
        }
    }
}

/// Either stage of turning text into a [`Program`](bitlang_common::Program).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("lex error: {0}")]
    Lex(#[from] LexError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
}

impl SyntaxError {
    pub fn position(&self) -> Position {
        match self {
            SyntaxError::Lex(e) => e.position(),
            SyntaxError::Parse(e) => e.position(),
        }
    }
}
