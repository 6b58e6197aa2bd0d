//! Declaration errors found before a program runs.
//!
//! Every error carries the source position (`at`) of the offending
//! declaration or reference. The checker collects ALL errors, not just the
//! first.

use bitlang_common::{Position, Width};
use thiserror::Error;

/// Errors found while building the function table and static environment,
/// and while resolving names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    // --- Duplicates ---
    /// Two functions share a name.
    #[error("{at}: function '{name}' is already defined")]
    DuplicateFunction { at: Position, name: String },

    /// Two top-level statics or consts share a name.
    #[error("{at}: global '{name}' is already declared")]
    DuplicateGlobal { at: Position, name: String },

    /// Two statics in the same function share a name.
    #[error("{at}: static '{name}' is already declared in function '{function}'")]
    DuplicateStatic {
        at: Position,
        function: String,
        name: String,
    },

    /// A parameter or `let` reuses a name already bound in the same scope.
    #[error("{at}: '{name}' is already bound in this scope")]
    DuplicateLocal { at: Position, name: String },

    // --- Consts ---
    /// A const declared with a scalar type.
    #[error("{at}: const '{name}' must have an array type")]
    ConstNotArray { at: Position, name: String },

    /// A const literal with the wrong number of elements.
    #[error("{at}: const '{name}' declares {expected} elements, literal has {found}")]
    ConstLength {
        at: Position,
        name: String,
        expected: usize,
        found: usize,
    },

    /// A const element that does not fit the element width.
    #[error("{at}: const '{name}' element {value} does not fit in {width}")]
    ConstValueOutOfRange {
        at: Position,
        name: String,
        value: u64,
        width: Width,
    },

    // --- Resolution ---
    /// A variable or array name that resolves to nothing.
    #[error("{at}: undefined identifier '{name}'")]
    UndefinedIdentifier { at: Position, name: String },

    /// A call to a function that is not defined.
    #[error("{at}: undefined function '{name}'")]
    UndefinedFunction { at: Position, name: String },

    /// An assignment whose target is a const.
    #[error("{at}: cannot assign to const '{name}'")]
    AssignToConst { at: Position, name: String },

    // --- Limits ---
    /// An array type with length 0 or above the limit.
    #[error("{at}: array length {len} outside 1..={max}")]
    ArrayLength { at: Position, len: usize, max: usize },

    /// A function with more parameters than the limit.
    #[error("{at}: function '{function}' has {count} parameters, limit is {max}")]
    TooManyParams {
        at: Position,
        function: String,
        count: usize,
        max: usize,
    },
}

impl CheckError {
    /// Source position of the error.
    pub fn position(&self) -> Position {
        match self {
            CheckError::DuplicateFunction { at, .. }
            | CheckError::DuplicateGlobal { at, .. }
            | CheckError::DuplicateStatic { at, .. }
            | CheckError::DuplicateLocal { at, .. }
            | CheckError::ConstNotArray { at, .. }
            | CheckError::ConstLength { at, .. }
            | CheckError::ConstValueOutOfRange { at, .. }
            | CheckError::UndefinedIdentifier { at, .. }
            | CheckError::UndefinedFunction { at, .. }
            | CheckError::AssignToConst { at, .. }
            | CheckError::ArrayLength { at, .. }
            | CheckError::TooManyParams { at, .. } => *at,
        }
    }
}
