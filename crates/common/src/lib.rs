//! bitlang common types and syntax tree.
//!
//! This crate provides the foundational data structures shared by every
//! stage of the runtime:
//!
//! - [`Position`]: line/column of a token or syntax node
//! - [`Width`] and [`Type`]: declared unsigned widths and array shapes
//! - [`Value`]: runtime values (scalars and fixed-length arrays)
//! - [`ast`]: the syntax tree produced by the parser and consumed by
//!   the checker and the evaluator
//! - [`ValueError`]: errors from constructing out-of-range values
//! - [`stack`]: stack growth for the recursive tree walks
//!
//! # Dependencies
//!
//! This crate uses `thiserror`, and `stacker` for stack growth.

pub mod ast;
pub mod error;
pub mod position;
pub mod stack;
pub mod types;
pub mod value;

// Re-export commonly used types at the crate root.
pub use ast::{BinOp, Expr, ExprKind, Function, Item, Program, Statement, StmtKind};
pub use error::ValueError;
pub use position::Position;
pub use types::{Type, Width};
pub use value::Value;
