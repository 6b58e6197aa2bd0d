//! Hard limits on declared shapes.
//!
//! Checked before any storage is allocated, so an absurd array length in
//! the source never reaches the allocator.

use crate::error::CheckError;
use bitlang_common::ast::{Function, Item, Program, Statement, StmtKind};
use bitlang_common::stack::ensure_sufficient_stack;
use bitlang_common::{Position, Type};

/// Maximum array length, in elements.
pub const MAX_ARRAY_LEN: usize = 65_536;

/// Maximum number of parameters per function.
pub const MAX_PARAMS: usize = 255;

/// Whether a declared type respects [`MAX_ARRAY_LEN`].
pub fn type_within_limits(ty: &Type) -> bool {
    match ty {
        Type::Uint(_) => true,
        Type::Array { len, .. } => (1..=MAX_ARRAY_LEN).contains(len),
    }
}

/// Run the limits check.
pub fn check_limits(program: &Program) -> Vec<CheckError> {
    let mut errors = Vec::new();

    for item in &program.items {
        match item {
            Item::Function(f) => check_function(f, &mut errors),
            Item::Static(s) => check_type(&s.ty, s.at, &mut errors),
            Item::Const(c) => check_type(&c.ty, c.at, &mut errors),
            Item::Statement(stmt) => {
                check_block(std::slice::from_ref(stmt), &mut errors);
            }
        }
    }

    errors
}

fn check_type(ty: &Type, at: Position, errors: &mut Vec<CheckError>) {
    if let Type::Array { len, .. } = ty {
        if !type_within_limits(ty) {
            errors.push(CheckError::ArrayLength {
                at,
                len: *len,
                max: MAX_ARRAY_LEN,
            });
        }
    }
}

fn check_function(f: &Function, errors: &mut Vec<CheckError>) {
    if f.params.len() > MAX_PARAMS {
        errors.push(CheckError::TooManyParams {
            at: f.at,
            function: f.name.clone(),
            count: f.params.len(),
            max: MAX_PARAMS,
        });
    }
    for param in &f.params {
        check_type(&param.ty, f.at, errors);
    }
    if let Some(ret) = &f.ret {
        check_type(ret, f.at, errors);
    }
    check_block(&f.body, errors);
}

fn check_block(block: &[Statement], errors: &mut Vec<CheckError>) {
    ensure_sufficient_stack(|| check_block_inner(block, errors));
}

fn check_block_inner(block: &[Statement], errors: &mut Vec<CheckError>) {
    for stmt in block {
        match &stmt.kind {
            StmtKind::Let { ty, .. } | StmtKind::For { ty, .. } => check_type(ty, stmt.at, errors),
            StmtKind::Static(s) => check_type(&s.ty, s.at, errors),
            _ => {}
        }
        match &stmt.kind {
            StmtKind::If {
                then, otherwise, ..
            } => {
                check_block(then, errors);
                if let Some(otherwise) = otherwise {
                    check_block(otherwise, errors);
                }
            }
            StmtKind::For { body, .. } | StmtKind::Loop(body) => check_block(body, errors),
            _ => {}
        }
    }
}
