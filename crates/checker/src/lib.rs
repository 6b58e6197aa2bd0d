//! bitlang checker: the declaration pass that runs before evaluation.
//!
//! The checker builds the [`FunctionTable`] and the zero-valued
//! [`StaticEnvironment`] from a parsed [`Program`], and reports declaration
//! errors. It collects ALL errors (not just the first) and returns them.
//!
//! # Usage
//!
//! ```
//! use bitlang_checker::check;
//!
//! let program = bitlang_syntax::parse("static R:u8\nfn one:u8 { return 1 }\n(= R (one))").unwrap();
//! let decls = check(&program).unwrap();
//! assert!(decls.functions.contains("one"));
//! assert!(decls.statics.global("R").is_some());
//! ```
//!
//! # Passes
//!
//! 1. **Limits**: array lengths, parameter counts
//! 2. **Declarations**: function table, statics, consts, duplicates
//! 3. **Names**: undefined identifiers and functions, const assignment,
//!    duplicate bindings
//!
//! Arity and width mismatches depend on runtime values and are reported by
//! the evaluator.

pub mod declarations;
pub mod error;
pub mod limits;
pub mod resolve;

pub use declarations::{Declarations, FunctionTable, StaticEnvironment};
pub use error::CheckError;

use bitlang_common::Program;

/// Check a program and build its declarations.
///
/// Returns the declarations if the program passes all checks, or
/// `Err(Vec<CheckError>)` with all errors found, in pass order.
pub fn check(program: &Program) -> Result<Declarations<'_>, Vec<CheckError>> {
    let mut all_errors = Vec::new();

    // Pass 1: Limits
    all_errors.extend(limits::check_limits(program));
    tracing::debug!(errors = all_errors.len(), "limits pass complete");

    // Pass 2: Declarations
    let (decls, decl_errors) = declarations::collect_declarations(program);
    tracing::debug!(
        functions = decls.functions.len(),
        slots = decls.statics.len(),
        errors = decl_errors.len(),
        "declaration pass complete"
    );
    all_errors.extend(decl_errors);

    // Pass 3: Names
    let name_errors = resolve::check_names(program);
    tracing::debug!(errors = name_errors.len(), "name pass complete");
    all_errors.extend(name_errors);

    if all_errors.is_empty() {
        Ok(decls)
    } else {
        Err(all_errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitlang_syntax::parse;

    #[test]
    fn empty_program() {
        let program = parse("").unwrap();
        let decls = check(&program).unwrap();
        assert!(decls.functions.is_empty());
        assert!(decls.statics.is_empty());
    }

    #[test]
    fn errors_from_every_pass_are_collected() {
        let program = parse("static A:[u8 0]\nstatic A:u8\n(= B 1)").unwrap();
        let errors = check(&program).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(matches!(errors[0], CheckError::ArrayLength { .. }));
        assert!(matches!(errors[1], CheckError::DuplicateGlobal { .. }));
        assert!(matches!(errors[2], CheckError::UndefinedIdentifier { .. }));
    }
}
