//! Name resolution pass.
//!
//! Walks every function body and the top-level statement list with a stack
//! of lexical scopes, and reports references that resolve to nothing,
//! assignments to consts and names bound twice in the same scope.
//!
//! Lookup order matches the evaluator: innermost scope outward, then the
//! enclosing function's statics, then global statics, then consts.

use std::collections::HashSet;

use bitlang_common::ast::{Block, Expr, ExprKind, Function, Place, Program, StmtKind};
use bitlang_common::stack::ensure_sufficient_stack;
use bitlang_common::Position;

use crate::error::CheckError;

/// What a name resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Binding {
    Local,
    Static,
    Const,
}

struct Globals<'a> {
    functions: HashSet<&'a str>,
    statics: HashSet<&'a str>,
    consts: HashSet<&'a str>,
}

struct Resolver<'g, 'a> {
    globals: &'g Globals<'a>,
    /// Statics of the function being resolved (empty at top level).
    statics: HashSet<&'a str>,
    scopes: Vec<HashSet<&'a str>>,
    errors: Vec<CheckError>,
}

/// Run the resolution pass.
pub fn check_names(program: &Program) -> Vec<CheckError> {
    let globals = Globals {
        functions: program.functions().map(|f| f.name.as_str()).collect(),
        statics: program.statics().map(|s| s.name.as_str()).collect(),
        consts: program.consts().map(|c| c.name.as_str()).collect(),
    };
    let mut errors = Vec::new();

    for f in program.functions() {
        errors.extend(Resolver::for_function(&globals, f).finish(&f.body));
    }

    // Top-level statements share one scope, in source order.
    let mut top = Resolver::new(&globals, HashSet::new());
    for stmt in program.statements() {
        top.statement(&stmt.kind, stmt.at);
    }
    errors.extend(top.errors);

    errors
}

impl<'g, 'a> Resolver<'g, 'a> {
    fn new(globals: &'g Globals<'a>, statics: HashSet<&'a str>) -> Self {
        Self {
            globals,
            statics,
            scopes: vec![HashSet::new()],
            errors: Vec::new(),
        }
    }

    fn for_function(globals: &'g Globals<'a>, f: &'a Function) -> Self {
        let statics = f.statics();
        let names = statics.iter().copied().map(|s| s.name.as_str()).collect();
        let mut resolver = Self::new(globals, names);
        for param in &f.params {
            resolver.bind(&param.name, f.at);
        }
        // A parameter would hide the static for the whole body.
        for s in statics {
            if f.params.iter().any(|p| p.name == s.name) {
                resolver.errors.push(CheckError::DuplicateStatic {
                    at: s.at,
                    function: f.name.clone(),
                    name: s.name.clone(),
                });
            }
        }
        resolver
    }

    /// Resolve a function body in the parameter scope.
    fn finish(mut self, body: &'a Block) -> Vec<CheckError> {
        for stmt in body {
            self.statement(&stmt.kind, stmt.at);
        }
        self.errors
    }

    fn bind(&mut self, name: &'a str, at: Position) {
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };
        if !scope.insert(name) {
            self.errors.push(CheckError::DuplicateLocal {
                at,
                name: name.to_string(),
            });
        }
    }

    fn lookup(&self, name: &str) -> Option<Binding> {
        if self.scopes.iter().rev().any(|scope| scope.contains(name)) {
            Some(Binding::Local)
        } else if self.statics.contains(name) || self.globals.statics.contains(name) {
            Some(Binding::Static)
        } else if self.globals.consts.contains(name) {
            Some(Binding::Const)
        } else {
            None
        }
    }

    fn reference(&mut self, name: &str, at: Position) -> Option<Binding> {
        let binding = self.lookup(name);
        if binding.is_none() {
            self.errors.push(CheckError::UndefinedIdentifier {
                at,
                name: name.to_string(),
            });
        }
        binding
    }

    /// Resolve a block in a fresh scope, optionally pre-binding a loop variable.
    fn block(&mut self, block: &'a Block, var: Option<(&'a str, Position)>) {
        self.scopes.push(HashSet::new());
        if let Some((name, at)) = var {
            self.bind(name, at);
        }
        for stmt in block {
            self.statement(&stmt.kind, stmt.at);
        }
        self.scopes.pop();
    }

    fn statement(&mut self, kind: &'a StmtKind, at: Position) {
        ensure_sufficient_stack(|| self.statement_inner(kind, at));
    }

    fn statement_inner(&mut self, kind: &'a StmtKind, at: Position) {
        match kind {
            StmtKind::Let { name, value, .. } => {
                // The initializer sees the scope before the new binding.
                self.expr(value);
                self.bind(name, at);
            }
            StmtKind::Assign { place, value, .. } => {
                let (name, index) = match place {
                    Place::Var(name) => (name, None),
                    Place::Element { index, array } => (array, Some(index)),
                };
                if let Some(index) = index {
                    self.expr(index);
                }
                if self.reference(name, at) == Some(Binding::Const) {
                    self.errors.push(CheckError::AssignToConst {
                        at,
                        name: name.clone(),
                    });
                }
                self.expr(value);
            }
            StmtKind::If {
                cond,
                then,
                otherwise,
            } => {
                self.expr(cond);
                self.block(then, None);
                if let Some(otherwise) = otherwise {
                    self.block(otherwise, None);
                }
            }
            StmtKind::For {
                var,
                start,
                end,
                body,
                ..
            } => {
                self.expr(start);
                self.expr(end);
                self.block(body, Some((var.as_str(), at)));
            }
            StmtKind::Loop(body) => self.block(body, None),
            StmtKind::Return(Some(value)) | StmtKind::Expr(value) => self.expr(value),
            StmtKind::Static(_)
            | StmtKind::Return(None)
            | StmtKind::Break
            | StmtKind::Continue
            | StmtKind::Panic => {}
        }
    }

    fn expr(&mut self, expr: &'a Expr) {
        ensure_sufficient_stack(|| self.expr_inner(expr));
    }

    fn expr_inner(&mut self, expr: &'a Expr) {
        match &expr.kind {
            ExprKind::Literal(_) => {}
            ExprKind::Ident(name) => {
                self.reference(name, expr.at);
            }
            ExprKind::Index { index, array } => {
                self.expr(index);
                self.reference(array, expr.at);
            }
            ExprKind::Binary { left, right, .. } => {
                self.expr(left);
                self.expr(right);
            }
            ExprKind::Call { name, args } => {
                if !self.globals.functions.contains(name.as_str()) {
                    self.errors.push(CheckError::UndefinedFunction {
                        at: expr.at,
                        name: name.clone(),
                    });
                }
                for arg in args {
                    self.expr(arg);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitlang_syntax::parse;

    fn names(src: &str) -> Vec<CheckError> {
        check_names(&parse(src).unwrap())
    }

    #[test]
    fn fixture_style_program_resolves() {
        let src = "const TREE:[u8 3] = [1 0 0]\nstatic CURSOR:u8\n\
                   fn next_node:u8 { let node:u8 = [CURSOR]TREE\n (+= CURSOR 1)\n return node }\n\
                   (next_node)";
        assert!(names(src).is_empty());
    }

    #[test]
    fn function_static_visible_in_whole_body() {
        let src = "fn f:u8 { if (== C 0) { (= C 1) }\n static C:u8\n return C }";
        assert!(names(src).is_empty());
    }

    #[test]
    fn function_static_invisible_elsewhere() {
        let errors = names("fn f { static C:u8 }\n(= C 1)");
        assert!(matches!(
            errors[..],
            [CheckError::UndefinedIdentifier { ref name, .. }] if name == "C"
        ));
    }

    #[test]
    fn undefined_identifier_and_function() {
        let errors = names("let x:u8 = (+ y (nope 1))");
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .any(|e| matches!(e, CheckError::UndefinedIdentifier { name, .. } if name == "y")));
        assert!(errors
            .iter()
            .any(|e| matches!(e, CheckError::UndefinedFunction { name, .. } if name == "nope")));
    }

    #[test]
    fn assignment_to_const() {
        let errors = names("const T:[u8 1] = [1]\n(= [0]T 2)");
        assert!(matches!(errors[..], [CheckError::AssignToConst { .. }]));
    }

    #[test]
    fn local_shadowing_a_const_is_assignable() {
        assert!(names("const T:[u8 1] = [1]\nfn f(T:u8) { (= T 2) }").is_empty());
    }

    #[test]
    fn duplicate_let_in_same_scope() {
        let errors = names("let x:u8 = 1\nlet x:u8 = 2");
        assert!(matches!(errors[..], [CheckError::DuplicateLocal { .. }]));
    }

    #[test]
    fn shadowing_in_nested_scope_is_allowed() {
        assert!(names("let x:u8 = 1\nif x { let x:u8 = 2 }").is_empty());
    }

    #[test]
    fn let_cannot_rebind_a_parameter() {
        let errors = names("fn f(a:u8) { let a:u8 = 1 }");
        assert!(matches!(errors[..], [CheckError::DuplicateLocal { .. }]));
    }

    #[test]
    fn static_sharing_a_parameter_name() {
        let errors = names("fn f(c:u8):u8 {\n static c:u8\n return c }");
        assert_eq!(
            errors,
            vec![CheckError::DuplicateStatic {
                at: Position::new(2, 2),
                function: "f".into(),
                name: "c".into(),
            }]
        );
    }

    #[test]
    fn deeply_nested_expression_resolves() {
        let depth = 2_000;
        let src = format!(
            "static R:u8\n(= R {}R{})",
            "(+ 1 ".repeat(depth),
            ")".repeat(depth)
        );
        assert!(names(&src).is_empty());
    }

    #[test]
    fn duplicate_parameter() {
        let errors = names("fn f(a:u8 a:u8) { return }");
        assert!(matches!(errors[..], [CheckError::DuplicateLocal { .. }]));
    }

    #[test]
    fn loop_variable_is_scoped_to_the_loop() {
        let errors = names("for i:u8 in 0..3 { let y:u8 = i }\nlet z:u8 = i");
        assert!(matches!(
            errors[..],
            [CheckError::UndefinedIdentifier { ref name, .. }] if name == "i"
        ));
    }

    #[test]
    fn let_initializer_does_not_see_itself() {
        let errors = names("let x:u8 = x");
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn functions_do_not_see_top_level_lets() {
        let errors = names("let x:u8 = 1\nfn f:u8 { return x }");
        assert!(matches!(errors[..], [CheckError::UndefinedIdentifier { .. }]));
    }
}
