//! VM state: call frames, lexical scopes, and slot lookup.

use std::collections::HashMap;

use bitlang_checker::{Declarations, FunctionTable, StaticEnvironment};
use bitlang_common::{Function, Position, Program, Value};

use crate::config::VmConfig;
use crate::error::RuntimeError;
use crate::memory::Memory;

/// Activation record for one call, or for the top-level statement list.
#[derive(Debug, Clone)]
pub struct CallFrame<'a> {
    /// `None` for the top-level frame.
    pub function: Option<&'a Function>,
    /// Lexical scopes, innermost last. Names are unique within a scope.
    pub scopes: Vec<HashMap<&'a str, Value>>,
}

impl<'a> CallFrame<'a> {
    pub(crate) fn top_level() -> Self {
        Self {
            function: None,
            scopes: vec![HashMap::new()],
        }
    }

    pub(crate) fn call(function: &'a Function, params: HashMap<&'a str, Value>) -> Self {
        Self {
            function: Some(function),
            scopes: vec![params],
        }
    }

    pub fn function_name(&self) -> Option<&'a str> {
        self.function.map(|f| f.name.as_str())
    }
}

/// The bitlang tree-walking virtual machine.
pub struct VM<'a> {
    /// The program being executed.
    pub(crate) program: &'a Program,
    pub(crate) functions: FunctionTable<'a>,
    /// Persistent storage shared by every frame.
    pub(crate) statics: StaticEnvironment,
    /// Call stack. The bottom frame runs the top-level statements.
    pub(crate) frames: Vec<CallFrame<'a>>,
    pub(crate) config: VmConfig,
}

impl<'a> VM<'a> {
    /// Create a VM for a checked program.
    pub fn new(program: &'a Program, declarations: Declarations<'a>, config: VmConfig) -> Self {
        Self {
            program,
            functions: declarations.functions,
            statics: declarations.statics,
            frames: vec![CallFrame::top_level()],
            config,
        }
    }

    /// Snapshot of every static and const.
    pub fn memory(&self) -> Memory {
        Memory::from_statics(&self.statics)
    }

    /// Number of active function calls.
    pub fn depth(&self) -> usize {
        self.frames.len().saturating_sub(1)
    }

    pub(crate) fn frame(&self) -> Option<&CallFrame<'a>> {
        self.frames.last()
    }

    pub(crate) fn current_function(&self) -> Option<&'a Function> {
        self.frame().and_then(|frame| frame.function)
    }

    pub(crate) fn push_scope(&mut self, scope: HashMap<&'a str, Value>) {
        if let Some(frame) = self.frames.last_mut() {
            frame.scopes.push(scope);
        }
    }

    pub(crate) fn pop_scope(&mut self) {
        if let Some(frame) = self.frames.last_mut() {
            frame.scopes.pop();
        }
    }

    /// Bind a `let` in the innermost scope.
    pub(crate) fn declare(&mut self, name: &'a str, value: Value) {
        if let Some(scope) = self.frames.last_mut().and_then(|f| f.scopes.last_mut()) {
            scope.insert(name, value);
        }
    }

    /// Resolve a name for reading: innermost scope outward, then the
    /// current function's statics, then globals, then consts.
    pub(crate) fn read(&self, name: &str, at: Position) -> Result<&Value, RuntimeError> {
        let frame = self.frame();

        let local = frame.and_then(|f| f.scopes.iter().rev().find_map(|scope| scope.get(name)));
        let function_static = || {
            let function = frame?.function_name()?;
            self.statics.local(function, name)
        };

        local
            .or_else(function_static)
            .or_else(|| self.statics.global(name))
            .or_else(|| self.statics.constant(name))
            .ok_or_else(|| RuntimeError::Unresolved {
                at,
                name: name.to_string(),
            })
    }

    /// Resolve a name for writing, in the same order as [`read`](Self::read).
    pub(crate) fn slot_mut(&mut self, name: &str, at: Position) -> Result<&mut Value, RuntimeError> {
        let function = self.frame().and_then(CallFrame::function_name);

        if let Some(frame) = self.frames.last_mut() {
            let scope = frame.scopes.iter().rposition(|scope| scope.contains_key(name));
            if let Some(i) = scope {
                return frame.scopes[i].get_mut(name).ok_or_else(|| unresolved(name, at));
            }
        }

        if let Some(function) = function {
            if self.statics.local(function, name).is_some() {
                return self
                    .statics
                    .local_mut(function, name)
                    .ok_or_else(|| unresolved(name, at));
            }
        }

        if self.statics.is_constant(name) && self.statics.global(name).is_none() {
            return Err(RuntimeError::ConstAssignment {
                at,
                name: name.to_string(),
            });
        }

        self.statics
            .global_mut(name)
            .ok_or_else(|| unresolved(name, at))
    }
}

fn unresolved(name: &str, at: Position) -> RuntimeError {
    RuntimeError::Unresolved {
        at,
        name: name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitlang_common::Width;

    fn u8v(n: u64) -> Value {
        Value::scalar(Width::U8, n).unwrap()
    }

    #[test]
    fn lookup_order_prefers_innermost_binding() {
        let program = bitlang_syntax::parse("static X:u8\nconst C:[u8 1] = [9]").unwrap();
        let decls = bitlang_checker::check(&program).unwrap();
        let mut vm = VM::new(&program, decls, VmConfig::default());
        let at = Position::new(1, 1);

        assert_eq!(vm.read("X", at), Ok(&u8v(0)));

        vm.declare("X", u8v(5));
        assert_eq!(vm.read("X", at), Ok(&u8v(5)));

        vm.push_scope(HashMap::from([("X", u8v(7))]));
        assert_eq!(vm.read("X", at), Ok(&u8v(7)));
        *vm.slot_mut("X", at).unwrap() = u8v(8);
        vm.pop_scope();

        assert_eq!(vm.read("X", at), Ok(&u8v(5)));
        assert_eq!(vm.statics.global("X"), Some(&u8v(0)));
        assert!(vm.read("C", at).is_ok());
    }

    #[test]
    fn consts_are_not_writable() {
        let program = bitlang_syntax::parse("const C:[u8 1] = [9]").unwrap();
        let decls = bitlang_checker::check(&program).unwrap();
        let mut vm = VM::new(&program, decls, VmConfig::default());
        assert!(matches!(
            vm.slot_mut("C", Position::new(1, 1)),
            Err(RuntimeError::ConstAssignment { .. })
        ));
    }

    #[test]
    fn unknown_names_are_unresolved() {
        let program = Program::default();
        let mut vm = VM::new(&program, Declarations::default(), VmConfig::default());
        assert!(matches!(
            vm.read("nope", Position::new(1, 1)),
            Err(RuntimeError::Unresolved { .. })
        ));
        assert!(vm.slot_mut("nope", Position::new(1, 1)).is_err());
    }
}
