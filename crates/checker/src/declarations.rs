//! Function table and static environment construction.
//!
//! Built in a single pass over the top-level items before any statement
//! executes. Function-local statics are registered together with their
//! function, so the slots exist before the first call reaches them.

use std::collections::{BTreeMap, HashMap, HashSet};

use bitlang_common::ast::{ConstDecl, Function, Item, Program};
use bitlang_common::{Type, Value};

use crate::error::CheckError;
use crate::limits::type_within_limits;

/// Functions by name. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct FunctionTable<'a> {
    functions: HashMap<&'a str, &'a Function>,
}

impl<'a> FunctionTable<'a> {
    pub fn get(&self, name: &str) -> Option<&'a Function> {
        self.functions.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

/// Persistent storage for one run: global statics, per-function statics
/// and consts.
///
/// Function statics live in a registry keyed by function name, not in any
/// call frame, so every activation of a function (recursive ones included)
/// sees the same slots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticEnvironment {
    globals: BTreeMap<String, Value>,
    locals: BTreeMap<String, BTreeMap<String, Value>>,
    consts: BTreeMap<String, Value>,
}

impl StaticEnvironment {
    /// A top-level static.
    pub fn global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }

    pub fn global_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.globals.get_mut(name)
    }

    /// A static declared inside `function`.
    pub fn local(&self, function: &str, name: &str) -> Option<&Value> {
        self.locals.get(function)?.get(name)
    }

    pub fn local_mut(&mut self, function: &str, name: &str) -> Option<&mut Value> {
        self.locals.get_mut(function)?.get_mut(name)
    }

    /// A const. There is no mutable accessor.
    pub fn constant(&self, name: &str) -> Option<&Value> {
        self.consts.get(name)
    }

    pub fn is_constant(&self, name: &str) -> bool {
        self.consts.contains_key(name)
    }

    /// Every slot under its qualified name: `NAME` for globals and consts,
    /// `function::NAME` for function statics.
    pub fn slots(&self) -> impl Iterator<Item = (String, &Value)> {
        let globals = self
            .globals
            .iter()
            .chain(&self.consts)
            .map(|(name, value)| (name.clone(), value));
        let locals = self.locals.iter().flat_map(|(function, slots)| {
            slots
                .iter()
                .map(move |(name, value)| (format!("{function}::{name}"), value))
        });
        globals.chain(locals)
    }

    /// Total number of slots.
    pub fn len(&self) -> usize {
        let locals: usize = self.locals.values().map(BTreeMap::len).sum();
        self.globals.len() + self.consts.len() + locals
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything registered before execution starts.
#[derive(Debug, Clone, Default)]
pub struct Declarations<'a> {
    pub functions: FunctionTable<'a>,
    pub statics: StaticEnvironment,
}

/// Build the function table and the zero-valued static environment.
///
/// Storage is only allocated for types within the limits; oversized shapes
/// are reported by the limits pass.
pub fn collect_declarations(program: &Program) -> (Declarations<'_>, Vec<CheckError>) {
    let mut decls = Declarations::default();
    let mut errors = Vec::new();
    let env = &mut decls.statics;
    // Names are tracked apart from storage, which skips oversized shapes.
    let mut globals: HashSet<&str> = HashSet::new();

    for item in &program.items {
        match item {
            Item::Function(f) => {
                if decls.functions.contains(&f.name) {
                    errors.push(CheckError::DuplicateFunction {
                        at: f.at,
                        name: f.name.clone(),
                    });
                    continue;
                }
                decls.functions.functions.insert(&f.name, f);

                let slots = env.locals.entry(f.name.clone()).or_default();
                let mut seen: HashSet<&str> = HashSet::new();
                for s in f.statics() {
                    if !seen.insert(&s.name) {
                        errors.push(CheckError::DuplicateStatic {
                            at: s.at,
                            function: f.name.clone(),
                            name: s.name.clone(),
                        });
                    } else if type_within_limits(&s.ty) {
                        slots.insert(s.name.clone(), s.ty.zero());
                    }
                }
            }
            Item::Static(s) => {
                if !globals.insert(&s.name) {
                    errors.push(CheckError::DuplicateGlobal {
                        at: s.at,
                        name: s.name.clone(),
                    });
                } else if type_within_limits(&s.ty) {
                    env.globals.insert(s.name.clone(), s.ty.zero());
                }
            }
            Item::Const(c) => {
                if !globals.insert(&c.name) {
                    errors.push(CheckError::DuplicateGlobal {
                        at: c.at,
                        name: c.name.clone(),
                    });
                    continue;
                }
                match const_value(c) {
                    Ok(Some(value)) => {
                        env.consts.insert(c.name.clone(), value);
                    }
                    Ok(None) => {}
                    Err(e) => errors.push(e),
                }
            }
            Item::Statement(_) => {}
        }
    }

    (decls, errors)
}

fn const_value(c: &ConstDecl) -> Result<Option<Value>, CheckError> {
    let Type::Array { element, len } = c.ty else {
        return Err(CheckError::ConstNotArray {
            at: c.at,
            name: c.name.clone(),
        });
    };

    if c.values.len() != len {
        return Err(CheckError::ConstLength {
            at: c.at,
            name: c.name.clone(),
            expected: len,
            found: c.values.len(),
        });
    }
    if let Some(&value) = c.values.iter().find(|&&v| !element.fits(v)) {
        return Err(CheckError::ConstValueOutOfRange {
            at: c.at,
            name: c.name.clone(),
            value,
            width: element,
        });
    }
    if !type_within_limits(&c.ty) {
        return Ok(None);
    }

    Ok(Value::array(element, c.values.clone()).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitlang_common::Width;
    use bitlang_syntax::parse;

    fn collect(src: &str) -> (Vec<String>, Vec<CheckError>) {
        let program = parse(src).unwrap();
        let (decls, errors) = collect_declarations(&program);
        let names = decls.statics.slots().map(|(name, _)| name).collect();
        (names, errors)
    }

    #[test]
    fn statics_start_at_zero() {
        let program = parse("static A:u8\nstatic B:[u16 3]").unwrap();
        let (decls, errors) = collect_declarations(&program);
        assert!(errors.is_empty());
        assert_eq!(decls.statics.global("A"), Some(&Value::scalar(Width::U8, 0).unwrap()));
        assert_eq!(
            decls.statics.global("B"),
            Some(&Value::array(Width::new(16).unwrap(), vec![0, 0, 0]).unwrap())
        );
    }

    #[test]
    fn function_statics_registered_with_function() {
        let program =
            parse("fn fib(n:u8):u8 { if 1 { static CACHE:[u8 13] } return 0 }").unwrap();
        let (decls, errors) = collect_declarations(&program);
        assert!(errors.is_empty());
        assert!(decls.functions.contains("fib"));
        assert_eq!(
            decls.statics.local("fib", "CACHE").map(Value::type_of),
            Some(Type::Array {
                element: Width::U8,
                len: 13
            })
        );
    }

    #[test]
    fn slots_are_qualified() {
        let (names, _) = collect("const T:[u8 1] = [1]\nstatic R:u8\nfn f { static C:u8 }");
        assert_eq!(names, ["R", "T", "f::C"]);
    }

    #[test]
    fn duplicate_function() {
        let (_, errors) = collect("fn f { return }\nfn f { return }");
        assert!(matches!(errors[..], [CheckError::DuplicateFunction { .. }]));
    }

    #[test]
    fn static_and_const_share_a_namespace() {
        let (_, errors) = collect("static X:u8\nconst X:[u8 1] = [0]");
        assert!(matches!(errors[..], [CheckError::DuplicateGlobal { .. }]));
    }

    #[test]
    fn duplicate_function_static() {
        let (_, errors) = collect("fn f { static C:u8\n static C:u8 }");
        assert_eq!(
            errors,
            vec![CheckError::DuplicateStatic {
                at: bitlang_common::Position::new(2, 2),
                function: "f".into(),
                name: "C".into(),
            }]
        );
    }

    #[test]
    fn same_static_name_in_different_functions() {
        let (names, errors) = collect("fn f { static C:u8 }\nfn g { static C:u8 }");
        assert!(errors.is_empty());
        assert_eq!(names, ["f::C", "g::C"]);
    }

    #[test]
    fn const_checks() {
        let (_, errors) = collect("const A:u8 = [1]");
        assert!(matches!(errors[..], [CheckError::ConstNotArray { .. }]));

        let (_, errors) = collect("const A:[u8 3] = [1 2]");
        assert!(matches!(
            errors[..],
            [CheckError::ConstLength {
                expected: 3,
                found: 2,
                ..
            }]
        ));

        let (_, errors) = collect("const A:[u8 2] = [1 256]");
        assert!(matches!(
            errors[..],
            [CheckError::ConstValueOutOfRange { value: 256, .. }]
        ));
    }

    #[test]
    fn oversized_static_is_not_allocated() {
        let (names, errors) = collect("static BIG:[u8 100000]");
        assert!(errors.is_empty());
        assert!(names.is_empty());
    }
}
