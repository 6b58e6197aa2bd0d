//! Integration tests for the bitlang checker.
//!
//! Tests cover:
//! - The sample programs pass and register the expected slots
//! - Function statics are allocated once, per function
//! - Errors from several declarations are all reported

use bitlang_checker::{check, CheckError};
use bitlang_common::{Position, Type, Value, Width};
use bitlang_syntax::parse;

fn program(name: &str) -> bitlang_common::Program {
    let path = format!("{}/../../tests/programs/{name}.bit", env!("CARGO_MANIFEST_DIR"));
    let src = std::fs::read_to_string(&path).unwrap();
    parse(&src).unwrap()
}

#[test]
fn accept_all_sample_programs() {
    for name in ["mul", "div", "fibonacci", "fibonacci_overflow", "tree_depth"] {
        let p = program(name);
        if let Err(errors) = check(&p) {
            panic!("{name}: {errors:?}");
        }
    }
}

#[test]
fn fibonacci_cache_is_registered_before_any_call() {
    let p = program("fibonacci");
    let decls = check(&p).unwrap();
    assert_eq!(
        decls.statics.local("fibonacci", "CACHE"),
        Some(&Value::array(Width::U8, vec![0; 13]).unwrap())
    );
    assert_eq!(decls.statics.local("fibonacci", "RESULT"), None);
}

#[test]
fn tree_depth_slots() {
    let p = program("tree_depth");
    let decls = check(&p).unwrap();

    let names: Vec<String> = decls.statics.slots().map(|(name, _)| name).collect();
    assert_eq!(names, ["CURSOR", "RESULT", "TREE"]);

    let tree = decls.statics.constant("TREE").unwrap();
    assert_eq!(
        tree.type_of(),
        Type::Array {
            element: Width::U8,
            len: 23
        }
    );
    assert!(decls.statics.is_constant("TREE"));
    assert!(!decls.statics.is_constant("CURSOR"));
    assert_eq!(decls.functions.len(), 2);
}

#[test]
fn function_table_lookup() {
    let p = program("mul");
    let decls = check(&p).unwrap();
    let mul = decls.functions.get("mul").unwrap();
    assert_eq!(mul.params.len(), 2);
    assert_eq!(mul.ret, Some(Type::Uint(Width::U8)));
    assert!(decls.functions.get("div").is_none());
}

#[test]
fn reject_and_report_every_error() {
    let src = "\
static R:u8
fn f:u8 { return (g) }
fn f:u8 { return 0 }
const R:[u8 1] = [0]
(= R (+ x 1))
";
    let errors = check(&parse(src).unwrap()).unwrap_err();
    assert_eq!(
        errors,
        vec![
            CheckError::DuplicateFunction {
                at: Position::new(3, 1),
                name: "f".into(),
            },
            CheckError::DuplicateGlobal {
                at: Position::new(4, 1),
                name: "R".into(),
            },
            CheckError::UndefinedFunction {
                at: Position::new(2, 18),
                name: "g".into(),
            },
            CheckError::UndefinedIdentifier {
                at: Position::new(5, 9),
                name: "x".into(),
            },
        ]
    );
}

#[test]
fn error_messages_carry_positions() {
    let errors = check(&parse("const T:[u8 1] = [1]\n(+= [0]T 1)").unwrap()).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].to_string(), "2:1: cannot assign to const 'T'");
}
