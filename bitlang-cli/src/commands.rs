//! CLI command implementations.

use std::fs;

use bitlang_vm::{Error, ErrorKind, OverflowPolicy, VmConfig};

/// Parse, check and execute a program, then print every slot.
pub fn run(args: &[String]) -> Result<(), i32> {
    if args.is_empty() {
        eprintln!("error: run requires an input file");
        eprintln!("Usage: bitlang run <file.bit> [--max-depth N] [--trap-overflow]");
        return Err(1);
    }

    let input = &args[0];
    let config = parse_run_flags(&args[1..])?;
    let source = read_source(input)?;

    match bitlang_vm::run_source(&source, &config) {
        Ok(memory) => {
            print!("{memory}");
            Ok(())
        }
        Err(e) => Err(report(&e)),
    }
}

/// Parse and check a program without running it.
pub fn check(args: &[String]) -> Result<(), i32> {
    if args.is_empty() {
        eprintln!("error: check requires an input file");
        eprintln!("Usage: bitlang check <file.bit>");
        return Err(1);
    }

    let input = &args[0];
    let source = read_source(input)?;
    let program = bitlang_syntax::parse(&source).map_err(|e| report(&Error::from(e)))?;

    match bitlang_checker::check(&program) {
        Ok(decls) => {
            println!(
                "OK: {input} ({} functions, {} slots, {} top-level statements)",
                decls.functions.len(),
                decls.statics.len(),
                program.statements().count()
            );
            Ok(())
        }
        Err(errors) => Err(report(&Error::from(errors))),
    }
}

/// Print a program in canonical form.
pub fn fmt(args: &[String]) -> Result<(), i32> {
    if args.is_empty() {
        eprintln!("error: fmt requires an input file");
        eprintln!("Usage: bitlang fmt <file.bit>");
        return Err(1);
    }

    let input = &args[0];
    let source = read_source(input)?;
    let program = bitlang_syntax::parse(&source).map_err(|e| report(&Error::from(e)))?;
    print!("{}", bitlang_syntax::print(&program));
    Ok(())
}

fn parse_run_flags(flags: &[String]) -> Result<VmConfig, i32> {
    let mut config = VmConfig::default();
    let mut i = 0;

    while i < flags.len() {
        match flags[i].as_str() {
            "--max-depth" => {
                let value = flags.get(i + 1).ok_or_else(|| {
                    eprintln!("error: --max-depth requires a value");
                    1
                })?;
                let depth = value.parse::<usize>().map_err(|_| {
                    eprintln!("error: invalid --max-depth '{value}'");
                    1
                })?;
                config = config.with_max_call_depth(depth);
                i += 2;
            }
            "--trap-overflow" => {
                config = config.with_overflow(OverflowPolicy::Trap);
                i += 1;
            }
            other => {
                eprintln!("error: unknown flag '{other}'");
                return Err(1);
            }
        }
    }

    Ok(config)
}

fn read_source(path: &str) -> Result<String, i32> {
    fs::read_to_string(path).map_err(|e| {
        eprintln!("error: cannot read '{path}': {e}");
        1
    })
}

/// Print an error to stderr and return its exit code.
fn report(e: &Error) -> i32 {
    eprintln!("{e}");
    exit_code(e.kind())
}

fn exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Lex | ErrorKind::Parse => 1,
        ErrorKind::Declaration => 2,
        ErrorKind::Runtime => 3,
        ErrorKind::ExplicitPanic => 4,
    }
}
