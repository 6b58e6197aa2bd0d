//! bitlang CLI: check, format, and run bitlang programs.
//!
//! Exit codes:
//! - 0: Success
//! - 1: Input/lex/parse error
//! - 2: Declaration errors
//! - 3: Runtime error
//! - 4: Explicit panic
//!
//! Set `RUST_LOG` (e.g. `RUST_LOG=bitlang_vm=debug`) to trace execution.

mod commands;

use std::process;
use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Install a stderr subscriber, only if `RUST_LOG` is set.
fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_level(true),
                )
                .with(filter)
                .init();
        }
    });
}

fn main() {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "run" => commands::run(&args[2..]),
        "check" => commands::check(&args[2..]),
        "fmt" => commands::fmt(&args[2..]),
        "--help" | "-h" | "help" => {
            print_usage();
            process::exit(0);
        }
        other => {
            eprintln!("error: unknown command '{other}'");
            eprintln!();
            print_usage();
            process::exit(1);
        }
    };

    if let Err(code) = result {
        process::exit(code);
    }
}

fn print_usage() {
    eprintln!("Usage: bitlang <command> [args]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  run <file.bit> [--max-depth N] [--trap-overflow]   Check and execute a program");
    eprintln!("  check <file.bit>                                   Parse and check a program");
    eprintln!("  fmt <file.bit>                                     Print canonical source");
}
