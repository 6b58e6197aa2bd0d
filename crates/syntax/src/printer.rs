//! Printer: syntax tree → canonical source text.
//!
//! Four-space indentation, decimal literals, one statement per line and a
//! blank line around every function. Comments and `;` separators are not
//! preserved. Parsing the output yields the same tree up to positions.

use std::fmt::Write;

use bitlang_common::ast::{Block, Expr, ExprKind, Function, Item, Place, Program, StmtKind};
use bitlang_common::stack::ensure_sufficient_stack;

const INDENT: &str = "    ";

/// Render a program as canonical source text.
pub(crate) fn print_program(program: &Program) -> String {
    let mut out = String::new();
    let mut prev_was_fn = false;

    for (i, item) in program.items.iter().enumerate() {
        let is_fn = matches!(item, Item::Function(_));
        if i > 0 && (is_fn || prev_was_fn) {
            out.push('\n');
        }
        match item {
            Item::Function(f) => print_function(&mut out, f),
            Item::Static(s) => {
                let _ = writeln!(out, "static {}:{}", s.name, s.ty);
            }
            Item::Const(c) => {
                let values: Vec<String> = c.values.iter().map(u64::to_string).collect();
                let _ = writeln!(out, "const {}:{} = [{}]", c.name, c.ty, values.join(" "));
            }
            Item::Statement(stmt) => print_statement(&mut out, &stmt.kind, 0),
        }
        prev_was_fn = is_fn;
    }

    out
}

fn print_function(out: &mut String, f: &Function) {
    out.push_str("fn ");
    out.push_str(&f.name);
    if !f.params.is_empty() {
        let params: Vec<String> = f
            .params
            .iter()
            .map(|p| format!("{}:{}", p.name, p.ty))
            .collect();
        let _ = write!(out, "({})", params.join(" "));
    }
    if let Some(ret) = &f.ret {
        let _ = write!(out, ":{ret}");
    }
    out.push(' ');
    print_block(out, &f.body, 0);
    out.push('\n');
}

/// Writes `{`, the statements one level deeper, and `}` without a newline.
fn print_block(out: &mut String, block: &Block, depth: usize) {
    out.push_str("{\n");
    for stmt in block {
        print_statement(out, &stmt.kind, depth + 1);
    }
    indent(out, depth);
    out.push('}');
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

fn print_statement(out: &mut String, kind: &StmtKind, depth: usize) {
    ensure_sufficient_stack(|| print_statement_inner(out, kind, depth));
}

fn print_statement_inner(out: &mut String, kind: &StmtKind, depth: usize) {
    indent(out, depth);

    match kind {
        StmtKind::Let { name, ty, value } => {
            let _ = write!(out, "let {name}:{ty} = {}", expr_text(value));
        }
        StmtKind::Static(s) => {
            let _ = write!(out, "static {}:{}", s.name, s.ty);
        }
        StmtKind::Assign { op, place, value } => {
            let _ = write!(
                out,
                "({} {} {})",
                op.symbol(),
                place_text(place),
                expr_text(value)
            );
        }
        StmtKind::If { .. } => print_if(out, kind, depth),
        StmtKind::For {
            var,
            ty,
            start,
            end,
            body,
        } => {
            let _ = write!(
                out,
                "for {var}:{ty} in {}..{} ",
                expr_text(start),
                expr_text(end)
            );
            print_block(out, body, depth);
        }
        StmtKind::Loop(body) => {
            out.push_str("loop ");
            print_block(out, body, depth);
        }
        StmtKind::Break => out.push_str("break"),
        StmtKind::Continue => out.push_str("continue"),
        StmtKind::Return(None) => out.push_str("return"),
        StmtKind::Return(Some(value)) => {
            let _ = write!(out, "return {}", expr_text(value));
        }
        StmtKind::Panic => out.push_str("!!"),
        StmtKind::Expr(e) => out.push_str(&expr_text(e)),
    }

    out.push('\n');
}

/// `if` chains print as `} else if .. {` when an else block is a lone `if`.
fn print_if(out: &mut String, kind: &StmtKind, depth: usize) {
    let StmtKind::If {
        cond,
        then,
        otherwise,
    } = kind
    else {
        return;
    };

    let _ = write!(out, "if {} ", expr_text(cond));
    print_block(out, then, depth);

    match otherwise.as_deref() {
        None => {}
        Some([single]) if matches!(single.kind, StmtKind::If { .. }) => {
            out.push_str(" else ");
            ensure_sufficient_stack(|| print_if(out, &single.kind, depth));
        }
        Some(block) => {
            out.push_str(" else {\n");
            for stmt in block {
                print_statement(out, &stmt.kind, depth + 1);
            }
            indent(out, depth);
            out.push('}');
        }
    }
}

fn place_text(place: &Place) -> String {
    match place {
        Place::Var(name) => name.clone(),
        Place::Element { index, array } => format!("[{}]{array}", expr_text(index)),
    }
}

fn expr_text(expr: &Expr) -> String {
    ensure_sufficient_stack(|| expr_text_inner(expr))
}

fn expr_text_inner(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Literal(n) => n.to_string(),
        ExprKind::Ident(name) => name.clone(),
        ExprKind::Index { index, array } => format!("[{}]{array}", expr_text(index)),
        ExprKind::Binary { op, left, right } => {
            format!("({} {} {})", op.symbol(), expr_text(left), expr_text(right))
        }
        ExprKind::Call { name, args } => {
            let mut text = format!("({name}");
            for arg in args {
                text.push(' ');
                text.push_str(&expr_text(arg));
            }
            text.push(')');
            text
        }
    }
}
