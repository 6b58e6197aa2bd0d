//! Expression evaluation.
//!
//! Literals take their width from context: the statically known width of
//! the peer operand first, then the width the enclosing construct expects,
//! then `u8`. Index positions expect `u64`. Logical `|`/`&` take each
//! operand on its own and only test it for zero.

use bitlang_common::stack::ensure_sufficient_stack;
use bitlang_common::{BinOp, Expr, ExprKind, Position, Type, Value, Width};

use crate::error::RuntimeError;
use crate::machine::VM;
use crate::ops::{self, Fault};

impl<'a> VM<'a> {
    /// Evaluate an expression to a value.
    pub(crate) fn eval(&mut self, expr: &'a Expr, hint: Option<Width>) -> Result<Value, RuntimeError> {
        ensure_sufficient_stack(|| self.eval_inner(expr, hint))
    }

    fn eval_inner(&mut self, expr: &'a Expr, hint: Option<Width>) -> Result<Value, RuntimeError> {
        match &expr.kind {
            ExprKind::Literal(n) => literal(*n, hint.unwrap_or(Width::U8), expr.at),
            ExprKind::Ident(name) => self.read(name, expr.at).cloned(),
            ExprKind::Index { index, array } => {
                let i = self.eval_index(index)?;
                let value = self.read(array, expr.at)?;
                element(value, array, i, expr.at)
            }
            ExprKind::Binary { op, left, right } => self.eval_binary(*op, left, right, hint, expr.at),
            ExprKind::Call { name, args } => {
                self.call(name, args, expr.at)?
                    .ok_or_else(|| RuntimeError::NoValue {
                        at: expr.at,
                        function: name.clone(),
                    })
            }
        }
    }

    /// Evaluate an expression that must produce a scalar.
    pub(crate) fn eval_scalar(
        &mut self,
        expr: &'a Expr,
        hint: Option<Width>,
    ) -> Result<(Width, u64), RuntimeError> {
        let value = self.eval(expr, hint)?;
        value.as_scalar().ok_or_else(|| RuntimeError::ScalarExpected {
            at: expr.at,
            found: value.type_of(),
        })
    }

    /// Evaluate a scalar and require an exact width.
    pub(crate) fn eval_width(&mut self, expr: &'a Expr, width: Width) -> Result<u64, RuntimeError> {
        let (found, bits) = self.eval_scalar(expr, Some(width))?;
        if found != width {
            return Err(RuntimeError::TypeMismatch {
                at: expr.at,
                expected: Type::Uint(width),
                found: Type::Uint(found),
            });
        }
        Ok(bits)
    }

    /// Evaluate an index expression. Any width is accepted.
    pub(crate) fn eval_index(&mut self, index: &'a Expr) -> Result<u64, RuntimeError> {
        self.eval_scalar(index, Some(Width::U64)).map(|(_, i)| i)
    }

    fn eval_binary(
        &mut self,
        op: BinOp,
        left: &'a Expr,
        right: &'a Expr,
        hint: Option<Width>,
        at: Position,
    ) -> Result<Value, RuntimeError> {
        if op.is_logical() {
            // Both sides are evaluated, left first, whatever the left gives.
            let (_, a) = self.eval_scalar(left, None)?;
            let (_, b) = self.eval_scalar(right, None)?;
            let result = match op {
                BinOp::And => a != 0 && b != 0,
                _ => a != 0 || b != 0,
            };
            return Ok(Value::boolean(result));
        }

        // A comparison's own u1 result says nothing about its operands.
        let outer = if op.yields_bool() { None } else { hint };
        let left_hint = self.static_width(right).or(outer);
        let right_hint = self.static_width(left).or(outer);

        let (lw, a) = self.eval_scalar(left, left_hint)?;
        let (rw, b) = self.eval_scalar(right, right_hint)?;
        if lw != rw {
            return Err(RuntimeError::TypeMismatch {
                at: right.at,
                expected: Type::Uint(lw),
                found: Type::Uint(rw),
            });
        }

        ops::apply(op, lw, a, b, self.config.overflow).map_err(|fault| match fault {
            Fault::DivisionByZero => RuntimeError::DivisionByZero { at },
            Fault::Overflow => RuntimeError::ArithmeticOverflow {
                at,
                op: op.symbol(),
                width: lw,
            },
        })
    }

    /// Width an expression will have, if it can be known without evaluating
    /// it. Literals have no width of their own.
    pub(crate) fn static_width(&self, expr: &Expr) -> Option<Width> {
        ensure_sufficient_stack(|| self.static_width_inner(expr))
    }

    fn static_width_inner(&self, expr: &Expr) -> Option<Width> {
        match &expr.kind {
            ExprKind::Literal(_) => None,
            ExprKind::Ident(name) => self.read(name, expr.at).ok()?.as_scalar().map(|(w, _)| w),
            ExprKind::Index { array, .. } => match self.read(array, expr.at).ok()?.type_of() {
                Type::Array { element, .. } => Some(element),
                Type::Uint(_) => None,
            },
            ExprKind::Binary { op, .. } if op.yields_bool() => Some(Width::BOOL),
            ExprKind::Binary { left, right, .. } => {
                self.static_width(left).or_else(|| self.static_width(right))
            }
            ExprKind::Call { name, .. } => match self.functions.get(name)?.ret? {
                Type::Uint(width) => Some(width),
                Type::Array { .. } => None,
            },
        }
    }
}

fn literal(n: u64, width: Width, at: Position) -> Result<Value, RuntimeError> {
    Value::scalar(width, n).map_err(|_| RuntimeError::LiteralOutOfRange {
        at,
        value: n,
        width,
    })
}

fn element(value: &Value, array: &str, index: u64, at: Position) -> Result<Value, RuntimeError> {
    match value {
        Value::Array { items, .. } => value.element(index).ok_or(RuntimeError::IndexOutOfBounds {
            at,
            array: array.to_string(),
            index,
            len: items.len(),
        }),
        Value::Scalar { .. } => Err(RuntimeError::NotAnArray {
            at,
            name: array.to_string(),
        }),
    }
}
