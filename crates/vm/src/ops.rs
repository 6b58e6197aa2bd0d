//! Operator semantics on unsigned scalars of one width.
//!
//! Both operands are already reduced to `width`. Arithmetic results are
//! reduced modulo 2^width under [`OverflowPolicy::Wrap`] and fault under
//! [`OverflowPolicy::Trap`]. Comparisons and logical `|`/`&` yield `u1`.

use bitlang_common::{BinOp, Value, Width};

use crate::config::OverflowPolicy;

/// Why an operator could not produce a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    DivisionByZero,
    Overflow,
}

/// Apply `op` to two scalars of `width`.
pub fn apply(
    op: BinOp,
    width: Width,
    a: u64,
    b: u64,
    policy: OverflowPolicy,
) -> Result<Value, Fault> {
    let (a128, b128) = (u128::from(a), u128::from(b));

    let raw: u128 = match op {
        BinOp::Add => a128 + b128,
        BinOp::Mul => a128 * b128,
        BinOp::Sub => {
            if a < b && policy == OverflowPolicy::Trap {
                return Err(Fault::Overflow);
            }
            return Ok(Value::wrapped(width, u128::from(a.wrapping_sub(b))));
        }
        BinOp::Div | BinOp::Rem if b == 0 => return Err(Fault::DivisionByZero),
        BinOp::Div => a128 / b128,
        BinOp::Rem => a128 % b128,
        BinOp::Xor => a128 ^ b128,
        // Shifting by the width or more clears every bit. Shifts never trap.
        BinOp::Shl if b >= u64::from(width.bits()) => 0,
        BinOp::Shr if b >= u64::from(width.bits()) => 0,
        BinOp::Shl => return Ok(Value::wrapped(width, a128 << b)),
        BinOp::Shr => a128 >> b,
        BinOp::Or => return Ok(Value::boolean(a != 0 || b != 0)),
        BinOp::And => return Ok(Value::boolean(a != 0 && b != 0)),
        BinOp::Eq => return Ok(Value::boolean(a == b)),
        BinOp::Ne => return Ok(Value::boolean(a != b)),
        BinOp::Lt => return Ok(Value::boolean(a < b)),
        BinOp::Le => return Ok(Value::boolean(a <= b)),
        BinOp::Gt => return Ok(Value::boolean(a > b)),
        BinOp::Ge => return Ok(Value::boolean(a >= b)),
    };

    if policy == OverflowPolicy::Trap && raw > u128::from(width.max_value()) {
        return Err(Fault::Overflow);
    }
    Ok(Value::wrapped(width, raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap(op: BinOp, a: u64, b: u64) -> u64 {
        match apply(op, Width::U8, a, b, OverflowPolicy::Wrap).unwrap() {
            Value::Scalar { bits, .. } => bits,
            other => panic!("expected scalar, got {other:?}"),
        }
    }

    #[test]
    fn arithmetic_wraps_at_width() {
        assert_eq!(wrap(BinOp::Add, 250, 10), 4);
        assert_eq!(wrap(BinOp::Sub, 3, 5), 254);
        assert_eq!(wrap(BinOp::Mul, 16, 16), 0);
        assert_eq!(wrap(BinOp::Mul, 15, 15), 225);
    }

    #[test]
    fn full_width_arithmetic() {
        let w = Width::U64;
        assert_eq!(
            apply(BinOp::Add, w, u64::MAX, 1, OverflowPolicy::Wrap),
            Ok(Value::wrapped(w, 0))
        );
        assert_eq!(
            apply(BinOp::Mul, w, u64::MAX, u64::MAX, OverflowPolicy::Wrap),
            Ok(Value::wrapped(w, 1))
        );
    }

    #[test]
    fn division_and_remainder() {
        assert_eq!(wrap(BinOp::Div, 225, 5), 45);
        assert_eq!(wrap(BinOp::Rem, 17, 5), 2);
        assert_eq!(
            apply(BinOp::Div, Width::U8, 1, 0, OverflowPolicy::Wrap),
            Err(Fault::DivisionByZero)
        );
        assert_eq!(
            apply(BinOp::Rem, Width::U8, 1, 0, OverflowPolicy::Wrap),
            Err(Fault::DivisionByZero)
        );
    }

    #[test]
    fn shifts() {
        assert_eq!(wrap(BinOp::Shl, 0b1000_0001, 1), 0b0000_0010);
        assert_eq!(wrap(BinOp::Shr, 0b1000_0000, 7), 1);
        assert_eq!(wrap(BinOp::Shl, 1, 8), 0);
        assert_eq!(wrap(BinOp::Shr, 255, 200), 0);
    }

    #[test]
    fn comparisons_yield_u1() {
        let v = apply(BinOp::Lt, Width::U8, 1, 2, OverflowPolicy::Wrap).unwrap();
        assert_eq!(v, Value::boolean(true));
        assert_eq!(v.type_of(), bitlang_common::Type::Uint(Width::BOOL));
        assert_eq!(wrap(BinOp::Ge, 1, 2), 0);
        assert_eq!(wrap(BinOp::Ne, 1, 2), 1);
    }

    #[test]
    fn logical_operators_treat_nonzero_as_true() {
        assert_eq!(wrap(BinOp::Or, 0, 7), 1);
        assert_eq!(wrap(BinOp::And, 3, 7), 1);
        assert_eq!(wrap(BinOp::And, 0, 7), 0);
        assert_eq!(wrap(BinOp::Xor, 0b1100, 0b1010), 0b0110);
    }

    #[test]
    fn trap_policy_faults_on_overflow() {
        let trap = OverflowPolicy::Trap;
        assert_eq!(apply(BinOp::Add, Width::U8, 250, 10, trap), Err(Fault::Overflow));
        assert_eq!(apply(BinOp::Sub, Width::U8, 3, 5, trap), Err(Fault::Overflow));
        assert_eq!(apply(BinOp::Mul, Width::U8, 16, 16, trap), Err(Fault::Overflow));
        assert_eq!(
            apply(BinOp::Add, Width::U8, 250, 5, trap),
            Ok(Value::wrapped(Width::U8, 255))
        );
    }
}
