//! Declared types: fixed-width unsigned integers and fixed-length arrays.
//!
//! Types are always declared, never inferred across assignment. A value of
//! width `w` stores an integer in `0..=2^w - 1`.

use std::fmt;

use crate::error::ValueError;
use crate::value::Value;

/// Bit width of an unsigned integer, in `1..=64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Width(u8);

impl Width {
    /// Widest supported integer.
    pub const MAX_BITS: u32 = 64;

    /// Width of comparison and logical results.
    pub const BOOL: Width = Width(1);

    /// Width given to literals with no surrounding context.
    pub const U8: Width = Width(8);

    /// Width given to literals in index position.
    pub const U64: Width = Width(64);

    /// Create a width, rejecting `0` and anything above 64.
    pub fn new(bits: u32) -> Result<Self, ValueError> {
        if (1..=Self::MAX_BITS).contains(&bits) {
            Ok(Width(bits as u8))
        } else {
            Err(ValueError::InvalidWidth { bits })
        }
    }

    /// Number of bits.
    pub fn bits(self) -> u32 {
        self.0 as u32
    }

    /// Largest representable value, `2^w - 1`.
    pub fn max_value(self) -> u64 {
        if self.0 == 64 {
            u64::MAX
        } else {
            (1u64 << self.0) - 1
        }
    }

    /// Returns true if `value` is representable without reduction.
    pub fn fits(self, value: u64) -> bool {
        value <= self.max_value()
    }

    /// Reduce an intermediate result modulo `2^w`.
    pub fn reduce(self, raw: u128) -> u64 {
        (raw & self.max_value() as u128) as u64
    }
}

impl fmt::Display for Width {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "u{}", self.0)
    }
}

/// A declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    /// Scalar unsigned integer.
    Uint(Width),
    /// Array of `len` scalars of width `element`. The length never changes.
    Array { element: Width, len: usize },
}

impl Type {
    /// Scalar width, or the element width for arrays.
    pub fn width(&self) -> Width {
        match self {
            Type::Uint(w) => *w,
            Type::Array { element, .. } => *element,
        }
    }

    /// Zero value of this type: `0` or an array of zeros.
    pub fn zero(&self) -> Value {
        match self {
            Type::Uint(width) => Value::Scalar {
                width: *width,
                bits: 0,
            },
            Type::Array { element, len } => Value::Array {
                element: *element,
                items: vec![0; *len],
            },
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Uint(w) => write!(f, "{w}"),
            Type::Array { element, len } => write!(f, "[{element} {len}]"),
        }
    }
}
