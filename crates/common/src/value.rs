//! Runtime value representation.
//!
//! Values live in call frames and in the static environment. Scalars are
//! always stored reduced to their width; arrays never change length.

use std::fmt;

use crate::error::ValueError;
use crate::types::{Type, Width};

/// Runtime value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// Unsigned integer of the given width. `bits <= width.max_value()`.
    Scalar { width: Width, bits: u64 },
    /// Fixed-length array of scalars sharing one width.
    Array { element: Width, items: Vec<u64> },
}

impl Value {
    /// Build a scalar, rejecting values that do not fit.
    pub fn scalar(width: Width, bits: u64) -> Result<Self, ValueError> {
        if width.fits(bits) {
            Ok(Value::Scalar { width, bits })
        } else {
            Err(ValueError::OutOfRange {
                value: bits,
                bits: width.bits(),
            })
        }
    }

    /// Build a scalar from an intermediate result, reducing modulo `2^width`.
    pub fn wrapped(width: Width, raw: u128) -> Self {
        Value::Scalar {
            width,
            bits: width.reduce(raw),
        }
    }

    /// `1` or `0` as a `u1`.
    pub fn boolean(b: bool) -> Self {
        Value::Scalar {
            width: Width::BOOL,
            bits: b as u64,
        }
    }

    /// Build an array, rejecting any element that does not fit.
    pub fn array(element: Width, items: Vec<u64>) -> Result<Self, ValueError> {
        if let Some(&bad) = items.iter().find(|&&item| !element.fits(item)) {
            return Err(ValueError::OutOfRange {
                value: bad,
                bits: element.bits(),
            });
        }
        Ok(Value::Array { element, items })
    }

    /// Type of this value.
    pub fn type_of(&self) -> Type {
        match self {
            Value::Scalar { width, .. } => Type::Uint(*width),
            Value::Array { element, items } => Type::Array {
                element: *element,
                len: items.len(),
            },
        }
    }

    /// Width and payload of a scalar.
    pub fn as_scalar(&self) -> Option<(Width, u64)> {
        match self {
            Value::Scalar { width, bits } => Some((*width, *bits)),
            Value::Array { .. } => None,
        }
    }

    /// Element at `index`, as a scalar.
    pub fn element(&self, index: u64) -> Option<Value> {
        match self {
            Value::Array { element, items } => {
                let bits = *items.get(usize::try_from(index).ok()?)?;
                Some(Value::Scalar {
                    width: *element,
                    bits,
                })
            }
            Value::Scalar { .. } => None,
        }
    }

    /// Overwrite the element at `index`. Returns false if out of range.
    ///
    /// The caller guarantees `bits` fits the element width.
    pub fn set_element(&mut self, index: u64, bits: u64) -> bool {
        match self {
            Value::Array { items, .. } => {
                match usize::try_from(index).ok().and_then(|i| items.get_mut(i)) {
                    Some(slot) => {
                        *slot = bits;
                        true
                    }
                    None => false,
                }
            }
            Value::Scalar { .. } => false,
        }
    }

    /// Nonzero scalars are true. Arrays are never used as conditions.
    pub fn is_truthy(&self) -> bool {
        matches!(self, Value::Scalar { bits, .. } if *bits != 0)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar { bits, .. } => write!(f, "{bits}"),
            Value::Array { items, .. } => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u8w() -> Width {
        Width::U8
    }

    #[test]
    fn scalar_rejects_out_of_range() {
        assert!(Value::scalar(u8w(), 255).is_ok());
        assert_eq!(
            Value::scalar(u8w(), 256),
            Err(ValueError::OutOfRange {
                value: 256,
                bits: 8
            })
        );
    }

    #[test]
    fn wrapped_reduces() {
        assert_eq!(Value::wrapped(u8w(), 256 + 44), Value::scalar(u8w(), 44).unwrap());
    }

    #[test]
    fn boolean_is_u1() {
        assert_eq!(Value::boolean(true).type_of(), Type::Uint(Width::BOOL));
        assert_eq!(Value::boolean(false).as_scalar(), Some((Width::BOOL, 0)));
    }

    #[test]
    fn array_checks_elements() {
        assert!(Value::array(u8w(), vec![1, 2, 255]).is_ok());
        assert!(Value::array(u8w(), vec![1, 256]).is_err());
    }

    #[test]
    fn element_access() {
        let mut arr = Value::array(u8w(), vec![10, 20, 30]).unwrap();
        assert_eq!(arr.element(1), Some(Value::scalar(u8w(), 20).unwrap()));
        assert_eq!(arr.element(3), None);
        assert!(arr.set_element(2, 99));
        assert!(!arr.set_element(3, 1));
        assert_eq!(arr.element(2), Some(Value::scalar(u8w(), 99).unwrap()));
    }

    #[test]
    fn scalar_has_no_elements() {
        let mut s = Value::scalar(u8w(), 1).unwrap();
        assert_eq!(s.element(0), None);
        assert!(!s.set_element(0, 1));
    }

    #[test]
    fn truthiness() {
        assert!(Value::scalar(u8w(), 7).unwrap().is_truthy());
        assert!(!Value::scalar(u8w(), 0).unwrap().is_truthy());
        assert!(!Value::array(u8w(), vec![1]).unwrap().is_truthy());
    }

    #[test]
    fn display() {
        assert_eq!(Value::scalar(u8w(), 233).unwrap().to_string(), "233");
        assert_eq!(
            Value::array(u8w(), vec![1, 2, 3]).unwrap().to_string(),
            "[1, 2, 3]"
        );
    }

    #[test]
    fn type_of_array() {
        let arr = Value::array(u8w(), vec![0; 14]).unwrap();
        assert_eq!(
            arr.type_of(),
            Type::Array {
                element: u8w(),
                len: 14
            }
        );
    }
}
