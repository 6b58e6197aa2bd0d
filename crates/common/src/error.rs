//! Value construction errors.

use thiserror::Error;

/// Errors that occur when building widths or values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// Width outside `1..=64`.
    #[error("invalid integer width: {bits} (expected 1..=64)")]
    InvalidWidth { bits: u32 },

    /// Integer does not fit the declared width.
    #[error("value {value} does not fit in u{bits}")]
    OutOfRange { value: u64, bits: u32 },
}
