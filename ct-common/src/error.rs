//! Error types shared by the primitives and the data model.

use thiserror::Error;

/// Result type alias for primitive operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Poseidon is instantiated for 1 to 5 inputs only.
    #[error("poseidon arity {0} is not supported (expected 1..=5)")]
    UnsupportedArity(usize),

    #[error("invalid bn256 scalar encoding")]
    InvalidScalarEncoding,

    #[error("field element does not fit in {0}")]
    Overflow(&'static str),

    #[error("invalid decimal field element: {0}")]
    InvalidDecimal(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("point is not on the Baby Jubjub curve")]
    NotOnCurve,

    #[error("point addition hit a vanishing denominator")]
    DegenerateAddition,

    #[error("point is outside the prime-order subgroup")]
    NotInSubgroup,

    /// An index appears more than once in a removal set.
    #[error("duplicate index {0}")]
    DuplicateIndex(usize),

    #[error("index {index} is out of bounds for a queue of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("{count} indexes exceed the per-call limit of {max}")]
    TooManyIndexes { count: usize, max: usize },

    #[error("{circuit} proof carries {actual} public signals, expected at least {expected}")]
    SignalCount {
        circuit: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{circuit} expects {expected} outputs, got {actual}")]
    OutputArity {
        circuit: &'static str,
        expected: usize,
        actual: usize,
    },
}
