//! Error types shared by every array kind

use thiserror::Error;

use crate::alloc::AllocError;
use crate::operator::LargeArrayOperator;
use crate::types::LargeArrayType;

/// Error type for large arrays
#[derive(Error, Debug)]
pub enum LargeArrayError {
    /// An argument was outside of the accepted domain
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// An index or slice bound fell outside of the array
    #[error("index {index} out of range for length {length}")]
    IndexOutOfRange {
        /// Offending index
        index: i64,
        /// Length of the array
        length: i64,
    },
    /// Two array kinds (or element classes) did not agree
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// What the operation required
        expected: String,
        /// What it was given
        found: String,
    },
    /// Accessor not defined for this element kind
    #[error("operation `{operation}` is not supported for {element_type:?} arrays")]
    UnsupportedOperation {
        /// Name of the rejected accessor
        operation: &'static str,
        /// Element kind of the array
        element_type: LargeArrayType,
    },
    /// Operator not defined for an operand's capability set
    #[error("operator {operator:?} is not supported for {element_type:?} arrays")]
    UnsupportedOperator {
        /// The operator being evaluated
        operator: LargeArrayOperator,
        /// Element kind of the rejected operand
        element_type: LargeArrayType,
    },
    /// A serialized element does not fit its slot
    #[error("element of {size} bytes exceeds the maximum of {max}")]
    ElementTooLarge {
        /// Encoded size of the element
        size: usize,
        /// Slot capacity
        max: usize,
    },
    /// Operands of an operator have different lengths
    #[error("dimension mismatch: expected length {expected}, found {found}")]
    DimensionMismatch {
        /// Length of the first operand
        expected: i64,
        /// Length of the offending operand
        found: i64,
    },
    /// Raw memory allocation failed
    #[error("memory allocation failed")]
    OutOfMemory(#[from] AllocError),
    /// Reading or writing an array stream failed
    #[error("stream error: {0}")]
    Io(#[from] std::io::Error),
}

impl LargeArrayError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub(crate) fn unsupported(operation: &'static str, element_type: LargeArrayType) -> Self {
        Self::UnsupportedOperation {
            operation,
            element_type,
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T, E = LargeArrayError> = std::result::Result<T, E>;
