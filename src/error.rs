//! Error types for numr-where

use crate::dtype::DType;
use thiserror::Error;

/// Result type alias using numr-where's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in numr-where operations
#[derive(Error, Debug)]
pub enum Error {
    /// Dtype, or dtype combination, not supported by an operation
    #[error("Unsupported dtype for '{op}': {reason}")]
    UnsupportedType {
        /// The operation name
        op: &'static str,
        /// What was unsupported
        reason: String,
    },

    /// Shapes cannot be broadcast together
    #[error("Cannot broadcast shapes {shapes:?}")]
    IncompatibleShapes {
        /// Every shape taking part in the broadcast
        shapes: Vec<Vec<usize>>,
    },

    /// Operands use memory orders that cannot be reconciled
    #[error("Mismatched memory layout for '{op}': {reason}")]
    MismatchedLayout {
        /// The operation name
        op: &'static str,
        /// Description of the mismatch
        reason: String,
    },

    /// Output tensor could not be resized
    #[error("Cannot resize tensor from {from:?} to {to:?}: {reason}")]
    ResizeFailed {
        /// Shape before the resize
        from: Vec<usize>,
        /// Requested shape
        to: Vec<usize>,
        /// Why the resize was rejected
        reason: &'static str,
    },

    /// Shape mismatch when constructing a tensor
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected shape
        expected: Vec<usize>,
        /// Actual shape
        got: Vec<usize>,
    },

    /// DType mismatch between a tensor and the requested element type
    #[error("DType mismatch: {lhs:?} vs {rhs:?}")]
    DTypeMismatch {
        /// Left-hand side dtype
        lhs: DType,
        /// Right-hand side dtype
        rhs: DType,
    },

    /// Invalid dimension index
    #[error("Invalid dimension {dim} for tensor with {ndim} dimensions")]
    InvalidDimension {
        /// The invalid dimension
        dim: isize,
        /// Number of dimensions
        ndim: usize,
    },

    /// Invalid argument provided to an operation
    #[error("Invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// The argument name
        arg: &'static str,
        /// Reason for invalidity
        reason: String,
    },
}

impl Error {
    /// Create a shape mismatch error
    pub fn shape_mismatch(expected: &[usize], got: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            got: got.to_vec(),
        }
    }

    /// Create a broadcast error listing every participating shape
    pub fn incompatible_shapes(shapes: &[&[usize]]) -> Self {
        Self::IncompatibleShapes {
            shapes: shapes.iter().map(|s| s.to_vec()).collect(),
        }
    }

    /// Create an unsupported dtype error
    pub fn unsupported_type(op: &'static str, reason: impl Into<String>) -> Self {
        Self::UnsupportedType {
            op,
            reason: reason.into(),
        }
    }

    /// Create a layout mismatch error
    pub fn mismatched_layout(op: &'static str, reason: impl Into<String>) -> Self {
        Self::MismatchedLayout {
            op,
            reason: reason.into(),
        }
    }

    /// Create a resize error
    pub fn resize_failed(from: &[usize], to: &[usize], reason: &'static str) -> Self {
        Self::ResizeFailed {
            from: from.to_vec(),
            to: to.to_vec(),
            reason,
        }
    }
}
