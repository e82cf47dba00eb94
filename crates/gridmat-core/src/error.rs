//! Unified error types for gridmat containers
//!
//! Every fallible operation in the workspace reports a [`GridError`]. The
//! variants mirror the failure classes callers must be able to tell apart:
//!
//! - **Bounds**: a coordinate outside `[0, shape[d])` ([`GridError::OutOfBounds`])
//! - **Shape mismatch**: incompatible operand or target shapes
//! - **Type conversion**: a typed accessor cannot represent the native value
//! - **In-place resize**: an ORIG materialisation of a shape-changing calculation
//!
//! Sparse eviction is deliberately absent: dropping an entry when the capacity
//! cap is reached is normal behaviour, not a failure.
//!
//! # Examples
//!
//! ```
//! use gridmat_core::error::{GridError, GridResult};
//!
//! fn check_rank(shape: &[i64]) -> GridResult<()> {
//!     if shape.len() < 2 {
//!         return Err(GridError::invalid_shape(format!(
//!             "containers need at least 2 dimensions, got {}",
//!             shape.len()
//!         )));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_rank(&[3]).is_err());
//! assert!(check_rank(&[3, 4]).is_ok());
//! ```

use crate::element::ElementKind;
use thiserror::Error;

/// Top-level error type for all container operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    /// Coordinate outside the container's shape
    #[error("Index out of bounds: coordinate {coordinate:?} exceeds shape {shape:?}")]
    OutOfBounds {
        coordinate: Vec<i64>,
        shape: Vec<i64>,
    },

    /// Coordinate rank differs from the container rank
    #[error("Dimension mismatch: expected {expected}D coordinate, got {got}D")]
    DimensionMismatch { expected: usize, got: usize },

    /// Operand or target shapes are incompatible
    #[error("Shape mismatch in {operation}: {left:?} vs {right:?}")]
    ShapeMismatch {
        operation: String,
        left: Vec<i64>,
        right: Vec<i64>,
    },

    /// A value cannot be represented in the requested element kind
    #[error("Cannot convert {value} ({from:?}) to {to:?}")]
    TypeConversion {
        from: ElementKind,
        to: ElementKind,
        value: String,
    },

    /// Shape is not acceptable for the requested container
    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    /// ORIG materialisation of a calculation whose output shape differs from its source
    #[error("Cannot resize in place: source shape {source_shape:?}, result shape {result_shape:?}")]
    CannotResizeInPlace {
        source_shape: Vec<i64>,
        result_shape: Vec<i64>,
    },

    /// Write attempted on a container that only supports reads
    #[error("Container is read-only: {0}")]
    ReadOnly(String),

    /// Operation not supported for the given element or storage kind
    #[error("Unsupported operation {operation} for {kind}")]
    Unsupported { operation: String, kind: String },

    /// No registered backend can serve the request
    #[error("Backend unavailable for {request}: {reason}")]
    BackendUnavailable { request: String, reason: String },

    /// Text could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Result type alias for container operations
pub type GridResult<T> = Result<T, GridError>;

impl GridError {
    /// Create an out-of-bounds error
    pub fn out_of_bounds(coordinate: &[i64], shape: &[i64]) -> Self {
        GridError::OutOfBounds {
            coordinate: coordinate.to_vec(),
            shape: shape.to_vec(),
        }
    }

    /// Create a shape mismatch error for a named operation
    pub fn shape_mismatch(operation: impl Into<String>, left: &[i64], right: &[i64]) -> Self {
        GridError::ShapeMismatch {
            operation: operation.into(),
            left: left.to_vec(),
            right: right.to_vec(),
        }
    }

    /// Create a type conversion error
    pub fn conversion(from: ElementKind, to: ElementKind, value: impl ToString) -> Self {
        GridError::TypeConversion {
            from,
            to,
            value: value.to_string(),
        }
    }

    /// Create an invalid shape error
    pub fn invalid_shape(msg: impl Into<String>) -> Self {
        GridError::InvalidShape(msg.into())
    }

    /// Create an unsupported-operation error
    pub fn unsupported(operation: impl Into<String>, kind: impl ToString) -> Self {
        GridError::Unsupported {
            operation: operation.into(),
            kind: kind.to_string(),
        }
    }

    /// Whether this error is a bounds violation
    pub fn is_out_of_bounds(&self) -> bool {
        matches!(self, GridError::OutOfBounds { .. })
    }
}
