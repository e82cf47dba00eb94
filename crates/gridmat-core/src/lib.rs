//! # gridmat-core
//!
//! Coordinates, element kinds, dense and block storage, labels, and the shared
//! container handle for gridmat.
//!
//! This crate provides the building blocks every other gridmat crate works
//! against:
//!
//! - **Coordinates** ([`Coordinate`]) addressing cells of any rank
//! - **Element kinds** ([`ElementKind`], [`Value`], [`Element`]) with
//!   widen-always / narrow-by-cast conversion rules
//! - **The container contract** ([`Container`]) implemented by every storage
//! - **Dense storage** ([`DenseND`]) with O(1) row- or column-major addressing
//! - **Block storage** ([`BlockMatrix`], [`BlockLayout`]) for cache-friendly
//!   matrix products on large 2-D data
//! - **Labels** ([`Annotation`]) carried beside the cells
//! - **Shared handles** ([`Matrix`]) that calculations and views hold on to
//!
//! ## Quick Start
//!
//! ```
//! use gridmat_core::{Container, Coordinate, DenseND, Layout, Value};
//!
//! let mut m = DenseND::<f64>::with_layout(&[3, 4], Layout::ColumnMajor);
//! m.set(&[2, 1], 1.5).unwrap();
//!
//! assert_eq!(m.shape(), &Coordinate::from([3, 4]));
//! assert_eq!(m.get_as_int(&[2, 1]).unwrap(), 1);
//! assert_eq!(m.get_value(&[0, 0]).unwrap(), Value::Double(0.0));
//! assert!(m.get_value(&[3, 0]).is_err());
//! ```
//!
//! ## Typed Access
//!
//! Every container answers every typed accessor. Widening conversions always
//! succeed, narrowing ones truncate like a cast, and values that cannot be
//! represented fail with [`GridError::TypeConversion`]:
//!
//! ```
//! use gridmat_core::{Container, DenseND, GridError};
//!
//! let mut names = DenseND::<String>::zeros(&[1, 2]);
//! names.set(&[0, 0], "42".to_string()).unwrap();
//! names.set(&[0, 1], "n/a".to_string()).unwrap();
//!
//! assert_eq!(names.get_as_double(&[0, 0]).unwrap(), 42.0);
//! assert!(matches!(
//!     names.get_as_double(&[0, 1]),
//!     Err(GridError::TypeConversion { .. })
//! ));
//! ```
//!
//! ## Features
//!
//! - `serde`: Enable serialization/deserialization support

#![deny(warnings)]

pub mod annotation;
pub mod block;
pub mod container;
pub mod coordinate;
pub mod dense;
pub mod element;
pub mod error;
pub mod handle;

#[cfg(test)]
mod property_tests;

pub use annotation::Annotation;
pub use bigdecimal::BigDecimal;
pub use block::{BlockLayout, BlockMatrix, BlockOrder, DEFAULT_BLOCK_SIDE};
pub use container::{BufferView, Container, Layout, StorageKind};
pub use coordinate::{Coordinate, CoordinateIter, Dimension, COLUMN, ROW};
pub use dense::DenseND;
pub use element::{Element, ElementKind, Value};
pub use error::{GridError, GridResult};
pub use handle::{AvailableCoordinates, Matrix};
pub use num_bigint::BigInt;
