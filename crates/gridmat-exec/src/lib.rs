//! # gridmat-exec
//!
//! Construction and computation for gridmat containers.
//!
//! This crate provides:
//! - [`MatrixFactory`] - the single entry point for allocating containers,
//!   steered by [`FactoryHints`]
//! - [`Calculation`] - per-cell functions over source containers, with the
//!   three materialisation modes of [`CalculationExt`]: `calc_new`,
//!   `calc_link` and `calc_orig`
//! - [`ops`] - the calculation catalogue (arithmetic, comparisons, logic,
//!   maps, reductions, centering, transpose, matrix product, conversion)
//! - [`BackendRegistry`] - pluggable decomposition backends
//!
//! # Example
//!
//! ```
//! use gridmat_core::{Dimension, ElementKind};
//! use gridmat_exec::{CalculationExt, Density, MatrixCalcExt, MatrixFactory};
//!
//! let factory = MatrixFactory::default();
//! let m = factory.make(ElementKind::Double, Density::Dense, &[3, 2]).unwrap();
//! for (i, coord) in m.all_coordinates().enumerate() {
//!     m.set_as_double(&coord, i as f64).unwrap();
//! }
//!
//! // column means, recomputed on every read
//! let means = m.mean(Dimension::Row).unwrap().calc_link();
//! assert_eq!(means.get_as_double(&[0, 1]).unwrap(), 3.0);
//!
//! m.set_as_double(&[0, 1], 7.0).unwrap();
//! assert_eq!(means.get_as_double(&[0, 1]).unwrap(), 5.0);
//! ```

#![deny(warnings)]

pub mod backend;
pub mod calculation;
pub mod factory;
pub mod hints;
pub mod ops;

pub use backend::{Availability, BackendRegistry, Decomposition, DecompositionBackend};
pub use calculation::{Calculation, CalculationExt, LinkedMatrix, Ret};
pub use factory::MatrixFactory;
pub use hints::{Density, FactoryHints};
pub use ops::{scalar, MatrixCalcExt};
