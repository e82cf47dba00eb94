//! # gridmat
//!
//! Multi-dimensional containers addressed by integer coordinates, stored
//! densely, sparsely or in square blocks, and transformed by calculations
//! that can be materialised eagerly, linked as live views, or written back
//! into their source.
//!
//! This is the meta crate that re-exports the gridmat components.
//!
//! ## Quick Start
//!
//! ```
//! use gridmat::prelude::*;
//!
//! let factory = MatrixFactory::default();
//! let m = factory.make(ElementKind::Double, Density::Dense, &[2, 3])?;
//! for (i, coord) in m.all_coordinates().enumerate() {
//!     m.set_as_double(&coord, i as f64)?;
//! }
//!
//! let scaled = m.times_scalar(2.0)?.calc_new()?;
//! assert_eq!(scaled.get_as_double(&[1, 2])?, 10.0);
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Components
//!
//! ### Core ([`core`])
//!
//! Coordinates, element kinds and [`Value`](core::Value), the
//! [`Container`](core::Container) contract, dense and block storage,
//! annotations.
//!
//! ```
//! use gridmat::core::Coordinate;
//!
//! let c = Coordinate::parse("3x4").unwrap();
//! assert_eq!(c.product(), 12);
//! ```
//!
//! ### Sparse storage ([`sparse`])
//!
//! Coordinate-keyed maps holding only non-default cells, with an optional
//! entry cap that evicts the least recently written cell.
//!
//! ```
//! use gridmat::sparse::SparseMatrix;
//!
//! let mut m = SparseMatrix::<i64>::with_max_entries(&[100, 100], 2);
//! m.set(&[0, 0], 1).unwrap();
//! m.set(&[1, 1], 2).unwrap();
//! m.set(&[2, 2], 3).unwrap();
//! assert_eq!(m.nnz(), 2);
//! assert_eq!(m.get(&[0, 0]).unwrap(), 0);
//! ```
//!
//! ### Calculations ([`exec`])
//!
//! The factory, the calculation engine and the decomposition backend
//! registry.
//!
//! ```
//! use gridmat::prelude::*;
//!
//! let m = Matrix::new(DenseND::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]])?);
//! let totals = m.sum(Dimension::Column)?.calc_link();
//! assert_eq!(totals.get_as_double(&[1, 0])?, 7.0);
//!
//! m.set_as_double(&[1, 0], 0.0)?;
//! assert_eq!(totals.get_as_double(&[1, 0])?, 4.0);
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Serialize/Deserialize for coordinates, kinds, values and dense
//!   storage
//! - `tracing`: subscriber initialisation in [`tracing_support`]

#![deny(warnings)]

pub use gridmat_core as core;
pub use gridmat_exec as exec;
pub use gridmat_sparse as sparse;

pub mod tracing_support;

pub mod prelude {
    //! Common imports
    //!
    //! ```
    //! use gridmat::prelude::*;
    //!
    //! let m = Matrix::new(SparseMatrix::<f64>::new(&[10, 10]));
    //! assert_eq!(m.storage_kind(), StorageKind::Sparse);
    //! ```

    pub use crate::core::{
        Annotation, BlockMatrix, BlockOrder, Container, Coordinate, DenseND, Dimension, Element,
        ElementKind, GridError, GridResult, Layout, Matrix, StorageKind, Value, COLUMN, ROW,
    };

    pub use crate::sparse::SparseMatrix;

    pub use crate::exec::{
        scalar, BackendRegistry, Calculation, CalculationExt, Decomposition, Density,
        FactoryHints, MatrixCalcExt, MatrixFactory, Ret,
    };
}

/// Version of the gridmat crates
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
