//! # gridmat-sparse
//!
//! Sparse storage for gridmat: a coordinate-keyed map that holds only the
//! cells whose value differs from the element kind's default.
//!
//! - **Implicit defaults**: reading an absent coordinate yields the default
//!   value, and writing the default removes the entry
//! - **Capacity cap**: an optional `max_entries` bound evicts the
//!   least-recently-written entry before a new one is inserted
//! - **Any rank**: coordinates of any length, addressed exactly like dense
//!   storage
//!
//! # Examples
//!
//! ```
//! use gridmat_core::Container;
//! use gridmat_sparse::SparseMatrix;
//!
//! let mut m = SparseMatrix::<f64>::new(&[1000, 1000]);
//! m.set(&[10, 20], 1.5).unwrap();
//! m.set(&[999, 0], -2.0).unwrap();
//! assert_eq!(m.nnz(), 2);
//! assert_eq!(m.get(&[0, 0]).unwrap(), 0.0);
//!
//! m.set(&[10, 20], 0.0).unwrap();
//! assert_eq!(m.available_coordinates().count(), 1);
//! ```

#![deny(warnings)]

pub mod map;

pub use map::SparseMatrix;
