//! Shared container handle.
//!
//! [`Matrix`] is the unified handle that calculations, factories and external
//! collaborators pass around. It owns a boxed [`Container`] behind an
//! `Arc<RwLock<..>>`, so a lazily linked view can keep its sources alive
//! after the scope that created them ends, and every holder observes the
//! same cells.
//!
//! Cloning a `Matrix` shares the container; [`Matrix::deep_clone`] copies it.
//!
//! # Examples
//!
//! ```
//! use gridmat_core::{DenseND, Matrix};
//!
//! let m = Matrix::new(DenseND::<f64>::zeros(&[2, 2]));
//! let alias = m.clone();
//! alias.set_as_double(&[0, 1], 2.5).unwrap();
//! assert_eq!(m.get_as_double(&[0, 1]).unwrap(), 2.5);
//!
//! let copy = m.deep_clone();
//! m.set_as_double(&[0, 1], 7.0).unwrap();
//! assert_eq!(copy.get_as_double(&[0, 1]).unwrap(), 2.5);
//! ```

use crate::annotation::Annotation;
use crate::container::{Container, StorageKind};
use crate::coordinate::{Coordinate, CoordinateIter};
use crate::element::{ElementKind, Value};
use crate::error::GridResult;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

/// Reference-counted, lock-protected container.
#[derive(Debug, Clone)]
pub struct Matrix {
    inner: Arc<RwLock<Box<dyn Container>>>,
}

impl Matrix {
    /// Wrap a concrete container.
    pub fn new<C: Container + 'static>(container: C) -> Self {
        Self::from_box(Box::new(container))
    }

    /// Wrap an already boxed container.
    pub fn from_box(container: Box<dyn Container>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(container)),
        }
    }

    /// Shared read access to the container.
    pub fn read(&self) -> RwLockReadGuard<'_, Box<dyn Container>> {
        self.inner.read()
    }

    /// Exclusive write access to the container.
    pub fn write(&self) -> RwLockWriteGuard<'_, Box<dyn Container>> {
        self.inner.write()
    }

    /// Whether both handles share one container.
    pub fn ptr_eq(&self, other: &Matrix) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Independent copy of cells and labels.
    pub fn deep_clone(&self) -> Matrix {
        Matrix::from_box(self.read().clone_box())
    }

    pub fn shape(&self) -> Coordinate {
        self.read().shape()
    }

    pub fn rank(&self) -> usize {
        self.read().rank()
    }

    pub fn element_kind(&self) -> ElementKind {
        self.read().element_kind()
    }

    pub fn storage_kind(&self) -> StorageKind {
        self.read().storage_kind()
    }

    pub fn version(&self) -> u64 {
        self.read().version()
    }

    pub fn get(&self, coord: &[i64]) -> GridResult<Value> {
        self.read().get_value(coord)
    }

    pub fn set(&self, coord: &[i64], value: impl Into<Value>) -> GridResult<()> {
        self.write().set_value(coord, value.into())
    }

    pub fn get_as_double(&self, coord: &[i64]) -> GridResult<f64> {
        self.read().get_as_double(coord)
    }

    pub fn set_as_double(&self, coord: &[i64], value: f64) -> GridResult<()> {
        self.write().set_as_double(coord, value)
    }

    pub fn get_as_boolean(&self, coord: &[i64]) -> GridResult<bool> {
        self.read().get_as_boolean(coord)
    }

    pub fn get_as_string(&self, coord: &[i64]) -> GridResult<String> {
        self.read().get_as_string(coord)
    }

    /// Every in-bounds coordinate, row-major.
    pub fn all_coordinates(&self) -> CoordinateIter {
        self.shape().iter_cells()
    }

    /// Coordinates that may hold a non-default value.
    ///
    /// The coordinates are captured up front, so the container is not locked
    /// while iterating.
    ///
    /// # Panics
    ///
    /// Advancing the iterator panics once a sparse container has been written
    /// since the iterator was created, since its entry set may have changed.
    pub fn available_coordinates(&self) -> AvailableCoordinates {
        let guard = self.read();
        AvailableCoordinates {
            source: self.clone(),
            coords: guard.available_coordinates().collect::<Vec<_>>().into_iter(),
            version: guard.version(),
            checked: guard.storage_kind() == StorageKind::Sparse,
        }
    }

    /// Copy of the labels, if any were set.
    pub fn annotation(&self) -> Option<Annotation> {
        self.read().annotation().cloned()
    }

    /// Edit the labels, creating them on first use.
    pub fn with_annotation<R>(&self, f: impl FnOnce(&mut Annotation) -> R) -> R {
        f(self.write().annotation_mut())
    }

    pub fn set_annotation(&self, annotation: Option<Annotation>) {
        self.write().set_annotation(annotation);
    }
}

/// Iterator returned by [`Matrix::available_coordinates`].
#[derive(Debug)]
pub struct AvailableCoordinates {
    source: Matrix,
    coords: std::vec::IntoIter<Coordinate>,
    version: u64,
    checked: bool,
}

impl Iterator for AvailableCoordinates {
    type Item = Coordinate;

    fn next(&mut self) -> Option<Coordinate> {
        if self.checked {
            let now = self.source.version();
            assert_eq!(
                now, self.version,
                "sparse container modified during available_coordinates iteration"
            );
        }
        self.coords.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.coords.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dense::DenseND;

    #[test]
    fn test_shared_and_deep_clone() {
        let m = Matrix::new(DenseND::<i32>::zeros(&[2, 3]));
        let shared = m.clone();
        assert!(m.ptr_eq(&shared));
        shared.set(&[1, 2], 9).unwrap();
        assert_eq!(m.get(&[1, 2]).unwrap(), Value::Int(9));

        let deep = m.deep_clone();
        assert!(!m.ptr_eq(&deep));
        m.set(&[1, 2], 1).unwrap();
        assert_eq!(deep.get(&[1, 2]).unwrap(), Value::Int(9));
    }

    #[test]
    fn test_deep_clone_copies_labels() {
        let m = Matrix::new(DenseND::<f64>::zeros(&[2, 2]));
        m.with_annotation(|a| a.set_row_label(0, Value::from("first")))
            .unwrap();
        let copy = m.deep_clone();
        copy.with_annotation(|a| a.set_row_label(0, Value::from("other")))
            .unwrap();
        let original = m.annotation().unwrap();
        assert_eq!(original.row_label(0).unwrap(), Value::from("first"));
    }

    #[test]
    fn test_dense_iteration_tolerates_writes() {
        let m = Matrix::new(DenseND::<f64>::zeros(&[2, 2]));
        let mut n = 0;
        for coord in m.available_coordinates() {
            m.set_as_double(&coord, 1.0).unwrap();
            n += 1;
        }
        assert_eq!(n, 4);
    }
}
