//! Coordinate-map sparse storage
//!
//! [`SparseMatrix`] keeps non-default cells in an [`lru::LruCache`] keyed by
//! [`Coordinate`]. The declared shape is stored separately, so an all-default
//! container still has a shape.
//!
//! # Capacity
//!
//! With `max_entries` set, inserting a new coordinate into a full map first
//! evicts the least-recently-written entry. Overwriting an existing entry
//! never evicts; it marks the entry as the most recently written. Reads do not
//! affect eviction order. Eviction is silent and not an error.
//!
//! ```
//! use gridmat_sparse::SparseMatrix;
//!
//! let mut m = SparseMatrix::<i32>::with_max_entries(&[4, 4], 2);
//! m.set(&[0, 0], 1).unwrap();
//! m.set(&[1, 1], 2).unwrap();
//! m.set(&[0, 0], 3).unwrap(); // rewrite: (1, 1) is now the oldest write
//! m.set(&[2, 2], 4).unwrap(); // evicts (1, 1)
//!
//! assert_eq!(m.get(&[1, 1]).unwrap(), 0);
//! assert_eq!(m.get(&[0, 0]).unwrap(), 3);
//! assert_eq!(m.nnz(), 2);
//! ```

use gridmat_core::container::{Container, Layout, StorageKind};
use gridmat_core::coordinate::checked_index;
use gridmat_core::{
    Annotation, Coordinate, DenseND, Element, ElementKind, GridError, GridResult, Value,
};
use lru::LruCache;
use std::fmt;

/// Sparse container of any rank holding only non-default cells.
#[derive(Clone)]
pub struct SparseMatrix<T> {
    shape: Coordinate,
    entries: LruCache<Coordinate, T>,
    max_entries: Option<usize>,
    version: u64,
    annotation: Option<Annotation>,
}

impl<T: Element> SparseMatrix<T> {
    /// Empty container of `shape` with no capacity cap
    pub fn new(shape: &[usize]) -> Self {
        Self {
            shape: Coordinate::from(shape),
            entries: LruCache::unbounded(),
            max_entries: None,
            version: 0,
            annotation: None,
        }
    }

    /// Empty container holding at most `max_entries` non-default cells
    ///
    /// A cap of zero keeps every cell at its default.
    pub fn with_max_entries(shape: &[usize], max_entries: usize) -> Self {
        let mut m = Self::new(shape);
        m.max_entries = Some(max_entries);
        m
    }

    /// Copy the non-default cells of any container
    pub fn from_container(source: &dyn Container) -> GridResult<Self> {
        let extents = source.shape().to_extents()?;
        let mut out = Self::new(&extents);
        for coord in source.available_coordinates() {
            let value = T::from_value(&source.get_value(&coord)?)?;
            out.set(&coord, value)?;
        }
        out.annotation = source.annotation().cloned();
        out.version = 0;
        Ok(out)
    }

    pub fn shape(&self) -> &Coordinate {
        &self.shape
    }

    /// Number of stored (non-default) cells
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn max_entries(&self) -> Option<usize> {
        self.max_entries
    }

    /// Change the capacity cap, evicting the oldest writes if the map is over it
    pub fn set_max_entries(&mut self, max_entries: Option<usize>) {
        self.max_entries = max_entries;
        if let Some(cap) = max_entries {
            let mut evicted = false;
            while self.entries.len() > cap {
                self.evict_oldest();
                evicted = true;
            }
            if evicted {
                self.version += 1;
            }
        }
    }

    fn evict_oldest(&mut self) {
        if let Some((coord, _)) = self.entries.pop_lru() {
            tracing::trace!(evicted = %coord, cap = ?self.max_entries, "sparse entry evicted");
        }
    }

    /// Read the cell at `coord`, the default when absent
    pub fn get(&self, coord: &[i64]) -> GridResult<T> {
        checked_index(coord, &self.shape)?;
        Ok(self
            .entries
            .peek(coord)
            .cloned()
            .unwrap_or_else(T::default_value))
    }

    /// Write the cell at `coord`
    ///
    /// Writing the default removes the entry.
    pub fn set(&mut self, coord: &[i64], value: T) -> GridResult<()> {
        checked_index(coord, &self.shape)?;
        self.version += 1;
        if value.is_default() {
            self.entries.pop(coord);
            return Ok(());
        }
        if self.entries.contains(coord) {
            self.entries.put(Coordinate::new(coord), value);
            return Ok(());
        }
        match self.max_entries {
            Some(0) => return Ok(()),
            Some(cap) if self.entries.len() >= cap => self.evict_oldest(),
            _ => {}
        }
        self.entries.put(Coordinate::new(coord), value);
        Ok(())
    }

    /// Change the declared shape; entries outside the new shape are dropped
    pub fn resize(&mut self, shape: &[usize]) -> GridResult<()> {
        if shape.len() != self.shape.rank() {
            return Err(GridError::DimensionMismatch {
                expected: self.shape.rank(),
                got: shape.len(),
            });
        }
        let shape = Coordinate::from(shape);
        let outside: Vec<Coordinate> = self
            .entries
            .iter()
            .filter(|(coord, _)| !coord.is_within(&shape))
            .map(|(coord, _)| coord.clone())
            .collect();
        for coord in &outside {
            self.entries.pop(coord);
        }
        if !outside.is_empty() {
            tracing::debug!(dropped = outside.len(), shape = %shape, "sparse resize");
        }
        if let Some(annotation) = self.annotation.as_mut() {
            annotation.fit_shape(&shape)?;
        }
        self.shape = shape;
        self.version += 1;
        Ok(())
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.entries.clear();
        self.version += 1;
    }

    /// Stored cells, most recently written first
    pub fn entries(&self) -> impl Iterator<Item = (&Coordinate, &T)> {
        self.entries.iter()
    }

    /// Dense copy of every cell
    pub fn to_dense(&self, layout: Layout) -> GridResult<DenseND<T>> {
        let extents = self.shape.to_extents()?;
        let mut out = DenseND::with_layout(&extents, layout);
        for (coord, value) in self.entries.iter() {
            out.set(coord, value.clone())?;
        }
        if let Some(annotation) = &self.annotation {
            out.set_annotation(Some(annotation.clone()));
        }
        Ok(out)
    }
}

impl<T: Element> Container for SparseMatrix<T> {
    fn shape(&self) -> Coordinate {
        self.shape.clone()
    }

    fn element_kind(&self) -> ElementKind {
        T::KIND
    }

    fn storage_kind(&self) -> StorageKind {
        StorageKind::Sparse
    }

    fn get_value(&self, coord: &[i64]) -> GridResult<Value> {
        self.get(coord).map(|v| v.to_value())
    }

    fn set_value(&mut self, coord: &[i64], value: Value) -> GridResult<()> {
        let native = T::from_value(&value)?;
        self.set(coord, native)
    }

    fn version(&self) -> u64 {
        self.version
    }

    /// Exactly the stored entries, in unspecified order.
    fn available_coordinates(&self) -> Box<dyn Iterator<Item = Coordinate> + '_> {
        Box::new(self.entries.iter().map(|(coord, _)| coord.clone()))
    }

    fn contains(&self, coord: &[i64]) -> bool {
        self.entries.contains(coord)
    }

    fn annotation(&self) -> Option<&Annotation> {
        self.annotation.as_ref()
    }

    fn annotation_mut(&mut self) -> &mut Annotation {
        let shape = self.shape.clone();
        self.annotation.get_or_insert_with(|| Annotation::new(&shape))
    }

    fn set_annotation(&mut self, annotation: Option<Annotation>) {
        self.annotation = annotation;
    }

    fn clone_box(&self) -> Box<dyn Container> {
        Box::new(self.clone())
    }
}

impl<T: fmt::Debug> fmt::Debug for SparseMatrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparseMatrix")
            .field("shape", &self.shape)
            .field("nnz", &self.entries.len())
            .field("max_entries", &self.max_entries)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridmat_core::Matrix;

    #[test]
    fn test_unset_reads_default() {
        let m = SparseMatrix::<String>::new(&[3, 3]);
        assert_eq!(m.get(&[2, 2]).unwrap(), "");
        assert_eq!(m.get_value(&[0, 1]).unwrap(), Value::String(String::new()));
        assert!(m.get(&[3, 0]).unwrap_err().is_out_of_bounds());
        assert!(m.get(&[0, -1]).unwrap_err().is_out_of_bounds());
    }

    #[test]
    fn test_default_write_removes_entry() {
        let mut m = SparseMatrix::<f64>::new(&[2, 2]);
        m.set(&[1, 0], 4.0).unwrap();
        assert!(m.contains(&[1, 0]));
        m.set_as_double(&[1, 0], 0.0).unwrap();
        assert!(!m.contains(&[1, 0]));
        assert_eq!(m.nnz(), 0);
        assert_eq!(m.available_coordinates().count(), 0);
    }

    #[test]
    fn test_eviction_is_least_recently_written() {
        let mut m = SparseMatrix::<i64>::with_max_entries(&[10, 10], 3);
        for i in 0..3 {
            m.set(&[i, i], i + 1).unwrap();
        }
        // reads do not refresh
        assert_eq!(m.get(&[0, 0]).unwrap(), 1);
        m.set(&[5, 5], 6).unwrap();
        assert!(!m.contains(&[0, 0]));
        assert_eq!(m.nnz(), 3);

        m.set(&[1, 1], 20).unwrap();
        m.set(&[6, 6], 7).unwrap();
        assert!(!m.contains(&[2, 2]));
        assert!(m.contains(&[1, 1]));
    }

    #[test]
    fn test_zero_cap_stores_nothing() {
        let mut m = SparseMatrix::<i32>::with_max_entries(&[2, 2], 0);
        m.set(&[0, 0], 5).unwrap();
        assert_eq!(m.nnz(), 0);
        assert_eq!(m.get(&[0, 0]).unwrap(), 0);
    }

    #[test]
    fn test_lowering_cap_evicts() {
        let mut m = SparseMatrix::<i32>::new(&[4, 4]);
        for i in 0..4 {
            m.set(&[i, 0], 1).unwrap();
        }
        m.set_max_entries(Some(2));
        assert_eq!(m.nnz(), 2);
        assert!(m.contains(&[3, 0]));
        assert!(m.contains(&[2, 0]));
    }

    #[test]
    fn test_resize_drops_out_of_range() {
        let mut m = SparseMatrix::<f64>::new(&[4, 4]);
        m.set(&[0, 0], 1.0).unwrap();
        m.set(&[3, 3], 2.0).unwrap();
        m.resize(&[2, 5]).unwrap();
        assert_eq!(m.nnz(), 1);
        assert_eq!(m.shape(), &Coordinate::from([2, 5]));
        assert!(m.get(&[3, 3]).is_err());
        m.resize(&[4, 4]).unwrap();
        assert_eq!(m.get(&[3, 3]).unwrap(), 0.0);
        assert!(m.resize(&[4]).is_err());
    }

    #[test]
    fn test_higher_rank() {
        let mut m = SparseMatrix::<bool>::new(&[2, 3, 4, 5]);
        m.set(&[1, 2, 3, 4], true).unwrap();
        assert!(m.get(&[1, 2, 3, 4]).unwrap());
        assert_eq!(
            m.available_coordinates().collect::<Vec<_>>(),
            vec![Coordinate::from([1, 2, 3, 4])]
        );
    }

    #[test]
    fn test_dense_round_trip() {
        let dense = DenseND::from_rows(vec![vec![0.0, 1.5], vec![0.0, 0.0], vec![-3.0, 0.0]])
            .unwrap();
        let sparse = SparseMatrix::<f64>::from_container(&dense).unwrap();
        assert_eq!(sparse.nnz(), 2);
        assert_eq!(sparse.to_dense(Layout::ColumnMajor).unwrap(), dense);
    }

    #[test]
    fn test_clone_box_is_deep() {
        let mut m = SparseMatrix::<i32>::new(&[2, 2]);
        m.set(&[0, 1], 3).unwrap();
        m.annotation_mut().set_label(Value::from("counts"));
        let mut copy = m.clone_box();
        copy.set_value(&[0, 1], Value::Int(9)).unwrap();
        copy.annotation_mut().set_label(Value::from("other"));
        assert_eq!(m.get(&[0, 1]).unwrap(), 3);
        assert_eq!(m.annotation().unwrap().label(), Some(&Value::from("counts")));
    }

    #[test]
    #[should_panic(expected = "modified during available_coordinates")]
    fn test_mutation_during_iteration_panics() {
        let handle = Matrix::new(SparseMatrix::<f64>::new(&[3, 3]));
        handle.set_as_double(&[0, 0], 1.0).unwrap();
        handle.set_as_double(&[1, 1], 2.0).unwrap();
        for coord in handle.available_coordinates() {
            handle.set_as_double(&[2, 2], coord[0] as f64 + 5.0).unwrap();
        }
    }
}
