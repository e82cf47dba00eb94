//! Shape manipulation operations
//!
//! All operations here produce a physically re-laid-out copy; none of them
//! return stride tricks, so the flat-index formula of the result stays the
//! plain one of its [`Layout`].

use super::types::DenseND;
use crate::container::Layout;
use crate::element::Element;
use crate::error::{GridError, GridResult};
use scirs2_core::ndarray_ext::{Array, IxDyn, ShapeBuilder};

impl<T: Element> DenseND<T> {
    /// Swap the row and column dimensions, copying into a fresh buffer
    ///
    /// The result keeps the layout of the source. Labels are not carried over,
    /// because their axes no longer line up.
    ///
    /// # Examples
    ///
    /// ```
    /// use gridmat_core::DenseND;
    ///
    /// let m = DenseND::from_rows(vec![vec![1, 2, 3], vec![4, 5, 6]]).unwrap();
    /// let t = m.transpose().unwrap();
    /// assert_eq!(t.extents(), &[3, 2]);
    /// assert_eq!(t.get(&[2, 1]).unwrap(), 6);
    /// ```
    pub fn transpose(&self) -> GridResult<Self> {
        if self.rank() < 2 {
            return Err(GridError::invalid_shape(format!(
                "transpose needs at least 2 dimensions, got {}",
                self.rank()
            )));
        }
        let mut view = self.data.view();
        view.swap_axes(0, 1);
        let mut out = Self::from_elem_with_layout(view.shape(), T::default_value(), self.layout());
        out.data.assign(&view);
        Ok(out)
    }

    /// Copy into a buffer with the requested memory layout
    ///
    /// # Examples
    ///
    /// ```
    /// use gridmat_core::{DenseND, Layout};
    ///
    /// let m = DenseND::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
    /// let c = m.to_layout(Layout::ColumnMajor);
    /// assert_eq!(c.as_memory_slice().unwrap(), &[1.0, 3.0, 2.0, 4.0]);
    /// assert_eq!(c, m);
    /// ```
    pub fn to_layout(&self, layout: Layout) -> Self {
        let mut out = Self::with_layout(self.extents(), layout);
        out.data.assign(&self.data);
        out.annotation = self.annotation.clone();
        out
    }

    /// Copy into a container of a different shape and rank-preserving extents
    ///
    /// Cells inside both shapes are kept; new cells hold the default value.
    pub fn resized(&self, shape: &[usize]) -> GridResult<Self> {
        if shape.len() != self.rank() {
            return Err(GridError::DimensionMismatch {
                expected: self.rank(),
                got: shape.len(),
            });
        }
        let data = match self.layout() {
            Layout::RowMajor => Array::from_elem(IxDyn(shape), T::default_value()),
            Layout::ColumnMajor => Array::from_elem(IxDyn(shape).f(), T::default_value()),
        };
        let mut out = Self::from_array(data);
        for (index, value) in self.data.indexed_iter() {
            if let Some(cell) = out.data.get_mut(index.clone()) {
                *cell = value.clone();
            }
        }
        out.annotation = self.annotation.clone();
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transpose_column_major_copy() {
        let mut m = DenseND::<f64>::with_layout(&[2, 3], Layout::ColumnMajor);
        m.fill_with(|idx| (idx[0] * 10 + idx[1]) as f64);
        let t = m.transpose().unwrap();
        assert_eq!(t.layout(), Layout::ColumnMajor);
        for r in 0..2i64 {
            for c in 0..3i64 {
                assert_eq!(t.get(&[c, r]).unwrap(), m.get(&[r, c]).unwrap());
            }
        }
        assert_eq!(t.flat_index(&[2, 1]).unwrap(), 2 + 3);
    }

    #[test]
    fn test_resized_keeps_overlap() {
        let m = DenseND::from_rows(vec![vec![1, 2], vec![3, 4]]).unwrap();
        let grown = m.resized(&[3, 2]).unwrap();
        assert_eq!(grown.get(&[1, 1]).unwrap(), 4);
        assert_eq!(grown.get(&[2, 1]).unwrap(), 0);
        let shrunk = m.resized(&[1, 2]).unwrap();
        assert_eq!(shrunk.to_vec(), vec![1, 2]);
        assert!(m.resized(&[4]).is_err());
    }
}
