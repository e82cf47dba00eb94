//! Dense container type definition and basic operations
//!
//! This module defines the core `DenseND<T>` type and provides creation and
//! accessor methods. Additional operations are organized in separate modules.

use crate::annotation::Annotation;
use crate::container::{flat_index, Container, Layout};
use crate::coordinate::{checked_index, Coordinate};
use crate::element::Element;
use crate::error::{GridError, GridResult};
use scirs2_core::ndarray_ext::{Array, Dimension, IxDyn, ShapeBuilder};

/// Dense N-dimensional container backed by scirs2_core's ndarray
///
/// One generic type serves every element kind. Cells are held in a single
/// contiguous buffer of `shape.product()` elements, addressed in O(1) by the
/// closed-form formula of its [`Layout`]: row-major for general N-d storage,
/// column-major (`row + column * rows`) for the 2-D containers the factory
/// hands out.
///
/// # Examples
///
/// ```
/// use gridmat_core::DenseND;
///
/// let mut m = DenseND::<f64>::zeros(&[2, 3]);
/// m.set(&[1, 2], 4.5).unwrap();
/// assert_eq!(m.get(&[1, 2]).unwrap(), 4.5);
/// assert!(m.get(&[2, 0]).is_err());
/// ```
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(bound(serialize = "T: serde::Serialize")))]
#[cfg_attr(
    feature = "serde",
    serde(bound(deserialize = "T: serde::Deserialize<'de>"))
)]
pub struct DenseND<T> {
    /// Underlying ndarray storage (via scirs2_core)
    pub(crate) data: Array<T, IxDyn>,
    /// Shape as a coordinate, cached for bounds checks
    pub(crate) shape: Coordinate,
    pub(crate) version: u64,
    pub(crate) annotation: Option<Annotation>,
}

impl<T: Element> DenseND<T> {
    /// Create a container from an existing ndarray
    ///
    /// Non-contiguous arrays are copied into row-major order.
    pub fn from_array(array: Array<T, IxDyn>) -> Self {
        let data = if array.is_standard_layout() || array.t().is_standard_layout() {
            array
        } else {
            array.as_standard_layout().into_owned()
        };
        let shape = Coordinate::from(data.shape());
        Self {
            data,
            shape,
            version: 0,
            annotation: None,
        }
    }

    /// Create a container filled with `value` in the given layout
    pub fn from_elem_with_layout(shape: &[usize], value: T, layout: Layout) -> Self {
        let data = match layout {
            Layout::RowMajor => Array::from_elem(IxDyn(shape), value),
            Layout::ColumnMajor => Array::from_elem(IxDyn(shape).f(), value),
        };
        Self::from_array(data)
    }

    /// Create a row-major container filled with `value`
    ///
    /// # Examples
    ///
    /// ```
    /// use gridmat_core::DenseND;
    ///
    /// let m = DenseND::from_elem(&[2, 3], 5i32);
    /// assert_eq!(m.get(&[1, 2]).unwrap(), 5);
    /// ```
    pub fn from_elem(shape: &[usize], value: T) -> Self {
        Self::from_elem_with_layout(shape, value, Layout::RowMajor)
    }

    /// Create a row-major container of default values
    ///
    /// # Examples
    ///
    /// ```
    /// use gridmat_core::DenseND;
    ///
    /// let m = DenseND::<String>::zeros(&[2, 2]);
    /// assert_eq!(m.get(&[0, 0]).unwrap(), "");
    /// ```
    pub fn zeros(shape: &[usize]) -> Self {
        Self::from_elem(shape, T::default_value())
    }

    /// Create a container of default values in the given layout
    pub fn with_layout(shape: &[usize], layout: Layout) -> Self {
        Self::from_elem_with_layout(shape, T::default_value(), layout)
    }

    /// Create a container from a vector with given shape
    ///
    /// # Arguments
    ///
    /// * `vec` - Flattened data in row-major order
    /// * `shape` - Target shape
    ///
    /// # Examples
    ///
    /// ```
    /// use gridmat_core::DenseND;
    ///
    /// let m = DenseND::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
    /// assert_eq!(m.get(&[1, 0]).unwrap(), 4.0);
    /// ```
    pub fn from_vec(vec: Vec<T>, shape: &[usize]) -> GridResult<Self> {
        let total = shape.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d));
        if total != Some(vec.len()) {
            return Err(GridError::invalid_shape(format!(
                "shape {:?} requires {:?} elements, but got {}",
                shape,
                total,
                vec.len()
            )));
        }
        let array = Array::from_shape_vec(IxDyn(shape), vec)
            .map_err(|e| GridError::invalid_shape(e.to_string()))?;
        Ok(Self::from_array(array))
    }

    /// Create a container from a buffer already in `layout` memory order
    ///
    /// # Examples
    ///
    /// ```
    /// use gridmat_core::{DenseND, Layout};
    ///
    /// let m = DenseND::from_vec_with_layout(vec![1, 2, 3, 4, 5, 6], &[2, 3], Layout::ColumnMajor)
    ///     .unwrap();
    /// assert_eq!(m.get(&[1, 0]).unwrap(), 2);
    /// assert_eq!(m.get(&[0, 1]).unwrap(), 3);
    /// ```
    pub fn from_vec_with_layout(vec: Vec<T>, shape: &[usize], layout: Layout) -> GridResult<Self> {
        match layout {
            Layout::RowMajor => Self::from_vec(vec, shape),
            Layout::ColumnMajor => {
                let array = Array::from_shape_vec(IxDyn(shape).f(), vec)
                    .map_err(|e| GridError::invalid_shape(e.to_string()))?;
                Ok(Self::from_array(array))
            }
        }
    }

    /// Create a 2-D container from rows of equal length
    ///
    /// # Examples
    ///
    /// ```
    /// use gridmat_core::DenseND;
    ///
    /// let m = DenseND::from_rows(vec![vec![1, 2], vec![3, 4]]).unwrap();
    /// assert_eq!(m.get(&[1, 0]).unwrap(), 3);
    /// ```
    pub fn from_rows(rows: Vec<Vec<T>>) -> GridResult<Self> {
        let nrows = rows.len();
        let ncols = rows.first().map_or(0, Vec::len);
        if let Some(bad) = rows.iter().position(|r| r.len() != ncols) {
            return Err(GridError::invalid_shape(format!(
                "row {} has {} columns, expected {}",
                bad,
                rows[bad].len(),
                ncols
            )));
        }
        Self::from_vec(rows.into_iter().flatten().collect(), &[nrows, ncols])
    }

    /// Copy any container through the generic contract, converting cells to `T`
    pub fn from_container(source: &dyn Container, layout: Layout) -> GridResult<Self> {
        let extents = source.shape().to_extents()?;
        let mut out = Self::with_layout(&extents, layout);
        for coord in source.available_coordinates() {
            let value = T::from_value(&source.get_value(&coord)?)?;
            out.set(&coord, value)?;
        }
        if let Some(annotation) = source.annotation() {
            out.annotation = Some(annotation.clone());
        }
        Ok(out)
    }

    /// Number of dimensions
    pub fn rank(&self) -> usize {
        self.data.ndim()
    }

    /// Shape as a coordinate
    pub fn shape(&self) -> &Coordinate {
        &self.shape
    }

    /// Shape as unsigned extents
    pub fn extents(&self) -> &[usize] {
        self.data.shape()
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the container has zero cells
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Memory order of the backing buffer
    pub fn layout(&self) -> Layout {
        if !self.data.is_standard_layout() && self.data.t().is_standard_layout() {
            Layout::ColumnMajor
        } else {
            Layout::RowMajor
        }
    }

    /// Read the cell at `coord`
    pub fn get(&self, coord: &[i64]) -> GridResult<T> {
        let index = checked_index(coord, &self.shape)?;
        Ok(self.data[IxDyn(&index)].clone())
    }

    /// Write the cell at `coord`
    pub fn set(&mut self, coord: &[i64], value: T) -> GridResult<()> {
        let index = checked_index(coord, &self.shape)?;
        self.data[IxDyn(&index)] = value;
        self.version += 1;
        Ok(())
    }

    /// Offset of `coord` in the backing buffer
    ///
    /// # Examples
    ///
    /// ```
    /// use gridmat_core::{DenseND, Layout};
    ///
    /// let m = DenseND::<f64>::with_layout(&[3, 4], Layout::ColumnMajor);
    /// assert_eq!(m.flat_index(&[2, 1]).unwrap(), 2 + 1 * 3);
    /// ```
    pub fn flat_index(&self, coord: &[i64]) -> GridResult<usize> {
        let index = checked_index(coord, &self.shape)?;
        Ok(flat_index(&index, self.extents(), self.layout()))
    }

    /// Backing buffer in memory order
    pub fn as_memory_slice(&self) -> Option<&[T]> {
        self.data.as_slice_memory_order()
    }

    /// Get an immutable reference to the underlying ndarray
    pub fn as_array(&self) -> &Array<T, IxDyn> {
        &self.data
    }

    /// Iterate over all cells in row-major order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }

    /// Convert the cells to a flat vector in row-major order
    pub fn to_vec(&self) -> Vec<T> {
        self.data.iter().cloned().collect()
    }

    /// Fill the container with values produced by a function of the index
    ///
    /// # Examples
    ///
    /// ```
    /// use gridmat_core::DenseND;
    ///
    /// let mut m = DenseND::<f64>::zeros(&[2, 3]);
    /// m.fill_with(|idx| (idx[0] + idx[1]) as f64);
    /// assert_eq!(m.get(&[1, 2]).unwrap(), 3.0);
    /// ```
    pub fn fill_with<F>(&mut self, mut f: F)
    where
        F: FnMut(&[usize]) -> T,
    {
        for (index, cell) in self.data.indexed_iter_mut() {
            *cell = f(index.slice());
        }
        self.version += 1;
    }

    /// Modification counter
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Check if two containers have the same shape
    pub fn same_shape(&self, other: &Self) -> bool {
        self.shape == other.shape
    }
}
