//! Element-wise operations on dense containers
//!
//! Scalar arithmetic allocates a new buffer and performs a single linear pass
//! over the source, keeping its memory layout.

use super::types::DenseND;
use crate::element::{Element, ElementKind};
use crate::error::{GridError, GridResult};
use scirs2_core::numeric::Num;

impl<T: Element> DenseND<T> {
    /// Apply `f` to every cell, producing a container of another element type
    ///
    /// The memory layout of the source is kept. Labels are copied.
    ///
    /// # Examples
    ///
    /// ```
    /// use gridmat_core::DenseND;
    ///
    /// let m = DenseND::from_rows(vec![vec![1, 2], vec![3, 4]]).unwrap();
    /// let even = m.map(|v| v % 2 == 0);
    /// assert!(even.get(&[1, 1]).unwrap());
    /// assert!(!even.get(&[0, 0]).unwrap());
    /// ```
    pub fn map<U, F>(&self, f: F) -> DenseND<U>
    where
        U: Element,
        F: FnMut(&T) -> U,
    {
        let mut out = DenseND::from_array(self.data.map(f));
        out.annotation = self.annotation.clone();
        out
    }
}

impl<T> DenseND<T>
where
    T: Element + Num + Copy,
{
    /// Add a scalar to every cell
    ///
    /// # Examples
    ///
    /// ```
    /// use gridmat_core::DenseND;
    ///
    /// let m = DenseND::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
    /// assert_eq!(m.plus_scalar(10.0).get(&[1, 0]).unwrap(), 13.0);
    /// ```
    pub fn plus_scalar(&self, scalar: T) -> Self {
        self.map(|&v| v + scalar)
    }

    /// Subtract a scalar from every cell
    pub fn minus_scalar(&self, scalar: T) -> Self {
        self.map(|&v| v - scalar)
    }

    /// Multiply every cell by a scalar
    pub fn times_scalar(&self, scalar: T) -> Self {
        self.map(|&v| v * scalar)
    }

    /// Divide every cell by a scalar
    ///
    /// Integer division by zero is rejected; floating point division follows
    /// IEEE semantics.
    pub fn divide_scalar(&self, scalar: T) -> GridResult<Self> {
        let is_float = matches!(T::KIND, ElementKind::Double | ElementKind::Float);
        if scalar.is_zero() && !is_float {
            return Err(GridError::unsupported("integer division by zero", T::KIND));
        }
        Ok(self.map(|&v| v / scalar))
    }

    /// Element-wise sum of two containers of the same shape
    pub fn plus(&self, other: &Self) -> GridResult<Self> {
        if !self.same_shape(other) {
            return Err(GridError::shape_mismatch("plus", &self.shape, &other.shape));
        }
        let mut out = DenseND::from_array(&self.data + &other.data);
        out.annotation = self.annotation.clone();
        Ok(out)
    }

    /// Sum of all cells
    pub fn sum(&self) -> T {
        self.data.iter().fold(T::zero(), |acc, &v| acc + v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Layout;

    #[test]
    fn test_scalar_ops() {
        let m = DenseND::from_rows(vec![vec![2.0, 4.0], vec![6.0, 8.0]]).unwrap();
        assert_eq!(m.minus_scalar(1.0).to_vec(), vec![1.0, 3.0, 5.0, 7.0]);
        assert_eq!(m.times_scalar(0.5).to_vec(), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(m.divide_scalar(2.0).unwrap().to_vec(), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(m.sum(), 20.0);
    }

    #[test]
    fn test_integer_division_by_zero_rejected() {
        let m = DenseND::from_rows(vec![vec![1, 2]]).unwrap();
        assert!(m.divide_scalar(0).is_err());
        let f = DenseND::from_rows(vec![vec![1.0f64]]).unwrap();
        assert!(f.divide_scalar(0.0).unwrap().get(&[0, 0]).unwrap().is_infinite());
    }

    #[test]
    fn test_scalar_op_keeps_layout() {
        let mut m = DenseND::<f64>::with_layout(&[2, 3], Layout::ColumnMajor);
        m.set(&[1, 2], 5.0).unwrap();
        let out = m.plus_scalar(1.0);
        assert_eq!(out.layout(), Layout::ColumnMajor);
        assert_eq!(out.get(&[1, 2]).unwrap(), 6.0);
        assert_eq!(out.get(&[0, 0]).unwrap(), 1.0);
    }

    #[test]
    fn test_plus_requires_same_shape() {
        let a = DenseND::<f64>::zeros(&[2, 2]);
        let b = DenseND::<f64>::zeros(&[2, 3]);
        assert!(a.plus(&b).is_err());
        assert_eq!(a.plus(&a).unwrap().len(), 4);
    }
}
