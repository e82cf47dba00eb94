//! The capability interface every container implements.
//!
//! [`Container`] unifies all element kinds and all storage strategies behind
//! one object-safe trait, so calculations and external collaborators are
//! written once against it. Concrete storages are generic over the element
//! type ([`DenseND<T>`](crate::DenseND), [`BlockMatrix<T>`](crate::BlockMatrix),
//! and the sparse map in `gridmat-sparse`); the trait speaks in dynamic
//! [`Value`]s and converts at the boundary.

use crate::annotation::Annotation;
use crate::coordinate::{Coordinate, CoordinateIter, COLUMN, ROW};
use crate::element::{ElementKind, Value};
use crate::error::GridResult;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use std::fmt;

/// How a container holds its cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StorageKind {
    /// Contiguous buffer with closed-form addressing
    Dense,
    /// Coordinate-keyed map of non-default cells
    Sparse,
    /// Lazily computed view over other containers
    View,
}

/// Flat addressing order of a dense buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Layout {
    /// Last axis varies fastest
    #[default]
    RowMajor,
    /// First axis varies fastest: `index = row + column * rows` in 2-D
    ColumnMajor,
}

/// Flat offset of `index` in a buffer of `shape` laid out in `layout`.
///
/// ```
/// use gridmat_core::container::{flat_index, Layout};
///
/// // 3 x 4, column-major: row + column * rows
/// assert_eq!(flat_index(&[2, 1], &[3, 4], Layout::ColumnMajor), 2 + 1 * 3);
/// assert_eq!(flat_index(&[2, 1], &[3, 4], Layout::RowMajor), 2 * 4 + 1);
/// ```
pub fn flat_index(index: &[usize], shape: &[usize], layout: Layout) -> usize {
    match layout {
        Layout::RowMajor => index
            .iter()
            .zip(shape)
            .fold(0, |acc, (&i, &extent)| acc * extent + i),
        Layout::ColumnMajor => index
            .iter()
            .zip(shape)
            .rev()
            .fold(0, |acc, (&i, &extent)| acc * extent + i),
    }
}

/// Borrowed view of a contiguous `f64` buffer exposed by a dense container.
#[derive(Debug, Clone, Copy)]
pub struct BufferView<'a> {
    /// Cells in memory order
    pub data: &'a [f64],
    /// Extent per dimension
    pub shape: &'a [usize],
    /// Addressing order of `data`
    pub layout: Layout,
}

impl BufferView<'_> {
    /// Whether two buffers can be combined with a single linear pass.
    pub fn is_compatible(&self, other: &BufferView<'_>) -> bool {
        self.shape == other.shape && self.layout == other.layout
    }
}

/// Capability set required of every concrete storage.
///
/// Coordinates passed to [`get_value`](Container::get_value) and
/// [`set_value`](Container::set_value) must satisfy `0 <= c[d] < shape[d]`
/// for every dimension; anything else fails with an out-of-bounds error.
pub trait Container: fmt::Debug + Send + Sync {
    /// Extent per dimension.
    fn shape(&self) -> Coordinate;

    /// Native element kind.
    fn element_kind(&self) -> ElementKind;

    /// Storage strategy.
    fn storage_kind(&self) -> StorageKind;

    /// Read the cell at `coord`.
    fn get_value(&self, coord: &[i64]) -> GridResult<Value>;

    /// Write the cell at `coord`, converting `value` to the native kind.
    fn set_value(&mut self, coord: &[i64], value: Value) -> GridResult<()>;

    /// Modification counter, bumped by every write.
    fn version(&self) -> u64;

    /// Coordinates that may hold a non-default value.
    ///
    /// Sparse storage yields exactly its stored entries in unspecified order;
    /// everything else yields the full coordinate range.
    fn available_coordinates(&self) -> Box<dyn Iterator<Item = Coordinate> + '_> {
        Box::new(self.all_coordinates())
    }

    /// Every in-bounds coordinate, row-major.
    fn all_coordinates(&self) -> CoordinateIter {
        self.shape().iter_cells()
    }

    /// Whether `coord` is held by this container.
    fn contains(&self, coord: &[i64]) -> bool {
        Coordinate::new(coord).is_within(&self.shape())
    }

    /// Out-of-band labels, if any were ever set.
    fn annotation(&self) -> Option<&Annotation>;

    /// Labels, created on first access.
    fn annotation_mut(&mut self) -> &mut Annotation;

    /// Replace (or drop) the labels.
    fn set_annotation(&mut self, annotation: Option<Annotation>);

    /// Deep copy, labels included.
    fn clone_box(&self) -> Box<dyn Container>;

    /// Contiguous `f64` buffer, for storages that have one.
    fn f64_buffer(&self) -> Option<BufferView<'_>> {
        None
    }

    /// Number of dimensions.
    fn rank(&self) -> usize {
        self.shape().rank()
    }

    /// Extent of the row dimension.
    fn row_count(&self) -> i64 {
        self.shape()[ROW]
    }

    /// Extent of the column dimension.
    fn column_count(&self) -> i64 {
        self.shape()[COLUMN]
    }

    fn get_as_double(&self, coord: &[i64]) -> GridResult<f64> {
        self.get_value(coord)?.to_f64()
    }

    fn get_as_float(&self, coord: &[i64]) -> GridResult<f32> {
        self.get_value(coord)?.to_f32()
    }

    fn get_as_long(&self, coord: &[i64]) -> GridResult<i64> {
        self.get_value(coord)?.to_i64()
    }

    fn get_as_int(&self, coord: &[i64]) -> GridResult<i32> {
        self.get_value(coord)?.to_i32()
    }

    fn get_as_short(&self, coord: &[i64]) -> GridResult<i16> {
        self.get_value(coord)?.to_i16()
    }

    fn get_as_byte(&self, coord: &[i64]) -> GridResult<i8> {
        self.get_value(coord)?.to_i8()
    }

    fn get_as_char(&self, coord: &[i64]) -> GridResult<char> {
        self.get_value(coord)?.to_char()
    }

    fn get_as_boolean(&self, coord: &[i64]) -> GridResult<bool> {
        self.get_value(coord)?.to_bool()
    }

    fn get_as_big_integer(&self, coord: &[i64]) -> GridResult<BigInt> {
        self.get_value(coord)?.to_big_integer()
    }

    fn get_as_big_decimal(&self, coord: &[i64]) -> GridResult<BigDecimal> {
        self.get_value(coord)?.to_big_decimal()
    }

    fn get_as_date(&self, coord: &[i64]) -> GridResult<DateTime<Utc>> {
        self.get_value(coord)?.to_date()
    }

    fn get_as_string(&self, coord: &[i64]) -> GridResult<String> {
        Ok(self.get_value(coord)?.to_text())
    }

    fn get_as_object(&self, coord: &[i64]) -> GridResult<Value> {
        self.get_value(coord)
    }

    fn set_as_double(&mut self, coord: &[i64], value: f64) -> GridResult<()> {
        self.set_value(coord, Value::Double(value))
    }

    fn set_as_float(&mut self, coord: &[i64], value: f32) -> GridResult<()> {
        self.set_value(coord, Value::Float(value))
    }

    fn set_as_long(&mut self, coord: &[i64], value: i64) -> GridResult<()> {
        self.set_value(coord, Value::Long(value))
    }

    fn set_as_int(&mut self, coord: &[i64], value: i32) -> GridResult<()> {
        self.set_value(coord, Value::Int(value))
    }

    fn set_as_short(&mut self, coord: &[i64], value: i16) -> GridResult<()> {
        self.set_value(coord, Value::Short(value))
    }

    fn set_as_byte(&mut self, coord: &[i64], value: i8) -> GridResult<()> {
        self.set_value(coord, Value::Byte(value))
    }

    fn set_as_char(&mut self, coord: &[i64], value: char) -> GridResult<()> {
        self.set_value(coord, Value::Char(value))
    }

    fn set_as_boolean(&mut self, coord: &[i64], value: bool) -> GridResult<()> {
        self.set_value(coord, Value::Boolean(value))
    }

    fn set_as_big_integer(&mut self, coord: &[i64], value: BigInt) -> GridResult<()> {
        self.set_value(coord, Value::BigInteger(value))
    }

    fn set_as_big_decimal(&mut self, coord: &[i64], value: BigDecimal) -> GridResult<()> {
        self.set_value(coord, Value::BigDecimal(value))
    }

    fn set_as_date(&mut self, coord: &[i64], value: DateTime<Utc>) -> GridResult<()> {
        self.set_value(coord, Value::Date(value))
    }

    fn set_as_string(&mut self, coord: &[i64], value: &str) -> GridResult<()> {
        self.set_value(coord, Value::String(value.to_string()))
    }

    fn set_as_object(&mut self, coord: &[i64], value: Value) -> GridResult<()> {
        self.set_value(coord, value)
    }
}

impl Clone for Box<dyn Container> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_index_row_major_3d() {
        let shape = [2, 3, 4];
        assert_eq!(flat_index(&[0, 0, 0], &shape, Layout::RowMajor), 0);
        assert_eq!(flat_index(&[0, 0, 1], &shape, Layout::RowMajor), 1);
        assert_eq!(flat_index(&[0, 1, 0], &shape, Layout::RowMajor), 4);
        assert_eq!(flat_index(&[1, 2, 3], &shape, Layout::RowMajor), 23);
    }

    #[test]
    fn test_flat_index_column_major_3d() {
        let shape = [2, 3, 4];
        assert_eq!(flat_index(&[1, 0, 0], &shape, Layout::ColumnMajor), 1);
        assert_eq!(flat_index(&[0, 1, 0], &shape, Layout::ColumnMajor), 2);
        assert_eq!(flat_index(&[0, 0, 1], &shape, Layout::ColumnMajor), 6);
        assert_eq!(flat_index(&[1, 2, 3], &shape, Layout::ColumnMajor), 23);
    }
}
