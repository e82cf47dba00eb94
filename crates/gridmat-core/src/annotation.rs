//! Out-of-band labels for containers.
//!
//! An [`Annotation`] carries a whole-container label plus, per axis, a label
//! for each position along that axis. Labels never take part in value
//! computation.
//!
//! Per-axis labels are stored in a dense object container of the owning
//! container's rank, with extent `1` on every axis except the labelled one.
//! The labelled extent is always at least the owner's extent on that axis and
//! grows when a label is set further out.
//!
//! Cloning an annotation is deep: the clone's label containers are
//! independent of the original's.
//!
//! # Examples
//!
//! ```
//! use gridmat_core::{Annotation, Coordinate, Value, ROW};
//!
//! let mut labels = Annotation::new(&Coordinate::from([3, 2]));
//! labels.set_label(Value::from("scores"));
//! labels.set_axis_label(ROW, 1, Value::from("bob")).unwrap();
//!
//! assert_eq!(labels.axis_label(ROW, 1).unwrap(), Value::from("bob"));
//! assert_eq!(
//!     labels.find_position_for_label(ROW, &Value::from("bob")),
//!     Coordinate::from([1, 0])
//! );
//! assert!(labels
//!     .find_position_for_label(ROW, &Value::from("eve"))
//!     .is_not_found());
//! ```

use crate::coordinate::{Coordinate, COLUMN, ROW};
use crate::dense::DenseND;
use crate::element::Value;
use crate::error::{GridError, GridResult};
use std::collections::BTreeMap;

/// Whole-container and per-axis labels.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Annotation {
    shape: Coordinate,
    label: Option<Value>,
    axes: BTreeMap<usize, DenseND<Value>>,
}

impl Annotation {
    /// Empty annotation for a container of `shape`.
    pub fn new(shape: &Coordinate) -> Self {
        Self {
            shape: shape.clone(),
            label: None,
            axes: BTreeMap::new(),
        }
    }

    /// Whole-container label.
    pub fn label(&self) -> Option<&Value> {
        self.label.as_ref()
    }

    /// Set the whole-container label.
    pub fn set_label(&mut self, label: Value) {
        self.label = Some(label);
    }

    fn label_shape(&self, axis: usize, extent: usize) -> Vec<usize> {
        (0..self.shape.rank())
            .map(|d| if d == axis { extent } else { 1 })
            .collect()
    }

    fn check_axis(&self, axis: usize) -> GridResult<()> {
        if axis >= self.shape.rank() {
            return Err(GridError::DimensionMismatch {
                expected: self.shape.rank(),
                got: axis + 1,
            });
        }
        Ok(())
    }

    fn position_coordinate(&self, axis: usize, position: i64) -> Coordinate {
        Coordinate::zeros(self.shape.rank()).with(axis, position)
    }

    /// Label of `position` along `axis`; [`Value::Null`] when unset.
    pub fn axis_label(&self, axis: usize, position: i64) -> GridResult<Value> {
        self.check_axis(axis)?;
        if position < 0 {
            return Err(GridError::out_of_bounds(&[position], &[self.shape[axis]]));
        }
        match self.axes.get(&axis) {
            Some(labels) if position < labels.shape()[axis] => {
                labels.get(&self.position_coordinate(axis, position))
            }
            _ => Ok(Value::Null),
        }
    }

    /// Label `position` along `axis`, growing the axis label container as needed.
    pub fn set_axis_label(&mut self, axis: usize, position: i64, label: Value) -> GridResult<()> {
        self.check_axis(axis)?;
        if position < 0 {
            return Err(GridError::out_of_bounds(&[position], &[self.shape[axis]]));
        }
        let owner_extent = self.shape[axis].max(0) as usize;
        let needed = owner_extent.max(position as usize + 1);
        let label_shape = self.label_shape(axis, needed);
        let coord = self.position_coordinate(axis, position);
        let labels = self
            .axes
            .entry(axis)
            .or_insert_with(|| DenseND::zeros(&label_shape));
        if labels.extents()[axis] < needed {
            *labels = labels.resized(&label_shape)?;
        }
        labels.set(&coord, label)
    }

    /// Label container for `axis`, if any label was set on it.
    pub fn axis_labels(&self, axis: usize) -> Option<&DenseND<Value>> {
        self.axes.get(&axis)
    }

    /// Position of the first cell along `axis` labelled `label`.
    ///
    /// Returns a coordinate of the owner's rank with the position on `axis` and
    /// zero elsewhere, or [`Coordinate::not_found`] when no position carries
    /// the label. Unset positions read as [`Value::Null`], so searching for
    /// `Null` never matches.
    pub fn find_position_for_label(&self, axis: usize, label: &Value) -> Coordinate {
        let rank = self.shape.rank();
        let Some(labels) = self.axes.get(&axis).filter(|_| *label != Value::Null) else {
            return Coordinate::not_found(rank);
        };
        (0..labels.shape()[axis])
            .map(|position| self.position_coordinate(axis, position))
            .find(|coord| labels.get(coord).is_ok_and(|v| v == *label))
            .unwrap_or_else(|| Coordinate::not_found(rank))
    }

    pub fn row_label(&self, row: i64) -> GridResult<Value> {
        self.axis_label(ROW, row)
    }

    pub fn set_row_label(&mut self, row: i64, label: Value) -> GridResult<()> {
        self.set_axis_label(ROW, row, label)
    }

    pub fn column_label(&self, column: i64) -> GridResult<Value> {
        self.axis_label(COLUMN, column)
    }

    pub fn set_column_label(&mut self, column: i64, label: Value) -> GridResult<()> {
        self.set_axis_label(COLUMN, column, label)
    }

    /// Whether any label is set.
    pub fn has_labels(&self) -> bool {
        self.label.is_some() || !self.axes.is_empty()
    }

    /// Track a new owner shape, growing label containers so every axis still
    /// covers the owner's extent.
    pub fn fit_shape(&mut self, shape: &Coordinate) -> GridResult<()> {
        if shape.rank() != self.shape.rank() {
            return Err(GridError::DimensionMismatch {
                expected: self.shape.rank(),
                got: shape.rank(),
            });
        }
        self.shape = shape.clone();
        let axes: Vec<usize> = self.axes.keys().copied().collect();
        for axis in axes {
            let extent = shape[axis].max(0) as usize;
            let label_shape = self.label_shape(axis, extent);
            if let Some(labels) = self.axes.get_mut(&axis) {
                if labels.extents()[axis] < extent {
                    *labels = labels.resized(&label_shape)?;
                }
            }
        }
        Ok(())
    }

    /// Drop every label. Cell data of the owner is unaffected.
    pub fn clear(&mut self) {
        self.label = None;
        self.axes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_container_shape() {
        let mut a = Annotation::new(&Coordinate::from([4, 3]));
        a.set_column_label(2, Value::from("c2")).unwrap();
        assert_eq!(a.axis_labels(COLUMN).unwrap().extents(), &[1, 3]);
        assert_eq!(a.column_label(2).unwrap(), Value::from("c2"));
        assert_eq!(a.column_label(0).unwrap(), Value::Null);
        assert_eq!(a.row_label(3).unwrap(), Value::Null);
    }

    #[test]
    fn test_grows_beyond_owner_extent() {
        let mut a = Annotation::new(&Coordinate::from([2, 2]));
        a.set_row_label(0, Value::from("first")).unwrap();
        a.set_row_label(5, Value::from("far")).unwrap();
        assert_eq!(a.axis_labels(ROW).unwrap().extents(), &[6, 1]);
        assert_eq!(a.row_label(0).unwrap(), Value::from("first"));
        assert_eq!(
            a.find_position_for_label(ROW, &Value::from("far")),
            Coordinate::from([5, 0])
        );
    }

    #[test]
    fn test_unset_positions_are_not_found() {
        let mut a = Annotation::new(&Coordinate::from([4, 3]));
        a.set_row_label(2, Value::from("x")).unwrap();
        assert_eq!(
            a.find_position_for_label(ROW, &Value::Null),
            Coordinate::from([-1, -1])
        );
        assert!(a.find_position_for_label(COLUMN, &Value::Null).is_not_found());
        assert_eq!(
            a.find_position_for_label(ROW, &Value::from("x")),
            Coordinate::from([2, 0])
        );
    }

    #[test]
    fn test_invalid_axis_and_position() {
        let mut a = Annotation::new(&Coordinate::from([2, 2]));
        assert!(a.set_axis_label(2, 0, Value::from("x")).is_err());
        assert!(a.set_axis_label(ROW, -1, Value::from("x")).is_err());
        assert!(a.axis_label(ROW, -1).is_err());
    }

    #[test]
    fn test_clone_is_independent() {
        let mut a = Annotation::new(&Coordinate::from([2, 2]));
        a.set_row_label(1, Value::from("r1")).unwrap();
        let mut b = a.clone();
        b.set_row_label(1, Value::from("changed")).unwrap();
        assert_eq!(a.row_label(1).unwrap(), Value::from("r1"));
        assert!(a
            .find_position_for_label(ROW, &Value::from("changed"))
            .is_not_found());
    }

    #[test]
    fn test_fit_shape_and_clear() {
        let mut a = Annotation::new(&Coordinate::from([2, 2]));
        a.set_row_label(1, Value::from("r1")).unwrap();
        a.fit_shape(&Coordinate::from([5, 2])).unwrap();
        assert_eq!(a.axis_labels(ROW).unwrap().extents(), &[5, 1]);
        assert_eq!(a.row_label(1).unwrap(), Value::from("r1"));
        a.clear();
        assert!(!a.has_labels());
        assert_eq!(a.row_label(1).unwrap(), Value::Null);
    }
}
