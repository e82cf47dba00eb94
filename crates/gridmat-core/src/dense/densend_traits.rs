//! # DenseND - Trait Implementations
//!
//! This module contains trait implementations for `DenseND`.
//!
//! ## Implemented Traits
//!
//! - `Container`
//! - `Index`
//! - `IndexMut`
//! - `PartialEq`
//! - `Debug`

use super::types::DenseND;
use crate::annotation::Annotation;
use crate::container::{BufferView, Container, StorageKind};
use crate::coordinate::Coordinate;
use crate::element::{Element, ElementKind, Value};
use crate::error::GridResult;
use scirs2_core::ndarray_ext::IxDyn;
use std::fmt;

impl<T: Element> Container for DenseND<T> {
    fn shape(&self) -> Coordinate {
        self.shape.clone()
    }

    fn element_kind(&self) -> ElementKind {
        T::KIND
    }

    fn storage_kind(&self) -> StorageKind {
        StorageKind::Dense
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

    fn f64_buffer(&self) -> Option<BufferView<'_>> {
        let data = T::as_f64_slice(self.data.as_slice_memory_order()?)?;
        Some(BufferView {
            data,
            shape: self.extents(),
            layout: self.layout(),
        })
    }
}

impl<T> std::ops::Index<&[usize]> for DenseND<T> {
    type Output = T;
    fn index(&self, index: &[usize]) -> &Self::Output {
        &self.data[IxDyn(index)]
    }
}

impl<T> std::ops::IndexMut<&[usize]> for DenseND<T> {
    fn index_mut(&mut self, index: &[usize]) -> &mut Self::Output {
        self.version += 1;
        &mut self.data[IxDyn(index)]
    }
}

/// Equality compares shape and cells; layout, labels and version are ignored.
impl<T: PartialEq> PartialEq for DenseND<T> {
    fn eq(&self, other: &Self) -> bool {
        self.data.shape() == other.data.shape() && self.data.iter().eq(other.data.iter())
    }
}

impl<T: fmt::Debug> fmt::Debug for DenseND<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DenseND")
            .field("shape", &self.shape)
            .field("data", &self.data)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Layout;

    #[test]
    fn test_container_typed_access() {
        let mut m = DenseND::<i32>::zeros(&[2, 2]);
        m.set_as_double(&[0, 1], 3.9).unwrap();
        assert_eq!(m.get_as_int(&[0, 1]).unwrap(), 3);
        assert_eq!(m.get_as_string(&[0, 1]).unwrap(), "3");
        assert_eq!(m.get_as_double(&[1, 1]).unwrap(), 0.0);
        assert!(m.get_as_double(&[2, 0]).unwrap_err().is_out_of_bounds());
        assert!(m.set_as_double(&[0, -1], 1.0).unwrap_err().is_out_of_bounds());
    }

    #[test]
    fn test_string_container_rejects_numeric_read() {
        let mut m = DenseND::<String>::zeros(&[1, 2]);
        m.set_as_string(&[0, 0], "abc").unwrap();
        m.set_as_string(&[0, 1], "1.5").unwrap();
        assert!(m.get_as_double(&[0, 0]).is_err());
        assert_eq!(m.get_as_double(&[0, 1]).unwrap(), 1.5);
    }

    #[test]
    fn test_f64_buffer_exposed_only_for_doubles() {
        let d = DenseND::<f64>::with_layout(&[2, 3], Layout::ColumnMajor);
        let buffer = d.f64_buffer().unwrap();
        assert_eq!(buffer.layout, Layout::ColumnMajor);
        assert_eq!(buffer.data.len(), 6);
        assert!(DenseND::<i64>::zeros(&[2, 3]).f64_buffer().is_none());
    }

    #[test]
    fn test_version_bumps_on_write() {
        let mut m = DenseND::<f64>::zeros(&[2, 2]);
        let before = Container::version(&m);
        m.set(&[0, 0], 1.0).unwrap();
        m[&[1, 1][..]] = 2.0;
        assert_eq!(Container::version(&m), before + 2);
    }

    #[test]
    fn test_clone_box_is_deep() {
        let mut m = DenseND::<f64>::zeros(&[2, 2]);
        m.annotation_mut().set_label(Value::from("orig"));
        let mut copy = m.clone_box();
        copy.set_as_double(&[0, 0], 9.0).unwrap();
        copy.annotation_mut().set_label(Value::from("copy"));
        assert_eq!(m.get(&[0, 0]).unwrap(), 0.0);
        assert_eq!(m.annotation().unwrap().label(), Some(&Value::from("orig")));
    }
}
