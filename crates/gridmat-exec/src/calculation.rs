//! Calculations and their materialisation modes
//!
//! A [`Calculation`] pairs one or more source [`Matrix`] handles with a
//! per-cell function. It never stores results itself; one of three modes
//! decides where values end up:
//!
//! - [`calc_new`](CalculationExt::calc_new): allocate a container through the
//!   factory and fill every cell once. The result is decoupled from the
//!   sources.
//! - [`calc_link`](CalculationExt::calc_link): wrap the calculation in a
//!   read-only [`LinkedMatrix`] view that recomputes a cell on every read, so
//!   reads always reflect the current sources. The view holds the sources
//!   through shared handles and may outlive the scope that created them.
//! - [`calc_orig`](CalculationExt::calc_orig): overwrite the first source in
//!   place. Only allowed when the output shape equals the source shape.
//!
//! # Examples
//!
//! ```
//! use gridmat_core::{DenseND, Matrix};
//! use gridmat_exec::{CalculationExt, MatrixCalcExt};
//!
//! let source = Matrix::new(DenseND::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap());
//!
//! let copy = source.plus_scalar(10.0).unwrap().calc_new().unwrap();
//! let view = source.plus_scalar(10.0).unwrap().calc_link();
//!
//! source.set_as_double(&[0, 0], 100.0).unwrap();
//! assert_eq!(copy.get_as_double(&[0, 0]).unwrap(), 11.0);
//! assert_eq!(view.get_as_double(&[0, 0]).unwrap(), 110.0);
//! ```

use crate::factory::MatrixFactory;
use crate::hints::Density;
use gridmat_core::coordinate::checked_index;
use gridmat_core::{
    Annotation, Container, Coordinate, Dimension, ElementKind, GridError, GridResult, Matrix,
    StorageKind, Value,
};
use std::fmt;
use std::sync::Arc;

/// Materialisation mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Ret {
    /// Fresh container holding computed values
    New,
    /// Live read-only view
    Link,
    /// Overwrite the first source
    Orig,
}

/// A per-cell function over source containers.
///
/// Implementations must be referentially transparent: two reads of the same
/// coordinate with no source write in between yield the same value.
/// Calculations that cache whole-source aggregates key the cache on the
/// sources' [`version`](Matrix::version).
pub trait Calculation: fmt::Debug + Send + Sync {
    /// Short operation name for logs and errors.
    fn name(&self) -> &'static str;

    /// Source containers, first one is the in-place target.
    fn sources(&self) -> &[Matrix];

    /// Reduction dimension, if the calculation collapses its output.
    fn dimension(&self) -> Option<Dimension> {
        None
    }

    /// Output shape, derived from the source shapes.
    fn shape(&self) -> Coordinate;

    /// Output element kind.
    fn element_kind(&self) -> ElementKind;

    /// Value of the output cell at `coord`.
    fn compute(&self, coord: &[i64]) -> GridResult<Value>;

    /// Whether default source cells map to default output cells, so a sparse
    /// first source can be materialised by visiting its stored entries only.
    fn preserves_sparsity(&self) -> bool {
        false
    }

    /// Output coordinate fed by a source coordinate, for sparsity-preserving
    /// calculations.
    fn map_coordinate(&self, coord: &Coordinate) -> Coordinate {
        coord.clone()
    }

    /// Whole result in one pass, when the sources allow a faster route than
    /// cell-by-cell evaluation.
    fn compute_all(&self, _factory: &MatrixFactory) -> GridResult<Option<Matrix>> {
        Ok(None)
    }
}

/// Materialisation modes for every [`Calculation`].
pub trait CalculationExt: Calculation + Sized + 'static {
    /// Eager copy using a default factory.
    fn calc_new(&self) -> GridResult<Matrix> {
        self.calc_new_with(&MatrixFactory::default())
    }

    /// Eager copy allocated by `factory`.
    ///
    /// The factory's `max_entries` cap is not applied to the result: a
    /// capped target would evict computed cells and disagree with
    /// [`calc_link`](Self::calc_link).
    fn calc_new_with(&self, factory: &MatrixFactory) -> GridResult<Matrix> {
        let span = tracing::debug_span!("calc_new", op = self.name());
        let _enter = span.enter();
        let factory = &factory.uncapped();

        if let Some(out) = self.compute_all(factory)? {
            tracing::trace!("buffer fast path");
            carry_annotation(self, &out);
            return Ok(out);
        }

        let shape = self.shape();
        let sparse_first = self
            .sources()
            .first()
            .filter(|s| self.preserves_sparsity() && s.storage_kind() == StorageKind::Sparse);
        let density = if sparse_first.is_some() {
            Density::Sparse
        } else {
            Density::Dense
        };
        let out = factory.make(self.element_kind(), density, &shape)?;
        {
            let mut target = out.write();
            match sparse_first {
                Some(source) => {
                    for coord in source.available_coordinates() {
                        let at = self.map_coordinate(&coord);
                        target.set_value(&at, self.compute(&at)?)?;
                    }
                }
                None => {
                    for coord in shape.iter_cells() {
                        target.set_value(&coord, self.compute(&coord)?)?;
                    }
                }
            }
        }
        carry_annotation(self, &out);
        Ok(out)
    }

    /// Live view recomputing each read.
    fn calc_link(self) -> Matrix {
        tracing::debug!(op = self.name(), "linking calculation");
        Matrix::new(LinkedMatrix::new(self))
    }

    /// Overwrite the first source and return it.
    ///
    /// Every value is computed before the first write, so a failure leaves
    /// the source untouched.
    fn calc_orig(&self) -> GridResult<Matrix> {
        let span = tracing::debug_span!("calc_orig", op = self.name());
        let _enter = span.enter();

        let target = self
            .sources()
            .first()
            .cloned()
            .ok_or_else(|| GridError::unsupported("calc_orig", "calculation without sources"))?;
        let shape = self.shape();
        let target_shape = target.shape();
        if shape != target_shape {
            return Err(GridError::CannotResizeInPlace {
                source_shape: target_shape.to_vec(),
                result_shape: shape.to_vec(),
            });
        }
        if target.storage_kind() == StorageKind::View {
            return Err(GridError::ReadOnly(format!(
                "{} cannot write into a linked view",
                self.name()
            )));
        }

        let kind = target.element_kind();
        let values = shape
            .iter_cells()
            .map(|coord| {
                let value = self.compute(&coord)?.convert(kind)?;
                Ok((coord, value))
            })
            .collect::<GridResult<Vec<_>>>()?;

        {
            let mut guard = target.write();
            for (coord, value) in values {
                guard.set_value(&coord, value)?;
            }
        }
        Ok(target)
    }

    /// Materialise in the given mode.
    fn calc(self, ret: Ret) -> GridResult<Matrix> {
        match ret {
            Ret::New => self.calc_new(),
            Ret::Link => Ok(self.calc_link()),
            Ret::Orig => self.calc_orig(),
        }
    }
}

impl<C: Calculation + 'static> CalculationExt for C {}

/// Labels a derived container inherits from the first source.
///
/// Same-shaped results take a full copy; anything else keeps only the
/// whole-container label.
fn inherited_annotation(calc: &dyn Calculation) -> Option<Annotation> {
    let first = calc.sources().first()?;
    let source = first.annotation()?;
    let shape = calc.shape();
    if first.shape() == shape {
        return Some(source);
    }
    let label = source.label()?.clone();
    let mut annotation = Annotation::new(&shape);
    annotation.set_label(label);
    Some(annotation)
}

fn carry_annotation(calc: &dyn Calculation, out: &Matrix) {
    if let Some(annotation) = inherited_annotation(calc) {
        out.set_annotation(Some(annotation));
    }
}

/// Read-only view evaluating a calculation on every read.
#[derive(Clone, Debug)]
pub struct LinkedMatrix {
    calc: Arc<dyn Calculation>,
    annotation: Option<Annotation>,
}

impl LinkedMatrix {
    pub fn new<C: Calculation + 'static>(calc: C) -> Self {
        let annotation = inherited_annotation(&calc);
        Self {
            calc: Arc::new(calc),
            annotation,
        }
    }

    /// The calculation behind the view.
    pub fn calculation(&self) -> &dyn Calculation {
        self.calc.as_ref()
    }
}

impl Container for LinkedMatrix {
    fn shape(&self) -> Coordinate {
        self.calc.shape()
    }

    fn element_kind(&self) -> ElementKind {
        self.calc.element_kind()
    }

    fn storage_kind(&self) -> StorageKind {
        StorageKind::View
    }

    fn get_value(&self, coord: &[i64]) -> GridResult<Value> {
        checked_index(coord, &self.calc.shape())?;
        self.calc.compute(coord)
    }

    fn set_value(&mut self, _coord: &[i64], _value: Value) -> GridResult<()> {
        Err(GridError::ReadOnly(format!(
            "linked view of {}",
            self.calc.name()
        )))
    }

    /// Changes whenever any source is written.
    fn version(&self) -> u64 {
        self.calc
            .sources()
            .iter()
            .fold(0u64, |acc, s| acc.wrapping_add(s.version()))
    }

    fn annotation(&self) -> Option<&Annotation> {
        self.annotation.as_ref()
    }

    fn annotation_mut(&mut self) -> &mut Annotation {
        let shape = self.calc.shape();
        self.annotation.get_or_insert_with(|| Annotation::new(&shape))
    }

    fn set_annotation(&mut self, annotation: Option<Annotation>) {
        self.annotation = annotation;
    }

    /// Copies the labels; the calculation and its sources stay shared.
    fn clone_box(&self) -> Box<dyn Container> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hints::FactoryHints;
    use crate::ops::MatrixCalcExt;
    use gridmat_core::DenseND;
    use gridmat_sparse::SparseMatrix;

    fn two_by_two() -> Matrix {
        Matrix::new(DenseND::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap())
    }

    #[test]
    fn test_link_is_live() {
        let source = two_by_two();
        let link = source.plus_scalar(10.0).unwrap().calc_link();
        assert_eq!(link.get_as_double(&[0, 0]).unwrap(), 11.0);
        source.set_as_double(&[0, 0], 100.0).unwrap();
        assert_eq!(link.get_as_double(&[0, 0]).unwrap(), 110.0);
        assert_eq!(link.storage_kind(), StorageKind::View);
    }

    #[test]
    fn test_link_is_read_only_and_bounds_checked() {
        let link = two_by_two().plus_scalar(1.0).unwrap().calc_link();
        assert!(matches!(
            link.set_as_double(&[0, 0], 1.0),
            Err(GridError::ReadOnly(_))
        ));
        assert!(link.get(&[2, 0]).unwrap_err().is_out_of_bounds());
    }

    #[test]
    fn test_link_outlives_source_handle() {
        let link = {
            let source = two_by_two();
            source.times_scalar(2.0).unwrap().calc_link()
        };
        assert_eq!(link.get_as_double(&[1, 1]).unwrap(), 8.0);
    }

    #[test]
    fn test_new_is_decoupled() {
        let source = two_by_two();
        let copy = source.plus_scalar(10.0).unwrap().calc_new().unwrap();
        source.set_as_double(&[1, 0], -5.0).unwrap();
        assert_eq!(copy.get_as_double(&[1, 0]).unwrap(), 13.0);
        assert_eq!(copy.storage_kind(), StorageKind::Dense);
    }

    #[test]
    fn test_orig_overwrites_first_source() {
        let source = two_by_two();
        let result = source.times_scalar(3.0).unwrap().calc_orig().unwrap();
        assert!(result.ptr_eq(&source));
        assert_eq!(source.get_as_double(&[1, 1]).unwrap(), 12.0);
    }

    #[test]
    fn test_orig_rejects_shape_change_without_writes() {
        let source = Matrix::new(
            DenseND::from_rows(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap(),
        );
        let before = source.version();
        let err = source.transpose().unwrap().calc_orig().unwrap_err();
        assert!(matches!(err, GridError::CannotResizeInPlace { .. }));
        assert_eq!(source.version(), before);
        assert_eq!(source.get_as_double(&[0, 2]).unwrap(), 3.0);
    }

    #[test]
    fn test_orig_conversion_failure_leaves_source_untouched() {
        let mut ints = DenseND::<i32>::zeros(&[1, 3]);
        ints.set(&[0, 0], 7).unwrap();
        let source = Matrix::new(ints);
        let labels = Matrix::new(DenseND::<String>::from_elem(&[1, 3], "x".to_string()));
        // 7 + "x" fails on the first cell it reaches.
        let calc = source.plus(&labels).unwrap();
        assert!(calc.calc_orig().is_err());
        assert_eq!(source.get(&[0, 0]).unwrap(), Value::Int(7));
    }

    #[test]
    fn test_orig_into_view_rejected() {
        let view = two_by_two().plus_scalar(1.0).unwrap().calc_link();
        let err = view.negate().calc_orig().unwrap_err();
        assert!(matches!(err, GridError::ReadOnly(_)));
    }

    #[test]
    fn test_new_twice_is_identical() {
        let source = two_by_two();
        let calc = source.divide_scalar(3.0).unwrap();
        let a = calc.calc_new().unwrap();
        let b = calc.calc_new().unwrap();
        for coord in a.all_coordinates() {
            let x = a.get_as_double(&coord).unwrap();
            let y = b.get_as_double(&coord).unwrap();
            assert_eq!(x.to_bits(), y.to_bits());
        }
    }

    #[test]
    fn test_sparse_source_stays_sparse() {
        let mut sparse = SparseMatrix::<f64>::new(&[1000, 1000]);
        sparse.set(&[3, 7], -2.0).unwrap();
        let source = Matrix::new(sparse);
        let abs = source.abs().calc_new().unwrap();
        assert_eq!(abs.storage_kind(), StorageKind::Sparse);
        assert_eq!(abs.available_coordinates().count(), 1);
        assert_eq!(abs.get_as_double(&[3, 7]).unwrap(), 2.0);

        let t = source.transpose().unwrap().calc_new().unwrap();
        assert_eq!(t.get_as_double(&[7, 3]).unwrap(), -2.0);
        assert_eq!(t.available_coordinates().count(), 1);
    }

    #[test]
    fn test_capped_factory_keeps_every_result_cell() {
        let mut sparse = SparseMatrix::<f64>::new(&[20, 20]);
        for i in 0..6 {
            sparse.set(&[i, 2 * i], i as f64 + 1.0).unwrap();
        }
        let source = Matrix::new(sparse);
        let factory = MatrixFactory::new(FactoryHints::new().with_sparse(true).with_max_entries(2));

        let fresh = source.negate().calc_new_with(&factory).unwrap();
        let linked = source.negate().calc_link();
        assert_eq!(fresh.storage_kind(), StorageKind::Sparse);
        assert_eq!(fresh.available_coordinates().count(), 6);
        for coord in source.all_coordinates() {
            assert_eq!(fresh.get(&coord).unwrap(), linked.get(&coord).unwrap(), "{coord}");
        }

        // containers made directly still honour the cap
        let direct = factory.make_default(ElementKind::Double, &[20, 20]).unwrap();
        for i in 0..6 {
            direct.set_as_double(&[i, i], 1.0).unwrap();
        }
        assert_eq!(direct.available_coordinates().count(), 2);
    }

    #[test]
    fn test_ret_dispatch() {
        let source = two_by_two();
        let linked = source.plus_scalar(1.0).unwrap().calc(Ret::Link).unwrap();
        assert_eq!(linked.storage_kind(), StorageKind::View);
        let fresh = source.plus_scalar(1.0).unwrap().calc(Ret::New).unwrap();
        assert!(!fresh.ptr_eq(&source));
        let same = source.plus_scalar(1.0).unwrap().calc(Ret::Orig).unwrap();
        assert!(same.ptr_eq(&source));
    }

    #[test]
    fn test_annotation_travels_with_results() {
        let source = two_by_two();
        source
            .with_annotation(|a| {
                a.set_label(Value::from("prices"));
                a.set_row_label(1, Value::from("tue"))
            })
            .unwrap();
        let same_shape = source.plus_scalar(1.0).unwrap().calc_new().unwrap();
        let copied = same_shape.annotation().unwrap();
        assert_eq!(copied.row_label(1).unwrap(), Value::from("tue"));

        let reduced = source.sum(Dimension::Row).unwrap().calc_link();
        let kept = reduced.annotation().unwrap();
        assert_eq!(kept.label(), Some(&Value::from("prices")));
        assert_eq!(kept.row_label(0).unwrap(), Value::Null);
    }
}
