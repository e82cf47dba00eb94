//! Container factory
//!
//! [`MatrixFactory::make`] is the single construction entry point used by the
//! calculation engine and by external collaborators. It picks a concrete
//! storage from the element kind, the requested density and the shape:
//!
//! | request                                   | storage                      |
//! |-------------------------------------------|------------------------------|
//! | sparse, any rank                          | `SparseMatrix<T>`            |
//! | dense, rank 2                             | `DenseND<T>`, [`FactoryHints::order`] |
//! | dense, rank 2, `Double`, over threshold   | `BlockMatrix<f64>`           |
//! | dense, rank > 2                           | `DenseND<T>`, row-major      |
//!
//! Shapes of rank 0 or 1 are rejected: every container has at least a row
//! and a column dimension.

use crate::hints::{Density, FactoryHints};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use gridmat_core::{
    BlockLayout, BlockMatrix, Container, Coordinate, DenseND, ElementKind, GridError, GridResult,
    Layout, Matrix, Value,
};
use gridmat_sparse::SparseMatrix;
use num_bigint::BigInt;

/// Binds a type alias to the Rust type of an element kind and evaluates
/// `$body` with it.
macro_rules! with_element_type {
    ($kind:expr, $t:ident => $body:expr) => {
        match $kind {
            ElementKind::Double => {
                type $t = f64;
                $body
            }
            ElementKind::Float => {
                type $t = f32;
                $body
            }
            ElementKind::Long => {
                type $t = i64;
                $body
            }
            ElementKind::Int => {
                type $t = i32;
                $body
            }
            ElementKind::Short => {
                type $t = i16;
                $body
            }
            ElementKind::Byte => {
                type $t = i8;
                $body
            }
            ElementKind::Char => {
                type $t = char;
                $body
            }
            ElementKind::Boolean => {
                type $t = bool;
                $body
            }
            ElementKind::BigInteger => {
                type $t = BigInt;
                $body
            }
            ElementKind::BigDecimal => {
                type $t = BigDecimal;
                $body
            }
            ElementKind::Date => {
                type $t = DateTime<Utc>;
                $body
            }
            ElementKind::String => {
                type $t = String;
                $body
            }
            ElementKind::Object => {
                type $t = Value;
                $body
            }
        }
    };
}

/// Chooses and allocates storage for new containers.
#[derive(Clone, Debug, Default)]
pub struct MatrixFactory {
    hints: FactoryHints,
}

impl MatrixFactory {
    pub fn new(hints: FactoryHints) -> Self {
        Self { hints }
    }

    pub fn hints(&self) -> &FactoryHints {
        &self.hints
    }

    /// The same factory without a sparse capacity cap, for allocating
    /// calculation results that must hold every computed cell.
    pub fn uncapped(&self) -> MatrixFactory {
        let mut hints = self.hints.clone();
        hints.max_entries = None;
        Self { hints }
    }

    /// Allocate a default-filled container.
    ///
    /// # Examples
    ///
    /// ```
    /// use gridmat_core::{ElementKind, StorageKind};
    /// use gridmat_exec::{Density, MatrixFactory};
    ///
    /// let factory = MatrixFactory::default();
    /// let m = factory.make(ElementKind::Int, Density::Sparse, &[1000, 1000]).unwrap();
    /// assert_eq!(m.storage_kind(), StorageKind::Sparse);
    /// assert_eq!(m.get_as_double(&[999, 999]).unwrap(), 0.0);
    ///
    /// assert!(factory.make(ElementKind::Int, Density::Dense, &[5]).is_err());
    /// ```
    pub fn make(&self, kind: ElementKind, density: Density, shape: &[i64]) -> GridResult<Matrix> {
        Ok(Matrix::from_box(self.make_boxed(kind, density, shape)?))
    }

    /// Allocate with the density preferred by the hints.
    pub fn make_default(&self, kind: ElementKind, shape: &[i64]) -> GridResult<Matrix> {
        self.make(kind, self.hints.default_density(), shape)
    }

    /// Allocate without wrapping in a shared handle.
    pub fn make_boxed(
        &self,
        kind: ElementKind,
        density: Density,
        shape: &[i64],
    ) -> GridResult<Box<dyn Container>> {
        if shape.len() < 2 {
            return Err(GridError::invalid_shape(format!(
                "containers need at least 2 dimensions, got {}",
                shape.len()
            )));
        }
        let extents = Coordinate::new(shape).to_extents()?;
        tracing::debug!(%kind, ?density, ?extents, "allocating container");

        // sparse shapes only need to be addressable, not allocatable
        let cells = match density {
            Density::Dense => Some(dense_cells(&extents)?),
            Density::Sparse => None,
        };

        let container: Box<dyn Container> = match density {
            Density::Sparse => with_element_type!(kind, T => {
                let m = match self.hints.max_entries {
                    Some(cap) => SparseMatrix::<T>::with_max_entries(&extents, cap),
                    None => SparseMatrix::<T>::new(&extents),
                };
                Box::new(m) as Box<dyn Container>
            }),
            Density::Dense if extents.len() == 2 && self.use_blocks(kind, cells.unwrap_or(0)) => {
                let layout = BlockLayout::square(
                    extents[0],
                    extents[1],
                    self.hints.block_side,
                    self.hints.block_order,
                )?;
                Box::new(BlockMatrix::<f64>::with_layout(layout))
            }
            Density::Dense => {
                let layout = if extents.len() == 2 {
                    self.hints.order
                } else {
                    Layout::RowMajor
                };
                with_element_type!(kind, T => {
                    Box::new(DenseND::<T>::with_layout(&extents, layout)) as Box<dyn Container>
                })
            }
        };
        Ok(container)
    }

    /// Whether a dense request of this kind and shape yields flat `DenseND`
    /// storage, so a calculation may build its result buffer directly.
    pub fn yields_flat_dense(&self, kind: ElementKind, extents: &[usize]) -> bool {
        extents.len() != 2
            || !checked_cells(extents).is_some_and(|cells| self.use_blocks(kind, cells))
    }

    fn use_blocks(&self, kind: ElementKind, cells: usize) -> bool {
        kind == ElementKind::Double && self.hints.block_threshold.is_some_and(|t| cells >= t)
    }
}

fn checked_cells(extents: &[usize]) -> Option<usize> {
    extents.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

/// Cell count of a dense allocation; shapes too large to address are rejected.
fn dense_cells(extents: &[usize]) -> GridResult<usize> {
    checked_cells(extents).ok_or_else(|| {
        GridError::invalid_shape(format!("dense shape {:?} overflows the address space", extents))
    })
}
