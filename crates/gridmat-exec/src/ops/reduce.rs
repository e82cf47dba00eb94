//! Reductions along ROW, COLUMN or ALL
//!
//! A reduction collapses the reduced axes of its source to extent 1: an
//! `R x C` source summed along [`Dimension::Row`] yields a `1 x C` result,
//! along [`Dimension::Column`] an `R x 1` result, and along
//! [`Dimension::All`] a `1 x 1` result. Each output cell aggregates the
//! slice of source cells that project onto it.

use super::stats::{project, AggregateCache};
use crate::calculation::Calculation;
use crate::factory::MatrixFactory;
use gridmat_core::{
    Container, Coordinate, DenseND, Dimension, ElementKind, GridError, GridResult, Layout,
    Matrix, StorageKind, Value,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReduceOp {
    Sum,
    Mean,
    Min,
    Max,
    /// Cells holding something other than the default value
    Count,
    /// Sample variance, `n - 1` in the denominator
    Var,
    /// Square root of the sample variance
    Std,
}

impl ReduceOp {
    pub fn name(self) -> &'static str {
        match self {
            ReduceOp::Sum => "sum",
            ReduceOp::Mean => "mean",
            ReduceOp::Min => "min",
            ReduceOp::Max => "max",
            ReduceOp::Count => "count",
            ReduceOp::Var => "var",
            ReduceOp::Std => "std",
        }
    }

    fn needs_mean(self) -> bool {
        matches!(self, ReduceOp::Var | ReduceOp::Std)
    }
}

/// Aggregate of one slice of the source per output cell.
///
/// Variance and standard deviation reuse a per-calculation table of slice
/// means, rebuilt whenever the source version changes.
#[derive(Debug)]
pub struct Reduce {
    op: ReduceOp,
    sources: [Matrix; 1],
    dimension: Dimension,
    ignore_nan: bool,
    means: AggregateCache,
}

impl Reduce {
    pub fn new(
        op: ReduceOp,
        source: &Matrix,
        dimension: Dimension,
        ignore_nan: bool,
    ) -> GridResult<Self> {
        if source.rank() < 2 {
            return Err(GridError::invalid_shape(format!(
                "{} needs a source with at least 2 dimensions, got shape {}",
                op.name(),
                source.shape()
            )));
        }
        Ok(Self {
            op,
            sources: [source.clone()],
            dimension,
            ignore_nan,
            means: AggregateCache::new(),
        })
    }

    pub fn op(&self) -> ReduceOp {
        self.op
    }

    pub fn source(&self) -> &Matrix {
        &self.sources[0]
    }

    /// Reduction dimension.
    pub fn reduction(&self) -> Dimension {
        self.dimension
    }

    /// Extents of the slice aggregated into each output cell.
    fn slice_extents(&self, source_shape: &Coordinate) -> Coordinate {
        source_shape
            .iter()
            .enumerate()
            .map(|(axis, &d)| if self.dimension.collapses(axis) { d } else { 1 })
            .collect()
    }

    /// Every output cell as a row-major table of doubles.
    pub fn table(&self) -> GridResult<DenseND<f64>> {
        let shape = self.shape();
        let mut table = DenseND::<f64>::zeros(&shape.to_extents()?);
        for coord in shape.iter_cells() {
            let value = self.aggregate(&coord)?;
            table.set(&coord, value)?;
        }
        Ok(table)
    }

    fn aggregate(&self, coord: &[i64]) -> GridResult<f64> {
        let mean = if self.op.needs_mean() {
            let means = self
                .means
                .get_or_compute(self.source().version(), || self.slice_means())?;
            means.get(coord)?
        } else {
            0.0
        };

        let guard = self.source().read();
        let base = project(coord, self.dimension);
        let slice = self.slice_extents(&guard.shape());
        let mut acc = Accumulator::new(self.op, self.ignore_nan, mean);
        for offset in slice.iter_cells() {
            let at = offset.plus(&base);
            let value = guard.get_value(&at)?;
            if self.op == ReduceOp::Count {
                acc.count(!value.is_default());
            } else {
                acc.push(value.to_f64()?);
            }
        }
        Ok(acc.finish())
    }

    fn slice_means(&self) -> GridResult<DenseND<f64>> {
        let mean = Reduce::new(
            ReduceOp::Mean,
            self.source(),
            self.dimension,
            self.ignore_nan,
        )?;
        mean.table()
    }

    /// Sum, mean and count over the stored entries of a sparse source only.
    fn sparse_table(&self, source: &dyn Container) -> GridResult<DenseND<f64>> {
        let source_shape = source.shape();
        let shape = self.dimension.reduce_shape(&source_shape);
        let extents = shape.to_extents()?;
        let mut totals = DenseND::<f64>::zeros(&extents);
        let mut skipped = DenseND::<f64>::zeros(&extents);
        for coord in source.available_coordinates() {
            let value = source.get_value(&coord)?;
            let at = project(&coord, self.dimension);
            match self.op {
                ReduceOp::Count => {
                    if !value.is_default() {
                        totals.set(&at, totals.get(&at)? + 1.0)?;
                    }
                }
                _ => {
                    let x = value.to_f64()?;
                    if x.is_nan() && self.ignore_nan {
                        skipped.set(&at, skipped.get(&at)? + 1.0)?;
                    } else {
                        totals.set(&at, totals.get(&at)? + x)?;
                    }
                }
            }
        }
        if self.op == ReduceOp::Mean {
            let slice_len: f64 = self
                .slice_extents(&source_shape)
                .iter()
                .map(|&d| d as f64)
                .product();
            for coord in shape.iter_cells() {
                let n = slice_len - skipped.get(&coord)?;
                let mean = if n > 0.0 {
                    totals.get(&coord)? / n
                } else {
                    f64::NAN
                };
                totals.set(&coord, mean)?;
            }
        }
        Ok(totals)
    }
}

/// Running state for one output cell.
struct Accumulator {
    op: ReduceOp,
    ignore_nan: bool,
    mean: f64,
    n: usize,
    total: f64,
    extreme: Option<f64>,
    saw_nan: bool,
}

impl Accumulator {
    fn new(op: ReduceOp, ignore_nan: bool, mean: f64) -> Self {
        Self {
            op,
            ignore_nan,
            mean,
            n: 0,
            total: 0.0,
            extreme: None,
            saw_nan: false,
        }
    }

    fn count(&mut self, hit: bool) {
        if hit {
            self.n += 1;
        }
    }

    fn push(&mut self, x: f64) {
        if x.is_nan() {
            if !self.ignore_nan {
                self.saw_nan = true;
            }
            return;
        }
        self.n += 1;
        match self.op {
            ReduceOp::Sum | ReduceOp::Mean => self.total += x,
            ReduceOp::Var | ReduceOp::Std => self.total += (x - self.mean).powi(2),
            ReduceOp::Min => self.extreme = Some(self.extreme.map_or(x, |e| e.min(x))),
            ReduceOp::Max => self.extreme = Some(self.extreme.map_or(x, |e| e.max(x))),
            ReduceOp::Count => {}
        }
    }

    fn finish(self) -> f64 {
        if self.op == ReduceOp::Count {
            return self.n as f64;
        }
        if self.saw_nan {
            return f64::NAN;
        }
        match self.op {
            ReduceOp::Sum => self.total,
            ReduceOp::Mean if self.n > 0 => self.total / self.n as f64,
            ReduceOp::Var if self.n > 1 => self.total / (self.n - 1) as f64,
            ReduceOp::Std if self.n > 1 => (self.total / (self.n - 1) as f64).sqrt(),
            ReduceOp::Min | ReduceOp::Max => self.extreme.unwrap_or(f64::NAN),
            _ => f64::NAN,
        }
    }
}

impl Calculation for Reduce {
    fn name(&self) -> &'static str {
        self.op.name()
    }

    fn sources(&self) -> &[Matrix] {
        &self.sources
    }

    fn dimension(&self) -> Option<Dimension> {
        Some(self.dimension)
    }

    fn shape(&self) -> Coordinate {
        self.dimension.reduce_shape(&self.source().shape())
    }

    fn element_kind(&self) -> ElementKind {
        match self.op {
            ReduceOp::Count => ElementKind::Long,
            _ => ElementKind::Double,
        }
    }

    fn compute(&self, coord: &[i64]) -> GridResult<Value> {
        let value = self.aggregate(coord)?;
        Ok(match self.op {
            ReduceOp::Count => Value::Long(value as i64),
            _ => Value::Double(value),
        })
    }

    fn compute_all(&self, _factory: &MatrixFactory) -> GridResult<Option<Matrix>> {
        if !matches!(self.op, ReduceOp::Sum | ReduceOp::Mean | ReduceOp::Count) {
            return Ok(None);
        }
        let guard = self.source().read();
        if guard.storage_kind() != StorageKind::Sparse {
            return Ok(None);
        }
        // skipped defaults must still be readable as numbers
        if self.op != ReduceOp::Count && guard.element_kind().default_value().to_f64().is_err() {
            return Ok(None);
        }
        let table = self.sparse_table(&**guard)?;
        tracing::trace!(op = self.op.name(), "reduced stored entries only");
        Ok(Some(match self.op {
            ReduceOp::Count => Matrix::new(DenseND::<i64>::from_container(&table, Layout::RowMajor)?),
            _ => Matrix::new(table),
        }))
    }
}
