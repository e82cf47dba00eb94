//! Version-keyed aggregate caching, centering and standardisation
//!
//! Aggregates such as a per-column mean are expensive to recompute for every
//! cell of a linked view. [`AggregateCache`] keeps one table per calculation
//! and recomputes it whenever the source's modification version differs from
//! the version the table was built at, so linked views never serve stale
//! aggregates.

use super::reduce::{Reduce, ReduceOp};
use crate::calculation::Calculation;
use gridmat_core::{Coordinate, DenseND, Dimension, ElementKind, GridResult, Matrix, Value};
use parking_lot::Mutex;
use std::sync::Arc;

/// One aggregate table, tagged with the source version it was built from.
#[derive(Debug, Default)]
pub struct AggregateCache {
    slot: Mutex<Option<(u64, Arc<DenseND<f64>>)>>,
}

impl AggregateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached table for `version`, rebuilt with `build` when missing or stale.
    pub fn get_or_compute<F>(&self, version: u64, build: F) -> GridResult<Arc<DenseND<f64>>>
    where
        F: FnOnce() -> GridResult<DenseND<f64>>,
    {
        let mut slot = self.slot.lock();
        if let Some((cached, table)) = slot.as_ref() {
            if *cached == version {
                return Ok(Arc::clone(table));
            }
        }
        let table = Arc::new(build()?);
        tracing::trace!(version, cells = table.len(), "aggregate cache rebuilt");
        *slot = Some((version, Arc::clone(&table)));
        Ok(table)
    }

    /// Version of the cached table, if any.
    pub fn cached_version(&self) -> Option<u64> {
        self.slot.lock().as_ref().map(|(v, _)| *v)
    }

    pub fn invalidate(&self) {
        *self.slot.lock() = None;
    }
}

/// Coordinate of the aggregate covering `coord`.
pub(crate) fn project(coord: &[i64], dimension: Dimension) -> Coordinate {
    coord
        .iter()
        .enumerate()
        .map(|(axis, &c)| if dimension.collapses(axis) { 0 } else { c })
        .collect()
}

/// `x - mean`, with the mean taken along a reduction dimension.
#[derive(Debug)]
pub struct Center {
    mean: Reduce,
    means: AggregateCache,
}

impl Center {
    pub fn new(source: &Matrix, dimension: Dimension, ignore_nan: bool) -> GridResult<Self> {
        Ok(Self {
            mean: Reduce::new(ReduceOp::Mean, source, dimension, ignore_nan)?,
            means: AggregateCache::new(),
        })
    }
}

impl Calculation for Center {
    fn name(&self) -> &'static str {
        "center"
    }

    fn sources(&self) -> &[Matrix] {
        self.mean.sources()
    }

    fn dimension(&self) -> Option<Dimension> {
        Some(self.mean.reduction())
    }

    fn shape(&self) -> Coordinate {
        self.mean.source().shape()
    }

    fn element_kind(&self) -> ElementKind {
        ElementKind::Double
    }

    fn compute(&self, coord: &[i64]) -> GridResult<Value> {
        let source = self.mean.source();
        let x = source.get(coord)?.to_f64()?;
        let means = self
            .means
            .get_or_compute(source.version(), || self.mean.table())?;
        let mean = means.get(&project(coord, self.mean.reduction()))?;
        Ok(Value::Double(x - mean))
    }
}

/// `(x - mean) / std` along a reduction dimension; 0 where `std` is 0.
#[derive(Debug)]
pub struct Standardize {
    mean: Reduce,
    std: Reduce,
    means: AggregateCache,
    stds: AggregateCache,
}

impl Standardize {
    pub fn new(source: &Matrix, dimension: Dimension, ignore_nan: bool) -> GridResult<Self> {
        Ok(Self {
            mean: Reduce::new(ReduceOp::Mean, source, dimension, ignore_nan)?,
            std: Reduce::new(ReduceOp::Std, source, dimension, ignore_nan)?,
            means: AggregateCache::new(),
            stds: AggregateCache::new(),
        })
    }
}

impl Calculation for Standardize {
    fn name(&self) -> &'static str {
        "standardize"
    }

    fn sources(&self) -> &[Matrix] {
        self.mean.sources()
    }

    fn dimension(&self) -> Option<Dimension> {
        Some(self.mean.reduction())
    }

    fn shape(&self) -> Coordinate {
        self.mean.source().shape()
    }

    fn element_kind(&self) -> ElementKind {
        ElementKind::Double
    }

    fn compute(&self, coord: &[i64]) -> GridResult<Value> {
        let source = self.mean.source();
        let version = source.version();
        let x = source.get(coord)?.to_f64()?;
        let at = project(coord, self.mean.reduction());
        let mean = self
            .means
            .get_or_compute(version, || self.mean.table())?
            .get(&at)?;
        let std = self
            .stds
            .get_or_compute(version, || self.std.table())?
            .get(&at)?;
        if std == 0.0 {
            return Ok(Value::Double(0.0));
        }
        Ok(Value::Double((x - mean) / std))
    }
}
