//! Single-source calculations: cell maps, transpose, kind conversion and
//! constant fills

use crate::calculation::Calculation;
use crate::factory::MatrixFactory;
use gridmat_core::{
    Coordinate, DenseND, Element, ElementKind, GridError, GridResult, Matrix, Value, COLUMN, ROW,
};
use std::fmt;

/// A per-cell function of one value.
pub trait MapOp: fmt::Debug + Copy + Send + Sync + 'static {
    type Output: Element;

    fn name(&self) -> &'static str;

    fn apply_f64(&self, x: f64) -> Self::Output;

    fn apply(&self, value: &Value) -> GridResult<Self::Output> {
        Ok(self.apply_f64(value.to_f64()?))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Abs,
    Negate,
    Sqrt,
    Exp,
    Log,
    Round,
    /// -1, 0 or 1; NaN stays NaN
    Sign,
}

impl MapOp for UnaryOp {
    type Output = f64;

    fn name(&self) -> &'static str {
        match self {
            UnaryOp::Abs => "abs",
            UnaryOp::Negate => "negate",
            UnaryOp::Sqrt => "sqrt",
            UnaryOp::Exp => "exp",
            UnaryOp::Log => "log",
            UnaryOp::Round => "round",
            UnaryOp::Sign => "sign",
        }
    }

    #[inline]
    fn apply_f64(&self, x: f64) -> f64 {
        match self {
            UnaryOp::Abs => x.abs(),
            UnaryOp::Negate => -x,
            UnaryOp::Sqrt => x.sqrt(),
            UnaryOp::Exp => x.exp(),
            UnaryOp::Log => x.ln(),
            UnaryOp::Round => x.round(),
            UnaryOp::Sign if x == 0.0 || x.is_nan() => x,
            UnaryOp::Sign => x.signum(),
        }
    }
}

/// Logical negation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Not;

impl MapOp for Not {
    type Output = bool;

    fn name(&self) -> &'static str {
        "not"
    }

    fn apply_f64(&self, x: f64) -> bool {
        x == 0.0
    }

    fn apply(&self, value: &Value) -> GridResult<bool> {
        Ok(!value.to_bool()?)
    }
}

/// Applies a [`MapOp`] to every cell of one source.
#[derive(Debug)]
pub struct Map<O> {
    op: O,
    sources: [Matrix; 1],
}

impl<O: MapOp> Map<O> {
    pub fn new(op: O, source: &Matrix) -> Self {
        Self {
            op,
            sources: [source.clone()],
        }
    }
}

impl<O: MapOp> Calculation for Map<O> {
    fn name(&self) -> &'static str {
        self.op.name()
    }

    fn sources(&self) -> &[Matrix] {
        &self.sources
    }

    fn shape(&self) -> Coordinate {
        self.sources[0].shape()
    }

    fn element_kind(&self) -> ElementKind {
        O::Output::KIND
    }

    fn compute(&self, coord: &[i64]) -> GridResult<Value> {
        let value = self.sources[0].get(coord)?;
        Ok(self.op.apply(&value)?.to_value())
    }

    /// True when the op maps the source default to the output default. An op
    /// that fails on the default falls back to visiting every cell, so the
    /// failure is reported whatever the source storage.
    fn preserves_sparsity(&self) -> bool {
        let default = self.sources[0].element_kind().default_value();
        self.op
            .apply(&default)
            .is_ok_and(|v| v.to_value().is_default())
    }

    fn compute_all(&self, factory: &MatrixFactory) -> GridResult<Option<Matrix>> {
        let guard = self.sources[0].read();
        let Some(buffer) = guard.f64_buffer() else {
            return Ok(None);
        };
        if !factory.yields_flat_dense(O::Output::KIND, buffer.shape) {
            return Ok(None);
        }
        let op = self.op;
        let cells: Vec<O::Output> = buffer.data.iter().map(|&x| op.apply_f64(x)).collect();
        let dense = DenseND::from_vec_with_layout(cells, buffer.shape, buffer.layout)?;
        Ok(Some(Matrix::new(dense)))
    }
}

/// Swaps the row and column dimensions of a 2-D source.
#[derive(Debug)]
pub struct Transpose {
    sources: [Matrix; 1],
}

impl Transpose {
    pub fn new(source: &Matrix) -> GridResult<Self> {
        if source.rank() != 2 {
            return Err(GridError::invalid_shape(format!(
                "transpose needs a 2-D source, got shape {}",
                source.shape()
            )));
        }
        Ok(Self {
            sources: [source.clone()],
        })
    }
}

impl Calculation for Transpose {
    fn name(&self) -> &'static str {
        "transpose"
    }

    fn sources(&self) -> &[Matrix] {
        &self.sources
    }

    fn shape(&self) -> Coordinate {
        self.sources[0].shape().transpose(ROW, COLUMN)
    }

    fn element_kind(&self) -> ElementKind {
        self.sources[0].element_kind()
    }

    fn compute(&self, coord: &[i64]) -> GridResult<Value> {
        self.sources[0].get(&Coordinate::new(coord).transpose(ROW, COLUMN))
    }

    fn preserves_sparsity(&self) -> bool {
        true
    }

    fn map_coordinate(&self, coord: &Coordinate) -> Coordinate {
        coord.transpose(ROW, COLUMN)
    }
}

/// Reads a source as another element kind.
#[derive(Debug)]
pub struct Convert {
    kind: ElementKind,
    sources: [Matrix; 1],
}

impl Convert {
    pub fn new(source: &Matrix, kind: ElementKind) -> Self {
        Self {
            kind,
            sources: [source.clone()],
        }
    }
}

impl Calculation for Convert {
    fn name(&self) -> &'static str {
        "convert"
    }

    fn sources(&self) -> &[Matrix] {
        &self.sources
    }

    fn shape(&self) -> Coordinate {
        self.sources[0].shape()
    }

    fn element_kind(&self) -> ElementKind {
        self.kind
    }

    fn compute(&self, coord: &[i64]) -> GridResult<Value> {
        self.sources[0].get(coord)?.convert(self.kind)
    }

    fn preserves_sparsity(&self) -> bool {
        self.sources[0]
            .element_kind()
            .default_value()
            .convert(self.kind)
            .is_ok_and(|v| v == self.kind.default_value())
    }
}

/// Every cell holds the same value.
///
/// Built with [`Fill::like`], the source only lends its shape, and
/// materialising in place overwrites it.
#[derive(Debug)]
pub struct Fill {
    shape: Coordinate,
    value: Value,
    sources: Vec<Matrix>,
}

impl Fill {
    /// Constant container of the given shape.
    pub fn shaped(shape: &[i64], value: impl Into<Value>) -> GridResult<Self> {
        let shape = Coordinate::new(shape);
        if shape.rank() < 2 {
            return Err(GridError::invalid_shape(format!(
                "containers need at least 2 dimensions, got {}",
                shape.rank()
            )));
        }
        shape.to_extents()?;
        Ok(Self {
            shape,
            value: value.into(),
            sources: Vec::new(),
        })
    }

    /// Constant container shaped like `source`.
    pub fn like(source: &Matrix, value: impl Into<Value>) -> Self {
        Self {
            shape: source.shape(),
            value: value.into(),
            sources: vec![source.clone()],
        }
    }
}

impl Calculation for Fill {
    fn name(&self) -> &'static str {
        "fill"
    }

    fn sources(&self) -> &[Matrix] {
        &self.sources
    }

    fn shape(&self) -> Coordinate {
        match self.sources.first() {
            Some(source) => source.shape(),
            None => self.shape.clone(),
        }
    }

    fn element_kind(&self) -> ElementKind {
        self.value.kind()
    }

    fn compute(&self, _coord: &[i64]) -> GridResult<Value> {
        Ok(self.value.clone())
    }
}
