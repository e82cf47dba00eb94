//! Cell-by-cell combination of two containers
//!
//! Operands must have equal shapes. The one exception is an operand whose
//! every extent is 1: it is broadcast against the other operand, so
//! `m.le(&scalar(2.0))` compares every cell of `m` with 2.

use crate::calculation::Calculation;
use crate::factory::MatrixFactory;
use gridmat_core::{
    Coordinate, DenseND, Element, ElementKind, GridError, GridResult, Matrix, Value,
};
use std::cmp::Ordering;
use std::fmt;

/// A binary per-cell function.
pub trait CellOp: fmt::Debug + Copy + Send + Sync + 'static {
    type Output: Element;

    fn name(&self) -> &'static str;

    /// Apply to two numbers. Also used for the contiguous buffer path.
    fn apply_f64(&self, a: f64, b: f64) -> Self::Output;

    fn apply(&self, a: &Value, b: &Value) -> GridResult<Self::Output> {
        Ok(self.apply_f64(a.to_f64()?, b.to_f64()?))
    }
}

/// Arithmetic producing doubles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Plus,
    Minus,
    Times,
    Divide,
    Power,
    Min,
    Max,
}

impl CellOp for BinaryOp {
    type Output = f64;

    fn name(&self) -> &'static str {
        match self {
            BinaryOp::Plus => "plus",
            BinaryOp::Minus => "minus",
            BinaryOp::Times => "times",
            BinaryOp::Divide => "divide",
            BinaryOp::Power => "power",
            BinaryOp::Min => "min",
            BinaryOp::Max => "max",
        }
    }

    #[inline]
    fn apply_f64(&self, a: f64, b: f64) -> f64 {
        match self {
            BinaryOp::Plus => a + b,
            BinaryOp::Minus => a - b,
            BinaryOp::Times => a * b,
            BinaryOp::Divide => a / b,
            BinaryOp::Power => a.powf(b),
            BinaryOp::Min => a.min(b),
            BinaryOp::Max => a.max(b),
        }
    }
}

/// Comparisons producing booleans.
///
/// Values that both read as numbers compare numerically; anything else
/// compares by its text rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl CompareOp {
    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
        }
    }
}

impl CellOp for CompareOp {
    type Output = bool;

    fn name(&self) -> &'static str {
        match self {
            CompareOp::Lt => "lt",
            CompareOp::Le => "le",
            CompareOp::Gt => "gt",
            CompareOp::Ge => "ge",
            CompareOp::Eq => "eq",
            CompareOp::Ne => "ne",
        }
    }

    #[inline]
    fn apply_f64(&self, a: f64, b: f64) -> bool {
        match a.partial_cmp(&b) {
            Some(ordering) => self.accepts(ordering),
            // NaN is unequal to everything
            None => *self == CompareOp::Ne,
        }
    }

    fn apply(&self, a: &Value, b: &Value) -> GridResult<bool> {
        match (a.to_f64(), b.to_f64()) {
            (Ok(x), Ok(y)) => Ok(self.apply_f64(x, y)),
            _ => Ok(self.accepts(a.to_text().cmp(&b.to_text()))),
        }
    }
}

/// Boolean connectives; numbers are true when non-zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    And,
    Or,
    Xor,
}

impl LogicalOp {
    fn combine(self, a: bool, b: bool) -> bool {
        match self {
            LogicalOp::And => a && b,
            LogicalOp::Or => a || b,
            LogicalOp::Xor => a ^ b,
        }
    }
}

impl CellOp for LogicalOp {
    type Output = bool;

    fn name(&self) -> &'static str {
        match self {
            LogicalOp::And => "and",
            LogicalOp::Or => "or",
            LogicalOp::Xor => "xor",
        }
    }

    #[inline]
    fn apply_f64(&self, a: f64, b: f64) -> bool {
        self.combine(a != 0.0, b != 0.0)
    }

    fn apply(&self, a: &Value, b: &Value) -> GridResult<bool> {
        Ok(self.combine(a.to_bool()?, b.to_bool()?))
    }
}

/// Which operand, if any, is read at its single cell for every output cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Broadcast {
    Same,
    Left,
    Right,
}

fn is_unit(shape: &Coordinate) -> bool {
    shape.iter().all(|&d| d == 1)
}

/// Two-operand calculation.
#[derive(Debug)]
pub struct Binary<O> {
    op: O,
    sources: [Matrix; 2],
    broadcast: Broadcast,
}

impl<O: CellOp> Binary<O> {
    pub fn new(op: O, left: &Matrix, right: &Matrix) -> GridResult<Self> {
        let (ls, rs) = (left.shape(), right.shape());
        let broadcast = if ls == rs {
            Broadcast::Same
        } else if is_unit(&rs) {
            Broadcast::Right
        } else if is_unit(&ls) {
            Broadcast::Left
        } else {
            return Err(GridError::shape_mismatch(op.name(), &ls, &rs));
        };
        Ok(Self {
            op,
            sources: [left.clone(), right.clone()],
            broadcast,
        })
    }

    pub fn op(&self) -> O {
        self.op
    }

    pub fn broadcast(&self) -> Broadcast {
        self.broadcast
    }

    fn unit_value(operand: &Matrix) -> GridResult<Value> {
        operand.get(&Coordinate::zeros(operand.rank()))
    }
}

impl<O: CellOp> Calculation for Binary<O> {
    fn name(&self) -> &'static str {
        self.op.name()
    }

    fn sources(&self) -> &[Matrix] {
        &self.sources
    }

    fn shape(&self) -> Coordinate {
        match self.broadcast {
            Broadcast::Left => self.sources[1].shape(),
            _ => self.sources[0].shape(),
        }
    }

    fn element_kind(&self) -> ElementKind {
        O::Output::KIND
    }

    fn compute(&self, coord: &[i64]) -> GridResult<Value> {
        let [left, right] = &self.sources;
        let a = match self.broadcast {
            Broadcast::Left => Self::unit_value(left)?,
            _ => left.get(coord)?,
        };
        let b = match self.broadcast {
            Broadcast::Right => Self::unit_value(right)?,
            _ => right.get(coord)?,
        };
        Ok(self.op.apply(&a, &b)?.to_value())
    }

    /// True when the right operand is broadcast and maps the left default to
    /// the output default, as in `times_scalar` or `divide_scalar`.
    fn preserves_sparsity(&self) -> bool {
        if self.broadcast != Broadcast::Right {
            return false;
        }
        let [left, right] = &self.sources;
        let default = left.element_kind().default_value();
        Self::unit_value(right)
            .and_then(|s| self.op.apply(&default, &s))
            .map(|v| v.is_default())
            .unwrap_or(false)
    }

    fn compute_all(&self, factory: &MatrixFactory) -> GridResult<Option<Matrix>> {
        let [left, right] = &self.sources;
        let lg = left.read();
        let rg = (!right.ptr_eq(left)).then(|| right.read());
        let a = lg.f64_buffer();
        let b = match &rg {
            Some(g) => g.f64_buffer(),
            None => lg.f64_buffer(),
        };
        let (Some(a), Some(b)) = (a, b) else {
            return Ok(None);
        };
        let target = if self.broadcast == Broadcast::Left { b } else { a };
        if !factory.yields_flat_dense(O::Output::KIND, target.shape) {
            return Ok(None);
        }

        let op = self.op;
        let cells: Vec<O::Output> = match self.broadcast {
            Broadcast::Same if a.is_compatible(&b) => a
                .data
                .iter()
                .zip(b.data)
                .map(|(&x, &y)| op.apply_f64(x, y))
                .collect(),
            Broadcast::Right => match b.data.first() {
                Some(&y) => a.data.iter().map(|&x| op.apply_f64(x, y)).collect(),
                None => return Ok(None),
            },
            Broadcast::Left => match a.data.first() {
                Some(&x) => b.data.iter().map(|&y| op.apply_f64(x, y)).collect(),
                None => return Ok(None),
            },
            Broadcast::Same => return Ok(None),
        };
        let dense = DenseND::from_vec_with_layout(cells, target.shape, target.layout)?;
        Ok(Some(Matrix::new(dense)))
    }
}
