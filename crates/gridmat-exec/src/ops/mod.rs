//! Calculation catalogue
//!
//! [`MatrixCalcExt`] builds every calculation fluently from a [`Matrix`].
//! Builders validate shapes up front and return the calculation unevaluated;
//! choose a materialisation with
//! [`CalculationExt`](crate::calculation::CalculationExt).
//!
//! ```
//! use gridmat_core::{DenseND, Dimension, Matrix};
//! use gridmat_exec::{CalculationExt, MatrixCalcExt};
//!
//! let m = Matrix::new(DenseND::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap());
//! let sums = m.sum(Dimension::Row).unwrap().calc_new().unwrap();
//! assert_eq!(sums.get_as_double(&[0, 1]).unwrap(), 6.0);
//! ```

pub mod binary;
pub mod mtimes;
pub mod reduce;
pub mod stats;
pub mod unary;

pub use binary::{Binary, BinaryOp, Broadcast, CellOp, CompareOp, LogicalOp};
pub use mtimes::MTimes;
pub use reduce::{Reduce, ReduceOp};
pub use stats::{AggregateCache, Center, Standardize};
pub use unary::{Convert, Fill, Map, MapOp, Not, Transpose, UnaryOp};

use gridmat_core::{DenseND, Dimension, ElementKind, GridResult, Matrix};

/// A `1 x 1` container holding `value`, broadcast by binary calculations.
pub fn scalar(value: f64) -> Matrix {
    Matrix::new(DenseND::from_elem(&[1, 1], value))
}

/// Calculation builders on [`Matrix`].
pub trait MatrixCalcExt {
    fn binary<O: CellOp>(&self, op: O, other: &Matrix) -> GridResult<Binary<O>>;

    fn map<O: MapOp>(&self, op: O) -> Map<O>;

    fn reduce(&self, op: ReduceOp, dimension: Dimension, ignore_nan: bool) -> GridResult<Reduce>;

    fn plus(&self, other: &Matrix) -> GridResult<Binary<BinaryOp>> {
        self.binary(BinaryOp::Plus, other)
    }

    fn minus(&self, other: &Matrix) -> GridResult<Binary<BinaryOp>> {
        self.binary(BinaryOp::Minus, other)
    }

    fn times(&self, other: &Matrix) -> GridResult<Binary<BinaryOp>> {
        self.binary(BinaryOp::Times, other)
    }

    fn divide(&self, other: &Matrix) -> GridResult<Binary<BinaryOp>> {
        self.binary(BinaryOp::Divide, other)
    }

    fn power(&self, other: &Matrix) -> GridResult<Binary<BinaryOp>> {
        self.binary(BinaryOp::Power, other)
    }

    /// Cell-wise minimum of two containers.
    fn minimum(&self, other: &Matrix) -> GridResult<Binary<BinaryOp>> {
        self.binary(BinaryOp::Min, other)
    }

    /// Cell-wise maximum of two containers.
    fn maximum(&self, other: &Matrix) -> GridResult<Binary<BinaryOp>> {
        self.binary(BinaryOp::Max, other)
    }

    fn plus_scalar(&self, value: f64) -> GridResult<Binary<BinaryOp>> {
        self.plus(&scalar(value))
    }

    fn minus_scalar(&self, value: f64) -> GridResult<Binary<BinaryOp>> {
        self.minus(&scalar(value))
    }

    fn times_scalar(&self, value: f64) -> GridResult<Binary<BinaryOp>> {
        self.times(&scalar(value))
    }

    fn divide_scalar(&self, value: f64) -> GridResult<Binary<BinaryOp>> {
        self.divide(&scalar(value))
    }

    fn power_scalar(&self, value: f64) -> GridResult<Binary<BinaryOp>> {
        self.power(&scalar(value))
    }

    fn lt(&self, other: &Matrix) -> GridResult<Binary<CompareOp>> {
        self.binary(CompareOp::Lt, other)
    }

    fn le(&self, other: &Matrix) -> GridResult<Binary<CompareOp>> {
        self.binary(CompareOp::Le, other)
    }

    fn gt(&self, other: &Matrix) -> GridResult<Binary<CompareOp>> {
        self.binary(CompareOp::Gt, other)
    }

    fn ge(&self, other: &Matrix) -> GridResult<Binary<CompareOp>> {
        self.binary(CompareOp::Ge, other)
    }

    fn equals(&self, other: &Matrix) -> GridResult<Binary<CompareOp>> {
        self.binary(CompareOp::Eq, other)
    }

    fn not_equals(&self, other: &Matrix) -> GridResult<Binary<CompareOp>> {
        self.binary(CompareOp::Ne, other)
    }

    fn and(&self, other: &Matrix) -> GridResult<Binary<LogicalOp>> {
        self.binary(LogicalOp::And, other)
    }

    fn or(&self, other: &Matrix) -> GridResult<Binary<LogicalOp>> {
        self.binary(LogicalOp::Or, other)
    }

    fn xor(&self, other: &Matrix) -> GridResult<Binary<LogicalOp>> {
        self.binary(LogicalOp::Xor, other)
    }

    fn not(&self) -> Map<Not> {
        self.map(Not)
    }

    fn abs(&self) -> Map<UnaryOp> {
        self.map(UnaryOp::Abs)
    }

    fn negate(&self) -> Map<UnaryOp> {
        self.map(UnaryOp::Negate)
    }

    fn sqrt(&self) -> Map<UnaryOp> {
        self.map(UnaryOp::Sqrt)
    }

    fn exp(&self) -> Map<UnaryOp> {
        self.map(UnaryOp::Exp)
    }

    fn log(&self) -> Map<UnaryOp> {
        self.map(UnaryOp::Log)
    }

    fn round(&self) -> Map<UnaryOp> {
        self.map(UnaryOp::Round)
    }

    fn sign(&self) -> Map<UnaryOp> {
        self.map(UnaryOp::Sign)
    }

    fn sum(&self, dimension: Dimension) -> GridResult<Reduce> {
        self.reduce(ReduceOp::Sum, dimension, false)
    }

    fn mean(&self, dimension: Dimension) -> GridResult<Reduce> {
        self.reduce(ReduceOp::Mean, dimension, false)
    }

    fn min(&self, dimension: Dimension) -> GridResult<Reduce> {
        self.reduce(ReduceOp::Min, dimension, false)
    }

    fn max(&self, dimension: Dimension) -> GridResult<Reduce> {
        self.reduce(ReduceOp::Max, dimension, false)
    }

    fn count(&self, dimension: Dimension) -> GridResult<Reduce> {
        self.reduce(ReduceOp::Count, dimension, false)
    }

    fn var(&self, dimension: Dimension) -> GridResult<Reduce> {
        self.reduce(ReduceOp::Var, dimension, false)
    }

    fn std(&self, dimension: Dimension) -> GridResult<Reduce> {
        self.reduce(ReduceOp::Std, dimension, false)
    }

    fn center(&self, dimension: Dimension, ignore_nan: bool) -> GridResult<Center>;

    fn standardize(&self, dimension: Dimension, ignore_nan: bool) -> GridResult<Standardize>;

    fn transpose(&self) -> GridResult<Transpose>;

    fn mtimes(&self, other: &Matrix) -> GridResult<MTimes>;

    fn convert(&self, kind: ElementKind) -> Convert;
}

impl MatrixCalcExt for Matrix {
    fn binary<O: CellOp>(&self, op: O, other: &Matrix) -> GridResult<Binary<O>> {
        Binary::new(op, self, other)
    }

    fn map<O: MapOp>(&self, op: O) -> Map<O> {
        Map::new(op, self)
    }

    fn reduce(&self, op: ReduceOp, dimension: Dimension, ignore_nan: bool) -> GridResult<Reduce> {
        Reduce::new(op, self, dimension, ignore_nan)
    }

    fn center(&self, dimension: Dimension, ignore_nan: bool) -> GridResult<Center> {
        Center::new(self, dimension, ignore_nan)
    }

    fn standardize(&self, dimension: Dimension, ignore_nan: bool) -> GridResult<Standardize> {
        Standardize::new(self, dimension, ignore_nan)
    }

    fn transpose(&self) -> GridResult<Transpose> {
        Transpose::new(self)
    }

    fn mtimes(&self, other: &Matrix) -> GridResult<MTimes> {
        MTimes::new(self, other)
    }

    fn convert(&self, kind: ElementKind) -> Convert {
        Convert::new(self, kind)
    }
}
