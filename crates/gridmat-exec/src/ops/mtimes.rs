//! Matrix product of two 2-D sources

use crate::calculation::Calculation;
use crate::factory::MatrixFactory;
use gridmat_core::coordinate::checked_index;
use gridmat_core::{
    BlockMatrix, BufferView, Container, Coordinate, DenseND, ElementKind, GridError, GridResult,
    Matrix, Value, COLUMN, ROW,
};

/// `left x right`, an `R x K` by `K x C` product yielding `R x C` doubles.
///
/// Cell reads compute one dot product. Materialising dense `f64` operands
/// with `calc_new` multiplies tile by tile through [`BlockMatrix`], using the
/// factory's block side and order.
#[derive(Debug)]
pub struct MTimes {
    sources: [Matrix; 2],
}

impl MTimes {
    pub fn new(left: &Matrix, right: &Matrix) -> GridResult<Self> {
        let (ls, rs) = (left.shape(), right.shape());
        if ls.rank() != 2 || rs.rank() != 2 || ls[COLUMN] != rs[ROW] {
            return Err(GridError::shape_mismatch("mtimes", &ls, &rs));
        }
        Ok(Self {
            sources: [left.clone(), right.clone()],
        })
    }

    fn to_dense(buffer: BufferView<'_>) -> GridResult<DenseND<f64>> {
        DenseND::from_vec_with_layout(buffer.data.to_vec(), buffer.shape, buffer.layout)
    }
}

impl Calculation for MTimes {
    fn name(&self) -> &'static str {
        "mtimes"
    }

    fn sources(&self) -> &[Matrix] {
        &self.sources
    }

    fn shape(&self) -> Coordinate {
        let [left, right] = &self.sources;
        Coordinate::from([left.shape()[ROW], right.shape()[COLUMN]])
    }

    fn element_kind(&self) -> ElementKind {
        ElementKind::Double
    }

    fn compute(&self, coord: &[i64]) -> GridResult<Value> {
        checked_index(coord, &self.shape())?;
        let [left, right] = &self.sources;
        let lg = left.read();
        let rg = (!right.ptr_eq(left)).then(|| right.read());
        let a: &dyn Container = &**lg;
        let b: &dyn Container = match &rg {
            Some(g) => &***g,
            None => a,
        };
        let inner = a.column_count();
        let mut total = 0.0;
        for k in 0..inner {
            total += a.get_as_double(&[coord[ROW], k])? * b.get_as_double(&[k, coord[COLUMN]])?;
        }
        Ok(Value::Double(total))
    }

    fn compute_all(&self, factory: &MatrixFactory) -> GridResult<Option<Matrix>> {
        let [left, right] = &self.sources;
        let (a, b) = {
            let lg = left.read();
            let Some(a) = lg.f64_buffer() else {
                return Ok(None);
            };
            let a = Self::to_dense(a)?;
            drop(lg);
            let rg = right.read();
            let Some(b) = rg.f64_buffer() else {
                return Ok(None);
            };
            (a, Self::to_dense(b)?)
        };
        let hints = factory.hints();
        let a = BlockMatrix::from_dense(&a, hints.block_side, hints.block_order)?;
        let b = BlockMatrix::from_dense(&b, hints.block_side, hints.block_order)?;
        let product = a.matmul(&b)?;

        let extents = [product.rows(), product.cols()];
        if factory.yields_flat_dense(ElementKind::Double, &extents) {
            Ok(Some(Matrix::new(product.to_dense(hints.order))))
        } else {
            Ok(Some(Matrix::new(product)))
        }
    }
}
