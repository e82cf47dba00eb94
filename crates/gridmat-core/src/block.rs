//! Cache-blocked storage for large 2-D dense containers.
//!
//! A [`BlockLayout`] partitions a `rows x cols` grid into tiles of
//! `block_rows x block_cols` cells. Tiles on the bottom and right edges are
//! truncated, never padded, so the buffer always holds exactly `rows * cols`
//! cells. Tiles are laid out one after another in block-row-major or
//! block-column-major order, and each tile stores its cells in the matching
//! order.
//!
//! For a 3 x 5 grid with 3 x 3 tiles in [`BlockOrder::RowMajor`]:
//!
//! ```text
//!  block (0,0), 3 x 3      block (0,1), 3 x 2
//!  0  1  2                 0  1
//!  3  4  5                 2  3
//!  6  7  8                 4  5
//! ```
//!
//! [`BlockMatrix`] stores cells in this layout and converts to and from
//! [`DenseND`] without loss. Its [`matmul`](BlockMatrix::matmul) walks whole
//! tiles so each inner loop touches contiguous memory.

use crate::annotation::Annotation;
use crate::container::{Container, Layout, StorageKind};
use crate::coordinate::{checked_index, Coordinate};
use crate::dense::DenseND;
use crate::element::{Element, ElementKind, Value};
use crate::error::{GridError, GridResult};
use scirs2_core::numeric::Num;
use std::fmt;

/// Default tile side for [`BlockMatrix::new`]
pub const DEFAULT_BLOCK_SIDE: usize = 64;

/// Order in which tiles, and cells inside a tile, are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BlockOrder {
    /// Tiles left to right, then top to bottom; cells row-major inside a tile
    #[default]
    RowMajor,
    /// Tiles top to bottom, then left to right; cells column-major inside a tile
    ColumnMajor,
}

/// Closed-form mapping between `(row, col)` and a position in a tiled buffer.
///
/// # Examples
///
/// ```
/// use gridmat_core::{BlockLayout, BlockOrder};
///
/// let layout = BlockLayout::new(3, 5, 3, 3, BlockOrder::RowMajor).unwrap();
/// assert_eq!(layout.block_index(1, 4), (0, 1));
/// assert_eq!(layout.block_number(1, 4), 1);
/// assert_eq!(layout.index_in_block(1, 4), 3);
/// assert_eq!(layout.index(1, 4), 9 + 3);
/// assert_eq!(layout.position_of(12), (1, 4));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockLayout {
    rows: usize,
    cols: usize,
    block_rows: usize,
    block_cols: usize,
    order: BlockOrder,
}

impl BlockLayout {
    /// Layout with `block_rows x block_cols` tiles.
    pub fn new(
        rows: usize,
        cols: usize,
        block_rows: usize,
        block_cols: usize,
        order: BlockOrder,
    ) -> GridResult<Self> {
        if block_rows == 0 || block_cols == 0 {
            return Err(GridError::invalid_shape(format!(
                "block side must be positive, got {}x{}",
                block_rows, block_cols
            )));
        }
        Ok(Self {
            rows,
            cols,
            block_rows,
            block_cols,
            order,
        })
    }

    /// Layout with square `side x side` tiles.
    pub fn square(rows: usize, cols: usize, side: usize, order: BlockOrder) -> GridResult<Self> {
        Self::new(rows, cols, side, side, order)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn block_rows(&self) -> usize {
        self.block_rows
    }

    pub fn block_cols(&self) -> usize {
        self.block_cols
    }

    pub fn order(&self) -> BlockOrder {
        self.order
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of tile rows, counting a truncated bottom row.
    pub fn blocks_down(&self) -> usize {
        self.rows.div_ceil(self.block_rows)
    }

    /// Number of tile columns, counting a truncated right column.
    pub fn blocks_across(&self) -> usize {
        self.cols.div_ceil(self.block_cols)
    }

    /// Height of tile row `bi`.
    pub fn rows_in_block(&self, bi: usize) -> usize {
        self.block_rows.min(self.rows - bi * self.block_rows)
    }

    /// Width of tile column `bj`.
    pub fn cols_in_block(&self, bj: usize) -> usize {
        self.block_cols.min(self.cols - bj * self.block_cols)
    }

    /// Tile `(bi, bj)` holding cell `(row, col)`.
    pub fn block_index(&self, row: usize, col: usize) -> (usize, usize) {
        (row / self.block_rows, col / self.block_cols)
    }

    /// Sequence number of the tile holding `(row, col)` in storage order.
    pub fn block_number(&self, row: usize, col: usize) -> usize {
        let (bi, bj) = self.block_index(row, col);
        match self.order {
            BlockOrder::RowMajor => bi * self.blocks_across() + bj,
            BlockOrder::ColumnMajor => bj * self.blocks_down() + bi,
        }
    }

    /// Buffer offset of the first cell of tile `(bi, bj)`.
    ///
    /// Every tile before it in storage order is full-sized along the stepping
    /// axis, so the offset stays closed-form despite truncated edges.
    pub fn block_offset(&self, bi: usize, bj: usize) -> usize {
        match self.order {
            BlockOrder::RowMajor => {
                bi * self.block_rows * self.cols + bj * self.rows_in_block(bi) * self.block_cols
            }
            BlockOrder::ColumnMajor => {
                bj * self.block_cols * self.rows + bi * self.block_rows * self.cols_in_block(bj)
            }
        }
    }

    /// Offset of `(row, col)` inside its tile.
    pub fn index_in_block(&self, row: usize, col: usize) -> usize {
        let (bi, bj) = self.block_index(row, col);
        let r = row - bi * self.block_rows;
        let c = col - bj * self.block_cols;
        match self.order {
            BlockOrder::RowMajor => r * self.cols_in_block(bj) + c,
            BlockOrder::ColumnMajor => c * self.rows_in_block(bi) + r,
        }
    }

    /// Buffer offset of `(row, col)`.
    pub fn index(&self, row: usize, col: usize) -> usize {
        let (bi, bj) = self.block_index(row, col);
        self.block_offset(bi, bj) + self.index_in_block(row, col)
    }

    /// Inverse of [`index`](Self::index).
    pub fn position_of(&self, index: usize) -> (usize, usize) {
        debug_assert!(index < self.len(), "index {index} outside {}", self.len());
        match self.order {
            BlockOrder::RowMajor => {
                let band = self.block_rows * self.cols;
                let bi = index / band;
                let rest = index - bi * band;
                let height = self.rows_in_block(bi);
                let bj = rest / (height * self.block_cols);
                let inner = rest - bj * height * self.block_cols;
                let width = self.cols_in_block(bj);
                (
                    bi * self.block_rows + inner / width,
                    bj * self.block_cols + inner % width,
                )
            }
            BlockOrder::ColumnMajor => {
                let band = self.block_cols * self.rows;
                let bj = index / band;
                let rest = index - bj * band;
                let width = self.cols_in_block(bj);
                let bi = rest / (width * self.block_rows);
                let inner = rest - bi * width * self.block_rows;
                let height = self.rows_in_block(bi);
                (
                    bi * self.block_rows + inner % height,
                    bj * self.block_cols + inner / height,
                )
            }
        }
    }

    /// Cell coordinates in storage order.
    pub fn positions(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.len()).map(move |i| self.position_of(i))
    }
}

/// 2-D dense container stored in a [`BlockLayout`].
///
/// # Examples
///
/// ```
/// use gridmat_core::{BlockMatrix, BlockOrder, DenseND, Layout};
///
/// let dense = DenseND::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
/// let blocked = BlockMatrix::from_dense(&dense, 1, BlockOrder::ColumnMajor).unwrap();
/// assert_eq!(blocked.get(1, 0).unwrap(), 3.0);
/// assert_eq!(blocked.to_dense(Layout::RowMajor), dense);
/// ```
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockMatrix<T> {
    layout: BlockLayout,
    data: Vec<T>,
    version: u64,
    annotation: Option<Annotation>,
}

impl<T: Element> BlockMatrix<T> {
    /// Default-filled matrix with square tiles of [`DEFAULT_BLOCK_SIDE`].
    pub fn new(rows: usize, cols: usize) -> Self {
        let layout = BlockLayout {
            rows,
            cols,
            block_rows: DEFAULT_BLOCK_SIDE,
            block_cols: DEFAULT_BLOCK_SIDE,
            order: BlockOrder::RowMajor,
        };
        Self::with_layout(layout)
    }

    /// Default-filled matrix in `layout`.
    pub fn with_layout(layout: BlockLayout) -> Self {
        Self {
            layout,
            data: vec![T::default_value(); layout.len()],
            version: 0,
            annotation: None,
        }
    }

    /// Re-tile a 2-D dense container.
    pub fn from_dense(dense: &DenseND<T>, side: usize, order: BlockOrder) -> GridResult<Self> {
        if dense.rank() != 2 {
            return Err(GridError::DimensionMismatch {
                expected: 2,
                got: dense.rank(),
            });
        }
        let extents = dense.extents();
        let layout = BlockLayout::square(extents[0], extents[1], side, order)?;
        let data = layout
            .positions()
            .map(|(r, c)| dense[&[r, c][..]].clone())
            .collect();
        Ok(Self {
            layout,
            data,
            version: 0,
            annotation: dense.annotation().cloned(),
        })
    }

    /// Copy back into a flat dense container.
    pub fn to_dense(&self, layout: Layout) -> DenseND<T> {
        let mut out = DenseND::with_layout(&[self.layout.rows, self.layout.cols], layout);
        out.fill_with(|idx| self.data[self.layout.index(idx[0], idx[1])].clone());
        out.annotation = self.annotation.clone();
        out
    }

    /// Same cells in another tiling.
    pub fn relayout(&self, layout: BlockLayout) -> GridResult<Self> {
        if (layout.rows, layout.cols) != (self.layout.rows, self.layout.cols) {
            return Err(GridError::shape_mismatch(
                "relayout",
                &[self.layout.rows as i64, self.layout.cols as i64],
                &[layout.rows as i64, layout.cols as i64],
            ));
        }
        let data = layout
            .positions()
            .map(|(r, c)| self.data[self.layout.index(r, c)].clone())
            .collect();
        Ok(Self {
            layout,
            data,
            version: 0,
            annotation: self.annotation.clone(),
        })
    }

    pub fn layout(&self) -> &BlockLayout {
        &self.layout
    }

    pub fn rows(&self) -> usize {
        self.layout.rows
    }

    pub fn cols(&self) -> usize {
        self.layout.cols
    }

    /// Backing buffer in storage order
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    fn checked(&self, row: usize, col: usize) -> GridResult<usize> {
        if row >= self.layout.rows || col >= self.layout.cols {
            return Err(GridError::out_of_bounds(
                &[row as i64, col as i64],
                &[self.layout.rows as i64, self.layout.cols as i64],
            ));
        }
        Ok(self.layout.index(row, col))
    }

    pub fn get(&self, row: usize, col: usize) -> GridResult<T> {
        let i = self.checked(row, col)?;
        Ok(self.data[i].clone())
    }

    pub fn set(&mut self, row: usize, col: usize, value: T) -> GridResult<()> {
        let i = self.checked(row, col)?;
        self.data[i] = value;
        self.version += 1;
        Ok(())
    }
}

impl<T: Element + Num + Copy> BlockMatrix<T> {
    /// Matrix product, tile by tile.
    ///
    /// The result uses `self`'s tile height and order and `other`'s tile
    /// width. `other` is re-tiled first when its tile height does not match
    /// `self`'s tile width.
    pub fn matmul(&self, other: &BlockMatrix<T>) -> GridResult<BlockMatrix<T>> {
        let a = &self.layout;
        if a.cols != other.layout.rows {
            return Err(GridError::shape_mismatch(
                "matmul",
                &[a.rows as i64, a.cols as i64],
                &[other.layout.rows as i64, other.layout.cols as i64],
            ));
        }
        let retiled;
        let other = if other.layout.block_rows != a.block_cols || other.layout.order != a.order {
            let layout = BlockLayout::new(
                other.layout.rows,
                other.layout.cols,
                a.block_cols,
                other.layout.block_cols,
                a.order,
            )?;
            retiled = other.relayout(layout)?;
            &retiled
        } else {
            other
        };
        let b = &other.layout;
        let c_layout = BlockLayout::new(a.rows, b.cols, a.block_rows, b.block_cols, a.order)?;
        let mut out = BlockMatrix::<T>::with_layout(c_layout);
        for v in out.data.iter_mut() {
            *v = T::zero();
        }
        tracing::debug!(
            rows = a.rows,
            inner = a.cols,
            cols = b.cols,
            tiles = c_layout.blocks_down() * c_layout.blocks_across() * a.blocks_across(),
            "blocked matmul"
        );

        for bi in 0..c_layout.blocks_down() {
            let h = c_layout.rows_in_block(bi);
            for bj in 0..c_layout.blocks_across() {
                let w = c_layout.cols_in_block(bj);
                let c_off = c_layout.block_offset(bi, bj);
                for bk in 0..a.blocks_across() {
                    let depth = a.cols_in_block(bk);
                    let a_tile = &self.data[a.block_offset(bi, bk)..][..h * depth];
                    let b_tile = &other.data[b.block_offset(bk, bj)..][..depth * w];
                    let c_tile = &mut out.data[c_off..c_off + h * w];
                    multiply_tile(a.order, a_tile, b_tile, c_tile, h, depth, w);
                }
            }
        }
        Ok(out)
    }
}

/// `c += a * b` for one `h x depth` by `depth x w` tile pair.
fn multiply_tile<T: Num + Copy>(
    order: BlockOrder,
    a: &[T],
    b: &[T],
    c: &mut [T],
    h: usize,
    depth: usize,
    w: usize,
) {
    match order {
        BlockOrder::RowMajor => {
            for i in 0..h {
                for k in 0..depth {
                    let aik = a[i * depth + k];
                    for j in 0..w {
                        c[i * w + j] = c[i * w + j] + aik * b[k * w + j];
                    }
                }
            }
        }
        BlockOrder::ColumnMajor => {
            for j in 0..w {
                for k in 0..depth {
                    let bkj = b[j * depth + k];
                    for i in 0..h {
                        c[j * h + i] = c[j * h + i] + a[k * h + i] * bkj;
                    }
                }
            }
        }
    }
}

impl<T: Element> Container for BlockMatrix<T> {
    fn shape(&self) -> Coordinate {
        Coordinate::new(&[self.layout.rows as i64, self.layout.cols as i64])
    }

    fn element_kind(&self) -> ElementKind {
        T::KIND
    }

    fn storage_kind(&self) -> StorageKind {
        StorageKind::Dense
    }

    fn get_value(&self, coord: &[i64]) -> GridResult<Value> {
        let idx = checked_index(coord, &self.shape())?;
        Ok(self.data[self.layout.index(idx[0], idx[1])].to_value())
    }

    fn set_value(&mut self, coord: &[i64], value: Value) -> GridResult<()> {
        let idx = checked_index(coord, &self.shape())?;
        let native = T::from_value(&value)?;
        self.set(idx[0], idx[1], native)
    }

    fn version(&self) -> u64 {
        self.version
    }

    /// Block storage order.
    fn available_coordinates(&self) -> Box<dyn Iterator<Item = Coordinate> + '_> {
        Box::new(
            self.layout
                .positions()
                .map(|(r, c)| Coordinate::new(&[r as i64, c as i64])),
        )
    }

    fn annotation(&self) -> Option<&Annotation> {
        self.annotation.as_ref()
    }

    fn annotation_mut(&mut self) -> &mut Annotation {
        let shape = self.shape();
        self.annotation.get_or_insert_with(|| Annotation::new(&shape))
    }

    fn set_annotation(&mut self, annotation: Option<Annotation>) {
        self.annotation = annotation;
    }

    fn clone_box(&self) -> Box<dyn Container> {
        Box::new(self.clone())
    }
}

impl<T: fmt::Debug> fmt::Debug for BlockMatrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockMatrix")
            .field("layout", &self.layout)
            .field("len", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ragged_blocks_three_by_five() {
        let layout = BlockLayout::square(3, 5, 3, BlockOrder::RowMajor).unwrap();
        assert_eq!(layout.blocks_down(), 1);
        assert_eq!(layout.blocks_across(), 2);

        // First tile, grouped by column
        let first: Vec<Vec<usize>> = (0..3)
            .map(|c| (0..3).map(|r| layout.index_in_block(r, c)).collect())
            .collect();
        assert_eq!(first, vec![vec![0, 3, 6], vec![1, 4, 7], vec![2, 5, 8]]);

        // Truncated tile, grouped by row
        let rest: Vec<Vec<usize>> = (0..3)
            .map(|r| (3..5).map(|c| layout.index_in_block(r, c)).collect())
            .collect();
        assert_eq!(rest, vec![vec![0, 1], vec![2, 3], vec![4, 5]]);

        assert_eq!(layout.block_offset(0, 1), 9);
        assert_eq!(layout.block_number(2, 4), 1);
    }

    #[test]
    fn test_index_is_a_bijection() {
        for order in [BlockOrder::RowMajor, BlockOrder::ColumnMajor] {
            for (rows, cols, br, bc) in [(3, 5, 3, 3), (7, 4, 2, 3), (1, 1, 4, 4), (5, 9, 5, 2)] {
                let layout = BlockLayout::new(rows, cols, br, bc, order).unwrap();
                let mut seen = vec![false; layout.len()];
                for r in 0..rows {
                    for c in 0..cols {
                        let i = layout.index(r, c);
                        assert!(!seen[i], "{order:?} {rows}x{cols} duplicate {i}");
                        seen[i] = true;
                        assert_eq!(layout.position_of(i), (r, c));
                    }
                }
                assert!(seen.iter().all(|&s| s));
            }
        }
    }

    #[test]
    fn test_column_major_tiles() {
        let layout = BlockLayout::square(3, 5, 2, BlockOrder::ColumnMajor).unwrap();
        // Tile (1, 0) is 1 row high and sits under tile (0, 0).
        assert_eq!(layout.block_offset(1, 0), 4);
        assert_eq!(layout.index(2, 1), 5);
        assert_eq!(layout.block_number(0, 2), 2);
        assert_eq!(layout.block_offset(0, 1), 6);
    }

    #[test]
    fn test_zero_block_side_rejected() {
        assert!(BlockLayout::square(3, 3, 0, BlockOrder::RowMajor).is_err());
    }

    #[test]
    fn test_dense_round_trip() {
        let dense = DenseND::from_vec((0..15).map(f64::from).collect(), &[3, 5]).unwrap();
        for order in [BlockOrder::RowMajor, BlockOrder::ColumnMajor] {
            let blocked = BlockMatrix::from_dense(&dense, 3, order).unwrap();
            for r in 0..3 {
                for c in 0..5 {
                    assert_eq!(
                        blocked.get(r, c).unwrap(),
                        dense.get(&[r as i64, c as i64]).unwrap()
                    );
                }
            }
            assert_eq!(blocked.to_dense(Layout::ColumnMajor), dense);
        }
    }

    #[test]
    fn test_container_contract() {
        let mut m = BlockMatrix::<i32>::with_layout(
            BlockLayout::square(4, 3, 2, BlockOrder::RowMajor).unwrap(),
        );
        m.set_as_long(&[3, 2], 7).unwrap();
        assert_eq!(m.get_as_int(&[3, 2]).unwrap(), 7);
        assert!(m.get_value(&[4, 0]).unwrap_err().is_out_of_bounds());
        assert_eq!(m.version(), 1);
        let coords: Vec<Coordinate> = m.available_coordinates().take(3).collect();
        assert_eq!(
            coords,
            vec![
                Coordinate::from([0, 0]),
                Coordinate::from([0, 1]),
                Coordinate::from([1, 0])
            ]
        );
    }

    #[test]
    fn test_matmul_matches_naive() {
        let a = DenseND::from_vec((1..=12).map(f64::from).collect(), &[3, 4]).unwrap();
        let b = DenseND::from_vec((1..=8).map(f64::from).collect(), &[4, 2]).unwrap();
        let ab = BlockMatrix::from_dense(&a, 2, BlockOrder::RowMajor).unwrap();
        let bb = BlockMatrix::from_dense(&b, 3, BlockOrder::ColumnMajor).unwrap();
        let c = ab.matmul(&bb).unwrap();
        assert_eq!((c.rows(), c.cols()), (3, 2));
        for i in 0..3 {
            for j in 0..2 {
                let expected: f64 = (0..4)
                    .map(|k| {
                        a.get(&[i as i64, k]).unwrap() * b.get(&[k, j as i64]).unwrap()
                    })
                    .sum();
                assert_eq!(c.get(i, j).unwrap(), expected);
            }
        }
    }

    #[test]
    fn test_matmul_shape_mismatch() {
        let a = BlockMatrix::<f64>::new(2, 3);
        let b = BlockMatrix::<f64>::new(2, 3);
        assert!(matches!(
            a.matmul(&b),
            Err(GridError::ShapeMismatch { .. })
        ));
    }
}
