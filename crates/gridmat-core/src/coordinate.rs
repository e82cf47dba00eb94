//! Coordinates: fixed-length integer vectors addressing container cells.
//!
//! A [`Coordinate`] is used both as a cell address and as a container shape
//! (one extent per dimension). Equality and hashing are value based, so a
//! coordinate can be used directly as a map key by sparse storage.
//!
//! Elementwise arithmetic requires operands of equal rank. Mixing ranks is a
//! programming error and panics rather than returning a `Result`.
//!
//! # Examples
//!
//! ```
//! use gridmat_core::Coordinate;
//!
//! let shape = Coordinate::from([3, 4]);
//! let cell = Coordinate::from([2, 1]);
//!
//! assert!(cell.is_smaller_than(&shape));
//! assert_eq!(shape.product(), 12);
//! assert_eq!(cell.transpose(0, 1), Coordinate::from([1, 2]));
//!
//! let parsed: Coordinate = "3x4".parse().unwrap();
//! assert_eq!(parsed, shape);
//! ```

use crate::error::{GridError, GridResult};
use smallvec::SmallVec;
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

/// Conventional index of the row dimension.
pub const ROW: usize = 0;

/// Conventional index of the column dimension.
pub const COLUMN: usize = 1;

/// Delimiters accepted by [`Coordinate::parse`].
pub const DEFAULT_DELIMITERS: [char; 4] = [',', ';', '\t', 'x'];

/// Axis along which a calculation collapses its output.
///
/// `Row` reduces over the row dimension (an `R x C` source yields `1 x C`),
/// `Column` reduces over columns (`R x 1`), `All` reduces to a `1 x 1` scalar.
/// The absence of a reduction is expressed as `Option::<Dimension>::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Dimension {
    Row,
    Column,
    All,
}

impl Dimension {
    /// Shape produced by reducing `shape` along this dimension.
    ///
    /// ```
    /// use gridmat_core::{Coordinate, Dimension};
    ///
    /// let shape = Coordinate::from([4, 3]);
    /// assert_eq!(Dimension::Row.reduce_shape(&shape), Coordinate::from([1, 3]));
    /// assert_eq!(Dimension::Column.reduce_shape(&shape), Coordinate::from([4, 1]));
    /// assert_eq!(Dimension::All.reduce_shape(&shape), Coordinate::from([1, 1]));
    /// ```
    pub fn reduce_shape(self, shape: &Coordinate) -> Coordinate {
        let mut out = shape.clone();
        match self {
            Dimension::Row => out.0[ROW] = 1,
            Dimension::Column => out.0[COLUMN] = 1,
            Dimension::All => out.0.iter_mut().for_each(|d| *d = 1),
        }
        out
    }

    /// Whether axis `axis` is collapsed by this reduction.
    pub fn collapses(self, axis: usize) -> bool {
        match self {
            Dimension::Row => axis == ROW,
            Dimension::Column => axis == COLUMN,
            Dimension::All => true,
        }
    }
}

/// Immutable ordered sequence of integers, one per dimension.
///
/// Components are signed so that invalid (negative) addresses can be
/// represented and rejected by bounds checks, and so that the "not found"
/// sentinel (all `-1`) fits.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coordinate(SmallVec<[i64; 6]>);

impl Coordinate {
    /// Create a coordinate from its components.
    pub fn new(dims: &[i64]) -> Self {
        Self(SmallVec::from_slice(dims))
    }

    /// All-zero coordinate of the given rank.
    pub fn zeros(rank: usize) -> Self {
        Self(SmallVec::from_elem(0, rank))
    }

    /// Coordinate of the given rank with every component set to `value`.
    pub fn filled(rank: usize, value: i64) -> Self {
        Self(SmallVec::from_elem(value, rank))
    }

    /// Sentinel returned by lookups that found nothing: every component is `-1`.
    pub fn not_found(rank: usize) -> Self {
        Self::filled(rank, -1)
    }

    /// Whether this is the [`not_found`](Self::not_found) sentinel.
    pub fn is_not_found(&self) -> bool {
        !self.0.is_empty() && self.0.iter().all(|&d| d == -1)
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Components as a slice.
    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }

    /// Copy with component `axis` replaced.
    pub fn with(&self, axis: usize, value: i64) -> Self {
        let mut out = self.clone();
        out.0[axis] = value;
        out
    }

    fn zip_with(&self, other: &Coordinate, op: &str, f: impl Fn(i64, i64) -> i64) -> Coordinate {
        assert_eq!(
            self.rank(),
            other.rank(),
            "Coordinate::{} requires equal ranks: {:?} vs {:?}",
            op,
            self,
            other
        );
        Coordinate(self.0.iter().zip(&other.0).map(|(&a, &b)| f(a, b)).collect())
    }

    /// Elementwise sum.
    ///
    /// # Panics
    ///
    /// Panics if `other` has a different rank.
    pub fn plus(&self, other: &Coordinate) -> Coordinate {
        self.zip_with(other, "plus", |a, b| a + b)
    }

    /// Elementwise difference.
    ///
    /// # Panics
    ///
    /// Panics if `other` has a different rank.
    pub fn minus(&self, other: &Coordinate) -> Coordinate {
        self.zip_with(other, "minus", |a, b| a - b)
    }

    /// Elementwise product.
    ///
    /// # Panics
    ///
    /// Panics if `other` has a different rank.
    pub fn times(&self, other: &Coordinate) -> Coordinate {
        self.zip_with(other, "times", |a, b| a * b)
    }

    /// Elementwise remainder.
    ///
    /// # Panics
    ///
    /// Panics if `other` has a different rank.
    pub fn modulo(&self, other: &Coordinate) -> Coordinate {
        self.zip_with(other, "modulo", |a, b| a % b)
    }

    /// Elementwise maximum.
    ///
    /// # Panics
    ///
    /// Panics if `other` has a different rank.
    pub fn max(&self, other: &Coordinate) -> Coordinate {
        self.zip_with(other, "max", i64::max)
    }

    /// Elementwise minimum.
    ///
    /// # Panics
    ///
    /// Panics if `other` has a different rank.
    pub fn min(&self, other: &Coordinate) -> Coordinate {
        self.zip_with(other, "min", i64::min)
    }

    /// Number of cells in the hyper-rectangle this coordinate spans as a shape.
    ///
    /// # Panics
    ///
    /// Panics on `i64` overflow in debug builds; use
    /// [`checked_product`](Self::checked_product) for shapes of untrusted size.
    pub fn product(&self) -> i64 {
        self.0.iter().product()
    }

    /// Cell count, or `None` when it does not fit in an `i64`.
    pub fn checked_product(&self) -> Option<i64> {
        self.0.iter().try_fold(1i64, |acc, &d| acc.checked_mul(d))
    }

    /// Half-open bounds check: every component is strictly below `bound`.
    ///
    /// # Panics
    ///
    /// Panics if `bound` has a different rank.
    pub fn is_smaller_than(&self, bound: &Coordinate) -> bool {
        assert_eq!(
            self.rank(),
            bound.rank(),
            "Coordinate::is_smaller_than requires equal ranks: {:?} vs {:?}",
            self,
            bound
        );
        self.0.iter().zip(&bound.0).all(|(&c, &b)| c < b)
    }

    /// Whether this coordinate addresses a cell of a container with `shape`.
    pub fn is_within(&self, shape: &Coordinate) -> bool {
        self.rank() == shape.rank()
            && self.0.iter().all(|&c| c >= 0)
            && self.is_smaller_than(shape)
    }

    /// Whether every component is zero.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&d| d == 0)
    }

    /// Copy with components `i` and `j` swapped.
    pub fn transpose(&self, i: usize, j: usize) -> Coordinate {
        let mut out = self.clone();
        out.0.swap(i, j);
        out
    }

    /// Parse using the default delimiters (`,`, `;`, tab, `x`).
    pub fn parse(text: &str) -> GridResult<Coordinate> {
        Self::parse_with(text, &DEFAULT_DELIMITERS)
    }

    /// Parse using an explicit delimiter set.
    ///
    /// Surrounding brackets or parentheses and whitespace around components are
    /// ignored, so the output of `Display` parses back.
    pub fn parse_with(text: &str, delimiters: &[char]) -> GridResult<Coordinate> {
        let trimmed = text
            .trim()
            .trim_start_matches(['[', '('])
            .trim_end_matches([']', ')']);
        if trimmed.trim().is_empty() {
            return Err(GridError::Parse(format!("empty coordinate: {:?}", text)));
        }
        trimmed
            .split(|c: char| delimiters.contains(&c))
            .map(|part| {
                part.trim()
                    .parse::<i64>()
                    .map_err(|e| GridError::Parse(format!("{:?} in {:?}: {}", part, text, e)))
            })
            .collect::<GridResult<SmallVec<[i64; 6]>>>()
            .map(Coordinate)
    }

    /// Validate against `shape` and convert to unsigned indices.
    pub fn checked_index(&self, shape: &Coordinate) -> GridResult<SmallVec<[usize; 6]>> {
        checked_index(&self.0, &shape.0)
    }

    /// Extents as unsigned sizes; negative extents are rejected.
    pub fn to_extents(&self) -> GridResult<Vec<usize>> {
        self.0
            .iter()
            .map(|&d| {
                usize::try_from(d)
                    .map_err(|_| GridError::invalid_shape(format!("negative extent in {:?}", self)))
            })
            .collect()
    }

    /// Iterate over every coordinate inside this shape, last axis fastest.
    pub fn iter_cells(&self) -> CoordinateIter {
        CoordinateIter::new(self)
    }
}

impl Deref for Coordinate {
    type Target = [i64];

    fn deref(&self) -> &[i64] {
        &self.0
    }
}

impl AsRef<[i64]> for Coordinate {
    fn as_ref(&self) -> &[i64] {
        &self.0
    }
}

/// Hash, equality and ordering all match the component slice, so maps keyed
/// by `Coordinate` can be looked up with a plain `&[i64]`.
impl Borrow<[i64]> for Coordinate {
    fn borrow(&self) -> &[i64] {
        &self.0
    }
}

impl From<&[i64]> for Coordinate {
    fn from(dims: &[i64]) -> Self {
        Coordinate::new(dims)
    }
}

impl From<Vec<i64>> for Coordinate {
    fn from(dims: Vec<i64>) -> Self {
        Coordinate(SmallVec::from_vec(dims))
    }
}

impl<const N: usize> From<[i64; N]> for Coordinate {
    fn from(dims: [i64; N]) -> Self {
        Coordinate::new(&dims)
    }
}

impl From<&[usize]> for Coordinate {
    fn from(dims: &[usize]) -> Self {
        Coordinate(dims.iter().map(|&d| d as i64).collect())
    }
}

impl FromIterator<i64> for Coordinate {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        Coordinate(iter.into_iter().collect())
    }
}

impl FromStr for Coordinate {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Coordinate::parse(s)
    }
}

impl fmt::Debug for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", d)?;
        }
        write!(f, "]")
    }
}

/// Validate `coord` against `shape` and convert to unsigned indices.
///
/// Fails with [`GridError::DimensionMismatch`] when the ranks differ and with
/// [`GridError::OutOfBounds`] when any component is negative or not below the
/// corresponding extent.
pub fn checked_index(coord: &[i64], shape: &[i64]) -> GridResult<SmallVec<[usize; 6]>> {
    if coord.len() != shape.len() {
        return Err(GridError::DimensionMismatch {
            expected: shape.len(),
            got: coord.len(),
        });
    }
    if coord.iter().zip(shape).any(|(&c, &s)| c < 0 || c >= s) {
        return Err(GridError::out_of_bounds(coord, shape));
    }
    Ok(coord.iter().map(|&c| c as usize).collect())
}

/// Iterator over every coordinate of a shape in row-major order.
///
/// Finite and restartable: calling [`Coordinate::iter_cells`] again yields the
/// same sequence. A shape with any zero extent yields nothing.
#[derive(Debug, Clone)]
pub struct CoordinateIter {
    shape: Coordinate,
    next: Option<Coordinate>,
}

impl CoordinateIter {
    /// Start iterating over `shape`.
    pub fn new(shape: &Coordinate) -> Self {
        let next = if shape.rank() == 0 || shape.iter().any(|&d| d <= 0) {
            None
        } else {
            Some(Coordinate::zeros(shape.rank()))
        };
        Self {
            shape: shape.clone(),
            next,
        }
    }
}

impl Iterator for CoordinateIter {
    type Item = Coordinate;

    fn next(&mut self) -> Option<Coordinate> {
        let current = self.next.take()?;
        let mut advanced = current.clone();
        for axis in (0..advanced.rank()).rev() {
            advanced.0[axis] += 1;
            if advanced.0[axis] < self.shape.0[axis] {
                self.next = Some(advanced);
                return Some(current);
            }
            advanced.0[axis] = 0;
        }
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.next {
            None => (0, Some(0)),
            Some(_) => (
                1,
                self.shape
                    .checked_product()
                    .and_then(|n| usize::try_from(n).ok()),
            ),
        }
    }
}
