//! Factory hints and configuration

use gridmat_core::{BlockOrder, Layout, DEFAULT_BLOCK_SIDE};

/// Storage strategy requested from the factory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Density {
    /// Contiguous buffer
    #[default]
    Dense,
    /// Coordinate map of non-default cells
    Sparse,
}

/// Hints steering how the factory lays out new containers
///
/// # Examples
///
/// ```
/// use gridmat_exec::{Density, FactoryHints};
///
/// let hints = FactoryHints::new()
///     .with_sparse(true)
///     .with_max_entries(10_000)
///     .with_block_threshold(1 << 20);
/// assert_eq!(hints.default_density(), Density::Sparse);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FactoryHints {
    /// Hand out sparse storage when no density is requested
    pub prefer_sparse: bool,
    /// Capacity cap applied to new sparse containers
    pub max_entries: Option<usize>,
    /// Tile side for block storage and blocked products
    pub block_side: usize,
    /// Tile order for block storage
    pub block_order: BlockOrder,
    /// Dense 2-D `f64` requests with at least this many cells get block storage
    pub block_threshold: Option<usize>,
    /// Memory order of dense 2-D containers
    pub order: Layout,
}

impl Default for FactoryHints {
    fn default() -> Self {
        Self {
            prefer_sparse: false,
            max_entries: None,
            block_side: DEFAULT_BLOCK_SIDE,
            block_order: BlockOrder::RowMajor,
            block_threshold: None,
            order: Layout::ColumnMajor,
        }
    }
}

impl FactoryHints {
    /// Create new hints with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set sparse preference
    pub fn with_sparse(mut self, prefer: bool) -> Self {
        self.prefer_sparse = prefer;
        self
    }

    /// Cap new sparse containers at `max` entries
    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = Some(max);
        self
    }

    /// Set the tile side
    pub fn with_block_side(mut self, side: usize) -> Self {
        self.block_side = side;
        self
    }

    /// Set the tile order
    pub fn with_block_order(mut self, order: BlockOrder) -> Self {
        self.block_order = order;
        self
    }

    /// Use block storage for dense 2-D `f64` containers of `cells` or more
    pub fn with_block_threshold(mut self, cells: usize) -> Self {
        self.block_threshold = Some(cells);
        self
    }

    /// Set the memory order of dense 2-D containers
    pub fn with_order(mut self, order: Layout) -> Self {
        self.order = order;
        self
    }

    /// Density used when the caller does not ask for one
    pub fn default_density(&self) -> Density {
        if self.prefer_sparse {
            Density::Sparse
        } else {
            Density::Dense
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let hints = FactoryHints::default();
        assert_eq!(hints.default_density(), Density::Dense);
        assert_eq!(hints.order, Layout::ColumnMajor);
        assert_eq!(hints.block_side, DEFAULT_BLOCK_SIDE);
        assert!(hints.block_threshold.is_none());
    }

    #[test]
    fn test_builder_chain() {
        let hints = FactoryHints::new()
            .with_block_side(16)
            .with_block_order(BlockOrder::ColumnMajor)
            .with_order(Layout::RowMajor)
            .with_max_entries(3);
        assert_eq!(hints.block_side, 16);
        assert_eq!(hints.block_order, BlockOrder::ColumnMajor);
        assert_eq!(hints.order, Layout::RowMajor);
        assert_eq!(hints.max_entries, Some(3));
    }
}
