//! Property-based tests for coordinates, dense storage and block layouts
//!
//! This module uses proptest to check addressing invariants across randomly
//! generated shapes.

#[cfg(test)]
mod tests {
    use crate::{
        BlockLayout, BlockMatrix, BlockOrder, Container, Coordinate, DenseND, Layout,
    };
    use proptest::prelude::*;

    // Shapes of rank 2-4 with small extents
    fn shape_strategy() -> impl Strategy<Value = Vec<usize>> {
        prop::collection::vec(1usize..6, 2..=4)
    }

    fn order_strategy() -> impl Strategy<Value = BlockOrder> {
        prop_oneof![Just(BlockOrder::RowMajor), Just(BlockOrder::ColumnMajor)]
    }

    proptest! {
        #[test]
        fn prop_all_coordinates_cover_shape(shape in shape_strategy()) {
            let shape = Coordinate::from(shape.as_slice());
            let coords: Vec<Coordinate> = shape.iter_cells().collect();
            prop_assert_eq!(coords.len() as i64, shape.product());
            for c in &coords {
                prop_assert!(c.is_within(&shape));
            }
            prop_assert!(coords.windows(2).all(|w| w[0] < w[1]));
        }

        #[test]
        fn prop_out_of_range_axis_always_rejected(
            shape in shape_strategy(),
            axis in 0usize..4,
            overshoot in 0i64..3,
        ) {
            let m = DenseND::<f64>::zeros(&shape);
            let axis = axis % shape.len();
            let mut coord = vec![0i64; shape.len()];
            coord[axis] = shape[axis] as i64 + overshoot;
            prop_assert!(m.get_value(&coord).unwrap_err().is_out_of_bounds());
            coord[axis] = -1 - overshoot;
            prop_assert!(m.get_value(&coord).unwrap_err().is_out_of_bounds());
        }

        #[test]
        fn prop_layouts_agree_on_cells(shape in shape_strategy()) {
            let mut row = DenseND::<i64>::with_layout(&shape, Layout::RowMajor);
            let mut col = DenseND::<i64>::with_layout(&shape, Layout::ColumnMajor);
            for (i, coord) in row.all_coordinates().enumerate() {
                row.set(&coord, i as i64).unwrap();
                col.set(&coord, i as i64).unwrap();
            }
            prop_assert_eq!(&row, &col);
            prop_assert_eq!(col.layout(), Layout::ColumnMajor);
        }

        #[test]
        fn prop_coordinate_display_parses_back(dims in prop::collection::vec(0i64..1000, 1..6)) {
            let c = Coordinate::from(dims);
            let parsed: Coordinate = c.to_string().parse().unwrap();
            prop_assert_eq!(parsed, c);
        }

        #[test]
        fn prop_block_index_bijective(
            rows in 1usize..20,
            cols in 1usize..20,
            br in 1usize..7,
            bc in 1usize..7,
            order in order_strategy(),
        ) {
            let layout = BlockLayout::new(rows, cols, br, bc, order).unwrap();
            let mut seen = vec![false; rows * cols];
            for r in 0..rows {
                for c in 0..cols {
                    let i = layout.index(r, c);
                    prop_assert!(i < rows * cols);
                    prop_assert!(!seen[i]);
                    seen[i] = true;
                    prop_assert_eq!(layout.position_of(i), (r, c));
                }
            }
        }

        #[test]
        fn prop_block_round_trip(
            rows in 1usize..16,
            cols in 1usize..16,
            side in 1usize..6,
            order in order_strategy(),
        ) {
            let dense = DenseND::from_vec(
                (0..rows * cols).map(|v| v as f64 * 0.25).collect(),
                &[rows, cols],
            ).unwrap();
            let blocked = BlockMatrix::from_dense(&dense, side, order).unwrap();
            for r in 0..rows {
                for c in 0..cols {
                    prop_assert_eq!(
                        blocked.get(r, c).unwrap(),
                        dense.get(&[r as i64, c as i64]).unwrap()
                    );
                }
            }
            prop_assert_eq!(blocked.to_dense(Layout::RowMajor), dense);
        }
    }
}
