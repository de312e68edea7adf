//! Drop empty points before a query and restore them afterwards.
//!
//! Routing backends reject or mis-snap points without a real location.
//! [`deflate`] removes them while remembering where the survivors came from,
//! and [`inflate`] expands a matrix computed for the survivors back to the
//! caller's original indexing. Cells touching a removed point are zero.

use crate::{Matrix, Point};

/// Original positions of the points kept by [`deflate`], strictly increasing.
pub type IndexMap = Vec<usize>;

/// Remove empty points, keeping the survivors in their original order.
///
/// # Examples
///
/// ```
/// use routeweave_core::{Point, deflate};
///
/// let points = [Point::new(1.0, 1.0), Point::missing(), Point::new(2.0, 2.0)];
/// let (kept, indices) = deflate(&points);
/// assert_eq!(kept, vec![Point::new(1.0, 1.0), Point::new(2.0, 2.0)]);
/// assert_eq!(indices, vec![0, 2]);
/// ```
#[must_use]
pub fn deflate(points: &[Point]) -> (Vec<Point>, IndexMap) {
    points
        .iter()
        .enumerate()
        .filter(|(_, point)| !point.is_empty())
        .map(|(index, point)| (*point, index))
        .unzip()
}

/// Expand `matrix` to `original_size × original_size` using `indices`.
///
/// `matrix[i][j]` lands at `[indices[i]][indices[j]]`; every other cell is
/// zero. Entries without a counterpart in `indices`, or indices beyond
/// `original_size`, are ignored.
#[must_use]
pub fn inflate(matrix: &Matrix, indices: &[usize], original_size: usize) -> Matrix {
    let mut inflated = vec![vec![0.0; original_size]; original_size];
    for (row, &target_row) in matrix.iter().zip(indices) {
        let Some(target) = inflated.get_mut(target_row) else {
            continue;
        };
        for (&value, &target_col) in row.iter().zip(indices) {
            if let Some(cell) = target.get_mut(target_col) {
                *cell = value;
            }
        }
    }
    inflated
}
