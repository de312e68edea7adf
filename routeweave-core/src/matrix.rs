//! Square cost matrices indexed by point position.

use thiserror::Error;

/// Rows of pairwise costs, `matrix[i][j]` being the cost from `i` to `j`.
pub type Matrix = Vec<Vec<f64>>;

/// A validated square matrix of travel costs.
///
/// Costs are distances in metres or durations in seconds depending on the
/// query. Unreachable pairs are `f64::INFINITY`.
///
/// # Examples
///
/// ```
/// use routeweave_core::CostMatrix;
///
/// # fn main() -> Result<(), routeweave_core::CostMatrixError> {
/// let matrix = CostMatrix::new(vec![vec![0.0, 17_699.1], vec![17_732.3, 0.0]])?;
/// assert_eq!(matrix.cost(0, 1), Some(17_699.1));
/// assert_eq!(matrix.cost(2, 0), None);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CostMatrix {
    rows: Matrix,
}

/// Errors returned by [`CostMatrix::new`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CostMatrixError {
    /// A row's length differs from the number of rows.
    #[error("row {row} has {actual} columns, expected {expected}")]
    NotSquare {
        /// Index of the offending row.
        row: usize,
        /// Number of rows, which every row length must match.
        expected: usize,
        /// Length of the offending row.
        actual: usize,
    },
}

impl CostMatrix {
    /// Validates and constructs a [`CostMatrix`].
    ///
    /// # Errors
    ///
    /// Returns [`CostMatrixError::NotSquare`] for the first row whose length
    /// differs from the number of rows.
    pub fn new(rows: Matrix) -> Result<Self, CostMatrixError> {
        let expected = rows.len();
        if let Some((row, actual)) = rows
            .iter()
            .map(Vec::len)
            .enumerate()
            .find(|&(_, len)| len != expected)
        {
            return Err(CostMatrixError::NotSquare {
                row,
                expected,
                actual,
            });
        }
        Ok(Self { rows })
    }

    /// Cost of travelling from point `from` to point `to`.
    ///
    /// Returns `None` when either index is out of range.
    #[must_use]
    pub fn cost(&self, from: usize, to: usize) -> Option<f64> {
        self.rows.get(from).and_then(|row| row.get(to)).copied()
    }

    /// Number of points covered by the matrix.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the matrix covers no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Borrow the underlying rows.
    #[must_use]
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Consume the matrix and return its rows.
    #[must_use]
    pub fn into_rows(self) -> Matrix {
        self.rows
    }
}

impl TryFrom<Matrix> for CostMatrix {
    type Error = CostMatrixError;

    fn try_from(rows: Matrix) -> Result<Self, Self::Error> {
        Self::new(rows)
    }
}
