//! Test doubles and fixtures shared by unit, behaviour and benchmark code.
//!
//! [`StubMatrixProvider`] is a deterministic [`MatrixProvider`] that returns
//! pre-configured answers without contacting a backend.

use crate::{CostMatrix, Matrix, MatrixError, MatrixProvider, Point, RoutePolylines, TableMatrices};

/// Stub `MatrixProvider` for testing.
///
/// # Example
///
/// ```
/// use routeweave_core::test_support::StubMatrixProvider;
/// use routeweave_core::{MatrixProvider, Point};
///
/// let provider = StubMatrixProvider::with_unit_matrices();
/// let points = [Point::new(0.1, 0.1), Point::new(0.2, 0.2)];
/// let matrices = provider.compute_matrices(&points).expect("stub succeeds");
/// assert_eq!(matrices.durations.map(|m| m.len()), Some(2));
/// ```
#[derive(Debug, Clone)]
pub struct StubMatrixProvider {
    response: StubResponse,
}

#[derive(Debug, Clone)]
enum StubResponse {
    Fixed(TableMatrices, RoutePolylines),
    Unit,
    Error(MatrixError),
}

impl StubMatrixProvider {
    /// Create a provider that returns the given matrices and polylines.
    ///
    /// The answers are returned regardless of the points provided, as long
    /// as the input is non-empty.
    #[must_use]
    pub const fn with_matrices(matrices: TableMatrices, polylines: RoutePolylines) -> Self {
        Self {
            response: StubResponse::Fixed(matrices, polylines),
        }
    }

    /// Create a provider that returns the given error for any non-empty input.
    #[must_use]
    pub const fn with_error(error: MatrixError) -> Self {
        Self {
            response: StubResponse::Error(error),
        }
    }

    /// Create a provider whose matrices are sized to the input: zero on the
    /// diagonal and one everywhere else.
    #[must_use]
    pub const fn with_unit_matrices() -> Self {
        Self {
            response: StubResponse::Unit,
        }
    }
}

impl MatrixProvider for StubMatrixProvider {
    fn compute_matrices(&self, points: &[Point]) -> Result<TableMatrices, MatrixError> {
        if points.is_empty() {
            return Err(MatrixError::EmptyInput);
        }
        match &self.response {
            StubResponse::Fixed(matrices, _) => Ok(matrices.clone()),
            StubResponse::Unit => {
                let matrix = CostMatrix::new(unit_matrix(points.len())).map_err(|err| {
                    MatrixError::Service {
                        message: err.to_string(),
                    }
                })?;
                Ok(TableMatrices {
                    distances: Some(matrix.clone()),
                    durations: Some(matrix),
                })
            }
            StubResponse::Error(error) => Err(error.clone()),
        }
    }

    fn compute_polyline(&self, points: &[Point]) -> Result<RoutePolylines, MatrixError> {
        if points.is_empty() {
            return Err(MatrixError::EmptyInput);
        }
        match &self.response {
            StubResponse::Fixed(_, polylines) => Ok(polylines.clone()),
            StubResponse::Unit => Ok(RoutePolylines {
                full: String::new(),
                legs: vec![String::new(); points.len().saturating_sub(1)],
            }),
            StubResponse::Error(error) => Err(error.clone()),
        }
    }
}

/// Matrix of the given size with zero on the diagonal and one elsewhere.
#[must_use]
pub fn unit_matrix(size: usize) -> Matrix {
    (0..size)
        .map(|i| (0..size).map(|j| if i == j { 0.0 } else { 1.0 }).collect())
        .collect()
}

/// Matrix whose cell `(i, j)` holds `i * 1000 + j`, making misplaced cells
/// easy to spot.
#[must_use]
#[expect(
    clippy::cast_precision_loss,
    reason = "fixture indices stay far below 2^52"
)]
pub fn indexed_matrix(size: usize) -> Matrix {
    (0..size)
        .map(|i| {
            (0..size)
                .map(|j| i.saturating_mul(1000).saturating_add(j) as f64)
                .collect()
        })
        .collect()
}

/// `count` distinct points laid out on a small grid near Berlin.
#[must_use]
#[expect(
    clippy::cast_precision_loss,
    clippy::integer_division,
    clippy::integer_division_remainder_used,
    reason = "fixture indices stay far below 2^52 and rows of ten are intended"
)]
pub fn grid_points(count: usize) -> Vec<Point> {
    (0..count)
        .map(|i| {
            let col = (i % 10) as f64;
            let row = (i / 10) as f64;
            Point::new(13.3 + col * 0.01, 52.5 + row * 0.01)
        })
        .collect()
}
