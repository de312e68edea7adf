//! Matrix provider trait and the value types it returns.

use crate::{CostMatrix, Point};

use super::error::MatrixError;

/// Distance and duration matrices for one set of points.
///
/// Either matrix is `None` when it was not requested from the backend.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TableMatrices {
    /// Distances in metres.
    pub distances: Option<CostMatrix>,
    /// Durations in seconds.
    pub durations: Option<CostMatrix>,
}

/// Encoded geometry of a route through a sequence of points.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RoutePolylines {
    /// Polyline covering the whole route from first to last point.
    pub full: String,
    /// One polyline per leg, i.e. `points.len() - 1` entries.
    pub legs: Vec<String>,
}

/// Fetch pairwise travel costs and route geometry for a set of points.
///
/// Implementers must return square `n×n` matrices where `n == points.len()`,
/// including points the implementation chose not to send to its backend.
///
/// # Examples
///
/// ```rust
/// use routeweave_core::{
///     CostMatrix, MatrixError, MatrixProvider, Point, RoutePolylines, TableMatrices,
/// };
///
/// struct UnitProvider;
///
/// impl MatrixProvider for UnitProvider {
///     fn compute_matrices(&self, points: &[Point]) -> Result<TableMatrices, MatrixError> {
///         if points.is_empty() {
///             return Err(MatrixError::EmptyInput);
///         }
///         let n = points.len();
///         let rows = (0..n)
///             .map(|i| (0..n).map(|j| if i == j { 0.0 } else { 1.0 }).collect())
///             .collect();
///         let durations = CostMatrix::new(rows).map_err(|err| MatrixError::Service {
///             message: err.to_string(),
///         })?;
///         Ok(TableMatrices { distances: None, durations: Some(durations) })
///     }
///
///     fn compute_polyline(&self, points: &[Point]) -> Result<RoutePolylines, MatrixError> {
///         if points.is_empty() {
///             return Err(MatrixError::EmptyInput);
///         }
///         Ok(RoutePolylines::default())
///     }
/// }
///
/// let matrices = UnitProvider.compute_matrices(&[Point::new(0.1, 0.1)])?;
/// assert_eq!(matrices.durations.map(|m| m.len()), Some(1));
/// # Ok::<(), MatrixError>(())
/// ```
pub trait MatrixProvider {
    /// Return distance and/or duration matrices for `points`.
    ///
    /// Implementations must return `Err(MatrixError::EmptyInput)` when
    /// `points` is empty.
    fn compute_matrices(&self, points: &[Point]) -> Result<TableMatrices, MatrixError>;

    /// Return the encoded route through `points` in order.
    ///
    /// Implementations must return `Err(MatrixError::EmptyInput)` when
    /// `points` is empty.
    fn compute_polyline(&self, points: &[Point]) -> Result<RoutePolylines, MatrixError>;
}
