//! Compute travel-cost matrices and route polylines between points.
//!
//! The `MatrixProvider` trait is the synchronous seam through which the rest
//! of a system consumes a routing backend. Callers supply a slice of
//! [`Point`](crate::Point) values and receive square
//! [`CostMatrix`](crate::CostMatrix) values, or an encoded route.
//!
//! Errors carry a flag telling callers whether the failure was caused by
//! their input (and may be corrected) or by the backend.

mod error;
mod provider;

pub use error::MatrixError;
pub use provider::{MatrixProvider, RoutePolylines, TableMatrices};
