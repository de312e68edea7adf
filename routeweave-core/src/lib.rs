//! Core domain types for the Routeweave routing client.
//!
//! These models stay independent of any particular routing backend. They
//! describe the points a caller wants to route between, the square cost
//! matrices returned for them and the pure transforms that drop and restore
//! unroutable points around a backend query.

#![forbid(unsafe_code)]

pub mod filter;
pub mod matrix;
pub mod matrix_provider;
pub mod point;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use filter::{IndexMap, deflate, inflate};
pub use matrix::{CostMatrix, CostMatrixError, Matrix};
pub use matrix_provider::{MatrixError, MatrixProvider, RoutePolylines, TableMatrices};
pub use point::Point;
