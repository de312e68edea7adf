//! Facade crate for the Routeweave routing client.
//!
//! This crate re-exports the backend-independent domain types and exposes
//! the OSRM client behind the `osrm` feature flag.

#![forbid(unsafe_code)]

pub use routeweave_core::{
    CostMatrix, CostMatrixError, IndexMap, Matrix, MatrixError, MatrixProvider, Point,
    RoutePolylines, TableMatrices, deflate, inflate,
};

#[cfg(feature = "osrm")]
pub use routeweave_osrm::{
    BlockingOsrmClient, ClientConfig, HttpTransport, OsrmClient, OsrmError, ProviderBuildError,
    TableOptions, Transport, TransportError,
};
