//! OSRM client for distance and duration matrices and route polylines.
//!
//! Responsibilities:
//! - Split table queries into blocks within the server's size cap.
//! - Fetch blocks concurrently under an admission bound, through an
//!   optional response cache.
//! - Stitch blocks into full matrices and restore dropped empty points.
//! - Assemble per-leg route polylines from step geometry.
//!
//! Boundaries:
//! - Never route locally; every answer comes from the backend.
//! - No retries. Callers own retry policy.
//! - HTTP stays behind the [`Transport`] trait.
//!
//! Invariants:
//! - Stitched matrices do not depend on the order blocks complete in.
//! - A failed block fails the whole table; there are no partial matrices.
//! - No global mutable state.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use routeweave_core::Point;
//! use routeweave_osrm::test_support::{StubTransport, TABLE_RESPONSE_OK};
//! use routeweave_osrm::{BlockingOsrmClient, ClientConfig, TableOptions};
//!
//! let transport = Arc::new(StubTransport::with_body(TABLE_RESPONSE_OK));
//! let client = BlockingOsrmClient::with_transport(ClientConfig::default(), transport)?;
//! let points = [Point::new(0.0, 0.0), Point::new(1.0, 1.0)];
//!
//! let matrices = client.table(&points, &TableOptions::default().with_duration())?;
//! let durations = matrices.durations.expect("durations were requested");
//! assert_eq!(durations.cost(0, 1), Some(17699.1));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![forbid(unsafe_code)]

mod blocking;
mod cache;
mod client;
mod config;
mod error;
pub mod executor;
pub mod geometry;
pub mod plan;
pub mod response;
pub mod stitch;
mod transport;

#[doc(hidden)]
pub mod test_support;

pub use blocking::BlockingOsrmClient;
pub use cache::ResponseCache;
pub use client::OsrmClient;
pub use config::{
    ClientConfig, DEFAULT_CACHE_CAPACITY, DEFAULT_MAX_TABLE_SIZE, DEFAULT_PARALLEL_RUNS,
    DEFAULT_USER_AGENT, TableOptions,
};
pub use error::{OsrmError, ProviderBuildError, TransportError};
pub use executor::{BlockResult, CachedFetcher};
pub use plan::{TableRequest, plan_table_requests};
pub use stitch::{StitchedTable, stitch};
pub use transport::{HttpTransport, Transport};
