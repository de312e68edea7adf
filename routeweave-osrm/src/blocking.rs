//! Synchronous facade over [`OsrmClient`].
//!
//! [`MatrixProvider`] is synchronous so consumers can stay free of async
//! runtimes. [`BlockingOsrmClient`] owns a current-thread Tokio runtime that
//! it reuses across calls.
//!
//! # Runtime behaviour
//!
//! Outside any Tokio runtime the client blocks on its own runtime. Inside a
//! multi-threaded runtime it blocks on the caller's handle through
//! [`tokio::task::block_in_place`] to avoid nested runtime panics. Inside a
//! `current_thread` runtime the calling thread cannot block on a runtime, so
//! the request runs on the client's own runtime from a scoped helper thread
//! while the caller's runtime stays parked.

use std::fmt;
use std::future::Future;
use std::panic;
use std::sync::Arc;
use std::thread;

use routeweave_core::{MatrixError, MatrixProvider, Point, RoutePolylines, TableMatrices};
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};

use crate::{ClientConfig, OsrmClient, OsrmError, ProviderBuildError, TableOptions, Transport};

/// Blocking OSRM client implementing [`MatrixProvider`].
///
/// # Example
///
/// ```no_run
/// use routeweave_core::{MatrixProvider, Point};
/// use routeweave_osrm::BlockingOsrmClient;
///
/// let client = BlockingOsrmClient::new("http://localhost:5000")?;
/// let points = [Point::new(13.388860, 52.517037), Point::new(13.397634, 52.529407)];
/// let matrices = client.compute_matrices(&points)?;
/// assert!(matrices.durations.is_some());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct BlockingOsrmClient {
    client: OsrmClient,
    options: TableOptions,
    // Only `None` while dropping.
    runtime: Option<Runtime>,
}

impl fmt::Debug for BlockingOsrmClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockingOsrmClient")
            .field("client", &self.client)
            .field("options", &self.options)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish()
    }
}

impl BlockingOsrmClient {
    /// Create a client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::with_config(ClientConfig::new(base_url))
    }

    /// Create a client with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid or the HTTP client or Tokio
    /// runtime fails to build.
    pub fn with_config(config: ClientConfig) -> Result<Self, ProviderBuildError> {
        Self::from_client(OsrmClient::with_config(config)?)
    }

    /// Create a client that sends every request through `transport`.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid or the Tokio runtime fails to
    /// build.
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ProviderBuildError> {
        Self::from_client(OsrmClient::with_transport(config, transport)?)
    }

    /// Wrap an existing asynchronous client.
    ///
    /// # Errors
    ///
    /// Returns an error if the Tokio runtime fails to build.
    pub fn from_client(client: OsrmClient) -> Result<Self, ProviderBuildError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ProviderBuildError::Runtime)?;
        Ok(Self {
            client,
            options: TableOptions::default(),
            runtime: Some(runtime),
        })
    }

    /// Use `options` for [`MatrixProvider::compute_matrices`].
    #[must_use]
    pub fn with_options(mut self, options: TableOptions) -> Self {
        self.options = options;
        self
    }

    /// The wrapped asynchronous client.
    #[must_use]
    pub const fn client(&self) -> &OsrmClient {
        &self.client
    }

    /// Blocking form of [`OsrmClient::table`].
    ///
    /// # Errors
    ///
    /// See [`OsrmClient::table`].
    pub fn table(
        &self,
        points: &[Point],
        options: &TableOptions,
    ) -> Result<TableMatrices, OsrmError> {
        self.block_on(self.client.table(points, options))
    }

    /// Blocking form of [`OsrmClient::polyline`].
    ///
    /// # Errors
    ///
    /// See [`OsrmClient::polyline`].
    pub fn polyline(&self, points: &[Point]) -> Result<RoutePolylines, OsrmError> {
        self.block_on(self.client.polyline(points))
    }

    /// Blocking form of [`OsrmClient::get`].
    ///
    /// # Errors
    ///
    /// See [`OsrmClient::get`].
    pub fn get(&self, path: &str) -> Result<Arc<[u8]>, OsrmError> {
        self.block_on(self.client.get(path))
    }

    fn block_on<T, F>(&self, future: F) -> Result<T, OsrmError>
    where
        F: Future<Output = Result<T, OsrmError>> + Send,
        T: Send,
    {
        let Some(runtime) = self.runtime.as_ref() else {
            return Err(OsrmError::Cancelled);
        };
        // block_in_place requires a multi-threaded runtime.
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(future))
            }
            Ok(_) => thread::scope(|scope| {
                scope
                    .spawn(|| runtime.block_on(future))
                    .join()
                    .unwrap_or_else(|payload| panic::resume_unwind(payload))
            }),
            Err(_) => runtime.block_on(future),
        }
    }
}

impl Drop for BlockingOsrmClient {
    fn drop(&mut self) {
        // A runtime cannot be dropped from async context.
        if Handle::try_current().is_ok()
            && let Some(runtime) = self.runtime.take()
        {
            runtime.shutdown_background();
        }
    }
}

impl MatrixProvider for BlockingOsrmClient {
    fn compute_matrices(&self, points: &[Point]) -> Result<TableMatrices, MatrixError> {
        Ok(self.table(points, &self.options)?)
    }

    fn compute_polyline(&self, points: &[Point]) -> Result<RoutePolylines, MatrixError> {
        Ok(self.polyline(points)?)
    }
}
