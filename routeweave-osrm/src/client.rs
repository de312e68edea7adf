//! Asynchronous OSRM client.
//!
//! [`OsrmClient`] runs the full table pipeline: drop empty points, plan
//! blocks, fetch them concurrently through the cache, stitch the blocks and
//! restore the dropped points. Route geometry goes through the same cached
//! fetcher as a single request.

use std::borrow::Cow;
use std::sync::Arc;

use routeweave_core::{
    CostMatrix, IndexMap, Matrix, Point, RoutePolylines, TableMatrices, deflate, inflate,
};

use crate::executor::{CachedFetcher, execute};
use crate::geometry::fetch_polylines;
use crate::plan::plan_table_requests;
use crate::stitch::{StitchedTable, stitch};
use crate::{
    ClientConfig, DEFAULT_CACHE_CAPACITY, HttpTransport, OsrmError, ProviderBuildError,
    ResponseCache, TableOptions, Transport,
};

/// Client for OSRM's Table and Route services.
///
/// Cloning is cheap and clones share the response cache.
///
/// # Example
///
/// ```no_run
/// use routeweave_core::Point;
/// use routeweave_osrm::{ClientConfig, OsrmClient, TableOptions};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let client = OsrmClient::with_config(
///     ClientConfig::new("http://localhost:5000").with_cache(100),
/// )?;
/// let points = [Point::new(13.388860, 52.517037), Point::new(13.397634, 52.529407)];
/// let matrices = client.table(&points, &TableOptions::default()).await?;
/// let polylines = client.polyline(&points).await?;
/// assert_eq!(polylines.legs.len(), 1);
/// # let _ = matrices;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: ClientConfig,
    fetcher: CachedFetcher,
}

impl OsrmClient {
    /// Create a client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client fails
    /// to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::with_config(ClientConfig::new(base_url))
    }

    /// Create a client with an optional cache of
    /// [`DEFAULT_CACHE_CAPACITY`] responses.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client fails
    /// to build.
    pub fn with_cache_default(
        base_url: impl Into<String>,
        use_cache: bool,
    ) -> Result<Self, ProviderBuildError> {
        let capacity = if use_cache { DEFAULT_CACHE_CAPACITY } else { 0 };
        Self::with_config(ClientConfig::new(base_url).with_cache(capacity))
    }

    /// Create a client talking HTTP as described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails validation, the base URL is
    /// invalid or the HTTP client fails to build.
    pub fn with_config(config: ClientConfig) -> Result<Self, ProviderBuildError> {
        config.validate()?;
        let transport = HttpTransport::from_config(&config)?;
        Ok(Self::assemble(config, Arc::new(transport)))
    }

    /// Create a client that sends every request through `transport`.
    ///
    /// The base URL, timeout and user agent in `config` go unused.
    ///
    /// # Errors
    ///
    /// Returns [`OsrmError::Configuration`] if `config` fails validation.
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, OsrmError> {
        config.validate()?;
        Ok(Self::assemble(config, transport))
    }

    fn assemble(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let cache = config
            .cache_capacity
            .and_then(ResponseCache::with_capacity)
            .map(Arc::new);
        Self {
            fetcher: CachedFetcher::new(transport, cache),
            config,
        }
    }

    /// Configuration this client was built with.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Response cache, when caching is enabled.
    #[must_use]
    pub fn cache(&self) -> Option<&ResponseCache> {
        self.fetcher.cache()
    }

    /// Fetch `path` (relative to the server root) through the cache.
    ///
    /// # Errors
    ///
    /// Returns [`OsrmError::BackendUserInput`] when the server answers
    /// HTTP 400 and [`OsrmError::BackendService`] for other failures.
    pub async fn get(&self, path: &str) -> Result<Arc<[u8]>, OsrmError> {
        self.fetcher.get(path).await
    }

    /// Compute the matrices requested by `options` for every pair of
    /// `points`.
    ///
    /// Matrices are `points.len()` square and indexed like `points`. With
    /// [`ClientConfig::ignore_empty`] set, rows and columns of empty points
    /// are zero and those points are never sent.
    ///
    /// # Errors
    ///
    /// Returns [`OsrmError::EmptyInput`] for zero points, the aggregated
    /// backend failure if any block fails, [`OsrmError::Cancelled`] when the
    /// options' token fires, and [`OsrmError::Decode`] when the stitched
    /// matrices do not cover the queried points.
    pub async fn table(
        &self,
        points: &[Point],
        options: &TableOptions,
    ) -> Result<TableMatrices, OsrmError> {
        if points.is_empty() {
            return Err(OsrmError::EmptyInput);
        }

        let (query, index_map): (Cow<'_, [Point]>, Option<IndexMap>) = if self.config.ignore_empty
        {
            let (kept, indices) = deflate(points);
            (Cow::Owned(kept), Some(indices))
        } else {
            (Cow::Borrowed(points), None)
        };

        let stitched = if query.is_empty() {
            log::debug!("all {} points are empty; skipping the backend", points.len());
            StitchedTable {
                distances: options.wants_distance().then(Vec::new),
                durations: options.wants_duration().then(Vec::new),
            }
        } else {
            self.fetch_table(&query, options).await?
        };

        let finish = |matrix: Option<Matrix>, wanted: bool, name: &str| {
            finish_matrix(matrix, wanted, name, query.len(), index_map.as_deref(), points.len())
        };
        Ok(TableMatrices {
            distances: finish(stitched.distances, options.wants_distance(), "distances")?,
            durations: finish(stitched.durations, options.wants_duration(), "durations")?,
        })
    }

    async fn fetch_table(
        &self,
        points: &[Point],
        options: &TableOptions,
    ) -> Result<StitchedTable, OsrmError> {
        let requests = plan_table_requests(points, &self.config, options)?;
        let parallel_runs = options.parallel_runs.unwrap_or(self.config.parallel_runs);
        log::debug!(
            "querying {} table blocks for {} points, {parallel_runs} at a time",
            requests.len(),
            points.len()
        );
        let blocks = execute(
            requests,
            &self.fetcher,
            parallel_runs,
            options.cancellation.as_ref(),
        )
        .await?;
        Ok(stitch(blocks))
    }

    /// Duration matrix in seconds.
    ///
    /// # Errors
    ///
    /// See [`OsrmClient::table`].
    pub async fn duration_matrix(&self, points: &[Point]) -> Result<CostMatrix, OsrmError> {
        let options = TableOptions::default().with_duration();
        self.table(points, &options)
            .await?
            .durations
            .ok_or_else(|| OsrmError::decode("response missing durations"))
    }

    /// Distance matrix in metres.
    ///
    /// # Errors
    ///
    /// See [`OsrmClient::table`].
    pub async fn distance_matrix(&self, points: &[Point]) -> Result<CostMatrix, OsrmError> {
        let options = TableOptions::default().with_distance();
        self.table(points, &options)
            .await?
            .distances
            .ok_or_else(|| OsrmError::decode("response missing distances"))
    }

    /// Distance and duration matrices from one set of requests.
    ///
    /// # Errors
    ///
    /// See [`OsrmClient::table`].
    pub async fn distance_duration_matrices(
        &self,
        points: &[Point],
    ) -> Result<(CostMatrix, CostMatrix), OsrmError> {
        let options = TableOptions::default().with_distance().with_duration();
        let matrices = self.table(points, &options).await?;
        match (matrices.distances, matrices.durations) {
            (Some(distances), Some(durations)) => Ok((distances, durations)),
            _ => Err(OsrmError::decode("response missing distances or durations")),
        }
    }

    /// Polyline of the route through `points` plus one polyline per leg.
    ///
    /// The route is a single request; the table size cap does not apply.
    ///
    /// # Errors
    ///
    /// Returns [`OsrmError::EmptyInput`] for zero points,
    /// [`OsrmError::BackendStatus`] for a non-`"Ok"` answer,
    /// [`OsrmError::MissingRoute`] when the answer has no route and
    /// [`OsrmError::Decode`] for malformed geometry.
    pub async fn polyline(&self, points: &[Point]) -> Result<RoutePolylines, OsrmError> {
        fetch_polylines(&self.fetcher, points).await
    }
}

/// Check a requested matrix covers `query_size` points, then restore the
/// original indexing. Annotations that were not requested are dropped.
fn finish_matrix(
    matrix: Option<Matrix>,
    wanted: bool,
    name: &str,
    query_size: usize,
    index_map: Option<&[usize]>,
    original_size: usize,
) -> Result<Option<CostMatrix>, OsrmError> {
    if !wanted {
        return Ok(None);
    }
    let Some(matrix) = matrix else {
        return Err(OsrmError::decode(format!("response missing {name}")));
    };

    let covers_query =
        matrix.len() == query_size && matrix.iter().all(|row| row.len() == query_size);
    if !covers_query {
        return Err(OsrmError::decode(format!(
            "stitched {name} do not form a {query_size}x{query_size} matrix"
        )));
    }

    let rows = match index_map {
        Some(indices) => inflate(&matrix, indices, original_size),
        None => matrix,
    };
    CostMatrix::new(rows).map(Some).map_err(OsrmError::decode)
}
