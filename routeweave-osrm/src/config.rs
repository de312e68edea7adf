//! Client-wide configuration and per-call table options.

use std::time::Duration;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::OsrmError;

/// Default user agent for OSRM requests.
pub const DEFAULT_USER_AGENT: &str = "routeweave-osrm/0.1";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default number of points per table block, matching OSRM's own
/// `--max-table-size` default.
pub const DEFAULT_MAX_TABLE_SIZE: usize = 100;

/// Default number of table requests in flight at once.
pub const DEFAULT_PARALLEL_RUNS: usize = 16;

/// Cache capacity used by [`crate::OsrmClient::with_cache_default`].
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

/// Configuration for [`crate::OsrmClient`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(default))]
pub struct ClientConfig {
    /// Base URL for the OSRM service (e.g., `"http://localhost:5000"`).
    pub base_url: String,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
    /// Drop missing and `(0, 0)` points before table queries.
    ///
    /// Their rows and columns are zero in the returned matrices.
    pub ignore_empty: bool,
    /// Snap radius in metres applied to every point; `0` is unlimited.
    pub snap_radius: u32,
    /// Factor applied by the backend to durations, never to distances.
    pub scale_factor: f64,
    /// Maximum points per table block. Should match the server's
    /// `--max-table-size`.
    pub max_table_size: usize,
    /// Number of cached responses, or `None` to disable caching.
    pub cache_capacity: Option<usize>,
    /// Maximum number of table requests in flight at once.
    pub parallel_runs: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            ignore_empty: false,
            snap_radius: 0,
            scale_factor: 1.0,
            max_table_size: DEFAULT_MAX_TABLE_SIZE,
            cache_capacity: None,
            parallel_runs: DEFAULT_PARALLEL_RUNS,
        }
    }
}

impl ClientConfig {
    /// Create a new configuration with the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Drop empty points before table queries.
    #[must_use]
    pub const fn with_ignore_empty(mut self, ignore: bool) -> Self {
        self.ignore_empty = ignore;
        self
    }

    /// Limit snapping to the street network to `radius` metres.
    #[must_use]
    pub const fn with_snap_radius(mut self, radius: u32) -> Self {
        self.snap_radius = radius;
        self
    }

    /// Scale table durations by `factor`.
    #[must_use]
    pub const fn with_scale_factor(mut self, factor: f64) -> Self {
        self.scale_factor = factor;
        self
    }

    /// Set the maximum number of points per table block.
    #[must_use]
    pub const fn with_max_table_size(mut self, size: usize) -> Self {
        self.max_table_size = size;
        self
    }

    /// Cache up to `capacity` responses; `0` disables caching.
    #[must_use]
    pub const fn with_cache(mut self, capacity: usize) -> Self {
        self.cache_capacity = if capacity == 0 { None } else { Some(capacity) };
        self
    }

    /// Set the maximum number of table requests in flight at once.
    #[must_use]
    pub const fn with_parallel_runs(mut self, runs: usize) -> Self {
        self.parallel_runs = runs;
        self
    }

    /// Check every option against its accepted range.
    ///
    /// # Errors
    ///
    /// Returns [`OsrmError::Configuration`] naming the first invalid option.
    pub fn validate(&self) -> Result<(), OsrmError> {
        if !(self.scale_factor.is_finite() && self.scale_factor > 0.0) {
            return Err(OsrmError::configuration("scale factor must be > 0"));
        }
        if self.max_table_size == 0 {
            return Err(OsrmError::configuration("max table size must be > 0"));
        }
        if self.parallel_runs == 0 {
            return Err(OsrmError::configuration("parallel runs must be > 0"));
        }
        if self.parallel_runs > Semaphore::MAX_PERMITS {
            return Err(OsrmError::configuration(format!(
                "parallel runs must be <= {}",
                Semaphore::MAX_PERMITS
            )));
        }
        Ok(())
    }
}

/// Options for a single table query.
///
/// When neither distances nor durations are requested explicitly, both are
/// returned.
#[derive(Debug, Clone, Default)]
pub struct TableOptions {
    /// Request the distance matrix.
    pub distance: bool,
    /// Request the duration matrix.
    pub duration: bool,
    /// Approach every point from the curb side.
    pub approach_curb: bool,
    /// Road classes to avoid, e.g. `"toll"` or `"motorway"`.
    pub exclude: Vec<String>,
    /// Override of [`ClientConfig::parallel_runs`] for this query.
    pub parallel_runs: Option<usize>,
    /// Token that aborts outstanding requests when cancelled.
    pub cancellation: Option<CancellationToken>,
}

impl TableOptions {
    /// Include distances in the response.
    #[must_use]
    pub const fn with_distance(mut self) -> Self {
        self.distance = true;
        self
    }

    /// Include durations in the response.
    #[must_use]
    pub const fn with_duration(mut self) -> Self {
        self.duration = true;
        self
    }

    /// Approach every point from the curb side.
    #[must_use]
    pub const fn with_approach_curb(mut self) -> Self {
        self.approach_curb = true;
        self
    }

    /// Avoid the given road classes.
    #[must_use]
    pub fn with_exclude<I, S>(mut self, exclude: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = exclude.into_iter().map(Into::into).collect();
        self
    }

    /// Cap concurrent requests for this query; `0` keeps the client default.
    #[must_use]
    pub const fn with_parallel_runs(mut self, runs: usize) -> Self {
        if runs > 0 {
            self.parallel_runs = Some(runs);
        }
        self
    }

    /// Abort outstanding requests once `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Whether durations will be requested.
    #[must_use]
    pub const fn wants_duration(&self) -> bool {
        self.duration || !self.distance
    }

    /// Whether distances will be requested.
    #[must_use]
    pub const fn wants_distance(&self) -> bool {
        self.distance || !self.duration
    }

    /// Value of the `annotations` query parameter.
    #[must_use]
    pub const fn annotations(&self) -> &'static str {
        match (self.wants_duration(), self.wants_distance()) {
            (true, false) => "duration",
            (false, true) => "distance",
            _ => "duration,distance",
        }
    }
}
