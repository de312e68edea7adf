//! Run planned table requests concurrently under an admission bound.
//!
//! Every [`TableRequest`] gets its own Tokio task. A task waits for a slot
//! on a shared semaphore, fetches its path through the [`CachedFetcher`],
//! decodes the table and reports either a [`BlockResult`] or an error on a
//! channel sized to the batch, so no task ever blocks on reporting. The
//! caller drains exactly one report per request. Any failure fails the
//! batch; there is no partially filled table.

use std::fmt;
use std::sync::Arc;

use routeweave_core::Matrix;
use tokio::sync::{Semaphore, mpsc};
use tokio_util::sync::CancellationToken;

use crate::plan::TableRequest;
use crate::response::TableResponse;
use crate::{OsrmError, ResponseCache, Transport};

/// Single-request primitive: cache lookup, transport call, cache store.
#[derive(Clone)]
pub struct CachedFetcher {
    transport: Arc<dyn Transport>,
    cache: Option<Arc<ResponseCache>>,
}

impl fmt::Debug for CachedFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedFetcher")
            .field("transport", &"<dyn Transport>")
            .field("cache", &self.cache)
            .finish()
    }
}

impl CachedFetcher {
    /// Wrap `transport`, consulting `cache` when one is supplied.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, cache: Option<Arc<ResponseCache>>) -> Self {
        Self { transport, cache }
    }

    /// The cache consulted by this fetcher, if any.
    #[must_use]
    pub fn cache(&self) -> Option<&ResponseCache> {
        self.cache.as_deref()
    }

    /// Fetch `path`, serving repeated paths from the cache.
    ///
    /// # Errors
    ///
    /// Returns [`OsrmError::BackendUserInput`] when the server rejects the
    /// request with HTTP 400 and [`OsrmError::BackendService`] for any other
    /// transport failure.
    pub async fn get(&self, path: &str) -> Result<Arc<[u8]>, OsrmError> {
        let Some(cache) = &self.cache else {
            return Ok(self.transport.get(path).await?);
        };

        let key = ResponseCache::key_for(path);
        if let Some(body) = cache.get(&key) {
            log::debug!("cache hit for {key}");
            return Ok(body);
        }
        log::debug!("cache miss for {key}");

        let body = self.transport.get(path).await?;
        cache.put(key, Arc::clone(&body));
        Ok(body)
    }
}

/// Decoded answer to one planned table request.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockResult {
    /// Index of the block supplying the sources.
    pub row: usize,
    /// Index of the block supplying the destinations.
    pub column: usize,
    /// Status code reported by the server.
    pub code: String,
    /// Message reported alongside the status code.
    pub message: Option<String>,
    /// Distance sub-matrix, when requested.
    pub distances: Option<Matrix>,
    /// Duration sub-matrix, when requested.
    pub durations: Option<Matrix>,
}

impl BlockResult {
    /// Validate `response` and stamp it with its block coordinates.
    ///
    /// Unreachable (`null`) cells become `f64::INFINITY`.
    ///
    /// # Errors
    ///
    /// Returns [`OsrmError::BackendStatus`] when the response code is not
    /// `"Ok"`.
    pub fn from_response(
        row: usize,
        column: usize,
        response: TableResponse,
    ) -> Result<Self, OsrmError> {
        if !response.is_ok() {
            return Err(OsrmError::BackendStatus {
                code: response.code,
                message: response.message.unwrap_or_default(),
            });
        }
        Ok(Self {
            row,
            column,
            code: response.code,
            message: response.message,
            distances: response.distances.map(fill_unreachable),
            durations: response.durations.map(fill_unreachable),
        })
    }
}

fn fill_unreachable(rows: Vec<Vec<Option<f64>>>) -> Matrix {
    rows.into_iter()
        .map(|row| {
            row.into_iter()
                .map(|cell| cell.unwrap_or(f64::INFINITY))
                .collect()
        })
        .collect()
}

/// Execute `requests` with at most `parallel_runs` in flight.
///
/// Results come back in completion order; stitching sorts them.
///
/// # Errors
///
/// Returns the aggregate of every failed request (see
/// [`OsrmError::is_input_error`] for how mixed batches are classified), or
/// [`OsrmError::Cancelled`] if `cancellation` fired first.
pub async fn execute(
    requests: Vec<TableRequest>,
    fetcher: &CachedFetcher,
    parallel_runs: usize,
    cancellation: Option<&CancellationToken>,
) -> Result<Vec<BlockResult>, OsrmError> {
    let total = requests.len();
    let (tx, mut rx) = mpsc::channel(total.max(1));
    let guard = Arc::new(Semaphore::new(
        parallel_runs.clamp(1, Semaphore::MAX_PERMITS),
    ));
    let cancellation = cancellation.cloned().unwrap_or_default();

    for request in requests {
        let tx = tx.clone();
        let guard = Arc::clone(&guard);
        let fetcher = fetcher.clone();
        let cancellation = cancellation.clone();
        tokio::spawn(async move {
            let outcome = run_request(&request, &fetcher, &guard, &cancellation).await;
            if tx.send(outcome).await.is_err() {
                log::debug!(
                    "table block ({}, {}) finished after its batch was dropped",
                    request.row,
                    request.column
                );
            }
        });
    }
    drop(tx);

    let mut results = Vec::with_capacity(total);
    let mut errors = Vec::new();
    for _ in 0..total {
        match rx.recv().await {
            Some(Ok(block)) => results.push(block),
            Some(Err(err)) => errors.push(err),
            None => {
                errors.push(OsrmError::BackendService {
                    message: "table task exited without reporting".to_owned(),
                });
                break;
            }
        }
    }

    if errors.is_empty() {
        return Ok(results);
    }
    log::warn!("{} of {total} table requests failed", errors.len());
    Err(OsrmError::aggregate(errors).unwrap_or(OsrmError::Cancelled))
}

async fn run_request(
    request: &TableRequest,
    fetcher: &CachedFetcher,
    guard: &Semaphore,
    cancellation: &CancellationToken,
) -> Result<BlockResult, OsrmError> {
    let _permit = tokio::select! {
        permit = guard.acquire() => permit.map_err(|_| OsrmError::Cancelled)?,
        () = cancellation.cancelled() => return Err(OsrmError::Cancelled),
    };
    let body = tokio::select! {
        body = fetcher.get(&request.path) => body?,
        () = cancellation.cancelled() => return Err(OsrmError::Cancelled),
    };
    let response: TableResponse = serde_json::from_slice(&body).map_err(OsrmError::decode)?;
    let block = BlockResult::from_response(request.row, request.column, response)?;
    log::debug!("table block ({}, {}) done", request.row, request.column);
    Ok(block)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::test_support::StubTransport;
    use crate::{TransportError, plan};
    use rstest::rstest;

    const OK_BODY: &str = r#"{"code":"Ok","durations":[[0,1],[2,0]],"distances":[[0,3],[4,0]]}"#;

    fn requests(count: usize) -> Vec<TableRequest> {
        (0..count)
            .map(|i| TableRequest {
                row: i,
                column: 0,
                path: format!("/table/v1/driving/{i}"),
            })
            .collect()
    }

    #[rstest]
    fn block_result_fills_unreachable_cells() {
        let response = TableResponse {
            code: "Ok".to_owned(),
            message: None,
            distances: None,
            durations: Some(vec![vec![Some(0.0), None], vec![Some(5.0), Some(0.0)]]),
        };

        let block = BlockResult::from_response(1, 2, response).expect("ok response");

        assert_eq!((block.row, block.column), (1, 2));
        assert_eq!(block.distances, None);
        assert_eq!(
            block.durations,
            Some(vec![vec![0.0, f64::INFINITY], vec![5.0, 0.0]])
        );
    }

    #[rstest]
    fn block_result_rejects_non_ok_code() {
        let response = TableResponse {
            code: "NoTable".to_owned(),
            message: Some("no route".to_owned()),
            distances: None,
            durations: None,
        };

        let err = BlockResult::from_response(0, 0, response).expect_err("should fail");

        assert_eq!(
            err,
            OsrmError::BackendStatus {
                code: "NoTable".to_owned(),
                message: "no route".to_owned()
            }
        );
        assert!(!err.is_input_error());
    }

    #[tokio::test]
    async fn collects_one_result_per_request() {
        let transport = Arc::new(StubTransport::with_body(OK_BODY));
        let fetcher = CachedFetcher::new(transport.clone(), None);

        let results = execute(requests(5), &fetcher, 2, None)
            .await
            .expect("batch should succeed");

        assert_eq!(results.len(), 5);
        assert_eq!(transport.calls(), 5);
        let mut rows: Vec<usize> = results.iter().map(|r| r.row).collect();
        rows.sort_unstable();
        assert_eq!(rows, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn never_exceeds_the_admission_bound() {
        let transport =
            Arc::new(StubTransport::with_body(OK_BODY).with_delay(Duration::from_millis(20)));
        let fetcher = CachedFetcher::new(transport.clone(), None);

        execute(requests(12), &fetcher, 3, None)
            .await
            .expect("batch should succeed");

        assert_eq!(transport.calls(), 12);
        assert!(transport.max_in_flight() <= 3, "saw {}", transport.max_in_flight());
        assert!(transport.max_in_flight() >= 1);
    }

    #[tokio::test]
    async fn oversized_parallelism_is_clamped() {
        let transport = Arc::new(StubTransport::with_body(OK_BODY));
        let fetcher = CachedFetcher::new(transport.clone(), None);

        let results = execute(requests(3), &fetcher, usize::MAX, None)
            .await
            .expect("batch should succeed");

        assert_eq!(results.len(), 3);
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn any_failure_fails_the_batch() {
        let transport = Arc::new(StubTransport::with_responder(|path| {
            if path.ends_with("/2") {
                Err(TransportError::Http {
                    url: path.to_owned(),
                    status: 400,
                    body: "bad coordinate".to_owned(),
                })
            } else {
                Ok(OK_BODY.as_bytes().to_vec())
            }
        }));
        let fetcher = CachedFetcher::new(transport, None);

        let err = execute(requests(4), &fetcher, 16, None)
            .await
            .expect_err("batch should fail");

        assert_eq!(
            err,
            OsrmError::BackendUserInput {
                message: "bad coordinate".to_owned()
            }
        );
    }

    #[tokio::test]
    async fn mixed_failures_prefer_user_input() {
        let transport = Arc::new(StubTransport::with_responder(|path| {
            let status = if path.ends_with("/0") { 400 } else { 503 };
            Err(TransportError::Http {
                url: path.to_owned(),
                status,
                body: format!("failure for {path}"),
            })
        }));
        let fetcher = CachedFetcher::new(transport, None);

        let err = execute(requests(3), &fetcher, 16, None)
            .await
            .expect_err("batch should fail");

        assert!(err.is_input_error());
        let text = err.to_string();
        for i in 0..3 {
            assert!(text.contains(&format!("/table/v1/driving/{i}")), "{text}");
        }
    }

    #[tokio::test]
    async fn malformed_json_is_a_decode_error() {
        let transport = Arc::new(StubTransport::with_body("not json"));
        let fetcher = CachedFetcher::new(transport, None);

        let err = execute(requests(1), &fetcher, 16, None)
            .await
            .expect_err("batch should fail");

        assert!(matches!(err, OsrmError::Decode { .. }));
    }

    #[tokio::test]
    async fn cancelled_batches_report_cancellation() {
        let transport =
            Arc::new(StubTransport::with_body(OK_BODY).with_delay(Duration::from_secs(30)));
        let fetcher = CachedFetcher::new(transport, None);
        let token = CancellationToken::new();
        token.cancel();

        let err = execute(requests(3), &fetcher, 1, Some(&token))
            .await
            .expect_err("batch should be cancelled");

        assert_eq!(err, OsrmError::Cancelled);
    }

    #[tokio::test]
    async fn fetcher_serves_repeats_from_cache() {
        let transport = Arc::new(StubTransport::with_body(OK_BODY));
        let cache = ResponseCache::with_capacity(8).map(Arc::new);
        let fetcher = CachedFetcher::new(transport.clone(), cache);

        for _ in 0..3 {
            let body = fetcher.get("/table/v1/driving/1,1").await.expect("fetch");
            assert_eq!(&*body, OK_BODY.as_bytes());
        }

        assert_eq!(transport.calls(), 1);
        assert_eq!(fetcher.cache().map(ResponseCache::len), Some(1));
    }

    #[tokio::test]
    async fn fetcher_without_cache_always_calls_transport() {
        let transport = Arc::new(StubTransport::with_body(OK_BODY));
        let fetcher = CachedFetcher::new(transport.clone(), None);

        for _ in 0..3 {
            fetcher.get("/table/v1/driving/1,1").await.expect("fetch");
        }

        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn failed_fetches_are_not_cached() {
        let transport = Arc::new(StubTransport::with_error(TransportError::Network {
            url: "http://x".to_owned(),
            message: "refused".to_owned(),
        }));
        let cache = ResponseCache::with_capacity(8).map(Arc::new);
        let fetcher = CachedFetcher::new(transport.clone(), cache);

        for _ in 0..2 {
            assert!(fetcher.get("/route/v1/driving/1,1").await.is_err());
        }

        assert_eq!(transport.calls(), 2);
        assert_eq!(fetcher.cache().map(ResponseCache::is_empty), Some(true));
    }

    #[rstest]
    fn planned_paths_are_unique_per_block() {
        let points = routeweave_core::test_support::grid_points(5);
        let config = crate::ClientConfig::default().with_max_table_size(2);
        let planned = plan::plan_table_requests(&points, &config, &crate::TableOptions::default())
            .expect("plan");
        let mut paths: Vec<&str> = planned.iter().map(|r| r.path.as_str()).collect();
        paths.sort_unstable();
        paths.dedup();
        assert_eq!(paths.len(), planned.len());
    }
}
