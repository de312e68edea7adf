//! In-process transport double and OSRM response fixtures.
//!
//! Shared by unit tests, behaviour tests and benchmarks; not part of the
//! supported API.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use routeweave_core::{Matrix, Point};
use serde_json::json;

use crate::response::{Leg, Route, RouteResponse, Step};
use crate::{Transport, TransportError};

type Responder = dyn Fn(&str) -> Result<Vec<u8>, TransportError> + Send + Sync;

/// Table body served by a two-point OSRM instance.
pub const TABLE_RESPONSE_OK: &str = r#"{
    "code": "Ok",
    "sources": [
        {"hint": "", "distance": 9.215349, "name": "", "location": [-105.050583, 39.762548]},
        {"hint": "", "distance": 11740767.450958, "name": "Prairie Hill Road", "location": [-104.095128, 38.21453]}
    ],
    "destinations": [
        {"hint": "", "distance": 9.215349, "name": "", "location": [-105.050583, 39.762548]},
        {"hint": "", "distance": 11740767.450958, "name": "Prairie Hill Road", "location": [-104.095128, 38.21453]}
    ],
    "durations": [[0, 17699.1], [17732.3, 0]],
    "distances": [[0, 245976.4], [245938.6, 0]]
}"#;

const ROUTE_GEOMETRY: &str = "mfp_I__vpAqJ`@wUrCa\\dCgGig@{DwW";

const STEP_GEOMETRIES: [&str; 3] = [
    concat!(
        "mfp_I__vpAWBQ@K@[BuBRgBLK@UBMMC?AA",
        "KAe@FyBTC@E?IDKDA@K@]BUBSBA?E@E@A@KFUBK@mA",
        "L{CZQ@qBRUBmAFc@@}@Fu@DG?a@B[@qAF}@JA?[D_",
        "E`@SBO@ODA@UDA?]JC?uBNE?OAKA",
    ),
    concat!(
        "yer_IcuupACa@AI]mCCUE[AK[iCWqB[{Bk",
        "@sE_@_DAICSAOIm@AIQuACOQyAG[Gc@]wBw@aFKu@",
        "y@oFCMAOIm@?K",
    ),
    "}sr_IevwpA",
];

/// Single-leg route through central Berlin, as returned by OSRM.
#[must_use]
pub fn route_response_ok() -> RouteResponse {
    RouteResponse {
        code: "Ok".to_owned(),
        message: None,
        routes: vec![Route {
            geometry: ROUTE_GEOMETRY.to_owned(),
            legs: vec![Leg {
                steps: STEP_GEOMETRIES
                    .iter()
                    .map(|geometry| Step {
                        geometry: (*geometry).to_owned(),
                    })
                    .collect(),
            }],
        }],
    }
}

/// JSON body of [`route_response_ok`].
#[must_use]
pub fn route_body_ok() -> Vec<u8> {
    let response = route_response_ok();
    let routes: Vec<_> = response
        .routes
        .iter()
        .map(|route| {
            let legs: Vec<_> = route
                .legs
                .iter()
                .map(|leg| {
                    let steps: Vec<_> = leg
                        .steps
                        .iter()
                        .map(|step| json!({ "geometry": step.geometry }))
                        .collect();
                    json!({ "steps": steps })
                })
                .collect();
            json!({ "geometry": route.geometry, "legs": legs })
        })
        .collect();
    json!({ "code": response.code, "routes": routes })
        .to_string()
        .into_bytes()
}

/// Scripted [`Transport`] that records every request.
///
/// Tracks how many requests are in flight so tests can check admission
/// bounds. An optional delay keeps requests in flight long enough to
/// overlap.
pub struct StubTransport {
    responder: Arc<Responder>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    paths: Mutex<Vec<String>>,
}

impl fmt::Debug for StubTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StubTransport")
            .field("delay", &self.delay)
            .field("calls", &self.calls)
            .field("max_in_flight", &self.max_in_flight)
            .finish_non_exhaustive()
    }
}

impl StubTransport {
    /// Answer every request with `responder(path)`.
    #[must_use]
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&str) -> Result<Vec<u8>, TransportError> + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(responder),
            delay: None,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            paths: Mutex::new(Vec::new()),
        }
    }

    /// Answer every request with `body`.
    #[must_use]
    pub fn with_body(body: impl AsRef<[u8]>) -> Self {
        let body = body.as_ref().to_vec();
        Self::with_responder(move |_| Ok(body.clone()))
    }

    /// Fail every request with `error`.
    #[must_use]
    pub fn with_error(error: TransportError) -> Self {
        Self::with_responder(move |_| Err(error.clone()))
    }

    /// Serve sub-matrices of the given full matrices for `points`.
    #[must_use]
    pub fn serving_table(points: Vec<Point>, durations: Matrix, distances: Matrix) -> Self {
        let server = TableServer {
            points,
            durations,
            distances,
        };
        Self::with_responder(move |path| server.respond(path))
    }

    /// Hold every request for `delay` before answering.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of requests received.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Paths of every request received, in arrival order.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().clone()
    }

    /// Highest number of requests observed in flight at once.
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn get(&self, path: &str) -> Result<Arc<[u8]>, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.paths.lock().push(path.to_owned());
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let outcome = (self.responder)(path);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome.map(Arc::from)
    }
}

/// Answers table paths from full matrices indexed by point.
struct TableServer {
    points: Vec<Point>,
    durations: Matrix,
    distances: Matrix,
}

impl TableServer {
    fn respond(&self, path: &str) -> Result<Vec<u8>, TransportError> {
        let reject = |body: &str| TransportError::Http {
            url: path.to_owned(),
            status: 400,
            body: body.to_owned(),
        };

        let (resource, query) = path.split_once('?').unwrap_or((path, ""));
        let coordinates = resource
            .strip_prefix("/table/v1/driving/")
            .ok_or_else(|| reject("{\"code\":\"InvalidUrl\"}"))?;
        let global: Vec<usize> = coordinates
            .split(';')
            .map(|pair| self.index_of(pair))
            .collect::<Option<_>>()
            .ok_or_else(|| reject("{\"code\":\"InvalidValue\"}"))?;

        let mut annotations = "duration,distance";
        let mut sources = Vec::new();
        let mut destinations = Vec::new();
        for (key, value) in query.split('&').filter_map(|pair| pair.split_once('=')) {
            match key {
                "annotations" => annotations = value,
                "sources" => sources = parse_indices(value, &global),
                "destinations" => destinations = parse_indices(value, &global),
                _ => {}
            }
        }

        let pick = |matrix: &Matrix| -> Vec<Vec<f64>> {
            sources
                .iter()
                .map(|&row| {
                    destinations
                        .iter()
                        .map(|&col| {
                            matrix
                                .get(row)
                                .and_then(|cells| cells.get(col))
                                .copied()
                                .unwrap_or(f64::INFINITY)
                        })
                        .collect()
                })
                .collect()
        };

        let mut body = json!({ "code": "Ok" });
        if annotations.contains("duration") {
            body["durations"] = json!(pick(&self.durations));
        }
        if annotations.contains("distance") {
            body["distances"] = json!(pick(&self.distances));
        }
        Ok(body.to_string().into_bytes())
    }

    fn index_of(&self, pair: &str) -> Option<usize> {
        self.points.iter().position(|point| {
            point
                .location
                .is_some_and(|coord| format!("{:.6},{:.6}", coord.x, coord.y) == pair)
        })
    }
}

fn parse_indices(value: &str, global: &[usize]) -> Vec<usize> {
    value
        .split(';')
        .filter_map(|index| index.parse::<usize>().ok())
        .filter_map(|index| global.get(index).copied())
        .collect()
}
