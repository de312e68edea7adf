//! Split table queries into blocks that respect the server's size cap.
//!
//! OSRM refuses table requests with more coordinates than its
//! `--max-table-size`. The planner cuts the points into blocks of at most
//! that size and issues one request per ordered pair of blocks, each
//! request listing the row block's points as `sources` and the column
//! block's points as `destinations`. For `n` points and blocks of `b`
//! points this yields `⌈n/b⌉²` requests.
//!
//! Query strings are assembled by hand: OSRM rejects percent-escaped
//! separators, so coordinates and index lists keep their literal `;` and `,`.

use geo::Coord;
use routeweave_core::Point;

use crate::{ClientConfig, OsrmError, TableOptions};

/// Coordinate sent in place of a missing point.
///
/// It lies in the Pacific, far from any road, so index alignment with
/// `sources`/`destinations` is kept while the cell never routes.
pub const UNROUTABLE_POINT: Coord<f64> = Coord {
    x: -143.292_892,
    y: 37.683_603,
};

/// OSRM services used by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Distance and duration matrices.
    Table,
    /// Routes with geometry.
    Route,
}

impl Endpoint {
    /// Path segment naming the service.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Route => "route",
        }
    }
}

/// One planned table request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRequest {
    /// Index of the block supplying the sources.
    pub row: usize,
    /// Index of the block supplying the destinations.
    pub column: usize,
    /// Request path and query, relative to the server root.
    pub path: String,
}

/// Build the path `/{endpoint}/v1/driving/{lon,lat;...}`.
#[must_use]
pub fn endpoint_path(endpoint: Endpoint, points: &[Point]) -> String {
    format!(
        "/{}/v1/driving/{}",
        endpoint.as_str(),
        points_parameter(points)
    )
}

/// Path of a route query returning a simplified overview and step geometry.
#[must_use]
pub fn route_path(points: &[Point]) -> String {
    let mut path = endpoint_path(Endpoint::Route, points);
    path.push_str("?overview=simplified&steps=true&annotations=false&continue_straight=false");
    path
}

/// Plan the blocked table requests covering every pair of `points`.
///
/// # Errors
///
/// Returns [`OsrmError::Configuration`] when `points` is empty or the
/// configured block size is zero.
pub fn plan_table_requests(
    points: &[Point],
    config: &ClientConfig,
    options: &TableOptions,
) -> Result<Vec<TableRequest>, OsrmError> {
    if points.is_empty() {
        return Err(OsrmError::configuration(
            "cannot plan table requests for empty points",
        ));
    }
    if config.max_table_size == 0 {
        return Err(OsrmError::configuration("max table size must be > 0"));
    }

    let blocks: Vec<&[Point]> = points.chunks(config.max_table_size).collect();
    let mut requests = Vec::with_capacity(blocks.len().saturating_mul(blocks.len()));
    for (row, sources) in blocks.iter().enumerate() {
        for (column, destinations) in blocks.iter().enumerate() {
            requests.push(TableRequest {
                row,
                column,
                path: block_path(sources, destinations, config, options),
            });
        }
    }

    log::debug!(
        "planned {} table requests for {} points in blocks of {}",
        requests.len(),
        points.len(),
        config.max_table_size
    );
    Ok(requests)
}

fn block_path(
    sources: &[Point],
    destinations: &[Point],
    config: &ClientConfig,
    options: &TableOptions,
) -> String {
    let combined: Vec<Point> = sources.iter().chain(destinations).copied().collect();
    let count = combined.len();

    let mut path = endpoint_path(Endpoint::Table, &combined);
    path.push_str("?annotations=");
    path.push_str(options.annotations());

    if options.approach_curb {
        path.push_str("&approaches=");
        path.push_str(&vec!["curb"; count].join(";"));
    }

    if !options.exclude.is_empty() {
        path.push_str("&exclude=");
        path.push_str(&options.exclude.join(","));
    }

    // Only affects durations.
    if (config.scale_factor - 1.0).abs() > f64::EPSILON {
        path.push_str(&format!("&scale_factor={:.6}", config.scale_factor));
    }

    if config.snap_radius > 0 {
        path.push_str("&radiuses=");
        path.push_str(&vec![config.snap_radius.to_string(); count].join(";"));
    }

    path.push_str("&sources=");
    path.push_str(&index_list(0..sources.len()));
    path.push_str("&destinations=");
    path.push_str(&index_list(sources.len()..count));
    path
}

fn index_list(indices: std::ops::Range<usize>) -> String {
    indices
        .map(|index| index.to_string())
        .collect::<Vec<_>>()
        .join(";")
}

/// Semicolon-separated `lon,lat` pairs with missing points replaced by
/// [`UNROUTABLE_POINT`].
fn points_parameter(points: &[Point]) -> String {
    points
        .iter()
        .map(|point| {
            let coord = point.location.unwrap_or(UNROUTABLE_POINT);
            format!("{:.6},{:.6}", coord.x, coord.y)
        })
        .collect::<Vec<_>>()
        .join(";")
}
