//! Route geometry: the overview polyline plus one polyline per leg.
//!
//! OSRM returns a geometry per step; a leg's polyline is the decoded step
//! coordinates concatenated in step order and re-encoded with the same
//! precision.

use geo::Coord;
use routeweave_core::{Point, RoutePolylines};

use crate::plan::route_path;
use crate::response::RouteResponse;
use crate::{CachedFetcher, OsrmError};

/// Precision of OSRM's default `polyline` geometry encoding.
pub const POLYLINE_PRECISION: u32 = 5;

/// Fetch the route through `points` and assemble its polylines.
pub(crate) async fn fetch_polylines(
    fetcher: &CachedFetcher,
    points: &[Point],
) -> Result<RoutePolylines, OsrmError> {
    if points.is_empty() {
        return Err(OsrmError::EmptyInput);
    }
    let body = fetcher.get(&route_path(points)).await?;
    let response: RouteResponse = serde_json::from_slice(&body).map_err(OsrmError::decode)?;
    assemble_polylines(response, points.len().saturating_sub(1))
}

/// Build [`RoutePolylines`] from the first route of `response`.
///
/// The result always carries `leg_count` leg polylines; legs beyond
/// `leg_count` are ignored and missing legs encode as empty strings.
///
/// # Errors
///
/// Returns [`OsrmError::BackendStatus`] for a non-`"Ok"` code,
/// [`OsrmError::MissingRoute`] when no route is present and
/// [`OsrmError::Decode`] when a step geometry is not a valid polyline.
pub fn assemble_polylines(
    response: RouteResponse,
    leg_count: usize,
) -> Result<RoutePolylines, OsrmError> {
    if !response.is_ok() {
        return Err(OsrmError::BackendStatus {
            code: response.code,
            message: response.message.unwrap_or_default(),
        });
    }
    // The first route is the requested one; the rest are alternatives.
    let route = response
        .routes
        .into_iter()
        .next()
        .ok_or(OsrmError::MissingRoute)?;

    let mut traces: Vec<Vec<Coord<f64>>> = vec![Vec::new(); leg_count];
    for (trace, leg) in traces.iter_mut().zip(&route.legs) {
        for step in &leg.steps {
            let line = polyline::decode_polyline(&step.geometry, POLYLINE_PRECISION)
                .map_err(OsrmError::decode)?;
            trace.extend(line.0);
        }
    }

    let legs = traces
        .into_iter()
        .map(|trace| {
            polyline::encode_coordinates(trace, POLYLINE_PRECISION).map_err(OsrmError::decode)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RoutePolylines {
        full: route.geometry,
        legs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::{Leg, Route, Step};
    use crate::test_support::route_response_ok;
    use rstest::rstest;

    #[rstest]
    fn keeps_overview_and_builds_one_polyline_per_leg() {
        let response = route_response_ok();
        let full = response.routes[0].geometry.clone();

        let polylines = assemble_polylines(response, 1).expect("should assemble");

        assert_eq!(polylines.full, full);
        assert_eq!(polylines.legs.len(), 1);
        assert!(polylines.legs[0].starts_with("mfp_I__vpA"));
    }

    #[rstest]
    fn leg_trace_concatenates_steps_in_order() {
        let response = route_response_ok();
        let expected: usize = response.routes[0].legs[0]
            .steps
            .iter()
            .map(|step| {
                polyline::decode_polyline(&step.geometry, POLYLINE_PRECISION)
                    .expect("fixture geometry decodes")
                    .0
                    .len()
            })
            .sum();

        let polylines = assemble_polylines(response, 1).expect("should assemble");
        let leg = polyline::decode_polyline(&polylines.legs[0], POLYLINE_PRECISION)
            .expect("leg decodes");

        assert_eq!(leg.0.len(), expected);
    }

    #[rstest]
    fn missing_legs_are_empty() {
        let polylines = assemble_polylines(route_response_ok(), 3).expect("should assemble");
        assert_eq!(polylines.legs.len(), 3);
        assert!(polylines.legs[1].is_empty());
        assert!(polylines.legs[2].is_empty());
    }

    #[rstest]
    fn non_ok_code_is_a_status_error() {
        let response = RouteResponse {
            code: "NoRoute".to_owned(),
            message: Some("Impossible route".to_owned()),
            routes: Vec::new(),
        };

        let err = assemble_polylines(response, 1).expect_err("should fail");

        assert_eq!(
            err,
            OsrmError::BackendStatus {
                code: "NoRoute".to_owned(),
                message: "Impossible route".to_owned()
            }
        );
    }

    #[rstest]
    fn ok_without_routes_is_missing_route() {
        let response = RouteResponse {
            code: "Ok".to_owned(),
            ..RouteResponse::default()
        };
        assert_eq!(
            assemble_polylines(response, 1),
            Err(OsrmError::MissingRoute)
        );
    }

    #[rstest]
    fn malformed_step_geometry_is_a_decode_error() {
        let response = RouteResponse {
            code: "Ok".to_owned(),
            message: None,
            routes: vec![Route {
                geometry: "mfp_I__vpA".to_owned(),
                legs: vec![Leg {
                    steps: vec![Step {
                        geometry: "\u{1}\u{2}".to_owned(),
                    }],
                }],
            }],
        };

        let err = assemble_polylines(response, 1).expect_err("should fail");

        assert!(matches!(err, OsrmError::Decode { .. }));
    }
}
