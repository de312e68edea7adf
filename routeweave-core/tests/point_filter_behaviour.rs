//! Behavioural tests for [`deflate`] and [`inflate`].

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use routeweave_core::{IndexMap, Matrix, Point, deflate, inflate};
use std::cell::RefCell;

/// Outcome of a deflate/inflate round trip.
#[derive(Debug, Default)]
struct RoundTrip {
    indices: IndexMap,
    reduced: Matrix,
    full: Matrix,
}

#[fixture]
fn points() -> RefCell<Vec<Point>> {
    RefCell::new(Vec::new())
}

#[fixture]
fn round_trip() -> RefCell<RoundTrip> {
    RefCell::new(RoundTrip::default())
}

/// Reduced matrix where cell `(i, j)` is `10 * (i + 1) + (j + 1)`.
fn reduced_matrix(size: usize) -> Matrix {
    (1..=size)
        .map(|i| (1..=size).map(|j| (10 * i + j) as f64).collect())
        .collect()
}

// --- Given steps ---

#[given("points with a missing point and an origin point")]
fn mixed_points(#[from(points)] points: &RefCell<Vec<Point>>) {
    *points.borrow_mut() = vec![
        Point::new(13.38, 52.51),
        Point::missing(),
        Point::new(13.39, 52.52),
        Point::new(0.0, 0.0),
        Point::new(13.40, 52.53),
    ];
}

#[given("points that are all empty")]
fn empty_points(#[from(points)] points: &RefCell<Vec<Point>>) {
    *points.borrow_mut() = vec![Point::missing(), Point::new(0.0, 0.0), Point::missing()];
}

#[given("points that are all routable")]
fn routable_points(#[from(points)] points: &RefCell<Vec<Point>>) {
    *points.borrow_mut() = vec![Point::new(1.0, 1.0), Point::new(2.0, 2.0)];
}

// --- When steps ---

#[when("the points are deflated and the reduced matrix is inflated")]
fn deflate_and_inflate(
    #[from(points)] points: &RefCell<Vec<Point>>,
    #[from(round_trip)] round_trip: &RefCell<RoundTrip>,
) {
    let points = points.borrow();
    let (kept, indices) = deflate(&points);
    let reduced = reduced_matrix(kept.len());
    let full = inflate(&reduced, &indices, points.len());
    *round_trip.borrow_mut() = RoundTrip {
        indices,
        reduced,
        full,
    };
}

// --- Then steps ---

#[then("the full matrix has zero rows and columns at the removed points")]
fn removed_are_zero(#[from(round_trip)] round_trip: &RefCell<RoundTrip>) {
    let round_trip = round_trip.borrow();
    assert_eq!(round_trip.indices, vec![0, 2, 4]);
    assert_eq!(round_trip.full.len(), 5, "full matrix keeps original size");
    for removed in [1, 3] {
        assert!(round_trip.full[removed].iter().all(|&v| v == 0.0));
        assert!(round_trip.full.iter().all(|row| row[removed] == 0.0));
    }
}

#[then("the surviving cells keep their reduced values")]
fn survivors_keep_values(#[from(round_trip)] round_trip: &RefCell<RoundTrip>) {
    let round_trip = round_trip.borrow();
    for (i, &oi) in round_trip.indices.iter().enumerate() {
        for (j, &oj) in round_trip.indices.iter().enumerate() {
            assert_eq!(round_trip.full[oi][oj], round_trip.reduced[i][j]);
        }
    }
}

#[then("no points survive deflation")]
fn none_survive(#[from(round_trip)] round_trip: &RefCell<RoundTrip>) {
    assert!(round_trip.borrow().indices.is_empty());
}

#[then("the full matrix is entirely zero")]
fn all_zero(#[from(round_trip)] round_trip: &RefCell<RoundTrip>) {
    let round_trip = round_trip.borrow();
    assert_eq!(round_trip.full, vec![vec![0.0; 3]; 3]);
}

#[then("every point survives deflation")]
fn all_survive(#[from(round_trip)] round_trip: &RefCell<RoundTrip>) {
    assert_eq!(round_trip.borrow().indices, vec![0, 1]);
}

// --- Scenario registrations ---

macro_rules! register_scenario {
    ($fn_name:ident, $title:literal) => {
        #[scenario(path = "tests/features/point_filter.feature", name = $title)]
        fn $fn_name(points: RefCell<Vec<Point>>, round_trip: RefCell<RoundTrip>) {
            let _ = (points, round_trip);
        }
    };
}

register_scenario!(
    restoring_removed_points,
    "restoring removed points as zero rows and columns"
);
register_scenario!(deflating_only_empty_points, "deflating only empty points");
register_scenario!(deflating_only_valid_points, "deflating only valid points");
