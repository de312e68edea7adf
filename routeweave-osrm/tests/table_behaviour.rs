//! Behavioural tests for blocked table queries.

use std::cell::RefCell;
use std::sync::Arc;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use routeweave_core::test_support::{grid_points, indexed_matrix};
use routeweave_core::{Matrix, Point, TableMatrices};
use routeweave_osrm::test_support::{StubTransport, TABLE_RESPONSE_OK};
use routeweave_osrm::{
    BlockingOsrmClient, ClientConfig, OsrmError, TableOptions, TransportError,
};

/// World state for table scenarios.
#[derive(Debug, Default)]
struct TableWorld {
    transport: RefCell<Option<Arc<StubTransport>>>,
    points: RefCell<Vec<Point>>,
    server_matrix: RefCell<Matrix>,
    config: RefCell<ClientConfig>,
    outcome: RefCell<Option<Result<TableMatrices, OsrmError>>>,
}

impl TableWorld {
    fn transport(&self) -> Arc<StubTransport> {
        self.transport
            .borrow()
            .clone()
            .expect("a routing server should be configured")
    }

    fn durations(&self) -> Matrix {
        let outcome = self.outcome.borrow();
        let matrices = outcome
            .as_ref()
            .expect("a query should have run")
            .as_ref()
            .expect("the query should succeed");
        matrices
            .durations
            .clone()
            .expect("durations were requested")
            .into_rows()
    }

    fn error(&self) -> OsrmError {
        self.outcome
            .borrow()
            .clone()
            .expect("a query should have run")
            .expect_err("the query should fail")
    }
}

#[fixture]
fn world() -> TableWorld {
    TableWorld::default()
}

// --- Given steps ---

#[given("a routing server answering with the two-point table")]
fn two_point_server(world: &TableWorld) {
    world
        .transport
        .replace(Some(Arc::new(StubTransport::with_body(TABLE_RESPONSE_OK))));
    world
        .points
        .replace(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]);
}

#[given("a routing server holding a {count} point matrix")]
fn matrix_server(world: &TableWorld, count: usize) {
    let points = grid_points(count);
    let matrix = indexed_matrix(count);
    world
        .transport
        .replace(Some(Arc::new(StubTransport::serving_table(
            points.clone(),
            matrix.clone(),
            matrix.clone(),
        ))));
    world.points.replace(points);
    world.server_matrix.replace(matrix);
}

#[given("a routing server failing with status {status}")]
fn failing_server(world: &TableWorld, status: u16) {
    let error = TransportError::Http {
        url: "http://osrm.test/table".to_owned(),
        status,
        body: format!("{{\"code\":\"Error{status}\"}}"),
    };
    world
        .transport
        .replace(Some(Arc::new(StubTransport::with_error(error))));
    world
        .points
        .replace(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]);
}

#[given("a client with caching enabled")]
fn caching_client(world: &TableWorld) {
    world.config.replace(ClientConfig::default().with_cache(100));
}

#[given("a client with caching disabled")]
fn uncached_client(world: &TableWorld) {
    world.config.replace(ClientConfig::default().with_cache(0));
}

#[given("a client with blocks of {size} points")]
fn blocked_client(world: &TableWorld, size: usize) {
    world
        .config
        .replace(ClientConfig::default().with_max_table_size(size));
}

#[given("a client ignoring empty points")]
fn filtering_client(world: &TableWorld) {
    world
        .config
        .replace(ClientConfig::default().with_ignore_empty(true));
}

#[given("a missing point inserted at position {index}")]
fn insert_missing(world: &TableWorld, index: usize) {
    world.points.borrow_mut().insert(index, Point::missing());
}

// --- When steps ---

#[when("the duration matrix is requested {times} times")]
fn request_durations(world: &TableWorld, times: usize) {
    let client = BlockingOsrmClient::with_transport(world.config.borrow().clone(), world.transport())
        .expect("client should build");
    let points = world.points.borrow();
    let options = TableOptions::default().with_duration();
    for _ in 0..times {
        world.outcome.replace(Some(client.table(&points, &options)));
    }
}

// --- Then steps ---

#[then("the server receives {count} requests")]
fn server_receives(world: &TableWorld, count: usize) {
    assert_eq!(world.transport().calls(), count);
}

#[then("the duration from point {from} to point {to} is {expected}")]
fn duration_is(world: &TableWorld, from: usize, to: usize, expected: f64) {
    let durations = world.durations();
    let actual = durations
        .get(from)
        .and_then(|row| row.get(to))
        .copied()
        .expect("cell should exist");
    assert!((actual - expected).abs() < 1e-9, "got {actual}");
}

#[then("the duration matrix equals the server matrix")]
fn matches_server(world: &TableWorld) {
    assert_eq!(world.durations(), *world.server_matrix.borrow());
}

#[then("row {index} of the duration matrix is zero")]
fn zero_row(world: &TableWorld, index: usize) {
    let durations = world.durations();
    assert_eq!(durations.len(), world.points.borrow().len());
    let row = durations.get(index).expect("row should exist");
    assert!(row.iter().all(|&cell| cell == 0.0));
    assert!(durations
        .iter()
        .all(|row| row.get(index).copied() == Some(0.0)));
}

#[then("the query fails with a user input error")]
fn fails_with_input_error(world: &TableWorld) {
    let error = world.error();
    assert!(error.is_input_error(), "got {error}");
}

#[then("the query fails with a service error")]
fn fails_with_service_error(world: &TableWorld) {
    let error = world.error();
    assert!(matches!(error, OsrmError::BackendService { .. }), "got {error}");
}

// --- Scenario registrations ---

macro_rules! register_scenario {
    ($fn_name:ident, $title:literal) => {
        #[scenario(path = "tests/features/table.feature", name = $title)]
        fn $fn_name(world: TableWorld) {
            let _ = world;
        }
    };
}

register_scenario!(cached_repeats, "repeated queries are served from the cache");
register_scenario!(
    uncached_repeats,
    "repeated queries without a cache reach the server"
);
register_scenario!(reading_a_duration, "reading a duration from the server answer");
register_scenario!(splitting_into_blocks, "splitting a table into blocks");
register_scenario!(skipping_empty_points, "skipping empty points");
register_scenario!(rejected_input, "rejected input is recoverable");
register_scenario!(server_failures, "server failures are not recoverable");
