//! Collaborator doubles shared by the unit tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::db::Store;
use crate::entities::{PathGeometry, Point, Route, RouteFilter, TileCoordinate, Waypoint};
use crate::error::{database_error, invalid_input_error, upstream_error, Error};
use crate::external::{RouteService, RoutingService, TileService};

pub struct FailingStore;

#[async_trait]
impl Store for FailingStore {
    async fn get(&self, _: &str) -> Result<Option<Vec<u8>>, Error> {
        Err(database_error("unavailable"))
    }

    async fn put(&self, _: &str, _: Vec<u8>) -> Result<(), Error> {
        Err(database_error("quota exceeded"))
    }

    async fn count(&self) -> Result<u64, Error> {
        Err(database_error("unavailable"))
    }
}

/// Routing double: answers with a detour through each leg's midpoint until
/// `fail_after` calls have been served, then fails. A collapsing double
/// answers with the first requested point only.
pub struct MockRouting {
    calls: AtomicUsize,
    fail_after: usize,
    collapse: bool,
    requests: Mutex<Vec<Vec<Point>>>,
}

impl MockRouting {
    pub fn working() -> Self {
        Self::failing_after(usize::MAX)
    }

    pub fn failing() -> Self {
        Self::failing_after(0)
    }

    pub fn failing_after(fail_after: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_after,
            collapse: false,
            requests: Mutex::new(vec![]),
        }
    }

    pub fn collapsing() -> Self {
        Self {
            collapse: true,
            ..Self::working()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<Vec<Point>> {
        self.requests.lock().unwrap().clone()
    }

    pub fn detour(points: &[Point]) -> PathGeometry {
        let mut path = vec![points[0]];

        for leg in points.windows(2) {
            path.push(Point::new(
                (leg[0].latitude + leg[1].latitude) / 2.0,
                (leg[0].longitude + leg[1].longitude) / 2.0,
            ));
            path.push(leg[1]);
        }

        PathGeometry::new(path)
    }
}

#[async_trait]
impl RoutingService for MockRouting {
    async fn route(&self, points: &[Point]) -> Result<PathGeometry, Error> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(points.to_vec());

        if call >= self.fail_after || points.len() < 2 {
            return Err(upstream_error());
        }

        if self.collapse {
            return Ok(PathGeometry::new(vec![points[0]]));
        }

        Ok(Self::detour(points))
    }
}

/// Tile double that fails for a fixed set of tiles.
pub struct MockTiles {
    failing: HashSet<TileCoordinate>,
    fetched: Mutex<Vec<TileCoordinate>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockTiles {
    pub fn new(failing: impl IntoIterator<Item = TileCoordinate>) -> Self {
        Self {
            failing: failing.into_iter().collect(),
            fetched: Mutex::new(vec![]),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn fetched(&self) -> Vec<TileCoordinate> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TileService for MockTiles {
    async fn fetch_tile(&self, tile: TileCoordinate) -> Result<Vec<u8>, Error> {
        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);

        // let the rest of the batch start before settling
        tokio::task::yield_now().await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.fetched.lock().unwrap().push(tile);

        if self.failing.contains(&tile) {
            return Err(upstream_error());
        }

        Ok(tile.key().into_bytes())
    }
}

pub struct MockRoutes {
    routes: Vec<Route>,
}

impl MockRoutes {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }
}

#[async_trait]
impl RouteService for MockRoutes {
    async fn find_routes(&self, _: &RouteFilter) -> Result<Vec<Route>, Error> {
        Ok(self.routes.clone())
    }

    async fn find_route(&self, id: &str) -> Result<Route, Error> {
        self.routes
            .iter()
            .find(|route| route.id == id)
            .cloned()
            .ok_or_else(invalid_input_error)
    }
}

pub fn route(id: &str, points: &[(f64, f64)]) -> Route {
    Route::new(
        id,
        format!("route {}", id),
        points
            .iter()
            .map(|(latitude, longitude)| Waypoint::from(Point::new(*latitude, *longitude)))
            .collect(),
    )
}
