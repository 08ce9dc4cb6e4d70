use serde::{Deserialize, Serialize};

use crate::{
    engine::RouteCache,
    entities::{PathGeometry, Point, Route},
    error::{empty_input_error, Error},
    external::DynRouting,
    geo,
};

/// Geometry for a selected route as seen from an optional start point.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPath {
    /// The route line, trimmed to begin at the point nearest the start.
    pub full: PathGeometry,
    /// Walk from the start point to the entry waypoint.
    pub approach: Option<PathGeometry>,
    /// Waypoint where the walker joins the route.
    pub entry_index: Option<usize>,
}

pub struct PathResolver {
    routing: DynRouting,
    cache: RouteCache,
}

impl PathResolver {
    pub fn new(routing: DynRouting, cache: RouteCache) -> Self {
        Self { routing, cache }
    }

    /// Fails only for a route without waypoints; routing and cache
    /// failures degrade to straight lines.
    #[tracing::instrument(skip(self, route), fields(route = %route.id))]
    pub async fn resolve(&self, route: &Route, start: Option<Point>) -> Result<ResolvedPath, Error> {
        if route.waypoints.is_empty() {
            return Err(empty_input_error());
        }

        let waypoints = || route.waypoints.iter().map(|waypoint| waypoint.point);

        let entry_index = match start {
            Some(start) => Some(geo::entry_index(start, waypoints())?),
            None => None,
        };

        let geometry = self.full_geometry(route).await;

        let full = match start {
            Some(start) if geometry.len() >= 2 => {
                let from = geo::entry_index(start, geometry.points().iter().copied())?;
                geometry.slice_from(from)
            }
            _ => geometry,
        };

        let approach = match (start, entry_index) {
            (Some(start), Some(index)) => {
                let entry = route.waypoints[index].point;
                Some(self.approach(start, entry).await)
            }
            _ => None,
        };

        Ok(ResolvedPath {
            full,
            approach,
            entry_index,
        })
    }

    async fn full_geometry(&self, route: &Route) -> PathGeometry {
        let points: Vec<Point> = route.waypoints.iter().map(|w| w.point).collect();

        if points.len() < 2 {
            return PathGeometry::new(points);
        }

        match self.cache.get(&route.id).await {
            Some(geometry) if geometry.len() >= 2 => {
                tracing::debug!("serving path for route {} from cache", route.id);
                return geometry;
            }
            Some(_) => tracing::warn!("ignoring degenerate cached path for route {}", route.id),
            None => {}
        }

        match self.routing.route(&points).await {
            Ok(geometry) if geometry.len() >= 2 => {
                self.cache.put(&route.id, geometry.clone()).await;
                geometry
            }
            Ok(geometry) => {
                tracing::warn!(
                    "routing returned {} points for route {}, using waypoints",
                    geometry.len(),
                    route.id
                );
                PathGeometry::interpolate(&route.waypoints)
            }
            Err(err) => {
                tracing::warn!("routing unavailable for route {}, using waypoints: {}", route.id, err);
                PathGeometry::interpolate(&route.waypoints)
            }
        }
    }

    async fn approach(&self, start: Point, entry: Point) -> PathGeometry {
        match self.routing.route(&[start, entry]).await {
            Ok(geometry) if geometry.len() >= 2 => geometry,
            Ok(_) => PathGeometry::new(vec![start, entry]),
            Err(err) => {
                tracing::debug!("routing unavailable for approach: {}", err);
                PathGeometry::new(vec![start, entry])
            }
        }
    }
}

#[cfg(test)]
fn resolver(routing: std::sync::Arc<crate::testing::MockRouting>) -> PathResolver {
    use crate::db::MemoryStore;
    use std::sync::Arc;

    PathResolver::new(routing, RouteCache::new(Arc::new(MemoryStore::new())))
}

#[test]
fn fallback_geometry_test() {
    use crate::testing::{route, MockRouting};
    use std::sync::Arc;
    use tokio_test::block_on;

    let routing = Arc::new(MockRouting::failing());
    let resolver = resolver(routing.clone());
    let route = route("1", &[(49.80, 24.00), (49.84, 24.03), (49.90, 24.10)]);

    let resolved = block_on(resolver.resolve(&route, None)).unwrap();

    assert_eq!(resolved.full, PathGeometry::interpolate(&route.waypoints));
    assert_eq!(resolved.approach, None);
    assert_eq!(resolved.entry_index, None);
    assert_eq!(routing.calls(), 1);
}

#[test]
fn routed_geometry_is_cached_test() {
    use crate::testing::{route, MockRouting};
    use std::sync::Arc;
    use tokio_test::block_on;

    // the second routing call fails
    let routing = Arc::new(MockRouting::failing_after(1));
    let resolver = resolver(routing.clone());
    let route = route("1", &[(49.80, 24.00), (49.84, 24.03), (49.90, 24.10)]);

    let first = block_on(resolver.resolve(&route, None)).unwrap();
    let second = block_on(resolver.resolve(&route, None)).unwrap();

    assert_eq!(first.full.len(), 5);
    assert_eq!(first, second);
    assert_eq!(routing.calls(), 1);
}

#[test]
fn fallback_geometry_is_not_cached_test() {
    use crate::testing::{route, MockRouting};
    use std::sync::Arc;
    use tokio_test::block_on;

    let routing = Arc::new(MockRouting::failing());
    let resolver = resolver(routing.clone());
    let route = route("1", &[(49.80, 24.00), (49.84, 24.03)]);

    block_on(resolver.resolve(&route, None)).unwrap();
    block_on(resolver.resolve(&route, None)).unwrap();

    assert_eq!(routing.calls(), 2);
}

#[test]
fn entry_index_is_clamped_test() {
    use crate::testing::{route, MockRouting};
    use std::sync::Arc;
    use tokio_test::block_on;

    let routing = Arc::new(MockRouting::failing());
    let resolver = resolver(routing.clone());
    let route = route("1", &[(49.80, 24.00), (49.84, 24.03), (49.90, 24.10)]);
    let start = Point::new(49.91, 24.11);

    let resolved = block_on(resolver.resolve(&route, Some(start))).unwrap();

    assert_eq!(resolved.entry_index, Some(1));
    assert_eq!(resolved.full.points(), &PathGeometry::interpolate(&route.waypoints).points()[1..]);
    assert_eq!(
        resolved.approach,
        Some(PathGeometry::new(vec![start, Point::new(49.84, 24.03)]))
    );
}

#[test]
fn routed_path_is_sliced_from_nearest_point_test() {
    use crate::testing::{route, MockRouting};
    use std::sync::Arc;
    use tokio_test::block_on;

    let routing = Arc::new(MockRouting::working());
    let resolver = resolver(routing.clone());
    let route = route("1", &[(49.80, 24.00), (49.84, 24.03), (49.90, 24.10)]);

    // closest to the midpoint of the first leg
    let start = Point::new(49.821, 24.016);
    let resolved = block_on(resolver.resolve(&route, Some(start))).unwrap();

    let routed = MockRouting::detour(&[
        Point::new(49.80, 24.00),
        Point::new(49.84, 24.03),
        Point::new(49.90, 24.10),
    ]);

    // the second waypoint is the closest one to the start
    assert_eq!(resolved.entry_index, Some(1));
    assert_eq!(resolved.full, routed.slice_from(1));
    assert_eq!(
        resolved.approach,
        Some(MockRouting::detour(&[start, Point::new(49.84, 24.03)]))
    );

    // approach segments are requested but never cached
    let requests = routing.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1], vec![start, Point::new(49.84, 24.03)]);

    block_on(resolver.resolve(&route, Some(start))).unwrap();
    assert_eq!(routing.calls(), 3);
}

#[test]
fn empty_route_test() {
    use crate::testing::{route, MockRouting};
    use std::sync::Arc;
    use tokio_test::block_on;

    let routing = Arc::new(MockRouting::working());
    let resolver = resolver(routing.clone());
    let route = route("1", &[]);

    let err = block_on(resolver.resolve(&route, Some(Point::new(0.0, 0.0)))).unwrap_err();
    assert!(err.is_empty_input());

    let err = block_on(resolver.resolve(&route, None)).unwrap_err();
    assert!(err.is_empty_input());
    assert_eq!(routing.calls(), 0);
}

#[test]
fn single_waypoint_route_test() {
    use crate::testing::{route, MockRouting};
    use std::sync::Arc;
    use tokio_test::block_on;

    let routing = Arc::new(MockRouting::failing());
    let resolver = resolver(routing.clone());
    let route = route("1", &[(49.84, 24.03)]);
    let start = Point::new(49.85, 24.04);

    let resolved = block_on(resolver.resolve(&route, Some(start))).unwrap();

    assert_eq!(resolved.entry_index, Some(0));
    assert_eq!(resolved.full.points(), &[Point::new(49.84, 24.03)]);
    assert_eq!(
        resolved.approach,
        Some(PathGeometry::new(vec![start, Point::new(49.84, 24.03)]))
    );
}

#[test]
fn corrupt_cache_falls_back_to_routing_test() {
    use crate::db::{MemoryStore, Store};
    use crate::testing::{route, MockRouting};
    use std::sync::Arc;
    use tokio_test::block_on;

    let store = Arc::new(MemoryStore::new());
    let routing = Arc::new(MockRouting::working());
    let resolver = PathResolver::new(routing.clone(), RouteCache::new(store.clone()));
    let route = route("9", &[(49.80, 24.00), (49.84, 24.03)]);

    block_on(store.put(&RouteCache::key("9"), vec![0xff, 0x00])).unwrap();

    let resolved = block_on(resolver.resolve(&route, None)).unwrap();

    assert_eq!(resolved.full.len(), 3);
    assert_eq!(routing.calls(), 1);
}

#[test]
fn degenerate_routed_geometry_test() {
    use crate::testing::{route, MockRouting};
    use std::sync::Arc;
    use tokio_test::block_on;

    let routing = Arc::new(MockRouting::collapsing());
    let resolver = resolver(routing.clone());
    let route = route("1", &[(49.80, 24.00), (49.84, 24.03), (49.90, 24.10)]);
    let start = Point::new(49.79, 23.99);

    let resolved = block_on(resolver.resolve(&route, Some(start))).unwrap();

    assert_eq!(resolved.entry_index, Some(0));
    assert_eq!(resolved.full, PathGeometry::interpolate(&route.waypoints));
    assert_eq!(
        resolved.approach,
        Some(PathGeometry::new(vec![start, Point::new(49.80, 24.00)]))
    );

    // nothing was cached, so routing is asked again
    block_on(resolver.resolve(&route, None)).unwrap();
    assert_eq!(routing.calls(), 3);
}

#[test]
fn degenerate_cached_geometry_is_a_miss_test() {
    use crate::db::MemoryStore;
    use crate::testing::{route, MockRouting};
    use std::sync::Arc;
    use tokio_test::block_on;

    let cache = RouteCache::new(Arc::new(MemoryStore::new()));
    let routing = Arc::new(MockRouting::working());
    let resolver = PathResolver::new(routing.clone(), cache.clone());
    let route = route("4", &[(49.80, 24.00), (49.84, 24.03)]);

    block_on(cache.put("4", PathGeometry::new(vec![Point::new(49.80, 24.00)])));

    let resolved = block_on(resolver.resolve(&route, None)).unwrap();

    assert_eq!(resolved.full.len(), 3);
    assert_eq!(routing.calls(), 1);
    assert_eq!(block_on(cache.get("4")), Some(resolved.full));
}
