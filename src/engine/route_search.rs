use crate::{
    entities::{Point, Route},
    geo,
};

pub const NEARBY_RADIUS_KM: f64 = 3.0;
pub const FALLBACK_ROUTES: usize = 10;

/// Orders routes by how far their first waypoint is from `start` and keeps
/// the ones within walking radius, or the closest few when none are.
pub fn rank_by_proximity(routes: Vec<Route>, start: Point) -> Vec<Route> {
    let mut ranked: Vec<(f64, Route)> = routes
        .into_iter()
        .map(|route| {
            let d = route
                .first_waypoint()
                .map(|waypoint| geo::distance(start, waypoint.point))
                .unwrap_or(f64::INFINITY);
            (d, route)
        })
        .collect();

    ranked.sort_by(|a, b| a.0.total_cmp(&b.0));

    let nearby = ranked.iter().filter(|(d, _)| *d <= NEARBY_RADIUS_KM).count();
    let keep = if nearby > 0 { nearby } else { FALLBACK_ROUTES };

    ranked.into_iter().take(keep).map(|(_, route)| route).collect()
}

#[test]
fn nearby_routes_test() {
    use crate::testing::route;

    let routes = vec![
        route("far", &[(50.45, 30.52)]),
        route("near", &[(49.845, 24.035)]),
        route("empty", &[]),
        route("closest", &[(49.8398, 24.0298)]),
    ];

    let ranked = rank_by_proximity(routes, Point::new(49.8397, 24.0297));
    let ids: Vec<_> = ranked.iter().map(|route| route.id.as_str()).collect();

    assert_eq!(ids, vec!["closest", "near"]);
}

#[test]
fn fallback_to_closest_routes_test() {
    use crate::testing::route;

    let mut routes: Vec<_> = (0..12)
        .map(|i| route(&i.to_string(), &[(50.0 + i as f64 * 0.1, 30.0)]))
        .collect();
    routes.reverse();
    routes.push(route("empty", &[]));

    let ranked = rank_by_proximity(routes, Point::new(49.8397, 24.0297));
    let ids: Vec<_> = ranked.iter().map(|route| route.id.as_str()).collect();

    assert_eq!(ids.len(), FALLBACK_ROUTES);
    assert_eq!(ids[0], "0");
    assert_eq!(ids[9], "9");
}
