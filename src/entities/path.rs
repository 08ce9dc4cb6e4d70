use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{Point, Waypoint};
use crate::geo;

/// Ordered points describing a walkable line.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathGeometry(pub Vec<Point>);

impl PathGeometry {
    pub fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Straight-line geometry through the waypoints, in order.
    pub fn interpolate(waypoints: &[Waypoint]) -> Self {
        Self(waypoints.iter().map(|waypoint| waypoint.point).collect())
    }

    pub fn points(&self) -> &[Point] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Portion of the path from `index` onward.
    pub fn slice_from(&self, index: usize) -> Self {
        Self(self.0.get(index..).unwrap_or_default().to_vec())
    }

    pub fn length_km(&self) -> f64 {
        self.0
            .windows(2)
            .map(|leg| geo::distance(leg[0], leg[1]))
            .sum()
    }
}

impl From<Vec<Point>> for PathGeometry {
    fn from(points: Vec<Point>) -> Self {
        Self(points)
    }
}

impl From<PathGeometry> for geo_types::LineString<f64> {
    fn from(path: PathGeometry) -> Self {
        path.0
            .into_iter()
            .map(geo_types::Coord::from)
            .collect::<Vec<_>>()
            .into()
    }
}

/// Resolved geometry as persisted by the route cache.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub geometry: PathGeometry,
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(key: String, geometry: PathGeometry) -> Self {
        Self {
            key,
            geometry,
            stored_at: Utc::now(),
        }
    }
}

#[test]
fn slice_from_test() {
    let path = PathGeometry::new(vec![
        Point::new(0.0, 0.0),
        Point::new(0.0, 1.0),
        Point::new(0.0, 2.0),
    ]);

    assert_eq!(path.slice_from(1).points(), &path.points()[1..]);
    assert!(path.slice_from(3).is_empty());
    assert!(path.slice_from(7).is_empty());
}

#[test]
fn length_km_test() {
    let path = PathGeometry::new(vec![
        Point::new(0.0, 0.0),
        Point::new(0.0, 1.0),
        Point::new(0.0, 2.0),
    ]);

    // one degree of longitude on the equator is ~111.19 km
    assert!((path.length_km() - 222.39).abs() < 0.01);
    assert_eq!(PathGeometry::default().length_km(), 0.0);
}

#[test]
fn line_string_conversion_test() {
    let path = PathGeometry::new(vec![Point::new(49.84, 24.03), Point::new(49.85, 24.04)]);
    let line: geo_types::LineString<f64> = path.into();

    assert_eq!(line.0.len(), 2);
    assert_eq!(line.0[1].x, 24.04);
    assert_eq!(line.0[1].y, 49.85);
}
