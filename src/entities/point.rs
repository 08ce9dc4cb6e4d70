use serde::{Deserialize, Serialize};

use crate::error::{invalid_input_error, Error};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub latitude: f64,
    pub longitude: f64,
}

impl Point {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Builds a point, rejecting coordinates outside the WGS84 ranges.
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self, Error> {
        let point = Self::new(latitude, longitude);

        if !point.is_valid() {
            return Err(invalid_input_error());
        }

        Ok(point)
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl From<Point> for geo_types::Point<f64> {
    fn from(point: Point) -> Self {
        geo_types::Point::new(point.longitude, point.latitude)
    }
}

impl From<Point> for geo_types::Coord<f64> {
    fn from(point: Point) -> Self {
        geo_types::Coord {
            x: point.longitude,
            y: point.latitude,
        }
    }
}

impl From<geo_types::Point<f64>> for Point {
    fn from(point: geo_types::Point<f64>) -> Self {
        Self::new(point.y(), point.x())
    }
}

/// One stop along a route.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    #[serde(flatten)]
    pub point: Point,
    pub name: Option<String>,
}

impl Waypoint {
    pub fn new(point: Point, name: Option<String>) -> Self {
        Self { point, name }
    }
}

impl From<Point> for Waypoint {
    fn from(point: Point) -> Self {
        Self::new(point, None)
    }
}

#[test]
fn point_validation_test() {
    assert!(Point::try_new(49.84, 24.03).is_ok());
    assert!(Point::try_new(90.0, -180.0).is_ok());

    let err = Point::try_new(91.0, 0.0).unwrap_err();
    assert_eq!(err.code, 102);
    assert!(Point::try_new(0.0, 180.5).is_err());
}

#[test]
fn geo_types_conversion_test() {
    let point = Point::new(49.84, 24.03);
    let geo: geo_types::Point<f64> = point.into();

    assert_eq!(geo.x(), 24.03);
    assert_eq!(geo.y(), 49.84);
    assert_eq!(Point::from(geo), point);
}

#[test]
fn waypoint_serde_test() {
    let waypoint: Waypoint = serde_json::from_str(
        r#"{"latitude": 49.8419, "longitude": 24.0315, "name": "Rynok Square"}"#,
    )
    .unwrap();

    assert_eq!(waypoint.point, Point::new(49.8419, 24.0315));
    assert_eq!(waypoint.name.as_deref(), Some("Rynok Square"));
}
