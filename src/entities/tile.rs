use std::f64::consts::PI;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::entities::Point;
use crate::error::{invalid_input_error, Error};

/// Web Mercator latitude limit; tiles are square only up to here.
const MAX_LATITUDE: f64 = 85.051_128_779_8;

/// Slack for box edges that land on a tile boundary after projection.
const TILE_EDGE_EPSILON: f64 = 1e-9;

/// A slippy-map tile address.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileCoordinate {
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
}

impl TileCoordinate {
    pub fn new(zoom: u8, x: u32, y: u32) -> Self {
        Self { zoom, x, y }
    }

    /// Tile containing `point` at `zoom`.
    pub fn from_point(point: Point, zoom: u8) -> Self {
        let (x, y) = Self::position(point, zoom);

        Self::clamped(zoom, x.floor(), y.floor())
    }

    /// Fractional tile grid position of `point`.
    fn position(point: Point, zoom: u8) -> (f64, f64) {
        let latitude = point.latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE);
        let n = 2f64.powi(zoom as i32);

        let x = (point.longitude + 180.0) / 360.0 * n;

        let lat_rad = latitude.to_radians();
        let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n;

        (x, y)
    }

    fn clamped(zoom: u8, x: f64, y: f64) -> Self {
        let max_tile = (2f64.powi(zoom as i32) as u32).saturating_sub(1);

        Self {
            zoom,
            x: (x.max(0.0) as u32).min(max_tile),
            y: (y.max(0.0) as u32).min(max_tile),
        }
    }

    /// Geographic position of the tile's top-left corner.
    pub fn north_west(&self) -> Point {
        let n = 2f64.powi(self.zoom as i32);
        let longitude = self.x as f64 / n * 360.0 - 180.0;
        let latitude = (PI * (1.0 - 2.0 * self.y as f64 / n)).sinh().atan().to_degrees();

        Point::new(latitude, longitude)
    }

    /// Storage key, unique per tile.
    pub fn key(&self) -> String {
        format!("{}/{}/{}", self.zoom, self.x, self.y)
    }
}

impl Display for TileCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.zoom, self.x, self.y)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TileRecord {
    pub coordinate: TileCoordinate,
    pub image: Vec<u8>,
}

/// Geographic rectangle in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    north: f64,
    east: f64,
    south: f64,
    west: f64,
}

impl BoundingBox {
    pub fn new(north: f64, east: f64, south: f64, west: f64) -> Result<Self, Error> {
        let corners = [Point::new(north, west), Point::new(south, east)];

        if corners.iter().any(|corner| !corner.is_valid()) || south > north || west > east {
            return Err(invalid_input_error());
        }

        Ok(Self {
            north,
            east,
            south,
            west,
        })
    }

    pub fn north(&self) -> f64 {
        self.north
    }

    pub fn east(&self) -> f64 {
        self.east
    }

    pub fn south(&self) -> f64 {
        self.south
    }

    pub fn west(&self) -> f64 {
        self.west
    }

    /// Every tile covering the box at `zoom`, row by row from the north-west.
    /// Edges lying on a tile boundary do not pull in the neighbouring tile.
    pub fn tiles(&self, zoom: u8) -> Vec<TileCoordinate> {
        let (west, north) = TileCoordinate::position(Point::new(self.north, self.west), zoom);
        let (east, south) = TileCoordinate::position(Point::new(self.south, self.east), zoom);

        let top_left = TileCoordinate::clamped(
            zoom,
            (west + TILE_EDGE_EPSILON).floor(),
            (north + TILE_EDGE_EPSILON).floor(),
        );
        let bottom_right = TileCoordinate::clamped(
            zoom,
            (east - TILE_EDGE_EPSILON).ceil() - 1.0,
            (south - TILE_EDGE_EPSILON).ceil() - 1.0,
        );

        let right = bottom_right.x.max(top_left.x);
        let bottom = bottom_right.y.max(top_left.y);

        (top_left.y..=bottom)
            .flat_map(|y| (top_left.x..=right).map(move |x| TileCoordinate::new(zoom, x, y)))
            .collect()
    }

    /// Tiles for each zoom level in order; a tile is always qualified by its zoom.
    pub fn tiles_for_zooms(&self, zooms: &[u8]) -> Vec<TileCoordinate> {
        zooms.iter().flat_map(|zoom| self.tiles(*zoom)).collect()
    }
}

#[test]
fn tile_index_test() {
    let tile = TileCoordinate::from_point(Point::new(50.7929, 6.0402), 18);
    assert_eq!((tile.x, tile.y), (135470, 87999));
}

#[test]
fn tile_extremes_are_clamped_test() {
    let north_east = TileCoordinate::from_point(Point::new(90.0, 180.0), 10);
    assert_eq!((north_east.x, north_east.y), (1023, 0));

    let south_west = TileCoordinate::from_point(Point::new(-90.0, -180.0), 10);
    assert_eq!((south_west.x, south_west.y), (0, 1023));

    let world = TileCoordinate::from_point(Point::new(10.0, 10.0), 0);
    assert_eq!(world, TileCoordinate::new(0, 0, 0));
}

#[test]
fn north_west_roundtrip_test() {
    let tile = TileCoordinate::new(14, 9340, 5612);
    let corner = tile.north_west();
    let inside = Point::new(corner.latitude - 0.001, corner.longitude + 0.001);

    assert_eq!(TileCoordinate::from_point(inside, 14), tile);
}

#[test]
fn bounding_box_validation_test() {
    assert!(BoundingBox::new(49.90, 24.15, 49.77, 23.92).is_ok());
    assert!(BoundingBox::new(49.77, 24.15, 49.90, 23.92).is_err());
    assert!(BoundingBox::new(95.0, 24.15, 49.77, 23.92).is_err());
}

#[test]
fn bounding_box_tiles_test() {
    // tiny box around a corner shared by four tiles at zoom 12 (and therefore at 13)
    let corner = TileCoordinate::new(12, 2300, 1400).north_west();
    let bounds = BoundingBox::new(
        corner.latitude + 0.001,
        corner.longitude + 0.001,
        corner.latitude - 0.001,
        corner.longitude - 0.001,
    )
    .unwrap();

    assert_eq!(
        bounds.tiles(12),
        vec![
            TileCoordinate::new(12, 2299, 1399),
            TileCoordinate::new(12, 2300, 1399),
            TileCoordinate::new(12, 2299, 1400),
            TileCoordinate::new(12, 2300, 1400),
        ]
    );

    let tiles = bounds.tiles_for_zooms(&[12, 13]);
    assert_eq!(tiles.len(), 8);
    assert!(tiles.contains(&TileCoordinate::new(13, 4599, 2799)));
    assert!(tiles.contains(&TileCoordinate::new(13, 4600, 2800)));
}

#[test]
fn tile_aligned_bounds_test() {
    let tile = TileCoordinate::new(12, 2300, 1400);
    let north_west = tile.north_west();
    let south_east = TileCoordinate::new(12, 2301, 1401).north_west();

    let bounds = BoundingBox::new(
        north_west.latitude,
        south_east.longitude,
        south_east.latitude,
        north_west.longitude,
    )
    .unwrap();

    assert_eq!(bounds.tiles(12), vec![tile]);
    assert_eq!(bounds.tiles(13).len(), 4);
    assert!(bounds.tiles(13).contains(&TileCoordinate::new(13, 4601, 2801)));

    // a zero-area box still covers its tile
    let point = BoundingBox::new(
        north_west.latitude,
        north_west.longitude,
        north_west.latitude,
        north_west.longitude,
    )
    .unwrap();
    assert_eq!(point.tiles(12), vec![tile]);
}

#[test]
fn tile_key_test() {
    let tile = TileCoordinate::new(13, 4600, 2800);
    assert_eq!(tile.key(), "13/4600/2800");
    assert_eq!(tile.to_string(), "13x4600x2800");
}
