use crate::entities::Point;
use crate::error::{empty_input_error, Error};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometres (haversine).
pub fn distance(a: Point, b: Point) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Index of the candidate closest to `target`; the first one wins ties.
pub fn nearest_index<I>(target: Point, candidates: I) -> Result<usize, Error>
where
    I: IntoIterator<Item = Point>,
{
    let mut nearest: Option<(usize, f64)> = None;

    for (index, candidate) in candidates.into_iter().enumerate() {
        let d = distance(target, candidate);

        match nearest {
            Some((_, min)) if d >= min => {}
            _ => nearest = Some((index, d)),
        }
    }

    nearest.map(|(index, _)| index).ok_or_else(empty_input_error)
}

/// Index of the nearest candidate, never the last one while at least two remain.
pub fn entry_index<I>(target: Point, candidates: I) -> Result<usize, Error>
where
    I: IntoIterator<Item = Point>,
    I::IntoIter: ExactSizeIterator,
{
    let candidates = candidates.into_iter();
    let len = candidates.len();
    let index = nearest_index(target, candidates)?;

    if index + 1 < len {
        Ok(index)
    } else {
        Ok(len.saturating_sub(2))
    }
}

#[test]
fn distance_properties_test() {
    let lviv = Point::new(49.8397, 24.0297);
    let kyiv = Point::new(50.4501, 30.5234);

    assert_eq!(distance(lviv, lviv), 0.0);
    assert_eq!(distance(lviv, kyiv), distance(kyiv, lviv));
    assert!((distance(lviv, kyiv) - 468.0).abs() < 5.0);
    assert!(distance(Point::new(0.0, 0.0), Point::new(0.0, 180.0)) > 0.0);
}

#[test]
fn distance_antipodes_test() {
    let d = distance(Point::new(0.0, 0.0), Point::new(0.0, 180.0));
    assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
}

#[test]
fn nearest_index_test() {
    let candidates = vec![
        Point::new(49.80, 24.00),
        Point::new(49.84, 24.03),
        Point::new(49.90, 24.10),
    ];

    let index = nearest_index(Point::new(49.841, 24.031), candidates.clone()).unwrap();
    assert_eq!(index, 1);

    let target = Point::new(49.85, 24.05);
    let best = distance(target, candidates[nearest_index(target, candidates.clone()).unwrap()]);
    assert!(candidates.iter().all(|c| best <= distance(target, *c)));
}

#[test]
fn nearest_index_tie_test() {
    let p = Point::new(10.0, 10.0);
    assert_eq!(nearest_index(Point::new(0.0, 0.0), vec![p, p, p]).unwrap(), 0);
}

#[test]
fn nearest_index_empty_test() {
    let err = nearest_index(Point::new(0.0, 0.0), Vec::new()).unwrap_err();
    assert!(err.is_empty_input());
}

#[test]
fn entry_index_clamp_test() {
    let candidates = vec![
        Point::new(49.80, 24.00),
        Point::new(49.84, 24.03),
        Point::new(49.90, 24.10),
    ];

    assert_eq!(entry_index(Point::new(49.91, 24.11), candidates.clone()).unwrap(), 1);
    assert_eq!(entry_index(Point::new(49.79, 23.99), candidates).unwrap(), 0);
    assert_eq!(entry_index(Point::new(1.0, 1.0), vec![Point::new(0.0, 0.0)]).unwrap(), 0);
}
