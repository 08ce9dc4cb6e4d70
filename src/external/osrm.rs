use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{http_client, RoutingService};
use crate::{
    config::Config,
    entities::{PathGeometry, Point},
    error::{invalid_input_error, upstream_error, Error},
};

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Response {
    code: String,
    routes: Option<Vec<RouteResult>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct RouteResult {
    geometry: LineString,
}

/// GeoJSON line: coordinates are `[longitude, latitude]` pairs.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct LineString {
    coordinates: Vec<[f64; 2]>,
}

#[derive(Clone, Debug)]
pub struct OsrmClient {
    client: reqwest::Client,
    base_url: String,
    profile: String,
}

impl OsrmClient {
    pub fn new(config: &Config) -> Result<Self, Error> {
        Ok(Self {
            client: http_client(config.request_timeout)?,
            base_url: config.routing_url.clone(),
            profile: config.routing_profile.clone(),
        })
    }

    fn route_url(&self, points: &[Point]) -> String {
        let coordinates = points
            .iter()
            .map(|point| format!("{},{}", point.longitude, point.latitude))
            .collect::<Vec<_>>()
            .join(";");

        format!(
            "{}/route/v1/{}/{}",
            self.base_url, self.profile, coordinates
        )
    }
}

fn into_geometry(data: Response) -> Result<PathGeometry, Error> {
    if data.code != "Ok" {
        return Err(upstream_error());
    }

    let route = data
        .routes
        .and_then(|routes| routes.into_iter().next())
        .ok_or_else(upstream_error)?;

    let points: Vec<Point> = route
        .geometry
        .coordinates
        .into_iter()
        .map(|[longitude, latitude]| Point::new(latitude, longitude))
        .collect();

    // a usable line needs two ends
    if points.len() < 2 {
        return Err(upstream_error());
    }

    Ok(PathGeometry::new(points))
}

#[async_trait]
impl RoutingService for OsrmClient {
    #[tracing::instrument(skip(self))]
    async fn route(&self, points: &[Point]) -> Result<PathGeometry, Error> {
        if points.len() < 2 {
            return Err(invalid_input_error());
        }

        let res = self
            .client
            .get(self.route_url(points))
            .query(&[("overview", "full"), ("geometries", "geojson")])
            .send()
            .await?;

        if !res.status().is_success() {
            tracing::debug!("routing service answered {}", res.status());
            return Err(upstream_error());
        }

        let data: Response = res.json().await?;

        into_geometry(data)
    }
}

#[test]
fn route_url_test() {
    let client = OsrmClient::new(&Config::default()).unwrap();
    let url = client.route_url(&[Point::new(49.84, 24.03), Point::new(49.85, 24.04)]);

    assert_eq!(
        url,
        "https://router.project-osrm.org/route/v1/foot/24.03,49.84;24.04,49.85"
    );
}

#[test]
fn into_geometry_test() {
    let data: Response = serde_json::from_str(
        r#"{
            "code": "Ok",
            "routes": [
                {"geometry": {"type": "LineString", "coordinates": [[24.03, 49.84], [24.035, 49.845], [24.04, 49.85]]}}
            ]
        }"#,
    )
    .unwrap();

    let geometry = into_geometry(data).unwrap();

    assert_eq!(geometry.len(), 3);
    assert_eq!(geometry.points()[0], Point::new(49.84, 24.03));
}

#[test]
fn into_geometry_rejects_failures_test() {
    let no_route: Response = serde_json::from_str(r#"{"code": "NoRoute"}"#).unwrap();
    assert_eq!(into_geometry(no_route).unwrap_err().code, 4);

    let empty: Response = serde_json::from_str(r#"{"code": "Ok", "routes": []}"#).unwrap();
    assert!(into_geometry(empty).is_err());

    let blank: Response = serde_json::from_str(
        r#"{"code": "Ok", "routes": [{"geometry": {"coordinates": []}}]}"#,
    )
    .unwrap();
    assert!(into_geometry(blank).is_err());

    let single: Response = serde_json::from_str(
        r#"{"code": "Ok", "routes": [{"geometry": {"coordinates": [[24.03, 49.84]]}}]}"#,
    )
    .unwrap();
    assert_eq!(into_geometry(single).unwrap_err().code, 4);
}
