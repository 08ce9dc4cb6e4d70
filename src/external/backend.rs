use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{http_client, RouteService};
use crate::{
    config::Config,
    entities::{Point, Route, RouteFilter, Waypoint},
    error::{invalid_input_error, upstream_error, Error},
};

/// Ids and coordinates come back as numbers or as decimal strings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Number(f64),
    Text(String),
}

impl Scalar {
    fn as_f64(&self) -> Result<f64, Error> {
        match self {
            Self::Number(value) => Ok(*value),
            Self::Text(value) => value.trim().parse().map_err(|_| upstream_error()),
        }
    }

    fn as_id(&self) -> String {
        match self {
            Self::Number(value) if value.fract() == 0.0 => format!("{}", *value as i64),
            Self::Number(value) => value.to_string(),
            Self::Text(value) => value.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct RoutePoint {
    name: Option<String>,
    latitude: Scalar,
    longitude: Scalar,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct RouteData {
    id: Scalar,
    name: String,
    points: Option<Vec<RoutePoint>>,
    first_point: Option<RoutePoint>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum RouteList {
    Paginated { results: Vec<RouteData> },
    Plain(Vec<RouteData>),
}

impl TryFrom<RoutePoint> for Waypoint {
    type Error = Error;

    fn try_from(point: RoutePoint) -> Result<Self, Error> {
        let coordinates = Point::try_new(point.latitude.as_f64()?, point.longitude.as_f64()?)
            .map_err(|_| upstream_error())?;

        Ok(Waypoint::new(coordinates, point.name))
    }
}

impl TryFrom<RouteData> for Route {
    type Error = Error;

    fn try_from(data: RouteData) -> Result<Self, Error> {
        let points = match (data.points, data.first_point) {
            (Some(points), _) => points,
            (None, Some(first_point)) => vec![first_point],
            (None, None) => vec![],
        };

        let waypoints = points
            .into_iter()
            .map(Waypoint::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Route::new(data.id.as_id(), data.name, waypoints))
    }
}

impl RouteList {
    fn into_routes(self) -> Result<Vec<Route>, Error> {
        let data = match self {
            Self::Paginated { results } => results,
            Self::Plain(results) => results,
        };

        data.into_iter().map(Route::try_from).collect()
    }
}

#[derive(Clone, Debug)]
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(config: &Config) -> Result<Self, Error> {
        Ok(Self {
            client: http_client(config.request_timeout)?,
            base_url: config.backend_url.clone(),
        })
    }

    async fn get<T>(&self, url: String, query: &[(&str, String)]) -> Result<T, Error>
    where
        T: for<'de> Deserialize<'de>,
    {
        let res = self.client.get(url).query(query).send().await?;

        let status_code = res.status().as_u16();

        if (400..500).contains(&status_code) {
            return Err(invalid_input_error());
        } else if status_code != 200 {
            return Err(upstream_error());
        }

        Ok(res.json().await?)
    }
}

#[async_trait]
impl RouteService for BackendClient {
    #[tracing::instrument(skip(self))]
    async fn find_routes(&self, filter: &RouteFilter) -> Result<Vec<Route>, Error> {
        let url = format!("{}/api/routes/", self.base_url);
        let data: RouteList = self.get(url, &filter.query()).await?;

        data.into_routes()
    }

    #[tracing::instrument(skip(self))]
    async fn find_route(&self, id: &str) -> Result<Route, Error> {
        let url = format!("{}/api/routes/{}/", self.base_url, id);
        let data: RouteData = self.get(url, &[]).await?;

        Route::try_from(data)
    }
}

#[test]
fn route_detail_parsing_test() {
    let data: RouteData = serde_json::from_str(
        r#"{
            "id": 7,
            "name": "Old town",
            "city": "Lviv",
            "points": [
                {"id": 1, "name": "Rynok Square", "latitude": "49.841900", "longitude": "24.031500"},
                {"id": 2, "name": "High Castle", "latitude": 49.8484, "longitude": 24.0393}
            ]
        }"#,
    )
    .unwrap();

    let route = Route::try_from(data).unwrap();

    assert_eq!(route.id, "7");
    assert_eq!(route.waypoints.len(), 2);
    assert_eq!(route.waypoints[0].point, Point::new(49.8419, 24.0315));
    assert_eq!(route.waypoints[1].name.as_deref(), Some("High Castle"));
}

#[test]
fn route_list_parsing_test() {
    let paginated: RouteList = serde_json::from_str(
        r#"{"count": 1, "results": [{"id": 3, "name": "Parks", "first_point": {"latitude": "49.80", "longitude": "24.00"}}]}"#,
    )
    .unwrap();
    let routes = paginated.into_routes().unwrap();

    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].first_waypoint().unwrap().point, Point::new(49.80, 24.00));

    let plain: RouteList =
        serde_json::from_str(r#"[{"id": "a1", "name": "Cafes"}]"#).unwrap();
    let routes = plain.into_routes().unwrap();

    assert_eq!(routes[0].id, "a1");
    assert!(routes[0].waypoints.is_empty());
}

#[test]
fn malformed_coordinates_test() {
    let data: RouteData = serde_json::from_str(
        r#"{"id": 1, "name": "Broken", "points": [{"latitude": "north", "longitude": "24.0"}]}"#,
    )
    .unwrap();

    assert_eq!(Route::try_from(data).unwrap_err().code, 4);
}
