pub mod backend;
pub mod osrm;
pub mod tile_server;

use std::sync::Arc;

use async_trait::async_trait;

use crate::entities::{PathGeometry, Point, Route, RouteFilter, TileCoordinate};
use crate::error::Error;

pub use backend::BackendClient;
pub use osrm::OsrmClient;
pub use tile_server::TileServer;

/// Turns an ordered list of points into walkable geometry.
#[async_trait]
pub trait RoutingService {
    async fn route(&self, points: &[Point]) -> Result<PathGeometry, Error>;
}

#[async_trait]
pub trait TileService {
    async fn fetch_tile(&self, tile: TileCoordinate) -> Result<Vec<u8>, Error>;
}

/// The route-filter backend.
#[async_trait]
pub trait RouteService {
    async fn find_routes(&self, filter: &RouteFilter) -> Result<Vec<Route>, Error>;
    async fn find_route(&self, id: &str) -> Result<Route, Error>;
}

pub type DynRouting = Arc<dyn RoutingService + Send + Sync>;
pub type DynTiles = Arc<dyn TileService + Send + Sync>;
pub type DynRoutes = Arc<dyn RouteService + Send + Sync>;

pub(crate) fn http_client(timeout: std::time::Duration) -> Result<reqwest::Client, Error> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("waymark/", env!("CARGO_PKG_VERSION")))
        .build()?;

    Ok(client)
}
