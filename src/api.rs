use async_trait::async_trait;
use std::sync::Arc;

use crate::engine::ResolvedPath;
use crate::entities::{BoundingBox, DownloadStatus, DownloadSummary, Point, Route, RouteFilter};
use crate::error::Error;

#[async_trait]
pub trait PathAPI {
    async fn resolve_path(&self, route: &Route, start: Option<Point>) -> Result<ResolvedPath, Error>;
}

#[async_trait]
pub trait OfflineAPI {
    async fn download_region(
        &self,
        bounds: &BoundingBox,
        zooms: &[u8],
        on_progress: &mut (dyn FnMut(u8) + Send),
    ) -> DownloadSummary;

    async fn offline_status(&self) -> DownloadStatus;
}

#[async_trait]
pub trait RouteSearchAPI {
    async fn find_routes(&self, filter: &RouteFilter, start: Option<Point>) -> Result<Vec<Route>, Error>;
    async fn select_route(&self, id: &str, start: Option<Point>) -> Result<(Route, ResolvedPath), Error>;
}

pub trait API: PathAPI + OfflineAPI + RouteSearchAPI {}

pub type DynAPI = Arc<dyn API + Send + Sync>;
