mod offline_api;
mod offline_downloader;
mod path_api;
mod path_resolver;
mod route_api;
mod route_cache;
mod route_search;
mod tile_cache;

use std::sync::Arc;

use sqlx::{Pool, Postgres};

pub use offline_downloader::{DownloadOptions, OfflineDownloader};
pub use path_resolver::{PathResolver, ResolvedPath};
pub use route_cache::RouteCache;
pub use route_search::{rank_by_proximity, FALLBACK_ROUTES, NEARBY_RADIUS_KM};
pub use tile_cache::TileCache;

use crate::{
    api::API,
    config::Config,
    db::PgStore,
    error::Error,
    external::{BackendClient, DynRoutes, OsrmClient, TileServer},
};

pub struct Engine {
    routes: DynRoutes,
    resolver: PathResolver,
    downloader: OfflineDownloader,
}

impl Engine {
    pub fn new(routes: DynRoutes, resolver: PathResolver, downloader: OfflineDownloader) -> Self {
        Self {
            routes,
            resolver,
            downloader,
        }
    }

    /// Wires the HTTP collaborators from `config` to Postgres-backed caches.
    #[tracing::instrument(name = "Engine::connect", skip_all)]
    pub async fn connect(config: &Config, pool: Pool<Postgres>) -> Result<Self, Error> {
        // route cache (KV store)
        let route_store = PgStore::new(pool.clone(), "route_paths").await?;

        // tile cache (KV store)
        let tile_store = PgStore::new(pool, "map_tiles").await?;

        let resolver = PathResolver::new(
            Arc::new(OsrmClient::new(config)?),
            RouteCache::new(Arc::new(route_store)),
        );

        let downloader = OfflineDownloader::new(
            Arc::new(TileServer::new(config)?),
            TileCache::new(Arc::new(tile_store)),
            DownloadOptions {
                batch_size: config.batch_size,
                ..DownloadOptions::default()
            },
        );

        Ok(Self::new(
            Arc::new(BackendClient::new(config)?),
            resolver,
            downloader,
        ))
    }
}

impl API for Engine {}

#[cfg(test)]
pub(crate) fn test_engine(
    routes: Vec<crate::entities::Route>,
    routing: Arc<crate::testing::MockRouting>,
) -> Engine {
    use crate::db::MemoryStore;
    use crate::testing::{MockRoutes, MockTiles};

    Engine::new(
        Arc::new(MockRoutes::new(routes)),
        PathResolver::new(routing, RouteCache::new(Arc::new(MemoryStore::new()))),
        OfflineDownloader::new(
            Arc::new(MockTiles::new(vec![])),
            TileCache::new(Arc::new(MemoryStore::new())),
            DownloadOptions::default(),
        ),
    )
}
