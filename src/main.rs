use std::env;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use waymark::api::{DynAPI, OfflineAPI};
use waymark::config::Config;
use waymark::db::PgPool;
use waymark::engine::Engine;
use waymark::entities::DownloadStatus;
use waymark::error::Error;

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    let database_url = env::var("DATABASE_URL")?;

    let PgPool(pool) = PgPool::new(&database_url, 5).await?;
    let engine: DynAPI = Arc::new(Engine::connect(&config, pool).await?);

    if engine.offline_status().await == DownloadStatus::Done {
        tracing::info!("offline tiles already present, refreshing");
    }

    let mut last = None;
    let summary = engine
        .download_region(&config.offline_bounds, &config.offline_zooms, &mut |percent| {
            if last != Some(percent) {
                tracing::info!("offline download {}%", percent);
                last = Some(percent);
            }
        })
        .await;

    println!(
        "{} tiles: {} stored ({} already cached), {} failed",
        summary.total, summary.succeeded, summary.already_cached, summary.failed
    );

    Ok(())
}
