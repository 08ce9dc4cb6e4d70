use async_trait::async_trait;

use super::{http_client, TileService};
use crate::{
    config::Config,
    entities::TileCoordinate,
    error::{upstream_error, Error},
};

/// Raster tile server addressed through a `{s}`/`{z}`/`{x}`/`{y}` URL template.
#[derive(Clone, Debug)]
pub struct TileServer {
    client: reqwest::Client,
    url_template: String,
    subdomains: Vec<String>,
}

impl TileServer {
    pub fn new(config: &Config) -> Result<Self, Error> {
        Ok(Self {
            client: http_client(config.request_timeout)?,
            url_template: config.tile_url.clone(),
            subdomains: config.tile_subdomains.clone(),
        })
    }

    pub fn tile_url(&self, tile: &TileCoordinate) -> String {
        let mut url = self
            .url_template
            .replace("{z}", &tile.zoom.to_string())
            .replace("{x}", &tile.x.to_string())
            .replace("{y}", &tile.y.to_string());

        if !self.subdomains.is_empty() {
            let index = (tile.x as usize + tile.y as usize) % self.subdomains.len();
            url = url.replace("{s}", &self.subdomains[index]);
        }

        url
    }
}

#[async_trait]
impl TileService for TileServer {
    #[tracing::instrument(skip(self))]
    async fn fetch_tile(&self, tile: TileCoordinate) -> Result<Vec<u8>, Error> {
        let res = self.client.get(self.tile_url(&tile)).send().await?;

        if !res.status().is_success() {
            tracing::debug!("tile server answered {}", res.status());
            return Err(upstream_error());
        }

        let bytes = res.bytes().await?;

        if bytes.is_empty() {
            return Err(upstream_error());
        }

        Ok(bytes.to_vec())
    }
}

#[test]
fn tile_url_test() {
    let server = TileServer::new(&Config::default()).unwrap();

    assert_eq!(
        server.tile_url(&TileCoordinate::new(13, 4599, 2799)),
        "https://a.tile.openstreetmap.org/13/4599/2799.png"
    );
    assert_eq!(
        server.tile_url(&TileCoordinate::new(13, 4600, 2799)),
        "https://b.tile.openstreetmap.org/13/4600/2799.png"
    );
}

#[test]
fn tile_url_without_subdomains_test() {
    let config = Config {
        tile_url: "http://localhost:8080/tiles/{z}/{x}/{y}.png".into(),
        tile_subdomains: vec![],
        ..Config::default()
    };
    let server = TileServer::new(&config).unwrap();

    assert_eq!(
        server.tile_url(&TileCoordinate::new(12, 1, 2)),
        "http://localhost:8080/tiles/12/1/2.png"
    );
}
