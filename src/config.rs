use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::entities::BoundingBox;
use crate::error::{invalid_input_error, Error};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_ROUTING_URL: &str = "https://router.project-osrm.org";
pub const DEFAULT_ROUTING_PROFILE: &str = "foot";
pub const DEFAULT_TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const DEFAULT_TILE_SUBDOMAINS: &str = "abc";
pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const DEFAULT_OFFLINE_ZOOMS: [u8; 4] = [12, 13, 14, 15];

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub backend_url: String,
    pub routing_url: String,
    pub routing_profile: String,
    pub tile_url: String,
    pub tile_subdomains: Vec<String>,
    pub request_timeout: Duration,
    pub batch_size: usize,
    pub offline_bounds: BoundingBox,
    pub offline_zooms: Vec<u8>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.into(),
            routing_url: DEFAULT_ROUTING_URL.into(),
            routing_profile: DEFAULT_ROUTING_PROFILE.into(),
            tile_url: DEFAULT_TILE_URL.into(),
            tile_subdomains: subdomains(DEFAULT_TILE_SUBDOMAINS),
            request_timeout: Duration::from_secs(30),
            batch_size: DEFAULT_BATCH_SIZE,
            offline_bounds: lviv_bounds(),
            offline_zooms: DEFAULT_OFFLINE_ZOOMS.to_vec(),
        }
    }
}

impl Config {
    /// Reads `WAYMARK_*` variables, falling back to defaults for unset ones.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("WAYMARK_BACKEND_URL") {
            config.backend_url = url.trim_end_matches('/').to_string();
        }
        if let Some(url) = lookup("WAYMARK_ROUTING_URL") {
            config.routing_url = url.trim_end_matches('/').to_string();
        }
        if let Some(profile) = lookup("WAYMARK_ROUTING_PROFILE") {
            config.routing_profile = profile;
        }
        if let Some(url) = lookup("WAYMARK_TILE_URL") {
            config.tile_url = url;
        }
        if let Some(value) = lookup("WAYMARK_TILE_SUBDOMAINS") {
            config.tile_subdomains = subdomains(&value);
        }
        if let Some(value) = lookup("WAYMARK_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(parse(&value)?);
        }
        if let Some(value) = lookup("WAYMARK_OFFLINE_BATCH_SIZE") {
            config.batch_size = parse(&value)?;
            if config.batch_size == 0 {
                return Err(invalid_input_error());
            }
        }

        Ok(config)
    }
}

fn parse<T: FromStr>(value: &str) -> Result<T, Error> {
    value.trim().parse().map_err(|_| invalid_input_error())
}

fn subdomains(value: &str) -> Vec<String> {
    value.chars().map(String::from).collect()
}

fn lviv_bounds() -> BoundingBox {
    BoundingBox::new(49.90, 24.15, 49.77, 23.92).expect("static bounds are valid")
}

#[test]
fn default_config_test() {
    let config = Config::from_lookup(|_| None).unwrap();

    assert_eq!(config, Config::default());
    assert_eq!(config.batch_size, 10);
    assert_eq!(config.tile_subdomains, vec!["a", "b", "c"]);
    assert_eq!(config.offline_zooms, vec![12, 13, 14, 15]);
    assert_eq!(config.offline_bounds.north(), 49.90);
}

#[test]
fn config_overrides_test() {
    let config = Config::from_lookup(|name| match name {
        "WAYMARK_BACKEND_URL" => Some("https://routes.example.org/".into()),
        "WAYMARK_REQUEST_TIMEOUT_SECS" => Some("5".into()),
        "WAYMARK_OFFLINE_BATCH_SIZE" => Some("4".into()),
        _ => None,
    })
    .unwrap();

    assert_eq!(config.backend_url, "https://routes.example.org");
    assert_eq!(config.request_timeout, Duration::from_secs(5));
    assert_eq!(config.batch_size, 4);
}

#[test]
fn config_rejects_malformed_numbers_test() {
    let result = Config::from_lookup(|name| match name {
        "WAYMARK_REQUEST_TIMEOUT_SECS" => Some("soon".into()),
        _ => None,
    });
    assert_eq!(result.unwrap_err().code, 102);

    let result = Config::from_lookup(|name| match name {
        "WAYMARK_OFFLINE_BATCH_SIZE" => Some("0".into()),
        _ => None,
    });
    assert!(result.is_err());
}
