//! Server configuration from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::osrm::OsrmConfig;
use crate::router::RouterConfig;
use crate::stops::OverpassConfig;

const DEFAULT_BIND: ([u8; 4], u16) = ([127, 0, 0, 1], 3000);
const DEFAULT_CACHE_DIR: &str = ".stop-router-cache";

/// Everything the server binary needs to start.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    /// Directory holding the persisted graph cache
    pub cache_dir: PathBuf,
    /// Load stops from this JSON file instead of Overpass
    pub stops_file: Option<PathBuf>,
    pub router: RouterConfig,
    pub osrm: OsrmConfig,
    pub overpass: OverpassConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(DEFAULT_BIND),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            stops_file: None,
            router: RouterConfig::default(),
            osrm: OsrmConfig::default(),
            overpass: OverpassConfig::default(),
        }
    }
}

impl AppConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`. Unset variables keep their
    /// defaults; unparsable ones are logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(bind) = parsed(&lookup, "STOP_ROUTER_BIND") {
            config.bind = bind;
        }
        if let Some(dir) = lookup("STOP_ROUTER_CACHE_DIR") {
            config.cache_dir = PathBuf::from(dir);
        }
        config.stops_file = lookup("STOP_ROUTER_STOPS_FILE").map(PathBuf::from);

        if let Some(model) = parsed(&lookup, "STOP_ROUTER_DISTANCE_MODEL") {
            config.router.model = model;
        }
        if let Some(k) = parsed(&lookup, "STOP_ROUTER_MAX_NEIGHBORS") {
            config.router.graph.max_neighbors = k;
        }
        if let Some(cutoff) = parsed::<f64>(&lookup, "STOP_ROUTER_CUTOFF_METERS") {
            if cutoff.is_finite() && cutoff >= 0.0 {
                config.router.graph.cutoff_meters = cutoff;
            } else {
                warn!(value = cutoff, "Ignoring STOP_ROUTER_CUTOFF_METERS");
            }
        }
        config.router.cache_max_age =
            parsed(&lookup, "STOP_ROUTER_CACHE_MAX_AGE_SECS").map(Duration::from_secs);

        if let Some(url) = lookup("OSRM_BASE_URL") {
            config.osrm = config.osrm.with_base_url(url);
        }

        config
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, value = %raw, error = %e, "Ignoring unparsable environment variable");
            None
        }
    }
}
