//! OSRM HTTP client.
//!
//! Provides the async `route/v1` query used for both edge weights and edge
//! geometry. A semaphore bounds outstanding requests regardless of how many
//! route computations share the client.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::trace;

use crate::domain::Coordinate;
use crate::provider::{Overview, RouteLeg, RouteProvider};

use super::error::RemoteError;
use super::types::OsrmResponse;

/// Default base URL (public OSRM demo server).
const DEFAULT_BASE_URL: &str = "https://router.project-osrm.org";

/// Default routing profile.
const DEFAULT_PROFILE: &str = "driving";

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 5;

/// Configuration for the OSRM client.
#[derive(Debug, Clone)]
pub struct OsrmConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Routing profile (`driving`, `foot`, ...)
    pub profile: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl OsrmConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom base URL (self-hosted OSRM, or a test server).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            profile: DEFAULT_PROFILE.to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: 10,
        }
    }
}

/// OSRM API client.
#[derive(Debug, Clone)]
pub struct OsrmClient {
    http: reqwest::Client,
    base_url: String,
    profile: String,
    semaphore: Arc<Semaphore>,
}

impl OsrmClient {
    /// Create a new OSRM client with the given configuration.
    pub fn new(config: OsrmConfig) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            profile: config.profile,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
        })
    }

    /// Build the request URL for a leg.
    fn route_url(&self, from: Coordinate, to: Coordinate) -> String {
        format!(
            "{}/route/v1/{}/{},{};{},{}",
            self.base_url, self.profile, from.lon, from.lat, to.lon, to.lat
        )
    }

    /// Query a single leg.
    ///
    /// Returns `Ok(None)` when the service reports that the points cannot be
    /// connected.
    pub async fn get_route(
        &self,
        from: Coordinate,
        to: Coordinate,
        overview: Overview,
    ) -> Result<Option<RouteLeg>, RemoteError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| RemoteError::Api {
                status: 0,
                message: "Semaphore closed".to_string(),
            })?;

        let url = self.route_url(from, to);
        let query: &[(&str, &str)] = match overview {
            Overview::None => &[("overview", "false")],
            Overview::Full => &[("overview", "full"), ("geometries", "geojson")],
        };

        trace!(%url, ?overview, "OSRM route request");

        let response = self.http.get(&url).query(query).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RemoteError::RateLimited);
        }

        let body = response.text().await?;

        // OSRM reports routing failures in the body, sometimes with a 400
        if let Ok(parsed) = serde_json::from_str::<OsrmResponse>(&body) {
            if parsed.is_no_route() {
                return Ok(None);
            }
            if status.is_success() {
                return Ok(parsed.into_leg());
            }
            return Err(RemoteError::Api {
                status: status.as_u16(),
                message: parsed.message.unwrap_or(parsed.code),
            });
        }

        if !status.is_success() {
            return Err(RemoteError::Api {
                status: status.as_u16(),
                message: body.chars().take(500).collect(),
            });
        }

        Err(RemoteError::Json {
            message: format!(
                "unexpected response body: {}",
                body.chars().take(200).collect::<String>()
            ),
        })
    }
}

impl RouteProvider for OsrmClient {
    async fn route(
        &self,
        from: Coordinate,
        to: Coordinate,
        overview: Overview,
    ) -> Result<Option<RouteLeg>, RemoteError> {
        self.get_route(from, to, overview).await
    }
}
