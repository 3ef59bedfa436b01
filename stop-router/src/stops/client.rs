//! Overpass API client for public transport stops.

use std::collections::HashSet;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::domain::Stop;

use super::error::StopSourceError;

/// Public Overpass mirrors, tried in order.
const DEFAULT_SERVERS: [&str; 2] = [
    "https://overpass.kumi.systems/api/interpreter",
    "https://overpass-api.de/api/interpreter",
];

/// Name used when a stop carries neither a `name` nor a `ref` tag.
const FALLBACK_NAME: &str = "Stop";

/// Query area in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Default for BoundingBox {
    /// Central Brasília.
    fn default() -> Self {
        Self {
            south: -15.82,
            west: -47.95,
            north: -15.75,
            east: -47.85,
        }
    }
}

/// Configuration for the Overpass client.
#[derive(Debug, Clone)]
pub struct OverpassConfig {
    /// Interpreter endpoints, tried in order until one answers
    pub servers: Vec<String>,
    /// Area to query
    pub bbox: BoundingBox,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self {
            servers: DEFAULT_SERVERS.iter().map(|s| s.to_string()).collect(),
            bbox: BoundingBox::default(),
            timeout_secs: 60,
        }
    }
}

impl OverpassConfig {
    pub fn with_servers(mut self, servers: Vec<String>) -> Self {
        self.servers = servers;
        self
    }

    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = bbox;
        self
    }
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(rename = "type")]
    kind: String,
    id: u64,
    lat: Option<f64>,
    lon: Option<f64>,
    #[serde(default)]
    tags: Option<OverpassTags>,
}

#[derive(Debug, Default, Deserialize)]
struct OverpassTags {
    name: Option<String>,
    #[serde(rename = "ref")]
    reference: Option<String>,
}

/// Client fetching bus stops and platforms from Overpass.
#[derive(Debug, Clone)]
pub struct OverpassClient {
    http: reqwest::Client,
    config: OverpassConfig,
}

impl OverpassClient {
    pub fn new(config: OverpassConfig) -> Result<Self, StopSourceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &OverpassConfig {
        &self.config
    }

    /// Fetch all stops in the configured area, falling back across servers.
    pub async fn fetch_all(&self) -> Result<Vec<Stop>, StopSourceError> {
        let query = build_query(&self.config.bbox, self.config.timeout_secs);
        let mut last = None;

        for server in &self.config.servers {
            match self.fetch_from(server, &query).await {
                Ok(stops) => {
                    info!(server, stops = stops.len(), "Fetched stops");
                    return Ok(stops);
                }
                Err(e) => {
                    warn!(server, error = %e, "Stop server failed");
                    last = Some(e);
                }
            }
        }

        match last {
            Some(e) => Err(StopSourceError::AllServersFailed {
                attempts: self.config.servers.len(),
                last: e.to_string(),
            }),
            None => Err(StopSourceError::NoServers),
        }
    }

    async fn fetch_from(&self, server: &str, query: &str) -> Result<Vec<Stop>, StopSourceError> {
        debug!(server, "Querying stops");
        let response = self
            .http
            .get(server)
            .query(&[("data", query)])
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StopSourceError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        parse_elements(&body)
    }
}

/// Overpass QL for bus stops and platforms inside `bbox`.
fn build_query(bbox: &BoundingBox, timeout_secs: u64) -> String {
    let area = format!("({},{},{},{})", bbox.south, bbox.west, bbox.north, bbox.east);
    format!(
        "[out:json][timeout:{timeout_secs}];(node[\"highway\"=\"bus_stop\"]{area};node[\"public_transport\"=\"platform\"]{area};);out body;"
    )
}

/// Parse an Overpass response into stops.
///
/// Non-node elements and nodes without coordinates are dropped. A node
/// matched by both query clauses is kept once.
fn parse_elements(body: &str) -> Result<Vec<Stop>, StopSourceError> {
    let response: OverpassResponse =
        serde_json::from_str(body).map_err(|e| StopSourceError::Json {
            message: e.to_string(),
        })?;

    let mut seen = HashSet::new();
    let stops = response
        .elements
        .into_iter()
        .filter(|e| e.kind == "node")
        .filter_map(|e| {
            let (lat, lon) = (e.lat?, e.lon?);
            if !lat.is_finite() || !lon.is_finite() || !seen.insert(e.id) {
                return None;
            }
            let tags = e.tags.unwrap_or_default();
            let name = tags
                .name
                .or(tags.reference)
                .unwrap_or_else(|| FALLBACK_NAME.to_string());
            Some(Stop::new(e.id.to_string(), lat, lon, name))
        })
        .collect();

    Ok(stops)
}
