//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::domain::{Stop, StopId};

/// Request to compute a route between two stops.
#[derive(Debug, Deserialize)]
pub struct RouteRequest {
    /// Departure stop id
    pub start: StopId,

    /// Arrival stop id
    pub end: StopId,
}

/// The current stop list.
#[derive(Debug, Serialize)]
pub struct StopsResponse {
    pub count: usize,
    pub stops: Vec<Stop>,
}

/// Result of a stop list refresh.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// Number of stops now loaded
    pub count: usize,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}
