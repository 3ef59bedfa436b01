//! Remote routing service error types.

/// Errors from the remote routing service.
///
/// Callers inside the routing pipeline never propagate these; they degrade to
/// a missing edge or a straight-line fallback segment.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// HTTP request failed (network error, connect timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Service returned an error status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Rate limited by the service
    #[error("rate limited by routing service")]
    RateLimited,

    /// Response body did not match the expected shape
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// No answer within the allotted time
    #[error("request timed out")]
    Timeout,
}
