//! Stop source error types.

use std::path::PathBuf;

/// Errors that can occur while loading the stop list.
#[derive(Debug, thiserror::Error)]
pub enum StopSourceError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned an error status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response or file JSON
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// Every configured server failed; carries the last failure
    #[error("all {attempts} stop servers failed, last error: {last}")]
    AllServersFailed { attempts: usize, last: String },

    /// No servers configured
    #[error("no stop servers configured")]
    NoServers,

    /// Reading the stop file failed
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
