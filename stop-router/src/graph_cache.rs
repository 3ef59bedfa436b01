//! Persisted proximity graph cache.
//!
//! A built graph is stored together with the fingerprint of the stop set it
//! was built from. A cached graph is reused only when the current stop set
//! has exactly the same fingerprint. Unreadable entries count as a miss: a
//! corrupt cache forces a rebuild, it never blocks routing.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::graph::{Fingerprint, Graph};
use crate::oracle::DistanceModelKind;
use crate::store::{KeyValueStore, StoreError};

/// Versioned storage key; the distance model is appended.
const CACHE_KEY_PREFIX: &str = "graph_cache_v1";

/// Persisted graph with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub graph: Graph,
    pub stops_fingerprint: Fingerprint,
    /// Unix milliseconds when the entry was written.
    pub timestamp: i64,
}

/// Errors from the graph cache.
#[derive(Debug, thiserror::Error)]
pub enum GraphCacheError {
    /// Stored bytes could not be decoded into a valid graph
    #[error("cached graph is corrupt: {message}")]
    Corrupt { message: String },

    /// Graph could not be encoded
    #[error("failed to encode graph: {message}")]
    Encode { message: String },

    /// Underlying store failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Graph cache over a key-value store.
pub struct GraphCache<S> {
    store: S,
    key: String,
    max_age: Option<Duration>,
}

impl<S: KeyValueStore> GraphCache<S> {
    /// Create a cache for graphs built with the given distance model.
    pub fn new(store: S, model: DistanceModelKind) -> Self {
        Self {
            store,
            key: format!("{CACHE_KEY_PREFIX}:{model}"),
            max_age: None,
        }
    }

    /// Also expire entries older than `max_age`. `None` (the default) keeps
    /// entries until the stop set changes.
    pub fn with_max_age(mut self, max_age: Option<Duration>) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read and decode the stored entry, whatever its fingerprint.
    pub fn load_entry(&self) -> Result<Option<CacheEntry>, GraphCacheError> {
        let Some(bytes) = self.store.get(&self.key)? else {
            return Ok(None);
        };

        let entry: CacheEntry =
            serde_json::from_slice(&bytes).map_err(|e| GraphCacheError::Corrupt {
                message: e.to_string(),
            })?;

        let invalid_weight = entry
            .graph
            .nodes()
            .flat_map(|n| entry.graph.neighbors(n))
            .any(|(_, w)| !w.is_finite() || w < 0.0);
        if invalid_weight {
            return Err(GraphCacheError::Corrupt {
                message: "graph contains an invalid edge weight".to_string(),
            });
        }

        Ok(Some(entry))
    }

    /// Cached graph for the stop set with this fingerprint, if any.
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<Graph> {
        let entry = match self.load_entry() {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                debug!(key = %self.key, "Graph cache empty");
                return None;
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Ignoring unreadable graph cache");
                return None;
            }
        };

        if &entry.stops_fingerprint != fingerprint {
            debug!(key = %self.key, "Graph cache built for a different stop set");
            return None;
        }

        if let Some(max_age) = self.max_age {
            let age_ms = Utc::now().timestamp_millis().saturating_sub(entry.timestamp);
            if age_ms < 0 || age_ms as u128 >= max_age.as_millis() {
                debug!(key = %self.key, age_ms, "Graph cache expired");
                return None;
            }
        }

        info!(
            key = %self.key,
            nodes = entry.graph.node_count(),
            "Using cached proximity graph"
        );
        Some(entry.graph)
    }

    /// Persist a graph for the stop set with this fingerprint.
    pub fn put(&self, fingerprint: &Fingerprint, graph: &Graph) -> Result<(), GraphCacheError> {
        let entry = CacheEntry {
            graph: graph.clone(),
            stops_fingerprint: fingerprint.clone(),
            timestamp: Utc::now().timestamp_millis(),
        };
        let bytes = serde_json::to_vec(&entry).map_err(|e| GraphCacheError::Encode {
            message: e.to_string(),
        })?;

        self.store.set(&self.key, &bytes)?;
        debug!(key = %self.key, bytes = bytes.len(), "Graph cache saved");
        Ok(())
    }

    /// Remove the persisted graph.
    pub fn clear(&self) -> Result<(), GraphCacheError> {
        self.store.remove(&self.key)?;
        Ok(())
    }
}
