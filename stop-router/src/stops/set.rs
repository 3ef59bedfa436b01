//! Shared, refreshable stop list.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::Stop;

use super::client::OverpassClient;
use super::error::StopSourceError;
use super::file::StopFile;

/// Where the stop list comes from.
#[derive(Debug, Clone)]
pub enum StopSource {
    Overpass(OverpassClient),
    File(StopFile),
    /// A fixed list, for tests and offline use
    Static(Vec<Stop>),
}

impl StopSource {
    pub async fn fetch(&self) -> Result<Vec<Stop>, StopSourceError> {
        match self {
            StopSource::Overpass(client) => client.fetch_all().await,
            StopSource::File(file) => file.load().await,
            StopSource::Static(stops) => Ok(stops.clone()),
        }
    }
}

/// Thread-safe stop list with support for refresh.
///
/// Readers take a cheap snapshot; a refresh swaps the whole list at once, so
/// a route computation never observes a half-updated set.
#[derive(Clone)]
pub struct StopSet {
    inner: Arc<RwLock<Arc<Vec<Stop>>>>,
    source: Arc<StopSource>,
}

impl StopSet {
    /// Fetch the initial list. Fails if the source is unavailable.
    pub async fn load(source: StopSource) -> Result<Self, StopSourceError> {
        let stops = source.fetch().await?;
        Ok(Self {
            inner: Arc::new(RwLock::new(Arc::new(stops))),
            source: Arc::new(source),
        })
    }

    /// A set preloaded with `stops`; `source` is used for later refreshes.
    pub fn with_stops(source: StopSource, stops: Vec<Stop>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(stops))),
            source: Arc::new(source),
        }
    }

    /// An empty set that can be filled later with [`StopSet::refresh`].
    pub fn empty(source: StopSource) -> Self {
        Self::with_stops(source, Vec::new())
    }

    pub async fn snapshot(&self) -> Arc<Vec<Stop>> {
        Arc::clone(&*self.inner.read().await)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Refetch from the source.
    ///
    /// On success, replaces the current list. On failure, the existing list is
    /// preserved and the error is returned.
    pub async fn refresh(&self) -> Result<usize, StopSourceError> {
        let stops = self.source.fetch().await?;
        let count = stops.len();

        let mut guard = self.inner.write().await;
        *guard = Arc::new(stops);

        Ok(count)
    }
}
