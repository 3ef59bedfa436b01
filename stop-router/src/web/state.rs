//! Application state for the web layer.

use std::sync::Arc;

use crate::oracle::DistanceModel;
use crate::osrm::OsrmClient;
use crate::router::Router;
use crate::stops::StopSet;
use crate::store::FileStore;

/// The router as wired by the server: OSRM behind both the remote oracle and
/// the geometry assembler, with the graph persisted to disk.
pub type StopRouter = Router<DistanceModel<OsrmClient>, OsrmClient, FileStore>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Route computation pipeline and its caches
    pub router: Arc<StopRouter>,

    /// Current stop list
    pub stops: StopSet,
}

impl AppState {
    pub fn new(router: StopRouter, stops: StopSet) -> Self {
        Self {
            router: Arc::new(router),
            stops,
        }
    }
}
