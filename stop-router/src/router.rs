//! The routing pipeline.
//!
//! `route(stops, start, end)` runs the stages in order:
//!
//! ```text
//! Idle → BuildingGraph → Solving → AssemblingGeometry → Done
//!                                 ↘ Failed(NoRouteFound)
//! ```
//!
//! An empty stop list is rejected up front and never enters a stage.
//!
//! Transient I/O failures never fail the pipeline. They degrade the result
//! instead: a missing edge while building, a straight segment while
//! assembling, a rebuild when the persisted graph is unreadable.

use std::fmt;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::domain::{Stop, StopId, StopIndex};
use crate::geometry::{GeometryAssembler, GeometryCache, RouteResult};
use crate::graph::{Fingerprint, Graph, GraphBuilder, GraphConfig};
use crate::graph_cache::GraphCache;
use crate::limiter::RateLimit;
use crate::oracle::{
    DirectDistance, DistanceCache, DistanceModel, DistanceModelKind, DistanceOracle, RemoteDistance,
};
use crate::provider::RouteProvider;
use crate::solver::shortest_path;
use crate::store::KeyValueStore;

/// Errors surfaced by [`Router::route`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RouteError {
    /// No stops were supplied
    #[error("no stops supplied")]
    EmptyInput,

    /// The destination cannot be reached from the start (or either is unknown)
    #[error("no route found from {start} to {end}")]
    NoRouteFound { start: StopId, end: StopId },
}

/// Pipeline stage of a single route computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteStage {
    Idle,
    BuildingGraph,
    Solving,
    AssemblingGeometry,
    Done,
    Failed,
}

impl fmt::Display for RouteStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RouteStage::Idle => "idle",
            RouteStage::BuildingGraph => "building_graph",
            RouteStage::Solving => "solving",
            RouteStage::AssemblingGeometry => "assembling_geometry",
            RouteStage::Done => "done",
            RouteStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Configuration for the routing pipeline.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Proximity graph parameters.
    pub graph: GraphConfig,

    /// Which distance model weights the graph.
    pub model: DistanceModelKind,

    /// Pacing for edge-weight lookups (remote model only).
    pub edge_rate_limit: RateLimit,

    /// Pacing for segment geometry lookups.
    pub geometry_rate_limit: RateLimit,

    /// Timeout for a single remote lookup.
    pub remote_timeout: Duration,

    /// Optional age limit for the persisted graph.
    pub cache_max_age: Option<Duration>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            graph: GraphConfig::default(),
            model: DistanceModelKind::Direct,
            edge_rate_limit: RateLimit::graph_edges(),
            geometry_rate_limit: RateLimit::geometry(),
            remote_timeout: Duration::from_secs(10),
            cache_max_age: None,
        }
    }
}

/// Computes routes between stops.
///
/// Owns the session-scoped caches: the oracle's distance cache, the geometry
/// cache, and the persisted graph cache. Nothing else survives a request.
pub struct Router<O, P, S> {
    oracle: O,
    graph_cache: GraphCache<S>,
    assembler: GeometryAssembler<P>,
    graph_config: GraphConfig,
}

impl<P, S> Router<DistanceModel<P>, P, S>
where
    P: RouteProvider + Clone,
    S: KeyValueStore,
{
    /// Wire up a router from configuration, sharing one routing service
    /// client between the distance oracle and the geometry assembler.
    pub fn from_config(config: &RouterConfig, provider: P, store: S) -> Self {
        let oracle = match config.model {
            DistanceModelKind::Direct => DistanceModel::Direct(DirectDistance),
            DistanceModelKind::Remote => DistanceModel::Remote(
                RemoteDistance::new(provider.clone(), DistanceCache::default())
                    .with_rate_limit(config.edge_rate_limit)
                    .with_timeout(config.remote_timeout),
            ),
        };
        let graph_cache =
            GraphCache::new(store, config.model).with_max_age(config.cache_max_age);
        let assembler = GeometryAssembler::new(provider, GeometryCache::default())
            .with_rate_limit(config.geometry_rate_limit)
            .with_timeout(config.remote_timeout);

        Self::new(oracle, graph_cache, assembler, config.graph.clone())
    }
}

impl<O, P, S> Router<O, P, S>
where
    O: DistanceOracle,
    P: RouteProvider,
    S: KeyValueStore,
{
    pub fn new(
        oracle: O,
        graph_cache: GraphCache<S>,
        assembler: GeometryAssembler<P>,
        graph_config: GraphConfig,
    ) -> Self {
        Self {
            oracle,
            graph_cache,
            assembler,
            graph_config,
        }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn graph_config(&self) -> &GraphConfig {
        &self.graph_config
    }

    /// The proximity graph for `stops`, from the persisted cache when its
    /// fingerprint matches, otherwise freshly built and persisted.
    pub async fn graph_for(&self, stops: &[Stop]) -> Graph {
        let fingerprint = Fingerprint::of(stops);

        if let Some(graph) = self.graph_cache.get(&fingerprint) {
            return graph;
        }

        info!(stops = stops.len(), model = %self.oracle.kind(), "Building proximity graph");
        let graph = GraphBuilder::new(&self.oracle, &self.graph_config)
            .build(stops)
            .await;

        if let Err(e) = self.graph_cache.put(&fingerprint, &graph) {
            warn!(error = %e, "Failed to persist proximity graph");
        }

        graph
    }

    /// Compute the route from `start` to `end` over `stops`.
    ///
    /// Returns [`RouteError::EmptyInput`] when `stops` is empty. That check
    /// runs before the pipeline starts, so no I/O happens and the route stays
    /// `Idle` rather than moving to `Failed`. Returns
    /// [`RouteError::NoRouteFound`] when the solver finds no path.
    pub async fn route(
        &self,
        stops: &[Stop],
        start: &StopId,
        end: &StopId,
    ) -> Result<RouteResult, RouteError> {
        let mut stage = RouteStage::Idle;
        self.run_stages(stops, start, end, |next| {
            debug!(from = %stage, to = %next, %start, %end, "Route stage");
            stage = next;
        })
        .await
    }

    async fn run_stages(
        &self,
        stops: &[Stop],
        start: &StopId,
        end: &StopId,
        mut advance: impl FnMut(RouteStage) + Send,
    ) -> Result<RouteResult, RouteError> {
        if stops.is_empty() {
            return Err(RouteError::EmptyInput);
        }

        advance(RouteStage::BuildingGraph);
        let graph = self.graph_for(stops).await;

        advance(RouteStage::Solving);
        let path = shortest_path(&graph, start, end);
        if path.is_empty() {
            advance(RouteStage::Failed);
            info!(%start, %end, "No route found");
            return Err(RouteError::NoRouteFound {
                start: start.clone(),
                end: end.clone(),
            });
        }
        debug!(stops = path.len(), cost = path.cost, "Path found");

        advance(RouteStage::AssemblingGeometry);
        let index = StopIndex::new(stops);
        let result = self.assembler.assemble(&path, &index).await;

        advance(RouteStage::Done);
        info!(
            stops = result.stop_count,
            points = result.coordinates.len(),
            km = result.distance_meters / 1000.0,
            fallback_segments = result.fallback_segments,
            "Route computed"
        );

        Ok(result)
    }

    /// Drop every cache: distances, segment geometry and the persisted graph.
    pub fn clear_caches(&self) {
        self.oracle.clear_cache();
        self.assembler.cache().invalidate_all();
        if let Err(e) = self.graph_cache.clear() {
            warn!(error = %e, "Failed to remove persisted graph");
        }
        info!("All caches cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::domain::Coordinate;
    use crate::osrm::RemoteError;
    use crate::provider::{Overview, RouteLeg};
    use crate::store::MemoryStore;

    /// Straight-line oracle that counts lookups.
    #[derive(Default)]
    struct CountingOracle {
        calls: AtomicUsize,
    }

    impl DistanceOracle for CountingOracle {
        async fn distance(&self, from: &Stop, to: &Stop) -> Option<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Some(from.distance_to(to))
        }

        fn kind(&self) -> DistanceModelKind {
            DistanceModelKind::Direct
        }
    }

    /// Provider returning a straight two-point leg for every request.
    #[derive(Clone, Default)]
    struct LineProvider {
        calls: Arc<AtomicUsize>,
    }

    impl RouteProvider for LineProvider {
        async fn route(
            &self,
            from: Coordinate,
            to: Coordinate,
            _overview: Overview,
        ) -> Result<Option<RouteLeg>, RemoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let meters = from.distance_to(&to);
            Ok(Some(RouteLeg {
                coordinates: vec![from, to],
                distance_meters: meters,
                duration_seconds: meters / 8.0,
            }))
        }
    }

    fn stops() -> Vec<Stop> {
        vec![
            Stop::new("1", -15.800, -47.900, "One"),
            Stop::new("2", -15.801, -47.901, "Two"),
            Stop::new("3", -15.810, -47.950, "Three"),
            Stop::new("4", -15.802, -47.902, "Four"),
        ]
    }

    fn router(
        store: Arc<MemoryStore>,
    ) -> Router<CountingOracle, LineProvider, Arc<MemoryStore>> {
        Router::new(
            CountingOracle::default(),
            GraphCache::new(store, DistanceModelKind::Direct),
            GeometryAssembler::new(LineProvider::default(), GeometryCache::default())
                .with_rate_limit(RateLimit::unlimited(1)),
            GraphConfig::new(2, 1500.0),
        )
    }

    fn fetches(router: &Router<CountingOracle, LineProvider, Arc<MemoryStore>>) -> usize {
        router.assembler.provider().calls.load(Ordering::SeqCst)
    }

    fn id(s: &str) -> StopId {
        StopId::new(s)
    }

    #[tokio::test]
    async fn empty_input_short_circuits() {
        let router = router(Arc::new(MemoryStore::new()));
        let result = router.route(&[], &id("1"), &id("2")).await;

        assert_eq!(result, Err(RouteError::EmptyInput));
        assert_eq!(router.oracle.calls.load(Ordering::SeqCst), 0);
        assert_eq!(fetches(&router), 0);
    }

    #[tokio::test]
    async fn stage_transitions() {
        let router = router(Arc::new(MemoryStore::new()));
        let stops = stops();

        let mut seen = Vec::new();
        let result = router
            .run_stages(&[], &id("1"), &id("2"), |s| seen.push(s))
            .await;
        assert_eq!(result, Err(RouteError::EmptyInput));
        assert!(seen.is_empty());

        let mut seen = Vec::new();
        let result = router
            .run_stages(&stops, &id("1"), &id("4"), |s| seen.push(s))
            .await;
        assert!(result.is_ok());
        assert_eq!(
            seen,
            vec![
                RouteStage::BuildingGraph,
                RouteStage::Solving,
                RouteStage::AssemblingGeometry,
                RouteStage::Done,
            ]
        );

        let mut seen = Vec::new();
        let result = router
            .run_stages(&stops, &id("1"), &id("missing"), |s| seen.push(s))
            .await;
        assert!(matches!(result, Err(RouteError::NoRouteFound { .. })));
        assert_eq!(
            seen,
            vec![RouteStage::BuildingGraph, RouteStage::Solving, RouteStage::Failed]
        );
    }

    #[tokio::test]
    async fn unreachable_destination_is_no_route() {
        let router = router(Arc::new(MemoryStore::new()));
        let result = router.route(&stops(), &id("1"), &id("3")).await;

        assert_eq!(
            result,
            Err(RouteError::NoRouteFound {
                start: id("1"),
                end: id("3")
            })
        );
    }

    #[tokio::test]
    async fn unknown_endpoint_is_no_route() {
        let router = router(Arc::new(MemoryStore::new()));
        let result = router.route(&stops(), &id("1"), &id("99")).await;
        assert!(matches!(result, Err(RouteError::NoRouteFound { .. })));
    }

    #[tokio::test]
    async fn route_between_connected_stops() {
        let router = router(Arc::new(MemoryStore::new()));
        let result = router.route(&stops(), &id("1"), &id("4")).await.unwrap();

        assert_eq!(result.coordinates.first(), Some(&stops()[0].coordinate()));
        assert_eq!(result.coordinates.last(), Some(&stops()[3].coordinate()));
        assert!(result.distance_meters > 0.0);
        assert_eq!(result.fallback_segments, 0);
    }

    #[tokio::test]
    async fn persisted_graph_is_reused() {
        let store = Arc::new(MemoryStore::new());
        let first = router(Arc::clone(&store));
        first.route(&stops(), &id("1"), &id("2")).await.unwrap();
        assert!(first.oracle.calls.load(Ordering::SeqCst) > 0);

        // A new router over the same store doesn't rebuild
        let second = router(Arc::clone(&store));
        let mut shuffled = stops();
        shuffled.reverse();
        second.route(&shuffled, &id("1"), &id("2")).await.unwrap();
        assert_eq!(second.oracle.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn corrupt_cache_forces_rebuild() {
        let store = Arc::new(MemoryStore::new());
        let router = router(Arc::clone(&store));
        store.set(router.graph_cache.key(), b"{not json").unwrap();

        let result = router.route(&stops(), &id("1"), &id("2")).await;

        assert!(result.is_ok());
        assert!(router.oracle.calls.load(Ordering::SeqCst) > 0);
        // Rebuilt graph replaced the corrupt entry
        assert!(router.graph_cache.load_entry().is_ok());
    }

    #[tokio::test]
    async fn clear_caches_forces_rebuild_and_refetch() {
        let router = router(Arc::new(MemoryStore::new()));
        router.route(&stops(), &id("1"), &id("2")).await.unwrap();
        let built_calls = router.oracle.calls.load(Ordering::SeqCst);
        let fetched = fetches(&router);

        router.route(&stops(), &id("1"), &id("2")).await.unwrap();
        assert_eq!(router.oracle.calls.load(Ordering::SeqCst), built_calls);
        assert_eq!(fetches(&router), fetched);

        router.clear_caches();
        router.route(&stops(), &id("1"), &id("2")).await.unwrap();
        assert_eq!(router.oracle.calls.load(Ordering::SeqCst), built_calls * 2);
        assert_eq!(fetches(&router), fetched * 2);
    }

    #[test]
    fn stage_display() {
        assert_eq!(RouteStage::BuildingGraph.to_string(), "building_graph");
        assert_eq!(RouteStage::AssemblingGeometry.to_string(), "assembling_geometry");
    }

    #[test]
    fn default_config() {
        let config = RouterConfig::default();
        assert_eq!(config.model, DistanceModelKind::Direct);
        assert_eq!(config.graph.max_neighbors, 12);
        assert_eq!(config.edge_rate_limit, RateLimit::graph_edges());
        assert_eq!(config.geometry_rate_limit, RateLimit::geometry());
        assert!(config.cache_max_age.is_none());
    }
}
