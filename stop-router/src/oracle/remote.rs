//! Street-distance oracle backed by the routing service.

use std::time::Duration;

use tracing::{debug, trace};

use crate::domain::Stop;
use crate::limiter::{RateLimit, RateLimiter};
use crate::provider::{Overview, RouteProvider};

use super::cache::DistanceCache;
use super::{DistanceModelKind, DistanceOracle};

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Distance oracle that asks the routing service for street distances.
///
/// Each unordered pair costs at most one successful lookup per session: the
/// result is cached for both orders. Failures and timeouts resolve to
/// `None` (unreachable) and are not cached, so a later build may retry.
pub struct RemoteDistance<P> {
    provider: P,
    cache: DistanceCache,
    limiter: RateLimiter,
    timeout: Duration,
}

impl<P: RouteProvider> RemoteDistance<P> {
    /// Create an oracle with the default pacing (groups of 5, 50ms apart).
    pub fn new(provider: P, cache: DistanceCache) -> Self {
        Self {
            provider,
            cache,
            limiter: RateLimiter::new(RateLimit::graph_edges()),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_rate_limit(mut self, policy: RateLimit) -> Self {
        self.limiter = RateLimiter::new(policy);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn cache(&self) -> &DistanceCache {
        &self.cache
    }

    async fn fetch(&self, from: &Stop, to: &Stop) -> Option<f64> {
        let response = self
            .provider
            .route_within(from.coordinate(), to.coordinate(), Overview::None, self.timeout)
            .await;

        match response {
            Ok(Some(leg)) if leg.distance_meters.is_finite() && leg.distance_meters >= 0.0 => {
                Some(leg.distance_meters)
            }
            Ok(Some(leg)) => {
                debug!(
                    from = %from.id,
                    to = %to.id,
                    distance = leg.distance_meters,
                    "Discarding invalid street distance"
                );
                None
            }
            Ok(None) => {
                trace!(from = %from.id, to = %to.id, "No street route between stops");
                None
            }
            Err(e) => {
                debug!(from = %from.id, to = %to.id, error = %e, "Street distance lookup failed");
                None
            }
        }
    }
}

impl<P: RouteProvider> DistanceOracle for RemoteDistance<P> {
    async fn distance(&self, from: &Stop, to: &Stop) -> Option<f64> {
        if let Some(cached) = self.cache.get(&from.id, &to.id).await {
            return Some(cached);
        }

        let meters = self.fetch(from, to).await?;
        self.cache.insert(&from.id, &to.id, meters).await;
        Some(meters)
    }

    async fn distances_from(&self, source: &Stop, targets: &[&Stop]) -> Vec<Option<f64>> {
        // Cache hits don't count against the rate limit
        let mut results = vec![None; targets.len()];
        let mut misses = Vec::new();
        for (i, target) in targets.iter().enumerate() {
            match self.cache.get(&source.id, &target.id).await {
                Some(hit) => results[i] = Some(hit),
                None => misses.push(i),
            }
        }

        let fetched = self
            .limiter
            .run(misses.iter().copied(), |i| async move {
                (i, self.distance(source, targets[i]).await)
            })
            .await;

        for (i, meters) in fetched {
            results[i] = meters;
        }
        results
    }

    fn kind(&self) -> DistanceModelKind {
        DistanceModelKind::Remote
    }

    fn clear_cache(&self) {
        self.cache.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::Mutex;

    use crate::domain::Coordinate;
    use crate::osrm::RemoteError;
    use crate::provider::RouteLeg;

    /// Mock provider answering by destination longitude.
    struct MockProvider {
        distances: HashMap<String, Option<f64>>,
        failing: Vec<String>,
        call_count: Mutex<usize>,
    }

    impl MockProvider {
        fn new() -> Self {
            Self {
                distances: HashMap::new(),
                failing: Vec::new(),
                call_count: Mutex::new(0),
            }
        }

        fn key(c: Coordinate) -> String {
            format!("{:.3}", c.lon)
        }

        fn answer(mut self, to_lon: f64, meters: Option<f64>) -> Self {
            self.distances.insert(format!("{to_lon:.3}"), meters);
            self
        }

        fn fail(mut self, to_lon: f64) -> Self {
            self.failing.push(format!("{to_lon:.3}"));
            self
        }

        fn calls(&self) -> usize {
            *self.call_count.lock().unwrap()
        }
    }

    impl RouteProvider for MockProvider {
        async fn route(
            &self,
            _from: Coordinate,
            to: Coordinate,
            _overview: Overview,
        ) -> Result<Option<RouteLeg>, RemoteError> {
            *self.call_count.lock().unwrap() += 1;
            let key = Self::key(to);
            if self.failing.contains(&key) {
                return Err(RemoteError::Api {
                    status: 503,
                    message: "unavailable".into(),
                });
            }
            Ok(self.distances.get(&key).copied().flatten().map(|d| RouteLeg {
                coordinates: Vec::new(),
                distance_meters: d,
                duration_seconds: d / 10.0,
            }))
        }
    }

    fn stop(id: &str, lon: f64) -> Stop {
        Stop::new(id, -15.8, lon, id)
    }

    fn oracle(provider: MockProvider) -> RemoteDistance<MockProvider> {
        RemoteDistance::new(provider, DistanceCache::default())
            .with_rate_limit(RateLimit::unlimited(5))
    }

    #[tokio::test]
    async fn caches_both_orders() {
        let a = stop("a", -47.900);
        let b = stop("b", -47.901);
        let provider = MockProvider::new().answer(-47.901, Some(180.0)).answer(-47.900, Some(999.0));
        let oracle = oracle(provider);

        assert_eq!(oracle.distance(&a, &b).await, Some(180.0));
        // Reverse order hits the cache even though the provider would answer differently
        assert_eq!(oracle.distance(&b, &a).await, Some(180.0));
        assert_eq!(oracle.distance(&a, &b).await, Some(180.0));
        assert_eq!(oracle.provider.calls(), 1);
    }

    #[tokio::test]
    async fn failure_is_unreachable_and_not_cached() {
        let a = stop("a", -47.900);
        let b = stop("b", -47.901);
        let oracle = oracle(MockProvider::new().fail(-47.901));

        assert_eq!(oracle.distance(&a, &b).await, None);
        assert_eq!(oracle.distance(&a, &b).await, None);
        assert_eq!(oracle.provider.calls(), 2);
    }

    #[tokio::test]
    async fn no_route_is_unreachable() {
        let a = stop("a", -47.900);
        let b = stop("b", -47.901);
        let oracle = oracle(MockProvider::new().answer(-47.901, None));

        assert_eq!(oracle.distance(&a, &b).await, None);
    }

    #[tokio::test]
    async fn invalid_distance_is_discarded() {
        let a = stop("a", -47.900);
        let b = stop("b", -47.901);
        let oracle = oracle(MockProvider::new().answer(-47.901, Some(f64::NAN)));

        assert_eq!(oracle.distance(&a, &b).await, None);
    }

    #[tokio::test]
    async fn batch_skips_cached_pairs() {
        let a = stop("a", -47.900);
        let b = stop("b", -47.901);
        let c = stop("c", -47.902);
        let d = stop("d", -47.903);
        let provider = MockProvider::new()
            .answer(-47.901, Some(100.0))
            .answer(-47.902, Some(200.0))
            .fail(-47.903);
        let oracle = oracle(provider);

        oracle.distance(&a, &b).await;
        assert_eq!(oracle.provider.calls(), 1);

        let results = oracle.distances_from(&a, &[&b, &c, &d]).await;

        assert_eq!(results, vec![Some(100.0), Some(200.0), None]);
        assert_eq!(oracle.provider.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_provider_times_out() {
        struct SlowProvider;

        impl RouteProvider for SlowProvider {
            async fn route(
                &self,
                _from: Coordinate,
                _to: Coordinate,
                _overview: Overview,
            ) -> Result<Option<RouteLeg>, RemoteError> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(None)
            }
        }

        let oracle = RemoteDistance::new(SlowProvider, DistanceCache::default())
            .with_timeout(Duration::from_secs(1));
        let a = stop("a", -47.900);
        let b = stop("b", -47.901);

        assert_eq!(oracle.distance(&a, &b).await, None);
    }
}
