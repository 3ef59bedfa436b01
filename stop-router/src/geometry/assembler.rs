//! Stitches per-edge street geometry into one route.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::{Stop, StopIndex};
use crate::limiter::{RateLimit, RateLimiter};
use crate::provider::{Overview, RouteLeg, RouteProvider};
use crate::solver::RoutePath;

use super::RouteResult;
use super::cache::{GeometryCache, SegmentKey};

/// Default per-segment timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds a [`RouteResult`] from a stop path.
///
/// Segments are requested one at a time with a pause between requests by
/// default, which keeps the load on the public routing service low. A failed
/// segment is replaced with a straight line between its two stops.
pub struct GeometryAssembler<P> {
    provider: P,
    cache: GeometryCache,
    limiter: RateLimiter,
    timeout: Duration,
}

impl<P: RouteProvider> GeometryAssembler<P> {
    /// Create an assembler with the default pacing (sequential, 150ms apart).
    pub fn new(provider: P, cache: GeometryCache) -> Self {
        Self {
            provider,
            cache,
            limiter: RateLimiter::new(RateLimit::geometry()),
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

    pub fn cache(&self) -> &GeometryCache {
        &self.cache
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Fetch geometry for one directed segment and cache it on success.
    async fn fetch_segment(&self, from: &Stop, to: &Stop) -> Option<Arc<RouteLeg>> {
        let response = self
            .provider
            .route_within(from.coordinate(), to.coordinate(), Overview::Full, self.timeout)
            .await;

        let leg = match response {
            Ok(Some(leg)) if !leg.coordinates.is_empty() => leg,
            Ok(_) => {
                debug!(from = %from.id, to = %to.id, "No geometry for segment");
                return None;
            }
            Err(e) => {
                debug!(from = %from.id, to = %to.id, error = %e, "Segment geometry lookup failed");
                return None;
            }
        };

        let leg = Arc::new(leg);
        let key = SegmentKey::new(from.coordinate(), to.coordinate());
        self.cache.insert(key, Arc::clone(&leg)).await;
        Some(leg)
    }

    /// Assemble the route geometry for `path`.
    ///
    /// Joints are not duplicated: every segment after the first drops its
    /// first coordinate, which repeats the previous segment's last one.
    pub async fn assemble(&self, path: &RoutePath, stops: &StopIndex<'_>) -> RouteResult {
        if path.is_empty() {
            return RouteResult::empty();
        }

        let mut pairs: Vec<(&Stop, &Stop)> = Vec::with_capacity(path.len().saturating_sub(1));
        for (a, b) in path.edges() {
            match (stops.get(a), stops.get(b)) {
                (Some(from), Some(to)) => pairs.push((from, to)),
                _ => warn!(from = %a, to = %b, "Path references an unknown stop, skipping segment"),
            }
        }

        let mut result = RouteResult {
            stop_count: path.len(),
            ..RouteResult::default()
        };

        if pairs.is_empty() {
            if let Some(stop) = path.stops.first().and_then(|id| stops.get(id)) {
                result.coordinates.push(stop.coordinate());
            }
            return result;
        }

        // Cache hits don't count against the rate limit
        let mut legs = Vec::with_capacity(pairs.len());
        let mut misses = Vec::new();
        for (i, (from, to)) in pairs.iter().enumerate() {
            let key = SegmentKey::new(from.coordinate(), to.coordinate());
            let cached = self.cache.get(&key).await;
            if cached.is_none() {
                misses.push(i);
            }
            legs.push(cached);
        }

        let fetched = self
            .limiter
            .run(misses.iter().copied(), |i| {
                let (from, to) = pairs[i];
                async move { (i, self.fetch_segment(from, to).await) }
            })
            .await;
        for (i, leg) in fetched {
            legs[i] = leg;
        }

        for (i, ((from, to), leg)) in pairs.iter().zip(legs).enumerate() {
            match leg {
                Some(leg) => {
                    let skip = usize::from(!result.coordinates.is_empty());
                    result
                        .coordinates
                        .extend(leg.coordinates.iter().skip(skip).copied());
                    result.distance_meters += leg.distance_meters;
                    result.duration_seconds += leg.duration_seconds;
                }
                None => {
                    warn!(
                        segment = i + 1,
                        from = %from.id,
                        to = %to.id,
                        "Segment geometry unavailable, using straight line"
                    );
                    if result.coordinates.is_empty() {
                        result.coordinates.push(from.coordinate());
                    }
                    result.coordinates.push(to.coordinate());
                    result.fallback_segments += 1;
                }
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::Mutex;

    use tokio::time::Instant;

    use crate::domain::{Coordinate, StopId};
    use crate::osrm::RemoteError;

    /// Mock provider with canned geometry per directed segment.
    struct MockProvider {
        legs: HashMap<SegmentKey, RouteLeg>,
        call_count: Mutex<usize>,
    }

    impl MockProvider {
        fn new() -> Self {
            Self {
                legs: HashMap::new(),
                call_count: Mutex::new(0),
            }
        }

        fn with_leg(mut self, from: &Stop, to: &Stop, coords: &[Coordinate], meters: f64) -> Self {
            self.legs.insert(
                SegmentKey::new(from.coordinate(), to.coordinate()),
                RouteLeg {
                    coordinates: coords.to_vec(),
                    distance_meters: meters,
                    duration_seconds: meters / 10.0,
                },
            );
            self
        }

        fn calls(&self) -> usize {
            *self.call_count.lock().unwrap()
        }
    }

    impl RouteProvider for MockProvider {
        async fn route(
            &self,
            from: Coordinate,
            to: Coordinate,
            _overview: Overview,
        ) -> Result<Option<RouteLeg>, RemoteError> {
            *self.call_count.lock().unwrap() += 1;
            self.legs
                .get(&SegmentKey::new(from, to))
                .cloned()
                .map(Some)
                .ok_or(RemoteError::Timeout)
        }
    }

    fn p(i: u32) -> Coordinate {
        Coordinate::new(-15.8 - f64::from(i) * 0.001, -47.9)
    }

    fn stops() -> Vec<Stop> {
        vec![
            Stop::new("A", -15.800, -47.900, "A"),
            Stop::new("B", -15.802, -47.900, "B"),
            Stop::new("C", -15.803, -47.900, "C"),
        ]
    }

    fn path(ids: &[&str]) -> RoutePath {
        RoutePath {
            stops: ids.iter().map(|s| StopId::new(*s)).collect(),
            cost: 0.0,
        }
    }

    fn assembler(provider: MockProvider) -> GeometryAssembler<MockProvider> {
        GeometryAssembler::new(provider, GeometryCache::default())
            .with_rate_limit(RateLimit::sequential(Duration::ZERO))
    }

    #[tokio::test]
    async fn stitches_without_duplicate_joints() {
        let s = stops();
        let provider = MockProvider::new()
            .with_leg(&s[0], &s[1], &[p(0), p(1), p(2)], 300.0)
            .with_leg(&s[1], &s[2], &[p(2), p(3)], 120.0);
        let assembler = assembler(provider);

        let result = assembler.assemble(&path(&["A", "B", "C"]), &StopIndex::new(&s)).await;

        assert_eq!(result.coordinates, vec![p(0), p(1), p(2), p(3)]);
        assert_eq!(result.distance_meters, 420.0);
        assert_eq!(result.duration_seconds, 42.0);
        assert_eq!(result.stop_count, 3);
        assert_eq!(result.fallback_segments, 0);
    }

    #[tokio::test]
    async fn failed_segment_falls_back_to_straight_line() {
        let s = stops();
        let provider = MockProvider::new().with_leg(&s[0], &s[1], &[p(0), p(1), p(2)], 300.0);
        let assembler = assembler(provider);

        let result = assembler.assemble(&path(&["A", "B", "C"]), &StopIndex::new(&s)).await;

        assert_eq!(result.coordinates, vec![p(0), p(1), p(2), s[2].coordinate()]);
        // The straight segment adds nothing to the totals
        assert_eq!(result.distance_meters, 300.0);
        assert_eq!(result.fallback_segments, 1);
    }

    #[tokio::test]
    async fn failed_first_segment_includes_both_stops() {
        let s = stops();
        let provider = MockProvider::new().with_leg(&s[1], &s[2], &[p(2), p(3)], 120.0);
        let assembler = assembler(provider);

        let result = assembler.assemble(&path(&["A", "B", "C"]), &StopIndex::new(&s)).await;

        assert_eq!(result.coordinates, vec![s[0].coordinate(), s[1].coordinate(), p(3)]);
        assert_eq!(result.fallback_segments, 1);
    }

    #[tokio::test]
    async fn repeated_edges_come_from_cache() {
        let s = stops();
        let provider = MockProvider::new()
            .with_leg(&s[0], &s[1], &[p(0), p(2)], 200.0)
            .with_leg(&s[1], &s[2], &[p(2), p(3)], 100.0);
        let assembler = assembler(provider);
        let index = StopIndex::new(&s);

        let first = assembler.assemble(&path(&["A", "B", "C"]), &index).await;
        let second = assembler.assemble(&path(&["A", "B", "C"]), &index).await;

        assert_eq!(first, second);
        assert_eq!(assembler.provider.calls(), 2);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let s = stops();
        let assembler = assembler(MockProvider::new());
        let index = StopIndex::new(&s);

        assembler.assemble(&path(&["A", "B"]), &index).await;
        assembler.assemble(&path(&["A", "B"]), &index).await;

        assert_eq!(assembler.provider.calls(), 2);
    }

    #[tokio::test]
    async fn empty_path_gives_empty_result() {
        let s = stops();
        let assembler = assembler(MockProvider::new());
        let result = assembler.assemble(&RoutePath::empty(), &StopIndex::new(&s)).await;
        assert!(result.is_empty());
        assert_eq!(result.stop_count, 0);
    }

    #[tokio::test]
    async fn single_stop_path() {
        let s = stops();
        let assembler = assembler(MockProvider::new());
        let result = assembler.assemble(&path(&["B"]), &StopIndex::new(&s)).await;

        assert_eq!(result.coordinates, vec![s[1].coordinate()]);
        assert_eq!(result.stop_count, 1);
        assert_eq!(assembler.provider.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn segments_are_paced() {
        let s = vec![
            Stop::new("A", -15.800, -47.900, "A"),
            Stop::new("B", -15.801, -47.900, "B"),
            Stop::new("C", -15.802, -47.900, "C"),
            Stop::new("D", -15.803, -47.900, "D"),
        ];
        let assembler = GeometryAssembler::new(MockProvider::new(), GeometryCache::default());

        let start = Instant::now();
        let result = assembler
            .assemble(&path(&["A", "B", "C", "D"]), &StopIndex::new(&s))
            .await;

        // Three segments, 150ms between consecutive requests
        assert_eq!(start.elapsed(), Duration::from_millis(300));
        assert_eq!(result.fallback_segments, 3);
        assert_eq!(result.coordinates.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn pacing_spans_route_computations() {
        let s = stops();
        let provider = MockProvider::new()
            .with_leg(&s[0], &s[1], &[p(0), p(2)], 200.0)
            .with_leg(&s[1], &s[2], &[p(2), p(3)], 100.0);
        let assembler = GeometryAssembler::new(provider, GeometryCache::default());
        let index = StopIndex::new(&s);
        let start = Instant::now();

        assembler.assemble(&path(&["A", "B"]), &index).await;
        assert_eq!(start.elapsed(), Duration::ZERO);

        // A separate route still waits out the delay after the last request
        assembler.assemble(&path(&["B", "C"]), &index).await;
        assert_eq!(start.elapsed(), Duration::from_millis(150));

        // Cached segments are not paced
        assembler.assemble(&path(&["A", "B", "C"]), &index).await;
        assert_eq!(start.elapsed(), Duration::from_millis(150));
        assert_eq!(assembler.provider.calls(), 2);
    }
}
