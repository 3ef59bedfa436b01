//! Cache of fetched segment geometry.

use std::sync::Arc;

use moka::future::Cache as MokaCache;

use crate::domain::Coordinate;
use crate::provider::RouteLeg;

/// Default maximum number of cached segments.
const DEFAULT_MAX_SEGMENTS: u64 = 10_000;

/// Decimal places kept when keying segments (~1m).
const KEY_PRECISION: i32 = 5;

/// Directed segment key: endpoints rounded to five decimal places.
///
/// Stops closer than the rounding step share geometry; direction matters
/// because street geometry is not reversible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentKey([i64; 4]);

impl SegmentKey {
    pub fn new(from: Coordinate, to: Coordinate) -> Self {
        let scale = 10f64.powi(KEY_PRECISION);
        let q = |v: f64| (v * scale).round() as i64;
        Self([q(from.lon), q(from.lat), q(to.lon), q(to.lat)])
    }
}

/// Segment geometry cache shared across route computations.
#[derive(Clone)]
pub struct GeometryCache {
    segments: MokaCache<SegmentKey, Arc<RouteLeg>>,
}

impl GeometryCache {
    pub fn new(max_capacity: u64) -> Self {
        Self {
            segments: MokaCache::builder().max_capacity(max_capacity).build(),
        }
    }

    pub async fn get(&self, key: &SegmentKey) -> Option<Arc<RouteLeg>> {
        self.segments.get(key).await
    }

    pub async fn insert(&self, key: SegmentKey, leg: Arc<RouteLeg>) {
        self.segments.insert(key, leg).await;
    }

    pub fn entry_count(&self) -> u64 {
        self.segments.entry_count()
    }

    pub fn invalidate_all(&self) {
        self.segments.invalidate_all();
    }
}

impl Default for GeometryCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SEGMENTS)
    }
}
