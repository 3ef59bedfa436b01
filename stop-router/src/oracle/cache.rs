//! In-memory cache of resolved stop-pair distances.

use moka::future::Cache as MokaCache;

use crate::domain::StopId;

/// Default maximum number of cached pairs.
const DEFAULT_MAX_PAIRS: u64 = 200_000;

/// Unordered stop pair. `PairKey::new(a, b) == PairKey::new(b, a)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairKey(StopId, StopId);

impl PairKey {
    pub fn new(a: &StopId, b: &StopId) -> Self {
        if a <= b {
            Self(a.clone(), b.clone())
        } else {
            Self(b.clone(), a.clone())
        }
    }
}

/// Distance cache shared by every graph build in the session.
///
/// Entries never expire by age; the same pair always resolves to the same
/// value, so concurrent inserts for one key are harmless.
#[derive(Clone)]
pub struct DistanceCache {
    pairs: MokaCache<PairKey, f64>,
}

impl DistanceCache {
    pub fn new(max_capacity: u64) -> Self {
        Self {
            pairs: MokaCache::builder().max_capacity(max_capacity).build(),
        }
    }

    /// Cached distance for the pair, in either order.
    pub async fn get(&self, a: &StopId, b: &StopId) -> Option<f64> {
        self.pairs.get(&PairKey::new(a, b)).await
    }

    pub async fn insert(&self, a: &StopId, b: &StopId, meters: f64) {
        self.pairs.insert(PairKey::new(a, b), meters).await;
    }

    /// Approximate number of cached pairs.
    pub fn entry_count(&self) -> u64 {
        self.pairs.entry_count()
    }

    pub fn invalidate_all(&self) {
        self.pairs.invalidate_all();
    }
}

impl Default for DistanceCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PAIRS)
    }
}
