//! Great-circle distance oracle.

use crate::domain::Stop;

use super::{DistanceModelKind, DistanceOracle};

/// Deterministic straight-line distance. No I/O, nothing to cache.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectDistance;

impl DistanceOracle for DirectDistance {
    async fn distance(&self, from: &Stop, to: &Stop) -> Option<f64> {
        Some(from.distance_to(to))
    }

    async fn distances_from(&self, source: &Stop, targets: &[&Stop]) -> Vec<Option<f64>> {
        targets.iter().map(|t| Some(source.distance_to(t))).collect()
    }

    fn kind(&self) -> DistanceModelKind {
        DistanceModelKind::Direct
    }
}
