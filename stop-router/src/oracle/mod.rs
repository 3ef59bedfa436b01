//! Distance oracles: the travel cost between two stops.
//!
//! Two interchangeable strategies:
//! - [`DirectDistance`]: great-circle distance, no I/O.
//! - [`RemoteDistance`]: street distance from the routing service, cached per
//!   unordered stop pair and paced by a [`RateLimiter`](crate::limiter::RateLimiter).
//!
//! [`DistanceModel`] selects one of them at runtime.

mod cache;
mod direct;
mod remote;

use std::fmt;
use std::future::Future;
use std::str::FromStr;

pub use cache::{DistanceCache, PairKey};
pub use direct::DirectDistance;
pub use remote::RemoteDistance;

use crate::domain::Stop;
use crate::provider::RouteProvider;

/// Trait for producing the traversal cost between two stops.
///
/// `None` means the pair is unreachable (treated as infinite cost). Oracles
/// never surface transport errors to the caller.
pub trait DistanceOracle: Send + Sync {
    /// Cost in meters from `from` to `to`.
    fn distance(&self, from: &Stop, to: &Stop) -> impl Future<Output = Option<f64>> + Send;

    /// Costs from `source` to each of `targets`, in target order.
    ///
    /// The default resolves targets one at a time.
    fn distances_from(
        &self,
        source: &Stop,
        targets: &[&Stop],
    ) -> impl Future<Output = Vec<Option<f64>>> + Send {
        async move {
            let mut out = Vec::with_capacity(targets.len());
            for target in targets {
                out.push(self.distance(source, target).await);
            }
            out
        }
    }

    /// Which model produced the weights. Graphs built by different models are
    /// never interchangeable.
    fn kind(&self) -> DistanceModelKind;

    /// Drop any memoised distances.
    fn clear_cache(&self) {}
}

/// Selector for the distance strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceModelKind {
    /// Straight-line (great-circle) distance.
    #[default]
    Direct,
    /// Street distance from the routing service.
    Remote,
}

impl DistanceModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceModelKind::Direct => "direct",
            DistanceModelKind::Remote => "remote",
        }
    }
}

impl fmt::Display for DistanceModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown distance model name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown distance model {0:?} (expected \"direct\" or \"remote\")")]
pub struct InvalidDistanceModel(String);

impl FromStr for DistanceModelKind {
    type Err = InvalidDistanceModel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" | "haversine" | "straight" => Ok(DistanceModelKind::Direct),
            "remote" | "street" | "osrm" => Ok(DistanceModelKind::Remote),
            _ => Err(InvalidDistanceModel(s.to_string())),
        }
    }
}

/// Runtime choice between the two oracle strategies.
pub enum DistanceModel<P> {
    Direct(DirectDistance),
    Remote(RemoteDistance<P>),
}

impl<P: RouteProvider> DistanceOracle for DistanceModel<P> {
    async fn distance(&self, from: &Stop, to: &Stop) -> Option<f64> {
        match self {
            DistanceModel::Direct(oracle) => oracle.distance(from, to).await,
            DistanceModel::Remote(oracle) => oracle.distance(from, to).await,
        }
    }

    async fn distances_from(&self, source: &Stop, targets: &[&Stop]) -> Vec<Option<f64>> {
        match self {
            DistanceModel::Direct(oracle) => oracle.distances_from(source, targets).await,
            DistanceModel::Remote(oracle) => oracle.distances_from(source, targets).await,
        }
    }

    fn kind(&self) -> DistanceModelKind {
        match self {
            DistanceModel::Direct(oracle) => oracle.kind(),
            DistanceModel::Remote(oracle) => oracle.kind(),
        }
    }

    fn clear_cache(&self) {
        match self {
            DistanceModel::Direct(oracle) => oracle.clear_cache(),
            DistanceModel::Remote(oracle) => oracle.clear_cache(),
        }
    }
}
