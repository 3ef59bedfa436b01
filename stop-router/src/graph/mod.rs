//! Proximity graph over a stop set.
//!
//! Each stop is connected to at most `max_neighbors` of its nearest stops
//! within a straight-line cutoff; edge weights come from a
//! [`DistanceOracle`](crate::oracle::DistanceOracle).

mod builder;
mod config;
mod fingerprint;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::{Stop, StopId};

pub use builder::GraphBuilder;
pub use config::GraphConfig;
pub use fingerprint::Fingerprint;

/// Weighted adjacency map keyed by stop id.
///
/// Every stop of the set it was built from appears as a node, with an empty
/// neighbor map if nothing qualified. Weights are finite, nonnegative meters.
/// Iteration order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Graph {
    adjacency: HashMap<StopId, HashMap<StopId, f64>>,
}

impl Graph {
    /// A graph with one isolated node per stop.
    pub fn with_nodes(stops: &[Stop]) -> Self {
        Self {
            adjacency: stops
                .iter()
                .map(|s| (s.id.clone(), HashMap::new()))
                .collect(),
        }
    }

    pub fn add_node(&mut self, id: StopId) {
        self.adjacency.entry(id).or_default();
    }

    /// Insert a directed edge. Rejects negative or non-finite weights and
    /// self-loops; returns whether the edge was stored.
    pub fn insert_edge(&mut self, from: &StopId, to: &StopId, weight: f64) -> bool {
        if from == to || !weight.is_finite() || weight < 0.0 {
            return false;
        }
        self.adjacency.entry(to.clone()).or_default();
        self.adjacency
            .entry(from.clone())
            .or_default()
            .insert(to.clone(), weight);
        true
    }

    /// Insert an edge in both directions with the same weight.
    pub fn insert_undirected(&mut self, a: &StopId, b: &StopId, weight: f64) -> bool {
        self.insert_edge(a, b, weight) && self.insert_edge(b, a, weight)
    }

    pub fn contains_node(&self, id: &StopId) -> bool {
        self.adjacency.contains_key(id)
    }

    pub fn has_edge(&self, from: &StopId, to: &StopId) -> bool {
        self.weight(from, to).is_some()
    }

    pub fn weight(&self, from: &StopId, to: &StopId) -> Option<f64> {
        self.adjacency.get(from)?.get(to).copied()
    }

    /// Outgoing edges of `id`. Empty for unknown nodes.
    pub fn neighbors(&self, id: &StopId) -> impl Iterator<Item = (&StopId, f64)> {
        self.adjacency
            .get(id)
            .into_iter()
            .flat_map(|n| n.iter().map(|(k, w)| (k, *w)))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &StopId> {
        self.adjacency.keys()
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of directed edges.
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }
}
