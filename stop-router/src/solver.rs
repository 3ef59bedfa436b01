//! Shortest path search over a proximity graph.
//!
//! Plain Dijkstra with a linear scan for the next node. Graph size is bounded
//! by the stop set (hundreds to low thousands of nodes) with O(k) edges per
//! node, so the O(n²) scan stays cheap and avoids a heap keyed on floats.

use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::domain::StopId;
use crate::graph::Graph;

/// Ordered stops from source to destination inclusive.
///
/// Empty when no route exists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoutePath {
    pub stops: Vec<StopId>,
    /// Sum of edge weights along the path (meters).
    pub cost: f64,
}

impl RoutePath {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    /// Consecutive stop pairs, in path order.
    pub fn edges(&self) -> impl Iterator<Item = (&StopId, &StopId)> {
        self.stops.windows(2).map(|w| (&w[0], &w[1]))
    }
}

/// Find the cheapest path from `source` to `target`.
///
/// - `source == target` on a known node gives `[source]` at cost 0.
/// - An unknown endpoint or an unreachable target gives an empty path.
/// - Among nodes with equal tentative distance the smallest id is settled
///   first, so results are deterministic.
pub fn shortest_path(graph: &Graph, source: &StopId, target: &StopId) -> RoutePath {
    if !graph.contains_node(source) || !graph.contains_node(target) {
        return RoutePath::empty();
    }

    let mut distances: HashMap<&StopId, f64> = HashMap::new();
    let mut previous: HashMap<&StopId, &StopId> = HashMap::new();
    let mut unvisited: HashSet<&StopId> = graph.nodes().collect();
    distances.insert(source, 0.0);

    loop {
        // Nearest unvisited node with a finite distance
        let next = unvisited
            .iter()
            .filter_map(|&node| distances.get(node).map(|&d| (node, d)))
            .min_by(|(a_id, a), (b_id, b)| a.total_cmp(b).then_with(|| a_id.cmp(b_id)));

        let Some((current, current_distance)) = next else {
            trace!(%source, %target, "No reachable node left");
            return RoutePath::empty();
        };

        if current == target {
            break;
        }
        unvisited.remove(current);

        for (neighbor, weight) in graph.neighbors(current) {
            if !unvisited.contains(neighbor) {
                continue;
            }
            let candidate = current_distance + weight;
            let better = distances.get(neighbor).is_none_or(|&d| candidate < d);
            if better {
                distances.insert(neighbor, candidate);
                previous.insert(neighbor, current);
            }
        }
    }

    let mut stops = vec![target.clone()];
    let mut current = target;
    while let Some(&prev) = previous.get(current) {
        stops.push(prev.clone());
        current = prev;
    }
    stops.reverse();

    RoutePath {
        stops,
        cost: distances.get(target).copied().unwrap_or_default(),
    }
}
