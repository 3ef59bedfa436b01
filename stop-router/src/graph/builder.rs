//! Proximity graph construction.
//!
//! Candidate edges are chosen by straight-line distance alone (O(n²) over the
//! stop set, fine for hundreds to low thousands of stops), which bounds the
//! number of oracle lookups to O(n·k) whatever the oracle costs.

use std::cmp::Ordering;

use tracing::{debug, info, trace};

use crate::domain::Stop;
use crate::oracle::DistanceOracle;

use super::Graph;
use super::config::GraphConfig;

/// Builds a [`Graph`] over a stop set using a distance oracle.
pub struct GraphBuilder<'a, O> {
    oracle: &'a O,
    config: &'a GraphConfig,
}

impl<'a, O: DistanceOracle> GraphBuilder<'a, O> {
    pub fn new(oracle: &'a O, config: &'a GraphConfig) -> Self {
        Self { oracle, config }
    }

    /// Build the graph.
    ///
    /// Never fails: a pair whose weight cannot be resolved is simply left
    /// out, so the result may be sparser than requested. Each unordered pair
    /// is resolved once; the reverse direction is only tried if the first
    /// attempt failed. A resolved weight is stored in both directions.
    pub async fn build(&self, stops: &[Stop]) -> Graph {
        let mut graph = Graph::with_nodes(stops);
        let candidates = nearest_candidates(stops, self.config);
        let total = stops.len();
        let mut unresolved = 0usize;

        for (processed, (source, neighbors)) in stops.iter().zip(&candidates).enumerate() {
            let targets: Vec<&Stop> = neighbors
                .iter()
                .map(|&j| &stops[j])
                .filter(|t| !graph.has_edge(&source.id, &t.id))
                .collect();

            if !targets.is_empty() {
                let weights = self.oracle.distances_from(source, &targets).await;

                for (target, weight) in targets.iter().zip(weights) {
                    let stored = weight
                        .is_some_and(|w| graph.insert_undirected(&source.id, &target.id, w));
                    if !stored {
                        unresolved += 1;
                        trace!(from = %source.id, to = %target.id, ?weight, "Edge left out");
                    }
                }
            }

            let done = processed + 1;
            if self.config.progress_every > 0 && done % self.config.progress_every == 0 {
                debug!(
                    processed = done,
                    total,
                    percent = done * 100 / total,
                    "Building proximity graph"
                );
            }
        }

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count() / 2,
            unresolved,
            model = %self.oracle.kind(),
            "Proximity graph built"
        );

        graph
    }
}

/// For each stop, indices of up to `max_neighbors` other stops within the
/// cutoff, nearest first.
pub(crate) fn nearest_candidates(stops: &[Stop], config: &GraphConfig) -> Vec<Vec<usize>> {
    stops
        .iter()
        .enumerate()
        .map(|(i, a)| {
            let mut within: Vec<(usize, f64)> = stops
                .iter()
                .enumerate()
                .filter(|(j, b)| *j != i && b.id != a.id)
                .map(|(j, b)| (j, a.distance_to(b)))
                .filter(|(_, d)| *d <= config.cutoff_meters)
                .collect();

            within.sort_by(|(ja, da), (jb, db)| match da.total_cmp(db) {
                Ordering::Equal => stops[*ja].id.cmp(&stops[*jb].id),
                other => other,
            });
            within.truncate(config.max_neighbors);
            within.into_iter().map(|(j, _)| j).collect()
        })
        .collect()
}
