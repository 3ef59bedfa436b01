//! Stop routing server.
//!
//! Answers "how do I get from this stop to that one?" by linking nearby
//! public transport stops into a proximity graph, finding the cheapest stop
//! path through it, and stitching the street geometry of each hop into one
//! polyline for a map.

pub mod config;
pub mod domain;
pub mod geometry;
pub mod graph;
pub mod graph_cache;
pub mod limiter;
pub mod oracle;
pub mod osrm;
pub mod provider;
pub mod router;
pub mod solver;
pub mod stops;
pub mod store;
pub mod web;
