//! Route geometry assembly.
//!
//! Turns a solved stop path into one continuous polyline by fetching the
//! street geometry of each consecutive stop pair and stitching the pieces.

mod assembler;
mod cache;

use serde::Serialize;

use crate::domain::Coordinate;

pub use assembler::GeometryAssembler;
pub use cache::{GeometryCache, SegmentKey};

/// Final route handed to the map consumer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RouteResult {
    /// Stitched polyline, source stop first.
    pub coordinates: Vec<Coordinate>,
    /// Sum of street distances of the fetched segments.
    pub distance_meters: f64,
    /// Sum of travel durations of the fetched segments.
    pub duration_seconds: f64,
    /// Number of stops on the path.
    pub stop_count: usize,
    /// Segments drawn as straight lines because their geometry lookup
    /// failed. They contribute nothing to distance or duration.
    pub fallback_segments: usize,
}

impl RouteResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }
}
