//! Proximity graph configuration.

/// Parameters for proximity graph construction.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// Maximum number of nearest stops considered per stop.
    pub max_neighbors: usize,

    /// Straight-line distance beyond which stops are never linked (meters).
    pub cutoff_meters: f64,

    /// Log build progress every this many source stops. Zero disables.
    pub progress_every: usize,
}

impl GraphConfig {
    pub fn new(max_neighbors: usize, cutoff_meters: f64) -> Self {
        Self {
            max_neighbors,
            cutoff_meters,
            ..Self::default()
        }
    }

    pub fn with_progress_every(mut self, n: usize) -> Self {
        self.progress_every = n;
        self
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_neighbors: 12,
            cutoff_meters: 1500.0,
            progress_every: 10,
        }
    }
}
