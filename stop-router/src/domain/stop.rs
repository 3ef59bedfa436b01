//! Stop identifiers and records.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::coord::Coordinate;

/// Identifier of a stop, unique within a stop set.
///
/// Upstream sources hand out numeric node ids; they are kept as strings so the
/// key domain of every graph and cache is the same opaque type.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StopId(String);

impl StopId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StopId({})", self.0)
    }
}

impl fmt::Display for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StopId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A boarding/alighting location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: StopId,
    pub lat: f64,
    pub lon: f64,
    pub name: String,
}

impl Stop {
    pub fn new(id: impl Into<String>, lat: f64, lon: f64, name: impl Into<String>) -> Self {
        Self {
            id: StopId::new(id),
            lat,
            lon,
            name: name.into(),
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }

    /// Great-circle distance to another stop in meters.
    pub fn distance_to(&self, other: &Stop) -> f64 {
        self.coordinate().distance_to(&other.coordinate())
    }
}

/// Id → stop lookup over a borrowed stop list.
#[derive(Debug, Clone)]
pub struct StopIndex<'a> {
    by_id: HashMap<&'a StopId, &'a Stop>,
}

impl<'a> StopIndex<'a> {
    pub fn new(stops: &'a [Stop]) -> Self {
        Self {
            by_id: stops.iter().map(|s| (&s.id, s)).collect(),
        }
    }

    pub fn get(&self, id: &StopId) -> Option<&'a Stop> {
        self.by_id.get(id).copied()
    }

    pub fn contains(&self, id: &StopId) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
