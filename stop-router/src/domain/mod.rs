//! Domain types for stop routing.
//!
//! Stops are supplied externally and treated as immutable; the router never
//! validates them beyond requiring unique ids.

mod coord;
mod stop;

pub use coord::{Coordinate, EARTH_RADIUS_METERS, haversine_meters};
pub use stop::{Stop, StopId, StopIndex};
