//! Stop list sources.
//!
//! Stops come from the Overpass API (bus stops and platforms in a bounding
//! box) or from a JSON file, and are shared through a refreshable [`StopSet`].

mod client;
mod error;
mod file;
mod set;

pub use client::{BoundingBox, OverpassClient, OverpassConfig};
pub use error::StopSourceError;
pub use file::StopFile;
pub use set::{StopSet, StopSource};
