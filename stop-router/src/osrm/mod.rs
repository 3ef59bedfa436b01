//! OSRM street-routing client.
//!
//! Talks to the OSRM `route/v1` HTTP API. Used as the remote distance source
//! when building proximity graphs with street distances, and as the geometry
//! source when assembling the final route polyline.
//!
//! Key characteristics of the public OSRM demo server:
//! - Coordinates are written `lon,lat` in the URL path
//! - Geometry comes back as GeoJSON `[lon, lat]` pairs
//! - "No route" is reported through the response `code`, not as a transport error

mod client;
mod error;
mod types;

pub use client::{OsrmClient, OsrmConfig};
pub use error::RemoteError;
pub use types::{OsrmGeometry, OsrmResponse, OsrmRoute};
