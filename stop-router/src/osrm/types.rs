//! OSRM response types.
//!
//! Only the fields the router consumes are modelled; everything else in the
//! response is ignored.

use serde::Deserialize;

use crate::domain::Coordinate;
use crate::provider::RouteLeg;

/// Top-level `route/v1` response.
#[derive(Debug, Clone, Deserialize)]
pub struct OsrmResponse {
    /// `"Ok"` on success, otherwise an error code such as `"NoRoute"`.
    pub code: String,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub routes: Vec<OsrmRoute>,
}

/// A single route alternative.
#[derive(Debug, Clone, Deserialize)]
pub struct OsrmRoute {
    /// Meters.
    pub distance: f64,

    /// Seconds.
    pub duration: f64,

    /// Present only when requested with `overview=full&geometries=geojson`.
    #[serde(default)]
    pub geometry: Option<OsrmGeometry>,
}

/// GeoJSON LineString geometry.
#[derive(Debug, Clone, Deserialize)]
pub struct OsrmGeometry {
    /// `[lon, lat]` pairs.
    pub coordinates: Vec<[f64; 2]>,
}

impl OsrmResponse {
    /// Whether the service answered that no route exists between the points.
    pub fn is_no_route(&self) -> bool {
        matches!(self.code.as_str(), "NoRoute" | "NoSegment")
    }

    /// The first route as a [`RouteLeg`], if any.
    pub fn into_leg(self) -> Option<RouteLeg> {
        let route = self.routes.into_iter().next()?;
        let coordinates = route
            .geometry
            .map(|g| g.coordinates.into_iter().map(Coordinate::from_lon_lat).collect())
            .unwrap_or_default();

        Some(RouteLeg {
            coordinates,
            distance_meters: route.distance,
            duration_seconds: route.duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_geometry() {
        let json = r#"{
            "code": "Ok",
            "routes": [{
                "distance": 812.4,
                "duration": 97.1,
                "weight": 97.1,
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[-47.9, -15.8], [-47.905, -15.802], [-47.91, -15.805]]
                }
            }],
            "waypoints": []
        }"#;

        let response: OsrmResponse = serde_json::from_str(json).unwrap();
        assert!(!response.is_no_route());

        let leg = response.into_leg().unwrap();
        assert_eq!(leg.distance_meters, 812.4);
        assert_eq!(leg.duration_seconds, 97.1);
        assert_eq!(leg.coordinates.len(), 3);
        assert_eq!(leg.coordinates[0], Coordinate::new(-15.8, -47.9));
    }

    #[test]
    fn parse_without_geometry() {
        let json = r#"{"code":"Ok","routes":[{"distance":1200.0,"duration":140.0}]}"#;
        let response: OsrmResponse = serde_json::from_str(json).unwrap();
        let leg = response.into_leg().unwrap();
        assert_eq!(leg.distance_meters, 1200.0);
        assert!(leg.coordinates.is_empty());
    }

    #[test]
    fn parse_no_route() {
        let json = r#"{"code":"NoRoute","message":"Impossible route between points"}"#;
        let response: OsrmResponse = serde_json::from_str(json).unwrap();
        assert!(response.is_no_route());
        assert!(response.into_leg().is_none());
    }
}
