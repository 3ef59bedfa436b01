//! Contract for the remote street-routing service.
//!
//! Both the remote distance oracle and the geometry assembler talk to the
//! routing service through [`RouteProvider`], so tests can substitute canned
//! responses for the real HTTP client.

use std::future::Future;
use std::time::Duration;

use crate::domain::Coordinate;
use crate::osrm::RemoteError;

/// How much geometry to request for a leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overview {
    /// Distance and duration only.
    None,
    /// Full-resolution geometry.
    Full,
}

/// A routed leg between two coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteLeg {
    /// Ordered geometry. Empty when requested with [`Overview::None`].
    pub coordinates: Vec<Coordinate>,
    pub distance_meters: f64,
    pub duration_seconds: f64,
}

/// Trait for resolving street routes between two coordinates.
///
/// `Ok(None)` means the service answered but found no route; that is a normal
/// outcome. `Err` means the service could not be reached or answered badly.
pub trait RouteProvider: Send + Sync {
    fn route(
        &self,
        from: Coordinate,
        to: Coordinate,
        overview: Overview,
    ) -> impl Future<Output = Result<Option<RouteLeg>, RemoteError>> + Send;

    /// [`RouteProvider::route`], failing with [`RemoteError::Timeout`] if no
    /// answer arrives within `timeout`.
    fn route_within(
        &self,
        from: Coordinate,
        to: Coordinate,
        overview: Overview,
        timeout: Duration,
    ) -> impl Future<Output = Result<Option<RouteLeg>, RemoteError>> + Send {
        async move {
            tokio::time::timeout(timeout, self.route(from, to, overview))
                .await
                .unwrap_or_else(|_| Err(RemoteError::Timeout))
        }
    }
}

impl<P: RouteProvider> RouteProvider for std::sync::Arc<P> {
    fn route(
        &self,
        from: Coordinate,
        to: Coordinate,
        overview: Overview,
    ) -> impl Future<Output = Result<Option<RouteLeg>, RemoteError>> + Send {
        (**self).route(from, to, overview)
    }
}
