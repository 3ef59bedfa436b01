//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::geometry::RouteResult;
use crate::router::RouteError;
use crate::stops::StopSourceError;

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/stops", get(list_stops))
        .route("/api/stops/refresh", post(refresh_stops))
        .route("/api/route", post(compute_route))
        .route("/api/caches", delete(clear_caches))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// List the currently loaded stops.
async fn list_stops(State(state): State<AppState>) -> Json<StopsResponse> {
    let stops = state.stops.snapshot().await;
    Json(StopsResponse {
        count: stops.len(),
        stops: stops.as_ref().clone(),
    })
}

/// Refetch the stop list from its source.
async fn refresh_stops(State(state): State<AppState>) -> Result<Json<RefreshResponse>, AppError> {
    let count = state.stops.refresh().await?;
    Ok(Json(RefreshResponse { count }))
}

/// Compute a route between two stops of the current list.
async fn compute_route(
    State(state): State<AppState>,
    Json(req): Json<RouteRequest>,
) -> Result<Json<RouteResult>, AppError> {
    let stops = state.stops.snapshot().await;
    let result = state.router.route(&stops, &req.start, &req.end).await?;
    Ok(Json(result))
}

/// Drop the distance, geometry and persisted graph caches.
async fn clear_caches(State(state): State<AppState>) -> StatusCode {
    state.router.clear_caches();
    StatusCode::NO_CONTENT
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    NotFound { message: String },
    Unavailable { message: String },
    BadGateway { message: String },
}

impl From<RouteError> for AppError {
    fn from(e: RouteError) -> Self {
        match e {
            RouteError::EmptyInput => AppError::Unavailable {
                message: "no stops loaded".to_string(),
            },
            RouteError::NoRouteFound { .. } => AppError::NotFound {
                message: e.to_string(),
            },
        }
    }
}

impl From<StopSourceError> for AppError {
    fn from(e: StopSourceError) -> Self {
        AppError::BadGateway {
            message: e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Unavailable { message } => (StatusCode::SERVICE_UNAVAILABLE, message),
            AppError::BadGateway { message } => (StatusCode::BAD_GATEWAY, message),
        };

        if status.is_server_error() {
            error!(%status, %message, "Request failed");
        } else {
            warn!(%status, %message, "Request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
