//! Web layer for the stop router.
//!
//! Provides HTTP endpoints for listing stops and computing routes.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::{AppState, StopRouter};
