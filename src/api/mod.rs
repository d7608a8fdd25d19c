//! HTTP API module
//!
//! Forwards presentation intents to the session and serves its snapshots.

pub mod handlers;
pub mod responses;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/increment", post(increment_handler))
        .route("/decrement", post(decrement_handler))
        .route("/reset", post(reset_handler))
        .route("/dismiss", post(dismiss_handler))
        .route("/timer", put(timer_handler))
        .route("/sets", put(sets_handler))
        .route("/status", get(status_handler))
        .route("/events", get(events_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
