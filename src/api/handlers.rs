//! HTTP endpoint handlers

use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use futures::stream::{self, Stream};
use tracing::{error, info, warn};

use super::responses::{ApiResponse, HealthResponse, SetsRequest, StatusResponse, TimerRequest};
use crate::{
    error::SessionError,
    state::{AppState, SessionSnapshot},
    utils::validation::{confirm_set_count, RestDuration},
};

type ApiResult = Result<Json<ApiResponse>, (StatusCode, Json<ApiResponse>)>;

/// Wrap an intent result, mapping errors to a status code
fn respond(result: Result<SessionSnapshot, SessionError>, message: &str) -> ApiResult {
    match result {
        Ok(session) => Ok(Json(ApiResponse::ok(message.to_string(), session))),
        Err(e @ SessionError::StateLock(_)) => {
            error!("{}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(e.to_string())),
            ))
        }
        Err(e) => {
            warn!("Rejected request: {}", e);
            Err((
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ApiResponse::error(e.to_string())),
            ))
        }
    }
}

/// Handle POST /increment - Count a set and start resting
pub async fn increment_handler(State(state): State<Arc<AppState>>) -> ApiResult {
    info!("Increment endpoint called");
    respond(state.increment(), "Set counted, rest started")
}

/// Handle POST /decrement - Take back one set
pub async fn decrement_handler(State(state): State<Arc<AppState>>) -> ApiResult {
    info!("Decrement endpoint called");
    respond(state.decrement(), "Set removed")
}

/// Handle POST /reset - Zero the counter
pub async fn reset_handler(State(state): State<Arc<AppState>>) -> ApiResult {
    info!("Reset endpoint called");
    respond(state.reset(), "Session reset")
}

/// Handle POST /dismiss - Close the "next set" notification
pub async fn dismiss_handler(State(state): State<Arc<AppState>>) -> ApiResult {
    respond(state.dismiss_notification(), "Notification dismissed")
}

/// Handle PUT /timer - Configure the rest duration
pub async fn timer_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TimerRequest>,
) -> ApiResult {
    info!("Timer endpoint called: {}m {}s", request.minutes, request.seconds);
    let result = RestDuration::new(request.minutes, request.seconds)
        .and_then(|rest| state.set_timer_duration(rest));
    respond(result, "Rest duration updated")
}

/// Handle PUT /sets - Confirm the sets dialog
pub async fn sets_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SetsRequest>,
) -> ApiResult {
    let total_sets = confirm_set_count(&request.value);
    info!("Sets endpoint called with {:?}, using {}", request.value, total_sets);
    respond(state.set_total_sets(total_sets), "Target sets updated")
}

/// Handle GET /status - Return the current session and server metadata
pub async fn status_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, StatusCode> {
    let (session, live_countdowns) = match (state.snapshot(), state.live_countdowns()) {
        (Ok(session), Ok(live)) => (session, live),
        (Err(e), _) | (_, Err(e)) => {
            error!("Failed to read session: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };
    let (last_action, last_action_time) = state.last_action();

    Ok(Json(StatusResponse {
        session,
        live_countdowns,
        uptime_seconds: state.uptime_seconds(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /events - Stream a snapshot after every transition
pub async fn events_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut updates = state.subscribe();
    updates.mark_changed();

    let stream = stream::unfold(updates, |mut updates| async move {
        updates.changed().await.ok()?;
        let snapshot = updates.borrow_and_update().clone();
        let event = Event::default()
            .event("session")
            .json_data(&snapshot)
            .unwrap_or_else(|e| Event::default().event("error").data(e.to_string()));
        Some((Ok(event), updates))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
