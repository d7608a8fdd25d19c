//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::SessionSnapshot;

/// API response structure for intent endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub session: Option<SessionSnapshot>,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: &str, message: String, session: Option<SessionSnapshot>) -> Self {
        Self {
            status: status.to_string(),
            message,
            timestamp: Utc::now(),
            session,
        }
    }

    /// Create a response for an applied intent
    pub fn ok(message: String, session: SessionSnapshot) -> Self {
        Self::new("ok", message, Some(session))
    }

    /// Create an error response
    pub fn error(message: String) -> Self {
        Self::new("error", message, None)
    }
}

/// Status response with server metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub session: SessionSnapshot,
    pub live_countdowns: usize,
    pub uptime_seconds: i64,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Body of `PUT /timer`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimerRequest {
    pub minutes: u32,
    pub seconds: u32,
}

/// Body of `PUT /sets`, the raw text of the sets dialog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetsRequest {
    pub value: String,
}
