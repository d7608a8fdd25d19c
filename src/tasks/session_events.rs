//! Background task that feeds timer callbacks into the session

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{error, info};

use crate::state::{AppState, SessionEvent};

/// Apply timer events one at a time until every sender is gone
pub async fn session_event_task(state: Arc<AppState>, mut events: UnboundedReceiver<SessionEvent>) {
    info!("Starting session event task");

    while let Some(event) = events.recv().await {
        if let Err(e) = state.handle_event(event) {
            error!("Failed to apply {:?}: {}", event, e);
        }
    }

    info!("Session event channel closed, stopping event task");
}
