//! Background writer that mirrors the counter into the store

use std::sync::Arc;

use serde_json::json;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::services::{KeyValueStore, COUNT_KEY};

/// Save the latest counter value whenever it changes.
///
/// The value current when `counts` was created is treated as already stored.
/// Intermediate values may be skipped when writes fall behind; the last
/// value always lands. Failures are logged and never retried.
pub async fn persistence_task(store: Arc<dyn KeyValueStore>, mut counts: watch::Receiver<u32>) {
    info!("Starting persistence task");

    while counts.changed().await.is_ok() {
        let count = *counts.borrow_and_update();
        match store.save(COUNT_KEY, json!(count)).await {
            Ok(()) => debug!("Persisted count {}", count),
            Err(e) => warn!("Failed to persist count {}: {:#}", count, e),
        }
    }

    info!("Count channel closed, stopping persistence task");
}
