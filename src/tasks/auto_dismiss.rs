//! One-shot timer that hides the "next set" notification

use std::time::Duration;

use tokio::{sync::mpsc::UnboundedSender, task::JoinHandle, time::sleep};
use tracing::debug;

use crate::state::{Generation, SessionEvent};

#[derive(Debug)]
pub struct DismissHandle {
    generation: Generation,
    task: JoinHandle<()>,
}

impl DismissHandle {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn cancel(self) {
        debug!("Aborting auto-dismiss #{}", self.generation.value());
        self.task.abort();
    }
}

/// Deliver `AutoDismiss` for `generation` after `delay`
pub fn schedule(
    generation: Generation,
    delay: Duration,
    events: UnboundedSender<SessionEvent>,
) -> DismissHandle {
    let task = tokio::spawn(async move {
        sleep(delay).await;
        if events.send(SessionEvent::AutoDismiss { generation }).is_err() {
            debug!("Session event channel closed before auto-dismiss");
        }
    });
    DismissHandle { generation, task }
}
