//! Rest countdown timer

use std::time::Duration;

use tokio::{sync::mpsc::UnboundedSender, task::JoinHandle, time::interval};
use tracing::debug;

use crate::state::{Generation, SessionEvent};

/// Handle to the one in-flight countdown task
#[derive(Debug)]
pub struct CountdownHandle {
    generation: Generation,
    task: JoinHandle<()>,
}

impl CountdownHandle {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn is_live(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop the countdown; anything it already queued is filtered by generation
    pub fn cancel(self) {
        debug!("Aborting countdown task #{}", self.generation.value());
        self.task.abort();
    }
}

/// Spawn a countdown that reports every `tick` and once more at zero
pub fn start(
    generation: Generation,
    duration: Duration,
    tick: Duration,
    events: UnboundedSender<SessionEvent>,
) -> CountdownHandle {
    let task = tokio::spawn(countdown_task(generation, duration, tick, events));
    CountdownHandle { generation, task }
}

async fn countdown_task(
    generation: Generation,
    duration: Duration,
    tick: Duration,
    events: UnboundedSender<SessionEvent>,
) {
    let mut interval = interval(tick);
    let mut remaining = duration;

    loop {
        interval.tick().await;

        let event = if remaining.is_zero() {
            SessionEvent::Elapsed { generation }
        } else {
            SessionEvent::Tick {
                generation,
                remaining_millis: u64::try_from(remaining.as_millis()).unwrap_or(u64::MAX),
            }
        };
        if events.send(event).is_err() {
            debug!("Session event channel closed, stopping countdown #{}", generation.value());
            return;
        }
        if remaining.is_zero() {
            return;
        }
        remaining = remaining.saturating_sub(tick);
    }
}
