//! Main application state management

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tracing::debug;

use super::{
    controller::{Effect, SessionController, SessionEvent},
    session_state::SessionSnapshot,
};
use crate::{
    error::SessionError,
    services::{load_count, KeyValueStore},
    tasks::{auto_dismiss, countdown, CountdownHandle, DismissHandle},
    utils::validation::RestDuration,
};

/// Controller plus the timer handles it exclusively owns
#[derive(Debug)]
struct Session {
    controller: SessionController,
    countdown: Option<CountdownHandle>,
    dismiss: Option<DismissHandle>,
}

/// Runtime around the session controller.
///
/// Every intent and timer event takes the same lock, so transitions never
/// run concurrently. Timer tasks report back through the event channel
/// returned by [`AppState::new`].
#[derive(Debug)]
pub struct AppState {
    session: Mutex<Session>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    /// Latest snapshot for subscribers
    snapshot_tx: watch::Sender<SessionSnapshot>,
    /// Latest count for the persistence task
    count_tx: watch::Sender<u32>,
    /// Server metadata
    pub start_time: DateTime<Utc>,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    last_action: Mutex<Option<(String, DateTime<Utc>)>>,
}

impl AppState {
    /// Create the state and the receiving end of its timer event channel
    pub fn new(
        port: u16,
        host: String,
        total_sets: u32,
        rest: RestDuration,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let controller = SessionController::new(total_sets, rest.as_millis());
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, _) = watch::channel(controller.snapshot());
        let (count_tx, _) = watch::channel(controller.state().count);

        let state = Self {
            session: Mutex::new(Session {
                controller,
                countdown: None,
                dismiss: None,
            }),
            events_tx,
            snapshot_tx,
            count_tx,
            start_time: Utc::now(),
            port,
            host,
            last_action: Mutex::new(None),
        };
        (state, events_rx)
    }

    /// Perform the single startup read of the persisted counter
    pub async fn restore(&self, store: &dyn KeyValueStore) -> Result<SessionSnapshot, SessionError> {
        let count = load_count(store).await;
        let mut session = self.lock_session()?;
        session.controller.restore_count(count);
        self.count_tx.send_replace(count);
        Ok(self.publish(&session))
    }

    /// Receiver for the persistence task; the current count counts as stored
    pub fn persisted_counts(&self) -> watch::Receiver<u32> {
        self.count_tx.subscribe()
    }

    /// Subscribe to the snapshot published after every transition
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn increment(&self) -> Result<SessionSnapshot, SessionError> {
        self.transition("increment", |c| Ok(c.increment()))
    }

    pub fn decrement(&self) -> Result<SessionSnapshot, SessionError> {
        self.transition("decrement", |c| Ok(c.decrement()))
    }

    pub fn reset(&self) -> Result<SessionSnapshot, SessionError> {
        self.transition("reset", |c| Ok(c.reset()))
    }

    pub fn set_timer_duration(&self, rest: RestDuration) -> Result<SessionSnapshot, SessionError> {
        self.transition("set-timer", |c| Ok(c.configure_timer(rest.as_millis())))
    }

    pub fn set_total_sets(&self, total_sets: u32) -> Result<SessionSnapshot, SessionError> {
        self.transition("set-sets", |c| c.configure_sets(total_sets))
    }

    pub fn dismiss_notification(&self) -> Result<SessionSnapshot, SessionError> {
        self.transition("dismiss", |c| Ok(c.dismiss_notification()))
    }

    /// Apply a timer callback delivered by the event task
    pub fn handle_event(&self, event: SessionEvent) -> Result<SessionSnapshot, SessionError> {
        let mut session = self.lock_session()?;
        let effects = session.controller.handle_event(event);
        self.apply_effects(&mut session, effects);
        Ok(self.publish(&session))
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        Ok(self.lock_session()?.controller.snapshot())
    }

    /// Number of countdown tasks still running (0 or 1)
    pub fn live_countdowns(&self) -> Result<usize, SessionError> {
        let session = self.lock_session()?;
        Ok(session
            .countdown
            .as_ref()
            .map_or(0, |handle| usize::from(handle.is_live())))
    }

    /// Server uptime in whole seconds
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.start_time).num_seconds()
    }

    /// Get last action information
    pub fn last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        match self.last_action.lock().ok().and_then(|a| a.clone()) {
            Some((action, at)) => (Some(action), Some(at)),
            None => (None, None),
        }
    }

    fn transition<F>(&self, action: &str, intent: F) -> Result<SessionSnapshot, SessionError>
    where
        F: FnOnce(&mut SessionController) -> Result<Vec<Effect>, SessionError>,
    {
        let mut session = self.lock_session()?;
        let effects = intent(&mut session.controller)?;
        self.apply_effects(&mut session, effects);
        let snapshot = self.publish(&session);
        drop(session);

        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some((action.to_string(), Utc::now()));
        }
        Ok(snapshot)
    }

    fn apply_effects(&self, session: &mut Session, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartCountdown {
                    generation,
                    duration,
                    tick,
                } => {
                    if let Some(previous) = session.countdown.take() {
                        previous.cancel();
                    }
                    session.countdown = Some(countdown::start(
                        generation,
                        duration,
                        tick,
                        self.events_tx.clone(),
                    ));
                }
                Effect::CancelCountdown { generation } => {
                    if let Some(handle) = session.countdown.take() {
                        if handle.generation() != generation {
                            debug!(
                                "Cancelling countdown #{} in place of #{}",
                                handle.generation().value(),
                                generation.value()
                            );
                        }
                        handle.cancel();
                    }
                }
                Effect::ScheduleDismiss { generation, delay } => {
                    if let Some(previous) = session.dismiss.take() {
                        previous.cancel();
                    }
                    session.dismiss = Some(auto_dismiss::schedule(
                        generation,
                        delay,
                        self.events_tx.clone(),
                    ));
                }
                Effect::CancelDismiss { generation } => {
                    if let Some(handle) = session.dismiss.take() {
                        debug!(
                            "Cancelling auto-dismiss #{} (requested #{})",
                            handle.generation().value(),
                            generation.value()
                        );
                        handle.cancel();
                    }
                }
                Effect::PersistCount(count) => {
                    self.count_tx.send_replace(count);
                }
            }
        }

        // release handles the controller no longer tracks
        if !session.controller.has_live_countdown() {
            if let Some(handle) = session.countdown.take() {
                handle.cancel();
            }
        }
        if !session.controller.has_pending_dismiss() {
            if let Some(handle) = session.dismiss.take() {
                handle.cancel();
            }
        }
    }

    fn publish(&self, session: &Session) -> SessionSnapshot {
        let snapshot = session.controller.snapshot();
        self.snapshot_tx.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            *current = snapshot.clone();
            true
        });
        snapshot
    }

    fn lock_session(&self) -> Result<MutexGuard<'_, Session>, SessionError> {
        self.session
            .lock()
            .map_err(|e| SessionError::StateLock(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        services::{MemoryStore, COUNT_KEY},
        state::TimerStatus,
        tasks::{persistence_task, session_event_task},
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::{sync::Arc, time::Duration};
    use tokio::time::sleep;

    fn spawn_state(rest: RestDuration) -> Arc<AppState> {
        let (state, events) = AppState::new(0, "127.0.0.1".to_string(), 10, rest);
        let state = Arc::new(state);
        tokio::spawn(session_event_task(Arc::clone(&state), events));
        state
    }

    fn one_minute() -> RestDuration {
        RestDuration::new(1, 0).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_rest_cycle_in_virtual_time() {
        let state = spawn_state(one_minute());

        let snapshot = state.increment().unwrap();
        assert_eq!(snapshot.count, 1);
        assert_eq!(snapshot.timer_status, TimerStatus::Running);
        assert_eq!(snapshot.timer_text, "01:00");
        assert_eq!(state.live_countdowns().unwrap(), 1);

        sleep(Duration::from_millis(15_500)).await;
        assert_eq!(state.snapshot().unwrap().timer_text, "00:45");

        sleep(Duration::from_millis(45_000)).await;
        let finished = state.snapshot().unwrap();
        assert_eq!(finished.timer_status, TimerStatus::Finished);
        assert!(finished.notification_visible);
        assert_eq!(finished.timer_text, "00:00");

        sleep(Duration::from_millis(3_000)).await;
        let dismissed = state.snapshot().unwrap();
        assert!(!dismissed.notification_visible);
        assert_eq!(dismissed.timer_status, TimerStatus::Idle);
        assert_eq!(dismissed.timer_text, "01:00");
    }

    #[tokio::test(start_paused = true)]
    async fn test_decrement_cancels_running_countdown() {
        let state = spawn_state(one_minute());
        state.increment().unwrap();
        let snapshot = state.decrement().unwrap();

        assert_eq!(snapshot.count, 0);
        assert_eq!(snapshot.timer_status, TimerStatus::Idle);
        assert_eq!(state.live_countdowns().unwrap(), 0);

        let mut updates = state.subscribe();
        sleep(Duration::from_secs(120)).await;
        assert!(!updates.has_changed().unwrap());
        assert_eq!(state.snapshot().unwrap().timer_status, TimerStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_one_countdown_after_repeated_increments() {
        let state = spawn_state(one_minute());
        for _ in 0..5 {
            state.increment().unwrap();
            sleep(Duration::from_millis(2_500)).await;
        }
        assert_eq!(state.live_countdowns().unwrap(), 1);
        assert_eq!(state.snapshot().unwrap().timer_text, "00:58");

        state.reset().unwrap();
        assert_eq!(state.live_countdowns().unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_timer_duration_stops_countdown() {
        let state = spawn_state(one_minute());
        state.increment().unwrap();
        let snapshot = state
            .set_timer_duration(RestDuration::new(0, 30).unwrap())
            .unwrap();

        assert_eq!(snapshot.timer_status, TimerStatus::Idle);
        assert_eq!(snapshot.timer_text, "00:30");
        assert_eq!(state.live_countdowns().unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_dismiss_before_auto_dismiss() {
        let state = spawn_state(RestDuration::new(0, 0).unwrap());
        state.increment().unwrap();
        sleep(Duration::from_millis(2_000)).await;
        assert!(state.snapshot().unwrap().notification_visible);

        state.dismiss_notification().unwrap();
        state.increment().unwrap();
        sleep(Duration::from_millis(10)).await;
        assert!(state.snapshot().unwrap().notification_visible);

        // the first notification's 3s mark passes without touching the second
        sleep(Duration::from_millis(1_490)).await;
        assert!(state.snapshot().unwrap().notification_visible);

        sleep(Duration::from_millis(2_000)).await;
        assert!(!state.snapshot().unwrap().notification_visible);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restore_and_persist_through_store() {
        let store = Arc::new(MemoryStore::new());
        store.save(COUNT_KEY, json!(4)).await.unwrap();

        let state = spawn_state(one_minute());
        assert_eq!(state.restore(store.as_ref()).await.unwrap().count, 4);
        tokio::spawn(persistence_task(store.clone(), state.persisted_counts()));

        state.increment().unwrap();
        sleep(Duration::from_millis(10)).await;
        assert_eq!(load_count(store.as_ref()).await, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_failure_keeps_memory_state() {
        let store = Arc::new(MemoryStore::new());
        store.set_failing(true);

        let state = spawn_state(one_minute());
        assert_eq!(state.restore(store.as_ref()).await.unwrap().count, 0);
        tokio::spawn(persistence_task(store.clone(), state.persisted_counts()));

        state.increment().unwrap();
        state.increment().unwrap();
        sleep(Duration::from_millis(10)).await;
        assert_eq!(state.snapshot().unwrap().count, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_total_sets_rejected() {
        let state = spawn_state(one_minute());
        assert_eq!(
            state.set_total_sets(100),
            Err(SessionError::InvalidSetCount(100))
        );
        assert_eq!(state.snapshot().unwrap().total_sets, 10);
        assert_eq!(state.last_action(), (None, None));

        state.set_total_sets(4).unwrap();
        assert_eq!(state.last_action().0.as_deref(), Some("set-sets"));
    }
}
